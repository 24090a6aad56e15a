// src/db/mod.rs

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    query_as, query_scalar, Connection,
};
use thiserror::Error;

use crate::{config::DbConfig, models::Session};

const MAX_OPEN_CONNECTIONS: u32 = 10;
// sqlx has no "max idle" knob; idle connections are reaped after IDLE_TIMEOUT instead.
const IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("database operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Read access to the billing and session tables.
///
/// Handlers only see this trait, so tests can swap the pool for an in-memory fake.
#[async_trait]
pub trait Store: Send + Sync {
    /// Sum of bills issued to `partner_id` within `[from, until)`; `None` when no row matches.
    async fn revenue_between(
        &self,
        partner_id: &str,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Option<f64>, StoreError>;

    /// Sessions flagged active or charging, in the order the database returns them.
    async fn active_sessions(&self) -> Result<Vec<Session>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Runs `fut`, turning an elapsed `limit` into [`StoreError::Timeout`].
///
/// Dropping the returned future (client went away) drops the query with it.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}

/// Builds the shared pool. Connections are opened on first use, so only a bad
/// configuration fails here.
pub fn connect(cfg: &DbConfig) -> anyhow::Result<MySqlPool> {
    let opts = cfg.connect_options()?;

    let pool = MySqlPoolOptions::new()
        .max_connections(MAX_OPEN_CONNECTIONS)
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
        .connect_lazy_with(opts);

    tracing::info!(db = %cfg, "database pool configured");
    Ok(pool)
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn revenue_between(
        &self,
        partner_id: &str,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Option<f64>, StoreError> {
        let total = query_scalar::<_, Option<f64>>(
            r#"
            SELECT CAST(SUM(total_amount) AS DOUBLE)
            FROM Partner_Bill
            WHERE TRIM(issued_to) = TRIM(?)
              AND issued_date >= ?
              AND issued_date <  ?
            "#,
        )
        .bind(partner_id)
        .bind(from)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn active_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let rows = query_as::<_, Session>(
            r#"
            SELECT CAST(session_id AS CHAR) AS session_id, start_date AS started_at
            FROM Sessions
            WHERE active = 1 OR charging = 1
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn with_timeout_reports_the_limit() {
        let limit = Duration::from_secs(2);
        let res: Result<(), _> = with_timeout(limit, async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        let err = res.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(d) if d == limit));
        assert_eq!(err.to_string(), "database operation timed out after 2s");
    }

    #[tokio::test]
    async fn with_timeout_passes_inner_errors_through() {
        let res: Result<(), _> = with_timeout(Duration::from_secs(5), async {
            Err(StoreError::Sqlx(sqlx::Error::RowNotFound))
        })
        .await;
        assert!(matches!(res, Err(StoreError::Sqlx(sqlx::Error::RowNotFound))));
    }

    #[tokio::test]
    async fn lazy_pool_builds_without_a_server() {
        let cfg = DbConfig::from_lookup(|_| None).unwrap();
        assert!(connect(&cfg).is_ok());
    }

    #[tokio::test]
    async fn pool_limits() {
        let cfg = DbConfig::from_lookup(|_| None).unwrap();
        let pool = connect(&cfg).unwrap();
        let opts = pool.options();
        assert_eq!(opts.get_max_connections(), 10);
        assert_eq!(opts.get_min_connections(), 0);
        assert_eq!(opts.get_idle_timeout(), Some(Duration::from_secs(5 * 60)));
        assert_eq!(opts.get_max_lifetime(), Some(Duration::from_secs(30 * 60)));
    }

    // Requires a real MySQL with the Partner_Bill and Sessions tables.
    // Run with: DATABASE_URL=mysql://... cargo test -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn mysql_store_answers_all_queries() {
        let cfg = DbConfig::from_env().expect("config");
        let store = MySqlStore::new(connect(&cfg).expect("pool"));

        store.ping().await.expect("ping");
        store.active_sessions().await.expect("sessions");

        let day = chrono::Local::now().date_naive();
        let from = day.and_time(chrono::NaiveTime::MIN);
        let until = from + chrono::Duration::days(1);
        let total = store
            .revenue_between("no-such-partner", from, until)
            .await
            .expect("revenue");
        assert_eq!(total, None);
    }
}
