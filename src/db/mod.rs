use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod error;
pub mod migrator;
pub mod repositories;

pub use error::{StoreError, StoreResult, UniqueField};
pub use repositories::idea::IdeaRepository;
pub use repositories::token::TokenRepository;
pub use repositories::user::UserRepository;

/// Default bound on a single persistence call.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs a storage future, failing with [`StoreError::Timeout`] once `limit`
/// elapses. This is the only cancellation applied to persistence calls.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| StoreError::Timeout(limit.as_secs()))?
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    query_timeout: Duration,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1, DEFAULT_QUERY_TIMEOUT).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
        query_timeout: Duration,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        ensure_sqlite_file(db_url).await?;

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(query_timeout)
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{}, query timeout: {}s)",
            min_connections,
            max_connections,
            query_timeout.as_secs()
        );

        Ok(Self {
            conn,
            query_timeout,
        })
    }

    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    pub async fn ping(&self) -> StoreResult<()> {
        let backend = self.conn.get_database_backend();
        let probe = self
            .conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()));
        bounded(self.query_timeout, async move {
            probe.await.map(|_| ()).map_err(StoreError::from)
        })
        .await
    }

    #[must_use]
    pub fn user_repo(&self) -> UserRepository {
        UserRepository::new(self.conn.clone(), self.query_timeout)
    }

    #[must_use]
    pub fn token_repo(&self) -> TokenRepository {
        TokenRepository::new(self.conn.clone(), self.query_timeout)
    }

    #[must_use]
    pub fn idea_repo(&self) -> IdeaRepository {
        IdeaRepository::new(self.conn.clone(), self.query_timeout)
    }
}

/// SQLite refuses to open a missing file unless `mode=rwc` is given, so make
/// sure the file and its directory exist for plain `sqlite:path` URLs.
async fn ensure_sqlite_file(db_url: &str) -> Result<()> {
    let Some(rest) = db_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    if rest.starts_with(":memory:") || rest.contains("mode=memory") {
        return Ok(());
    }

    let path_str = rest.trim_start_matches("//");
    let path_str = path_str.split('?').next().unwrap_or(path_str);
    if path_str.is_empty() {
        return Ok(());
    }

    let path = Path::new(path_str);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        tokio::fs::File::create(path).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_reports_timeout() {
        let result: StoreResult<()> = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(StoreError::Timeout(_))));
    }

    #[tokio::test]
    async fn bounded_passes_through_results() {
        let ok: StoreResult<i32> = bounded(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: StoreResult<i32> =
            bounded(Duration::from_secs(1), async { Err(StoreError::NotFound) }).await;
        assert!(matches!(err, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn in_memory_store_pings() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.ping().await.unwrap();
    }
}
