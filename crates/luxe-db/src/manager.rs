use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use luxe_config::DatabaseConfig;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

use crate::error::DbError;
use crate::retry::ConnectSchedule;

type Slot = Option<PgPool>;

type PendingPool = BoxFuture<'static, Result<PgPool, DbError>>;

/// Opens a verified pool for a configuration. Used for every (re)connect.
pub type Connector = Arc<dyn Fn(DatabaseConfig) -> PendingPool + Send + Sync>;

/// Owner of the process-wide database handle.
///
/// Cloning is cheap; all clones share the same slot.
#[derive(Clone)]
pub struct ConnectionManager {
    slot: Arc<RwLock<Slot>>,
    connector: Connector,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self {
            slot: Arc::default(),
            connector: Arc::new(|config: DatabaseConfig| -> PendingPool {
                Box::pin(async move { open_verified(&config).await })
            }),
        }
    }
}

/// Observable lifecycle state of the shared handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Live,
    Uninitialized,
    Restoring,
}

impl HandleState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "up",
            Self::Uninitialized => "down",
            Self::Restoring => "restoring",
        }
    }
}

impl ConnectionManager {
    /// A manager with no handle yet. `acquire` fails with `NotInitialized`
    /// until [`Self::reinitialize`] succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-open pool without verifying it.
    #[must_use]
    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(pool))),
            ..Self::default()
        }
    }

    /// Replace how fresh handles are opened. The default retries `SELECT 1`
    /// against a new pool per [`ConnectSchedule`].
    ///
    /// Clones made before this call keep the previous connector.
    #[must_use]
    pub fn with_connector<F, Fut>(mut self, connect: F) -> Self
    where
        F: Fn(DatabaseConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<PgPool, DbError>> + Send + 'static,
    {
        self.connector = Arc::new(move |config: DatabaseConfig| -> PendingPool {
            Box::pin(connect(config))
        });
        self
    }

    /// Open and verify the initial handle.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the database never answers, or
    /// `DbError::InvalidConfig` if the settings cannot form a connection.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let manager = Self::new();
        manager.reinitialize(config).await?;
        Ok(manager)
    }

    /// Borrow the live handle.
    ///
    /// The lease keeps a restore from tearing the handle down until it is
    /// dropped. Never waits.
    ///
    /// # Errors
    ///
    /// `ServiceRestoring` while a restore holds the handle exclusively,
    /// `NotInitialized` if there is no live handle.
    pub fn acquire(&self) -> Result<HandleLease, DbError> {
        let guard = Arc::clone(&self.slot)
            .try_read_owned()
            .map_err(|_| DbError::ServiceRestoring)?;
        OwnedRwLockReadGuard::try_map(guard, Option::as_ref)
            .map(|guard| HandleLease { guard })
            .map_err(|_| DbError::NotInitialized)
    }

    /// Take the handle exclusively, waiting for outstanding leases to drain.
    ///
    /// While the returned guard lives, `acquire` fails fast with
    /// `ServiceRestoring`.
    pub async fn lock_exclusive(&self) -> ExclusiveHandle {
        let guard = Arc::clone(&self.slot).write_owned().await;
        ExclusiveHandle {
            guard,
            connector: Arc::clone(&self.connector),
        }
    }

    /// Close the current handle and replace it with a freshly verified one.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` when verification never succeeds. The
    /// old handle is closed regardless and the slot is left empty.
    pub async fn reinitialize(&self, config: &DatabaseConfig) -> Result<PgPool, DbError> {
        self.lock_exclusive().await.reinitialize(config).await
    }

    /// Run `SELECT 1` through a lease.
    ///
    /// # Errors
    ///
    /// Any acquisition error, or the query failure.
    pub async fn ping(&self) -> Result<(), DbError> {
        let lease = self.acquire()?;
        sqlx::query("SELECT 1").execute(&*lease).await?;
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> HandleState {
        match self.slot.try_read() {
            Ok(slot) if slot.is_some() => HandleState::Live,
            Ok(_) => HandleState::Uninitialized,
            Err(_) => HandleState::Restoring,
        }
    }

    /// Close the handle at process exit. Waits for outstanding leases.
    pub async fn shutdown(&self) {
        self.lock_exclusive().await.teardown().await;
        tracing::info!("database handle closed");
    }
}

/// Shared borrow of the live handle.
pub struct HandleLease {
    guard: OwnedRwLockReadGuard<Slot, PgPool>,
}

impl Deref for HandleLease {
    type Target = PgPool;

    fn deref(&self) -> &PgPool {
        &self.guard
    }
}

/// Exclusive access to the handle slot, held across a destructive restore.
pub struct ExclusiveHandle {
    guard: OwnedRwLockWriteGuard<Slot>,
    connector: Connector,
}

impl ExclusiveHandle {
    /// Close and drop the current handle, if any. Close never fails.
    pub async fn teardown(&mut self) {
        if let Some(pool) = self.guard.take() {
            pool.close().await;
        }
    }

    /// Tear down the current handle and install a freshly verified one.
    ///
    /// # Errors
    ///
    /// See [`ConnectionManager::reinitialize`].
    pub async fn reinitialize(&mut self, config: &DatabaseConfig) -> Result<PgPool, DbError> {
        self.teardown().await;
        let pool = (self.connector)(config.clone()).await?;
        *self.guard = Some(pool.clone());
        tracing::info!(host = %config.host, database = %config.name, "database handle ready");
        Ok(pool)
    }
}

/// Build pool connect options from configuration.
///
/// # Errors
///
/// `DbError::InvalidConfig` if `url` is set but does not parse.
pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, DbError> {
    if config.has_url() {
        return config
            .url
            .parse::<PgConnectOptions>()
            .map_err(|e| DbError::InvalidConfig(format!("database.url: {e}")));
    }

    Ok(PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.name))
}

async fn open_verified(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_lazy_with(connect_options(config)?);

    let verified = ConnectSchedule::from_config(config)
        .run(|| sqlx::query("SELECT 1").execute(&pool))
        .await;

    match verified {
        Ok(_) => Ok(pool),
        Err((attempts, error)) => {
            pool.close().await;
            Err(DbError::Connection {
                attempts,
                last_error: error.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A pool that never connects until used. Port 1 refuses connections.
    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy_with(PgConnectOptions::new().host("127.0.0.1").port(1))
    }

    fn unreachable_config() -> DatabaseConfig {
        DatabaseConfig {
            host: "127.0.0.1".into(),
            port: 1,
            acquire_timeout_secs: 1,
            connect_attempts: 2,
            connect_backoff_ms: 10,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn acquire_before_init_is_not_initialized() {
        let manager = ConnectionManager::new();
        assert!(matches!(manager.acquire(), Err(DbError::NotInitialized)));
        assert_eq!(manager.state(), HandleState::Uninitialized);
    }

    #[tokio::test]
    async fn acquire_returns_live_handle() {
        let manager = ConnectionManager::with_pool(lazy_pool());
        let lease = manager.acquire().expect("lease");
        assert!(!lease.is_closed());
        assert_eq!(manager.state(), HandleState::Live);
    }

    #[tokio::test]
    async fn acquire_fails_fast_while_restoring() {
        let manager = ConnectionManager::with_pool(lazy_pool());
        let exclusive = manager.lock_exclusive().await;

        assert!(matches!(manager.acquire(), Err(DbError::ServiceRestoring)));
        assert_eq!(manager.state(), HandleState::Restoring);

        drop(exclusive);
        assert!(manager.acquire().is_ok());
    }

    #[tokio::test]
    async fn exclusive_waits_for_outstanding_leases() {
        let manager = ConnectionManager::with_pool(lazy_pool());
        let lease = manager.acquire().expect("lease");

        let waiter = {
            let manager = manager.clone();
            tokio::spawn(async move {
                let _exclusive = manager.lock_exclusive().await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished(), "restore must wait for the lease");

        drop(lease);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("exclusive lock acquired after lease dropped")
            .expect("task joined");
    }

    #[tokio::test]
    async fn closed_handle_surfaces_distinct_error() {
        let pool = lazy_pool();
        let stale = pool.clone();
        pool.close().await;

        let err = sqlx::query("SELECT 1")
            .execute(&stale)
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::OperationOnClosedHandle));
    }

    #[tokio::test]
    async fn teardown_closes_previous_handle() {
        let pool = lazy_pool();
        let manager = ConnectionManager::with_pool(pool.clone());

        manager.lock_exclusive().await.teardown().await;

        assert!(pool.is_closed());
        assert!(matches!(manager.acquire(), Err(DbError::NotInitialized)));
    }

    #[tokio::test]
    async fn reinitialize_against_unreachable_database_fails_and_clears_slot() {
        let old = lazy_pool();
        let manager = ConnectionManager::with_pool(old.clone());

        let err = manager
            .reinitialize(&unreachable_config())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Connection { attempts: 2, .. }));
        assert!(old.is_closed(), "old handle is closed even on failure");
        assert!(matches!(manager.acquire(), Err(DbError::NotInitialized)));
    }

    #[tokio::test]
    async fn reinitialize_swaps_in_the_fresh_handle() {
        let old = lazy_pool();
        let fresh = lazy_pool();
        let manager = ConnectionManager::with_pool(old.clone()).with_connector({
            let fresh = fresh.clone();
            move |_| {
                let fresh = fresh.clone();
                async move { Ok(fresh) }
            }
        });

        manager
            .reinitialize(&unreachable_config())
            .await
            .expect("connector succeeds");

        assert!(old.is_closed());
        assert_eq!(manager.state(), HandleState::Live);
        let lease = manager.acquire().expect("lease on the fresh handle");
        assert!(!lease.is_closed());
        fresh.close().await;
        assert!(lease.is_closed(), "lease shares the pool the connector returned");
    }

    #[tokio::test]
    async fn failed_connector_leaves_slot_empty() {
        let old = lazy_pool();
        let manager = ConnectionManager::with_pool(old.clone()).with_connector(|_| async {
            Err(DbError::Connection {
                attempts: 1,
                last_error: "refused".into(),
            })
        });

        let err = manager
            .reinitialize(&unreachable_config())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Connection { attempts: 1, .. }));
        assert!(old.is_closed());
        assert!(matches!(manager.acquire(), Err(DbError::NotInitialized)));
    }

    #[tokio::test]
    async fn ping_without_handle_is_not_initialized() {
        let manager = ConnectionManager::new();
        assert!(matches!(manager.ping().await, Err(DbError::NotInitialized)));
    }

    #[test]
    fn connect_options_reject_bad_url() {
        let config = DatabaseConfig {
            url: "not a url".into(),
            ..Default::default()
        };
        assert!(matches!(
            connect_options(&config),
            Err(DbError::InvalidConfig(_))
        ));
    }

    #[test]
    fn connect_options_accept_postgres_url() {
        let config = DatabaseConfig {
            url: "postgres://luxe:luxe123@db:5432/luxe_db".into(),
            ..Default::default()
        };
        let options = connect_options(&config).expect("url parses");
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), 5432);
    }
}
