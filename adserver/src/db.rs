use std::env;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Manager, ManagerConfig, RecyclingMethod};
use once_cell::sync::Lazy;
use primitives::Advertisement;
use thiserror::Error;
use tokio_postgres::NoTls;

pub use deadpool_postgres::PoolError;

pub use self::ad::PostgresAdRepository;
pub use self::memory::MemoryAdRepository;

pub mod ad;
pub mod memory;

pub type DbPool = deadpool_postgres::Pool;

pub type BuildError = deadpool::managed::BuildError<tokio_postgres::Error>;

static POSTGRES_USER: Lazy<String> =
    Lazy::new(|| env::var("POSTGRES_USER").unwrap_or_else(|_| String::from("postgres")));
static POSTGRES_PASSWORD: Lazy<String> =
    Lazy::new(|| env::var("POSTGRES_PASSWORD").unwrap_or_else(|_| String::from("postgres")));
static POSTGRES_HOST: Lazy<String> =
    Lazy::new(|| env::var("POSTGRES_HOST").unwrap_or_else(|_| String::from("localhost")));
static POSTGRES_PORT: Lazy<u16> = Lazy::new(|| {
    env::var("POSTGRES_PORT")
        .unwrap_or_else(|_| "5432".to_string())
        .parse()
        .expect("Invalid POSTGRES_PORT")
});
static POSTGRES_DB: Lazy<Option<String>> = Lazy::new(|| env::var("POSTGRES_DB").ok());

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("Database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// The storage collaborator of the matching core.
///
/// Implementations are injected into the
/// [`Application`](`crate::Application`) at startup; connection lifecycle is
/// entirely their concern. A call either fully succeeds or fails, there are
/// no partial results.
#[async_trait]
pub trait AdRepository: Send + Sync {
    /// Persists one validated advertisement.
    async fn add(&self, ad: &Advertisement) -> Result<(), RepositoryError>;

    /// Returns the catalog slice whose validity window contains `now`.
    ///
    /// Implementations narrow by the time window at most; the full condition
    /// semantics are applied in-process by `primitives::targeting`, so a
    /// client returning too much is correct, just wasteful.
    async fn active(&self, now: DateTime<Utc>) -> Result<Vec<Advertisement>, RepositoryError>;
}

/// Creates the PostgreSQL connection pool from the `POSTGRES_*` environment
/// variables.
pub fn postgres_connection(max_size: usize) -> Result<DbPool, BuildError> {
    let mut config = tokio_postgres::Config::new();
    config
        .user(POSTGRES_USER.as_str())
        .password(POSTGRES_PASSWORD.as_str())
        .host(POSTGRES_HOST.as_str())
        .port(*POSTGRES_PORT);
    if let Some(db) = POSTGRES_DB.as_ref() {
        config.dbname(db);
    }

    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Verified,
    };
    let manager = Manager::from_config(config, NoTls, manager_config);

    DbPool::builder(manager).max_size(max_size).build()
}

pub fn setup_migrations() {
    use migrant_lib::{Config, Direction, Migrator, Settings};

    let settings = Settings::configure_postgres()
        .database_user(POSTGRES_USER.as_str())
        .database_password(POSTGRES_PASSWORD.as_str())
        .database_host(POSTGRES_HOST.as_str())
        .database_port(*POSTGRES_PORT)
        // postgres defaults the database to the user name
        .database_name(POSTGRES_DB.as_deref().unwrap_or_else(|| POSTGRES_USER.as_str()))
        .build()
        .expect("Should build migration settings");

    let mut config = Config::with_settings(&settings);
    config.use_cli_compatible_tags(true);

    macro_rules! make_migration {
        ($tag:expr) => {
            migrant_lib::EmbeddedMigration::with_tag($tag)
                .up(include_str!(concat!("../migrations/", $tag, "/up.sql")))
                .down(include_str!(concat!("../migrations/", $tag, "/down.sql")))
                .boxed()
        };
    }

    config
        .use_migrations(&[make_migration!("20240312094500_initial_tables")])
        .expect("Loading migrations failed");

    Migrator::with_config(&config)
        .direction(Direction::Up)
        .all(true)
        // `swallow_completion` stays `false`, so re-running already applied
        // migrations is not an error
        .apply()
        .expect("Applying migrations failed");
}
