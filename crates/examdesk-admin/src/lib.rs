//! Shared plumbing for the examdesk maintenance scripts.
//!
//! Each binary in `src/bin` is a standalone, flag-free script: it opens one
//! session with [`open_session`], runs a single operation from
//! `examdesk-db`, prints status lines to stdout and exits. Failures are
//! reported as printed messages; the exit status is always the default.

pub mod config;
pub mod console;
pub mod report;

use examdesk_db::{DbConnection, PoolError};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub use config::{load_config, Config, ConfigError, LoggingConfig};

/// Errors raised while setting up a script's session.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The session factory could not be built.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// No connection could be checked out.
    #[error("failed to open database session: {0}")]
    Checkout(#[from] r2d2::Error),
}

/// A script's configuration and its single database connection.
///
/// The connection goes back to the pool when the session is dropped, on
/// every exit path.
pub struct Session {
    pub config: Config,
    pub conn: DbConnection,
}

/// Loads configuration, initializes logging and opens the database session.
///
/// # Errors
///
/// Returns `AdminError` if any of the three steps fails.
pub fn open_session() -> Result<Session, AdminError> {
    let (config_path, config_source) = config::resolve_config_path();
    let config = config::load_config(&config_path)?;

    init_tracing(&config.logging);
    tracing::debug!(
        source = config_source,
        path = %config_path,
        "resolved configuration path"
    );

    let pool = examdesk_db::create_pool(
        &config.database.path,
        config.database.runtime_settings(),
    )?;
    let conn = pool.get()?;
    tracing::info!(path = %config.database.path, "opened database session");

    Ok(Session { config, conn })
}

/// Installs the global `tracing` subscriber, writing to stderr so that
/// stdout carries only the script's report. Later calls are no-ops.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
