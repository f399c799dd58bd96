//! Apply pending schema migrations to the configured database.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;

use clap::Parser;
use ortho_config::OrthoConfig;
use social_backend::outbound::persistence::run_pending_migrations;
use social_backend::settings::CoreSettings;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `migrate` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "migrate",
    about = "Apply pending schema migrations to the social backend database",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `SOCIAL_DATABASE_URL` when
    /// omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing subscriber already initialised");
    }

    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let database_url = resolve_database_url(args.database_url)?;
    let applied = run_pending_migrations(&database_url).map_err(io::Error::other)?;
    info!(count = applied.len(), "migrations complete");
    Ok(())
}

fn resolve_database_url(cli_value: Option<String>) -> io::Result<String> {
    if let Some(url) = cli_value {
        return Ok(url);
    }
    let settings = CoreSettings::load_from_iter([OsString::from("migrate")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    settings.database_url.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "missing database URL: pass --database-url or set SOCIAL_DATABASE_URL",
        )
    })
}
