//! Database Config

use clap::Args;

/// Database settings.
#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string of the runtime role (must not bypass row-level security)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,
}
