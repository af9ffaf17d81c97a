use clap::{Parser, Subcommand};
use portal_app::database::{self, Db};

mod api_key;
mod db;
mod tenant;

#[derive(Debug, Parser)]
#[command(name = "portal-app", about = "Artisan portal operator CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Tenant(tenant::TenantCommand),
    ApiKey(api_key::ApiKeyCommand),
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Tenant(command) => tenant::run(command).await,
            Commands::ApiKey(command) => api_key::run(command).await,
            Commands::Db(command) => db::run(command).await,
        }
    }
}

/// Connect for an operator command.
///
/// Operators usually hold an administrative URL; tenant creation and key
/// management go through the same services as the server.
pub(crate) async fn connect(database_url: &str) -> Result<Db, String> {
    database::connect(database_url)
        .await
        .map(Db::new)
        .map_err(|error| format!("failed to connect to database: {error}"))
}
