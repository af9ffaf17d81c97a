//! `portal-app db ...`

use clap::{Args, Subcommand};

mod ensure_app_role;

#[derive(Debug, Args)]
pub(crate) struct DbCommand {
    #[command(subcommand)]
    command: DbSubcommand,
}

#[derive(Debug, Subcommand)]
enum DbSubcommand {
    /// Create or update the runtime role the server connects as (NOBYPASSRLS)
    EnsureAppRole(ensure_app_role::EnsureAppRoleArgs),
}

pub(crate) async fn run(command: DbCommand) -> Result<(), String> {
    let DbSubcommand::EnsureAppRole(args) = command.command;

    ensure_app_role::run(args).await
}
