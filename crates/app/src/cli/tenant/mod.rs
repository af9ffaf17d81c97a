//! `portal-app tenant ...`

use clap::{Args, Subcommand};

mod create;

#[derive(Debug, Args)]
pub(crate) struct TenantCommand {
    #[command(subcommand)]
    command: TenantSubcommand,
}

#[derive(Debug, Subcommand)]
enum TenantSubcommand {
    /// Register a CRM customer with its plan and artisan quota
    Create(create::CreateTenantArgs),
}

pub(crate) async fn run(command: TenantCommand) -> Result<(), String> {
    let TenantSubcommand::Create(args) = command.command;

    create::run(args).await
}
