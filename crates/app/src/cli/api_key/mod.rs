use clap::{Args, Subcommand};
use portal_app::{
    database::Db,
    dispatch::Dispatcher,
    domain::api_keys::{PgApiKeysService, credentials::SecretHasher},
};

mod create;
mod list;
mod revoke;

#[derive(Debug, Args)]
pub(crate) struct ApiKeyCommand {
    #[command(subcommand)]
    command: ApiKeySubcommand,
}

#[derive(Debug, Subcommand)]
enum ApiKeySubcommand {
    Create(create::CreateApiKeyArgs),
    List(list::ListApiKeysArgs),
    Revoke(revoke::RevokeApiKeyArgs),
}

pub(crate) async fn run(command: ApiKeyCommand) -> Result<(), String> {
    match command.command {
        ApiKeySubcommand::Create(args) => create::run(args).await,
        ApiKeySubcommand::List(args) => list::run(args).await,
        ApiKeySubcommand::Revoke(args) => revoke::run(args).await,
    }
}

async fn service(database_url: &str) -> Result<PgApiKeysService, String> {
    let db: Db = super::connect(database_url).await?;
    let hasher = SecretHasher::recommended()
        .map_err(|error| format!("failed to initialise secret hasher: {error}"))?;

    Ok(PgApiKeysService::new(db, hasher, Dispatcher::Inline))
}
