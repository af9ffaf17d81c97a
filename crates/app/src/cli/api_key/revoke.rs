use clap::Args;
use portal_app::domain::{api_keys::ApiKeysService, tenants::records::TenantUuid};

#[derive(Debug, Args)]
pub(crate) struct RevokeApiKeyArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Tenant owning the key
    #[arg(long)]
    tenant_uuid: TenantUuid,

    /// Public key id (`pk_live_...`) to revoke
    #[arg(long)]
    key_id: String,
}

#[expect(clippy::print_stdout, reason = "operator-facing CLI output")]
pub(crate) async fn run(args: RevokeApiKeyArgs) -> Result<(), String> {
    let service = super::service(&args.database_url).await?;

    let revoked = service
        .revoke_api_key(args.tenant_uuid, &args.key_id)
        .await
        .map_err(|error| format!("failed to revoke api key: {error}"))?;

    if revoked {
        println!("revoked api key {}", args.key_id);
    } else {
        println!("api key {} was not active", args.key_id);
    }

    Ok(())
}
