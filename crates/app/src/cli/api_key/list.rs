use clap::Args;
use portal_app::domain::{api_keys::ApiKeysService, tenants::records::TenantUuid};

#[derive(Debug, Args)]
pub(crate) struct ListApiKeysArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Tenant whose keys should be listed
    #[arg(long)]
    tenant_uuid: TenantUuid,
}

#[expect(clippy::print_stdout, reason = "operator-facing CLI output")]
pub(crate) async fn run(args: ListApiKeysArgs) -> Result<(), String> {
    let service = super::service(&args.database_url).await?;

    let keys = service
        .list_api_keys(args.tenant_uuid)
        .await
        .map_err(|error| format!("failed to list api keys: {error}"))?;

    if keys.is_empty() {
        println!("no api keys found for tenant {}", args.tenant_uuid);
        return Ok(());
    }

    for key in keys {
        println!("key_id: {}", key.key_id);
        println!("label: {}", key.label);
        println!("scopes: {}", key.scopes.join(","));
        println!("created_at: {}", key.created_at);
        println!(
            "last_used_at: {}",
            key.last_used_at
                .map_or_else(|| "never".to_string(), |value| value.to_string())
        );
        println!(
            "revoked_at: {}",
            key.revoked_at
                .map_or_else(|| "active".to_string(), |value| value.to_string())
        );
        println!();
    }

    Ok(())
}
