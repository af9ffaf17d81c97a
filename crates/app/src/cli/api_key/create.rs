use clap::Args;
use portal_app::domain::{
    api_keys::{ApiKeysService, credentials::Scope, data::NewApiKey},
    tenants::records::TenantUuid,
};

#[derive(Debug, Args)]
pub(crate) struct CreateApiKeyArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Tenant that should own the key
    #[arg(long)]
    tenant_uuid: TenantUuid,

    /// Human-readable label
    #[arg(long, default_value = "Production")]
    label: String,

    /// Granted scope; repeat for several. Defaults to tokens:write and submissions:read
    #[arg(long = "scope")]
    scopes: Vec<Scope>,
}

#[expect(clippy::print_stdout, reason = "operator-facing CLI output")]
pub(crate) async fn run(args: CreateApiKeyArgs) -> Result<(), String> {
    let service = super::service(&args.database_url).await?;

    let scopes = if args.scopes.is_empty() {
        Scope::defaults().to_vec()
    } else {
        args.scopes
    };

    let issued = service
        .create_api_key(
            args.tenant_uuid,
            NewApiKey {
                label: args.label,
                scopes,
            },
        )
        .await
        .map_err(|error| format!("failed to create api key: {error}"))?;

    println!("tenant_uuid: {}", issued.record.tenant_uuid);
    println!("label: {}", issued.record.label);
    println!("scopes: {}", issued.record.scopes.join(","));
    println!("key_id: {}", issued.record.key_id);
    println!("secret: {}", issued.secret.expose());
    println!("store this secret now; it is only shown once");

    Ok(())
}
