use clap::Args;
use portal_app::domain::tenants::{
    PgTenantsService, TenantsService,
    data::NewTenant,
    plans::{SubscriptionPlan, SubscriptionStatus},
    records::TenantUuid,
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CreateTenantArgs {
    /// Tenant display name
    #[arg(long)]
    name: String,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Commercial plan: basic, pro or enterprise
    #[arg(long, default_value = "basic")]
    plan: SubscriptionPlan,

    /// Subscription status: trial, active, cancelled or expired
    #[arg(long, default_value = "trial")]
    status: SubscriptionStatus,

    /// Artisan quota; defaults to the plan's limit
    #[arg(long)]
    allowed_artisans: Option<u32>,

    /// Billing contact address
    #[arg(long)]
    email: Option<String>,

    /// Optional tenant UUID; generated when omitted
    #[arg(long)]
    tenant_uuid: Option<Uuid>,
}

#[expect(clippy::print_stdout, reason = "operator-facing CLI output")]
pub(crate) async fn run(args: CreateTenantArgs) -> Result<(), String> {
    if args.name.trim().is_empty() {
        return Err("name cannot be empty".to_string());
    }

    let db = crate::cli::connect(&args.database_url).await?;
    let service = PgTenantsService::new(db);

    let uuid = args
        .tenant_uuid
        .map_or_else(TenantUuid::new, TenantUuid::from_uuid);

    let tenant = service
        .create_tenant(NewTenant {
            email: args.email,
            subscription_status: args.status,
            subscription_plan: args.plan,
            allowed_artisans: args
                .allowed_artisans
                .unwrap_or_else(|| args.plan.artisan_limit()),
            ..NewTenant::trial(uuid, args.name.trim())
        })
        .await
        .map_err(|error| format!("failed to create tenant: {error}"))?;

    println!("tenant_uuid: {}", tenant.uuid);
    println!("tenant_name: {}", tenant.name);
    println!("plan: {}", tenant.subscription_plan);
    println!("status: {}", tenant.subscription_status);
    println!("allowed_artisans: {}", tenant.allowed_artisans);

    Ok(())
}
