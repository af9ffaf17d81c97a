use clap::Args;
use portal_app::database;
use sqlx::{Postgres, Transaction, query, query_scalar};

/// Flags that keep the runtime role under row-level security.
const RUNTIME_ROLE_FLAGS: &str =
    "LOGIN NOSUPERUSER NOCREATEDB NOCREATEROLE NOREPLICATION NOBYPASSRLS";

#[derive(Debug, Args)]
pub(crate) struct EnsureAppRoleArgs {
    /// Administrative PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Role the portal server connects as
    #[arg(long, default_value = "portal_app")]
    role_name: String,

    /// Password to set on the role
    #[arg(long, env = "APP_DB_PASSWORD", hide_env_values = true)]
    password: String,
}

async fn quoted(
    tx: &mut Transaction<'_, Postgres>,
    function: &str,
    value: &str,
) -> Result<String, String> {
    query_scalar(&format!("SELECT {function}($1)"))
        .bind(value)
        .fetch_one(&mut **tx)
        .await
        .map_err(|error| format!("failed to quote value with {function}: {error}"))
}

#[expect(clippy::print_stdout, reason = "operator-facing CLI output")]
pub(crate) async fn run(args: EnsureAppRoleArgs) -> Result<(), String> {
    let role_name = args.role_name.trim();

    if role_name.is_empty() {
        return Err("role_name cannot be empty".to_string());
    }

    if args.password.trim().is_empty() {
        return Err("password cannot be empty".to_string());
    }

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|error| format!("failed to start transaction: {error}"))?;

    // Identifiers cannot be bound, so the server quotes them first.
    let role = quoted(&mut tx, "quote_ident", role_name).await?;
    let password = quoted(&mut tx, "quote_literal", &args.password).await?;

    let exists: bool = query_scalar("SELECT EXISTS (SELECT 1 FROM pg_roles WHERE rolname = $1)")
        .bind(role_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| format!("failed to check role existence: {error}"))?;

    let verb = if exists { "ALTER" } else { "CREATE" };

    let database: String = query_scalar("SELECT quote_ident(current_database())")
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| format!("failed to resolve database name: {error}"))?;

    let statements = [
        format!("{verb} ROLE {role} {RUNTIME_ROLE_FLAGS} PASSWORD {password}"),
        format!("GRANT CONNECT ON DATABASE {database} TO {role}"),
        format!("GRANT USAGE ON SCHEMA public TO {role}"),
        format!("GRANT SELECT, INSERT, UPDATE, DELETE ON ALL TABLES IN SCHEMA public TO {role}"),
        format!(
            "ALTER DEFAULT PRIVILEGES IN SCHEMA public \
             GRANT SELECT, INSERT, UPDATE, DELETE ON TABLES TO {role}"
        ),
    ];

    for (index, sql) in statements.iter().enumerate() {
        query(sql)
            .execute(&mut *tx)
            .await
            // The first statement carries the password.
            .map_err(|error| format!("failed to apply statement #{}: {error}", index + 1))?;
    }

    tx.commit()
        .await
        .map_err(|error| format!("failed to commit changes: {error}"))?;

    println!("ensured app role: {role_name}");
    println!("role cannot bypass row-level security; grants applied to the public schema");

    Ok(())
}
