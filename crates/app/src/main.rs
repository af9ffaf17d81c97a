//! Portal operator CLI: tenants, API keys and the runtime database role.

use std::process::ExitCode;

use clap::Parser;

mod cli;

#[tokio::main]
pub async fn main() -> ExitCode {
    // A missing .env is fine; flags and the environment still apply.
    _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            #[expect(clippy::print_stderr, reason = "operator-facing CLI output")]
            {
                eprintln!("error: {error}");
            }
            ExitCode::FAILURE
        }
    }
}
