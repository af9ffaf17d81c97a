//! Portal Config

use clap::Args;

/// Public portal settings.
#[derive(Debug, Args)]
pub struct PortalConfig {
    /// Public origin of the artisan portal, used to build portal and upgrade links
    #[arg(long, env = "PORTAL_PUBLIC_URL")]
    pub public_url: String,
}
