//! CRM Config

use clap::Args;

use portal_app::crm::CrmConfig;

/// CRM connection settings.
#[derive(Debug, Args)]
pub struct CrmSettingsConfig {
    /// CRM origin
    #[arg(long, env = "CRM_API_URL")]
    pub crm_api_url: String,

    /// Key id sent to the CRM in `X-GMBS-Key-Id`
    #[arg(long, env = "CRM_KEY_ID")]
    pub crm_key_id: String,

    /// Secret sent to the CRM in `X-GMBS-Secret`
    #[arg(long, env = "CRM_SECRET", hide_env_values = true)]
    pub crm_secret: String,
}

impl CrmSettingsConfig {
    #[must_use]
    pub fn crm_config(&self) -> CrmConfig {
        CrmConfig {
            url: self.crm_api_url.clone(),
            key_id: self.crm_key_id.clone(),
            secret: self.crm_secret.clone(),
        }
    }
}
