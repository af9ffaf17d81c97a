//! Storage Config

use clap::Args;

use portal_app::storage::ObjectStoreConfig;

/// Object storage settings.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Object storage origin
    #[arg(long, env = "STORAGE_URL")]
    pub storage_url: String,

    /// Service credential for the object store
    #[arg(long, env = "STORAGE_SERVICE_KEY", hide_env_values = true)]
    pub storage_service_key: String,

    /// Bucket holding artisan uploads
    #[arg(long = "storage-bucket", env = "STORAGE_BUCKET", default_value = "artisan-uploads")]
    pub bucket: String,
}

impl StorageConfig {
    #[must_use]
    pub fn object_store_config(&self) -> ObjectStoreConfig {
        ObjectStoreConfig {
            url: self.storage_url.clone(),
            service_key: self.storage_service_key.clone(),
            bucket: self.bucket.clone(),
        }
    }
}
