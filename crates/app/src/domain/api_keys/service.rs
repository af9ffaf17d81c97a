//! API keys service and tenant authenticator.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde_json::json;
use sqlx::{Postgres, Transaction};
use tokio::task;
use tracing::debug;

use crate::{
    database::Db,
    dispatch::Dispatcher,
    domain::{
        api_keys::{
            credentials::{CredentialError, Scope, SecretHasher, generate_credentials},
            data::{IssuedApiKey, NewApiKey, TenantCredentials},
            errors::{ApiKeysServiceError, TenantAuthError},
            records::{ApiKeyRecord, ApiKeyUuid, AuthenticatedTenant},
            repository::{ApiKeyInsert, PgApiKeysRepository},
        },
        audit::{AuditAction, NewAuditEntry, PgAuditRepository},
        tenants::{records::TenantUuid, repository::PgTenantsRepository},
    },
};

/// Maximum accepted distance between the client timestamp and server time.
pub const MAX_CLOCK_DRIFT_MS: u64 = 5 * 60 * 1000;

/// Creates keys inside a caller-provided transaction.
#[derive(Debug, Clone)]
pub(crate) struct ApiKeyProvisioner {
    hasher: SecretHasher,
    repository: PgApiKeysRepository,
}

impl ApiKeyProvisioner {
    pub(crate) fn new(hasher: SecretHasher) -> Self {
        Self {
            hasher,
            repository: PgApiKeysRepository::new(),
        }
    }

    pub(crate) async fn provision(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        key: &NewApiKey,
    ) -> Result<IssuedApiKey, ApiKeysServiceError> {
        let credentials = generate_credentials();

        let hasher = self.hasher.clone();
        let secret = credentials.secret.clone();

        let key_secret_hash = task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(CredentialError::from)??;

        let record = self
            .repository
            .create_api_key(
                tx,
                ApiKeyInsert {
                    uuid: ApiKeyUuid::new(),
                    tenant,
                    key_id: &credentials.key_id,
                    key_secret_hash: &key_secret_hash,
                    label: &key.label,
                    scopes: key
                        .scopes
                        .iter()
                        .map(|scope| scope.as_str().to_string())
                        .collect(),
                },
            )
            .await?;

        Ok(IssuedApiKey {
            secret: credentials.secret,
            record,
        })
    }
}

/// [`ApiKeysService`] backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgApiKeysService {
    db: Db,
    dispatcher: Dispatcher,
    hasher: SecretHasher,
    provisioner: ApiKeyProvisioner,
    repository: PgApiKeysRepository,
    tenants: PgTenantsRepository,
    audit: PgAuditRepository,
}

impl PgApiKeysService {
    /// Build the service.
    #[must_use]
    pub fn new(db: Db, hasher: SecretHasher, dispatcher: Dispatcher) -> Self {
        Self {
            db,
            dispatcher,
            provisioner: ApiKeyProvisioner::new(hasher.clone()),
            hasher,
            repository: PgApiKeysRepository::new(),
            tenants: PgTenantsRepository::new(),
            audit: PgAuditRepository::new(),
        }
    }

    async fn touch_last_used(&self, key: ApiKeyUuid) {
        let db = self.db.clone();
        let repository = self.repository.clone();

        self.dispatcher
            .dispatch("api_key.touch_last_used", async move {
                let mut tx = db.begin_transaction().await?;

                repository.touch_api_key_last_used(&mut tx, key).await?;

                tx.commit().await
            })
            .await;
    }
}

#[async_trait]
impl ApiKeysService for PgApiKeysService {
    async fn authenticate(
        &self,
        credentials: TenantCredentials,
        required_scope: Option<Scope>,
    ) -> Result<AuthenticatedTenant, TenantAuthError> {
        let key_id = credentials.key_id.filter(|value| !value.trim().is_empty());
        let secret = credentials
            .secret
            .filter(|value| !value.expose().trim().is_empty());

        let (Some(key_id), Some(secret)) = (key_id, secret) else {
            return Err(TenantAuthError::MissingCredentials);
        };

        check_request_timestamp(credentials.timestamp.as_deref(), Timestamp::now())?;

        let mut tx = self.db.begin_transaction().await?;

        let api_key = self.repository.find_active_api_key(&mut tx, &key_id).await?;

        let tenant = match &api_key {
            Some(api_key) => Some(self.tenants.get_tenant(&mut tx, api_key.tenant_uuid).await?),
            None => None,
        };

        tx.commit().await?;

        // Unknown keys still pay for one full hash evaluation.
        let hasher = self.hasher.clone();
        let stored_hash = api_key
            .as_ref()
            .map(|api_key| api_key.key_secret_hash.clone());

        let verified =
            task::spawn_blocking(move || hasher.verify(secret.expose(), stored_hash.as_deref()))
                .await
                .map_err(CredentialError::from)?;

        let (Some(api_key), Some(tenant)) = (api_key, tenant) else {
            debug!(key_id, "rejected unknown or revoked api key");

            return Err(TenantAuthError::InvalidKey);
        };

        if !verified {
            return Err(TenantAuthError::InvalidSecret);
        }

        if let Some(required) = required_scope
            && !api_key.has_scope(required)
        {
            return Err(TenantAuthError::InsufficientScope { required });
        }

        if !tenant.is_active {
            return Err(TenantAuthError::TenantInactive);
        }

        if !tenant.subscription_status.is_entitled() {
            return Err(TenantAuthError::SubscriptionInactive {
                status: tenant.subscription_status,
            });
        }

        self.touch_last_used(api_key.uuid).await;

        Ok(AuthenticatedTenant { tenant, api_key })
    }

    async fn create_api_key(
        &self,
        tenant: TenantUuid,
        key: NewApiKey,
    ) -> Result<IssuedApiKey, ApiKeysServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let issued = self.provisioner.provision(&mut tx, tenant, &key).await?;

        self.audit
            .record(
                &mut tx,
                NewAuditEntry::new(tenant, AuditAction::ApiKeyCreated, "api_key")
                    .resource(&issued.record.key_id)
                    .details(json!({
                        "label": issued.record.label,
                        "scopes": issued.record.scopes,
                    })),
            )
            .await?;

        tx.commit().await?;

        Ok(issued)
    }

    async fn list_api_keys(
        &self,
        tenant: TenantUuid,
    ) -> Result<Vec<ApiKeyRecord>, ApiKeysServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let keys = self.repository.list_api_keys(&mut tx, tenant).await?;

        tx.commit().await?;

        Ok(keys)
    }

    async fn revoke_api_key(
        &self,
        tenant: TenantUuid,
        key_id: &str,
    ) -> Result<bool, ApiKeysServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let Some(revoked) = self.repository.revoke_api_key(&mut tx, tenant, key_id).await? else {
            return Ok(false);
        };

        self.audit
            .record(
                &mut tx,
                NewAuditEntry::new(tenant, AuditAction::ApiKeyRevoked, "api_key")
                    .resource(&revoked.key_id),
            )
            .await?;

        tx.commit().await?;

        Ok(true)
    }
}

/// Reject timestamps further than [`MAX_CLOCK_DRIFT_MS`] from `now`.
///
/// A missing timestamp is accepted; an unparsable one is treated as stale.
pub(crate) fn check_request_timestamp(
    raw: Option<&str>,
    now: Timestamp,
) -> Result<(), TenantAuthError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(());
    };

    let sent_at: i64 = raw
        .parse()
        .map_err(|_unparsable| TenantAuthError::StaleRequest)?;

    if now.as_millisecond().abs_diff(sent_at) > MAX_CLOCK_DRIFT_MS {
        return Err(TenantAuthError::StaleRequest);
    }

    Ok(())
}

/// Tenant API key operations.
#[automock]
#[async_trait]
pub trait ApiKeysService: Send + Sync {
    /// Authenticate a tenant API call, optionally requiring a scope.
    ///
    /// # Errors
    ///
    /// Returns the first [`TenantAuthError`] in check order.
    async fn authenticate(
        &self,
        credentials: TenantCredentials,
        required_scope: Option<Scope>,
    ) -> Result<AuthenticatedTenant, TenantAuthError>;

    /// Create a key for a tenant. The secret is only returned here.
    ///
    /// # Errors
    ///
    /// Returns [`ApiKeysServiceError`] when hashing or the insert fails.
    async fn create_api_key(
        &self,
        tenant: TenantUuid,
        key: NewApiKey,
    ) -> Result<IssuedApiKey, ApiKeysServiceError>;

    /// List every key of a tenant, revoked ones included.
    ///
    /// # Errors
    ///
    /// Returns [`ApiKeysServiceError`] when the query fails.
    async fn list_api_keys(
        &self,
        tenant: TenantUuid,
    ) -> Result<Vec<ApiKeyRecord>, ApiKeysServiceError>;

    /// Revoke a key. Returns `false` when it was unknown or already revoked.
    ///
    /// # Errors
    ///
    /// Returns [`ApiKeysServiceError`] when the update fails.
    async fn revoke_api_key(
        &self,
        tenant: TenantUuid,
        key_id: &str,
    ) -> Result<bool, ApiKeysServiceError>;
}
