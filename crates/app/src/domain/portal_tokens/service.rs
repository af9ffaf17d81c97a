//! Portal token issue, rotation and authentication.

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    database::Db,
    dispatch::Dispatcher,
    domain::{
        audit::{AuditAction, NewAuditEntry, PgAuditRepository},
        portal_tokens::{
            data::{IssuedPortalToken, NewPortalToken, PortalLinks, PortalTokenRequirement},
            errors::{PortalTokenError, TokenIssueError},
            records::{PortalSession, PortalTokenUuid},
            repository::{PgPortalTokensRepository, PortalTokenInsert},
            token::{RawPortalToken, hash_token},
        },
        tenants::{records::TenantUuid, repository::PgTenantsRepository},
        uploads::is_safe_path_segment,
    },
};

/// Fixed lifetime of a newly issued token.
pub const TOKEN_LIFETIME: SignedDuration = SignedDuration::from_hours(365 * 24);

/// [`PortalTokensService`] backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgPortalTokensService {
    db: Db,
    links: PortalLinks,
    dispatcher: Dispatcher,
    repository: PgPortalTokensRepository,
    tenants: PgTenantsRepository,
    audit: PgAuditRepository,
}

impl PgPortalTokensService {
    /// Build the service.
    #[must_use]
    pub fn new(db: Db, links: PortalLinks, dispatcher: Dispatcher) -> Self {
        Self {
            db,
            links,
            dispatcher,
            repository: PgPortalTokensRepository::new(),
            tenants: PgTenantsRepository::new(),
            audit: PgAuditRepository::new(),
        }
    }

    async fn touch_last_accessed(&self, token: PortalTokenUuid) {
        let db = self.db.clone();
        let repository = self.repository.clone();

        self.dispatcher
            .dispatch("portal_token.touch_last_accessed", async move {
                let mut tx = db.begin_transaction().await?;

                repository.touch_token_last_accessed(&mut tx, token).await?;

                tx.commit().await
            })
            .await;
    }
}

#[async_trait]
impl PortalTokensService for PgPortalTokensService {
    async fn issue_token(
        &self,
        tenant: TenantUuid,
        request: NewPortalToken,
    ) -> Result<IssuedPortalToken, TokenIssueError> {
        let artisan = request.crm_artisan_id.trim();

        if artisan.is_empty() {
            return Err(TokenIssueError::MissingArtisan);
        }

        // Artisan ids become object path segments for uploads.
        if !is_safe_path_segment(artisan) {
            return Err(TokenIssueError::InvalidArtisan);
        }

        let intervention = request
            .crm_intervention_id
            .as_deref()
            .map(str::trim)
            .filter(|intervention| !intervention.is_empty());

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let tenant_record = self.tenants.lock_tenant(&mut tx, tenant).await?;

        let existing = self
            .repository
            .find_active_artisan_token(&mut tx, tenant, artisan)
            .await?;

        // Rotation never consumes quota; only a new artisan is counted.
        if existing.is_none() {
            let current = self.tenants.count_active_artisans(&mut tx, tenant).await?;

            if current >= tenant_record.allowed_artisans {
                return Err(TokenIssueError::QuotaExceeded {
                    limit: tenant_record.allowed_artisans,
                    current,
                });
            }
        }

        let deactivated = self
            .repository
            .deactivate_artisan_tokens(&mut tx, tenant, artisan)
            .await?;

        let token = RawPortalToken::generate();
        let token_prefix = token.prefix();

        let record = self
            .repository
            .create_portal_token(
                &mut tx,
                PortalTokenInsert {
                    uuid: PortalTokenUuid::new(),
                    tenant,
                    crm_artisan_id: artisan,
                    crm_intervention_id: intervention,
                    token_hash: token.hash(),
                    token_prefix: token_prefix.clone(),
                    metadata: &request.metadata,
                    expires_at: Timestamp::now() + TOKEN_LIFETIME,
                },
            )
            .await?;

        let rotated = deactivated > 0;

        self.audit
            .record(
                &mut tx,
                NewAuditEntry::new(tenant, AuditAction::TokenCreated, "token")
                    .resource(record.uuid)
                    .details(json!({
                        "crm_artisan_id": record.crm_artisan_id,
                        "crm_intervention_id": record.crm_intervention_id,
                        "token_prefix": token_prefix,
                        "rotated": rotated,
                    })),
            )
            .await?;

        tx.commit().await?;

        info!(
            tenant = %tenant,
            token_prefix = %record.token_prefix,
            rotated,
            "issued portal token"
        );

        let expires_at = record.expires_at.unwrap_or(record.created_at + TOKEN_LIFETIME);

        Ok(IssuedPortalToken {
            portal_url: self.links.portal_url(&token),
            token,
            expires_at,
            created_at: record.created_at,
            rotated,
            record,
        })
    }

    async fn authenticate<'a>(
        &self,
        token: Option<&'a str>,
        requirement: PortalTokenRequirement,
    ) -> Result<PortalSession, PortalTokenError> {
        let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) else {
            return Err(PortalTokenError::TokenRequired);
        };

        let mut tx = self.db.begin_transaction().await?;

        let record = self
            .repository
            .find_token_by_hash(&mut tx, &hash_token(token))
            .await?;

        tx.commit().await?;

        let Some(record) = record else {
            return Err(PortalTokenError::InvalidToken);
        };

        if !record.is_active {
            debug!(token_prefix = %record.token_prefix, "rejected revoked portal token");

            return Err(PortalTokenError::TokenRevoked);
        }

        if record.is_expired_at(Timestamp::now()) {
            return Err(PortalTokenError::TokenExpired);
        }

        if requirement == PortalTokenRequirement::Intervention
            && record.crm_intervention_id.is_none()
        {
            return Err(PortalTokenError::TokenNotLinked);
        }

        self.touch_last_accessed(record.uuid).await;

        Ok(PortalSession::from(record))
    }
}

/// Portal token operations.
#[automock]
#[async_trait]
pub trait PortalTokensService: Send + Sync {
    /// Issue a token for an artisan, deactivating any previous one.
    ///
    /// A new artisan must fit in the tenant's quota; rotating an existing
    /// artisan's token never counts against it.
    ///
    /// # Errors
    ///
    /// Returns [`TokenIssueError`] for an invalid artisan id, an exhausted quota or a failed insert.
    async fn issue_token(
        &self,
        tenant: TenantUuid,
        request: NewPortalToken,
    ) -> Result<IssuedPortalToken, TokenIssueError>;

    /// Resolve a raw bearer token into the artisan session it grants.
    ///
    /// # Errors
    ///
    /// Returns the first [`PortalTokenError`] in check order.
    async fn authenticate<'a>(
        &self,
        token: Option<&'a str>,
        requirement: PortalTokenRequirement,
    ) -> Result<PortalSession, PortalTokenError>;
}
