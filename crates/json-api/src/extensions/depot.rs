//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::Depot;

use portal_app::domain::{
    api_keys::records::AuthenticatedTenant, portal_tokens::records::PortalSession,
};

use crate::errors::ApiError;

/// Typed access to what the middlewares put in the depot.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, ApiError>;

    fn insert_tenant(&mut self, tenant: AuthenticatedTenant);

    /// The tenant authenticated by its API key.
    fn tenant_or_401(&self) -> Result<&AuthenticatedTenant, ApiError>;

    fn insert_portal_session(&mut self, session: PortalSession);

    /// The artisan authenticated by a portal token.
    fn portal_session_or_401(&self) -> Result<&PortalSession, ApiError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, ApiError> {
        self.obtain::<T>().map_err(|_missing| {
            ApiError::internal("depot value missing", &std::any::type_name::<T>())
        })
    }

    fn insert_tenant(&mut self, tenant: AuthenticatedTenant) {
        self.inject(tenant);
    }

    fn tenant_or_401(&self) -> Result<&AuthenticatedTenant, ApiError> {
        self.obtain::<AuthenticatedTenant>().map_err(|_missing| {
            ApiError::unauthorized("missing_credentials", "Missing API credentials")
        })
    }

    fn insert_portal_session(&mut self, session: PortalSession) {
        self.inject(session);
    }

    fn portal_session_or_401(&self) -> Result<&PortalSession, ApiError> {
        self.obtain::<PortalSession>()
            .map_err(|_missing| ApiError::unauthorized("token_required", "Token required"))
    }
}
