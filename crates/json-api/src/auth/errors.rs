//! Authentication failures as HTTP errors.

use portal_app::domain::{api_keys::TenantAuthError, portal_tokens::PortalTokenError};

use crate::errors::ApiError;

pub(crate) fn tenant_auth_error(error: TenantAuthError) -> ApiError {
    match error {
        TenantAuthError::MissingCredentials => {
            ApiError::unauthorized("missing_credentials", "Missing API credentials")
        }
        TenantAuthError::StaleRequest => ApiError::unauthorized(
            "stale_request",
            "Request timestamp is outside the accepted window",
        ),
        TenantAuthError::InvalidKey => ApiError::unauthorized("invalid_key", "Invalid API key"),
        TenantAuthError::InvalidSecret => {
            ApiError::unauthorized("invalid_secret", "Invalid API secret")
        }
        TenantAuthError::InsufficientScope { required } => ApiError::forbidden(
            "insufficient_scope",
            format!("API key lacks the `{required}` scope"),
        )
        .with("required_scope", required.as_str()),
        TenantAuthError::TenantInactive => {
            ApiError::unauthorized("tenant_inactive", "Tenant is inactive")
        }
        TenantAuthError::SubscriptionInactive { status } => ApiError::forbidden(
            "subscription_inactive",
            format!("Subscription is {status}"),
        )
        .with("status", status.as_str()),
        TenantAuthError::Credentials(source) => {
            ApiError::internal("failed to verify API secret", &source)
        }
        TenantAuthError::Sql(source) => ApiError::internal("failed to authenticate tenant", &source),
    }
}

pub(crate) fn portal_token_error(error: PortalTokenError) -> ApiError {
    match error {
        PortalTokenError::TokenRequired => ApiError::bad_request("token_required", "Token required"),
        PortalTokenError::InvalidToken => ApiError::unauthorized("invalid_token", "Invalid token"),
        PortalTokenError::TokenRevoked => ApiError::unauthorized("token_revoked", "Token revoked"),
        PortalTokenError::TokenExpired => ApiError::unauthorized("token_expired", "Token expired"),
        PortalTokenError::TokenNotLinked => ApiError::bad_request(
            "token_not_linked",
            "Token is not linked to an intervention",
        ),
        PortalTokenError::Sql(source) => {
            ApiError::internal("failed to authenticate portal token", &source)
        }
    }
}
