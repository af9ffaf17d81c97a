//! Portal Token Errors

use portal_app::domain::portal_tokens::{TokenIssueError, data::PortalLinks};

use crate::errors::ApiError;

pub(crate) fn issue_error(error: TokenIssueError, links: &PortalLinks) -> ApiError {
    match error {
        TokenIssueError::MissingArtisan => {
            ApiError::bad_request("missing_artisan", "crm_artisan_id is required")
        }
        TokenIssueError::InvalidArtisan => ApiError::bad_request(
            "invalid_artisan",
            "crm_artisan_id may only contain letters, digits, `-`, `_` and `.`",
        ),
        TokenIssueError::QuotaExceeded { limit, current } => ApiError::forbidden(
            "quota_exceeded",
            format!("Artisan limit reached ({current}/{limit}), upgrade your plan to add more"),
        )
        .with("limit", limit)
        .with("current", current)
        .with("upgrade_url", links.upgrade_url()),
        TokenIssueError::AlreadyExists => ApiError::conflict(
            "token_conflict",
            "A token for this artisan was issued concurrently, retry the request",
        ),
        TokenIssueError::NotFound => ApiError::not_found("tenant_not_found", "Tenant not found"),
        TokenIssueError::InvalidReference
        | TokenIssueError::MissingRequiredData
        | TokenIssueError::InvalidData => {
            ApiError::bad_request("invalid_request", "Invalid token request")
        }
        TokenIssueError::Sql(source) => ApiError::internal("failed to issue portal token", &source),
    }
}
