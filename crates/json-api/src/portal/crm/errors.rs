//! CRM Errors

use tracing::warn;

use portal_app::crm::CrmError;

use crate::{errors::ApiError, observability::observe_upstream_failure};

pub(crate) fn crm_error(error: CrmError) -> ApiError {
    warn!("CRM request failed: {error}");
    observe_upstream_failure("crm");

    match error {
        CrmError::Http(_) => ApiError::upstream("CRM unavailable"),
        CrmError::UnexpectedResponse { status, message } => {
            ApiError::upstream(message).with("upstream_status", status)
        }
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;
    use serde_json::json;

    use super::*;

    #[test]
    fn upstream_status_is_surfaced() {
        let error = crm_error(CrmError::UnexpectedResponse {
            status: 404,
            message: "Intervention introuvable".to_string(),
        });

        assert_eq!(error.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            error.body(),
            json!({
                "error": "Intervention introuvable",
                "reason": "upstream_failure",
                "upstream_status": 404,
            })
        );
    }
}
