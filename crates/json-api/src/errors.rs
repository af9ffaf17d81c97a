//! JSON error responses.
//!
//! Every failure renders as `{ "error": <message>, "reason": <machine reason>, ... }`
//! where the extra fields carry what a client needs to react, such as the
//! quota figures of a `quota_exceeded` error.

use salvo::{
    Response,
    http::StatusCode,
    oapi::{self, Components, EndpointOutRegister, Operation, ToSchema},
    writing::{Json, Scribe},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

/// Documented shape of an error body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ErrorBody {
    /// Human readable message
    pub error: String,

    /// Machine readable reason, e.g. `invalid_secret`
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ApiError {
    status: StatusCode,
    reason: &'static str,
    message: String,
    extra: Map<String, Value>,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, reason: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            reason,
            message: message.into(),
            extra: Map::new(),
        }
    }

    pub(crate) fn bad_request(reason: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, reason, message)
    }

    pub(crate) fn unauthorized(reason: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, reason, message)
    }

    pub(crate) fn forbidden(reason: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, reason, message)
    }

    pub(crate) fn not_found(reason: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, reason, message)
    }

    pub(crate) fn conflict(reason: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, reason, message)
    }

    /// A collaborator (CRM, object store) failed.
    pub(crate) fn upstream(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "upstream_failure", message)
    }

    /// Log `source` with `context` and hide both from the caller.
    pub(crate) fn internal(context: &str, source: &dyn std::fmt::Display) -> Self {
        error!("{context}: {source}");

        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    }

    /// Attach an extra field to the body.
    #[must_use]
    pub(crate) fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    pub(crate) fn status(&self) -> StatusCode {
        self.status
    }

    pub(crate) fn reason(&self) -> &'static str {
        self.reason
    }

    pub(crate) fn body(&self) -> Value {
        let mut body = self.extra.clone();

        body.insert("error".to_string(), Value::String(self.message.clone()));
        body.insert("reason".to_string(), Value::String(self.reason.to_string()));

        Value::Object(body)
    }
}

impl Scribe for ApiError {
    fn render(self, res: &mut Response) {
        res.status_code(self.status);
        res.render(Json(self.body()));
    }
}

impl EndpointOutRegister for ApiError {
    fn register(components: &mut Components, operation: &mut Operation) {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
            StatusCode::CONFLICT,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
        ] {
            operation.responses.insert(
                status.as_str(),
                oapi::Response::new(status.canonical_reason().unwrap_or_default())
                    .add_content("application/json", ErrorBody::to_schema(components)),
            );
        }
    }
}
