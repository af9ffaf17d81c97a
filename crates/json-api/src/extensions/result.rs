//! Fallible-call helpers.

use std::fmt::Display;

use crate::errors::ApiError;

pub(crate) trait ResultExt<T> {
    /// Log the error under `context` and answer 500 `internal_error`.
    fn or_500(self, context: &str) -> Result<T, ApiError>;
}

impl<T, E: Display> ResultExt<T> for Result<T, E> {
    fn or_500(self, context: &str) -> Result<T, ApiError> {
        self.map_err(|error| ApiError::internal(context, &error))
    }
}
