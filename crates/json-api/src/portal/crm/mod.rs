//! CRM pass-through
//!
//! The portal reads and writes CRM data on behalf of the artisan behind the
//! token. The artisan id always comes from the session, never from the
//! request, and CRM bodies are returned untouched.

pub(crate) mod documents;
mod errors;
pub(crate) mod interventions;

use portal_app::domain::uploads::is_safe_path_segment;

use crate::errors::ApiError;

pub(crate) use errors::crm_error;

fn checked_intervention(intervention_id: &str) -> Result<&str, ApiError> {
    if is_safe_path_segment(intervention_id) {
        Ok(intervention_id)
    } else {
        Err(ApiError::bad_request(
            "invalid_intervention",
            "Invalid intervention id",
        ))
    }
}
