//! Portal Token Data

use jiff::Timestamp;

use crate::domain::portal_tokens::{
    metadata::PortalMetadata, records::PortalTokenRecord, token::RawPortalToken,
};

/// Token issue request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPortalToken {
    /// CRM artisan the token is for.
    pub crm_artisan_id: String,
    /// Intervention to link the token to.
    pub crm_intervention_id: Option<String>,
    /// Caller-supplied context stored with the token.
    pub metadata: PortalMetadata,
}

impl NewPortalToken {
    /// Request for `artisan` with no intervention or metadata.
    #[must_use]
    pub fn for_artisan(artisan: impl Into<String>) -> Self {
        Self {
            crm_artisan_id: artisan.into(),
            ..Self::default()
        }
    }

    /// Link the token to an intervention.
    #[must_use]
    pub fn intervention(mut self, intervention: impl Into<String>) -> Self {
        self.crm_intervention_id = Some(intervention.into());
        self
    }

    /// Attach metadata.
    #[must_use]
    pub fn metadata(mut self, metadata: PortalMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A freshly issued token. The raw value is not retrievable afterwards.
#[derive(Debug, Clone)]
pub struct IssuedPortalToken {
    /// The raw token.
    pub token: RawPortalToken,
    /// Artisan-facing link embedding the token.
    pub portal_url: String,
    /// Expiry.
    pub expires_at: Timestamp,
    /// Issue time.
    pub created_at: Timestamp,

    /// Whether a previously active token for the artisan was deactivated.
    pub rotated: bool,

    /// Stored token.
    pub record: PortalTokenRecord,
}

/// What a portal endpoint needs from the token besides validity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PortalTokenRequirement {
    /// Any valid token.
    #[default]
    Any,

    /// The token must be linked to an intervention.
    Intervention,
}

/// Public links handed out alongside tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalLinks {
    public_url: String,
}

impl PortalLinks {
    /// Links rooted at `public_url`. A trailing slash is ignored.
    #[must_use]
    pub fn new(public_url: impl Into<String>) -> Self {
        let public_url = public_url.into();

        Self {
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Artisan-facing link for a raw token.
    #[must_use]
    pub fn portal_url(&self, token: &RawPortalToken) -> String {
        format!("{}/t/{}", self.public_url, token.expose())
    }

    /// Where an over-quota tenant can change plan.
    #[must_use]
    pub fn upgrade_url(&self) -> String {
        format!("{}/pricing", self.public_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_strip_trailing_slash() {
        let links = PortalLinks::new("https://portal.example.com/");
        let token = RawPortalToken::new("abc123");

        assert_eq!(links.portal_url(&token), "https://portal.example.com/t/abc123");
        assert_eq!(links.upgrade_url(), "https://portal.example.com/pricing");
    }
}
