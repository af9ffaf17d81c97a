//! Artisan Document Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{portal_tokens::records::PortalTokenUuid, tenants::records::TenantUuid},
    uuids::TypedUuid,
};

/// Artisan Document UUID
pub type DocumentUuid = TypedUuid<DocumentRecord>;

/// Legal documents an artisan is asked to provide. One current file per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Company registration extract.
    Kbis,
    /// Professional insurance certificate.
    Assurance,
    /// Identity card, both sides.
    CniRectoVerso,
    /// Bank details.
    Iban,
    /// Signed partnership discharge.
    DechargePartenariat,
}

impl DocumentKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 5] = [
        Self::Kbis,
        Self::Assurance,
        Self::CniRectoVerso,
        Self::Iban,
        Self::DechargePartenariat,
    ];

    /// Wire name, e.g. `"cni_recto_verso"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kbis => "kbis",
            Self::Assurance => "assurance",
            Self::CniRectoVerso => "cni_recto_verso",
            Self::Iban => "iban",
            Self::DechargePartenariat => "decharge_partenariat",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document kind that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid document kind `{0}`, allowed: kbis, assurance, cni_recto_verso, iban, decharge_partenariat")]
pub struct UnknownDocumentKind(pub String);

impl FromStr for DocumentKind {
    type Err = UnknownDocumentKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownDocumentKind(value.to_string()))
    }
}

/// Artisan Document Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    /// Row id.
    pub uuid: DocumentUuid,
    /// Owning tenant.
    pub tenant_uuid: TenantUuid,
    /// Token the upload came through.
    pub portal_token_uuid: PortalTokenUuid,
    /// CRM artisan identifier.
    pub crm_artisan_id: String,
    /// Document kind.
    pub kind: DocumentKind,
    /// Generated object name.
    pub filename: String,
    /// Name given by the uploader.
    pub original_filename: String,
    /// Declared content type.
    pub mime_type: String,
    /// Size in bytes.
    pub file_size: i64,
    /// Object key in the store.
    pub storage_path: String,
    /// Upload time.
    pub created_at: Timestamp,
}

/// Upload state of one document kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStatus {
    /// Document kind.
    pub kind: DocumentKind,
    /// Whether a file is on record.
    pub uploaded: bool,
    /// Original name of the current file.
    pub filename: Option<String>,
    /// Upload time of the current file.
    pub uploaded_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_from_their_wire_names() {
        for kind in DocumentKind::ALL {
            assert_eq!(kind.as_str().parse::<DocumentKind>(), Ok(kind));
        }

        assert!("passport".parse::<DocumentKind>().is_err());
    }
}
