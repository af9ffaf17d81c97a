//! Plain-text report template.

use jiff::{Timestamp, Zoned, tz::TimeZone};

use crate::domain::{photos::records::PhotoRecord, portal_tokens::metadata::PortalMetadata};

const DEFAULT_ARTISAN_NAME: &str = "Artisan";

/// Display name for the report header: `metadata.name`, else a generic label.
#[must_use]
pub fn artisan_name(metadata: &PortalMetadata) -> &str {
    metadata
        .text("name")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_ARTISAN_NAME)
}

/// Render the report body for `photos`, oldest first.
#[must_use]
pub fn render_report(
    intervention_id: &str,
    artisan_name: &str,
    generated_at: Timestamp,
    photos: &[PhotoRecord],
) -> String {
    let date = long_date(&generated_at.to_zoned(TimeZone::UTC));

    let photo_lines: String = photos
        .iter()
        .enumerate()
        .map(|(index, photo)| {
            let time = photo.created_at.to_zoned(TimeZone::UTC).strftime("%H:%M");
            let comment = photo
                .comment
                .as_deref()
                .map(|comment| format!(" - {comment}"))
                .unwrap_or_default();

            format!(
                "\n  {}. {} ({time}){comment}",
                index + 1,
                photo.original_filename
            )
        })
        .collect();

    format!(
        "RAPPORT D'INTERVENTION
=====================

Référence: {intervention_id}
Date: {date}
Artisan: {artisan_name}

DESCRIPTION DES TRAVAUX RÉALISÉS
--------------------------------
L'intervention a été réalisée conformément aux consignes reçues.

Les travaux suivants ont été effectués :
- Diagnostic initial de la situation
- Réalisation des travaux nécessaires
- Vérification du bon fonctionnement
- Nettoyage de la zone d'intervention

PHOTOS JOINTES ({count})
--------------------------------{photo_lines}

OBSERVATIONS
------------
L'intervention s'est déroulée dans de bonnes conditions.
Le client a été informé des travaux réalisés.

CONCLUSION
----------
Intervention réalisée avec succès.

---
Rapport généré automatiquement le {date}
Ce rapport sera transmis au gestionnaire pour validation.",
        count = photos.len(),
    )
}

/// `18 octobre 2026`
fn long_date(zoned: &Zoned) -> String {
    let month = match zoned.month() {
        1 => "janvier",
        2 => "février",
        3 => "mars",
        4 => "avril",
        5 => "mai",
        6 => "juin",
        7 => "juillet",
        8 => "août",
        9 => "septembre",
        10 => "octobre",
        11 => "novembre",
        _ => "décembre",
    };

    format!("{} {month} {}", zoned.day(), zoned.year())
}
