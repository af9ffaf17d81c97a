//! Webhook signature verification.
//!
//! Header format: `t=<unix seconds>,v1=<hex>[,v1=<hex>...]`. The signature is
//! HMAC-SHA256 over `"{t}.{payload}"` keyed with the endpoint secret.

use hmac::{Hmac, Mac};
use jiff::Timestamp;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age, in seconds, of a signed payload.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Signature verification failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No signature header was sent.
    #[error("signature header is missing")]
    Missing,

    /// The header lacks a timestamp or a `v1` signature.
    #[error("signature header is malformed")]
    Malformed,

    /// The timestamp is outside [`SIGNATURE_TOLERANCE_SECS`].
    #[error("signature timestamp is outside the tolerance window")]
    Expired,

    /// No `v1` signature matches.
    #[error("no signature matches the payload")]
    Mismatch,
}

/// Check `header` against `payload` at time `now`.
///
/// # Errors
///
/// Returns a [`SignatureError`] describing why the payload cannot be trusted.
pub fn verify_signature(
    header: Option<&str>,
    payload: &[u8],
    secret: &str,
    now: Timestamp,
) -> Result<(), SignatureError> {
    let header = header
        .map(str::trim)
        .filter(|header| !header.is_empty())
        .ok_or(SignatureError::Missing)?;

    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_invalid| SignatureError::Malformed)?,
                );
            }
            Some(("v1", value)) => {
                if let Ok(signature) = hex::decode(value) {
                    signatures.push(signature);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;

    if signatures.is_empty() {
        return Err(SignatureError::Malformed);
    }

    if now.as_second().abs_diff(timestamp) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return Err(SignatureError::Expired);
    }

    let mac = signed_payload_mac(secret, timestamp, payload)?;

    if signatures
        .iter()
        .any(|signature| mac.clone().verify_slice(signature).is_ok())
    {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Build a valid header for `payload`, as the billing provider would.
#[cfg(test)]
pub(crate) fn signature_header(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, SignatureError> {
    let mac = signed_payload_mac(secret, timestamp, payload)?;

    Ok(format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn signed_payload_mac(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<HmacSha256, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_invalid| SignatureError::Malformed)?;

    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    Ok(mac)
}
