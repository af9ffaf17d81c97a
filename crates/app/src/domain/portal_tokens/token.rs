//! Portal bearer tokens.

use std::fmt;

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

const TOKEN_BYTES: usize = 32;

/// Number of leading characters kept as a non-secret display fragment.
pub const TOKEN_PREFIX_LEN: usize = 8;

/// Raw portal token. Only ever handed to the issuing caller.
#[derive(Clone, PartialEq, Eq)]
pub struct RawPortalToken(String);

impl RawPortalToken {
    /// Wrap a token received from a client.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 32 random bytes, rendered as lowercase hex.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];

        OsRng.fill_bytes(&mut bytes);

        let token = Self(hex::encode(bytes));

        bytes.zeroize();

        token
    }

    /// The raw value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// SHA-256 of the token, hex encoded. This is the only form persisted.
    #[must_use]
    pub fn hash(&self) -> String {
        hash_token(&self.0)
    }

    /// The stored prefix of the token.
    #[must_use]
    pub fn prefix(&self) -> String {
        self.0.chars().take(TOKEN_PREFIX_LEN).collect()
    }
}

impl fmt::Debug for RawPortalToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawPortalToken({}…)", self.prefix())
    }
}

impl Drop for RawPortalToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Deterministic one-way hash used for token lookup.
#[must_use]
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_64_lowercase_hex() {
        let token = RawPortalToken::generate();

        assert_eq!(token.expose().len(), 64);
        assert!(
            token
                .expose()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)),
            "token must be lowercase hex"
        );
    }

    #[test]
    fn hash_is_stable_sha256_hex() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(RawPortalToken::new("abc").hash(), hash_token("abc"));
    }

    #[test]
    fn prefix_is_first_eight_characters() {
        let token = RawPortalToken::new("0123456789abcdef");

        assert_eq!(token.prefix(), "01234567");
    }

    #[test]
    fn debug_shows_only_the_prefix() {
        let token = RawPortalToken::new("0123456789abcdef");

        let rendered = format!("{token:?}");

        assert!(rendered.contains("01234567"));
        assert!(!rendered.contains("89abcdef"));
    }
}
