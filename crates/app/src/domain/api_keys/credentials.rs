//! API key credentials: generation, hashing and verification.

use std::{fmt, str::FromStr, sync::Arc};

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier as _, Version,
    password_hash::SaltString,
};
use rand::{RngCore, rngs::OsRng};
use thiserror::Error;
use zeroize::Zeroize;

/// Public key identifier prefix.
pub const KEY_ID_PREFIX: &str = "pk_live_";

/// Secret prefix.
pub const SECRET_PREFIX: &str = "sk_live_";

const KEY_ID_BYTES: usize = 16;
const SECRET_BYTES: usize = 32;

/// Capabilities an API key may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Issue portal tokens.
    TokensWrite,
    /// Read and acknowledge the submission ledger.
    SubmissionsRead,
}

impl Scope {
    /// Wire name, e.g. `"tokens:write"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TokensWrite => "tokens:write",
            Self::SubmissionsRead => "submissions:read",
        }
    }

    /// Scopes granted to keys provisioned at signup.
    #[must_use]
    pub const fn defaults() -> [Self; 2] {
        [Self::TokensWrite, Self::SubmissionsRead]
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scope name that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scope `{0}`")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "tokens:write" => Ok(Self::TokensWrite),
            "submissions:read" => Ok(Self::SubmissionsRead),
            other => Err(UnknownScope(other.to_string())),
        }
    }
}

/// Raw API secret, shown to its owner once.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecret(String);

impl ApiSecret {
    /// Wrap a secret.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The plaintext secret.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecret(**redacted**)")
    }
}

impl Drop for ApiSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Freshly generated key pair.
#[derive(Debug, Clone)]
pub struct GeneratedCredentials {
    /// Public key id, stored in clear.
    pub key_id: String,
    /// Secret, only its hash is stored.
    pub secret: ApiSecret,
}

/// Generate a `pk_live_` key id and `sk_live_` secret from the OS RNG.
#[must_use]
pub fn generate_credentials() -> GeneratedCredentials {
    let mut key_id = [0_u8; KEY_ID_BYTES];
    let mut secret = [0_u8; SECRET_BYTES];

    OsRng.fill_bytes(&mut key_id);
    OsRng.fill_bytes(&mut secret);

    let credentials = GeneratedCredentials {
        key_id: format!("{KEY_ID_PREFIX}{}", hex::encode(key_id)),
        secret: ApiSecret::new(format!("{SECRET_PREFIX}{}", hex::encode(secret))),
    };

    secret.zeroize();

    credentials
}

/// Secret hashing failures.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Invalid Argon2 parameters.
    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),

    /// Hashing or hash parsing failed.
    #[error("failed to hash secret: {0}")]
    Hash(argon2::password_hash::Error),

    /// The blocking hash task panicked or was cancelled.
    #[error("secret verification task failed")]
    Join(#[from] tokio::task::JoinError),
}

/// Salted, deliberately slow secret hashing (Argon2id).
///
/// Holds a hash of a random throwaway secret so that verification for an
/// unknown key id costs the same as for a known one.
#[derive(Clone)]
pub struct SecretHasher {
    argon: Argon2<'static>,
    dummy_hash: Arc<str>,
}

impl SecretHasher {
    /// Hasher with the argon2 crate's recommended parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the throwaway hash cannot be computed.
    pub fn recommended() -> Result<Self, CredentialError> {
        Self::from_argon(Argon2::default())
    }

    /// Hasher with explicit cost parameters.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid parameters.
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, CredentialError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(CredentialError::Params)?;

        Self::from_argon(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn from_argon(argon: Argon2<'static>) -> Result<Self, CredentialError> {
        let throwaway = generate_credentials().secret;
        let dummy_hash = hash_with(&argon, throwaway.expose())?;

        Ok(Self {
            argon,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    /// Hash a secret into a PHC string.
    ///
    /// # Errors
    ///
    /// Returns an error when hashing fails.
    pub fn hash(&self, secret: &ApiSecret) -> Result<String, CredentialError> {
        hash_with(&self.argon, secret.expose())
    }

    /// Verify a secret against a stored PHC string, or against the throwaway
    /// hash when no stored hash exists. Always performs one full evaluation.
    #[must_use]
    pub fn verify(&self, secret: &str, stored_hash: Option<&str>) -> bool {
        let Some(stored_hash) = stored_hash else {
            let _throwaway = self.check(secret, &self.dummy_hash);

            return false;
        };

        self.check(secret, stored_hash)
    }

    fn check(&self, secret: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            let _throwaway = self.check(secret, &self.dummy_hash);

            return false;
        };

        self.argon
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}

impl fmt::Debug for SecretHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretHasher").finish_non_exhaustive()
    }
}

fn hash_with(argon: &Argon2<'static>, secret: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);

    argon
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(CredentialError::Hash)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn fast_hasher() -> SecretHasher {
        SecretHasher::with_params(1024, 1, 1).expect("valid argon2 params")
    }

    #[test]
    fn scopes_parse_from_their_wire_names() {
        assert_eq!("tokens:write".parse(), Ok(Scope::TokensWrite));
        assert_eq!("submissions:read".parse(), Ok(Scope::SubmissionsRead));
        assert_eq!(
            "admin".parse::<Scope>(),
            Err(UnknownScope("admin".to_string()))
        );
    }

    #[test]
    fn generated_credentials_have_expected_shape() {
        let credentials = generate_credentials();

        let key_hex = credentials.key_id.strip_prefix(KEY_ID_PREFIX);
        let secret_hex = credentials.secret.expose().strip_prefix(SECRET_PREFIX);

        assert_eq!(key_hex.map(str::len), Some(32));
        assert_eq!(secret_hex.map(str::len), Some(64));
        assert!(
            key_hex.is_some_and(|hex| hex.chars().all(|c| c.is_ascii_hexdigit())),
            "key id must be hex"
        );
    }

    #[test]
    fn generated_credentials_are_unique() {
        let first = generate_credentials();
        let second = generate_credentials();

        assert_ne!(first.key_id, second.key_id);
        assert_ne!(first.secret, second.secret);
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = ApiSecret::new("sk_live_abc");

        assert_eq!(format!("{secret:?}"), "ApiSecret(**redacted**)");
    }

    #[test]
    fn hash_is_salted_and_verifies() -> TestResult {
        let hasher = fast_hasher();
        let secret = ApiSecret::new("sk_live_secret");

        let first = hasher.hash(&secret)?;
        let second = hasher.hash(&secret)?;

        assert_ne!(first, second, "salts must differ");
        assert!(hasher.verify("sk_live_secret", Some(&first)));
        assert!(!hasher.verify("sk_live_wrong", Some(&first)));

        Ok(())
    }

    #[test]
    fn missing_or_malformed_hash_never_verifies() {
        let hasher = fast_hasher();

        assert!(!hasher.verify("anything", None));
        assert!(!hasher.verify("anything", Some("not-a-phc-string")));
    }

    #[test]
    fn scopes_render_as_capability_strings() {
        assert_eq!(Scope::TokensWrite.as_str(), "tokens:write");
        assert_eq!(Scope::SubmissionsRead.as_str(), "submissions:read");
    }
}
