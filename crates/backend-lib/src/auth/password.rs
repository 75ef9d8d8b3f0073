// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password salting, hashing and verification.
//!
//! New passwords are hashed with a memory-hard KDF (scrypt by default,
//! Argon2id optionally). Records imported from the legacy store carry a
//! hex HMAC-SHA1 of the password keyed by the salt; those still verify and
//! are reported by [`CredentialManager::needs_rehash`] so callers can
//! upgrade them after a successful login.
use argon2::Argon2;
use hmac::{Hmac, Mac};
use scrypt::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Params, Scrypt,
};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

use super::token_generator::random_bytes;
use crate::config::{PasswordSettings, TokenSettings};
use crate::error::AppError;
use crate::validation::validate_password;

type HmacSha1 = Hmac<Sha1>;

/// Default salt size in bytes
pub const DEFAULT_SALT_BYTES: usize = 16;

/// Hashing scheme of a stored password
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PasswordScheme {
    /// Legacy single-round HMAC-SHA1 keyed by the salt, hex encoded
    HmacSha1,
    #[default]
    Scrypt,
    Argon2,
}

impl PasswordScheme {
    /// Infer the scheme a stored hash was produced with
    pub fn detect(hashed: &str) -> Self {
        if hashed.starts_with("$scrypt$") {
            PasswordScheme::Scrypt
        } else if hashed.starts_with("$argon2") {
            PasswordScheme::Argon2
        } else {
            PasswordScheme::HmacSha1
        }
    }
}

/// Salt and hash produced for one password assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaltedHash {
    pub salt: String,
    pub hashed: String,
}

/// Turns plaintext passwords into storable salted hashes and checks candidates
#[derive(Debug, Clone)]
pub struct CredentialManager {
    scheme: PasswordScheme,
    scrypt_params: Params,
    salt_bytes: usize,
}

impl Default for CredentialManager {
    fn default() -> Self {
        Self {
            scheme: PasswordScheme::default(),
            scrypt_params: Params::recommended(),
            salt_bytes: DEFAULT_SALT_BYTES,
        }
    }
}

impl CredentialManager {
    /// Manager hashing new passwords with `scheme`
    pub fn new(scheme: PasswordScheme) -> Self {
        Self {
            scheme,
            ..Self::default()
        }
    }

    /// Build from loaded settings
    pub fn from_settings(
        password: &PasswordSettings,
        tokens: &TokenSettings,
    ) -> Result<Self, AppError> {
        let mut manager = Self::new(password.scheme).with_scrypt_log_n(password.scrypt_log_n)?;
        manager.salt_bytes = tokens.salt_bytes;
        Ok(manager)
    }

    /// Override the scrypt cost
    pub fn with_scrypt_log_n(mut self, log_n: u8) -> Result<Self, AppError> {
        self.scrypt_params = Params::new(log_n, 8, 1, Params::RECOMMENDED_LEN)
            .map_err(|e| AppError::PasswordHash(e.to_string()))?;
        Ok(self)
    }

    /// Scheme applied to newly set passwords
    pub fn scheme(&self) -> PasswordScheme {
        self.scheme
    }

    /// Generate a fresh random salt
    pub fn make_salt(&self) -> Result<String, AppError> {
        let salt = SaltString::encode_b64(&random_bytes(self.salt_bytes))
            .map_err(|e| AppError::PasswordHash(e.to_string()))?;
        Ok(salt.as_str().to_string())
    }

    /// Hash `plain` under `salt` with the configured scheme
    pub fn encrypt_password(&self, salt: &str, plain: &str) -> Result<String, AppError> {
        match self.scheme {
            PasswordScheme::HmacSha1 => hmac_sha1_hex(salt, plain),
            PasswordScheme::Scrypt => {
                let salt = parse_salt(salt)?;
                let hash = Scrypt
                    .hash_password_customized(plain.as_bytes(), None, None, self.scrypt_params, &salt)
                    .map_err(|e| AppError::PasswordHash(e.to_string()))?;
                Ok(hash.to_string())
            },
            PasswordScheme::Argon2 => {
                let salt = parse_salt(salt)?;
                let hash = Argon2::default()
                    .hash_password(plain.as_bytes(), &salt)
                    .map_err(|e| AppError::PasswordHash(e.to_string()))?;
                Ok(hash.to_string())
            },
        }
    }

    /// Salt and hash a new password. Empty passwords are rejected before any
    /// work is done.
    pub fn hash_new_password(&self, plain: &str) -> Result<SaltedHash, AppError> {
        validate_password(Some(plain))?;
        let salt = self.make_salt()?;
        let hashed = self.encrypt_password(&salt, plain)?;
        Ok(SaltedHash { salt, hashed })
    }

    /// Whether a stored hash should be replaced by one in the configured scheme
    pub fn needs_rehash(&self, hashed: &str) -> bool {
        PasswordScheme::detect(hashed) != self.scheme
    }
}

/// Check `candidate` against a stored salt and hash. Malformed hashes never
/// verify.
pub fn verify_password(salt: &str, hashed: &str, candidate: &str) -> bool {
    match PasswordScheme::detect(hashed) {
        PasswordScheme::HmacSha1 => verify_hmac_sha1(salt, hashed, candidate),
        PasswordScheme::Scrypt => match PasswordHash::new(hashed) {
            Ok(parsed) => Scrypt.verify_password(candidate.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        },
        PasswordScheme::Argon2 => match PasswordHash::new(hashed) {
            Ok(parsed) => Argon2::default()
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        },
    }
}

fn parse_salt(salt: &str) -> Result<SaltString, AppError> {
    SaltString::from_b64(salt).map_err(|e| AppError::PasswordHash(e.to_string()))
}

fn hmac_sha1(salt: &str, plain: &str) -> Result<HmacSha1, AppError> {
    let mut mac = HmacSha1::new_from_slice(salt.as_bytes())
        .map_err(|e| AppError::PasswordHash(e.to_string()))?;
    mac.update(plain.as_bytes());
    Ok(mac)
}

fn hmac_sha1_hex(salt: &str, plain: &str) -> Result<String, AppError> {
    Ok(hex::encode(hmac_sha1(salt, plain)?.finalize().into_bytes()))
}

fn verify_hmac_sha1(salt: &str, hashed: &str, candidate: &str) -> bool {
    let Ok(expected) = hex::decode(hashed) else {
        return false;
    };
    match hmac_sha1(salt, candidate) {
        Ok(mac) => mac.verify_slice(&expected).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_scrypt() -> CredentialManager {
        CredentialManager::new(PasswordScheme::Scrypt)
            .with_scrypt_log_n(8)
            .unwrap()
    }

    fn all_managers() -> Vec<CredentialManager> {
        vec![
            CredentialManager::new(PasswordScheme::HmacSha1),
            fast_scrypt(),
            CredentialManager::new(PasswordScheme::Argon2),
        ]
    }

    #[test]
    fn test_hash_then_verify_every_scheme() {
        for manager in all_managers() {
            let salted = manager.hash_new_password("secret1").unwrap();
            assert!(verify_password(&salted.salt, &salted.hashed, "secret1"));
            assert!(!verify_password(&salted.salt, &salted.hashed, "wrong"));
            assert_eq!(PasswordScheme::detect(&salted.hashed), manager.scheme());
        }
    }

    #[test]
    fn test_empty_password_rejected() {
        for manager in all_managers() {
            assert!(matches!(
                manager.hash_new_password(""),
                Err(AppError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_same_salt_different_passwords_differ() {
        for manager in all_managers() {
            let salt = manager.make_salt().unwrap();
            let a = manager.encrypt_password(&salt, "secret1").unwrap();
            let b = manager.encrypt_password(&salt, "secret2").unwrap();
            assert_ne!(a, b);
            // deterministic for a fixed salt
            assert_eq!(a, manager.encrypt_password(&salt, "secret1").unwrap());
        }
    }

    #[test]
    fn test_fresh_salt_per_call() {
        let manager = CredentialManager::new(PasswordScheme::HmacSha1);
        let first = manager.hash_new_password("secret1").unwrap();
        let second = manager.hash_new_password("secret1").unwrap();
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hashed, second.hashed);
    }

    #[test]
    fn test_legacy_hmac_sha1_vector() {
        // RFC 2202 test case 2: key "Jefe"
        let hashed = hmac_sha1_hex("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(hashed, "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79");
        assert!(verify_password("Jefe", &hashed, "what do ya want for nothing?"));
    }

    #[test]
    fn test_legacy_numeric_salt_verifies() {
        // old records used a decimal string salt
        let salt = "1137456123";
        let hashed = hmac_sha1_hex(salt, "hunter22").unwrap();
        assert!(verify_password(salt, &hashed, "hunter22"));
        assert!(!verify_password(salt, &hashed, "hunter23"));
    }

    #[test]
    fn test_malformed_hashes_never_verify() {
        assert!(!verify_password("salt", "not-hex!", "anything"));
        assert!(!verify_password("salt", "$scrypt$garbage", "anything"));
        assert!(!verify_password("salt", "$argon2id$garbage", "anything"));
        assert!(!verify_password("salt", "", "anything"));
    }

    #[test]
    fn test_needs_rehash() {
        let legacy = CredentialManager::new(PasswordScheme::HmacSha1);
        let salted = legacy.hash_new_password("secret1").unwrap();

        assert!(!legacy.needs_rehash(&salted.hashed));
        assert!(fast_scrypt().needs_rehash(&salted.hashed));
    }

    #[test]
    fn test_scheme_serde_names() {
        assert_eq!(
            serde_json::to_string(&PasswordScheme::HmacSha1).unwrap(),
            "\"hmac-sha1\""
        );
        assert_eq!(
            serde_json::from_str::<PasswordScheme>("\"argon2\"").unwrap(),
            PasswordScheme::Argon2
        );
    }
}
