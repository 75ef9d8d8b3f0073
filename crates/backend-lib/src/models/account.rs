//! Account (user) document.
//!
//! The plaintext password lives only in memory, in a zeroizing buffer, and
//! only for the lifetime of this value. Saving requires it, so an account
//! loaded from the store must have its password supplied again before it
//! can be written back.
use std::fmt;

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::auth::{verify_password, CredentialManager};
use crate::error::AppError;
use crate::store::{oid_hex, Document, IndexSpec};
use crate::validation::{validate_email, validate_password, validate_presence_of, validate_username};

/// Collection name for accounts
pub const ACCOUNT_COLLECTION: &str = "users";

/// A registered user
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id", default, with = "oid_hex", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub username: String,

    pub email: String,

    /// Reputation score
    #[serde(default)]
    pub karma_points: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_website: Option<String>,

    #[serde(default)]
    pub salt: String,

    #[serde(rename = "hashed_password", default)]
    pub hashed_password: String,

    #[serde(skip)]
    password: Option<Zeroizing<String>>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id())
            .field("username", &self.username)
            .field("email", &self.email)
            .field("karma_points", &self.karma_points)
            .field("personal_website", &self.personal_website)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl Account {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Assign a new password: a fresh salt and hash are computed right away.
    ///
    /// An empty password clears any pending plaintext and fails, so the next
    /// save is rejected as well.
    pub fn set_password(
        &mut self,
        credentials: &CredentialManager,
        plain: &str,
    ) -> Result<(), AppError> {
        self.password = None;
        let salted = credentials.hash_new_password(plain)?;
        self.salt = salted.salt;
        self.hashed_password = salted.hashed;
        self.password = Some(Zeroizing::new(plain.to_string()));
        Ok(())
    }

    /// Plaintext set during this value's lifetime, if any
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().map(String::as_str)
    }

    /// Check a candidate password against the stored hash
    pub fn authenticate(&self, candidate: &str) -> bool {
        verify_password(&self.salt, &self.hashed_password, candidate)
    }

    /// Whether a non-empty plaintext password is pending
    pub fn validate(&self) -> bool {
        validate_presence_of(self.password())
    }

    /// Whether the stored hash predates the configured scheme
    pub fn needs_rehash(&self, credentials: &CredentialManager) -> bool {
        credentials.needs_rehash(&self.hashed_password)
    }
}

impl Document for Account {
    const COLLECTION: &'static str = ACCOUNT_COLLECTION;

    fn object_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_object_id(&mut self, id: Option<ObjectId>) {
        self.id = id;
    }

    fn indexes() -> Vec<IndexSpec> {
        vec![IndexSpec::unique("username"), IndexSpec::unique("email")]
    }

    fn pre_save(&mut self, _is_new: bool) -> Result<(), AppError> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password(self.password())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PasswordScheme;
    use crate::validation::ValidationError;

    fn credentials() -> CredentialManager {
        CredentialManager::new(PasswordScheme::HmacSha1)
    }

    fn alice() -> Account {
        let mut account = Account::new("alice", "a@x.com");
        account.set_password(&credentials(), "secret1").unwrap();
        account
    }

    #[test]
    fn test_set_password_then_authenticate() {
        let account = alice();
        assert!(!account.salt.is_empty());
        assert_ne!(account.hashed_password, "secret1");
        assert!(account.authenticate("secret1"));
        assert!(!account.authenticate("wrong"));
        assert!(account.validate());
    }

    #[test]
    fn test_each_assignment_gets_new_salt() {
        let mut account = alice();
        let first_salt = account.salt.clone();
        account.set_password(&credentials(), "secret1").unwrap();
        assert_ne!(account.salt, first_salt);
        assert!(account.authenticate("secret1"));
    }

    #[test]
    fn test_empty_password_fails_and_blocks_save() {
        let mut account = alice();
        let err = account.set_password(&credentials(), "").unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::MissingPassword)));
        assert!(!account.validate());
        assert!(account.pre_save(true).is_err());
    }

    #[test]
    fn test_pre_save_requires_all_fields() {
        let mut no_password = Account::new("alice", "a@x.com");
        assert!(matches!(
            no_password.pre_save(true),
            Err(AppError::Validation(ValidationError::MissingPassword))
        ));

        let mut no_username = alice();
        no_username.username.clear();
        assert!(matches!(
            no_username.pre_save(true),
            Err(AppError::Validation(ValidationError::MissingUsername))
        ));

        let mut no_email = alice();
        no_email.email.clear();
        assert!(matches!(
            no_email.pre_save(true),
            Err(AppError::Validation(ValidationError::MissingEmail))
        ));

        assert!(alice().pre_save(true).is_ok());
    }

    #[test]
    fn test_plaintext_never_serialized() {
        let value = serde_json::to_value(alice()).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("password"));
        assert!(obj.contains_key("hashed_password"));
        assert!(obj.contains_key("karmaPoints"));
        assert!(!value.to_string().contains("secret1"));

        let loaded: Account = serde_json::from_value(value).unwrap();
        assert_eq!(loaded.password(), None);
        assert!(loaded.authenticate("secret1"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", alice());
        assert!(!rendered.contains("secret1"));
        assert!(rendered.contains("<redacted>"));
    }
}
