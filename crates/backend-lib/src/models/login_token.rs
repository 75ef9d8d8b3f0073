//! Login token schema
//!
//! Used for session persistence. A login token pairs a stable `series`,
//! assigned once when the record is first saved, with a `token` that is
//! reissued on every save. A client presenting a known series with a stale
//! token is replaying a stolen cookie.
use bson::oid::ObjectId;
use scribe_common::SessionCookie;
use serde::{Deserialize, Serialize};

use crate::auth::token_generator::{issue_token_with_size, DEFAULT_TOKEN_BYTES};
use crate::error::AppError;
use crate::store::{oid_hex, Document, IndexSpec};

/// Collection name for login tokens
pub const LOGIN_TOKEN_COLLECTION: &str = "login_tokens";

/// Lifecycle of a login token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No series assigned yet
    New,
    /// Series assigned, token rotates on every save
    Active,
}

/// Persistent login session record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginToken {
    #[serde(rename = "_id", default, with = "oid_hex", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub username: String,

    #[serde(default)]
    series: String,

    #[serde(default)]
    token: String,

    #[serde(skip, default = "default_token_bytes")]
    token_bytes: usize,
}

fn default_token_bytes() -> usize {
    DEFAULT_TOKEN_BYTES
}

impl LoginToken {
    /// A fresh record in the [`SessionState::New`] state
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            series: String::new(),
            token: String::new(),
            token_bytes: DEFAULT_TOKEN_BYTES,
        }
    }

    /// Override the entropy of issued tokens
    pub fn with_token_bytes(mut self, bytes: usize) -> Self {
        self.set_token_bytes(bytes);
        self
    }

    /// Size used by the next issue. Not persisted, so loaded records start
    /// from the default.
    pub fn set_token_bytes(&mut self, bytes: usize) {
        self.token_bytes = bytes;
    }

    pub fn series(&self) -> &str {
        &self.series
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn state(&self) -> SessionState {
        if self.series.is_empty() {
            SessionState::New
        } else {
            SessionState::Active
        }
    }

    /// Reissue the token; on first persist also assign the series
    pub fn on_pre_persist(&mut self, is_new: bool) {
        self.token = issue_token_with_size(self.token_bytes);
        if is_new {
            self.series = issue_token_with_size(self.token_bytes);
        }
    }

    /// Credential handed back to the client
    pub fn cookie_value(&self) -> SessionCookie {
        SessionCookie::new(&self.username, &self.token, &self.series)
    }

    /// Whether `presented` carries this record's current token
    pub fn token_matches(&self, presented: &str) -> bool {
        constant_time_eq(self.token.as_bytes(), presented.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl Document for LoginToken {
    const COLLECTION: &'static str = LOGIN_TOKEN_COLLECTION;

    fn object_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_object_id(&mut self, id: Option<ObjectId>) {
        self.id = id;
    }

    fn indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::ascending("username"),
            IndexSpec::ascending("series"),
            IndexSpec::ascending("token"),
        ]
    }

    fn pre_save(&mut self, is_new: bool) -> Result<(), AppError> {
        self.on_pre_persist(is_new);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_persist_assigns_series_and_token() {
        let mut record = LoginToken::new("alice");
        assert_eq!(record.state(), SessionState::New);

        record.on_pre_persist(true);
        assert_eq!(record.state(), SessionState::Active);
        assert!(!record.series().is_empty());
        assert!(!record.token().is_empty());
        assert_ne!(record.series(), record.token());
    }

    #[test]
    fn test_later_persists_rotate_token_only() {
        let mut record = LoginToken::new("alice");
        record.on_pre_persist(true);
        let series = record.series().to_string();
        let first = record.token().to_string();

        record.on_pre_persist(false);
        assert_eq!(record.series(), series);
        assert_ne!(record.token(), first);
    }

    #[test]
    fn test_token_size_configurable() {
        let mut record = LoginToken::new("alice").with_token_bytes(16);
        record.on_pre_persist(true);
        assert_eq!(record.token().len(), 22);
        assert_eq!(record.series().len(), 22);
    }

    #[test]
    fn test_cookie_value_fields() {
        let mut record = LoginToken::new("alice");
        record.on_pre_persist(true);

        let cookie = record.cookie_value();
        assert_eq!(cookie.username, "alice");
        assert_eq!(cookie.token, record.token());
        assert_eq!(cookie.series, record.series());

        let raw = cookie.to_json().unwrap();
        assert_eq!(SessionCookie::from_json(&raw).unwrap(), cookie);
    }

    #[test]
    fn test_token_matches() {
        let mut record = LoginToken::new("alice");
        record.on_pre_persist(true);
        let current = record.token().to_string();

        assert!(record.token_matches(&current));
        assert!(!record.token_matches("stale"));
        assert!(!record.token_matches(""));
    }

    #[test]
    fn test_deserialized_record_uses_default_token_size() {
        let record: LoginToken =
            serde_json::from_str(r#"{"username":"alice","series":"s","token":"t"}"#).unwrap();
        assert_eq!(record.state(), SessionState::Active);
        assert_eq!(record.token_bytes, DEFAULT_TOKEN_BYTES);
    }
}
