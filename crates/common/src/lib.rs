// ================
// common/src/lib.rs
// ================
//! Common types shared between the `scribe` backend and its clients.
//! The session cookie is the only wire-visible artifact of the backend.

use serde::{Deserialize, Serialize};

/// Opaque session credential handed back to a client after login or renewal.
///
/// Serializes to a JSON object with exactly three string fields:
/// `username`, `token` and `series`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SessionCookie {
    /// Account the session belongs to
    pub username: String,
    /// Single-use token, rotated on every renewal
    pub token: String,
    /// Stable identifier of the login lineage
    pub series: String,
}

impl SessionCookie {
    /// Build a cookie from its three parts
    pub fn new(
        username: impl Into<String>,
        token: impl Into<String>,
        series: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            series: series.into(),
        }
    }

    /// Serialize into the cookie string sent to the client
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a cookie string received from a client
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}
