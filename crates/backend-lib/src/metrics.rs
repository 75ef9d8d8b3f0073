// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const ACCOUNT_REGISTERED: &str = "account.registered";
pub const AUTH_FAILED: &str = "auth.failed";
pub const PASSWORD_REHASHED: &str = "password.rehashed";
pub const SESSION_ISSUED: &str = "session.issued";
pub const SESSION_RENEWED: &str = "session.renewed";
pub const SESSION_REVOKED: &str = "session.revoked";
pub const SESSION_THEFT_DETECTED: &str = "session.theft_detected";
