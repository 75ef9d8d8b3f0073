// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod token_generator;
mod service;
mod service_impl;

pub use password::{verify_password, CredentialManager, PasswordScheme, SaltedHash};
pub use service::{AuthService, Registration};
pub use service_impl::DefaultAuth;
pub use token_generator::issue_token;
