use async_trait::async_trait;
use scribe_common::SessionCookie;

use crate::error::AppError;
use crate::models::Account;

/// Input for creating an account
#[derive(Clone, Default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub personal_website: Option<String>,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create and persist a new account
    async fn register(&self, registration: Registration) -> Result<Account, AppError>;

    /// Check a username/password pair
    async fn authenticate(&self, username: &str, password: &str) -> Result<Account, AppError>;

    /// Replace the password of an account after checking the current one
    async fn change_password(
        &self,
        username: &str,
        current: &str,
        new_password: &str,
    ) -> Result<(), AppError>;

    /// Authenticate and open a new login series
    async fn login(&self, username: &str, password: &str) -> Result<SessionCookie, AppError>;

    /// Exchange a session cookie for a renewed one in the same series
    async fn resume(&self, cookie: &SessionCookie) -> Result<SessionCookie, AppError>;

    /// End the login series named by the cookie
    async fn logout(&self, cookie: &SessionCookie) -> Result<(), AppError>;
}
