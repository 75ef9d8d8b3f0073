use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use scribe_common::SessionCookie;
use tracing::{debug, info, warn};

use crate::auth::{AuthService, CredentialManager, Registration};
use crate::auth::token_generator::DEFAULT_TOKEN_BYTES;
use crate::config::Settings;
use crate::error::AppError;
use crate::metrics::{
    ACCOUNT_REGISTERED, AUTH_FAILED, PASSWORD_REHASHED, SESSION_ISSUED, SESSION_RENEWED,
    SESSION_REVOKED, SESSION_THEFT_DETECTED,
};
use crate::models::{Account, LoginToken};
use crate::store::{Collection, DocumentStore};

pub struct DefaultAuth {
    accounts: Collection<Account>,
    tokens: Collection<LoginToken>,
    credentials: CredentialManager,
    token_bytes: usize,
}

impl DefaultAuth {
    pub fn new(store: Arc<dyn DocumentStore>, credentials: CredentialManager) -> Self {
        Self {
            accounts: Collection::new(Arc::clone(&store)),
            tokens: Collection::new(store),
            credentials,
            token_bytes: DEFAULT_TOKEN_BYTES,
        }
    }

    pub fn from_settings(store: Arc<dyn DocumentStore>, settings: &Settings) -> Result<Self, AppError> {
        let credentials = CredentialManager::from_settings(&settings.password, &settings.tokens)?;
        Ok(Self::new(store, credentials).with_token_bytes(settings.tokens.token_bytes))
    }

    pub fn with_token_bytes(mut self, bytes: usize) -> Self {
        self.token_bytes = bytes;
        self
    }

    pub fn accounts(&self) -> &Collection<Account> {
        &self.accounts
    }

    pub fn login_tokens(&self) -> &Collection<LoginToken> {
        &self.tokens
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    /// Open a new login series for `username`. The returned record is
    /// persisted and carries both its series and its first token.
    pub async fn create_session(&self, username: &str) -> Result<LoginToken, AppError> {
        let mut record = LoginToken::new(username).with_token_bytes(self.token_bytes);
        self.tokens.save(&mut record).await?;
        counter!(SESSION_ISSUED).increment(1);
        debug!(username, "login series created");
        Ok(record)
    }

    /// Rotate the token of an existing login series and persist it
    pub async fn renew_session(&self, session: &mut LoginToken) -> Result<(), AppError> {
        if session.id.is_none() {
            return Err(AppError::InvalidSession);
        }
        session.set_token_bytes(self.token_bytes);
        self.tokens.save(session).await?;
        counter!(SESSION_RENEWED).increment(1);
        Ok(())
    }

    /// The login token with the cookie's series and username, if any
    async fn find_session(&self, cookie: &SessionCookie) -> Result<Option<LoginToken>, AppError> {
        Ok(self
            .tokens
            .find_many("series", cookie.series.as_str())
            .await?
            .into_iter()
            .find(|record| record.username == cookie.username))
    }

    /// Upgrade a hash produced by an older scheme. Failures only cost the
    /// upgrade, never the login.
    async fn rehash_if_needed(&self, account: &mut Account, password: &str) {
        if !account.needs_rehash(&self.credentials) {
            return;
        }
        let upgraded = match account.set_password(&self.credentials, password) {
            Ok(()) => self.accounts.save(account).await,
            Err(e) => Err(e),
        };
        match upgraded {
            Ok(()) => {
                counter!(PASSWORD_REHASHED).increment(1);
                info!(username = %account.username, scheme = ?self.credentials.scheme(), "password hash upgraded");
            },
            Err(e) => warn!(username = %account.username, error = %e, "password hash upgrade failed"),
        }
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn register(&self, registration: Registration) -> Result<Account, AppError> {
        let mut account = Account::new(registration.username, registration.email);
        account.personal_website = registration.personal_website;
        account.set_password(&self.credentials, &registration.password)?;

        self.accounts.save(&mut account).await?;
        counter!(ACCOUNT_REGISTERED).increment(1);
        info!(username = %account.username, "account registered");
        Ok(account)
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<Account, AppError> {
        let account = self.accounts.find_one("username", username).await?;
        let Some(mut account) = account.filter(|a| a.authenticate(password)) else {
            counter!(AUTH_FAILED).increment(1);
            warn!(username, "authentication failed");
            return Err(AppError::InvalidCredentials);
        };

        self.rehash_if_needed(&mut account, password).await;
        Ok(account)
    }

    async fn change_password(
        &self,
        username: &str,
        current: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let mut account = self.authenticate(username, current).await?;
        account.set_password(&self.credentials, new_password)?;
        self.accounts.save(&mut account).await?;
        info!(username, "password changed");
        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> Result<SessionCookie, AppError> {
        let account = self.authenticate(username, password).await?;
        let record = self.create_session(&account.username).await?;
        Ok(record.cookie_value())
    }

    async fn resume(&self, cookie: &SessionCookie) -> Result<SessionCookie, AppError> {
        let Some(mut record) = self.find_session(cookie).await? else {
            debug!(username = %cookie.username, "unknown login series");
            return Err(AppError::InvalidSession);
        };

        if !record.token_matches(&cookie.token) {
            // a known series with a stale token: the cookie was copied
            let revoked = self
                .tokens
                .delete_many("username", cookie.username.as_str())
                .await?;
            counter!(SESSION_THEFT_DETECTED).increment(1);
            counter!(SESSION_REVOKED).increment(revoked as u64);
            warn!(username = %cookie.username, revoked, "stale session token replayed, all sessions revoked");
            return Err(AppError::SessionTheft {
                username: cookie.username.clone(),
            });
        }

        if self
            .accounts
            .find_one("username", cookie.username.as_str())
            .await?
            .is_none()
        {
            self.tokens.delete(&record).await?;
            return Err(AppError::InvalidSession);
        }

        self.renew_session(&mut record).await?;
        Ok(record.cookie_value())
    }

    async fn logout(&self, cookie: &SessionCookie) -> Result<(), AppError> {
        if let Some(record) = self.find_session(cookie).await? {
            self.tokens.delete(&record).await?;
            counter!(SESSION_REVOKED).increment(1);
            debug!(username = %cookie.username, "logged out");
        }
        Ok(())
    }
}
