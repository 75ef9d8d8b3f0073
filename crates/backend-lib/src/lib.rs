// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for `scribe`: account credentials,
//! persistent login sessions and the document models behind them.

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod store;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthService, DefaultAuth};
use crate::config::Settings;
use crate::error::AppError;
use crate::models::{Bounty, Transcription};
use crate::store::{Collection, DocumentStore, FlatFileStorage};

/// Application state shared by every caller
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Loaded settings
    pub settings: Arc<Settings>,
    /// Storage backend
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    /// Create a new application state over `store`
    pub fn new(store: Arc<dyn DocumentStore>, settings: Settings) -> Result<Self, AppError> {
        let auth = Arc::new(DefaultAuth::from_settings(Arc::clone(&store), &settings)?);
        Ok(Self {
            auth,
            settings: Arc::new(settings),
            store,
        })
    }

    /// Open the flat-file store under `settings.data_dir`
    pub fn open(settings: Settings) -> anyhow::Result<Self> {
        let store = Arc::new(FlatFileStorage::new(&settings.data_dir)?);
        Ok(Self::new(store, settings)?)
    }

    pub fn transcriptions(&self) -> Collection<Transcription> {
        Collection::new(Arc::clone(&self.store))
    }

    pub fn bounties(&self) -> Collection<Bounty> {
        Collection::new(Arc::clone(&self.store))
    }
}
