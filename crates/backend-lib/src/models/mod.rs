// ============================
// crates/backend-lib/src/models/mod.rs
// ============================
//! Persisted models.

mod account;
mod bounty;
mod login_token;
mod transcription;

pub use account::{Account, ACCOUNT_COLLECTION};
pub use bounty::{Bounty, BOUNTY_COLLECTION};
pub use login_token::{LoginToken, SessionState, LOGIN_TOKEN_COLLECTION};
pub use transcription::{Transcription, TRANSCRIPTION_COLLECTION};
