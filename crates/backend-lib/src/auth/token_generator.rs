// ============================
// crates/backend-lib/src/auth/token_generator.rs
// ============================
/** Random value generation for credentials
Session tokens, session series identifiers and password salts all draw
from the operating system's CSPRNG. */
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};

/// Default token size in bytes (32 bytes = 256 bits of entropy)
pub const DEFAULT_TOKEN_BYTES: usize = 32;

/** Issue a fresh opaque session token
# Returns
A base64 URL-safe encoded string without padding, 43 chars long */
pub fn issue_token() -> String {
    issue_token_with_size(DEFAULT_TOKEN_BYTES)
}

/** Issue an opaque token carrying `bytes` bytes of entropy
# Arguments
* `bytes` - The size of the random token in bytes */
pub fn issue_token_with_size(bytes: usize) -> String {
    URL_SAFE_NO_PAD.encode(random_bytes(bytes))
}

/// Fill a buffer of `len` bytes from the OS entropy source
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut buffer = vec![0u8; len];
    OsRng.fill_bytes(&mut buffer);
    buffer
}
