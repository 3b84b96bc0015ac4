//! Provides structures for handling CSRF tokens (`state`) in the sign-in flow.
use rand::{TryRngCore, rngs::OsRng};
use tracing::error;

use crate::error::Error;

const TOKEN_BYTES: usize = 16;

/// A randomly generated CSRF token created using `OsRng` and hex-encoded.
///
/// The token travels to Google as the `state` parameter and comes back on the
/// callback, proving the callback belongs to the login attempt that issued it.
/// # Example
/// ```rust,no_run
/// use google_sso::csrf_token::CSRFToken;
///
/// let csrf_token = CSRFToken::new().expect("Failed to generate CSRF token");
/// println!("Generated CSRF Token: {}", csrf_token.value());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CSRFToken(pub(crate) String);

impl CSRFToken {
    /// Generates a new CSRF token using a secure random generator.
    /// - Uses `OsRng` for cryptographic security.
    /// - Encodes 16 random bytes as 32 lowercase hex characters.
    /// - Returns an `Error::GenToken` if the random source fails.
    pub fn new() -> Result<Self, Error> {
        let mut key = [0u8; TOKEN_BYTES];
        OsRng.try_fill_bytes(&mut key).map_err(|e| {
            error!("Failed to generate CSRF token: {:?}", e);
            Error::GenToken
        })?;
        Ok(Self(hex::encode(key)))
    }

    /// Wraps a token that was issued earlier in the same flow, e.g. one read back
    /// from the session store, so it can be reused for another login link.
    pub fn from_issued(value: &str) -> Self {
        Self(value.to_string())
    }

    /// Returns the CSRF token as a string reference.
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// A CSRF token received on Google's callback.
///
/// This token **has not been verified yet** and must be compared with the stored `CSRFToken`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnCheckedCSRFToken(pub(crate) String);

impl UnCheckedCSRFToken {
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<String> for UnCheckedCSRFToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}
