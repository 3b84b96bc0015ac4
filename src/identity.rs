//! The verified identity of the user who signed in.
use serde::Serialize;

/// Claims taken from an IDToken whose signature, expiry, audience and issuer
/// have all been checked.
///
/// Only `JwtVerifier` creates this type; it cannot be built or deserialized
/// from unverified input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserIdentity {
    pub(crate) iss: String,
    pub(crate) azp: Option<String>,
    pub(crate) aud: String,
    pub(crate) sub: String,
    pub(crate) email: String,
    pub(crate) email_verified: bool,
    pub(crate) at_hash: Option<String>,
    pub(crate) given_name: Option<String>,
    pub(crate) family_name: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) picture: Option<String>,
    pub(crate) iat: u64,
    pub(crate) exp: u64,
}

impl UserIdentity {
    /// Issuer, `https://accounts.google.com` or `accounts.google.com`.
    pub fn issuer(&self) -> &str {
        &self.iss
    }

    /// Authorized party, the client the token was issued to.
    pub fn authorized_party(&self) -> Option<&str> {
        self.azp.as_deref()
    }

    pub fn audience(&self) -> &str {
        &self.aud
    }

    /// Google's stable, unique identifier for the account. Prefer this over the email as a key.
    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn email_verified(&self) -> bool {
        self.email_verified
    }

    pub fn at_hash(&self) -> Option<&str> {
        self.at_hash.as_deref()
    }

    pub fn given_name(&self) -> Option<&str> {
        self.given_name.as_deref()
    }

    pub fn family_name(&self) -> Option<&str> {
        self.family_name.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn picture(&self) -> Option<&str> {
        self.picture.as_deref()
    }

    /// Issued-at, UNIX seconds.
    pub fn issued_at(&self) -> u64 {
        self.iat
    }

    /// Expiry, UNIX seconds.
    pub fn expires_at(&self) -> u64 {
        self.exp
    }
}
