use thiserror::Error;

/// Boxed error raised by an injected collaborator (transport, cache or session store).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("CSRF token not matched: received {received:?}, expected {expected:?}")]
    CsrfTokenMismatch {
        received: String,
        expected: Option<String>,
    },
    #[error("Unexpected response (status {status}): {body}")]
    UnexpectedResponse { status: u16, body: String },
    #[error("No key in the key set matches kid {0:?}")]
    UnknownKey(String),
    #[error("IDToken signature is invalid")]
    SignatureInvalid,
    #[error("IDToken expired at {exp} (now {now})")]
    TokenExpired { exp: u64, now: u64 },
    #[error("Malformed IDToken: {0}")]
    MalformedToken(String),
    #[error("Unsupported IDToken algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("IDToken audience {0:?} does not match the client id")]
    AudienceMismatch(String),
    #[error("IDToken issuer {0:?} is not Google")]
    IssuerMismatch(String),
    #[error("Authorization denied by Google: {0}")]
    AuthorizationDenied(String),
    #[error("Failed to generate CSRF token")]
    GenToken,
    #[error("Failed to parse url")]
    URL,
    #[error("Transport failure: {0}")]
    Transport(#[source] BoxError),
    #[error("Cache store failure: {0}")]
    Cache(#[source] BoxError),
    #[error("Session store failure: {0}")]
    Session(#[source] BoxError),
}

impl Error {
    /// True for every rejection raised while checking the IDToken itself.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Error::UnknownKey(_)
                | Error::SignatureInvalid
                | Error::TokenExpired { .. }
                | Error::MalformedToken(_)
                | Error::UnsupportedAlgorithm(_)
                | Error::AudienceMismatch(_)
                | Error::IssuerMismatch(_)
        )
    }
}
