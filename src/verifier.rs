//! Verifies Google IDTokens against a JSON Web Key Set.
//!
//! This is where an IDToken stops being an opaque string and becomes a
//! `UserIdentity`. Checks, in order:
//! 1. The header names an RSA algorithm and a `kid` present in the key set.
//! 2. `exp` is in the future (plus the configured leeway).
//! 3. The signature over `header.payload` verifies with that key.
//! 4. `aud` is our client id and `iss` is Google.
//! 5. Every required claim is present.
//!
//! Any failure rejects the token; nothing is defaulted.
use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, crypto, decode_header, get_current_timestamp};
use serde::Deserialize;
use tracing::{debug, error};

use crate::{config::Config, error::Error, identity::UserIdentity, jwks::{Jwk, JwkSet}};

pub const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];

const RSA_ALGORITHMS: [Algorithm; 3] = [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// The payload as sent; nothing in it is trusted until the signature is checked.
#[derive(Debug, Deserialize)]
struct UnverifiedClaims {
    iss: Option<String>,
    azp: Option<String>,
    aud: Option<String>,
    sub: Option<String>,
    email: Option<String>,
    email_verified: Option<bool>,
    at_hash: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    name: Option<String>,
    picture: Option<String>,
    iat: Option<u64>,
    exp: Option<u64>,
}

fn required<T>(claim: Option<T>, name: &str) -> Result<T, Error> {
    claim.ok_or_else(|| Error::MalformedToken(format!("missing {name} claim")))
}

/// Validates signed IDTokens for one client.
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    audience: String,
    leeway: u64,
}

impl JwtVerifier {
    pub fn new(config: &Config) -> Self {
        Self {
            audience: config.client_id().to_string(),
            leeway: config.leeway().as_secs(),
        }
    }

    /// Verifies `id_token` with `key_set` and returns the identity it asserts.
    pub fn verify(&self, id_token: &str, key_set: &JwkSet) -> Result<UserIdentity, Error> {
        let segments: Vec<&str> = id_token.split('.').collect();
        if segments.len() != 3 {
            return Err(Error::MalformedToken("expected three segments".to_string()));
        }

        let header = decode_header(id_token).map_err(|e| {
            error!("Failed to decode IDToken header: {}", e);
            Error::MalformedToken("unreadable header".to_string())
        })?;
        if !RSA_ALGORITHMS.contains(&header.alg) {
            return Err(Error::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| Error::MalformedToken("missing kid header".to_string()))?;
        let jwk = key_set.find(&kid).ok_or_else(|| {
            error!("No key matches kid {}", kid);
            Error::UnknownKey(kid.clone())
        })?;

        let claims = Self::decode_claims(segments[1])?;

        let exp = required(claims.exp, "exp")?;
        let now = get_current_timestamp();
        if exp.saturating_add(self.leeway) <= now {
            debug!("IDToken expired at {}, now {}", exp, now);
            return Err(Error::TokenExpired { exp, now });
        }

        Self::verify_signature(&segments, jwk, header.alg)?;

        let aud = required(claims.aud, "aud")?;
        if aud != self.audience {
            return Err(Error::AudienceMismatch(aud));
        }
        let iss = required(claims.iss, "iss")?;
        if !GOOGLE_ISSUERS.contains(&iss.as_str()) {
            return Err(Error::IssuerMismatch(iss));
        }

        Ok(UserIdentity {
            iss,
            azp: claims.azp,
            aud,
            sub: required(claims.sub, "sub")?,
            email: required(claims.email, "email")?,
            email_verified: required(claims.email_verified, "email_verified")?,
            at_hash: claims.at_hash,
            given_name: claims.given_name,
            family_name: claims.family_name,
            name: claims.name,
            picture: claims.picture,
            iat: required(claims.iat, "iat")?,
            exp,
        })
    }

    fn decode_claims(payload: &str) -> Result<UnverifiedClaims, Error> {
        let bytes = BASE64_URL_SAFE_NO_PAD.decode(payload).map_err(|e| {
            error!("Failed to decode IDToken payload: {}", e);
            Error::MalformedToken("payload is not base64url".to_string())
        })?;
        serde_json::from_slice::<UnverifiedClaims>(&bytes).map_err(|e| {
            error!("Failed to deserialize IDToken payload: {}", e);
            Error::MalformedToken(format!("unreadable payload: {e}"))
        })
    }

    fn verify_signature(segments: &[&str], jwk: &Jwk, alg: Algorithm) -> Result<(), Error> {
        if jwk.kty != "RSA" {
            error!("Key {} is not an RSA key", jwk.kid);
            return Err(Error::SignatureInvalid);
        }
        if let Some(key_alg) = &jwk.alg
            && !matches!(key_alg.parse::<Algorithm>(), Ok(parsed) if parsed == alg)
        {
            error!("Key {} is for {}, token uses {:?}", jwk.kid, key_alg, alg);
            return Err(Error::SignatureInvalid);
        }

        let (Some(n), Some(e)) = (&jwk.n, &jwk.e) else {
            error!("Key {} has no RSA components", jwk.kid);
            return Err(Error::SignatureInvalid);
        };
        let key = DecodingKey::from_rsa_components(n, e).map_err(|e| {
            error!("Failed to build RSA key {}: {}", jwk.kid, e);
            Error::SignatureInvalid
        })?;

        let message = format!("{}.{}", segments[0], segments[1]);
        match crypto::verify(segments[2], message.as_bytes(), &key, alg) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::SignatureInvalid),
            Err(e) => {
                error!("Failed to verify IDToken signature: {}", e);
                Err(Error::SignatureInvalid)
            }
        }
    }
}
