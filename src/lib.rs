//! Server-side "Sign in with Google" for OpenID Connect.
//!
//! This library implements the server half of Google's OpenID Connect flow: it builds the
//! authorization redirect URL, exchanges the returned authorization code for tokens,
//! verifies the IDToken's signature against Google's rotating public keys and yields a
//! verified `UserIdentity`.
//! [google document](https://developers.google.com/identity/openid-connect/openid-connect)
//! # Feature
//! - Generate a CSRF token and store it in the user's session
//! - Generate the authorization request URL for Google
//! - Verify the CSRF token on the callback and exchange the code for tokens
//! - Fetch Google's JSON Web Key Set, optionally cached for a configurable TTL
//! - Verify the IDToken (signature, expiry, audience, issuer) and extract the user's claims
//! # Collaborators
//! The HTTP client, the key cache and the session store are traits (`executer::Executer`,
//! `store::CacheStore`, `store::SessionStore`), so the flow can sit on top of any web
//! framework or storage. `reqwest` and in-memory implementations are bundled.
//! # Examples
//! See `flow::SsoFlowController` and `demos/axum_server.rs`.
pub mod code;
pub mod config;
pub mod csrf_token;
pub mod error;
pub mod executer;
pub mod flow;
pub mod id_token;
pub mod identity;
pub mod jwks;
pub mod store;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_utils;
