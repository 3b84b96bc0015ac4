//! The two calls an application makes: start a login, handle the callback.
//!
//! `SsoFlowController` only sequences the other components:
//!
//! ```text
//! Init -> UrlIssued -> (browser round trip) -> CallbackReceived
//!      -> CsrfFailed | Exchanged -> VerifyFailed | Authenticated
//! ```
//!
//! The session store is passed per call because it is scoped to the user's
//! browser session, while the controller itself is shared by every request.
//!
//! # Example
//! ```rust,no_run
//! use google_sso::{
//!     config::Config,
//!     executer::ReqwestExe,
//!     flow::SsoFlowController,
//!     store::{MemoryCacheStore, MemorySessionStore},
//! };
//!
//! # async fn run() -> Result<(), google_sso::error::Error> {
//! let config = Config::builder()
//!     .client_id("your-client-id")
//!     .client_secret("your-client-secret")
//!     .redirect_uri("https://your-app.com/sso/callback")
//!     .build();
//! let flow = SsoFlowController::with_cache(config, ReqwestExe::default(), MemoryCacheStore::new());
//!
//! // Login route
//! let session = MemorySessionStore::new();
//! let redirect = flow.start_login(&session).await?;
//! println!("Send the browser to {}", redirect.url());
//!
//! // Callback route, with `code` and `state` taken from the query string
//! let user = flow.handle_callback(&session, "code", "state").await?;
//! println!("Signed in as {}", user.email());
//! # Ok(())
//! # }
//! ```
use tracing::{debug, error};

use crate::{
    code::{AuthorizationRequestBuilder, LoginRedirect, UnCheckedCodeResponse},
    config::Config,
    csrf_token::CSRFToken,
    error::Error,
    executer::Executer,
    id_token::{AuthorizationCodeExchanger, verify_state},
    identity::UserIdentity,
    jwks::KeyCache,
    store::{CacheStore, NoCache, SessionStore},
    verifier::JwtVerifier,
};

/// Where a login attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Init,
    UrlIssued,
    CallbackReceived,
    CsrfFailed,
    Exchanged,
    VerifyFailed,
    Authenticated,
}

impl FlowState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FlowState::CsrfFailed | FlowState::VerifyFailed | FlowState::Authenticated
        )
    }
}

fn enter(state: FlowState) {
    debug!(?state, "sign-in flow state");
}

/// Runs Google's server-side sign-in flow.
pub struct SsoFlowController<E, C = NoCache> {
    config: Config,
    request_builder: AuthorizationRequestBuilder,
    exchanger: AuthorizationCodeExchanger<E>,
    key_cache: KeyCache<E, C>,
    verifier: JwtVerifier,
}

impl<E> SsoFlowController<E>
where
    E: Executer + Clone,
{
    /// A controller that fetches Google's keys on every callback.
    pub fn new(config: Config, executer: E) -> Self {
        let key_cache = KeyCache::new(&config, executer.clone());
        Self::assemble(config, executer, key_cache)
    }
}

impl<E, C> SsoFlowController<E, C>
where
    E: Executer + Clone,
    C: CacheStore,
{
    /// A controller that keeps Google's keys in `cache` per `config.cache()`.
    pub fn with_cache(config: Config, executer: E, cache: C) -> Self {
        let key_cache = KeyCache::with_cache(&config, executer.clone(), cache);
        Self::assemble(config, executer, key_cache)
    }

    fn assemble(config: Config, executer: E, key_cache: KeyCache<E, C>) -> Self {
        Self {
            request_builder: AuthorizationRequestBuilder::new(&config),
            exchanger: AuthorizationCodeExchanger::new(&config, executer),
            verifier: JwtVerifier::new(&config),
            key_cache,
            config,
        }
    }

    /// Issues a fresh CSRF token into `session` and returns where to send the browser.
    pub async fn start_login<S>(&self, session: &S) -> Result<LoginRedirect, Error>
    where
        S: SessionStore,
    {
        enter(FlowState::Init);
        let redirect = self.request_builder.build_login_url(session, None).await?;
        enter(FlowState::UrlIssued);
        Ok(redirect)
    }

    /// Like `start_login`, but embeds a token already issued for this login attempt.
    pub async fn start_login_reusing<S>(
        &self,
        session: &S,
        csrf_token: &CSRFToken,
    ) -> Result<LoginRedirect, Error>
    where
        S: SessionStore,
    {
        enter(FlowState::Init);
        let redirect = self
            .request_builder
            .build_login_url(session, Some(csrf_token))
            .await?;
        enter(FlowState::UrlIssued);
        Ok(redirect)
    }

    /// Handles Google's redirect back to the callback URL.
    ///
    /// The stored CSRF token is removed from `session` as soon as it has matched,
    /// before the code is exchanged, so each token authorizes a single exchange
    /// attempt whether or not that exchange succeeds.
    pub async fn handle_callback<S>(
        &self,
        session: &S,
        code: &str,
        state: &str,
    ) -> Result<UserIdentity, Error>
    where
        S: SessionStore,
    {
        enter(FlowState::CallbackReceived);
        let csrf_key = self.config.session_csrf_key();
        let expected = session.get(csrf_key).await.map_err(|e| {
            error!("Failed to read CSRF token from session: {}", e);
            Error::Session(Box::new(e))
        })?;

        if let Err(e) = verify_state(state, expected.as_deref()) {
            enter(FlowState::CsrfFailed);
            return Err(e);
        }
        // Single use: gone before the POST, even if the exchange then fails.
        session.remove(csrf_key).await.map_err(|e| {
            error!("Failed to remove CSRF token from session: {}", e);
            Error::Session(Box::new(e))
        })?;

        let tokens = self.exchanger.redeem(code).await?;
        enter(FlowState::Exchanged);

        let verified = match self.key_cache.get_key_set().await {
            Ok(key_set) => self.verifier.verify(tokens.id_token().value(), &key_set),
            Err(e) => Err(e),
        };
        match verified {
            Ok(identity) => {
                enter(FlowState::Authenticated);
                Ok(identity)
            }
            Err(e) => {
                enter(FlowState::VerifyFailed);
                Err(e)
            }
        }
    }

    /// Parses `code` and `state` from the full callback URL, then `handle_callback`.
    pub async fn handle_callback_url<S>(&self, session: &S, url: &str) -> Result<UserIdentity, Error>
    where
        S: SessionStore,
    {
        let response = UnCheckedCodeResponse::from_url(url)?;
        self.handle_callback(session, response.code().value(), response.state().value())
            .await
    }
}
