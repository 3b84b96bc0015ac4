//! This module handles the first half of the server flow: sending the browser to Google
//! and reading what Google sends back.
//!
//! It provides the following key functionalities:
//! - Generating the authorization request URL (`CodeRequest`).
//! - Issuing a CSRF token, storing it in the session and building the URL in one step
//!   (`AuthorizationRequestBuilder`).
//! - Parsing the callback Google redirects to (`UnCheckedCodeResponse`).
//!
//! # Flow
//! 1. `AuthorizationRequestBuilder::build_login_url` issues a `CSRFToken`, stores it
//!    under the configured session key and returns a `LoginRedirect`.
//! 2. The browser follows `LoginRedirect::url()` to Google.
//! 3. Google redirects back with `code` and `state` (`UnCheckedCodeResponse`).
//! 4. The `state` is checked against the stored token before the code is exchanged.
//!
//! Every call issues a fresh token unless an in-flight token is passed in explicitly,
//! e.g. to render several login links for the same page.
use http::{Response, StatusCode, header::LOCATION};
use itertools::Itertools;
use tracing::{debug, error};
use url::Url;

use crate::{
    config::{AuthEndPoint, ClientID, Config, RedirectURI},
    csrf_token::{CSRFToken, UnCheckedCSRFToken},
    error::Error,
    store::SessionStore,
};

/// Scopes requested from Google: basic identity only.
pub const SCOPES: [&str; 3] = ["email", "openid", "profile"];

/// The authorization code sent by Google on the callback.
///
/// Only exchanged after the accompanying `state` has been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Code(pub(crate) String);

impl Code {
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<String> for Code {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Generates the URL that starts the authorization request. Pure construction, no I/O.
/// # Example
/// ```rust,no_run
/// use google_sso::{code::CodeRequest, config::Config, csrf_token::CSRFToken};
///
/// let config = Config::builder()
///     .client_id("your_client_id")
///     .redirect_uri("https://example.com/cb")
///     .build();
///
/// let csrf_token = CSRFToken::new().unwrap();
/// let url = CodeRequest::new(&config, &csrf_token).into_url().unwrap();
/// println!("Auth URL: {}", url);
/// ```
#[derive(Debug, Clone)]
pub struct CodeRequest {
    auth_endpoint: AuthEndPoint,
    client_id: ClientID,
    redirect_uri: RedirectURI,
    state: CSRFToken,
}

impl CodeRequest {
    pub fn new(config: &Config, state: &CSRFToken) -> Self {
        Self {
            auth_endpoint: config.auth_endpoint.to_owned(),
            client_id: config.client_id.to_owned(),
            redirect_uri: config.redirect_uri.to_owned(),
            state: state.to_owned(),
        }
    }

    /// Constructs the form-urlencoded authorization URL.
    pub fn into_url(&self) -> Result<String, Error> {
        let mut url = Url::parse(&self.auth_endpoint.0).map_err(|e| {
            error!("Failed to parse auth endpoint: {}", e);
            Error::URL
        })?;
        url.query_pairs_mut()
            .append_pair("scope", &SCOPES.iter().join(" "))
            .append_pair("response_type", "code")
            .append_pair("access_type", "offline")
            .append_pair("state", &self.state.0)
            .append_pair("client_id", &self.client_id.0)
            .append_pair("redirect_uri", &self.redirect_uri.0);
        Ok(url.to_string())
    }
}

/// Where to send the browser, together with the CSRF token embedded in the URL.
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    url: String,
    csrf_token: CSRFToken,
}

impl LoginRedirect {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn csrf_token(&self) -> &CSRFToken {
        &self.csrf_token
    }

    /// A `302 Found` response pointing the browser at Google.
    pub fn into_response(self) -> Result<Response<()>, Error> {
        Response::builder()
            .status(StatusCode::FOUND)
            .header(LOCATION, self.url)
            .body(())
            .map_err(|e| {
                error!("Failed to build redirect response: {}", e);
                Error::URL
            })
    }
}

/// Issues the CSRF token, stores it in the session and builds the login URL.
#[derive(Debug, Clone)]
pub struct AuthorizationRequestBuilder {
    config: Config,
}

impl AuthorizationRequestBuilder {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.to_owned(),
        }
    }

    /// Builds the login URL.
    ///
    /// - `reuse`: `None` issues a fresh token; `Some(token)` reuses a token already
    ///   issued for this login attempt.
    ///
    /// The token is written to `session` under the configured key either way.
    pub async fn build_login_url<S>(
        &self,
        session: &S,
        reuse: Option<&CSRFToken>,
    ) -> Result<LoginRedirect, Error>
    where
        S: SessionStore,
    {
        let csrf_token = match reuse {
            Some(token) => token.to_owned(),
            None => CSRFToken::new()?,
        };

        session
            .set(self.config.session_csrf_key(), csrf_token.value().to_string())
            .await
            .map_err(|e| {
                error!("Failed to store CSRF token in session: {}", e);
                Error::Session(Box::new(e))
            })?;

        let url = CodeRequest::new(&self.config, &csrf_token).into_url()?;
        debug!("Issued login URL");
        Ok(LoginRedirect { url, csrf_token })
    }
}

/// A response from Google containing an unverified authorization code and state.
/// Must be validated against the stored CSRF token before use.
#[derive(Debug, Clone)]
pub struct UnCheckedCodeResponse {
    state: UnCheckedCSRFToken,
    code: Code,
}

impl UnCheckedCodeResponse {
    pub fn new(code: &str, state: &str) -> Self {
        Self {
            state: state.to_string().into(),
            code: code.to_string().into(),
        }
    }

    /// Parses `code` and `state` from the full callback URL.
    ///
    /// An `error` parameter (e.g. the user pressed "Cancel") is reported as
    /// `Error::AuthorizationDenied`.
    pub fn from_url(response_url: &str) -> Result<Self, Error> {
        let url = Url::parse(response_url).map_err(|e| {
            error!("Failed to parse url from google: {}", e);
            Error::URL
        })?;

        let mut code = None;
        let mut state = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => return Err(Error::AuthorizationDenied(value.into_owned())),
                _ => {}
            }
        }

        Ok(Self {
            state: state.ok_or(Error::URL)?.into(),
            code: code.ok_or(Error::URL)?.into(),
        })
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn state(&self) -> &UnCheckedCSRFToken {
        &self.state
    }
}
