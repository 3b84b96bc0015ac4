//! Provides the exchange of an authorization code for tokens.
//!
//! This module:
//! - IDTokenRequest: The JSON body sent to the token endpoint.
//! - TokenExchangeResult: The parsed token endpoint response, with an absolute expiry.
//! - AuthorizationCodeExchanger: Checks the CSRF state, then performs the exchange.
//! - AccessToken / IDTokenRow: The opaque access token and the still-encoded IDToken.
use http::{Request, header::CONTENT_TYPE};
use jsonwebtoken::get_current_timestamp;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, error};

use crate::{
    code::Code,
    config::{ClientID, ClientSecret, Config, RedirectURI},
    error::Error,
    executer::Executer,
};

/// Represents an OAuth 2.0 access token.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessToken(pub(crate) String);

impl AccessToken {
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Represents an encoded IDToken. It is only trusted after `JwtVerifier::verify`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IDTokenRow(pub(crate) String);

impl IDTokenRow {
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Compares the `state` returned by Google with the token stored for this session.
///
/// An absent stored token never matches.
pub fn verify_state(received: &str, expected: Option<&str>) -> Result<(), Error> {
    match expected {
        Some(expected) if bool::from(expected.as_bytes().ct_eq(received.as_bytes())) => Ok(()),
        _ => {
            error!("CSRF token mismatch");
            Err(Error::CsrfTokenMismatch {
                received: received.to_string(),
                expected: expected.map(str::to_string),
            })
        }
    }
}

/// A structure used to send a code exchange request to Google's token endpoint.
#[derive(Debug, Clone)]
pub struct IDTokenRequest {
    token_endpoint: String,
    code: Code,
    client_id: ClientID,
    client_secret: ClientSecret,
    redirect_uri: RedirectURI,
}

#[derive(Serialize)]
struct TokenRequestBody<'a> {
    grant_type: &'a str,
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
}

impl IDTokenRequest {
    /// Creates a new request using parameters from Config.
    pub fn new(config: &Config, code: Code) -> Self {
        Self {
            token_endpoint: config.token_endpoint(),
            code,
            client_id: config.client_id.to_owned(),
            client_secret: config.client_secret.to_owned(),
            redirect_uri: config.redirect_uri.to_owned(),
        }
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    /// The `POST {token_endpoint}` request with a JSON body.
    pub fn into_http(&self) -> Result<Request<Vec<u8>>, Error> {
        let body = serde_json::to_vec(&TokenRequestBody {
            grant_type: "authorization_code",
            code: &self.code.0,
            client_id: &self.client_id.0,
            client_secret: &self.client_secret.0,
            redirect_uri: &self.redirect_uri.0,
        })
        .map_err(|e| {
            error!("Failed to serialize token request: {}", e);
            Error::URL
        })?;

        Request::post(self.token_endpoint.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .map_err(|e| {
                error!("Failed to build token request: {}", e);
                Error::URL
            })
    }
}

/// The token endpoint's JSON response as sent.
#[derive(Debug, Clone, Deserialize)]
struct IDTokenResponse {
    access_token: AccessToken,
    expires_in: u64,
    id_token: IDTokenRow,
    scope: String,
    token_type: String,
    refresh_token: Option<String>,
}

/// The result of a successful exchange. `expires_at` is absolute (UNIX seconds).
#[derive(Debug, Clone, PartialEq)]
pub struct TokenExchangeResult {
    access_token: AccessToken,
    id_token: IDTokenRow,
    expires_at: u64,
    scope: String,
    token_type: String,
    refresh_token: Option<String>,
}

impl TokenExchangeResult {
    fn from_response(res: IDTokenResponse, received_at: u64) -> Self {
        Self {
            access_token: res.access_token,
            id_token: res.id_token,
            expires_at: received_at.saturating_add(res.expires_in),
            scope: res.scope,
            token_type: res.token_type,
            refresh_token: res.refresh_token,
        }
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn id_token(&self) -> &IDTokenRow {
        &self.id_token
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

/// Trades an authorization code for tokens, one request per call and no retries.
#[derive(Debug, Clone)]
pub struct AuthorizationCodeExchanger<E> {
    config: Config,
    executer: E,
}

impl<E> AuthorizationCodeExchanger<E>
where
    E: Executer,
{
    pub fn new(config: &Config, executer: E) -> Self {
        Self {
            config: config.to_owned(),
            executer,
        }
    }

    /// Request Workflow
    /// 1. Check `state` against `expected_state`; on mismatch nothing is sent.
    /// 2. POST the code to the token endpoint.
    /// 3. Parse the JSON response; anything else is `Error::UnexpectedResponse`.
    pub async fn exchange(
        &self,
        code: &str,
        state: &str,
        expected_state: Option<&str>,
    ) -> Result<TokenExchangeResult, Error> {
        verify_state(state, expected_state)?;
        self.redeem(code).await
    }

    /// POSTs `code` to the token endpoint without any state check.
    ///
    /// Callers must have matched the callback's `state` first, as `exchange` does.
    pub async fn redeem(&self, code: &str) -> Result<TokenExchangeResult, Error> {
        let req = IDTokenRequest::new(&self.config, Code(code.to_string())).into_http()?;
        let res = self.executer.execute(req).await.map_err(|e| {
            error!("Failed to send token request: {}", e);
            Error::Transport(Box::new(e))
        })?;
        let received_at = get_current_timestamp();

        let status = res.status().as_u16();
        let parsed = serde_json::from_slice::<IDTokenResponse>(res.body()).map_err(|e| {
            error!("Failed to parse token response: {}", e);
            Error::UnexpectedResponse {
                status,
                body: String::from_utf8_lossy(res.body()).into_owned(),
            }
        })?;
        debug!("Exchanged authorization code for tokens");
        Ok(TokenExchangeResult::from_response(parsed, received_at))
    }
}
