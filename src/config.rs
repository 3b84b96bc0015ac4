//! Defines structures and builders related to the sign-in configuration.
//!
//! Provides a structured way to handle credentials, endpoints and cache settings
//! required for the login redirect, the token exchange and the IDToken verification.
//!
//! ## Structures
//! - `Config`: Stores all the necessary sign-in information.
//! - `ConfigBuilder`: A builder for constructing a `Config` instance.
//! - `CacheConfig`: Where and for how long Google's public keys are cached.
//!
//! Every endpoint defaults to Google's production URL, so only the client
//! credentials and the callback URL are normally set.
//!
//! # Example
//! ```rust,no_run
//! use google_sso::config::Config;
//!
//! let config = Config::builder()
//!     .client_id("your-client-id")
//!     .client_secret("your-client-secret")
//!     .redirect_uri("https://your-app.com/sso/callback")
//!     .build();
//! ```
use std::time::Duration;

pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_OAUTH_BASE: &str = "https://oauth2.googleapis.com";
pub const GOOGLE_JWKS_URI: &str = "https://www.googleapis.com/oauth2/v3/certs";
pub const DEFAULT_SESSION_CSRF_KEY: &str = "googleSsoCsrfToken";
pub const DEFAULT_CACHE_KEY: &str = "jwtCerts";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(86400);

#[derive(Debug, Clone, Default)]
pub(crate) struct AuthEndPoint(pub String);

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ClientID(pub String);

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ClientSecret(pub String);

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct OAuthBase(pub String);

#[derive(Debug, Clone, Default)]
pub(crate) struct RedirectURI(pub String);

/// Settings for caching Google's JSON Web Key Set in a `CacheStore`.
///
/// Only consulted when a cache backend is handed to the `KeyCache`.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub(crate) key: String,
    pub(crate) ttl: Duration,
}

impl CacheConfig {
    pub fn new(key: &str, ttl: Duration) -> Self {
        Self {
            key: key.to_string(),
            ttl,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_KEY, DEFAULT_CACHE_TTL)
    }
}

/// Holds all necessary information required for Google's OpenID Connect server flow.
///
/// It is designed to be immutable once constructed.
///
/// # Fields
/// - `auth_endpoint`: The authorization endpoint the browser is sent to.
/// - `client_id`: The client ID obtained from Google Cloud Console.
/// - `client_secret`: The client secret linked to the client ID.
/// - `oauth_base`: Base of Google's OAuth2 endpoints; the token endpoint is `{oauth_base}/token`.
/// - `redirect_uri`: The callback URL registered in Google Cloud Console.
/// - `jwks_uri`: Where Google publishes the keys that sign IDTokens.
/// - `session_csrf_key`: Session key under which the CSRF token is stored.
/// - `cache`: Key cache settings.
/// - `leeway`: Clock skew tolerated when checking `exp`.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) auth_endpoint: AuthEndPoint,
    pub(crate) client_id: ClientID,
    pub(crate) client_secret: ClientSecret,
    pub(crate) oauth_base: OAuthBase,
    pub(crate) redirect_uri: RedirectURI,
    pub(crate) jwks_uri: String,
    pub(crate) session_csrf_key: String,
    pub(crate) cache: CacheConfig,
    pub(crate) leeway: Duration,
}

// ==========impl Config==========
impl Config {
    /// Returns a new `ConfigBuilder` preloaded with Google's endpoints.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id.0
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri.0
    }

    /// The token endpoint, `{oauth_base}/token`.
    pub fn token_endpoint(&self) -> String {
        format!("{}/token", self.oauth_base.0)
    }

    pub fn jwks_uri(&self) -> &str {
        &self.jwks_uri
    }

    pub fn session_csrf_key(&self) -> &str {
        &self.session_csrf_key
    }

    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    pub fn leeway(&self) -> Duration {
        self.leeway
    }
}

/// Provides a convenient way to create a `Config` instance step by step.
///
/// # Example
/// ```rust,no_run
/// use std::time::Duration;
/// use google_sso::config::{CacheConfig, ConfigBuilder};
///
/// let config = ConfigBuilder::new()
///     .client_id("your-client-id")
///     .client_secret("your-client-secret")
///     .redirect_uri("https://your-app.com/sso/callback")
///     .cache(CacheConfig::new("google-certs", Duration::from_secs(3600)))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    auth_endpoint: AuthEndPoint,
    client_id: ClientID,
    client_secret: ClientSecret,
    oauth_base: OAuthBase,
    redirect_uri: RedirectURI,
    jwks_uri: String,
    session_csrf_key: String,
    cache: CacheConfig,
    leeway: Duration,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            auth_endpoint: AuthEndPoint(GOOGLE_AUTH_ENDPOINT.to_string()),
            client_id: ClientID::default(),
            client_secret: ClientSecret::default(),
            oauth_base: OAuthBase(GOOGLE_OAUTH_BASE.to_string()),
            redirect_uri: RedirectURI::default(),
            jwks_uri: GOOGLE_JWKS_URI.to_string(),
            session_csrf_key: DEFAULT_SESSION_CSRF_KEY.to_string(),
            cache: CacheConfig::default(),
            leeway: Duration::ZERO,
        }
    }
}

// ==========impl ConfigBuilder==========
impl ConfigBuilder {
    /// Creates a new `ConfigBuilder` instance with Google's default endpoints.
    pub fn new() -> Self {
        ConfigBuilder::default()
    }

    /// Overrides the authorization endpoint URL.
    pub fn auth_endpoint(mut self, auth_endpoint: &str) -> Self {
        self.auth_endpoint = AuthEndPoint(auth_endpoint.to_string());
        self
    }

    /// Sets the client ID obtained from Google Cloud Console.
    pub fn client_id(mut self, client_id: &str) -> Self {
        self.client_id = ClientID(client_id.to_string());
        self
    }

    /// Sets the client secret associated with the client ID.
    pub fn client_secret(mut self, client_secret: &str) -> Self {
        self.client_secret = ClientSecret(client_secret.to_string());
        self
    }

    /// Overrides the base of the OAuth2 endpoints. Trailing slashes are stripped.
    pub fn oauth_base(mut self, oauth_base: &str) -> Self {
        self.oauth_base = OAuthBase(oauth_base.trim_end_matches('/').to_string());
        self
    }

    /// Sets the callback URL registered in Google Cloud Console.
    pub fn redirect_uri(mut self, redirect_uri: &str) -> Self {
        self.redirect_uri = RedirectURI(redirect_uri.to_string());
        self
    }

    /// Overrides the URL of Google's JSON Web Key Set.
    pub fn jwks_uri(mut self, jwks_uri: &str) -> Self {
        self.jwks_uri = jwks_uri.to_string();
        self
    }

    /// Overrides the session key used for the CSRF token.
    pub fn session_csrf_key(mut self, key: &str) -> Self {
        self.session_csrf_key = key.to_string();
        self
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Clock skew tolerated when checking the IDToken expiry.
    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Constructs a `Config` instance with the provided values.
    pub fn build(self) -> Config {
        Config {
            auth_endpoint: self.auth_endpoint,
            client_id: self.client_id,
            client_secret: self.client_secret,
            oauth_base: self.oauth_base,
            redirect_uri: self.redirect_uri,
            jwks_uri: self.jwks_uri,
            session_csrf_key: self.session_csrf_key,
            cache: self.cache,
            leeway: self.leeway,
        }
    }
}
