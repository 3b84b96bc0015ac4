// In Google Cloud console
// Set
// - Redirect_url: http://localhost/auth/callback
// - Host: http://localhost
// And then you will get client_secret.json file from google.
// Set .env file
// ```.env
// client_id="your_client_id"
// client_secret="your_client_secret"
// redirect_uri="http://localhost/auth/callback"
// ```
// finally ```cargo run --example axum_server```
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use google_sso::{
    config::ConfigBuilder,
    error::Error,
    executer::ReqwestExe,
    flow::SsoFlowController,
    store::{MemoryCacheStore, MemorySessionStore},
};
use http::StatusCode;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

static COOKIE_KEY: &str = "sid";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log settings
    tracing_subscriber::fmt::init();

    // Read environment
    let client_id = read_env("client_id")?;
    let client_secret = read_env("client_secret")?;
    let redirect_uri = read_env("redirect_uri")?;

    // Build Config; every Google endpoint keeps its default
    let config = ConfigBuilder::new()
        .client_id(&client_id)
        .client_secret(&client_secret)
        .redirect_uri(&redirect_uri)
        .build();

    let flow = SsoFlowController::with_cache(config, ReqwestExe::default(), MemoryCacheStore::new());
    let app_state = Arc::new(AppState {
        flow,
        sessions: Mutex::default(),
    });

    // '/auth/callback': A path that is set in google console
    // '/': A path to start auth(Show login as google window)
    let app = Router::new()
        .route("/", get(start_auth))
        .route("/auth/callback", get(call_back))
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:80")
        .await
        .context("Failed to bind listener")?;
    axum::serve(listener, app).await.context("Server error")?;
    anyhow::Ok(())
}

async fn start_auth(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, StatusCode> {
    // One session per browser, keyed by a random cookie value
    let sid = jar
        .get(COOKIE_KEY)
        .map(|c| c.value().to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let session = app_state.session(&sid);

    let redirect = app_state.flow.start_login(&session).await.map_err(|e| {
        error!("Failed to start login: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok((
        jar.add(session_cookie(sid)),
        Redirect::to(redirect.url()),
    ))
}

async fn call_back(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, StatusCode> {
    let sid = jar.get(COOKIE_KEY).ok_or(StatusCode::BAD_REQUEST)?;
    let session = app_state.session(sid.value());

    let identity = app_state
        .flow
        .handle_callback(&session, &params.code, &params.state)
        .await
        .map_err(|e| {
            error!("Sign-in failed: {}", e);
            match e {
                Error::CsrfTokenMismatch { .. } => StatusCode::BAD_REQUEST,
                e if e.is_verification_failure() => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            }
        })?;
    Ok((StatusCode::OK, Json(identity)))
}

// Browsers treat http://localhost as a secure context, so `Secure` still works locally
fn session_cookie(sid: String) -> Cookie<'static> {
    Cookie::build((COOKIE_KEY, sid))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

// Get env from .env file
fn read_env(key: &str) -> anyhow::Result<String> {
    dotenvy::var(key).context("Failed to read env")
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: String,
    state: String,
}

struct AppState {
    flow: SsoFlowController<ReqwestExe, MemoryCacheStore>,
    // Never pruned: one entry per browser that ever hit `/`. Use a real session layer in production.
    sessions: Mutex<HashMap<String, MemorySessionStore>>,
}

impl AppState {
    // Returns the session for `sid`, creating it on first use
    fn session(&self, sid: &str) -> MemorySessionStore {
        let mut sessions = match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sessions.entry(sid.to_string()).or_default().clone()
    }
}
