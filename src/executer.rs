//! Provides the asynchronous transport used to talk to Google.
//!
//! This module:
//! - Defines the Executer trait, a unified interface for sending one HTTP request and
//!   receiving its response.
//! - Implements `ReqwestExe`, an executer backed by `reqwest`.
//!
//! The token exchange and the key fetch only ever build `http::Request<Vec<u8>>` values
//! and hand them to an `Executer`, so any HTTP client (or a test stub) can be plugged in.
use http::{Request, Response};
use reqwest::Client;
use thiserror::Error;
use tracing::error;

/// Generic asynchronous execution interface for sending HTTP requests.
/// Key Components:
/// - Error: The error type returned when the request could not be completed.
/// - execute: Sends the request and resolves to the response status and body.
///
/// Implementations decide their own timeout and status policy; the crate
/// propagates whatever error they return without retrying.
pub trait Executer: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn execute(
        &self,
        req: Request<Vec<u8>>,
    ) -> impl Future<Output = Result<Response<Vec<u8>>, Self::Error>> + Send;
}

/// Defines possible errors that can occur during request execution.
#[derive(Debug, Clone, Error)]
pub enum ExecuteError {
    #[error("Failed to build request")]
    Build,
    #[error("Failed to send request")]
    Send,
    #[error("Failed to read response body")]
    Receive,
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Sends requests through a shared `reqwest::Client`.
///
/// Non-2xx responses are reported as `ExecuteError::Status` carrying the status code
/// and a snapshot of the body.
#[derive(Debug, Clone, Default)]
pub struct ReqwestExe {
    client: Client,
}

impl ReqwestExe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Request Workflow
/// 1. Convert the `http::Request` into a `reqwest::Request`.
/// 2. Send it.
/// 3. Read the whole body.
/// 4. Reject non-2xx statuses, otherwise return status and body.
impl Executer for ReqwestExe {
    type Error = ExecuteError;

    async fn execute(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Self::Error> {
        let req = reqwest::Request::try_from(req).map_err(|e| {
            error!("Failed to build request: {:?}", e);
            ExecuteError::Build
        })?;

        let res = self.client.execute(req).await.map_err(|e| {
            error!("Failed to send request: {:?}", e);
            ExecuteError::Send
        })?;
        let status = res.status();
        let body = res.bytes().await.map_err(|e| {
            error!("Failed to read response body: {:?}", e);
            ExecuteError::Receive
        })?;

        if !status.is_success() {
            error!("Request failed with status {}", status);
            return Err(ExecuteError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Response::builder()
            .status(status)
            .body(body.to_vec())
            .map_err(|e| {
                error!("Failed to rebuild response: {:?}", e);
                ExecuteError::Receive
            })
    }
}
