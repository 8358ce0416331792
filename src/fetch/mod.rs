mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use reqwest::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// A backend answered with a non-success status.
#[derive(Debug, thiserror::Error)]
#[error("{method} {path} returned status {status}: {body}")]
pub struct StatusError {
    pub method: reqwest::Method,
    pub path: String,
    pub status: StatusCode,
    pub body: String,
}

/// Sends `req`, turning transport failures and non-2xx answers into errors.
pub async fn send<C: HttpClient + ?Sized>(client: &C, req: Request) -> Result<Response> {
    let method = req.method().clone();
    let path = req.url().path().to_string();

    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("failed to send {method} {path}"))?;

    let status = resp.status();
    debug!(%method, %path, %status, "Backend responded");

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(StatusError {
            method,
            path,
            status,
            body,
        }
        .into());
    }

    Ok(resp)
}

/// Like [`send`], then decodes the JSON body into `T`.
pub async fn send_json<C, T>(client: &C, req: Request) -> Result<T>
where
    C: HttpClient + ?Sized,
    T: DeserializeOwned,
{
    let path = req.url().path().to_string();
    let resp = send(client, req).await?;
    resp.json()
        .await
        .with_context(|| format!("failed to decode response from {path}"))
}
