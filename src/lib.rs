#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod types;

use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Request};

pub use client::Client;
pub use config::{Config, Device};
pub use error::{Error, Kind};
pub use types::{HeaderOverrides, Outcome, Page, Payload, Response};

pub type Result<T> = std::result::Result<T, Error>;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Sends `request` and parses the JSON reply.
///
/// Transport errors and non-JSON bodies are returned as [`Error`]s. Any JSON
/// body comes back as a [`Response`], whatever its [`Outcome`].
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip_all, fields(path = %path, status_code))
)]
pub(crate) async fn request(
    client: &ReqwestClient,
    mut request: Request,
    headers: HeaderMap,
    path: &str,
) -> Result<Response> {
    *request.headers_mut() = headers;

    let response = client.execute(request).await?;
    let status_code = response.status();

    #[cfg(feature = "tracing")]
    tracing::Span::current().record("status_code", status_code.as_u16());

    let text = response.text().await?;
    let body = match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(body) => body,
        Err(e) => {
            #[cfg(feature = "tracing")]
            tracing::error!(%path, status = %status_code, raw = %text, "response is not JSON");

            return Err(Error::malformed(
                path,
                status_code,
                format!("body is not JSON: {e}"),
            ));
        }
    };

    Ok(Response::new(path.to_owned(), status_code, body))
}
