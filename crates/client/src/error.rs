use std::{path::PathBuf, time::Duration};

use reqwest::StatusCode;
use snafu::Snafu;

use crate::{resolver::RecordKind, session::RequestMethod};

/// Errors raised while talking to the Wayne control plane.
///
/// Configuration problems (`MissingCredential`, `InvalidBaseUrl`,
/// `UnsupportedScheme`, `Template`) are always reported before the first
/// request is sent.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// A credential was given neither on the command line nor in its
    /// environment variable.
    #[snafu(display("Environment variable {variable} is not set"))]
    MissingCredential { variable: &'static str },

    /// The control plane URL cannot be parsed.
    #[snafu(display("Invalid control plane URL '{url}', error: {source}"))]
    InvalidBaseUrl { url: String, source: url::ParseError },

    #[snafu(display("Control plane URL '{url}' must use http or https"))]
    UnsupportedScheme { url: String },

    /// A template file could not be loaded before the run started.
    #[snafu(display("{source}"))]
    Template { source: crate::template::Error },

    #[snafu(display("Failed to build HTTP client, error: {source}"))]
    BuildHttpClient { source: reqwest::Error },

    #[snafu(display("HTTP method {method} is not supported by the control plane client"))]
    UnsupportedMethod { method: reqwest::Method },

    /// The request got no response within the per-request timeout.
    #[snafu(display("Failed to send {method} request to {url}, error: {source}"))]
    SendRequest { method: RequestMethod, url: String, source: reqwest::Error },

    #[snafu(display("Failed to read response body from {url}, error: {source}"))]
    ReadResponseBody { url: String, source: reqwest::Error },

    #[snafu(display("Failed to serialize request payload for {uri}, error: {source}"))]
    SerializePayload { uri: String, source: serde_json::Error },

    #[snafu(display("Failed to serialize {kind} manifest, error: {source}"))]
    SerializeManifest { kind: RecordKind, source: serde_json::Error },

    #[snafu(display("Failed to read token cache {}, error: {source}", path.display()))]
    ReadTokenCache { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to write token cache {}, error: {source}", path.display()))]
    WriteTokenCache { path: PathBuf, source: std::io::Error },

    /// The login endpoint answered with anything but `200 OK`, or its body
    /// had no `data.token`.
    #[snafu(display("Login as {username} failed, status {status}, response: {body}"))]
    Authentication { username: String, status: StatusCode, body: String },

    /// The control plane answered with an unexpected status, including a
    /// second `401` after logging in again.
    #[snafu(display("Control plane rejected {method} {url} with status {status}: {body}"))]
    Upstream { method: RequestMethod, url: String, status: StatusCode, body: String },

    /// A `200 OK` body that is not JSON or lacks the expected fields.
    #[snafu(display("Malformed response from {url}: {reason}"))]
    MalformedResponse { url: String, reason: String },

    /// A push was answered with anything but `200 OK` while the push policy
    /// for `kind` is strict.
    #[snafu(display(
        "Failed to push {kind} {name} to cluster {cluster}, status {status}, response: {body}"
    ))]
    PublishFailure {
        kind: RecordKind,
        name: String,
        cluster: String,
        status: StatusCode,
        body: String,
    },

    /// The whole run exceeded its deadline.
    #[snafu(display("Deployment did not finish within {} seconds", timeout.as_secs()))]
    Timeout { timeout: Duration },
}

impl From<crate::template::Error> for Error {
    fn from(source: crate::template::Error) -> Self { Self::Template { source } }
}
