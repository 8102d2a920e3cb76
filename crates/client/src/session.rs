//! Authenticated access to the control plane.
//!
//! A [`Session`] attaches the cached bearer token to every request and, when
//! the server answers `401 Unauthorized`, logs in once more and retries the
//! request exactly once.

use std::{fmt, sync::Arc, time::Duration};

use reqwest::{
    StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use snafu::ResultExt;
use wayne_deploy_base::USER_AGENT;

use crate::{
    api::{self, LoginData},
    credentials::Credentials,
    error::{self, Error},
    token::{Token, TokenStore},
};

/// The only HTTP methods the control-plane API is called with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
        })
    }
}

impl TryFrom<reqwest::Method> for RequestMethod {
    type Error = Error;

    fn try_from(method: reqwest::Method) -> Result<Self, Self::Error> {
        match method {
            reqwest::Method::GET => Ok(Self::Get),
            reqwest::Method::POST => Ok(Self::Post),
            method => error::UnsupportedMethodSnafu { method }.fail(),
        }
    }
}

impl From<RequestMethod> for reqwest::Method {
    fn from(method: RequestMethod) -> Self {
        match method {
            RequestMethod::Get => Self::GET,
            RequestMethod::Post => Self::POST,
        }
    }
}

/// The `{"data": ...}` envelope wrapping every successful response.
#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

/// A fully read response.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub method: RequestMethod,
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    /// # Errors
    ///
    /// Returns `Upstream` carrying the status and body when the status is not
    /// 2xx.
    pub fn ensure_success(self) -> Result<Self, Error> {
        if self.status.is_success() {
            Ok(self)
        } else {
            let Self { method, url, status, body } = self;
            error::UpstreamSnafu { method, url, status, body }.fail()
        }
    }

    /// Decodes the `data` field of a successful response.
    ///
    /// # Errors
    ///
    /// Returns `Upstream` for a non-2xx status and `MalformedResponse` when
    /// the body is not JSON, lacks `data`, or `data` has an unexpected shape.
    pub fn data<T: DeserializeOwned>(self) -> Result<T, Error> {
        let Self { url, body, .. } = self.ensure_success()?;
        let envelope = serde_json::from_str::<Envelope<T>>(&body).map_err(|err| {
            Error::MalformedResponse { url: url.clone(), reason: err.to_string() }
        })?;
        envelope.data.ok_or_else(|| Error::MalformedResponse {
            url,
            reason: "response has no `data` field".to_string(),
        })
    }
}

/// Tuning for the underlying HTTP client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    /// Upper bound for a single request, connection included.
    pub request_timeout: Duration,

    pub connect_timeout: Duration,

    /// Log every outgoing authenticated request before it is sent.
    pub debug: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            debug: false,
        }
    }
}

pub struct Session {
    http: reqwest::Client,
    credentials: Credentials,
    store: Arc<dyn TokenStore>,
    debug: bool,
}

impl Session {
    /// # Errors
    ///
    /// Returns `BuildHttpClient` if the HTTP client cannot be initialized.
    pub fn new(
        credentials: Credentials,
        store: Arc<dyn TokenStore>,
        options: SessionOptions,
    ) -> Result<Self, Error> {
        let SessionOptions { request_timeout, connect_timeout, debug } = options;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT.as_str())
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .context(error::BuildHttpClientSnafu)?;
        Ok(Self { http, credentials, store, debug })
    }

    pub const fn credentials(&self) -> &Credentials { &self.credentials }

    /// Returns the cached token, logging in only when the cache is empty.
    ///
    /// The cached token is not validated here; an expired token is detected
    /// by the `401` it provokes.
    ///
    /// # Errors
    ///
    /// Returns the token store's read error or any error of [`Session::login`].
    pub async fn get_token(&self) -> Result<Token, Error> {
        if let Some(token) = self.store.load().await? {
            return Ok(token);
        }
        self.login().await
    }

    /// Exchanges the username and password for a new token and writes it to
    /// the token store, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `Authentication` when the response carries no `data.token`,
    /// `SendRequest` on transport failures, and the token store's write
    /// error.
    pub async fn login(&self) -> Result<Token, Error> {
        let url = self.credentials.url(api::LOGIN);
        let username = self.credentials.username();
        let response = self
            .http
            .get(&url)
            .query(&[("username", username), ("password", self.credentials.password())])
            .send()
            .await
            .with_context(|_| error::SendRequestSnafu {
                method: RequestMethod::Get,
                url: url.clone(),
            })?;
        let status = response.status();
        let body = response.text().await.context(error::ReadResponseBodySnafu { url })?;

        let token = serde_json::from_str::<Envelope<LoginData>>(&body)
            .ok()
            .and_then(|envelope| envelope.data)
            .map(|data| data.token)
            .filter(|token| !token.is_empty());
        let Some(token) = token else {
            return error::AuthenticationSnafu { username, status, body }.fail();
        };

        let token = Token::new(token);
        self.store.save(&token).await?;
        tracing::info!("Logged in to {} as {username}", self.credentials.base_url());
        Ok(token)
    }

    /// Sends `GET uri`.
    ///
    /// # Errors
    ///
    /// See [`Session::authenticated_request`].
    pub async fn get(&self, uri: &str) -> Result<ApiResponse, Error> {
        self.authenticated_request(uri, RequestMethod::Get, None).await
    }

    /// Sends `POST uri` with `payload` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns `SerializePayload` when `payload` cannot be represented as
    /// JSON, otherwise see [`Session::authenticated_request`].
    pub async fn post<P>(&self, uri: &str, payload: &P) -> Result<ApiResponse, Error>
    where
        P: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(payload)
            .with_context(|_| error::SerializePayloadSnafu { uri: uri.to_string() })?;
        self.authenticated_request(uri, RequestMethod::Post, Some(&payload)).await
    }

    /// Sends a request carrying `Authorization: Bearer <token>`.
    ///
    /// A `401` answer triggers exactly one new login and one retry with the
    /// new token. Whatever the retry returns, including a second `401`, is
    /// handed back unchanged. Non-2xx statuses are not errors at this level.
    ///
    /// # Errors
    ///
    /// Returns `SendRequest` on transport failures (including timeouts) and
    /// any error raised while obtaining a token.
    pub async fn authenticated_request(
        &self,
        uri: &str,
        method: RequestMethod,
        payload: Option<&serde_json::Value>,
    ) -> Result<ApiResponse, Error> {
        let url = self.credentials.url(uri);
        if self.debug {
            let payload = payload.map_or_else(|| "null".to_string(), ToString::to_string);
            tracing::info!("url: {url}, method: {method}, payload: {payload}");
        }

        let token = self.get_token().await?;
        let response = self.send(method, &url, payload, &token).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::warn!("Token was rejected by {url}, logging in again");
        let token = self.login().await?;
        self.send(method, &url, payload, &token).await
    }

    async fn send(
        &self,
        method: RequestMethod,
        url: &str,
        payload: Option<&serde_json::Value>,
        token: &Token,
    ) -> Result<ApiResponse, Error> {
        let mut request = self
            .http
            .request(method.into(), url)
            .header(AUTHORIZATION, token.bearer())
            .header(CONTENT_TYPE, "application/json");
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request
            .send()
            .await
            .with_context(|_| error::SendRequestSnafu { method, url: url.to_string() })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|_| error::ReadResponseBodySnafu { url: url.to_string() })?;
        tracing::debug!("{method} {url} answered {status}");

        Ok(ApiResponse { method, url: url.to_string(), status, body })
    }
}
