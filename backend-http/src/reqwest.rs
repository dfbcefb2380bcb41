// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::ApiCredentials;
use crate::ClassifiedError;
use crate::HttpClient;
use http::HeaderMap;
use http::StatusCode;
use redfish_emulator_core::BackendErrorKind;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

#[derive(Debug)]
pub enum HttpError {
    ReqwestError(reqwest::Error),
    JsonError(serde_path_to_error::Error<serde_json::Error>),
    InvalidResponse { status: StatusCode, body: String },
    Io(std::io::Error),
}

impl From<reqwest::Error> for HttpError {
    fn from(value: reqwest::Error) -> Self {
        Self::ReqwestError(value)
    }
}

impl From<std::io::Error> for HttpError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl ClassifiedError for HttpError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::InvalidResponse { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    fn kind(&self) -> BackendErrorKind {
        match self {
            Self::ReqwestError(e) if e.is_timeout() => BackendErrorKind::Timeout,
            Self::ReqwestError(e) if e.is_connect() || e.is_request() => {
                BackendErrorKind::Transport
            }
            Self::InvalidResponse { status, .. } => match *status {
                StatusCode::CONFLICT | StatusCode::SERVICE_UNAVAILABLE => BackendErrorKind::Busy,
                StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                    BackendErrorKind::Timeout
                }
                _ => BackendErrorKind::Protocol,
            },
            Self::Io(_) => BackendErrorKind::Transport,
            Self::ReqwestError(_) | Self::JsonError(_) => BackendErrorKind::Protocol,
        }
    }
}

#[allow(clippy::absolute_paths)]
impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReqwestError(e) => write!(f, "HTTP client error: {e}"),
            Self::InvalidResponse { status, body } => {
                write!(f, "Invalid HTTP response: {status}")?;
                if !body.is_empty() {
                    write!(f, ": {body}")?;
                }
                Ok(())
            }
            Self::JsonError(e) => write!(
                f,
                "JSON deserialization error at line {} column {} path {}: {e}",
                e.inner().line(),
                e.inner().column(),
                e.path(),
            ),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

#[allow(clippy::absolute_paths)]
impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReqwestError(e) => Some(e),
            Self::JsonError(e) => Some(e.inner()),
            Self::Io(e) => Some(e),
            Self::InvalidResponse { .. } => None,
        }
    }
}

/// Configuration parameters for the reqwest HTTP client.
///
/// # Examples
///
/// ```rust
/// use redfish_emulator_backend_http::reqwest::ClientParams;
/// use std::time::Duration;
///
/// let params = ClientParams::new()
///     .timeout(Duration::from_secs(30))
///     .connect_timeout(Duration::from_secs(10))
///     .user_agent("MyApp/1.0")
///     .accept_invalid_certs(true);
/// ```
#[derive(Debug, Clone)]
pub struct ClientParams {
    /// HTTP request timeout
    pub timeout: Option<Duration>,
    /// TCP connection timeout
    pub connect_timeout: Option<Duration>,
    /// User-Agent header value
    pub user_agent: Option<String>,
    /// Whether to accept invalid TLS certificates
    pub accept_invalid_certs: bool,
    /// PEM encoded CA certificate trusted in addition to the system ones
    pub root_certificate_pem: Option<Vec<u8>>,
    /// Maximum number of HTTP redirects to follow
    pub max_redirects: Option<usize>,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// List of default headers, added to every request
    pub default_headers: Option<HeaderMap>,
}

impl Default for ClientParams {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(60)),
            connect_timeout: Some(Duration::from_secs(5)),
            user_agent: Some("redfish-emulator/v1".to_string()),
            accept_invalid_certs: false,
            root_certificate_pem: None,
            max_redirects: Some(10),
            pool_idle_timeout: Some(Duration::from_secs(90)),
            default_headers: None,
        }
    }
}

impl ClientParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub const fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    #[must_use]
    pub fn root_certificate_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.root_certificate_pem = Some(pem.into());
        self
    }
}

/// HTTP client implementation using the reqwest library.
///
/// # Examples
///
/// ```rust,no_run
/// use redfish_emulator_backend_http::ApiCredentials;
/// use redfish_emulator_backend_http::ComputeClient;
/// use redfish_emulator_backend_http::reqwest::Client;
/// use redfish_emulator_backend_http::reqwest::ClientParams;
/// use std::time::Duration;
/// use url::Url;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let params = ClientParams::new().timeout(Duration::from_secs(30));
/// let client = Client::with_params(params)?;
/// let endpoint = Url::parse("http://compute.example:8774/v2.1")?;
/// let compute = ComputeClient::new(client, endpoint, ApiCredentials::token("token"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    client: reqwest::Client,
}

#[allow(clippy::missing_errors_doc)]
#[allow(clippy::absolute_paths)]
impl Client {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_params(ClientParams::default())
    }

    pub fn with_params(params: ClientParams) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().use_rustls_tls();

        if let Some(timeout) = params.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(connect_timeout) = params.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        if let Some(user_agent) = params.user_agent {
            builder = builder.user_agent(user_agent);
        }

        if params.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(pem) = params.root_certificate_pem {
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }

        if let Some(max_redirects) = params.max_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::limited(max_redirects));
        }

        if let Some(idle_timeout) = params.pool_idle_timeout {
            builder = builder.pool_idle_timeout(idle_timeout);
        }

        if let Some(default_headers) = params.default_headers {
            builder = builder.default_headers(default_headers);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Start GET request and return response with unread body.
    pub(crate) async fn get_response(
        &self,
        url: Url,
        credentials: &ApiCredentials,
    ) -> Result<reqwest::Response, HttpError> {
        let response = authorize(self.client.get(url), credentials).send().await?;
        ensure_success(response).await
    }
}

fn authorize(request: reqwest::RequestBuilder, credentials: &ApiCredentials) -> reqwest::RequestBuilder {
    match credentials {
        ApiCredentials::Anonymous => request,
        ApiCredentials::Token(token) => request.header("X-Auth-Token", token.as_str()),
        ApiCredentials::Basic { username, password } => request.basic_auth(username, Some(password)),
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, HttpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(HttpError::InvalidResponse { status, body })
}

async fn handle_response<T>(response: reqwest::Response) -> Result<T, HttpError>
where
    T: DeserializeOwned,
{
    let response = ensure_success(response).await?;
    let value: serde_json::Value = response.json().await.map_err(HttpError::ReqwestError)?;
    serde_path_to_error::deserialize(value).map_err(HttpError::JsonError)
}

impl HttpClient for Client {
    type Error = HttpError;

    async fn get<T>(
        &self,
        url: Url,
        credentials: &ApiCredentials,
        custom_headers: &HeaderMap,
    ) -> Result<T, Self::Error>
    where
        T: DeserializeOwned + Send,
    {
        let response = authorize(self.client.get(url), credentials)
            .headers(custom_headers.clone())
            .send()
            .await?;
        handle_response(response).await
    }

    async fn post<B>(
        &self,
        url: Url,
        body: &B,
        credentials: &ApiCredentials,
        custom_headers: &HeaderMap,
    ) -> Result<(), Self::Error>
    where
        B: Serialize + Send + Sync,
    {
        let response = authorize(self.client.post(url), credentials)
            .headers(custom_headers.clone())
            .json(body)
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }

    async fn put<B>(
        &self,
        url: Url,
        body: &B,
        credentials: &ApiCredentials,
        custom_headers: &HeaderMap,
    ) -> Result<(), Self::Error>
    where
        B: Serialize + Send + Sync,
    {
        let response = authorize(self.client.put(url), credentials)
            .headers(custom_headers.clone())
            .json(body)
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }

    async fn delete(
        &self,
        url: Url,
        credentials: &ApiCredentials,
        custom_headers: &HeaderMap,
    ) -> Result<(), Self::Error> {
        let response = authorize(self.client.delete(url), credentials)
            .headers(custom_headers.clone())
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }
}
