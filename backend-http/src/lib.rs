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

//! HTTP clients of the emulator backends.
//!
//! - [`compute::ComputeClient`]: cloud compute API ([`ComputeApi`]).
//! - [`baremetal::BaremetalClient`]: bare-metal provisioning API
//!   ([`BaremetalApi`]).
//! - [`webhook::WebhookNotifier`]: posts state change events.
//! - `fetch::HttpImageFetcher`: downloads virtual media images.
//!
//! API clients are generic over [`HttpClient`]. The `reqwest` feature
//! (enabled by default) provides an implementation on top of `reqwest`.
//!
//! [`ComputeApi`]: redfish_emulator_core::backend::ComputeApi
//! [`BaremetalApi`]: redfish_emulator_core::backend::BaremetalApi

pub mod baremetal;
pub mod compute;
pub mod credentials;
pub mod webhook;

#[cfg(feature = "reqwest")]
pub mod fetch;
#[cfg(feature = "reqwest")]
pub mod reqwest;

use http::HeaderMap;
use redfish_emulator_core::BackendError;
use redfish_emulator_core::BackendErrorKind;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error as StdError;
use std::future::Future;
use url::Url;

#[doc(inline)]
pub use baremetal::BaremetalClient;
#[doc(inline)]
pub use compute::ComputeClient;
#[doc(inline)]
pub use credentials::ApiCredentials;
#[doc(inline)]
pub use webhook::WebhookNotifier;

pub trait HttpClient: Send + Sync {
    type Error: Send + Sync + StdError + ClassifiedError + 'static;

    /// Perform an HTTP GET request and decode JSON response.
    fn get<T>(
        &self,
        url: Url,
        credentials: &ApiCredentials,
        custom_headers: &HeaderMap,
    ) -> impl Future<Output = Result<T, Self::Error>> + Send
    where
        T: DeserializeOwned + Send;

    /// Perform an HTTP POST request with JSON body. Response body is
    /// ignored.
    fn post<B>(
        &self,
        url: Url,
        body: &B,
        credentials: &ApiCredentials,
        custom_headers: &HeaderMap,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send
    where
        B: Serialize + Send + Sync;

    /// Perform an HTTP PUT request with JSON body. Response body is
    /// ignored.
    fn put<B>(
        &self,
        url: Url,
        body: &B,
        credentials: &ApiCredentials,
        custom_headers: &HeaderMap,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send
    where
        B: Serialize + Send + Sync;

    /// Perform an HTTP DELETE request.
    fn delete(
        &self,
        url: Url,
        credentials: &ApiCredentials,
        custom_headers: &HeaderMap,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Classification of HTTP client errors into backend error kinds.
pub trait ClassifiedError {
    /// Server reported that the addressed entity does not exist.
    fn is_not_found(&self) -> bool;

    fn kind(&self) -> BackendErrorKind;
}

/// Base URL of a backend API.
#[derive(Debug, Clone)]
pub struct ApiEndpoint {
    base_url: Url,
}

impl ApiEndpoint {
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    /// Append path segments to the base URL. Segments are percent-encoded.
    #[must_use]
    pub fn with_segments<I, S>(&self, segments: I) -> Url
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    #[must_use]
    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.base_url.as_str()
    }
}

impl From<Url> for ApiEndpoint {
    fn from(url: Url) -> Self {
        Self::new(url)
    }
}

pub(crate) fn backend_error<E>(endpoint: &ApiEndpoint, operation: &'static str, err: &E) -> BackendError
where
    E: StdError + ClassifiedError,
{
    BackendError::new(endpoint.as_str(), operation, err.kind(), err.to_string())
}
