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

//! Backend API clients built from configuration.

use crate::config::ConfigError;
use crate::config::IronicConfig;
use crate::config::NovaConfig;
use redfish_emulator_backend_http::reqwest::Client;
use redfish_emulator_backend_http::ApiCredentials;
use redfish_emulator_backend_http::BaremetalClient;
use redfish_emulator_backend_http::ComputeClient;
use redfish_emulator_backend_http::WebhookNotifier;
use url::Url;

fn parse_url(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|err| ConfigError::Invalid(format!("bad url {url}: {err}")))
}

fn client() -> Result<Client, ConfigError> {
    Client::new().map_err(|err| ConfigError::Invalid(format!("cannot build HTTP client: {err}")))
}

/// Compute API client of `config`.
///
/// # Errors
///
/// Returns error if the endpoint is not a valid URL.
pub fn compute_client(config: &NovaConfig) -> Result<ComputeClient<Client>, ConfigError> {
    let credentials = config
        .token
        .as_ref()
        .map_or(ApiCredentials::Anonymous, ApiCredentials::token);
    Ok(ComputeClient::new(client()?, parse_url(&config.endpoint)?, credentials))
}

/// Provisioning API client of `config`. A token takes precedence over
/// basic credentials.
///
/// # Errors
///
/// Returns error if the endpoint is not a valid URL.
pub fn baremetal_client(config: &IronicConfig) -> Result<BaremetalClient<Client>, ConfigError> {
    let credentials = match (&config.token, &config.username) {
        (Some(token), _) => ApiCredentials::token(token),
        (None, Some(username)) => {
            ApiCredentials::basic(username, config.password.clone().unwrap_or_default())
        }
        (None, None) => ApiCredentials::Anonymous,
    };
    Ok(BaremetalClient::new(client()?, parse_url(&config.endpoint)?, credentials))
}

/// Notifier posting state changes to `url`.
///
/// # Errors
///
/// Returns error if `url` is not a valid URL.
pub fn webhook_notifier(url: &str) -> Result<WebhookNotifier<Client>, ConfigError> {
    Ok(WebhookNotifier::new(client()?, parse_url(url)?, ApiCredentials::Anonymous))
}
