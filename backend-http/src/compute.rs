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

//! Cloud compute API client.

use crate::backend_error;
use crate::ApiCredentials;
use crate::ApiEndpoint;
use crate::ClassifiedError;
use crate::HttpClient;
use http::HeaderMap;
use http::HeaderValue;
use redfish_emulator_core::backend::ComputeApi;
use redfish_emulator_core::backend::Flavor;
use redfish_emulator_core::backend::Server;
use redfish_emulator_core::backend::ServerAction;
use redfish_emulator_core::backend::ServerSummary;
use redfish_emulator_core::BackendError;
use serde::Deserialize;
use serde_json::json;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use url::Url;

/// Microversion of the compute API the client speaks. It still embeds
/// flavor id into the server representation.
pub const API_VERSION: &str = "2.17";

const API_VERSION_HEADER: &str = "X-OpenStack-Nova-API-Version";

#[derive(Deserialize)]
struct ServersEnvelope<T> {
    servers: Vec<T>,
}

#[derive(Deserialize)]
struct ServerEnvelope {
    server: WireServer,
}

#[derive(Deserialize)]
struct FlavorEnvelope {
    flavor: WireFlavor,
}

#[derive(Deserialize)]
struct WireServer {
    id: String,
    name: String,
    #[serde(rename = "OS-EXT-STS:power_state", default)]
    power_state: u8,
    #[serde(rename = "OS-EXT-STS:task_state", default)]
    task_state: Option<String>,
    #[serde(default)]
    flavor: Option<WireFlavorRef>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    #[serde(default)]
    addresses: BTreeMap<String, Vec<WireAddress>>,
}

#[derive(Deserialize)]
struct WireFlavorRef {
    id: Option<String>,
}

#[derive(Deserialize)]
struct WireAddress {
    #[serde(rename = "OS-EXT-IPS-MAC:mac_addr")]
    mac: Option<String>,
}

#[derive(Deserialize)]
struct WireFlavor {
    id: String,
    ram: u64,
    vcpus: u32,
}

impl From<WireServer> for Server {
    fn from(wire: WireServer) -> Self {
        let mut macs: Vec<String> = wire
            .addresses
            .into_values()
            .flatten()
            .filter_map(|address| address.mac)
            .collect();
        macs.dedup();
        Self {
            id: wire.id,
            name: wire.name,
            power_state: wire.power_state,
            task_state: wire.task_state,
            flavor_id: wire.flavor.and_then(|flavor| flavor.id),
            metadata: wire.metadata,
            macs,
        }
    }
}

/// Client of the cloud compute API.
pub struct ComputeClient<C: HttpClient> {
    client: C,
    endpoint: ApiEndpoint,
    credentials: ApiCredentials,
    custom_headers: HeaderMap,
}

impl<C: HttpClient> ComputeClient<C> {
    /// Create client of the API at `endpoint` (e.g.
    /// `http://compute.example:8774/v2.1`).
    pub fn new(client: C, endpoint: Url, credentials: ApiCredentials) -> Self {
        let mut custom_headers = HeaderMap::new();
        custom_headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        Self {
            client,
            endpoint: ApiEndpoint::new(endpoint),
            credentials,
            custom_headers,
        }
    }

    fn url<const N: usize>(&self, segments: [&str; N]) -> Url {
        self.endpoint.with_segments(segments)
    }

    fn error(&self, operation: &'static str, id: &str, err: &C::Error) -> BackendError {
        backend_error(&self.endpoint, operation, err).with_identity(id)
    }
}

/// Anchored regular expression matching exactly `name`. The API filters
/// server names by regular expression.
fn exact_name_filter(name: &str) -> String {
    let mut filter = String::with_capacity(name.len() + 2);
    filter.push('^');
    for c in name.chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            filter.push('\\');
        }
        filter.push(c);
    }
    filter.push('$');
    filter
}

fn action_body(action: ServerAction) -> JsonValue {
    match action {
        ServerAction::Start => json!({ "os-start": null }),
        ServerAction::Stop => json!({ "os-stop": null }),
        ServerAction::SoftReboot => json!({ "reboot": { "type": "SOFT" } }),
        ServerAction::HardReboot => json!({ "reboot": { "type": "HARD" } }),
        ServerAction::CrashDump => json!({ "trigger_crash_dump": null }),
    }
}

impl<C: HttpClient> ComputeApi for ComputeClient<C> {
    fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn list_servers(&self) -> Result<Vec<ServerSummary>, BackendError> {
        self.client
            .get::<ServersEnvelope<ServerSummary>>(
                self.url(["servers"]),
                &self.credentials,
                &self.custom_headers,
            )
            .await
            .map(|envelope| envelope.servers)
            .map_err(|err| backend_error(&self.endpoint, "list_servers", &err))
    }

    async fn get_server(&self, id: &str) -> Result<Option<Server>, BackendError> {
        match self
            .client
            .get::<ServerEnvelope>(
                self.url(["servers", id]),
                &self.credentials,
                &self.custom_headers,
            )
            .await
        {
            Ok(envelope) => Ok(Some(envelope.server.into())),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(self.error("get_server", id, &err)),
        }
    }

    async fn find_servers_by_name(&self, name: &str) -> Result<Vec<Server>, BackendError> {
        let mut url = self.url(["servers", "detail"]);
        url.query_pairs_mut()
            .append_pair("name", &exact_name_filter(name));
        let envelope = self
            .client
            .get::<ServersEnvelope<WireServer>>(url, &self.credentials, &self.custom_headers)
            .await
            .map_err(|err| self.error("find_servers_by_name", name, &err))?;
        Ok(envelope
            .servers
            .into_iter()
            .filter(|server| server.name == name)
            .map(Server::from)
            .collect())
    }

    async fn get_flavor(&self, id: &str) -> Result<Option<Flavor>, BackendError> {
        match self
            .client
            .get::<FlavorEnvelope>(
                self.url(["flavors", id]),
                &self.credentials,
                &self.custom_headers,
            )
            .await
        {
            Ok(FlavorEnvelope { flavor }) => Ok(Some(Flavor {
                id: flavor.id,
                ram_mb: flavor.ram,
                vcpus: flavor.vcpus,
            })),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(self.error("get_flavor", id, &err)),
        }
    }

    async fn server_action(&self, id: &str, action: ServerAction) -> Result<(), BackendError> {
        self.client
            .post(
                self.url(["servers", id, "action"]),
                &action_body(action),
                &self.credentials,
                &self.custom_headers,
            )
            .await
            .map_err(|err| self.error("server_action", id, &err))
    }

    async fn set_server_metadata(
        &self,
        id: &str,
        key: &str,
        value: Option<&str>,
    ) -> Result<(), BackendError> {
        let url = self.url(["servers", id, "metadata", key]);
        match value {
            Some(value) => self
                .client
                .put(
                    url,
                    &json!({ "meta": { key: value } }),
                    &self.credentials,
                    &self.custom_headers,
                )
                .await
                .map_err(|err| self.error("set_server_metadata", id, &err)),
            None => match self
                .client
                .delete(url, &self.credentials, &self.custom_headers)
                .await
            {
                Err(err) if !err.is_not_found() => {
                    Err(self.error("delete_server_metadata", id, &err))
                }
                _ => Ok(()),
            },
        }
    }
}
