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

//! Bare-metal provisioning API client.

use crate::backend_error;
use crate::ApiCredentials;
use crate::ApiEndpoint;
use crate::ClassifiedError;
use crate::HttpClient;
use http::HeaderMap;
use http::HeaderValue;
use redfish_emulator_core::backend::BaremetalApi;
use redfish_emulator_core::backend::Node;
use redfish_emulator_core::backend::NodePowerTarget;
use redfish_emulator_core::backend::NodeSummary;
use redfish_emulator_core::BackendError;
use serde::Deserialize;
use serde_json::json;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use url::Url;

/// API version the client requests. It exposes node boot mode and
/// secure boot state.
pub const API_VERSION: &str = "1.75";

const API_VERSION_HEADER: &str = "X-OpenStack-Ironic-API-Version";

#[derive(Deserialize)]
struct NodesEnvelope {
    nodes: Vec<NodeSummary>,
}

#[derive(Deserialize)]
struct WireNode {
    uuid: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    power_state: Option<String>,
    #[serde(default)]
    boot_mode: Option<String>,
    #[serde(default)]
    secure_boot: Option<bool>,
    #[serde(default)]
    properties: BTreeMap<String, JsonValue>,
}

#[derive(Deserialize)]
struct BootDeviceResponse {
    boot_device: Option<String>,
}

#[derive(Deserialize)]
struct PortsEnvelope {
    ports: Vec<WirePort>,
}

#[derive(Deserialize)]
struct WirePort {
    address: String,
}

#[derive(Deserialize)]
struct BiosEnvelope {
    bios: Vec<BiosSetting>,
}

#[derive(Deserialize)]
struct BiosSetting {
    name: String,
    value: JsonValue,
}

/// Node properties are free-form: numbers may come as JSON numbers or as
/// strings.
fn numeric_property(properties: &BTreeMap<String, JsonValue>, name: &str) -> Option<u64> {
    match properties.get(name)? {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl From<WireNode> for Node {
    fn from(wire: WireNode) -> Self {
        let memory_mb = numeric_property(&wire.properties, "memory_mb");
        let cpus = numeric_property(&wire.properties, "cpus").and_then(|v| u32::try_from(v).ok());
        Self {
            uuid: wire.uuid,
            name: wire.name,
            power_state: wire.power_state,
            boot_mode: wire.boot_mode,
            secure_boot: wire.secure_boot,
            memory_mb,
            cpus,
        }
    }
}

/// Client of the bare-metal provisioning API.
pub struct BaremetalClient<C: HttpClient> {
    client: C,
    endpoint: ApiEndpoint,
    credentials: ApiCredentials,
    custom_headers: HeaderMap,
}

impl<C: HttpClient> BaremetalClient<C> {
    /// Create client of the API at `endpoint` (e.g.
    /// `http://baremetal.example:6385`).
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

    fn node_url(&self, uuid: &str, rest: &[&str]) -> Url {
        self.endpoint
            .with_segments(["v1", "nodes", uuid].iter().chain(rest))
    }

    fn error(&self, operation: &'static str, uuid: &str, err: &C::Error) -> BackendError {
        backend_error(&self.endpoint, operation, err).with_identity(uuid)
    }
}

impl<C: HttpClient> BaremetalApi for BaremetalClient<C> {
    fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn list_nodes(&self) -> Result<Vec<NodeSummary>, BackendError> {
        let mut url = self.endpoint.with_segments(["v1", "nodes"]);
        url.query_pairs_mut().append_pair("fields", "uuid,name");
        self.client
            .get::<NodesEnvelope>(url, &self.credentials, &self.custom_headers)
            .await
            .map(|envelope| envelope.nodes)
            .map_err(|err| backend_error(&self.endpoint, "list_nodes", &err))
    }

    async fn get_node(&self, ident: &str) -> Result<Option<Node>, BackendError> {
        match self
            .client
            .get::<WireNode>(self.node_url(ident, &[]), &self.credentials, &self.custom_headers)
            .await
        {
            Ok(node) => Ok(Some(node.into())),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(self.error("get_node", ident, &err)),
        }
    }

    async fn set_power_state(&self, uuid: &str, target: NodePowerTarget) -> Result<(), BackendError> {
        self.client
            .put(
                self.node_url(uuid, &["states", "power"]),
                &json!({ "target": target.as_str() }),
                &self.credentials,
                &self.custom_headers,
            )
            .await
            .map_err(|err| self.error("set_power_state", uuid, &err))
    }

    async fn get_boot_device(&self, uuid: &str) -> Result<Option<String>, BackendError> {
        self.client
            .get::<BootDeviceResponse>(
                self.node_url(uuid, &["management", "boot_device"]),
                &self.credentials,
                &self.custom_headers,
            )
            .await
            .map(|response| response.boot_device)
            .map_err(|err| self.error("get_boot_device", uuid, &err))
    }

    async fn set_boot_device(&self, uuid: &str, device: &str, persistent: bool) -> Result<(), BackendError> {
        self.client
            .put(
                self.node_url(uuid, &["management", "boot_device"]),
                &json!({ "boot_device": device, "persistent": persistent }),
                &self.credentials,
                &self.custom_headers,
            )
            .await
            .map_err(|err| self.error("set_boot_device", uuid, &err))
    }

    async fn set_boot_mode(&self, uuid: &str, mode: &str) -> Result<(), BackendError> {
        self.client
            .put(
                self.node_url(uuid, &["states", "boot_mode"]),
                &json!({ "target": mode }),
                &self.credentials,
                &self.custom_headers,
            )
            .await
            .map_err(|err| self.error("set_boot_mode", uuid, &err))
    }

    async fn list_port_macs(&self, uuid: &str) -> Result<Vec<String>, BackendError> {
        let mut url = self.endpoint.with_segments(["v1", "ports"]);
        url.query_pairs_mut()
            .append_pair("node_uuid", uuid)
            .append_pair("fields", "address");
        self.client
            .get::<PortsEnvelope>(url, &self.credentials, &self.custom_headers)
            .await
            .map(|envelope| envelope.ports.into_iter().map(|port| port.address).collect())
            .map_err(|err| self.error("list_port_macs", uuid, &err))
    }

    async fn get_bios_settings(&self, uuid: &str) -> Result<BTreeMap<String, JsonValue>, BackendError> {
        self.client
            .get::<BiosEnvelope>(
                self.node_url(uuid, &["bios"]),
                &self.credentials,
                &self.custom_headers,
            )
            .await
            .map(|envelope| {
                envelope
                    .bios
                    .into_iter()
                    .map(|setting| (setting.name, setting.value))
                    .collect()
            })
            .map_err(|err| self.error("get_bios_settings", uuid, &err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_properties_accept_strings_and_numbers() {
        let wire: WireNode = serde_json::from_value(json!({
            "uuid": "1be26c0b-03f2-4d2e-ae87-c02d7f33c123",
            "name": "bm-0",
            "power_state": "power on",
            "properties": { "memory_mb": "8192", "cpus": 4 }
        }))
        .expect("valid node");
        let node = Node::from(wire);
        assert_eq!(node.memory_mb, Some(8192));
        assert_eq!(node.cpus, Some(4));
        assert_eq!(node.boot_mode, None);
    }
}
