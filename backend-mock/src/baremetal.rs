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

//! In-memory bare-metal provisioning API.

use crate::fault::lock;
use crate::fault::Faults;
use redfish_emulator_core::backend::BaremetalApi;
use redfish_emulator_core::backend::Node;
use redfish_emulator_core::backend::NodePowerTarget;
use redfish_emulator_core::backend::NodeSummary;
use redfish_emulator_core::BackendError;
use redfish_emulator_core::BackendErrorKind;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct MockNode {
    node: Node,
    boot_device: Option<String>,
    persistent: bool,
    macs: Vec<String>,
    bios: BTreeMap<String, JsonValue>,
}

#[derive(Debug, Default)]
struct BaremetalState {
    nodes: BTreeMap<String, MockNode>,
    calls: Vec<String>,
}

/// Bare-metal API keeping nodes in memory. Clones share state.
#[derive(Clone, Default)]
pub struct MockBaremetal {
    state: Arc<Mutex<BaremetalState>>,
    faults: Arc<Faults>,
}

/// Node with sensible defaults for tests.
#[must_use]
pub fn node(uuid: &str, name: Option<&str>, power_state: &str) -> Node {
    Node {
        uuid: uuid.to_string(),
        name: name.map(str::to_string),
        power_state: Some(power_state.to_string()),
        boot_mode: Some("uefi".to_string()),
        secure_boot: Some(false),
        memory_mb: Some(16384),
        cpus: Some(8),
    }
}

impl MockBaremetal {
    const ENDPOINT: &'static str = "mock://baremetal";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&self, node: Node, macs: &[&str]) {
        lock(&self.state).nodes.insert(
            node.uuid.clone(),
            MockNode {
                node,
                boot_device: Some("disk".to_string()),
                persistent: true,
                macs: macs.iter().map(|mac| (*mac).to_string()).collect(),
                bios: BTreeMap::new(),
            },
        );
    }

    pub fn set_bios_setting(&self, uuid: &str, name: &str, value: JsonValue) {
        if let Some(node) = lock(&self.state).nodes.get_mut(uuid) {
            node.bios.insert(name.to_string(), value);
        }
    }

    /// Report a raw boot device code, mappable or not.
    pub fn set_raw_boot_device(&self, uuid: &str, device: Option<&str>) {
        if let Some(node) = lock(&self.state).nodes.get_mut(uuid) {
            node.boot_device = device.map(str::to_string);
        }
    }

    #[must_use]
    pub fn node(&self, uuid: &str) -> Option<Node> {
        lock(&self.state).nodes.get(uuid).map(|n| n.node.clone())
    }

    /// Boot device and its persistence flag.
    #[must_use]
    pub fn boot_device(&self, uuid: &str) -> Option<(Option<String>, bool)> {
        lock(&self.state)
            .nodes
            .get(uuid)
            .map(|n| (n.boot_device.clone(), n.persistent))
    }

    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        let prefix = format!("{operation}:");
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| call.starts_with(&prefix))
            .count()
    }

    #[must_use]
    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    fn record(&self, operation: &'static str, arg: &str) -> Result<(), BackendError> {
        self.faults.check(Self::ENDPOINT, operation, Some(arg))?;
        lock(&self.state).calls.push(format!("{operation}:{arg}"));
        Ok(())
    }

    fn update<T>(
        &self,
        operation: &'static str,
        uuid: &str,
        f: impl FnOnce(&mut MockNode) -> T,
    ) -> Result<T, BackendError> {
        self.record(operation, uuid)?;
        lock(&self.state)
            .nodes
            .get_mut(uuid)
            .map(f)
            .ok_or_else(|| {
                BackendError::new(
                    Self::ENDPOINT,
                    operation,
                    BackendErrorKind::Protocol,
                    format!("Node {uuid} could not be found."),
                )
                .with_identity(uuid)
            })
    }
}

impl BaremetalApi for MockBaremetal {
    fn endpoint(&self) -> &str {
        Self::ENDPOINT
    }

    async fn list_nodes(&self) -> Result<Vec<NodeSummary>, BackendError> {
        self.record("list_nodes", "")?;
        Ok(lock(&self.state)
            .nodes
            .values()
            .map(|n| NodeSummary {
                uuid: n.node.uuid.clone(),
                name: n.node.name.clone(),
            })
            .collect())
    }

    async fn get_node(&self, ident: &str) -> Result<Option<Node>, BackendError> {
        self.record("get_node", ident)?;
        let state = lock(&self.state);
        Ok(state
            .nodes
            .get(ident)
            .or_else(|| {
                state
                    .nodes
                    .values()
                    .find(|n| n.node.name.as_deref() == Some(ident))
            })
            .map(|n| n.node.clone()))
    }

    async fn set_power_state(&self, uuid: &str, target: NodePowerTarget) -> Result<(), BackendError> {
        self.update("set_power_state", uuid, |n| {
            let state = match target {
                NodePowerTarget::PowerOff | NodePowerTarget::SoftPowerOff => "power off",
                NodePowerTarget::PowerOn
                | NodePowerTarget::Rebooting
                | NodePowerTarget::SoftRebooting => "power on",
            };
            n.node.power_state = Some(state.to_string());
        })
    }

    async fn get_boot_device(&self, uuid: &str) -> Result<Option<String>, BackendError> {
        self.update("get_boot_device", uuid, |n| n.boot_device.clone())
    }

    async fn set_boot_device(&self, uuid: &str, device: &str, persistent: bool) -> Result<(), BackendError> {
        self.update("set_boot_device", uuid, |n| {
            n.boot_device = Some(device.to_string());
            n.persistent = persistent;
        })
    }

    async fn set_boot_mode(&self, uuid: &str, mode: &str) -> Result<(), BackendError> {
        self.update("set_boot_mode", uuid, |n| {
            n.node.boot_mode = Some(mode.to_string());
        })
    }

    async fn list_port_macs(&self, uuid: &str) -> Result<Vec<String>, BackendError> {
        self.update("list_port_macs", uuid, |n| n.macs.clone())
    }

    async fn get_bios_settings(&self, uuid: &str) -> Result<BTreeMap<String, JsonValue>, BackendError> {
        self.update("get_bios_settings", uuid, |n| n.bios.clone())
    }
}
