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

//! Native APIs of the backends the drivers translate to.
//!
//! These traits are the boundary of the emulator. The wire protocols
//! behind them live in `redfish-emulator-backend-http` (cloud compute,
//! bare-metal provisioning, webhooks, image downloads), or in a hypervisor
//! binding provided by the embedding application. In-memory
//! implementations for tests live in `redfish-emulator-backend-mock`.
//!
//! Every method reports failures as [`BackendError`]; "entity does not
//! exist" is not a failure and is reported as `Ok(None)`.

use crate::BackendError;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;

/// Access mode of a hypervisor connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// Domain as listed by the hypervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRef {
    pub uuid: String,
    pub name: String,
}

/// Opens connections to the hypervisor.
///
/// A connection is opened per logical operation and closed when dropped.
/// Read paths open [`AccessMode::ReadOnly`] connections, write paths
/// [`AccessMode::ReadWrite`].
pub trait HypervisorConnector: Send + Sync {
    type Connection: HypervisorConnection;

    /// Connection URI, used in errors and logs.
    fn uri(&self) -> &str;

    /// Open a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns error if the hypervisor is unreachable.
    fn open(&self, mode: AccessMode) -> Result<Self::Connection, BackendError>;
}

/// Open connection to the hypervisor. Domains are addressed by UUID.
#[allow(clippy::missing_errors_doc)]
pub trait HypervisorConnection: Send {
    fn list_domains(&self) -> Result<Vec<DomainRef>, BackendError>;

    fn lookup_by_uuid(&self, uuid: &str) -> Result<Option<DomainRef>, BackendError>;

    fn lookup_by_name(&self, name: &str) -> Result<Option<DomainRef>, BackendError>;

    fn is_active(&self, uuid: &str) -> Result<bool, BackendError>;

    /// Persistent configuration document of the domain.
    fn domain_xml(&self, uuid: &str) -> Result<String, BackendError>;

    /// Replace persistent configuration of the domain.
    fn define_xml(&self, xml: &str) -> Result<(), BackendError>;

    fn create(&self, uuid: &str) -> Result<(), BackendError>;

    fn destroy(&self, uuid: &str) -> Result<(), BackendError>;

    fn shutdown(&self, uuid: &str) -> Result<(), BackendError>;

    fn reboot(&self, uuid: &str) -> Result<(), BackendError>;

    fn reset(&self, uuid: &str) -> Result<(), BackendError>;

    fn inject_nmi(&self, uuid: &str) -> Result<(), BackendError>;

    /// Path of a volume in a storage pool.
    fn lookup_volume(&self, pool: &str, name: &str) -> Result<Option<String>, BackendError>;

    /// Create volume in a storage pool, returning its path.
    fn create_volume(&self, pool: &str, name: &str, capacity_bytes: u64)
        -> Result<String, BackendError>;

    /// Capacity of the volume backing `path`.
    fn volume_capacity(&self, path: &str) -> Result<Option<u64>, BackendError>;
}

/// Server summary as listed by the compute API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSummary {
    pub id: String,
    pub name: String,
}

/// Compute server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    /// Hypervisor power state code (1 = running, 4 = shutdown, ...).
    pub power_state: u8,
    /// Task in progress on the server, if any.
    pub task_state: Option<String>,
    pub flavor_id: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub macs: Vec<String>,
}

/// Compute flavor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub ram_mb: u64,
    pub vcpus: u32,
}

/// Server action of the compute API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerAction {
    Start,
    Stop,
    SoftReboot,
    HardReboot,
    CrashDump,
}

/// Cloud compute API.
pub trait ComputeApi: Send + Sync {
    fn endpoint(&self) -> &str;

    fn list_servers(&self) -> impl Future<Output = Result<Vec<ServerSummary>, BackendError>> + Send;

    fn get_server(&self, id: &str)
        -> impl Future<Output = Result<Option<Server>, BackendError>> + Send;

    /// Servers with exactly this name.
    fn find_servers_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Vec<Server>, BackendError>> + Send;

    fn get_flavor(&self, id: &str)
        -> impl Future<Output = Result<Option<Flavor>, BackendError>> + Send;

    fn server_action(
        &self,
        id: &str,
        action: ServerAction,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Set (`Some`) or delete (`None`) metadata item of the server.
    fn set_server_metadata(
        &self,
        id: &str,
        key: &str,
        value: Option<&str>,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// Bare-metal node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub uuid: String,
    pub name: Option<String>,
    /// `power on`, `power off` or `None` when unknown.
    pub power_state: Option<String>,
    /// `uefi`, `bios` or `None` when unknown.
    pub boot_mode: Option<String>,
    pub secure_boot: Option<bool>,
    pub memory_mb: Option<u64>,
    pub cpus: Option<u32>,
}

/// Bare-metal node summary as listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub uuid: String,
    pub name: Option<String>,
}

/// Target power state of a bare-metal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePowerTarget {
    PowerOn,
    PowerOff,
    SoftPowerOff,
    Rebooting,
    SoftRebooting,
}

impl NodePowerTarget {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PowerOn => "power on",
            Self::PowerOff => "power off",
            Self::SoftPowerOff => "soft power off",
            Self::Rebooting => "rebooting",
            Self::SoftRebooting => "soft rebooting",
        }
    }
}

/// Bare-metal provisioning API. Nodes accept name or UUID as identity.
pub trait BaremetalApi: Send + Sync {
    fn endpoint(&self) -> &str;

    fn list_nodes(&self) -> impl Future<Output = Result<Vec<NodeSummary>, BackendError>> + Send;

    fn get_node(&self, ident: &str)
        -> impl Future<Output = Result<Option<Node>, BackendError>> + Send;

    fn set_power_state(
        &self,
        uuid: &str,
        target: NodePowerTarget,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Native boot device code (`pxe`, `disk`, `cdrom`, ...).
    fn get_boot_device(&self, uuid: &str)
        -> impl Future<Output = Result<Option<String>, BackendError>> + Send;

    fn set_boot_device(
        &self,
        uuid: &str,
        device: &str,
        persistent: bool,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Native boot mode (`uefi`, `bios`).
    fn set_boot_mode(
        &self,
        uuid: &str,
        mode: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// MAC addresses of the node ports.
    fn list_port_macs(&self, uuid: &str)
        -> impl Future<Output = Result<Vec<String>, BackendError>> + Send;

    /// BIOS settings of the node.
    fn get_bios_settings(
        &self,
        uuid: &str,
    ) -> impl Future<Output = Result<BTreeMap<String, JsonValue>, BackendError>> + Send;
}

/// State change event posted to external listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub uuid: String,
    pub name: String,
    #[serde(flatten)]
    pub change: JsonValue,
}

/// Receives state change events.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &StateChange) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// Notifier that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNotifier;

impl Notifier for NoNotifier {
    async fn notify(&self, _event: &StateChange) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Image download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Verify TLS certificate of the server.
    pub verify: bool,
    /// PEM encoded CA certificate to verify the server with.
    pub ca_certificate: Option<String>,
    /// Directory to place the image into.
    pub destination: PathBuf,
}

/// Downloaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    /// File name reported by the server or derived from the URL.
    pub name: String,
    pub path: PathBuf,
}

/// Downloads images for virtual media.
pub trait ImageFetcher: Send + Sync {
    fn fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<FetchedImage, BackendError>> + Send;
}
