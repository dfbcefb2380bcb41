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

//! In-memory hypervisor.

use crate::fault::lock;
use crate::fault::Faults;
use redfish_emulator_core::backend::AccessMode;
use redfish_emulator_core::backend::DomainRef;
use redfish_emulator_core::backend::HypervisorConnection;
use redfish_emulator_core::backend::HypervisorConnector;
use redfish_emulator_core::BackendError;
use redfish_emulator_core::BackendErrorKind;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

/// Domain configuration resembling what a KVM hypervisor reports.
#[must_use]
pub fn sample_domain_xml(uuid: &str, name: &str) -> String {
    format!(
        r#"<domain type="kvm">
  <name>{name}</name>
  <uuid>{uuid}</uuid>
  <memory unit="KiB">2097152</memory>
  <vcpu placement="static">2</vcpu>
  <os>
    <type arch="x86_64" machine="pc-q35-6.2">hvm</type>
    <boot dev="hd"/>
  </os>
  <devices>
    <disk type="file" device="disk">
      <driver name="qemu" type="qcow2"/>
      <source file="/var/lib/libvirt/images/{name}.qcow2"/>
      <target dev="vda" bus="virtio"/>
    </disk>
    <disk type="file" device="cdrom">
      <driver name="qemu" type="raw"/>
      <target dev="sda" bus="sata"/>
      <readonly/>
      <address type="drive" controller="0" bus="0" target="0" unit="0"/>
    </disk>
    <interface type="network">
      <mac address="52:54:00:12:34:56"/>
      <source network="default"/>
      <model type="virtio"/>
    </interface>
  </devices>
</domain>
"#
    )
}

#[derive(Debug, Clone)]
struct MockDomain {
    name: String,
    xml: String,
    active: bool,
}

#[derive(Debug, Default)]
struct HypervisorState {
    domains: BTreeMap<String, MockDomain>,
    /// (pool, volume name) -> (path, capacity)
    volumes: BTreeMap<(String, String), (String, u64)>,
    calls: Vec<String>,
    opened_read_only: usize,
    opened_read_write: usize,
    open_now: usize,
}

/// Hypervisor keeping domains in memory. Clones share state.
#[derive(Clone)]
pub struct MockHypervisor {
    uri: String,
    state: Arc<Mutex<HypervisorState>>,
    faults: Arc<Faults>,
}

impl Default for MockHypervisor {
    fn default() -> Self {
        Self::new("test:///default")
    }
}

impl MockHypervisor {
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            state: Arc::default(),
            faults: Arc::default(),
        }
    }

    pub fn add_domain(&self, uuid: &str, name: &str, xml: impl Into<String>, active: bool) {
        lock(&self.state).domains.insert(
            uuid.to_string(),
            MockDomain {
                name: name.to_string(),
                xml: xml.into(),
                active,
            },
        );
    }

    /// Current configuration of the domain.
    #[must_use]
    pub fn domain_xml(&self, uuid: &str) -> Option<String> {
        lock(&self.state).domains.get(uuid).map(|d| d.xml.clone())
    }

    #[must_use]
    pub fn is_active(&self, uuid: &str) -> Option<bool> {
        lock(&self.state).domains.get(uuid).map(|d| d.active)
    }

    pub fn add_volume(&self, pool: &str, name: &str, path: &str, capacity_bytes: u64) {
        lock(&self.state).volumes.insert(
            (pool.to_string(), name.to_string()),
            (path.to_string(), capacity_bytes),
        );
    }

    /// Path and capacity of a volume.
    #[must_use]
    pub fn volume(&self, pool: &str, name: &str) -> Option<(String, u64)> {
        lock(&self.state)
            .volumes
            .get(&(pool.to_string(), name.to_string()))
            .cloned()
    }

    /// Lifecycle and configuration calls performed so far, as
    /// `operation:uuid`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    /// Number of connections ever opened with `mode`.
    #[must_use]
    pub fn opened(&self, mode: AccessMode) -> usize {
        let state = lock(&self.state);
        match mode {
            AccessMode::ReadOnly => state.opened_read_only,
            AccessMode::ReadWrite => state.opened_read_write,
        }
    }

    /// Number of connections not yet closed.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        lock(&self.state).open_now
    }

    #[must_use]
    pub fn faults(&self) -> &Faults {
        &self.faults
    }
}

impl HypervisorConnector for MockHypervisor {
    type Connection = MockConnection;

    fn uri(&self) -> &str {
        &self.uri
    }

    fn open(&self, mode: AccessMode) -> Result<MockConnection, BackendError> {
        self.faults.check(&self.uri, "open", None)?;
        let mut state = lock(&self.state);
        match mode {
            AccessMode::ReadOnly => state.opened_read_only += 1,
            AccessMode::ReadWrite => state.opened_read_write += 1,
        }
        state.open_now += 1;
        Ok(MockConnection {
            hypervisor: self.clone(),
            mode,
        })
    }
}

/// Connection to [`MockHypervisor`]. Closed on drop.
pub struct MockConnection {
    hypervisor: MockHypervisor,
    mode: AccessMode,
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        let mut state = lock(&self.hypervisor.state);
        state.open_now = state.open_now.saturating_sub(1);
    }
}

fn element_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = start + xml[start..].find(&close)?;
    Some(xml[start..end].trim())
}

impl MockConnection {
    fn error(&self, operation: &'static str, uuid: &str, message: &str) -> BackendError {
        BackendError::new(
            self.hypervisor.uri.as_str(),
            operation,
            BackendErrorKind::Protocol,
            message,
        )
        .with_identity(uuid)
    }

    fn check(&self, operation: &'static str, uuid: &str) -> Result<(), BackendError> {
        self.hypervisor
            .faults
            .check(&self.hypervisor.uri, operation, Some(uuid))
    }

    fn require_write(&self, operation: &'static str, uuid: &str) -> Result<(), BackendError> {
        if self.mode == AccessMode::ReadOnly {
            return Err(self.error(
                operation,
                uuid,
                "operation forbidden: read only access prevents this operation",
            ));
        }
        self.check(operation, uuid)
    }

    /// Apply `f` to an existing domain and log the call.
    fn with_domain<T>(
        &self,
        operation: &'static str,
        uuid: &str,
        f: impl FnOnce(&mut MockDomain) -> Result<T, &'static str>,
    ) -> Result<T, BackendError> {
        let mut state = lock(&self.hypervisor.state);
        let domain = state
            .domains
            .get_mut(uuid)
            .ok_or_else(|| self.error(operation, uuid, "domain not found"))?;
        let result = f(domain).map_err(|message| self.error(operation, uuid, message))?;
        state.calls.push(format!("{operation}:{uuid}"));
        Ok(result)
    }

    fn lifecycle(
        &self,
        operation: &'static str,
        uuid: &str,
        running: bool,
        active_after: bool,
    ) -> Result<(), BackendError> {
        self.require_write(operation, uuid)?;
        self.with_domain(operation, uuid, |domain| {
            if domain.active != running {
                return Err(if running {
                    "domain is not running"
                } else {
                    "domain is already running"
                });
            }
            domain.active = active_after;
            Ok(())
        })
    }
}

impl HypervisorConnection for MockConnection {
    fn list_domains(&self) -> Result<Vec<DomainRef>, BackendError> {
        self.hypervisor
            .faults
            .check(&self.hypervisor.uri, "list_domains", None)?;
        Ok(lock(&self.hypervisor.state)
            .domains
            .iter()
            .map(|(uuid, domain)| DomainRef {
                uuid: uuid.clone(),
                name: domain.name.clone(),
            })
            .collect())
    }

    fn lookup_by_uuid(&self, uuid: &str) -> Result<Option<DomainRef>, BackendError> {
        self.check("lookup_by_uuid", uuid)?;
        let state = lock(&self.hypervisor.state);
        Ok(state
            .domains
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(uuid))
            .map(|(key, domain)| DomainRef {
                uuid: key.clone(),
                name: domain.name.clone(),
            }))
    }

    fn lookup_by_name(&self, name: &str) -> Result<Option<DomainRef>, BackendError> {
        self.check("lookup_by_name", name)?;
        let state = lock(&self.hypervisor.state);
        Ok(state
            .domains
            .iter()
            .find(|(_, domain)| domain.name == name)
            .map(|(uuid, domain)| DomainRef {
                uuid: uuid.clone(),
                name: domain.name.clone(),
            }))
    }

    fn is_active(&self, uuid: &str) -> Result<bool, BackendError> {
        self.check("is_active", uuid)?;
        lock(&self.hypervisor.state)
            .domains
            .get(uuid)
            .map(|domain| domain.active)
            .ok_or_else(|| self.error("is_active", uuid, "domain not found"))
    }

    fn domain_xml(&self, uuid: &str) -> Result<String, BackendError> {
        self.check("domain_xml", uuid)?;
        lock(&self.hypervisor.state)
            .domains
            .get(uuid)
            .map(|domain| domain.xml.clone())
            .ok_or_else(|| self.error("domain_xml", uuid, "domain not found"))
    }

    fn define_xml(&self, xml: &str) -> Result<(), BackendError> {
        let uuid = element_text(xml, "uuid").unwrap_or_default().to_string();
        self.require_write("define_xml", &uuid)?;
        let name = element_text(xml, "name")
            .ok_or_else(|| self.error("define_xml", &uuid, "missing domain name"))?
            .to_string();
        let mut state = lock(&self.hypervisor.state);
        let active = state.domains.get(&uuid).is_some_and(|domain| domain.active);
        state.domains.insert(
            uuid.clone(),
            MockDomain {
                name,
                xml: xml.to_string(),
                active,
            },
        );
        state.calls.push(format!("define_xml:{uuid}"));
        Ok(())
    }

    fn create(&self, uuid: &str) -> Result<(), BackendError> {
        self.lifecycle("create", uuid, false, true)
    }

    fn destroy(&self, uuid: &str) -> Result<(), BackendError> {
        self.lifecycle("destroy", uuid, true, false)
    }

    fn shutdown(&self, uuid: &str) -> Result<(), BackendError> {
        self.lifecycle("shutdown", uuid, true, false)
    }

    fn reboot(&self, uuid: &str) -> Result<(), BackendError> {
        self.lifecycle("reboot", uuid, true, true)
    }

    fn reset(&self, uuid: &str) -> Result<(), BackendError> {
        self.lifecycle("reset", uuid, true, true)
    }

    fn inject_nmi(&self, uuid: &str) -> Result<(), BackendError> {
        self.lifecycle("inject_nmi", uuid, true, true)
    }

    fn lookup_volume(&self, pool: &str, name: &str) -> Result<Option<String>, BackendError> {
        self.check("lookup_volume", name)?;
        Ok(lock(&self.hypervisor.state)
            .volumes
            .get(&(pool.to_string(), name.to_string()))
            .map(|(path, _)| path.clone()))
    }

    fn create_volume(&self, pool: &str, name: &str, capacity_bytes: u64) -> Result<String, BackendError> {
        self.require_write("create_volume", name)?;
        let path = format!("/var/lib/libvirt/{pool}/{name}");
        let mut state = lock(&self.hypervisor.state);
        state.volumes.insert(
            (pool.to_string(), name.to_string()),
            (path.clone(), capacity_bytes),
        );
        state.calls.push(format!("create_volume:{pool}/{name}"));
        Ok(path)
    }

    fn volume_capacity(&self, path: &str) -> Result<Option<u64>, BackendError> {
        self.check("volume_capacity", path)?;
        Ok(lock(&self.hypervisor.state)
            .volumes
            .values()
            .find(|(volume_path, _)| volume_path == path)
            .map(|(_, capacity)| *capacity))
    }
}
