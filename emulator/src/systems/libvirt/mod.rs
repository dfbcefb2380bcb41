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

//! Hypervisor driver.
//!
//! Domains are addressed by UUID or name. Each operation opens a fresh
//! connection through the [`HypervisorConnector`]: read-only for queries,
//! read-write for changes. Configuration changes go through
//! [`domain::process`] and the domain is redefined only if the document
//! changed.

pub mod domain;
pub mod xml;

use crate::config::LibvirtConfig;
use crate::systems::backend_failure;
use crate::systems::default_bios;
use crate::systems::require_system;
use domain::ChangeSummary;
use domain::DomainChange;
use domain::DomainError;
use domain::Loaders;
use redfish_emulator_core::backend::AccessMode;
use redfish_emulator_core::backend::DomainRef;
use redfish_emulator_core::backend::HypervisorConnection;
use redfish_emulator_core::backend::HypervisorConnector;
use redfish_emulator_core::identity::is_uuid;
use redfish_emulator_core::BackendError;
use redfish_emulator_core::BackendErrorKind;
use redfish_emulator_core::BiosAttributes;
use redfish_emulator_core::BootDevice;
use redfish_emulator_core::BootImage;
use redfish_emulator_core::BootMode;
use redfish_emulator_core::EntityKind;
use redfish_emulator_core::Error;
use redfish_emulator_core::Nic;
use redfish_emulator_core::PowerState;
use redfish_emulator_core::ResetType;
use redfish_emulator_core::Resolution;
use redfish_emulator_core::SimpleStorage;
use redfish_emulator_core::SimpleStorageMap;
use redfish_emulator_core::StorageDevice;
use redfish_emulator_core::SystemsDriver;
use redfish_emulator_core::VolumeDescriptor;
use slog::debug;
use slog::info;
use slog::o;
use slog::warn;
use slog::Logger;
use xml::Element;

pub const DRIVER: &str = "libvirt";

pub struct LibvirtDriver<H> {
    log: Logger,
    connector: H,
    loaders: Loaders,
}

impl<H: HypervisorConnector> LibvirtDriver<H> {
    pub fn new(config: &LibvirtConfig, log: &Logger, connector: H) -> Self {
        Self {
            log: log.new(o!("driver" => DRIVER, "uri" => connector.uri().to_string())),
            loaders: Loaders::from(config),
            connector,
        }
    }

    fn backend<T>(&self, result: Result<T, BackendError>) -> Result<T, Error> {
        result.map_err(|err| backend_failure(&self.log, err))
    }

    fn open(&self, mode: AccessMode) -> Result<H::Connection, Error> {
        self.backend(self.connector.open(mode))
    }

    fn lookup(conn: &H::Connection, identity: &str) -> Result<Option<DomainRef>, BackendError> {
        if is_uuid(identity) {
            if let Some(found) = conn.lookup_by_uuid(identity)? {
                return Ok(Some(found));
            }
        }
        conn.lookup_by_name(identity)
    }

    /// Open a connection and resolve `identity` on it.
    fn domain(&self, mode: AccessMode, identity: &str) -> Result<(H::Connection, DomainRef), Error> {
        let conn = self.open(mode)?;
        let resolution = match self.backend(Self::lookup(&conn, identity))? {
            Some(found) => Resolution::from_lookup(identity, found.uuid),
            None => Resolution::NotFound,
        };
        let uuid = require_system(&self.log, identity, resolution)?;
        let found = self
            .backend(conn.lookup_by_uuid(&uuid))?
            .ok_or_else(|| Error::not_found(EntityKind::System, identity))?;
        Ok((conn, found))
    }

    fn tree(&self, conn: &H::Connection, uuid: &str) -> Result<Element, Error> {
        let document = self.backend(conn.domain_xml(uuid))?;
        Element::parse(&document).map_err(|err| {
            backend_failure(
                &self.log,
                BackendError::new(
                    self.connector.uri(),
                    "domain_xml",
                    BackendErrorKind::Protocol,
                    err.to_string(),
                )
                .with_identity(uuid),
            )
        })
    }

    fn read(&self, identity: &str) -> Result<Element, Error> {
        let (conn, found) = self.domain(AccessMode::ReadOnly, identity)?;
        self.tree(&conn, &found.uuid)
    }

    fn domain_error(&self, operation: &'static str, uuid: &str, err: DomainError) -> Error {
        match err {
            DomainError::NoLoader { .. } | DomainError::UnsupportedDevice(_) => {
                warn!(self.log, "domain change not supported"; "uuid" => uuid, "reason" => %err);
                Error::not_supported(DRIVER, operation)
            }
            DomainError::RequiresUefi => Error::bad_request(err.to_string()),
            DomainError::MissingElement(_) => backend_failure(
                &self.log,
                BackendError::new(
                    self.connector.uri(),
                    operation,
                    BackendErrorKind::Protocol,
                    err.to_string(),
                )
                .with_identity(uuid),
            ),
        }
    }

    /// Process the domain configuration with `change` and redefine the
    /// domain if it changed.
    fn apply(
        &self,
        operation: &'static str,
        identity: &str,
        change: &DomainChange,
    ) -> Result<ChangeSummary, Error> {
        let (conn, found) = self.domain(AccessMode::ReadWrite, identity)?;
        let tree = self.tree(&conn, &found.uuid)?;
        let (next, summary) = domain::process(&tree, change, &self.loaders)
            .map_err(|err| self.domain_error(operation, &found.uuid, err))?;
        if summary.changed {
            self.backend(conn.define_xml(&next.to_xml()))?;
            info!(self.log, "domain redefined"; "uuid" => &found.uuid, "change" => &summary.description);
        } else {
            debug!(self.log, "domain unchanged"; "uuid" => &found.uuid, "change" => &summary.description);
        }
        Ok(summary)
    }
}

impl<H: HypervisorConnector> SystemsDriver for LibvirtDriver<H> {
    fn driver_name(&self) -> &'static str {
        DRIVER
    }

    async fn systems(&self) -> Result<Vec<String>, Error> {
        let conn = self.open(AccessMode::ReadOnly)?;
        let domains = self.backend(conn.list_domains())?;
        Ok(domains.into_iter().map(|domain| domain.uuid).collect())
    }

    async fn resolve_uuid(&self, identity: &str) -> Result<Resolution, Error> {
        let conn = self.open(AccessMode::ReadOnly)?;
        Ok(match self.backend(Self::lookup(&conn, identity))? {
            Some(found) => Resolution::from_lookup(identity, found.uuid),
            None => Resolution::NotFound,
        })
    }

    async fn resolve_name(&self, identity: &str) -> Result<String, Error> {
        let (_, found) = self.domain(AccessMode::ReadOnly, identity)?;
        Ok(found.name)
    }

    async fn get_power_state(&self, identity: &str) -> Result<PowerState, Error> {
        let (conn, found) = self.domain(AccessMode::ReadOnly, identity)?;
        Ok(if self.backend(conn.is_active(&found.uuid))? {
            PowerState::On
        } else {
            PowerState::Off
        })
    }

    async fn set_power_state(&self, identity: &str, action: ResetType) -> Result<(), Error> {
        let (conn, found) = self.domain(AccessMode::ReadWrite, identity)?;
        let uuid = found.uuid.as_str();
        let active = self.backend(conn.is_active(uuid))?;
        let result = match (action, active) {
            (ResetType::On | ResetType::ForceOn, false)
            | (ResetType::GracefulRestart | ResetType::ForceRestart, false) => conn.create(uuid),
            (ResetType::ForceOff, true) => conn.destroy(uuid),
            (ResetType::GracefulShutdown, true) => conn.shutdown(uuid),
            (ResetType::GracefulRestart, true) => conn.reboot(uuid),
            (ResetType::ForceRestart, true) => conn.reset(uuid),
            (ResetType::Nmi, true) => conn.inject_nmi(uuid),
            _ => {
                debug!(self.log, "power action is a no-op"; "uuid" => uuid, "action" => %action);
                return Ok(());
            }
        };
        self.backend(result)?;
        info!(self.log, "power action"; "uuid" => uuid, "action" => %action);
        Ok(())
    }

    async fn get_boot_device(&self, identity: &str) -> Result<Option<BootDevice>, Error> {
        Ok(domain::boot_device(&self.read(identity)?))
    }

    async fn set_boot_device(&self, identity: &str, device: BootDevice) -> Result<(), Error> {
        self.apply("set_boot_device", identity, &DomainChange::BootDevice(device))
            .map(|_| ())
    }

    async fn get_boot_mode(&self, identity: &str) -> Result<Option<BootMode>, Error> {
        Ok(domain::boot_mode(&self.read(identity)?))
    }

    async fn set_boot_mode(&self, identity: &str, mode: BootMode) -> Result<(), Error> {
        self.apply("set_boot_mode", identity, &DomainChange::BootMode(mode))
            .map(|_| ())
    }

    async fn get_secure_boot(&self, identity: &str) -> Result<bool, Error> {
        Ok(domain::secure_boot(&self.read(identity)?))
    }

    async fn set_secure_boot(&self, identity: &str, enabled: bool) -> Result<(), Error> {
        self.apply("set_secure_boot", identity, &DomainChange::SecureBoot(enabled))
            .map(|_| ())
    }

    async fn get_total_memory_gib(&self, identity: &str) -> Result<Option<u64>, Error> {
        Ok(domain::memory_gib(&self.read(identity)?))
    }

    async fn get_total_cpu_count(&self, identity: &str) -> Result<Option<u32>, Error> {
        Ok(domain::vcpus(&self.read(identity)?))
    }

    async fn get_bios(&self, identity: &str) -> Result<BiosAttributes, Error> {
        Ok(domain::bios(&self.read(identity)?).unwrap_or_else(default_bios))
    }

    async fn set_bios(&self, identity: &str, attributes: &BiosAttributes) -> Result<(), Error> {
        self.apply(
            "set_bios",
            identity,
            &DomainChange::UpdateBios(attributes.clone()),
        )
        .map(|_| ())
    }

    async fn reset_bios(&self, identity: &str) -> Result<(), Error> {
        self.apply("reset_bios", identity, &DomainChange::ResetBios)
            .map(|_| ())
    }

    async fn get_nics(&self, identity: &str) -> Result<Vec<Nic>, Error> {
        Ok(domain::nics(&self.read(identity)?))
    }

    async fn get_boot_image(&self, identity: &str, device: BootDevice) -> Result<BootImage, Error> {
        Ok(domain::boot_image(&self.read(identity)?, device))
    }

    async fn set_boot_image(
        &self,
        identity: &str,
        device: BootDevice,
        image: Option<&str>,
        write_protected: bool,
    ) -> Result<(), Error> {
        let change = match image {
            Some(image) => DomainChange::AttachMedia {
                device,
                image: image.to_string(),
                write_protected,
            },
            None => DomainChange::DetachMedia(device),
        };
        self.apply("set_boot_image", identity, &change).map(|_| ())
    }

    async fn get_simple_storage(&self, identity: &str) -> Result<SimpleStorageMap, Error> {
        let (conn, found) = self.domain(AccessMode::ReadOnly, identity)?;
        let tree = self.tree(&conn, &found.uuid)?;
        let mut storage = SimpleStorageMap::new();
        for disk in domain::disks(&tree) {
            let capacity_bytes = match &disk.source {
                Some(path) => self.backend(conn.volume_capacity(path))?,
                None => None,
            };
            storage
                .entry(disk.bus.clone())
                .or_insert_with(|| SimpleStorage {
                    id: disk.bus.clone(),
                    name: format!("{} Controller", disk.bus),
                    device_list: Vec::new(),
                })
                .device_list
                .push(StorageDevice {
                    name: disk.source.unwrap_or(disk.target),
                    capacity_bytes,
                });
        }
        Ok(storage)
    }

    async fn find_or_create_storage_volume(
        &self,
        descriptor: &VolumeDescriptor,
    ) -> Result<Option<String>, Error> {
        let (Some(pool), Some(name)) = (&descriptor.pool_name, &descriptor.volume_name) else {
            return Ok(None);
        };
        let existing = {
            let conn = self.open(AccessMode::ReadOnly)?;
            self.backend(conn.lookup_volume(pool, name))?
        };
        if existing.is_none() {
            let conn = self.open(AccessMode::ReadWrite)?;
            let path = self.backend(conn.create_volume(pool, name, descriptor.capacity_bytes))?;
            info!(self.log, "volume created"; "pool" => pool.as_str(), "path" => path);
        }
        Ok(Some(descriptor.id.clone()))
    }
}
