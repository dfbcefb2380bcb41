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

//! Bare-metal provisioning driver.
//!
//! Nodes are identified by UUID and accept their name as alias. Power,
//! boot device and boot mode map onto the provisioning API. Node lookups
//! are memoized for the duration of one request.

use crate::config::IronicConfig;
use crate::systems::backend_failure;
use crate::systems::mib_to_gib;
use crate::systems::require_system;
use redfish_emulator_core::backend::BaremetalApi;
use redfish_emulator_core::backend::Node;
use redfish_emulator_core::backend::NodePowerTarget;
use redfish_emulator_core::BackendError;
use redfish_emulator_core::BiosAttributes;
use redfish_emulator_core::BootDevice;
use redfish_emulator_core::BootImage;
use redfish_emulator_core::BootMode;
use redfish_emulator_core::CacheScope;
use redfish_emulator_core::CallKey;
use redfish_emulator_core::EntityKind;
use redfish_emulator_core::Error;
use redfish_emulator_core::Memo;
use redfish_emulator_core::Nic;
use redfish_emulator_core::PowerState;
use redfish_emulator_core::ResetType;
use redfish_emulator_core::Resolution;
use redfish_emulator_core::SimpleStorageMap;
use redfish_emulator_core::SystemsDriver;
use redfish_emulator_core::VolumeDescriptor;
use slog::info;
use slog::o;
use slog::Logger;

pub const DRIVER: &str = "ironic";

const BOOT_DEVICES: [(&str, BootDevice); 4] = [
    ("pxe", BootDevice::Pxe),
    ("disk", BootDevice::Hdd),
    ("cdrom", BootDevice::Cd),
    ("floppy", BootDevice::Floppy),
];

const BOOT_MODES: [(&str, BootMode); 2] = [("uefi", BootMode::Uefi), ("bios", BootMode::Legacy)];

pub struct IronicDriver<B> {
    log: Logger,
    baremetal: B,
}

impl<B: BaremetalApi> IronicDriver<B> {
    pub fn new(config: &IronicConfig, log: &Logger, baremetal: B) -> Self {
        Self {
            log: log.new(o!("driver" => DRIVER, "endpoint" => config.endpoint.clone())),
            baremetal,
        }
    }

    fn backend<T>(&self, result: Result<T, BackendError>) -> Result<T, Error> {
        result.map_err(|err| backend_failure(&self.log, err))
    }

    async fn lookup(&self, memo: &Memo, identity: &str) -> Result<Option<Node>, Error> {
        let result = memo
            .get_or_try_insert_some(CacheScope::Session, CallKey::new("get_node", [identity]), || {
                self.baremetal.get_node(identity)
            })
            .await;
        Ok(self.backend(result)?.map(|node| (*node).clone()))
    }

    async fn node(&self, identity: &str) -> Result<Node, Error> {
        let found = self.lookup(&Memo::default(), identity).await?;
        let resolution = found.as_ref().map_or(Resolution::NotFound, |node| {
            Resolution::from_lookup(identity, node.uuid.clone())
        });
        require_system(&self.log, identity, resolution)?;
        found.ok_or_else(|| Error::not_found(EntityKind::System, identity))
    }

    async fn unsupported<T>(&self, identity: &str, operation: &'static str) -> Result<T, Error> {
        self.node(identity).await?;
        Err(Error::not_supported(DRIVER, operation))
    }
}

fn power_target(action: ResetType) -> Option<NodePowerTarget> {
    match action {
        ResetType::On | ResetType::ForceOn => Some(NodePowerTarget::PowerOn),
        ResetType::ForceOff => Some(NodePowerTarget::PowerOff),
        ResetType::GracefulShutdown => Some(NodePowerTarget::SoftPowerOff),
        ResetType::GracefulRestart => Some(NodePowerTarget::SoftRebooting),
        ResetType::ForceRestart => Some(NodePowerTarget::Rebooting),
        ResetType::Nmi => None,
    }
}

impl<B: BaremetalApi> SystemsDriver for IronicDriver<B> {
    fn driver_name(&self) -> &'static str {
        DRIVER
    }

    async fn systems(&self) -> Result<Vec<String>, Error> {
        let nodes = self.backend(self.baremetal.list_nodes().await)?;
        Ok(nodes.into_iter().map(|node| node.uuid).collect())
    }

    async fn resolve_uuid(&self, identity: &str) -> Result<Resolution, Error> {
        Ok(self
            .lookup(&Memo::default(), identity)
            .await?
            .map_or(Resolution::NotFound, |node| {
                Resolution::from_lookup(identity, node.uuid)
            }))
    }

    async fn resolve_name(&self, identity: &str) -> Result<String, Error> {
        let node = self.node(identity).await?;
        Ok(node.name.unwrap_or(node.uuid))
    }

    async fn get_power_state(&self, identity: &str) -> Result<PowerState, Error> {
        Ok(match self.node(identity).await?.power_state.as_deref() {
            Some("power on") => PowerState::On,
            Some("power off") => PowerState::Off,
            _ => PowerState::Unknown,
        })
    }

    async fn set_power_state(&self, identity: &str, action: ResetType) -> Result<(), Error> {
        let node = self.node(identity).await?;
        let target = power_target(action).ok_or(Error::not_supported(DRIVER, "set_power_state"))?;
        self.backend(self.baremetal.set_power_state(&node.uuid, target).await)?;
        info!(self.log, "power state requested";
            "uuid" => node.uuid.as_str(), "target" => target.as_str());
        Ok(())
    }

    async fn get_boot_device(&self, identity: &str) -> Result<Option<BootDevice>, Error> {
        let node = self.node(identity).await?;
        let native = self.backend(self.baremetal.get_boot_device(&node.uuid).await)?;
        Ok(native.and_then(|native| {
            BOOT_DEVICES
                .into_iter()
                .find(|(code, _)| *code == native)
                .map(|(_, device)| device)
        }))
    }

    async fn set_boot_device(&self, identity: &str, device: BootDevice) -> Result<(), Error> {
        let node = self.node(identity).await?;
        let (code, _) = BOOT_DEVICES
            .into_iter()
            .find(|(_, candidate)| *candidate == device)
            .ok_or(Error::not_supported(DRIVER, "set_boot_device"))?;
        self.backend(self.baremetal.set_boot_device(&node.uuid, code, true).await)?;
        info!(self.log, "boot device set"; "uuid" => node.uuid.as_str(), "device" => code);
        Ok(())
    }

    async fn get_boot_mode(&self, identity: &str) -> Result<Option<BootMode>, Error> {
        let node = self.node(identity).await?;
        Ok(node.boot_mode.and_then(|native| {
            BOOT_MODES
                .into_iter()
                .find(|(code, _)| *code == native)
                .map(|(_, mode)| mode)
        }))
    }

    async fn set_boot_mode(&self, identity: &str, mode: BootMode) -> Result<(), Error> {
        let node = self.node(identity).await?;
        let (code, _) = BOOT_MODES
            .into_iter()
            .find(|(_, candidate)| *candidate == mode)
            .ok_or(Error::not_supported(DRIVER, "set_boot_mode"))?;
        self.backend(self.baremetal.set_boot_mode(&node.uuid, code).await)?;
        info!(self.log, "boot mode set"; "uuid" => node.uuid.as_str(), "mode" => code);
        Ok(())
    }

    async fn get_secure_boot(&self, identity: &str) -> Result<bool, Error> {
        Ok(self.node(identity).await?.secure_boot.unwrap_or(false))
    }

    async fn set_secure_boot(&self, identity: &str, _enabled: bool) -> Result<(), Error> {
        self.unsupported(identity, "set_secure_boot").await
    }

    async fn get_total_memory_gib(&self, identity: &str) -> Result<Option<u64>, Error> {
        Ok(self.node(identity).await?.memory_mb.map(mib_to_gib))
    }

    async fn get_total_cpu_count(&self, identity: &str) -> Result<Option<u32>, Error> {
        Ok(self.node(identity).await?.cpus)
    }

    async fn get_bios(&self, identity: &str) -> Result<BiosAttributes, Error> {
        let node = self.node(identity).await?;
        self.backend(self.baremetal.get_bios_settings(&node.uuid).await)
    }

    async fn set_bios(&self, identity: &str, _attributes: &BiosAttributes) -> Result<(), Error> {
        self.unsupported(identity, "set_bios").await
    }

    async fn reset_bios(&self, identity: &str) -> Result<(), Error> {
        self.unsupported(identity, "reset_bios").await
    }

    async fn get_nics(&self, identity: &str) -> Result<Vec<Nic>, Error> {
        let node = self.node(identity).await?;
        let macs = self.backend(self.baremetal.list_port_macs(&node.uuid).await)?;
        Ok(macs.into_iter().map(Nic::from_mac).collect())
    }

    async fn get_boot_image(&self, identity: &str, _device: BootDevice) -> Result<BootImage, Error> {
        self.unsupported(identity, "get_boot_image").await
    }

    async fn set_boot_image(
        &self,
        identity: &str,
        _device: BootDevice,
        _image: Option<&str>,
        _write_protected: bool,
    ) -> Result<(), Error> {
        self.unsupported(identity, "set_boot_image").await
    }

    async fn get_simple_storage(&self, identity: &str) -> Result<SimpleStorageMap, Error> {
        self.unsupported(identity, "get_simple_storage").await
    }

    async fn find_or_create_storage_volume(
        &self,
        _descriptor: &VolumeDescriptor,
    ) -> Result<Option<String>, Error> {
        Err(Error::not_supported(DRIVER, "find_or_create_storage_volume"))
    }
}
