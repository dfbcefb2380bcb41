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

//! Resources served to the endpoint layer.
//!
//! [`Resources`] bundles the single active systems driver with the
//! drivers of resources kept by the emulator itself (chassis, managers,
//! indicators, virtual media, storage, volumes). Helpers here combine
//! them the way Redfish endpoints need: resolve the system first, then
//! act on the pseudo-resource and on the backend.

pub mod chassis;
pub mod indicators;
pub mod managers;
pub mod storage;
pub mod vmedia;
pub mod volumes;

use crate::config::EmulatorConfig;
use crate::state::StateDir;
use crate::systems::require_system;
use crate::systems::SystemRef;
use chassis::StaticChassis;
use indicators::StaticIndicators;
use managers::StaticManagers;
use redfish_emulator_core::backend::ImageFetcher;
use redfish_emulator_core::BootDevice;
use redfish_emulator_core::Error;
use redfish_emulator_core::Identifiable;
use redfish_emulator_core::IndicatorLed;
use redfish_emulator_core::ResetType;
use redfish_emulator_core::SystemsDriver;
use redfish_emulator_core::VolumeDescriptor;
use slog::debug;
use slog::info;
use slog::o;
use slog::Logger;
use storage::StaticStorage;
use vmedia::InsertMedia;
use vmedia::MediaRecord;
use vmedia::StaticVirtualMedia;
use volumes::StaticVolumes;

pub struct Resources<S, F> {
    log: Logger,
    systems: S,
    chassis: StaticChassis,
    managers: StaticManagers,
    indicators: StaticIndicators,
    vmedia: StaticVirtualMedia<F>,
    storage: StaticStorage,
    volumes: StaticVolumes,
}

impl<S: SystemsDriver, F: ImageFetcher> Resources<S, F> {
    /// Bundle `systems` with resource drivers built from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if a state store cannot be opened.
    pub fn new(
        config: &EmulatorConfig,
        log: &Logger,
        state: &StateDir,
        systems: S,
        fetcher: F,
    ) -> Result<Self, Error> {
        let chassis = StaticChassis::new(&config.chassis);
        let managers = StaticManagers::new(&config.managers, chassis.chassis());
        Ok(Self {
            log: log.new(o!("systems_driver" => systems.driver_name())),
            indicators: StaticIndicators::new(&config.indicators, log, state)?,
            vmedia: StaticVirtualMedia::new(&config.vmedia, config.image_dir(), log, state, fetcher)?,
            storage: StaticStorage::new(&config.storage),
            volumes: StaticVolumes::new(&config.volumes, log, state)?,
            systems,
            chassis,
            managers,
        })
    }

    /// The active systems driver.
    pub const fn systems(&self) -> &S {
        &self.systems
    }

    pub const fn chassis(&self) -> &StaticChassis {
        &self.chassis
    }

    pub const fn managers(&self) -> &StaticManagers {
        &self.managers
    }

    pub const fn indicators(&self) -> &StaticIndicators {
        &self.indicators
    }

    pub const fn vmedia(&self) -> &StaticVirtualMedia<F> {
        &self.vmedia
    }

    pub const fn storage(&self) -> &StaticStorage {
        &self.storage
    }

    pub const fn volumes(&self) -> &StaticVolumes {
        &self.volumes
    }

    /// Canonical UUID of a system. Aliases resolve transparently.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown identities.
    pub async fn system_uuid(&self, identity: &str) -> Result<String, Error> {
        let resolution = self.systems.resolve_uuid(identity).await?;
        require_system(&self.log, identity, resolution)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown identities.
    pub async fn system(&self, identity: &str) -> Result<SystemRef, Error> {
        SystemRef::resolve(&self.systems, identity).await
    }

    /// Perform reset action given by its Redfish token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadRequest`] for unknown tokens, and errors of the
    /// driver.
    pub async fn reset_system(&self, identity: &str, reset_type: &str) -> Result<(), Error> {
        let action: ResetType = reset_type.parse()?;
        let uuid = self.system_uuid(identity).await?;
        self.systems.set_power_state(&uuid, action).await
    }

    /// Insert media and attach the downloaded image to the system when the
    /// driver supports it.
    ///
    /// # Errors
    ///
    /// Returns errors of the media driver and of the systems driver other
    /// than [`Error::NotSupported`].
    pub async fn insert_media(
        &self,
        identity: &str,
        device: &str,
        request: InsertMedia,
    ) -> Result<MediaRecord, Error> {
        let uuid = self.system_uuid(identity).await?;
        let record = self.vmedia.insert(&uuid, device, request).await?;
        if let Some(boot_device) = boot_device(device) {
            let image = record
                .image_path
                .as_ref()
                .map(|path| path.to_string_lossy().into_owned());
            let attached = self
                .systems
                .set_boot_image(&uuid, boot_device, image.as_deref(), record.write_protected)
                .await;
            if let Err(err) = self.tolerate_unsupported(attached) {
                self.vmedia.eject(&uuid, device)?;
                return Err(err);
            }
        }
        Ok(record)
    }

    /// Eject media and detach the image from the system.
    ///
    /// # Errors
    ///
    /// Returns errors of the media driver and of the systems driver other
    /// than [`Error::NotSupported`].
    pub async fn eject_media(&self, identity: &str, device: &str) -> Result<(), Error> {
        let uuid = self.system_uuid(identity).await?;
        self.vmedia.eject(&uuid, device)?;
        if let Some(boot_device) = boot_device(device) {
            let detached = self
                .systems
                .set_boot_image(&uuid, boot_device, None, false)
                .await;
            self.tolerate_unsupported(detached)?;
        }
        Ok(())
    }

    fn tolerate_unsupported(&self, result: Result<(), Error>) -> Result<(), Error> {
        match result {
            Err(Error::NotSupported { driver, operation }) => {
                debug!(self.log, "media kept by emulator only";
                    "driver" => driver, "operation" => operation);
                Ok(())
            }
            other => other,
        }
    }

    /// Create a volume in `storage_id` of a system, on the backend first.
    /// A taken volume id is rejected before the backend is touched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadRequest`] if the descriptor names no backend
    /// volume and [`Error::Conflict`] if the volume id is taken.
    pub async fn create_volume(
        &self,
        identity: &str,
        storage_id: &str,
        descriptor: VolumeDescriptor,
    ) -> Result<String, Error> {
        let system = self.system(identity).await?;
        if self
            .volumes
            .list(&system, storage_id)?
            .iter()
            .any(|volume| volume.id == descriptor.id)
        {
            return Err(Error::Conflict(format!(
                "volume {} already exists",
                descriptor.id
            )));
        }
        let Some(volume_id) = self
            .systems
            .find_or_create_storage_volume(&descriptor)
            .await?
        else {
            return Err(Error::bad_request(format!(
                "volume {} names no backend volume",
                descriptor.id
            )));
        };
        self.volumes.add(&system, storage_id, descriptor)?;
        info!(self.log, "volume created";
            "system" => system.uuid.as_str(), "volume" => volume_id.as_str());
        Ok(volume_id)
    }

    /// Canonical UUID and name of the system or chassis behind `identity`.
    async fn indicator_owner(&self, identity: &str) -> Result<(String, String), Error> {
        match self.system(identity).await {
            Ok(system) => Ok((system.uuid, system.name)),
            Err(err) if err.is_not_found() => {
                let chassis = self.chassis.get(identity)?;
                Ok((chassis.uuid().to_string(), chassis.name.clone()))
            }
            Err(err) => Err(err),
        }
    }

    /// Indicator LED of a system or chassis. Aliases share one state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown identities.
    pub async fn indicator(&self, identity: &str) -> Result<IndicatorLed, Error> {
        let (uuid, name) = self.indicator_owner(identity).await?;
        self.indicators.get(&uuid, &[identity, &name])
    }

    /// Set the indicator LED of a system or chassis from its Redfish token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown identities and
    /// [`Error::BadRequest`] for unknown tokens.
    pub async fn set_indicator(&self, identity: &str, token: &str) -> Result<(), Error> {
        let (uuid, _) = self.indicator_owner(identity).await?;
        self.indicators.set_token(&uuid, token)
    }

    /// Systems in chassis `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown chassis and driver errors.
    pub async fn chassis_systems(&self, identity: &str) -> Result<Vec<String>, Error> {
        let chassis = self.chassis.get(identity)?;
        if chassis.systems.is_empty() {
            return self.systems.systems().await;
        }
        let mut contained = Vec::new();
        for member in &chassis.systems {
            match self.system_uuid(member).await {
                Ok(uuid) => contained.push(uuid),
                Err(err) if err.is_not_found() => {
                    debug!(self.log, "chassis member is not a system"; "member" => member.as_str());
                }
                Err(err) => return Err(err),
            }
        }
        Ok(contained)
    }
}

/// Boot device a virtual media device attaches as.
fn boot_device(device: &str) -> Option<BootDevice> {
    match device.parse::<BootDevice>() {
        Ok(device @ (BootDevice::Cd | BootDevice::Floppy)) => Some(device),
        _ => None,
    }
}
