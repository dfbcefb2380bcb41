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

//! Driver serving systems declared in configuration.
//!
//! There is no live backend. System records (power, boot settings,
//! attached images) and BIOS attributes live in the state store and are
//! created from configuration on first access. Power changes go through
//! the pending transition simulator with a random delay, so clients see
//! the same eventual consistency a real BMC shows.

use crate::config::FakeConfig;
use crate::config::FakeSystemConfig;
use crate::state::StateCategory;
use crate::state::StateDir;
use crate::state::TypedStore;
use crate::systems::default_bios;
use crate::systems::require_system;
use rand::Rng;
use redfish_emulator_core::backend::NoNotifier;
use redfish_emulator_core::backend::Notifier;
use redfish_emulator_core::backend::StateChange;
use redfish_emulator_core::power;
use redfish_emulator_core::resolve_among;
use redfish_emulator_core::BiosAttributes;
use redfish_emulator_core::BootDevice;
use redfish_emulator_core::BootImage;
use redfish_emulator_core::BootMode;
use redfish_emulator_core::Clock;
use redfish_emulator_core::EntityKind;
use redfish_emulator_core::Error;
use redfish_emulator_core::Identifiable;
use redfish_emulator_core::Nic;
use redfish_emulator_core::PowerRecord;
use redfish_emulator_core::PowerState;
use redfish_emulator_core::ResetType;
use redfish_emulator_core::Resolution;
use redfish_emulator_core::SimpleStorageMap;
use redfish_emulator_core::SystemClock;
use redfish_emulator_core::SystemsDriver;
use redfish_emulator_core::VolumeDescriptor;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value as JsonValue;
use slog::info;
use slog::o;
use slog::warn;
use slog::Logger;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use time::Duration;

pub const DRIVER: &str = "fake";

impl Identifiable for FakeSystemConfig {
    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn short_id(&self) -> Option<&str> {
        self.short_id.as_deref()
    }
}

/// Mutable state of a fake system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SystemRecord {
    #[serde(flatten)]
    power: PowerRecord,
    boot_device: Option<BootDevice>,
    boot_mode: Option<BootMode>,
    secure_boot: bool,
    http_boot_uri: Option<String>,
    /// Boot device name to attached image.
    #[serde(default)]
    boot_images: BTreeMap<String, BootImage>,
}

impl SystemRecord {
    fn initial(system: &FakeSystemConfig) -> Self {
        Self {
            power: PowerRecord::steady(system.power_state),
            boot_device: system.boot_device,
            boot_mode: system.boot_mode,
            secure_boot: system.secure_boot,
            http_boot_uri: system.http_boot_uri.clone(),
            boot_images: BTreeMap::new(),
        }
    }
}

pub struct FakeDriver<N = NoNotifier, C = SystemClock> {
    log: Logger,
    systems: Vec<FakeSystemConfig>,
    records: TypedStore<String, SystemRecord>,
    bios: TypedStore<String, BiosAttributes>,
    power_delay: RangeInclusive<u64>,
    notifier: N,
    clock: C,
}

impl<N: Notifier, C: Clock> FakeDriver<N, C> {
    /// Driver over systems of `config`, keeping state in `state`. State
    /// changes of systems with `external_notifier` are posted to
    /// `notifier`.
    ///
    /// # Errors
    ///
    /// Returns error if the state stores cannot be opened.
    pub fn new(
        config: &FakeConfig,
        log: &Logger,
        state: &StateDir,
        notifier: N,
        clock: C,
    ) -> Result<Self, Error> {
        let max = config.max_power_delay;
        Ok(Self {
            log: log.new(o!("driver" => DRIVER)),
            systems: config.systems.clone(),
            records: TypedStore::new(state.open(StateCategory::Systems)?),
            bios: TypedStore::new(state.open(StateCategory::Bios)?),
            power_delay: config.min_power_delay.min(max)..=max,
            notifier,
            clock,
        })
    }

    fn system(&self, identity: &str) -> Result<&FakeSystemConfig, Error> {
        let uuid = require_system(&self.log, identity, resolve_among(identity, &self.systems))?;
        self.systems
            .iter()
            .find(|system| system.uuid == uuid)
            .ok_or_else(|| Error::not_found(EntityKind::System, identity))
    }

    /// Record of `system` with any due power transition applied.
    async fn record(&self, system: &FakeSystemConfig) -> Result<SystemRecord, Error> {
        let mut record = self
            .records
            .get_or_else(&system.uuid, || SystemRecord::initial(system))?;
        let (power, changed) = power::resolve(&record.power, self.clock.now());
        if changed {
            record.power = power;
            self.records.set(&system.uuid, &record)?;
            info!(self.log, "power transition applied";
                "uuid" => system.uuid.as_str(), "power_state" => %power.power_state);
            self.notify(system, json!({ "power_state": power.power_state }))
                .await;
        }
        Ok(record)
    }

    async fn update(
        &self,
        identity: &str,
        change: impl FnOnce(&mut SystemRecord) -> JsonValue,
    ) -> Result<(), Error> {
        let system = self.system(identity)?;
        let mut record = self.record(system).await?;
        let event = change(&mut record);
        self.records.set(&system.uuid, &record)?;
        info!(self.log, "system updated"; "uuid" => system.uuid.as_str(), "change" => %event);
        self.notify(system, event).await;
        Ok(())
    }

    /// Post state change of `system` if it asked for notifications.
    /// Failures are logged only.
    async fn notify(&self, system: &FakeSystemConfig, change: JsonValue) {
        if !system.external_notifier {
            return;
        }
        let event = StateChange {
            uuid: system.uuid.clone(),
            name: system.name.clone(),
            change,
        };
        if let Err(err) = self.notifier.notify(&event).await {
            warn!(self.log, "state change notification failed";
                "uuid" => system.uuid.as_str(), "error" => %err);
        }
    }

    fn random_delay(&self) -> Duration {
        let seconds = rand::thread_rng().gen_range(self.power_delay.clone());
        Duration::seconds(i64::try_from(seconds).unwrap_or(i64::MAX))
    }
}

impl<N: Notifier, C: Clock> SystemsDriver for FakeDriver<N, C> {
    fn driver_name(&self) -> &'static str {
        DRIVER
    }

    async fn systems(&self) -> Result<Vec<String>, Error> {
        Ok(self.systems.iter().map(|system| system.uuid.clone()).collect())
    }

    async fn resolve_uuid(&self, identity: &str) -> Result<Resolution, Error> {
        Ok(resolve_among(identity, &self.systems))
    }

    async fn resolve_name(&self, identity: &str) -> Result<String, Error> {
        Ok(self.system(identity)?.name.clone())
    }

    async fn get_power_state(&self, identity: &str) -> Result<PowerState, Error> {
        let system = self.system(identity)?;
        Ok(self.record(system).await?.power.power_state)
    }

    async fn set_power_state(&self, identity: &str, action: ResetType) -> Result<(), Error> {
        let system = self.system(identity)?;
        let mut record = self.record(system).await?;
        let delay = self.random_delay();
        let (power, changed) = power::request(&record.power, action, self.clock.now(), delay);
        if !changed {
            info!(self.log, "power action is a no-op";
                "uuid" => system.uuid.as_str(), "action" => %action);
            return Ok(());
        }
        record.power = power;
        self.records.set(&system.uuid, &record)?;
        info!(self.log, "power action scheduled";
            "uuid" => system.uuid.as_str(),
            "action" => %action,
            "delay" => delay.whole_seconds());
        self.notify(
            system,
            json!({
                "power_state": power.power_state,
                "pending_action": power.pending.map(|pending| pending.action),
            }),
        )
        .await;
        Ok(())
    }

    async fn get_boot_device(&self, identity: &str) -> Result<Option<BootDevice>, Error> {
        let system = self.system(identity)?;
        Ok(self.record(system).await?.boot_device)
    }

    async fn set_boot_device(&self, identity: &str, device: BootDevice) -> Result<(), Error> {
        self.update(identity, |record| {
            record.boot_device = Some(device);
            json!({ "boot_device": device })
        })
        .await
    }

    async fn get_boot_mode(&self, identity: &str) -> Result<Option<BootMode>, Error> {
        let system = self.system(identity)?;
        Ok(self.record(system).await?.boot_mode)
    }

    async fn set_boot_mode(&self, identity: &str, mode: BootMode) -> Result<(), Error> {
        self.update(identity, |record| {
            record.boot_mode = Some(mode);
            if mode == BootMode::Legacy {
                record.secure_boot = false;
            }
            json!({ "boot_mode": mode })
        })
        .await
    }

    async fn get_secure_boot(&self, identity: &str) -> Result<bool, Error> {
        let system = self.system(identity)?;
        Ok(self.record(system).await?.secure_boot)
    }

    async fn set_secure_boot(&self, identity: &str, enabled: bool) -> Result<(), Error> {
        let system = self.system(identity)?;
        if enabled && self.record(system).await?.boot_mode != Some(BootMode::Uefi) {
            return Err(Error::bad_request("secure boot requires UEFI boot mode"));
        }
        self.update(identity, |record| {
            record.secure_boot = enabled;
            json!({ "secure_boot": enabled })
        })
        .await
    }

    async fn get_http_boot_uri(&self, identity: &str) -> Result<Option<String>, Error> {
        let system = self.system(identity)?;
        Ok(self.record(system).await?.http_boot_uri)
    }

    async fn set_http_boot_uri(&self, identity: &str, uri: Option<&str>) -> Result<(), Error> {
        self.update(identity, |record| {
            record.http_boot_uri = uri.map(ToString::to_string);
            json!({ "http_boot_uri": uri })
        })
        .await
    }

    async fn get_total_memory_gib(&self, identity: &str) -> Result<Option<u64>, Error> {
        Ok(self.system(identity)?.total_memory_gib)
    }

    async fn get_total_cpu_count(&self, identity: &str) -> Result<Option<u32>, Error> {
        Ok(self.system(identity)?.total_cpus)
    }

    async fn get_bios(&self, identity: &str) -> Result<BiosAttributes, Error> {
        let system = self.system(identity)?;
        Ok(self.bios.get_or_else(&system.uuid, default_bios)?)
    }

    async fn set_bios(&self, identity: &str, attributes: &BiosAttributes) -> Result<(), Error> {
        let system = self.system(identity)?;
        let mut bios = self.bios.get_or_else(&system.uuid, default_bios)?;
        bios.extend(attributes.clone());
        self.bios.set(&system.uuid, &bios)?;
        info!(self.log, "bios attributes set";
            "uuid" => system.uuid.as_str(), "count" => attributes.len());
        Ok(())
    }

    async fn reset_bios(&self, identity: &str) -> Result<(), Error> {
        let system = self.system(identity)?;
        self.bios.set(&system.uuid, &default_bios())?;
        info!(self.log, "bios reset"; "uuid" => system.uuid.as_str());
        Ok(())
    }

    async fn get_nics(&self, identity: &str) -> Result<Vec<Nic>, Error> {
        Ok(self.system(identity)?.nics.clone())
    }

    async fn get_boot_image(&self, identity: &str, device: BootDevice) -> Result<BootImage, Error> {
        let system = self.system(identity)?;
        Ok(self
            .record(system)
            .await?
            .boot_images
            .remove(device.as_str())
            .unwrap_or_default())
    }

    async fn set_boot_image(
        &self,
        identity: &str,
        device: BootDevice,
        image: Option<&str>,
        write_protected: bool,
    ) -> Result<(), Error> {
        self.update(identity, |record| {
            let attached = BootImage {
                image: image.map(ToString::to_string),
                write_protected,
                inserted: image.is_some(),
            };
            record.boot_images.insert(device.as_str().to_string(), attached);
            json!({ "boot_image": { "device": device, "image": image } })
        })
        .await
    }

    async fn get_simple_storage(&self, identity: &str) -> Result<SimpleStorageMap, Error> {
        Ok(self.system(identity)?.simple_storage.clone())
    }

    async fn find_or_create_storage_volume(
        &self,
        descriptor: &VolumeDescriptor,
    ) -> Result<Option<String>, Error> {
        Ok(Some(descriptor.id.clone()))
    }
}
