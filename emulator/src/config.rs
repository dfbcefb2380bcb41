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

//! Emulator configuration.
//!
//! Configuration is a TOML document. Every section has defaults, so an
//! empty document is valid and selects the fake driver with no systems.
//! A `[systems]` section must name its `driver`.
//!
//! ```toml
//! state_dir = "/var/lib/redfish-emulator"
//!
//! [systems]
//! driver = "libvirt"
//!
//! [systems.uefi_loaders]
//! x86_64 = "/usr/share/OVMF/OVMF_CODE.fd"
//!
//! [[chassis]]
//! id = "48295861-2522-3dc6-a6ad-ef3bbd6d7a2e"
//! name = "Chassis-1"
//!
//! [vmedia.devices.Cd]
//! name = "Virtual CD"
//! media_types = ["CD", "DVD"]
//! ```

use redfish_emulator_core::BootDevice;
use redfish_emulator_core::BootMode;
use redfish_emulator_core::IndicatorLed;
use redfish_emulator_core::Nic;
use redfish_emulator_core::PowerState;
use redfish_emulator_core::SimpleStorageMap;
use redfish_emulator_core::VolumeDescriptor;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::path::Path;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Io(path, err) => write!(f, "cannot read {}: {err}", path.display()),
            Self::Parse(err) => write!(f, "invalid configuration: {err}"),
            Self::Invalid(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(_, err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmulatorConfig {
    /// Directory holding pseudo-resource state files and downloaded
    /// images.
    pub state_dir: PathBuf,
    /// Keep pseudo-resource state on disk. When false every store is
    /// in-memory and state is lost on restart.
    pub persistent_state: bool,
    pub systems: SystemsConfig,
    pub chassis: Vec<ChassisConfig>,
    pub managers: Vec<ManagerConfig>,
    pub indicators: IndicatorsConfig,
    pub vmedia: VirtualMediaConfig,
    /// System identity to its storage controllers.
    pub storage: BTreeMap<String, Vec<StorageConfig>>,
    /// System identity to storage id to the volumes present at start.
    pub volumes: BTreeMap<String, BTreeMap<String, Vec<VolumeDescriptor>>>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("redfish-emulator-state"),
            persistent_state: true,
            systems: SystemsConfig::default(),
            chassis: Vec::new(),
            managers: Vec::new(),
            indicators: IndicatorsConfig::default(),
            vmedia: VirtualMediaConfig::default(),
            storage: BTreeMap::new(),
            volumes: BTreeMap::new(),
        }
    }
}

impl EmulatorConfig {
    /// Parse and validate configuration document.
    ///
    /// # Errors
    ///
    /// Returns error if the document is not valid TOML, has unknown keys
    /// or fails validation.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_toml_str(&content)
    }

    /// Directory virtual media images are downloaded to.
    #[must_use]
    pub fn image_dir(&self) -> PathBuf {
        self.vmedia
            .image_dir
            .clone()
            .unwrap_or_else(|| self.state_dir.join("images"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let SystemsConfig::Fake(fake) = &self.systems {
            fake.validate()?;
        }
        for chassis in &self.chassis {
            if chassis.id.is_empty() || chassis.name.is_empty() {
                return Err(ConfigError::Invalid(
                    "chassis requires non-empty id and name".into(),
                ));
            }
        }
        if self.vmedia.devices.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one virtual media device is required".into(),
            ));
        }
        Ok(())
    }
}

/// Active systems driver with its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum SystemsConfig {
    Fake(FakeConfig),
    Libvirt(LibvirtConfig),
    Nova(NovaConfig),
    Ironic(IronicConfig),
}

impl Default for SystemsConfig {
    fn default() -> Self {
        Self::Fake(FakeConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FakeConfig {
    pub systems: Vec<FakeSystemConfig>,
    /// Shortest delay of a power transition, in seconds.
    pub min_power_delay: u64,
    /// Longest delay of a power transition, in seconds.
    pub max_power_delay: u64,
    /// URL state change events are posted to.
    pub notifier_url: Option<String>,
}

impl Default for FakeConfig {
    fn default() -> Self {
        Self {
            systems: Vec::new(),
            min_power_delay: 1,
            max_power_delay: 11,
            notifier_url: None,
        }
    }
}

impl FakeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_power_delay > self.max_power_delay {
            return Err(ConfigError::Invalid(format!(
                "min_power_delay {} exceeds max_power_delay {}",
                self.min_power_delay, self.max_power_delay
            )));
        }
        let mut seen = BTreeSet::new();
        for system in &self.systems {
            let uuid = Uuid::parse_str(&system.uuid).map_err(|err| {
                ConfigError::Invalid(format!("system {}: bad uuid {}: {err}", system.name, system.uuid))
            })?;
            if !seen.insert(uuid) {
                return Err(ConfigError::Invalid(format!("duplicate system uuid {uuid}")));
            }
        }
        let names: BTreeSet<_> = self.systems.iter().map(|s| s.name.as_str()).collect();
        if names.len() != self.systems.len() {
            return Err(ConfigError::Invalid("duplicate system name".into()));
        }
        Ok(())
    }
}

/// System served by the fake driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FakeSystemConfig {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub short_id: Option<String>,
    #[serde(default = "default_power_state")]
    pub power_state: PowerState,
    #[serde(default)]
    pub nics: Vec<Nic>,
    #[serde(default = "default_boot_device")]
    pub boot_device: Option<BootDevice>,
    #[serde(default = "default_boot_mode")]
    pub boot_mode: Option<BootMode>,
    #[serde(default)]
    pub secure_boot: bool,
    #[serde(default)]
    pub http_boot_uri: Option<String>,
    #[serde(default)]
    pub total_memory_gib: Option<u64>,
    #[serde(default)]
    pub total_cpus: Option<u32>,
    #[serde(default)]
    pub simple_storage: SimpleStorageMap,
    /// Post state changes of this system to the notifier.
    #[serde(default)]
    pub external_notifier: bool,
}

const fn default_power_state() -> PowerState {
    PowerState::Off
}

#[allow(clippy::unnecessary_wraps)]
const fn default_boot_device() -> Option<BootDevice> {
    Some(BootDevice::Hdd)
}

#[allow(clippy::unnecessary_wraps)]
const fn default_boot_mode() -> Option<BootMode> {
    Some(BootMode::Uefi)
}

/// Firmware layout of the hypervisor driver. The hypervisor connection
/// itself is not configured here: the embedding application passes its
/// [`HypervisorConnector`](redfish_emulator_core::backend::HypervisorConnector)
/// to [`LibvirtDriver::new`](crate::systems::libvirt::LibvirtDriver::new),
/// and the connector names its own URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibvirtConfig {
    /// Architecture to UEFI firmware loader.
    pub uefi_loaders: BTreeMap<String, String>,
    /// Architecture to UEFI firmware loader with secure boot enabled.
    pub secure_boot_loaders: BTreeMap<String, String>,
    /// Architecture to NVRAM template used with a secure boot loader.
    pub nvram_templates: BTreeMap<String, String>,
}

impl Default for LibvirtConfig {
    fn default() -> Self {
        let map = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect()
        };
        Self {
            uefi_loaders: map(&[
                ("x86_64", "/usr/share/OVMF/OVMF_CODE.fd"),
                ("aarch64", "/usr/share/AAVMF/AAVMF_CODE.fd"),
            ]),
            secure_boot_loaders: map(&[("x86_64", "/usr/share/OVMF/OVMF_CODE.secboot.fd")]),
            nvram_templates: map(&[("x86_64", "/usr/share/OVMF/OVMF_VARS.ms.fd")]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NovaConfig {
    /// Compute API base URL.
    pub endpoint: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IronicConfig {
    /// Provisioning API base URL.
    pub endpoint: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChassisConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub uuid: Option<String>,
    /// Systems in the chassis. Empty means all systems.
    #[serde(default)]
    pub systems: Vec<String>,
    /// Managers in the chassis. Empty means all managers.
    #[serde(default)]
    pub managers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManagerConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub systems: Vec<String>,
    #[serde(default)]
    pub chassis: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorsConfig {
    /// State of an indicator never set.
    pub default_state: IndicatorLed,
    /// Initial states by identity.
    pub states: BTreeMap<String, IndicatorLed>,
}

impl Default for IndicatorsConfig {
    fn default() -> Self {
        Self {
            default_state: IndicatorLed::Lit,
            states: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VirtualMediaConfig {
    /// Download directory. Defaults to `images` under the state
    /// directory.
    pub image_dir: Option<PathBuf>,
    /// Device id to device.
    pub devices: BTreeMap<String, VirtualMediaDeviceConfig>,
}

impl Default for VirtualMediaConfig {
    fn default() -> Self {
        let device = |name: &str, media_types: &[&str]| VirtualMediaDeviceConfig {
            name: name.to_string(),
            media_types: media_types.iter().map(|t| (*t).to_string()).collect(),
        };
        Self {
            image_dir: None,
            devices: BTreeMap::from([
                ("Cd".to_string(), device("Virtual CD", &["CD", "DVD"])),
                (
                    "Floppy".to_string(),
                    device("Virtual Removable Media", &["Floppy", "USBStick"]),
                ),
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VirtualMediaDeviceConfig {
    pub name: String,
    pub media_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub drives: Vec<DriveConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriveConfig {
    pub id: String,
    pub name: String,
    pub capacity_bytes: u64,
    #[serde(default)]
    pub protocol: Option<String>,
}
