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

//! Values exchanged through the driver contract.

use crate::Error;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::str::FromStr;

/// BIOS attribute name to value.
pub type BiosAttributes = BTreeMap<String, JsonValue>;

/// Boot source override target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BootDevice {
    Pxe,
    Hdd,
    Cd,
    Floppy,
}

impl BootDevice {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pxe => "Pxe",
            Self::Hdd => "Hdd",
            Self::Cd => "Cd",
            Self::Floppy => "Floppy",
        }
    }
}

impl Display for BootDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.as_str().fmt(f)
    }
}

impl FromStr for BootDevice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pxe" => Ok(Self::Pxe),
            "Hdd" => Ok(Self::Hdd),
            "Cd" => Ok(Self::Cd),
            "Floppy" => Ok(Self::Floppy),
            other => Err(Error::bad_request(format!("unknown boot device: {other}"))),
        }
    }
}

/// Firmware boot mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BootMode {
    Legacy,
    #[serde(rename = "UEFI")]
    Uefi,
}

impl Display for BootMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Legacy => "Legacy".fmt(f),
            Self::Uefi => "UEFI".fmt(f),
        }
    }
}

impl FromStr for BootMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Legacy" => Ok(Self::Legacy),
            "UEFI" => Ok(Self::Uefi),
            other => Err(Error::bad_request(format!("unknown boot mode: {other}"))),
        }
    }
}

/// Indicator LED state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorLed {
    Lit,
    Blinking,
    Off,
}

impl Display for IndicatorLed {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Lit => "Lit".fmt(f),
            Self::Blinking => "Blinking".fmt(f),
            Self::Off => "Off".fmt(f),
        }
    }
}

impl FromStr for IndicatorLed {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Lit" => Ok(Self::Lit),
            "Blinking" => Ok(Self::Blinking),
            "Off" => Ok(Self::Off),
            other => Err(Error::bad_request(format!("unknown indicator state: {other}"))),
        }
    }
}

/// Network interface of a system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nic {
    pub id: String,
    pub mac: String,
}

impl Nic {
    /// NIC identified by its MAC address.
    #[must_use]
    pub fn from_mac(mac: impl Into<String>) -> Self {
        let mac = mac.into();
        Self {
            id: mac.clone(),
            mac,
        }
    }
}

/// Image attached to a removable boot device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootImage {
    /// Local path or URL of the image, if any.
    pub image: Option<String>,
    pub write_protected: bool,
    pub inserted: bool,
}

/// Device attached to a simple storage controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageDevice {
    pub name: String,
    pub capacity_bytes: Option<u64>,
}

/// Simple storage controller with its devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimpleStorage {
    pub id: String,
    pub name: String,
    pub device_list: Vec<StorageDevice>,
}

/// Controller id to simple storage.
pub type SimpleStorageMap = BTreeMap<String, SimpleStorage>;

/// Storage volume requested by a Redfish client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VolumeDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub volume_type: Option<String>,
    pub capacity_bytes: u64,
    /// Hypervisor storage pool holding the volume.
    #[serde(default, rename = "libvirtPoolName")]
    pub pool_name: Option<String>,
    /// Volume name inside the hypervisor storage pool.
    #[serde(default, rename = "libvirtVolName")]
    pub volume_name: Option<String>,
}
