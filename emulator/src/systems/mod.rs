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

//! Systems drivers.
//!
//! One driver per backend, each implementing
//! [`SystemsDriver`](redfish_emulator_core::SystemsDriver):
//!
//! | Driver | Backend | Identity |
//! |--------|---------|----------|
//! | [`fake::FakeDriver`] | systems declared in configuration | UUID, name, short id |
//! | [`libvirt::LibvirtDriver`] | hypervisor connection | domain UUID or name |
//! | [`nova::NovaDriver`] | cloud compute API | server UUID or name |
//! | [`ironic::IronicDriver`] | bare-metal provisioning API | node UUID or name |

#[cfg(feature = "fake")]
pub mod fake;
#[cfg(feature = "ironic")]
pub mod ironic;
#[cfg(feature = "libvirt")]
pub mod libvirt;
#[cfg(feature = "nova")]
pub mod nova;

use redfish_emulator_core::identity::same_identity;
use redfish_emulator_core::BackendError;
use redfish_emulator_core::BiosAttributes;
use redfish_emulator_core::EntityKind;
use redfish_emulator_core::Error;
use redfish_emulator_core::Resolution;
use redfish_emulator_core::SystemsDriver;
use serde_json::Value as JsonValue;
use slog::debug;
use slog::warn;
use slog::Logger;

/// Resolved system: canonical UUID and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemRef {
    pub uuid: String,
    pub name: String,
}

impl SystemRef {
    /// Resolve `identity` with `driver`. Aliases resolve transparently.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown identities and driver
    /// errors otherwise.
    pub async fn resolve<S: SystemsDriver>(driver: &S, identity: &str) -> Result<Self, Error> {
        let uuid = driver
            .resolve_uuid(identity)
            .await?
            .require(EntityKind::System, identity)?;
        let name = driver.resolve_name(&uuid).await?;
        Ok(Self { uuid, name })
    }

    /// True if configuration key `key` names this system.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        same_identity(key, &self.uuid) || key == self.name
    }
}

/// BIOS attributes of a system that never had them set.
#[must_use]
pub fn default_bios() -> BiosAttributes {
    [
        ("BootMode", "Uefi"),
        ("EmbeddedSata", "Raid"),
        ("L2Cache", "10x256 KB"),
        ("NicBoot1", "NetworkBoot"),
        ("NumCores", "10"),
        ("ProcTurboMode", "Enabled"),
        ("QuietBoot", "true"),
        ("SecureBootStatus", "Enabled"),
        ("SerialNumber", "QPX12345"),
        ("SysPassword", ""),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), JsonValue::from(value)))
    .collect()
}

/// Canonical UUID of a resolved system, logging alias redirections.
pub(crate) fn require_system(
    log: &Logger,
    identity: &str,
    resolution: Resolution,
) -> Result<String, Error> {
    if let Resolution::Redirect(uuid) = &resolution {
        debug!(log, "alias redirection"; "identity" => identity, "uuid" => uuid.as_str());
    }
    resolution.require(EntityKind::System, identity)
}

pub(crate) fn backend_failure(log: &Logger, err: BackendError) -> Error {
    warn!(log, "backend failure";
        "endpoint" => err.endpoint.as_str(),
        "operation" => err.operation,
        "identity" => err.identity.as_deref().unwrap_or(""),
        "error" => %err.message
    );
    Error::Backend(err)
}

pub(crate) const fn mib_to_gib(mib: u64) -> u64 {
    mib / 1024
}
