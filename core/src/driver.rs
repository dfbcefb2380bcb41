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

//! Systems driver contract
//!
//! This module defines the backend-agnostic [`SystemsDriver`] trait: the
//! capability set every backend (hypervisor, cloud compute, bare-metal
//! provisioning, static fake) implements so the same Redfish resource and
//! action logic works over all of them.
//!
//! Contract rules:
//! - Every operation taking an `identity` accepts any valid identifier of
//!   the system (canonical UUID, name, short id) and fails with
//!   [`Error::NotFound`] for an unknown one. Backend-native failures are
//!   never leaked: they are wrapped into [`Error::Backend`].
//! - Mandatory operations that the backend genuinely cannot perform fail
//!   with [`Error::NotSupported`]; they never silently do nothing.
//! - Optional operations have default implementations here. Reading boot
//!   mode defaults to "unknown" (`Ok(None)`), everything else defaults to
//!   [`Error::NotSupported`].
//! - Reads of values the backend reports in a form the emulator cannot
//!   map return `None` rather than an error; errors are reserved for
//!   request-side problems and backend failures.
//!
//! Notes for implementors:
//! - The trait is `Send + Sync` and returns `Send` futures so a driver can
//!   be shared by request handlers running on a multithreaded runtime.
//! - A driver does not share mutable state with drivers of other backend
//!   connections. Caches are per instance, except an explicitly injected
//!   [`crate::PermanentCache`].

use crate::BiosAttributes;
use crate::BootDevice;
use crate::BootImage;
use crate::BootMode;
use crate::Error;
use crate::Nic;
use crate::PowerState;
use crate::ResetType;
use crate::Resolution;
use crate::SimpleStorageMap;
use crate::VolumeDescriptor;
use std::future::ready;
use std::future::Future;

/// Backend driver of Redfish systems.
#[allow(clippy::missing_errors_doc)]
pub trait SystemsDriver: Send + Sync {
    /// Short driver name used in errors and logs.
    fn driver_name(&self) -> &'static str;

    /// Canonical UUIDs of all systems.
    fn systems(&self) -> impl Future<Output = Result<Vec<String>, Error>> + Send;

    /// Resolve any identifier of a system to its canonical UUID.
    ///
    /// Unknown identities resolve to [`Resolution::NotFound`]; errors are
    /// reserved for backend failures.
    fn resolve_uuid(&self, identity: &str)
        -> impl Future<Output = Result<Resolution, Error>> + Send;

    /// Human readable name of the system.
    fn resolve_name(&self, identity: &str) -> impl Future<Output = Result<String, Error>> + Send;

    fn get_power_state(&self, identity: &str)
        -> impl Future<Output = Result<PowerState, Error>> + Send;

    fn set_power_state(
        &self,
        identity: &str,
        action: ResetType,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Current boot source override. `None` if not set or not mappable.
    fn get_boot_device(
        &self,
        identity: &str,
    ) -> impl Future<Output = Result<Option<BootDevice>, Error>> + Send;

    fn set_boot_device(
        &self,
        identity: &str,
        device: BootDevice,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn get_boot_mode(
        &self,
        identity: &str,
    ) -> impl Future<Output = Result<Option<BootMode>, Error>> + Send {
        let _ = identity;
        ready(Ok(None))
    }

    fn set_boot_mode(
        &self,
        identity: &str,
        mode: BootMode,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        let _ = (identity, mode);
        ready(Err(Error::not_supported(self.driver_name(), "set_boot_mode")))
    }

    fn get_secure_boot(&self, identity: &str) -> impl Future<Output = Result<bool, Error>> + Send {
        let _ = identity;
        ready(Err(Error::not_supported(
            self.driver_name(),
            "get_secure_boot",
        )))
    }

    fn set_secure_boot(
        &self,
        identity: &str,
        enabled: bool,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        let _ = (identity, enabled);
        ready(Err(Error::not_supported(
            self.driver_name(),
            "set_secure_boot",
        )))
    }

    /// URI used for UEFI HTTP boot.
    fn get_http_boot_uri(
        &self,
        identity: &str,
    ) -> impl Future<Output = Result<Option<String>, Error>> + Send {
        let _ = identity;
        ready(Err(Error::not_supported(
            self.driver_name(),
            "get_http_boot_uri",
        )))
    }

    fn set_http_boot_uri(
        &self,
        identity: &str,
        uri: Option<&str>,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        let _ = (identity, uri);
        ready(Err(Error::not_supported(
            self.driver_name(),
            "set_http_boot_uri",
        )))
    }

    fn get_total_memory_gib(
        &self,
        identity: &str,
    ) -> impl Future<Output = Result<Option<u64>, Error>> + Send;

    fn get_total_cpu_count(
        &self,
        identity: &str,
    ) -> impl Future<Output = Result<Option<u32>, Error>> + Send;

    fn get_bios(&self, identity: &str)
        -> impl Future<Output = Result<BiosAttributes, Error>> + Send;

    /// Merge `attributes` over the current BIOS attributes.
    fn set_bios(
        &self,
        identity: &str,
        attributes: &BiosAttributes,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Restore default BIOS attributes.
    fn reset_bios(&self, identity: &str) -> impl Future<Output = Result<(), Error>> + Send;

    fn get_nics(&self, identity: &str) -> impl Future<Output = Result<Vec<Nic>, Error>> + Send;

    fn get_boot_image(
        &self,
        identity: &str,
        device: BootDevice,
    ) -> impl Future<Output = Result<BootImage, Error>> + Send;

    /// Attach (`Some`) or detach (`None`) image to a removable device.
    fn set_boot_image(
        &self,
        identity: &str,
        device: BootDevice,
        image: Option<&str>,
        write_protected: bool,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn get_simple_storage(
        &self,
        identity: &str,
    ) -> impl Future<Output = Result<SimpleStorageMap, Error>> + Send;

    /// Make sure the backend has a volume matching `descriptor`. Returns
    /// identifier of the volume or `None` if the descriptor does not name
    /// a backend volume.
    fn find_or_create_storage_volume(
        &self,
        descriptor: &VolumeDescriptor,
    ) -> impl Future<Output = Result<Option<String>, Error>> + Send;
}
