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

//! Every mandatory driver operation rejects unknown identities the same
//! way, whatever the backend.

use redfish_emulator::StateDir;
use redfish_emulator_backend_mock::ManualClock;
use redfish_emulator_backend_mock::RecordingNotifier;
use redfish_emulator_core::BiosAttributes;
use redfish_emulator_core::BootDevice;
use redfish_emulator_core::EntityKind;
use redfish_emulator_core::Error;
use redfish_emulator_core::ResetType;
use redfish_emulator_core::Resolution;
use redfish_emulator_core::SystemsDriver;
use redfish_emulator_tests::rigs::fake_driver;
use redfish_emulator_tests::rigs::ironic_driver;
use redfish_emulator_tests::rigs::libvirt_driver;
use redfish_emulator_tests::rigs::nova_driver;
use redfish_emulator_tests::UNKNOWN_IDENTITIES;
use std::error::Error as StdError;
use std::fmt::Debug;
use tokio::test;

#[track_caller]
fn expect_not_found<T: Debug>(driver: &str, operation: &str, result: Result<T, Error>) {
    match result {
        Err(Error::NotFound {
            kind: EntityKind::System,
            ..
        }) => {}
        other => panic!("{driver} {operation}: expected system not found, got {other:?}"),
    }
}

async fn unknown_identities_are_not_found<S: SystemsDriver>(
    driver: &S,
) -> Result<(), Box<dyn StdError>> {
    let name = driver.driver_name();
    for identity in UNKNOWN_IDENTITIES {
        assert_eq!(driver.resolve_uuid(identity).await?, Resolution::NotFound);
        expect_not_found(name, "resolve_name", driver.resolve_name(identity).await);
        expect_not_found(name, "get_power_state", driver.get_power_state(identity).await);
        expect_not_found(
            name,
            "set_power_state",
            driver.set_power_state(identity, ResetType::On).await,
        );
        expect_not_found(name, "get_boot_device", driver.get_boot_device(identity).await);
        expect_not_found(
            name,
            "set_boot_device",
            driver.set_boot_device(identity, BootDevice::Pxe).await,
        );
        expect_not_found(
            name,
            "get_total_memory_gib",
            driver.get_total_memory_gib(identity).await,
        );
        expect_not_found(
            name,
            "get_total_cpu_count",
            driver.get_total_cpu_count(identity).await,
        );
        expect_not_found(name, "get_bios", driver.get_bios(identity).await);
        expect_not_found(
            name,
            "set_bios",
            driver.set_bios(identity, &BiosAttributes::new()).await,
        );
        expect_not_found(name, "reset_bios", driver.reset_bios(identity).await);
        expect_not_found(name, "get_nics", driver.get_nics(identity).await);
        expect_not_found(
            name,
            "get_boot_image",
            driver.get_boot_image(identity, BootDevice::Cd).await,
        );
        expect_not_found(
            name,
            "set_boot_image",
            driver
                .set_boot_image(identity, BootDevice::Cd, Some("/tmp/boot.iso"), true)
                .await,
        );
        expect_not_found(
            name,
            "get_simple_storage",
            driver.get_simple_storage(identity).await,
        );
    }
    Ok(())
}

#[test]
async fn fake_unknown_identities() -> Result<(), Box<dyn StdError>> {
    let notifier = RecordingNotifier::new();
    let driver = fake_driver(&StateDir::in_memory(), &ManualClock::default(), &notifier)?;
    unknown_identities_are_not_found(&driver).await?;
    assert!(notifier.events().is_empty());
    Ok(())
}

#[test]
async fn libvirt_unknown_identities() -> Result<(), Box<dyn StdError>> {
    let (hypervisor, driver) = libvirt_driver();
    unknown_identities_are_not_found(&driver).await?;
    assert!(hypervisor
        .calls()
        .iter()
        .all(|call| !call.starts_with("define_xml")));
    assert_eq!(hypervisor.open_connections(), 0);
    Ok(())
}

#[test]
async fn nova_unknown_identities() -> Result<(), Box<dyn StdError>> {
    let (compute, driver) = nova_driver();
    unknown_identities_are_not_found(&driver).await?;
    assert_eq!(compute.call_count("server_action"), 0);
    assert_eq!(compute.call_count("set_server_metadata"), 0);
    Ok(())
}

#[test]
async fn ironic_unknown_identities() -> Result<(), Box<dyn StdError>> {
    let (baremetal, driver) = ironic_driver();
    unknown_identities_are_not_found(&driver).await?;
    assert_eq!(baremetal.call_count("set_power_state"), 0);
    assert_eq!(baremetal.call_count("set_boot_device"), 0);
    Ok(())
}
