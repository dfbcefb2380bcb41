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

//! BIOS attributes through drivers that keep them.

use redfish_emulator::systems::default_bios;
use redfish_emulator::StateDir;
use redfish_emulator_backend_mock::ManualClock;
use redfish_emulator_backend_mock::RecordingNotifier;
use redfish_emulator_core::BiosAttributes;
use redfish_emulator_core::SystemsDriver;
use redfish_emulator_tests::rigs::fake_driver;
use redfish_emulator_tests::rigs::libvirt_driver;
use redfish_emulator_tests::DOMAIN_NAME;
use redfish_emulator_tests::FAKE_NAME;
use serde_json::json;
use std::error::Error as StdError;
use tokio::test;

fn attributes(pairs: &[(&str, serde_json::Value)]) -> BiosAttributes {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

/// Updates merge over current attributes, reset restores defaults.
async fn bios_round_trip<S: SystemsDriver>(
    driver: &S,
    identity: &str,
) -> Result<(), Box<dyn StdError>> {
    assert_eq!(driver.get_bios(identity).await?, default_bios());

    driver
        .set_bios(identity, &attributes(&[("BootMode", json!("Bios"))]))
        .await?;
    driver
        .set_bios(identity, &attributes(&[("ProcTurboMode", json!("Disabled"))]))
        .await?;
    let bios = driver.get_bios(identity).await?;
    assert_eq!(bios.get("BootMode"), Some(&json!("Bios")));
    assert_eq!(bios.get("ProcTurboMode"), Some(&json!("Disabled")));
    assert_eq!(
        bios.get("EmbeddedSata"),
        default_bios().get("EmbeddedSata"),
        "untouched attribute kept"
    );

    driver.reset_bios(identity).await?;
    assert_eq!(driver.get_bios(identity).await?, default_bios());
    Ok(())
}

#[test]
async fn fake_bios() -> Result<(), Box<dyn StdError>> {
    let driver = fake_driver(
        &StateDir::in_memory(),
        &ManualClock::default(),
        &RecordingNotifier::new(),
    )?;
    bios_round_trip(&driver, FAKE_NAME).await
}

#[test]
async fn libvirt_bios() -> Result<(), Box<dyn StdError>> {
    let (hypervisor, driver) = libvirt_driver();
    bios_round_trip(&driver, DOMAIN_NAME).await?;
    assert!(hypervisor
        .calls()
        .iter()
        .any(|call| call.starts_with("define_xml")));
    Ok(())
}
