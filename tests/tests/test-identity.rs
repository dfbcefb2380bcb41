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

//! Identity resolution across every systems driver.

use redfish_emulator_backend_mock::ManualClock;
use redfish_emulator_backend_mock::RecordingNotifier;
use redfish_emulator_core::Resolution;
use redfish_emulator_core::SystemsDriver;
use redfish_emulator::StateDir;
use redfish_emulator_tests::rigs::fake_driver;
use redfish_emulator_tests::rigs::ironic_driver;
use redfish_emulator_tests::rigs::libvirt_driver;
use redfish_emulator_tests::rigs::nova_driver;
use redfish_emulator_tests::DOMAIN_NAME;
use redfish_emulator_tests::DOMAIN_UUID;
use redfish_emulator_tests::FAKE_2_NAME;
use redfish_emulator_tests::FAKE_2_UUID;
use redfish_emulator_tests::FAKE_NAME;
use redfish_emulator_tests::FAKE_SHORT_ID;
use redfish_emulator_tests::FAKE_UUID;
use redfish_emulator_tests::NODE_NAME;
use redfish_emulator_tests::NODE_UUID;
use redfish_emulator_tests::SERVER_NAME;
use redfish_emulator_tests::SERVER_UUID;
use redfish_emulator_tests::UNKNOWN_IDENTITIES;
use std::error::Error as StdError;
use tokio::test;

/// Canonical UUID resolves to itself, aliases redirect to it and every
/// identifier reads the same name.
async fn check_identities<S: SystemsDriver>(
    driver: &S,
    uuid: &str,
    name: &str,
    aliases: &[&str],
) -> Result<(), Box<dyn StdError>> {
    let driver_name = driver.driver_name();
    assert_eq!(
        driver.resolve_uuid(uuid).await?,
        Resolution::Canonical(uuid.to_string()),
        "{driver_name}: canonical uuid"
    );
    for alias in aliases {
        assert_eq!(
            driver.resolve_uuid(alias).await?,
            Resolution::Redirect(uuid.to_string()),
            "{driver_name}: alias {alias}"
        );
    }
    for identity in std::iter::once(&uuid).chain(aliases) {
        assert_eq!(driver.resolve_name(identity).await?, name, "{driver_name}");
        // Resolution is idempotent: the target of a redirect is canonical.
        let target = driver.resolve_uuid(identity).await?;
        let resolved = target.canonical().ok_or("resolved")?;
        assert_eq!(
            driver.resolve_uuid(resolved).await?,
            Resolution::Canonical(resolved.to_string())
        );
    }
    for unknown in UNKNOWN_IDENTITIES {
        assert_eq!(
            driver.resolve_uuid(unknown).await?,
            Resolution::NotFound,
            "{driver_name}: {unknown:?}"
        );
    }
    assert!(
        driver.systems().await?.iter().any(|s| s == uuid),
        "{driver_name}: listed"
    );
    Ok(())
}

#[test]
async fn fake_identities() -> Result<(), Box<dyn StdError>> {
    let driver = fake_driver(
        &StateDir::in_memory(),
        &ManualClock::default(),
        &RecordingNotifier::new(),
    )?;
    check_identities(&driver, FAKE_UUID, FAKE_NAME, &[FAKE_NAME, FAKE_SHORT_ID]).await?;
    check_identities(&driver, FAKE_2_UUID, FAKE_2_NAME, &[FAKE_2_NAME]).await?;
    assert_eq!(driver.systems().await?, vec![FAKE_UUID, FAKE_2_UUID]);
    Ok(())
}

#[test]
async fn libvirt_identities() -> Result<(), Box<dyn StdError>> {
    let (_, driver) = libvirt_driver();
    check_identities(&driver, DOMAIN_UUID, DOMAIN_NAME, &[DOMAIN_NAME]).await
}

#[test]
async fn nova_identities() -> Result<(), Box<dyn StdError>> {
    let (_, driver) = nova_driver();
    check_identities(&driver, SERVER_UUID, SERVER_NAME, &[SERVER_NAME]).await
}

#[test]
async fn ironic_identities() -> Result<(), Box<dyn StdError>> {
    let (_, driver) = ironic_driver();
    check_identities(&driver, NODE_UUID, NODE_NAME, &[NODE_NAME]).await
}

#[test]
async fn uuid_case_does_not_matter() -> Result<(), Box<dyn StdError>> {
    let (_, driver) = libvirt_driver();
    assert_eq!(
        driver.resolve_uuid(&DOMAIN_UUID.to_uppercase()).await?,
        Resolution::Canonical(DOMAIN_UUID.to_string())
    );
    let fake = fake_driver(
        &StateDir::in_memory(),
        &ManualClock::default(),
        &RecordingNotifier::new(),
    )?;
    assert_eq!(
        fake.resolve_uuid(&FAKE_UUID.to_uppercase()).await?,
        Resolution::Canonical(FAKE_UUID.to_string())
    );
    Ok(())
}
