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

//! State survives an emulator restart when kept on disk.

use redfish_emulator::state::StateCategory;
use redfish_emulator_backend_mock::ManualClock;
use redfish_emulator_core::BiosAttributes;
use redfish_emulator_core::BootDevice;
use redfish_emulator_core::IndicatorLed;
use redfish_emulator_core::PowerState;
use redfish_emulator_core::SystemsDriver;
use redfish_emulator_core::VolumeDescriptor;
use redfish_emulator_tests::emulator_config;
use redfish_emulator_tests::fake_emulator;
use redfish_emulator_tests::in_memory_config;
use redfish_emulator_tests::FakeEmulator;
use redfish_emulator_tests::FAKE_NAME;
use redfish_emulator_tests::FAKE_UUID;
use redfish_emulator_tests::MAX_POWER_DELAY;
use serde_json::json;
use std::error::Error as StdError;
use tempfile::tempdir;
use time::Duration;
use tokio::test;

const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

fn volume() -> VolumeDescriptor {
    VolumeDescriptor {
        id: "1".to_string(),
        name: "data".to_string(),
        volume_type: Some("Mirrored".to_string()),
        capacity_bytes: 1 << 30,
        pool_name: None,
        volume_name: None,
    }
}

async fn change_everything(emulator: &FakeEmulator) -> Result<(), Box<dyn StdError>> {
    let resources = &emulator.resources;
    resources.reset_system(FAKE_NAME, "On").await?;
    resources
        .systems()
        .set_boot_device(FAKE_NAME, BootDevice::Pxe)
        .await?;
    resources
        .systems()
        .set_bios(
            FAKE_NAME,
            &BiosAttributes::from([("ProcTurboMode".to_string(), json!("Disabled"))]),
        )
        .await?;
    resources.set_indicator(FAKE_NAME, "Blinking").await?;
    resources
        .vmedia()
        .add_certificate(FAKE_UUID, "Cd", PEM, "PEM")?;
    resources.create_volume(FAKE_NAME, "1", volume()).await?;
    Ok(())
}

#[test]
async fn restart_keeps_state() -> Result<(), Box<dyn StdError>> {
    let dir = tempdir()?;
    let config = emulator_config(dir.path());
    let clock = ManualClock::default();
    {
        let emulator = fake_emulator(&config, clock.clone())?;
        change_everything(&emulator).await?;
    }
    for category in [
        StateCategory::Systems,
        StateCategory::Bios,
        StateCategory::Indicators,
        StateCategory::VirtualMedia,
        StateCategory::Volumes,
    ] {
        assert!(dir.path().join(category.file_name()).exists(), "{category:?}");
    }

    clock.advance(Duration::seconds(MAX_POWER_DELAY));
    let emulator = fake_emulator(&config, clock)?;
    let resources = &emulator.resources;
    let systems = resources.systems();
    // The transition scheduled before restart completes after it.
    assert_eq!(systems.get_power_state(FAKE_UUID).await?, PowerState::On);
    assert_eq!(
        systems.get_boot_device(FAKE_UUID).await?,
        Some(BootDevice::Pxe)
    );
    assert_eq!(
        systems.get_bios(FAKE_UUID).await?.get("ProcTurboMode"),
        Some(&json!("Disabled"))
    );
    assert_eq!(
        resources.indicator(FAKE_UUID).await?,
        IndicatorLed::Blinking
    );
    assert_eq!(
        resources.vmedia().list_certificates(FAKE_UUID, "Cd")?.len(),
        1
    );
    let system = resources.system(FAKE_NAME).await?;
    assert_eq!(resources.volumes().list(&system, "1")?, vec![volume()]);
    Ok(())
}

#[test]
async fn in_memory_state_is_lost_on_restart() -> Result<(), Box<dyn StdError>> {
    let config = in_memory_config();
    {
        let emulator = fake_emulator(&config, ManualClock::default())?;
        change_everything(&emulator).await?;
    }
    let emulator = fake_emulator(&config, ManualClock::default())?;
    let resources = &emulator.resources;
    assert_eq!(
        resources.systems().get_boot_device(FAKE_UUID).await?,
        Some(BootDevice::Hdd)
    );
    assert_eq!(resources.indicator(FAKE_UUID).await?, IndicatorLed::Lit);
    assert!(resources
        .vmedia()
        .list_certificates(FAKE_UUID, "Cd")?
        .is_empty());
    Ok(())
}

#[test]
async fn corrupt_state_file_is_reported() -> Result<(), Box<dyn StdError>> {
    let dir = tempdir()?;
    std::fs::write(
        dir.path().join(StateCategory::Indicators.file_name()),
        "{ not json",
    )?;
    let Err(err) = fake_emulator(&emulator_config(dir.path()), ManualClock::default()) else {
        return Err("corrupt state accepted".into());
    };
    assert_eq!(err.status().as_u16(), 500);
    Ok(())
}
