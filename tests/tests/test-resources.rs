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

//! Chassis, managers and storage resources over systems drivers.

use redfish_emulator::config::ChassisConfig;
use redfish_emulator::config::ManagerConfig;
use redfish_emulator::resources::chassis::DEFAULT_CHASSIS_UUID;
use redfish_emulator_backend_mock::ManualClock;
use redfish_emulator_core::EntityKind;
use redfish_emulator_core::Error;
use redfish_emulator_core::IndicatorLed;
use redfish_emulator_core::Resolution;
use redfish_emulator_core::VolumeDescriptor;
use redfish_emulator_tests::fake_emulator;
use redfish_emulator_tests::in_memory_config;
use redfish_emulator_tests::rigs::emulator_over;
use redfish_emulator_tests::rigs::libvirt_driver;
use redfish_emulator_tests::DOMAIN_NAME;
use redfish_emulator_tests::FAKE_2_NAME;
use redfish_emulator_tests::FAKE_2_UUID;
use redfish_emulator_tests::FAKE_NAME;
use redfish_emulator_tests::FAKE_UUID;
use redfish_emulator_tests::UNKNOWN_IDENTITIES;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use tokio::test;

fn descriptor(pool: Option<&str>) -> VolumeDescriptor {
    VolumeDescriptor {
        id: "1".to_string(),
        name: "Sample Volume 1".to_string(),
        volume_type: Some("Mirrored".to_string()),
        capacity_bytes: 23_748_718_592,
        pool_name: pool.map(str::to_string),
        volume_name: pool.map(|_| "testVol".to_string()),
    }
}

#[test]
async fn manager_per_system() -> Result<(), Box<dyn StdError>> {
    let emulator = fake_emulator(&in_memory_config(), ManualClock::default())?;
    let resources = &emulator.resources;
    let managers = resources.managers().managers(resources.systems()).await?;
    assert_eq!(managers.len(), 2);
    assert_eq!(managers[0].name, format!("{FAKE_NAME}-Manager"));
    assert_eq!(managers[0].systems, vec![FAKE_UUID]);
    assert_eq!(managers[0].chassis, vec![DEFAULT_CHASSIS_UUID]);

    let by_name = format!("{FAKE_2_NAME}-Manager");
    assert_eq!(
        resources
            .managers()
            .resolve_uuid(resources.systems(), &by_name)
            .await?,
        Resolution::Redirect(FAKE_2_UUID.to_string())
    );
    assert!(matches!(
        resources.managers().get(resources.systems(), "ghost").await,
        Err(Error::NotFound {
            kind: EntityKind::Manager,
            ..
        })
    ));
    Ok(())
}

#[test]
async fn configured_managers_and_chassis() -> Result<(), Box<dyn StdError>> {
    let mut config = in_memory_config();
    config.chassis = vec![ChassisConfig {
        id: "rack-1".to_string(),
        name: "Rack 1".to_string(),
        uuid: None,
        systems: vec![FAKE_2_NAME.to_string(), "not-a-system".to_string()],
        managers: Vec::new(),
    }];
    config.managers = vec![ManagerConfig {
        id: "bmc-1".to_string(),
        name: "BMC".to_string(),
        systems: vec![FAKE_UUID.to_string(), FAKE_2_UUID.to_string()],
        chassis: Vec::new(),
    }];
    let emulator = fake_emulator(&config, ManualClock::default())?;
    let resources = &emulator.resources;

    assert_eq!(resources.chassis().chassis(), vec!["rack-1"]);
    assert_eq!(resources.chassis_systems("Rack 1").await?, vec![FAKE_2_UUID]);

    let manager = resources.managers().get(resources.systems(), "BMC").await?;
    assert_eq!(manager.uuid, "bmc-1");
    assert_eq!(manager.chassis, vec!["rack-1"]);
    Ok(())
}

#[test]
async fn default_chassis_holds_every_system() -> Result<(), Box<dyn StdError>> {
    let emulator = fake_emulator(&in_memory_config(), ManualClock::default())?;
    let resources = &emulator.resources;
    assert_eq!(
        resources.chassis().resolve_uuid("Chassis-1"),
        Resolution::Redirect(DEFAULT_CHASSIS_UUID.to_string())
    );
    assert_eq!(
        resources.chassis_systems(DEFAULT_CHASSIS_UUID).await?,
        vec![FAKE_UUID, FAKE_2_UUID]
    );
    assert!(resources
        .chassis_systems("ghost")
        .await
        .is_err_and(|err| err.is_not_found()));
    Ok(())
}

#[test]
async fn fake_volume_is_recorded() -> Result<(), Box<dyn StdError>> {
    let emulator = fake_emulator(&in_memory_config(), ManualClock::default())?;
    let resources = &emulator.resources;
    let id = resources
        .create_volume(FAKE_NAME, "1", descriptor(None))
        .await?;
    assert_eq!(id, "1");
    let system = resources.system(FAKE_UUID).await?;
    assert_eq!(
        resources.volumes().get(&system, "1", "1")?.name,
        "Sample Volume 1"
    );
    assert!(matches!(
        resources.create_volume(FAKE_NAME, "1", descriptor(None)).await,
        Err(Error::Conflict(_))
    ));
    Ok(())
}

#[test]
async fn libvirt_volume_needs_pool() -> Result<(), Box<dyn StdError>> {
    let (hypervisor, driver) = libvirt_driver();
    let (_, resources) = emulator_over(&in_memory_config(), driver)?;

    let err = resources
        .create_volume(DOMAIN_NAME, "1", descriptor(None))
        .await
        .err()
        .ok_or("volume without pool created")?;
    assert!(matches!(err, Error::BadRequest(_)), "{err}");

    resources
        .create_volume(DOMAIN_NAME, "1", descriptor(Some("emulatorPool")))
        .await?;
    let (_, capacity) = hypervisor
        .volume("emulatorPool", "testVol")
        .ok_or("backend volume")?;
    assert_eq!(capacity, 23_748_718_592);
    let system = resources.system(DOMAIN_NAME).await?;
    assert_eq!(resources.volumes().list(&system, "1")?.len(), 1);
    Ok(())
}

#[test]
async fn taken_volume_id_leaves_backend_untouched() -> Result<(), Box<dyn StdError>> {
    let (hypervisor, driver) = libvirt_driver();
    let (_, resources) = emulator_over(&in_memory_config(), driver)?;
    resources
        .create_volume(DOMAIN_NAME, "1", descriptor(Some("emulatorPool")))
        .await?;

    let mut again = descriptor(Some("emulatorPool"));
    again.volume_name = Some("otherVol".to_string());
    assert!(matches!(
        resources.create_volume(DOMAIN_NAME, "1", again).await,
        Err(Error::Conflict(_))
    ));
    assert!(hypervisor.volume("emulatorPool", "otherVol").is_none());
    let created = hypervisor
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("create_volume:"))
        .count();
    assert_eq!(created, 1);
    Ok(())
}

#[test]
async fn indicator_is_shared_by_aliases() -> Result<(), Box<dyn StdError>> {
    let mut config = in_memory_config();
    config.indicators.default_state = IndicatorLed::Lit;
    config.indicators.states = BTreeMap::from([(FAKE_2_NAME.to_string(), IndicatorLed::Off)]);
    let emulator = fake_emulator(&config, ManualClock::default())?;
    let resources = &emulator.resources;

    resources.set_indicator(FAKE_NAME, "Blinking").await?;
    assert_eq!(resources.indicator(FAKE_UUID).await?, IndicatorLed::Blinking);
    assert_eq!(resources.indicator(FAKE_2_UUID).await?, IndicatorLed::Off);

    resources.set_indicator("Chassis-1", "Off").await?;
    assert_eq!(
        resources.indicator(DEFAULT_CHASSIS_UUID).await?,
        IndicatorLed::Off
    );
    for identity in UNKNOWN_IDENTITIES {
        assert!(resources
            .set_indicator(identity, "Lit")
            .await
            .is_err_and(|err| err.is_not_found()));
    }
    Ok(())
}
