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

//! Power transitions as seen through reset actions.

use redfish_emulator_backend_mock::ManualClock;
use redfish_emulator_core::Error;
use redfish_emulator_core::PowerState;
use redfish_emulator_core::SystemsDriver;
use redfish_emulator_tests::fake_emulator;
use redfish_emulator_tests::in_memory_config;
use redfish_emulator_tests::FAKE_2_NAME;
use redfish_emulator_tests::FAKE_NAME;
use redfish_emulator_tests::FAKE_SHORT_ID;
use redfish_emulator_tests::FAKE_UUID;
use redfish_emulator_tests::MAX_POWER_DELAY;
use std::error::Error as StdError;
use time::Duration;
use tokio::test;

#[test]
async fn power_on_becomes_visible_after_delay() -> Result<(), Box<dyn StdError>> {
    let emulator = fake_emulator(&in_memory_config(), ManualClock::default())?;
    let systems = emulator.resources.systems();

    emulator.resources.reset_system(FAKE_NAME, "On").await?;
    assert_eq!(systems.get_power_state(FAKE_UUID).await?, PowerState::Off);

    emulator
        .clock
        .advance(Duration::seconds(MAX_POWER_DELAY));
    assert_eq!(systems.get_power_state(FAKE_SHORT_ID).await?, PowerState::On);
    Ok(())
}

#[test]
async fn restart_turns_off_immediately() -> Result<(), Box<dyn StdError>> {
    let emulator = fake_emulator(&in_memory_config(), ManualClock::default())?;
    let systems = emulator.resources.systems();
    emulator.resources.reset_system(FAKE_UUID, "ForceOn").await?;
    emulator
        .clock
        .advance(Duration::seconds(MAX_POWER_DELAY));
    assert_eq!(systems.get_power_state(FAKE_UUID).await?, PowerState::On);

    emulator
        .resources
        .reset_system(FAKE_UUID, "GracefulRestart")
        .await?;
    assert_eq!(systems.get_power_state(FAKE_UUID).await?, PowerState::Off);
    emulator
        .clock
        .advance(Duration::seconds(MAX_POWER_DELAY));
    assert_eq!(systems.get_power_state(FAKE_UUID).await?, PowerState::On);
    Ok(())
}

#[test]
async fn request_for_current_state_is_noop() -> Result<(), Box<dyn StdError>> {
    let emulator = fake_emulator(&in_memory_config(), ManualClock::default())?;
    let systems = emulator.resources.systems();
    emulator.resources.reset_system(FAKE_UUID, "ForceOff").await?;
    emulator
        .resources
        .reset_system(FAKE_UUID, "GracefulShutdown")
        .await?;
    assert_eq!(systems.get_power_state(FAKE_UUID).await?, PowerState::Off);
    assert!(emulator.notifier.events().is_empty());
    Ok(())
}

#[test]
async fn only_notifying_systems_post_events() -> Result<(), Box<dyn StdError>> {
    let emulator = fake_emulator(&in_memory_config(), ManualClock::default())?;
    emulator.resources.reset_system(FAKE_2_NAME, "On").await?;
    assert!(emulator.notifier.events().is_empty());

    emulator.resources.reset_system(FAKE_NAME, "On").await?;
    let events = emulator.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].uuid, FAKE_UUID);
    assert_eq!(events[0].name, FAKE_NAME);
    Ok(())
}

#[test]
async fn unknown_reset_type_is_bad_request() -> Result<(), Box<dyn StdError>> {
    let emulator = fake_emulator(&in_memory_config(), ManualClock::default())?;
    for token in ["PushPowerButton", "on", ""] {
        let err = emulator
            .resources
            .reset_system(FAKE_UUID, token)
            .await
            .err()
            .ok_or("reset accepted")?;
        assert!(matches!(err, Error::BadRequest(_)), "{token:?}: {err}");
        assert_eq!(err.status().as_u16(), 400);
    }
    let missing = emulator
        .resources
        .reset_system("ghost", "On")
        .await
        .err()
        .ok_or("reset accepted")?;
    assert_eq!(missing.status().as_u16(), 404);
    Ok(())
}

#[test]
async fn nmi_leaves_power_alone() -> Result<(), Box<dyn StdError>> {
    let emulator = fake_emulator(&in_memory_config(), ManualClock::default())?;
    let systems = emulator.resources.systems();
    emulator.resources.reset_system(FAKE_UUID, "Nmi").await?;
    emulator
        .clock
        .advance(Duration::seconds(MAX_POWER_DELAY));
    assert_eq!(systems.get_power_state(FAKE_UUID).await?, PowerState::Off);
    Ok(())
}
