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

//! Test support: fixtures shared by the integration tests.

/// Drivers over in-memory backends.
pub mod rigs;

#[doc(inline)]
pub use rigs::fake_emulator;
#[doc(inline)]
pub use rigs::FakeEmulator;

use redfish_emulator::config::EmulatorConfig;
use redfish_emulator::config::FakeConfig;
use redfish_emulator::config::FakeSystemConfig;
use redfish_emulator::config::SystemsConfig;
use redfish_emulator_core::BootDevice;
use redfish_emulator_core::BootMode;
use redfish_emulator_core::Nic;
use redfish_emulator_core::PowerState;
use redfish_emulator_core::SimpleStorageMap;
use slog::o;
use slog::Discard;
use slog::Logger;
use std::path::Path;

/// Fake system notifying state changes.
pub const FAKE_UUID: &str = "27946b59-9e44-4fa7-8e91-f3527a1ef094";
pub const FAKE_NAME: &str = "fake";
pub const FAKE_SHORT_ID: &str = "1";

/// Second fake system, without notifications.
pub const FAKE_2_UUID: &str = "8d2b1a3c-5e4f-4a6b-9c7d-0e1f2a3b4c5d";
pub const FAKE_2_NAME: &str = "fake-2";

/// Hypervisor domain.
pub const DOMAIN_UUID: &str = "c7a5fdbd-cdaf-9455-926a-d65c16db1809";
pub const DOMAIN_NAME: &str = "vm-1";

/// Compute server.
pub const SERVER_UUID: &str = "b5f7e1a4-3d1c-4a8e-9a3f-2c6d9e0f1a2b";
pub const SERVER_NAME: &str = "node-1";

/// Bare-metal node.
pub const NODE_UUID: &str = "1be26c0b-03f2-4d2e-ae87-c02d7f33c123";
pub const NODE_NAME: &str = "bm-0";

/// Identities no backend knows.
pub const UNKNOWN_IDENTITIES: [&str; 3] = ["ghost", "00000000-0000-0000-0000-000000000000", ""];

/// Longest power transition delay of the fake systems, in seconds.
pub const MAX_POWER_DELAY: i64 = 3;

#[must_use]
pub fn logger() -> Logger {
    Logger::root(Discard, o!())
}

fn fake_system(
    uuid: &str,
    name: &str,
    short_id: Option<&str>,
    external_notifier: bool,
) -> FakeSystemConfig {
    FakeSystemConfig {
        uuid: uuid.to_string(),
        name: name.to_string(),
        short_id: short_id.map(str::to_string),
        power_state: PowerState::Off,
        nics: vec![Nic::from_mac("00:5c:52:31:3a:9c")],
        boot_device: Some(BootDevice::Hdd),
        boot_mode: Some(BootMode::Uefi),
        secure_boot: false,
        http_boot_uri: None,
        total_memory_gib: Some(32),
        total_cpus: Some(8),
        simple_storage: SimpleStorageMap::new(),
        external_notifier,
    }
}

#[must_use]
pub fn fake_config() -> FakeConfig {
    FakeConfig {
        systems: vec![
            fake_system(FAKE_UUID, FAKE_NAME, Some(FAKE_SHORT_ID), true),
            fake_system(FAKE_2_UUID, FAKE_2_NAME, None, false),
        ],
        min_power_delay: 1,
        max_power_delay: MAX_POWER_DELAY.unsigned_abs(),
        notifier_url: None,
    }
}

/// Persistent configuration with the fake systems, state kept in
/// `state_dir`.
#[must_use]
pub fn emulator_config(state_dir: &Path) -> EmulatorConfig {
    EmulatorConfig {
        state_dir: state_dir.to_path_buf(),
        persistent_state: true,
        systems: SystemsConfig::Fake(fake_config()),
        ..EmulatorConfig::default()
    }
}

/// Configuration with the fake systems, state kept in memory.
#[must_use]
pub fn in_memory_config() -> EmulatorConfig {
    EmulatorConfig {
        persistent_state: false,
        systems: SystemsConfig::Fake(fake_config()),
        ..EmulatorConfig::default()
    }
}
