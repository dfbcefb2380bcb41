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

use crate::fake_config;
use crate::logger;
use crate::DOMAIN_NAME;
use crate::DOMAIN_UUID;
use crate::NODE_NAME;
use crate::NODE_UUID;
use crate::SERVER_NAME;
use crate::SERVER_UUID;
use redfish_emulator::config::EmulatorConfig;
use redfish_emulator::config::IronicConfig;
use redfish_emulator::config::LibvirtConfig;
use redfish_emulator::config::NovaConfig;
use redfish_emulator::config::SystemsConfig;
use redfish_emulator::systems::fake::FakeDriver;
use redfish_emulator::systems::ironic::IronicDriver;
use redfish_emulator::systems::libvirt::LibvirtDriver;
use redfish_emulator::systems::nova::NovaDriver;
use redfish_emulator::Resources;
use redfish_emulator::StateDir;
use redfish_emulator_backend_mock::baremetal;
use redfish_emulator_backend_mock::compute;
use redfish_emulator_backend_mock::hypervisor::sample_domain_xml;
use redfish_emulator_backend_mock::ManualClock;
use redfish_emulator_backend_mock::MockBaremetal;
use redfish_emulator_backend_mock::MockCompute;
use redfish_emulator_backend_mock::MockFetcher;
use redfish_emulator_backend_mock::MockHypervisor;
use redfish_emulator_backend_mock::RecordingNotifier;
use redfish_emulator_core::backend::Flavor;
use redfish_emulator_core::Error;
use redfish_emulator_core::PermanentCache;

pub type FakeSystems = FakeDriver<RecordingNotifier, ManualClock>;

/// Fake systems driver with its clock and notifier.
///
/// # Errors
///
/// Returns error if state cannot be opened.
pub fn fake_driver(
    state: &StateDir,
    clock: &ManualClock,
    notifier: &RecordingNotifier,
) -> Result<FakeSystems, Error> {
    FakeDriver::new(&fake_config(), &logger(), state, notifier.clone(), clock.clone())
}

#[must_use]
pub fn libvirt_driver() -> (MockHypervisor, LibvirtDriver<MockHypervisor>) {
    let hypervisor = MockHypervisor::default();
    hypervisor.add_domain(
        DOMAIN_UUID,
        DOMAIN_NAME,
        sample_domain_xml(DOMAIN_UUID, DOMAIN_NAME),
        false,
    );
    let driver = LibvirtDriver::new(&LibvirtConfig::default(), &logger(), hypervisor.clone());
    (hypervisor, driver)
}

#[must_use]
pub fn nova_driver() -> (MockCompute, NovaDriver<MockCompute>) {
    let backend = MockCompute::new();
    backend.add_server(compute::server(SERVER_UUID, SERVER_NAME, compute::SHUTDOWN));
    backend.add_flavor(Flavor {
        id: "f1".to_string(),
        ram_mb: 4096,
        vcpus: 2,
    });
    let config = NovaConfig {
        endpoint: "http://compute.test:8774/v2.1".to_string(),
        token: None,
    };
    let driver = NovaDriver::new(&config, &logger(), backend.clone(), PermanentCache::new());
    (backend, driver)
}

#[must_use]
pub fn ironic_driver() -> (MockBaremetal, IronicDriver<MockBaremetal>) {
    let backend = MockBaremetal::new();
    backend.add_node(
        baremetal::node(NODE_UUID, Some(NODE_NAME), "power off"),
        &["52:54:00:aa:bb:cc"],
    );
    let config = IronicConfig {
        endpoint: "http://ironic.test:6385".to_string(),
        token: None,
        username: None,
        password: None,
    };
    let driver = IronicDriver::new(&config, &logger(), backend.clone());
    (backend, driver)
}

/// Emulator over the fake systems with every backend double exposed.
pub struct FakeEmulator {
    pub clock: ManualClock,
    pub notifier: RecordingNotifier,
    pub fetcher: MockFetcher,
    pub resources: Resources<FakeSystems, MockFetcher>,
}

/// Emulator of `config` driven by `clock`. State is opened from
/// `config`, so two emulators over the same persistent configuration
/// share state like two runs of the emulator process.
///
/// # Errors
///
/// Returns error if `config` does not select the fake driver or state
/// cannot be opened.
pub fn fake_emulator(config: &EmulatorConfig, clock: ManualClock) -> Result<FakeEmulator, Error> {
    let SystemsConfig::Fake(fake) = &config.systems else {
        return Err(Error::bad_request("fake driver expected"));
    };
    let state = StateDir::from_config(config);
    let notifier = RecordingNotifier::new();
    let fetcher = MockFetcher::new();
    let driver = FakeDriver::new(fake, &logger(), &state, notifier.clone(), clock.clone())?;
    let resources = Resources::new(config, &logger(), &state, driver, fetcher.clone())?;
    Ok(FakeEmulator {
        clock,
        notifier,
        fetcher,
        resources,
    })
}

/// Emulator of `config` over `systems`, state kept in memory.
///
/// # Errors
///
/// Returns error if state cannot be opened.
pub fn emulator_over<S: redfish_emulator_core::SystemsDriver>(
    config: &EmulatorConfig,
    systems: S,
) -> Result<(MockFetcher, Resources<S, MockFetcher>), Error> {
    let fetcher = MockFetcher::new();
    let resources = Resources::new(
        config,
        &logger(),
        &StateDir::in_memory(),
        systems,
        fetcher.clone(),
    )?;
    Ok((fetcher, resources))
}
