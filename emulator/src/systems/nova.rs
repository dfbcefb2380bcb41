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

//! Cloud compute driver.
//!
//! Servers are identified by UUID; names are accepted as aliases. The
//! compute API has no boot order, so the boot device is kept in server
//! metadata. Server lookups are memoized for the duration of one request,
//! flavors permanently.

use crate::config::NovaConfig;
use crate::systems::backend_failure;
use crate::systems::mib_to_gib;
use crate::systems::require_system;
use redfish_emulator_core::backend::ComputeApi;
use redfish_emulator_core::backend::Flavor;
use redfish_emulator_core::backend::Server;
use redfish_emulator_core::backend::ServerAction;
use redfish_emulator_core::identity::is_uuid;
use redfish_emulator_core::BackendError;
use redfish_emulator_core::BackendErrorKind;
use redfish_emulator_core::BiosAttributes;
use redfish_emulator_core::BootDevice;
use redfish_emulator_core::BootImage;
use redfish_emulator_core::CacheScope;
use redfish_emulator_core::CallKey;
use redfish_emulator_core::EntityKind;
use redfish_emulator_core::Error;
use redfish_emulator_core::Memo;
use redfish_emulator_core::Nic;
use redfish_emulator_core::PermanentCache;
use redfish_emulator_core::PowerState;
use redfish_emulator_core::ResetType;
use redfish_emulator_core::Resolution;
use redfish_emulator_core::SimpleStorageMap;
use redfish_emulator_core::SystemsDriver;
use redfish_emulator_core::VolumeDescriptor;
use slog::info;
use slog::o;
use slog::warn;
use slog::Logger;
use std::sync::Arc;

pub const DRIVER: &str = "nova";

/// Server metadata item marking network boot.
pub const PXE_FIRST: &str = "pxe-first";

/// Hypervisor power state codes reported by the compute API.
const NOSTATE: u8 = 0;
const RUNNING: u8 = 1;

pub struct NovaDriver<C> {
    log: Logger,
    compute: C,
    cache: PermanentCache,
}

impl<C: ComputeApi> NovaDriver<C> {
    /// Driver over `compute`. Flavors are memoized in `cache`, which may be
    /// shared with other drivers.
    pub fn new(config: &NovaConfig, log: &Logger, compute: C, cache: PermanentCache) -> Self {
        Self {
            log: log.new(o!("driver" => DRIVER, "endpoint" => config.endpoint.clone())),
            compute,
            cache,
        }
    }

    /// Memo of one request.
    fn memo(&self) -> Memo {
        Memo::new(self.cache.clone())
    }

    fn backend<T>(&self, result: Result<T, BackendError>) -> Result<T, Error> {
        result.map_err(|err| backend_failure(&self.log, err))
    }

    async fn get_server(&self, memo: &Memo, id: &str) -> Result<Option<Arc<Server>>, Error> {
        let result = memo
            .get_or_try_insert_some(CacheScope::Session, CallKey::new("get_server", [id]), || {
                self.compute.get_server(id)
            })
            .await;
        self.backend(result)
    }

    async fn servers_named(&self, memo: &Memo, name: &str) -> Result<Arc<Vec<Server>>, Error> {
        let result = memo
            .get_or_try_insert_with(
                CacheScope::Session,
                CallKey::new("find_servers_by_name", [name]),
                || self.compute.find_servers_by_name(name),
            )
            .await;
        self.backend(result)
    }

    async fn flavor(&self, memo: &Memo, id: &str) -> Result<Option<Arc<Flavor>>, Error> {
        let result = memo
            .get_or_try_insert_some(CacheScope::Permanent, CallKey::new("get_flavor", [id]), || {
                self.compute.get_flavor(id)
            })
            .await;
        self.backend(result)
    }

    async fn lookup(&self, memo: &Memo, identity: &str) -> Result<Option<Server>, Error> {
        if is_uuid(identity) {
            if let Some(server) = self.get_server(memo, identity).await? {
                return Ok(Some((*server).clone()));
            }
        }
        let named = self.servers_named(memo, identity).await?;
        if named.len() > 1 {
            warn!(self.log, "ambiguous server name, using first match";
                "name" => identity, "count" => named.len());
        }
        Ok(named.first().cloned())
    }

    /// Server behind `identity`, aliases resolved.
    async fn server(&self, memo: &Memo, identity: &str) -> Result<Server, Error> {
        let found = self.lookup(memo, identity).await?;
        let resolution = found.as_ref().map_or(Resolution::NotFound, |server| {
            Resolution::from_lookup(identity, server.id.clone())
        });
        require_system(&self.log, identity, resolution)?;
        found.ok_or_else(|| Error::not_found(EntityKind::System, identity))
    }

    /// Resolve `identity`, then report `operation` as unsupported.
    async fn unsupported<T>(&self, identity: &str, operation: &'static str) -> Result<T, Error> {
        self.server(&self.memo(), identity).await?;
        Err(Error::not_supported(DRIVER, operation))
    }

    fn busy(&self, server: &Server) -> Result<(), Error> {
        match &server.task_state {
            Some(task) => Err(backend_failure(
                &self.log,
                BackendError::new(
                    self.compute.endpoint(),
                    "server_action",
                    BackendErrorKind::Busy,
                    format!("task {task} in progress"),
                )
                .with_identity(&server.id),
            )),
            None => Ok(()),
        }
    }

    async fn flavor_of(&self, identity: &str) -> Result<Option<Flavor>, Error> {
        let memo = self.memo();
        let server = self.server(&memo, identity).await?;
        match &server.flavor_id {
            Some(id) => Ok(self.flavor(&memo, id).await?.map(|flavor| (*flavor).clone())),
            None => Ok(None),
        }
    }
}

fn power_state(code: u8) -> PowerState {
    match code {
        RUNNING => PowerState::On,
        NOSTATE => PowerState::Unknown,
        _ => PowerState::Off,
    }
}

/// Server action performing `action`, `None` if it is a no-op for a server
/// in `state`.
fn server_action(action: ResetType, state: PowerState) -> Option<ServerAction> {
    let running = state == PowerState::On;
    match action {
        ResetType::On | ResetType::ForceOn => (!running).then_some(ServerAction::Start),
        ResetType::ForceOff | ResetType::GracefulShutdown => running.then_some(ServerAction::Stop),
        ResetType::GracefulRestart => running.then_some(ServerAction::SoftReboot),
        ResetType::ForceRestart => running.then_some(ServerAction::HardReboot),
        ResetType::Nmi => running.then_some(ServerAction::CrashDump),
    }
}

impl<C: ComputeApi> SystemsDriver for NovaDriver<C> {
    fn driver_name(&self) -> &'static str {
        DRIVER
    }

    async fn systems(&self) -> Result<Vec<String>, Error> {
        let servers = self.backend(self.compute.list_servers().await)?;
        Ok(servers.into_iter().map(|server| server.id).collect())
    }

    async fn resolve_uuid(&self, identity: &str) -> Result<Resolution, Error> {
        Ok(self
            .lookup(&self.memo(), identity)
            .await?
            .map_or(Resolution::NotFound, |server| {
                Resolution::from_lookup(identity, server.id)
            }))
    }

    async fn resolve_name(&self, identity: &str) -> Result<String, Error> {
        Ok(self.server(&self.memo(), identity).await?.name)
    }

    async fn get_power_state(&self, identity: &str) -> Result<PowerState, Error> {
        Ok(power_state(self.server(&self.memo(), identity).await?.power_state))
    }

    async fn set_power_state(&self, identity: &str, action: ResetType) -> Result<(), Error> {
        let server = self.server(&self.memo(), identity).await?;
        self.busy(&server)?;
        let Some(native) = server_action(action, power_state(server.power_state)) else {
            info!(self.log, "power action is a no-op";
                "uuid" => server.id.as_str(), "action" => %action);
            return Ok(());
        };
        self.backend(self.compute.server_action(&server.id, native).await)?;
        info!(self.log, "power action performed"; "uuid" => server.id.as_str(), "action" => %action);
        Ok(())
    }

    async fn get_boot_device(&self, identity: &str) -> Result<Option<BootDevice>, Error> {
        let server = self.server(&self.memo(), identity).await?;
        let pxe = server.metadata.get(PXE_FIRST).is_some_and(|v| v == "1");
        Ok(Some(if pxe { BootDevice::Pxe } else { BootDevice::Hdd }))
    }

    async fn set_boot_device(&self, identity: &str, device: BootDevice) -> Result<(), Error> {
        let server = self.server(&self.memo(), identity).await?;
        let value = match device {
            BootDevice::Pxe => Some("1"),
            BootDevice::Hdd => None,
            BootDevice::Cd | BootDevice::Floppy => {
                return Err(Error::not_supported(DRIVER, "set_boot_device"));
            }
        };
        self.backend(
            self.compute
                .set_server_metadata(&server.id, PXE_FIRST, value)
                .await,
        )?;
        info!(self.log, "boot device set"; "uuid" => server.id.as_str(), "device" => %device);
        Ok(())
    }

    async fn get_total_memory_gib(&self, identity: &str) -> Result<Option<u64>, Error> {
        Ok(self
            .flavor_of(identity)
            .await?
            .map(|flavor| mib_to_gib(flavor.ram_mb)))
    }

    async fn get_total_cpu_count(&self, identity: &str) -> Result<Option<u32>, Error> {
        Ok(self.flavor_of(identity).await?.map(|flavor| flavor.vcpus))
    }

    async fn get_bios(&self, identity: &str) -> Result<BiosAttributes, Error> {
        self.unsupported(identity, "get_bios").await
    }

    async fn set_bios(&self, identity: &str, _attributes: &BiosAttributes) -> Result<(), Error> {
        self.unsupported(identity, "set_bios").await
    }

    async fn reset_bios(&self, identity: &str) -> Result<(), Error> {
        self.unsupported(identity, "reset_bios").await
    }

    async fn get_nics(&self, identity: &str) -> Result<Vec<Nic>, Error> {
        let server = self.server(&self.memo(), identity).await?;
        Ok(server.macs.iter().map(Nic::from_mac).collect())
    }

    async fn get_boot_image(&self, identity: &str, _device: BootDevice) -> Result<BootImage, Error> {
        self.unsupported(identity, "get_boot_image").await
    }

    async fn set_boot_image(
        &self,
        identity: &str,
        _device: BootDevice,
        _image: Option<&str>,
        _write_protected: bool,
    ) -> Result<(), Error> {
        self.unsupported(identity, "set_boot_image").await
    }

    async fn get_simple_storage(&self, identity: &str) -> Result<SimpleStorageMap, Error> {
        self.unsupported(identity, "get_simple_storage").await
    }

    async fn find_or_create_storage_volume(
        &self,
        _descriptor: &VolumeDescriptor,
    ) -> Result<Option<String>, Error> {
        Err(Error::not_supported(DRIVER, "find_or_create_storage_volume"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redfish_emulator_backend_mock::compute::server;
    use redfish_emulator_backend_mock::compute::SHUTDOWN;
    use redfish_emulator_backend_mock::MockCompute;
    use slog::Discard;
    use tokio::test;

    const UUID: &str = "b5f7e1a4-3d1c-4a8e-9a3f-2c6d9e0f1a2b";

    fn driver(compute: &MockCompute, cache: PermanentCache) -> NovaDriver<MockCompute> {
        let config = NovaConfig {
            endpoint: "http://compute.test/v2.1".into(),
            token: None,
        };
        NovaDriver::new(&config, &Logger::root(Discard, o!()), compute.clone(), cache)
    }

    fn compute() -> MockCompute {
        let compute = MockCompute::new();
        compute.add_server(server(UUID, "node-1", SHUTDOWN));
        compute.add_flavor(Flavor {
            id: "f1".into(),
            ram_mb: 8192,
            vcpus: 4,
        });
        compute
    }

    #[test]
    async fn name_redirects_to_uuid() {
        let compute = compute();
        let driver = driver(&compute, PermanentCache::new());
        assert_eq!(
            driver.resolve_uuid(UUID).await.expect("resolved"),
            Resolution::Canonical(UUID.into())
        );
        assert_eq!(
            driver.resolve_uuid("node-1").await.expect("resolved"),
            Resolution::Redirect(UUID.into())
        );
        assert_eq!(
            driver.resolve_uuid("node-2").await.expect("resolved"),
            Resolution::NotFound
        );
    }

    #[test]
    async fn power_actions_map_to_server_actions() {
        let compute = compute();
        let driver = driver(&compute, PermanentCache::new());
        assert_eq!(driver.get_power_state(UUID).await.expect("read"), PowerState::Off);
        driver
            .set_power_state(UUID, ResetType::ForceOff)
            .await
            .expect("no-op");
        assert_eq!(compute.call_count("server_action"), 0);
        driver
            .set_power_state("node-1", ResetType::On)
            .await
            .expect("started");
        assert_eq!(compute.call_count("server_action"), 1);
        assert_eq!(driver.get_power_state(UUID).await.expect("read"), PowerState::On);
    }

    #[test]
    async fn busy_server_is_reported_as_busy() {
        let compute = compute();
        compute.set_task_state(UUID, Some("powering-on"));
        let driver = driver(&compute, PermanentCache::new());
        let err = driver
            .set_power_state(UUID, ResetType::On)
            .await
            .expect_err("busy");
        assert!(matches!(&err, Error::Backend(backend) if backend.is_busy()));
        assert_eq!(err.status().as_u16(), 503);
        assert_eq!(compute.call_count("server_action"), 0);
    }

    #[test]
    async fn boot_device_lives_in_metadata() {
        let compute = compute();
        let driver = driver(&compute, PermanentCache::new());
        assert_eq!(
            driver.get_boot_device(UUID).await.expect("read"),
            Some(BootDevice::Hdd)
        );
        driver
            .set_boot_device(UUID, BootDevice::Pxe)
            .await
            .expect("set");
        assert_eq!(
            compute
                .server(UUID)
                .and_then(|s| s.metadata.get(PXE_FIRST).cloned()),
            Some("1".to_string())
        );
        assert_eq!(
            driver.get_boot_device(UUID).await.expect("read"),
            Some(BootDevice::Pxe)
        );
        assert!(matches!(
            driver.set_boot_device(UUID, BootDevice::Cd).await,
            Err(Error::NotSupported { .. })
        ));
    }

    #[test]
    async fn flavors_are_cached_across_drivers() {
        let compute = compute();
        let cache = PermanentCache::new();
        let first = driver(&compute, cache.clone());
        assert_eq!(first.get_total_memory_gib(UUID).await.expect("read"), Some(8));
        let second = driver(&compute, cache);
        assert_eq!(second.get_total_cpu_count(UUID).await.expect("read"), Some(4));
        assert_eq!(compute.call_count("get_flavor"), 1);
    }

    #[test]
    async fn every_request_reads_the_server_again() {
        let compute = compute();
        let driver = driver(&compute, PermanentCache::new());
        assert_eq!(driver.get_power_state(UUID).await.expect("read"), PowerState::Off);
        compute.add_server(server(UUID, "node-1", RUNNING));
        assert_eq!(driver.get_power_state(UUID).await.expect("read"), PowerState::On);
        driver.get_nics(UUID).await.expect("read");
        assert_eq!(compute.call_count("get_server"), 3);
    }

    #[test]
    async fn server_created_after_miss_is_found() {
        const LATE: &str = "0c1d2e3f-4a5b-4c6d-8e7f-8091a2b3c4d5";
        let compute = compute();
        let driver = driver(&compute, PermanentCache::new());
        assert_eq!(
            driver.resolve_uuid(LATE).await.expect("resolved"),
            Resolution::NotFound
        );
        compute.add_server(server(LATE, "node-2", SHUTDOWN));
        assert_eq!(
            driver.resolve_uuid(LATE).await.expect("resolved"),
            Resolution::Canonical(LATE.into())
        );
        assert_eq!(
            driver.resolve_uuid("node-2").await.expect("resolved"),
            Resolution::Redirect(LATE.into())
        );
    }

    #[test]
    async fn unsupported_operations_check_identity_first() {
        let compute = compute();
        let driver = driver(&compute, PermanentCache::new());
        assert!(matches!(
            driver.get_bios(UUID).await,
            Err(Error::NotSupported { operation: "get_bios", .. })
        ));
        assert!(driver
            .get_bios("ghost")
            .await
            .is_err_and(|err| err.is_not_found()));
    }
}
