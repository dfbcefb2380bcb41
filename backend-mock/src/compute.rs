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

//! In-memory cloud compute API.

use crate::fault::lock;
use crate::fault::Faults;
use redfish_emulator_core::backend::ComputeApi;
use redfish_emulator_core::backend::Flavor;
use redfish_emulator_core::backend::Server;
use redfish_emulator_core::backend::ServerAction;
use redfish_emulator_core::backend::ServerSummary;
use redfish_emulator_core::BackendError;
use redfish_emulator_core::BackendErrorKind;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

/// Power state code of a running server.
pub const RUNNING: u8 = 1;
/// Power state code of a stopped server.
pub const SHUTDOWN: u8 = 4;

#[derive(Debug, Default)]
struct ComputeState {
    servers: BTreeMap<String, Server>,
    flavors: BTreeMap<String, Flavor>,
    calls: Vec<String>,
}

/// Compute API keeping servers in memory. Clones share state.
#[derive(Clone, Default)]
pub struct MockCompute {
    state: Arc<Mutex<ComputeState>>,
    faults: Arc<Faults>,
}

/// Server with sensible defaults for tests.
#[must_use]
pub fn server(id: &str, name: &str, power_state: u8) -> Server {
    Server {
        id: id.to_string(),
        name: name.to_string(),
        power_state,
        task_state: None,
        flavor_id: Some("f1".to_string()),
        metadata: BTreeMap::new(),
        macs: vec!["fa:16:3e:00:00:01".to_string()],
    }
}

impl MockCompute {
    const ENDPOINT: &'static str = "mock://compute";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_server(&self, server: Server) {
        lock(&self.state).servers.insert(server.id.clone(), server);
    }

    pub fn add_flavor(&self, flavor: Flavor) {
        lock(&self.state).flavors.insert(flavor.id.clone(), flavor);
    }

    #[must_use]
    pub fn server(&self, id: &str) -> Option<Server> {
        lock(&self.state).servers.get(id).cloned()
    }

    /// Mark a task as in progress on the server (`None` clears it).
    pub fn set_task_state(&self, id: &str, task_state: Option<&str>) {
        if let Some(server) = lock(&self.state).servers.get_mut(id) {
            server.task_state = task_state.map(str::to_string);
        }
    }

    /// Calls performed so far, as `operation:argument`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    /// Number of calls of `operation` performed so far.
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        let prefix = format!("{operation}:");
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| call.starts_with(&prefix))
            .count()
    }

    #[must_use]
    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    fn record(&self, operation: &'static str, arg: &str) -> Result<(), BackendError> {
        self.faults.check(Self::ENDPOINT, operation, Some(arg))?;
        lock(&self.state).calls.push(format!("{operation}:{arg}"));
        Ok(())
    }

    fn not_found(operation: &'static str, id: &str) -> BackendError {
        BackendError::new(
            Self::ENDPOINT,
            operation,
            BackendErrorKind::Protocol,
            format!("Instance {id} could not be found."),
        )
        .with_identity(id)
    }
}

impl ComputeApi for MockCompute {
    fn endpoint(&self) -> &str {
        Self::ENDPOINT
    }

    async fn list_servers(&self) -> Result<Vec<ServerSummary>, BackendError> {
        self.record("list_servers", "")?;
        Ok(lock(&self.state)
            .servers
            .values()
            .map(|server| ServerSummary {
                id: server.id.clone(),
                name: server.name.clone(),
            })
            .collect())
    }

    async fn get_server(&self, id: &str) -> Result<Option<Server>, BackendError> {
        self.record("get_server", id)?;
        Ok(lock(&self.state).servers.get(id).cloned())
    }

    async fn find_servers_by_name(&self, name: &str) -> Result<Vec<Server>, BackendError> {
        self.record("find_servers_by_name", name)?;
        Ok(lock(&self.state)
            .servers
            .values()
            .filter(|server| server.name == name)
            .cloned()
            .collect())
    }

    async fn get_flavor(&self, id: &str) -> Result<Option<Flavor>, BackendError> {
        self.record("get_flavor", id)?;
        Ok(lock(&self.state).flavors.get(id).cloned())
    }

    async fn server_action(&self, id: &str, action: ServerAction) -> Result<(), BackendError> {
        self.record("server_action", id)?;
        let mut state = lock(&self.state);
        let server = state
            .servers
            .get_mut(id)
            .ok_or_else(|| Self::not_found("server_action", id))?;
        if let Some(task) = &server.task_state {
            return Err(BackendError::new(
                Self::ENDPOINT,
                "server_action",
                BackendErrorKind::Busy,
                format!("Cannot perform action on instance while it is in task_state {task}"),
            )
            .with_identity(id));
        }
        match action {
            ServerAction::Start | ServerAction::SoftReboot | ServerAction::HardReboot => {
                server.power_state = RUNNING;
            }
            ServerAction::Stop => server.power_state = SHUTDOWN,
            ServerAction::CrashDump => {}
        }
        Ok(())
    }

    async fn set_server_metadata(
        &self,
        id: &str,
        key: &str,
        value: Option<&str>,
    ) -> Result<(), BackendError> {
        self.record("set_server_metadata", id)?;
        let mut state = lock(&self.state);
        let server = state
            .servers
            .get_mut(id)
            .ok_or_else(|| Self::not_found("set_server_metadata", id))?;
        match value {
            Some(value) => server.metadata.insert(key.to_string(), value.to_string()),
            None => server.metadata.remove(key),
        };
        Ok(())
    }
}
