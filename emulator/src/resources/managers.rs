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

//! Managers (BMCs) of the emulated systems.
//!
//! Managers come from configuration. Without configuration every system
//! gets its own manager sharing the system UUID, named `<system>-Manager`,
//! that manages the system and sits in every chassis.

use crate::config::ManagerConfig;
use futures_util::future::try_join_all;
use redfish_emulator_core::resolve_among;
use redfish_emulator_core::EntityKind;
use redfish_emulator_core::Error;
use redfish_emulator_core::Identifiable;
use redfish_emulator_core::Resolution;
use redfish_emulator_core::SystemsDriver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manager {
    pub uuid: String,
    pub name: String,
    /// Managed systems, canonical UUIDs.
    pub systems: Vec<String>,
    /// Chassis the manager sits in.
    pub chassis: Vec<String>,
}

impl Identifiable for Manager {
    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

pub struct StaticManagers {
    config: Vec<ManagerConfig>,
    chassis: Vec<String>,
}

impl StaticManagers {
    /// Managers of `config`; per-system managers sit in `chassis`.
    #[must_use]
    pub fn new(config: &[ManagerConfig], chassis: Vec<String>) -> Self {
        Self {
            config: config.to_vec(),
            chassis,
        }
    }

    /// All managers.
    ///
    /// # Errors
    ///
    /// Returns error if systems of `driver` cannot be listed.
    pub async fn managers<S: SystemsDriver>(&self, driver: &S) -> Result<Vec<Manager>, Error> {
        if !self.config.is_empty() {
            return Ok(self
                .config
                .iter()
                .map(|m| Manager {
                    uuid: m.id.clone(),
                    name: m.name.clone(),
                    systems: m.systems.clone(),
                    chassis: if m.chassis.is_empty() {
                        self.chassis.clone()
                    } else {
                        m.chassis.clone()
                    },
                })
                .collect());
        }
        let systems = driver.systems().await?;
        let names = try_join_all(systems.iter().map(|uuid| driver.resolve_name(uuid))).await?;
        Ok(systems
            .into_iter()
            .zip(names)
            .map(|(uuid, name)| Manager {
                name: format!("{name}-Manager"),
                systems: vec![uuid.clone()],
                chassis: self.chassis.clone(),
                uuid,
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns error if systems of `driver` cannot be listed.
    pub async fn resolve_uuid<S: SystemsDriver>(
        &self,
        driver: &S,
        identity: &str,
    ) -> Result<Resolution, Error> {
        Ok(resolve_among(identity, &self.managers(driver).await?))
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown identities.
    pub async fn get<S: SystemsDriver>(&self, driver: &S, identity: &str) -> Result<Manager, Error> {
        let managers = self.managers(driver).await?;
        let uuid = resolve_among(identity, &managers).require(EntityKind::Manager, identity)?;
        managers
            .into_iter()
            .find(|m| m.uuid == uuid)
            .ok_or_else(|| Error::not_found(EntityKind::Manager, identity))
    }
}
