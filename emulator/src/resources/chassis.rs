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

//! Chassis declared in configuration.

use crate::config::ChassisConfig;
use redfish_emulator_core::resolve_among;
use redfish_emulator_core::EntityKind;
use redfish_emulator_core::Error;
use redfish_emulator_core::Identifiable;
use redfish_emulator_core::Resolution;

/// Chassis served when configuration declares none.
pub const DEFAULT_CHASSIS_UUID: &str = "48295861-2522-3dc6-a6ad-ef3bbd6d7a2e";

impl Identifiable for ChassisConfig {
    fn uuid(&self) -> &str {
        self.uuid.as_deref().unwrap_or(&self.id)
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn short_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

pub struct StaticChassis {
    chassis: Vec<ChassisConfig>,
}

impl StaticChassis {
    /// Chassis of `config`, or a single chassis holding every system and
    /// manager if `config` is empty.
    #[must_use]
    pub fn new(config: &[ChassisConfig]) -> Self {
        let chassis = if config.is_empty() {
            vec![ChassisConfig {
                id: "Chassis-1".to_string(),
                name: "Chassis-1".to_string(),
                uuid: Some(DEFAULT_CHASSIS_UUID.to_string()),
                systems: Vec::new(),
                managers: Vec::new(),
            }]
        } else {
            config.to_vec()
        };
        Self { chassis }
    }

    /// Canonical UUIDs of all chassis.
    #[must_use]
    pub fn chassis(&self) -> Vec<String> {
        self.chassis.iter().map(|c| c.uuid().to_string()).collect()
    }

    #[must_use]
    pub fn resolve_uuid(&self, identity: &str) -> Resolution {
        resolve_among(identity, &self.chassis)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown identities.
    pub fn get(&self, identity: &str) -> Result<&ChassisConfig, Error> {
        let uuid = self.resolve_uuid(identity).require(EntityKind::Chassis, identity)?;
        self.chassis
            .iter()
            .find(|c| c.uuid() == uuid)
            .ok_or_else(|| Error::not_found(EntityKind::Chassis, identity))
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown identities.
    pub fn resolve_name(&self, identity: &str) -> Result<String, Error> {
        self.get(identity).map(|c| c.name.clone())
    }
}
