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

//! Storage controllers and drives declared in configuration.

use crate::config::DriveConfig;
use crate::config::StorageConfig;
use crate::systems::SystemRef;
use redfish_emulator_core::EntityKind;
use redfish_emulator_core::Error;
use std::collections::BTreeMap;

pub struct StaticStorage {
    storage: BTreeMap<String, Vec<StorageConfig>>,
}

impl StaticStorage {
    /// Storage of `config`, keyed by any identifier of the system.
    #[must_use]
    pub fn new(config: &BTreeMap<String, Vec<StorageConfig>>) -> Self {
        Self {
            storage: config.clone(),
        }
    }

    /// Storage controllers of `system`. Empty if none configured.
    #[must_use]
    pub fn storage(&self, system: &SystemRef) -> &[StorageConfig] {
        self.storage
            .iter()
            .find(|(key, _)| system.matches(key))
            .map(|(_, storage)| storage.as_slice())
            .unwrap_or_default()
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `system` has no such storage.
    pub fn get(&self, system: &SystemRef, storage_id: &str) -> Result<&StorageConfig, Error> {
        self.storage(system)
            .iter()
            .find(|storage| storage.id == storage_id)
            .ok_or_else(|| Error::not_found(EntityKind::Storage, storage_id))
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the storage or the drive is unknown.
    pub fn drive(
        &self,
        system: &SystemRef,
        storage_id: &str,
        drive_id: &str,
    ) -> Result<&DriveConfig, Error> {
        self.get(system, storage_id)?
            .drives
            .iter()
            .find(|drive| drive.id == drive_id)
            .ok_or_else(|| Error::not_found(EntityKind::Storage, drive_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_is_keyed_by_any_system_identifier() {
        let config = BTreeMap::from([(
            "node-1".to_string(),
            vec![StorageConfig {
                id: "1".into(),
                name: "Local Storage Controller".into(),
                drives: vec![DriveConfig {
                    id: "32ADF365C6C1B7BD".into(),
                    name: "Drive Sample".into(),
                    capacity_bytes: 899_527_000_000,
                    protocol: Some("SAS".into()),
                }],
            }],
        )]);
        let storage = StaticStorage::new(&config);
        let system = SystemRef {
            uuid: "27946b59-9e44-4fa7-8e91-f3527a1ef094".into(),
            name: "node-1".into(),
        };
        assert_eq!(storage.storage(&system).len(), 1);
        assert_eq!(
            storage
                .drive(&system, "1", "32ADF365C6C1B7BD")
                .expect("present")
                .capacity_bytes,
            899_527_000_000
        );
        assert!(storage.get(&system, "2").is_err_and(|err| err.is_not_found()));
        let other = SystemRef {
            uuid: "8d2b1a3c-5e4f-4a6b-9c7d-0e1f2a3b4c5d".into(),
            name: "node-2".into(),
        };
        assert!(storage.storage(&other).is_empty());
    }
}
