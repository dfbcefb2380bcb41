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

//! Storage volumes.
//!
//! Volumes of a (system, storage) pair are seeded from configuration on
//! first access and persisted afterwards.

use crate::state::StateCategory;
use crate::state::StateDir;
use crate::state::TypedStore;
use crate::systems::SystemRef;
use redfish_emulator_core::EntityKind;
use redfish_emulator_core::Error;
use redfish_emulator_core::VolumeDescriptor;
use slog::info;
use slog::o;
use slog::Logger;
use std::collections::BTreeMap;

type VolumeSeed = BTreeMap<String, BTreeMap<String, Vec<VolumeDescriptor>>>;

pub struct StaticVolumes {
    log: Logger,
    seed: VolumeSeed,
    volumes: TypedStore<(String, String), Vec<VolumeDescriptor>>,
}

impl StaticVolumes {
    /// # Errors
    ///
    /// Returns error if the volume store cannot be opened.
    pub fn new(config: &VolumeSeed, log: &Logger, state: &StateDir) -> Result<Self, Error> {
        Ok(Self {
            log: log.new(o!("resource" => "volumes")),
            seed: config.clone(),
            volumes: TypedStore::new(state.open(StateCategory::Volumes)?),
        })
    }

    fn seeded(&self, system: &SystemRef, storage_id: &str) -> Vec<VolumeDescriptor> {
        self.seed
            .iter()
            .find(|(key, _)| system.matches(key))
            .and_then(|(_, storage)| storage.get(storage_id))
            .cloned()
            .unwrap_or_default()
    }

    fn key(system: &SystemRef, storage_id: &str) -> (String, String) {
        (system.uuid.clone(), storage_id.to_string())
    }

    /// # Errors
    ///
    /// Returns error if the store fails.
    pub fn list(&self, system: &SystemRef, storage_id: &str) -> Result<Vec<VolumeDescriptor>, Error> {
        Ok(self
            .volumes
            .get_or_else(&Self::key(system, storage_id), || {
                self.seeded(system, storage_id)
            })?)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown volumes.
    pub fn get(
        &self,
        system: &SystemRef,
        storage_id: &str,
        volume_id: &str,
    ) -> Result<VolumeDescriptor, Error> {
        self.list(system, storage_id)?
            .into_iter()
            .find(|volume| volume.id == volume_id)
            .ok_or_else(|| Error::not_found(EntityKind::Volume, volume_id))
    }

    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if a volume with the same id exists.
    pub fn add(
        &self,
        system: &SystemRef,
        storage_id: &str,
        volume: VolumeDescriptor,
    ) -> Result<(), Error> {
        let mut volumes = self.list(system, storage_id)?;
        if volumes.iter().any(|v| v.id == volume.id) {
            return Err(Error::Conflict(format!("volume {} already exists", volume.id)));
        }
        info!(self.log, "volume added";
            "system" => system.uuid.as_str(), "storage" => storage_id, "volume" => volume.id.as_str());
        volumes.push(volume);
        Ok(self.volumes.set(&Self::key(system, storage_id), &volumes)?)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown volumes.
    pub fn delete(&self, system: &SystemRef, storage_id: &str, volume_id: &str) -> Result<(), Error> {
        let mut volumes = self.list(system, storage_id)?;
        let count = volumes.len();
        volumes.retain(|v| v.id != volume_id);
        if volumes.len() == count {
            return Err(Error::not_found(EntityKind::Volume, volume_id));
        }
        self.volumes.set(&Self::key(system, storage_id), &volumes)?;
        info!(self.log, "volume deleted";
            "system" => system.uuid.as_str(), "storage" => storage_id, "volume" => volume_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slog::Discard;

    fn volume(id: &str) -> VolumeDescriptor {
        VolumeDescriptor {
            id: id.into(),
            name: format!("Sample Volume {id}"),
            volume_type: Some("Mirrored".into()),
            capacity_bytes: 23_748_636_672,
            pool_name: None,
            volume_name: None,
        }
    }

    #[test]
    fn seeded_then_persisted() {
        let system = SystemRef {
            uuid: "27946b59-9e44-4fa7-8e91-f3527a1ef094".into(),
            name: "node-1".into(),
        };
        let seed = BTreeMap::from([(
            "node-1".to_string(),
            BTreeMap::from([("1".to_string(), vec![volume("1")])]),
        )]);
        let volumes = StaticVolumes::new(&seed, &Logger::root(Discard, o!()), &StateDir::in_memory())
            .expect("opened");
        assert_eq!(volumes.list(&system, "1").expect("list"), vec![volume("1")]);
        assert!(volumes.list(&system, "2").expect("list").is_empty());

        volumes.add(&system, "1", volume("2")).expect("added");
        assert!(matches!(
            volumes.add(&system, "1", volume("2")),
            Err(Error::Conflict(_))
        ));
        volumes.delete(&system, "1", "1").expect("deleted");
        assert_eq!(volumes.list(&system, "1").expect("list"), vec![volume("2")]);
        assert!(volumes
            .delete(&system, "1", "1")
            .is_err_and(|err| err.is_not_found()));
        assert!(volumes.get(&system, "1", "2").is_ok());
    }
}
