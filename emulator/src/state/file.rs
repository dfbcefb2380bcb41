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

use crate::state::StateStore;
use crate::state::StoreError;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

type Entries = BTreeMap<String, JsonValue>;

/// Store persisted as a JSON document.
///
/// The document is loaded when the store is opened and rewritten after
/// every change: the new content goes to a temporary file that then
/// replaces the document, so a crash leaves either the old or the new
/// state. A failed write leaves the in-memory state unchanged.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl FileStore {
    /// Open store backed by `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(content) => {
                serde_json::from_slice(&content).map_err(|err| StoreError::Corrupt(path.clone(), err))?
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Entries::new(),
            Err(err) => return Err(StoreError::Io(path, err)),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &Entries) -> Result<(), StoreError> {
        let io_err = |err| StoreError::Io(self.path.clone(), err);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let content = serde_json::to_vec_pretty(entries).map_err(StoreError::Encode)?;
        let mut file = File::create(&tmp).map_err(io_err)?;
        file.write_all(&content).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }

    fn modify<T>(&self, f: impl FnOnce(&mut Entries) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut entries = self.entries.lock().map_err(StoreError::lock)?;
        let mut next = entries.clone();
        let result = f(&mut next)?;
        self.persist(&next)?;
        *entries = next;
        Ok(result)
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Result<JsonValue, StoreError> {
        self.entries
            .lock()
            .map_err(StoreError::lock)?
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    fn set(&self, key: &str, value: JsonValue) -> Result<(), StoreError> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value);
            Ok(())
        })
    }

    fn update(&self, new_entries: BTreeMap<String, JsonValue>) -> Result<(), StoreError> {
        self.modify(|entries| {
            entries.extend(new_entries);
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.modify(|entries| {
            entries
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
        })
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .lock()
            .map_err(StoreError::lock)?
            .keys()
            .cloned()
            .collect())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.lock().map_err(StoreError::lock)?.len())
    }
}
