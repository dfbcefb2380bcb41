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

//! Pseudo-resource state store.
//!
//! Holds emulator-only state for Redfish concepts the backend does not
//! model (indicator LEDs, virtual media, BIOS of backends without one,
//! volumes, fake systems). Values are opaque to the store. One store is
//! kept per [`StateCategory`]; [`StateDir`] opens them either as files
//! under the state directory or in memory.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::config::EmulatorConfig;
use redfish_emulator_core::Error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

#[derive(Debug)]
pub enum StoreError {
    KeyNotFound(String),
    Io(PathBuf, std::io::Error),
    Corrupt(PathBuf, serde_json::Error),
    Encode(serde_json::Error),
    Lock(String),
}

impl StoreError {
    pub(crate) fn lock<T>(err: PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::KeyNotFound(key) => write!(f, "key not found: {key}"),
            Self::Io(path, err) => write!(f, "state file {}: {err}", path.display()),
            Self::Corrupt(path, err) => write!(f, "corrupt state file {}: {err}", path.display()),
            Self::Encode(err) => write!(f, "cannot encode state: {err}"),
            Self::Lock(err) => write!(f, "lock error: {err}"),
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(_, err) => Some(err),
            Self::Corrupt(_, err) | Self::Encode(err) => Some(err),
            Self::KeyNotFound(_) | Self::Lock(_) => None,
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::storage(err)
    }
}

/// Durable mapping of keys to opaque values.
pub trait StateStore: Send + Sync {
    /// Value of `key`, [`StoreError::KeyNotFound`] if absent.
    ///
    /// # Errors
    ///
    /// Returns error if the key is absent or storage fails.
    fn get(&self, key: &str) -> Result<JsonValue, StoreError>;

    /// # Errors
    ///
    /// Returns error if storage fails.
    fn set(&self, key: &str, value: JsonValue) -> Result<(), StoreError>;

    /// Set many keys at once.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn update(&self, entries: BTreeMap<String, JsonValue>) -> Result<(), StoreError>;

    /// Remove `key`, [`StoreError::KeyNotFound`] if absent.
    ///
    /// # Errors
    ///
    /// Returns error if the key is absent or storage fails.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns error if storage fails.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// # Errors
    ///
    /// Returns error if storage fails.
    fn len(&self) -> Result<usize, StoreError>;

    /// # Errors
    ///
    /// Returns error if storage fails.
    fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().map(|len| len == 0)
    }
}

/// Category of pseudo-resource state. Each category is a separate store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StateCategory {
    Systems,
    VirtualMedia,
    Indicators,
    Bios,
    Volumes,
}

impl StateCategory {
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Systems => "systems.json",
            Self::VirtualMedia => "vmedia.json",
            Self::Indicators => "indicators.json",
            Self::Bios => "bios.json",
            Self::Volumes => "volumes.json",
        }
    }
}

/// Opens stores of every category. A category is opened once; later
/// calls return the same store.
pub struct StateDir {
    root: Option<PathBuf>,
    opened: Mutex<BTreeMap<StateCategory, Arc<dyn StateStore>>>,
}

impl StateDir {
    /// Stores kept as files under `root`.
    #[must_use]
    pub fn persistent(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            opened: Mutex::default(),
        }
    }

    /// Stores kept in memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            root: None,
            opened: Mutex::default(),
        }
    }

    #[must_use]
    pub fn from_config(config: &EmulatorConfig) -> Self {
        if config.persistent_state {
            Self::persistent(&config.state_dir)
        } else {
            Self::in_memory()
        }
    }

    /// Store of `category`.
    ///
    /// # Errors
    ///
    /// Returns error if the state file exists but cannot be read.
    pub fn open(&self, category: StateCategory) -> Result<Arc<dyn StateStore>, StoreError> {
        let mut opened = self.opened.lock().map_err(StoreError::lock)?;
        if let Some(store) = opened.get(&category) {
            return Ok(store.clone());
        }
        let store: Arc<dyn StateStore> = match &self.root {
            Some(root) => Arc::new(FileStore::open(root.join(category.file_name()))?),
            None => Arc::new(MemoryStore::new()),
        };
        opened.insert(category, store.clone());
        Ok(store)
    }
}

/// Store of typed values under serde-encoded keys.
///
/// Composite keys such as `(system uuid, device)` are encoded as JSON
/// text, so any serializable key works.
pub struct TypedStore<K, V> {
    store: Arc<dyn StateStore>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Clone for TypedStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

#[allow(clippy::missing_errors_doc)]
impl<K, V> TypedStore<K, V>
where
    K: Serialize,
    V: Serialize + DeserializeOwned,
{
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    fn key(key: &K) -> Result<String, StoreError> {
        serde_json::to_string(key).map_err(StoreError::Encode)
    }

    /// Value under `key`, `None` if absent.
    pub fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        match self.store.get(&Self::key(key)?) {
            Ok(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(StoreError::Encode),
            Err(StoreError::KeyNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Value under `key`, or `default()` if absent. The default is not
    /// stored.
    pub fn get_or_else(&self, key: &K, default: impl FnOnce() -> V) -> Result<V, StoreError> {
        Ok(self.get(key)?.unwrap_or_else(default))
    }

    pub fn set(&self, key: &K, value: &V) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(StoreError::Encode)?;
        self.store.set(&Self::key(key)?, value)
    }

    /// Remove value under `key`. Returns false if there was none.
    pub fn delete(&self, key: &K) -> Result<bool, StoreError> {
        match self.store.delete(&Self::key(key)?) {
            Ok(()) => Ok(true),
            Err(StoreError::KeyNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        self.store.len()
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        self.store.is_empty()
    }
}
