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

//! Memoization of backend calls.
//!
//! A [`Memo`] maps the full argument tuple of a call ([`CallKey`]) to its
//! type-erased result. It has two scopes:
//!
//! - [`CacheScope::Session`]: lives as long as the [`Memo`]. Drivers create
//!   a memo per contract call, so the next request reads the backend
//!   again and sees changes made behind the emulator's back.
//! - [`CacheScope::Permanent`]: stored in a [`PermanentCache`] injected at
//!   construction and shared by every memo (and driver instance) that was
//!   given the same cache. Entries are never expired by time; they go away
//!   only on [`PermanentCache::clear`] or when the process exits. Use it
//!   for data the backend exposes as immutable (flavors, properties).
//!
//! Absent entities are never memoized: an entity created after a miss is
//! found by the next lookup.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::sync::RwLock;

type Erased = Arc<dyn Any + Send + Sync>;
type ErasedMap = HashMap<CallKey, Erased>;

/// Operation name with the full argument tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallKey {
    operation: &'static str,
    args: Vec<String>,
}

impl CallKey {
    #[must_use]
    pub fn new<I, S>(operation: &'static str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operation,
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Lifetime of a memoized entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    Session,
    Permanent,
}

/// Process-wide cache shared explicitly between driver instances.
#[derive(Clone, Default)]
pub struct PermanentCache {
    entries: Arc<RwLock<ErasedMap>>,
}

impl PermanentCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Debug for PermanentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermanentCache")
            .field("len", &self.len())
            .finish()
    }
}

/// Memoization cache of one request.
#[derive(Default)]
pub struct Memo {
    session: RwLock<ErasedMap>,
    permanent: PermanentCache,
}

impl Memo {
    /// Create cache backed by `permanent` for permanent entries.
    #[must_use]
    pub fn new(permanent: PermanentCache) -> Self {
        Self {
            session: RwLock::new(HashMap::new()),
            permanent,
        }
    }

    fn map(&self, scope: CacheScope) -> &RwLock<ErasedMap> {
        match scope {
            CacheScope::Session => &self.session,
            CacheScope::Permanent => &self.permanent.entries,
        }
    }

    /// Cached value of the call, if present and of type `T`.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self, scope: CacheScope, key: &CallKey) -> Option<Arc<T>> {
        let erased = self.map(scope).read().ok()?.get(key).cloned()?;
        erased.downcast::<T>().ok()
    }

    /// Store result of the call.
    pub fn put<T: Send + Sync + 'static>(&self, scope: CacheScope, key: CallKey, value: Arc<T>) {
        if let Ok(mut map) = self.map(scope).write() {
            map.insert(key, value as Erased);
        }
    }

    /// Return cached result of the call or perform it with `f` and cache
    /// the successful result. Errors are never cached.
    ///
    /// # Errors
    ///
    /// Returns error produced by `f`.
    pub async fn get_or_try_insert_with<T, E, F, Fut>(
        &self,
        scope: CacheScope,
        key: CallKey,
        f: F,
    ) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(scope, &key) {
            return Ok(cached);
        }
        let value = Arc::new(f().await?);
        self.put(scope, key, value.clone());
        Ok(value)
    }

    /// Like [`Memo::get_or_try_insert_with`] for lookups that may find
    /// nothing. Only found values are cached, so a miss is retried.
    ///
    /// # Errors
    ///
    /// Returns error produced by `f`.
    pub async fn get_or_try_insert_some<T, E, F, Fut>(
        &self,
        scope: CacheScope,
        key: CallKey,
        f: F,
    ) -> Result<Option<Arc<T>>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        if let Some(cached) = self.get::<T>(scope, &key) {
            return Ok(Some(cached));
        }
        let Some(value) = f().await? else {
            return Ok(None);
        };
        let value = Arc::new(value);
        self.put(scope, key, value.clone());
        Ok(Some(value))
    }

    /// Permanent cache this memo writes to.
    #[must_use]
    pub const fn permanent(&self) -> &PermanentCache {
        &self.permanent
    }
}
