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

//! Resource identity resolution.
//!
//! Callers address entities by canonical UUID, by human readable name or by
//! a short identifier. Every valid identifier of an entity converges to the
//! same canonical UUID. Using a non-canonical identifier is reported as
//! [`Resolution::Redirect`] so the endpoint layer may redirect or warn,
//! while internal code that only needs the UUID calls
//! [`Resolution::require`].
//!
//! Resolution order:
//! 1. Identifier parses as UUID literal and matches a canonical UUID:
//!    [`Resolution::Canonical`].
//! 2. Identifier matches a name: [`Resolution::Redirect`].
//! 3. Identifier matches a short identifier: [`Resolution::Redirect`].
//! 4. Otherwise: [`Resolution::NotFound`].

use crate::EntityKind;
use crate::Error;
use uuid::Uuid;

/// Outcome of identity resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Requested identifier is the canonical UUID.
    Canonical(String),
    /// Requested identifier is a valid alias of the entity with this
    /// canonical UUID.
    Redirect(String),
    /// No entity matches.
    NotFound,
}

impl Resolution {
    /// Resolution of a backend that answered a name-or-UUID query
    /// directly. The entity is canonical only if it was requested by its
    /// canonical form.
    #[must_use]
    pub fn from_lookup(requested: &str, canonical: impl Into<String>) -> Self {
        let canonical = canonical.into();
        if same_identity(requested, &canonical) {
            Self::Canonical(canonical)
        } else {
            Self::Redirect(canonical)
        }
    }

    /// Canonical UUID if the entity was found.
    #[must_use]
    pub fn canonical(&self) -> Option<&str> {
        match self {
            Self::Canonical(uuid) | Self::Redirect(uuid) => Some(uuid),
            Self::NotFound => None,
        }
    }

    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }

    /// Canonical UUID of the entity, redirect or not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing matched.
    pub fn require(self, kind: EntityKind, identity: &str) -> Result<String, Error> {
        match self {
            Self::Canonical(uuid) | Self::Redirect(uuid) => Ok(uuid),
            Self::NotFound => Err(Error::not_found(kind, identity)),
        }
    }
}

/// Entity known by canonical UUID, optional name and optional short id.
pub trait Identifiable {
    fn uuid(&self) -> &str;

    fn name(&self) -> Option<&str> {
        None
    }

    fn short_id(&self) -> Option<&str> {
        None
    }
}

/// Resolve `identity` among a collection of entities.
pub fn resolve_among<'a, T, I>(identity: &str, entities: I) -> Resolution
where
    T: Identifiable + 'a,
    I: IntoIterator<Item = &'a T>,
    I::IntoIter: Clone,
{
    let entities = entities.into_iter();
    if let Some(found) = entities
        .clone()
        .find(|e| same_identity(identity, e.uuid()))
    {
        return Resolution::Canonical(found.uuid().to_string());
    }
    if let Some(found) = entities.clone().find(|e| e.name() == Some(identity)) {
        return Resolution::Redirect(found.uuid().to_string());
    }
    if let Some(found) = entities.clone().find(|e| e.short_id() == Some(identity)) {
        return Resolution::Redirect(found.uuid().to_string());
    }
    Resolution::NotFound
}

/// True if `identity` is a UUID literal.
#[must_use]
pub fn is_uuid(identity: &str) -> bool {
    Uuid::parse_str(identity).is_ok()
}

/// Compare requested identifier with canonical one. UUID literals are
/// compared by value, anything else textually.
#[must_use]
pub fn same_identity(requested: &str, canonical: &str) -> bool {
    if requested == canonical {
        return true;
    }
    match (Uuid::parse_str(requested), Uuid::parse_str(canonical)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
