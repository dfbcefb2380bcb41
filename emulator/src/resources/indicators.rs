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

//! Indicator LEDs.
//!
//! The state of an indicator is created lazily: an entity that was never
//! set reads its configured initial state, or the default state. States are
//! keyed by the canonical UUID of their system or chassis; resolve aliases
//! before calling in (see [`crate::resources::Resources::indicator`]).

use crate::config::IndicatorsConfig;
use crate::state::StateCategory;
use crate::state::StateDir;
use crate::state::TypedStore;
use redfish_emulator_core::Error;
use redfish_emulator_core::IndicatorLed;
use slog::info;
use slog::o;
use slog::Logger;
use std::collections::BTreeMap;

pub struct StaticIndicators {
    log: Logger,
    default_state: IndicatorLed,
    initial: BTreeMap<String, IndicatorLed>,
    states: TypedStore<String, IndicatorLed>,
}

impl StaticIndicators {
    /// # Errors
    ///
    /// Returns error if the indicator store cannot be opened.
    pub fn new(config: &IndicatorsConfig, log: &Logger, state: &StateDir) -> Result<Self, Error> {
        Ok(Self {
            log: log.new(o!("resource" => "indicators")),
            default_state: config.default_state,
            initial: config.states.clone(),
            states: TypedStore::new(state.open(StateCategory::Indicators)?),
        })
    }

    /// Indicator of the entity with canonical `uuid`. The initial state
    /// may be configured under the UUID or any of `aliases`.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub fn get(&self, uuid: &str, aliases: &[&str]) -> Result<IndicatorLed, Error> {
        let initial = std::iter::once(uuid)
            .chain(aliases.iter().copied())
            .find_map(|key| self.initial.get(key).copied())
            .unwrap_or(self.default_state);
        Ok(self.states.get_or_else(&uuid.to_string(), || initial)?)
    }

    /// # Errors
    ///
    /// Returns error if the store fails.
    pub fn set(&self, uuid: &str, state: IndicatorLed) -> Result<(), Error> {
        self.states.set(&uuid.to_string(), &state)?;
        info!(self.log, "indicator set"; "uuid" => uuid, "state" => %state);
        Ok(())
    }

    /// Set indicator from its Redfish token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadRequest`] for unknown tokens.
    pub fn set_token(&self, uuid: &str, token: &str) -> Result<(), Error> {
        self.set(uuid, token.parse()?)
    }
}
