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

//! Power state vocabulary and the pending power transition simulator.
//!
//! Real BMCs do not flip power instantaneously. The simulator attaches a
//! [`PendingPower`] to a [`PowerRecord`] and resolves it lazily: every
//! read path calls [`resolve`] with the current time, which applies the
//! transition once its apply time has passed. No timer or background task
//! is involved.
//!
//! ```text
//!   Off --On/ForceOn--> Off+Pending(On) --t >= apply_at--> On
//!   On --ForceOff/GracefulShutdown--> On+Pending(Off) --t >= apply_at--> Off
//!   On --*Restart--> Off+Pending(*Restart) --t >= apply_at--> On
//! ```

use crate::Error;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::str::FromStr;
use time::Duration;
use time::OffsetDateTime;

/// Observable power state of a system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    On,
    Off,
    Unknown,
}

impl Display for PowerState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::On => "On".fmt(f),
            Self::Off => "Off".fmt(f),
            Self::Unknown => "Unknown".fmt(f),
        }
    }
}

/// Reset action accepted at the Redfish boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResetType {
    On,
    ForceOn,
    ForceOff,
    GracefulShutdown,
    GracefulRestart,
    ForceRestart,
    Nmi,
}

impl ResetType {
    /// All accepted reset types, in the order they are advertised.
    pub const ALL: [Self; 7] = [
        Self::On,
        Self::ForceOn,
        Self::ForceOff,
        Self::GracefulShutdown,
        Self::GracefulRestart,
        Self::ForceRestart,
        Self::Nmi,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "On",
            Self::ForceOn => "ForceOn",
            Self::ForceOff => "ForceOff",
            Self::GracefulShutdown => "GracefulShutdown",
            Self::GracefulRestart => "GracefulRestart",
            Self::ForceRestart => "ForceRestart",
            Self::Nmi => "Nmi",
        }
    }

    /// Steady state the action eventually leads to. `None` for actions
    /// that do not change power state.
    #[must_use]
    pub const fn resolved_state(self) -> Option<PowerState> {
        match self {
            Self::On | Self::ForceOn | Self::GracefulRestart | Self::ForceRestart => {
                Some(PowerState::On)
            }
            Self::ForceOff | Self::GracefulShutdown => Some(PowerState::Off),
            Self::Nmi => None,
        }
    }

    #[must_use]
    pub const fn is_restart(self) -> bool {
        matches!(self, Self::GracefulRestart | Self::ForceRestart)
    }
}

impl Display for ResetType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.as_str().fmt(f)
    }
}

impl FromStr for ResetType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| Error::bad_request(format!("unknown reset type: {s}")))
    }
}

/// Scheduled power change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPower {
    /// Action that scheduled the change.
    pub action: ResetType,
    /// Unix timestamp (seconds) at which the change becomes visible.
    pub apply_at: i64,
}

/// Power part of a system record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerRecord {
    pub power_state: PowerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingPower>,
}

impl PowerRecord {
    #[must_use]
    pub const fn steady(power_state: PowerState) -> Self {
        Self {
            power_state,
            pending: None,
        }
    }
}

/// Apply pending transition of `record` if it is due at `now`.
///
/// Returns the resolved record and whether anything changed.
#[must_use]
pub fn resolve(record: &PowerRecord, now: OffsetDateTime) -> (PowerRecord, bool) {
    match record.pending {
        Some(pending) if now.unix_timestamp() >= pending.apply_at => {
            let power_state = pending
                .action
                .resolved_state()
                .unwrap_or(record.power_state);
            (PowerRecord::steady(power_state), true)
        }
        _ => (*record, false),
    }
}

/// Schedule `action` on `record`, to become visible after `delay`.
///
/// Returns the new record and whether anything changed. Restarts flip the
/// visible state to `Off` immediately. Requests whose target equals the
/// current steady state create no transition and cancel a pending one.
#[must_use]
pub fn request(
    record: &PowerRecord,
    action: ResetType,
    now: OffsetDateTime,
    delay: Duration,
) -> (PowerRecord, bool) {
    let (mut next, resolved) = resolve(record, now);
    let Some(target) = action.resolved_state() else {
        return (next, resolved);
    };
    let mut changed = resolved;
    if action.is_restart() && next.power_state != PowerState::Off {
        next.power_state = PowerState::Off;
        changed = true;
    }
    if next.power_state == target {
        changed |= next.pending.take().is_some();
        return (next, changed);
    }
    next.pending = Some(PendingPower {
        action,
        apply_at: (now + delay).unix_timestamp(),
    });
    (next, true)
}

/// Source of current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
