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

//! Failure injection for mock backends.

use redfish_emulator_core::BackendError;
use redfish_emulator_core::BackendErrorKind;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

/// Failure the next call of `operation` reports.
#[derive(Debug, Clone)]
pub struct Fault {
    pub operation: &'static str,
    pub kind: BackendErrorKind,
    pub message: String,
}

impl Fault {
    pub fn new(operation: &'static str, kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
        }
    }
}

/// Queue of injected failures. Faults are consumed in order: a call
/// fails only if the fault at the front of the queue names its
/// operation.
#[derive(Debug, Default)]
pub struct Faults {
    queue: Mutex<VecDeque<Fault>>,
}

impl Faults {
    pub fn inject(&self, fault: Fault) {
        lock(&self.queue).push_back(fault);
    }

    pub fn clear(&self) {
        lock(&self.queue).clear();
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Fail with the front fault if it targets `operation`.
    ///
    /// # Errors
    ///
    /// Returns the injected failure.
    pub fn check(
        &self,
        endpoint: &str,
        operation: &'static str,
        identity: Option<&str>,
    ) -> Result<(), BackendError> {
        let mut queue = lock(&self.queue);
        if queue.front().is_some_and(|f| f.operation == operation) {
            if let Some(fault) = queue.pop_front() {
                let err = BackendError::new(endpoint, operation, fault.kind, fault.message);
                return Err(match identity {
                    Some(identity) => err.with_identity(identity),
                    None => err,
                });
            }
        }
        Ok(())
    }
}

/// Mock state stays usable after a panicking test thread.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
