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

//! Notifier, image fetcher and clock doubles.

use crate::fault::lock;
use crate::fault::Faults;
use redfish_emulator_core::backend::FetchRequest;
use redfish_emulator_core::backend::FetchedImage;
use redfish_emulator_core::backend::ImageFetcher;
use redfish_emulator_core::backend::Notifier;
use redfish_emulator_core::backend::StateChange;
use redfish_emulator_core::BackendError;
use redfish_emulator_core::BackendErrorKind;
use redfish_emulator_core::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use time::Duration;
use time::OffsetDateTime;

/// Notifier remembering every event. Clones share events.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<StateChange>>>,
    faults: Arc<Faults>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<StateChange> {
        lock(&self.events).clone()
    }

    #[must_use]
    pub fn faults(&self) -> &Faults {
        &self.faults
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &StateChange) -> Result<(), BackendError> {
        self.faults
            .check("mock://notifier", "notify", Some(&event.uuid))?;
        lock(&self.events).push(event.clone());
        Ok(())
    }
}

/// Image fetcher serving images from memory.
#[derive(Clone, Default)]
pub struct MockFetcher {
    /// url -> (file name, content)
    images: Arc<Mutex<BTreeMap<String, (String, Vec<u8>)>>>,
    requests: Arc<Mutex<Vec<FetchRequest>>>,
}

impl MockFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_image(&self, url: &str, name: &str, content: &[u8]) {
        lock(&self.images).insert(url.to_string(), (name.to_string(), content.to_vec()));
    }

    /// Fetch requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<FetchRequest> {
        lock(&self.requests).clone()
    }
}

impl ImageFetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedImage, BackendError> {
        lock(&self.requests).push(request.clone());
        let error = |kind, message: String| BackendError::new(&request.url, "fetch_image", kind, message);
        let (name, content) = lock(&self.images)
            .get(&request.url)
            .cloned()
            .ok_or_else(|| error(BackendErrorKind::Protocol, "Invalid HTTP response: 404 Not Found".into()))?;
        let path = request.destination.join(&name);
        std::fs::create_dir_all(&request.destination)
            .and_then(|()| std::fs::write(&path, content))
            .map_err(|err| error(BackendErrorKind::Transport, err.to_string()))?;
        Ok(FetchedImage { name, path })
    }
}

/// Clock that moves only when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<OffsetDateTime>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(OffsetDateTime::UNIX_EPOCH + Duration::days(20_000))
    }
}

impl ManualClock {
    #[must_use]
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *lock(&self.now)
    }
}
