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

use crate::backend_error;
use crate::ApiCredentials;
use crate::ApiEndpoint;
use crate::HttpClient;
use http::HeaderMap;
use redfish_emulator_core::backend::Notifier;
use redfish_emulator_core::backend::StateChange;
use redfish_emulator_core::BackendError;
use url::Url;

/// Posts every state change event as JSON to a fixed URL.
pub struct WebhookNotifier<C: HttpClient> {
    client: C,
    endpoint: ApiEndpoint,
    credentials: ApiCredentials,
}

impl<C: HttpClient> WebhookNotifier<C> {
    pub fn new(client: C, url: Url, credentials: ApiCredentials) -> Self {
        Self {
            client,
            endpoint: ApiEndpoint::new(url),
            credentials,
        }
    }
}

impl<C: HttpClient> Notifier for WebhookNotifier<C> {
    async fn notify(&self, event: &StateChange) -> Result<(), BackendError> {
        self.client
            .post(
                self.endpoint.base_url(),
                event,
                &self.credentials,
                &HeaderMap::new(),
            )
            .await
            .map_err(|err| backend_error(&self.endpoint, "notify", &err).with_identity(&event.uuid))
    }
}
