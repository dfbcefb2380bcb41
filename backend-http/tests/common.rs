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

#[cfg(feature = "reqwest")]
#[allow(dead_code)]
pub mod test_utils {
    use redfish_emulator_backend_http::reqwest::Client;
    use redfish_emulator_backend_http::ApiCredentials;
    use redfish_emulator_backend_http::BaremetalClient;
    use redfish_emulator_backend_http::ComputeClient;
    use serde_json::json;
    use serde_json::Value as JsonValue;
    use url::Url;
    use wiremock::MockServer;

    pub const TOKEN: &str = "test-token";

    pub fn create_test_credentials() -> ApiCredentials {
        ApiCredentials::token(TOKEN)
    }

    pub fn create_compute_client(mock_server: &MockServer) -> ComputeClient<Client> {
        let client = Client::new().unwrap();
        let endpoint = Url::parse(&format!("{}/v2.1", mock_server.uri())).unwrap();
        ComputeClient::new(client, endpoint, create_test_credentials())
    }

    pub fn create_baremetal_client(mock_server: &MockServer) -> BaremetalClient<Client> {
        let client = Client::new().unwrap();
        let endpoint = Url::parse(&mock_server.uri()).unwrap();
        BaremetalClient::new(client, endpoint, create_test_credentials())
    }

    pub fn server_json(id: &str, name: &str, power_state: u8) -> JsonValue {
        json!({
            "id": id,
            "name": name,
            "OS-EXT-STS:power_state": power_state,
            "OS-EXT-STS:task_state": null,
            "flavor": { "id": "f1", "links": [] },
            "metadata": {},
            "addresses": {
                "public": [
                    { "OS-EXT-IPS-MAC:mac_addr": "fa:16:3e:01:02:03", "addr": "10.0.0.5", "version": 4 }
                ]
            }
        })
    }

    pub mod ids {
        pub const SERVER_1: &str = "6c3b5a7e-2f0e-4e55-9d07-3b0e0c2f6a11";
        pub const NODE_1: &str = "1be26c0b-03f2-4d2e-ae87-c02d7f33c123";
    }
}
