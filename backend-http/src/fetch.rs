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

//! Virtual media image downloads.

use crate::reqwest::Client;
use crate::reqwest::ClientParams;
use crate::reqwest::HttpError;
use crate::ApiCredentials;
use crate::ClassifiedError;
use futures_util::StreamExt;
use http::header::CONTENT_DISPOSITION;
use http::HeaderMap;
use redfish_emulator_core::backend::FetchRequest;
use redfish_emulator_core::backend::FetchedImage;
use redfish_emulator_core::backend::ImageFetcher;
use redfish_emulator_core::BackendError;
use redfish_emulator_core::BackendErrorKind;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;

const FALLBACK_NAME: &str = "image.iso";

/// Downloads images over HTTP(S) into the requested directory.
#[derive(Debug, Clone, Default)]
pub struct HttpImageFetcher {
    params: ClientParams,
}

impl HttpImageFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `params` as the base of every download client. TLS
    /// verification settings are taken from the fetch request.
    #[must_use]
    pub const fn with_params(params: ClientParams) -> Self {
        Self { params }
    }

    async fn download(&self, url: Url, request: &FetchRequest) -> Result<FetchedImage, HttpError> {
        let mut params = self.params.clone().accept_invalid_certs(!request.verify);
        if let Some(pem) = &request.ca_certificate {
            params = params.root_certificate_pem(pem.as_bytes());
        }
        let client = Client::with_params(params)?;
        let credentials = match (&request.username, &request.password) {
            (Some(username), password) => {
                ApiCredentials::basic(username, password.clone().unwrap_or_default())
            }
            (None, _) => ApiCredentials::Anonymous,
        };

        let response = client.get_response(url.clone(), &credentials).await?;
        let name = disposition_file_name(response.headers())
            .or_else(|| url_file_name(&url))
            .unwrap_or_else(|| FALLBACK_NAME.to_string());

        std::fs::create_dir_all(&request.destination)?;
        let path = request.destination.join(&name);
        if let Err(err) = write_body(response, &path).await {
            let _ = std::fs::remove_file(&path);
            return Err(err);
        }
        Ok(FetchedImage { name, path })
    }
}

async fn write_body(response: reqwest::Response, path: &Path) -> Result<(), HttpError> {
    let mut file = File::create(path)?;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        file.write_all(&chunk?)?;
    }
    file.flush()?;
    Ok(())
}

/// Keep only the last path component so a server cannot place the file
/// outside of the destination directory.
fn safe_file_name(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

fn disposition_file_name(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    value
        .split(';')
        .filter_map(|part| part.trim().strip_prefix("filename="))
        .map(|name| name.trim_matches('"'))
        .find_map(safe_file_name)
}

fn url_file_name(url: &Url) -> Option<String> {
    url.path_segments()?
        .next_back()
        .and_then(safe_file_name)
}

impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedImage, BackendError> {
        let url = Url::parse(&request.url).map_err(|err| {
            BackendError::new(
                &request.url,
                "fetch_image",
                BackendErrorKind::Protocol,
                err.to_string(),
            )
        })?;
        self.download(url, request)
            .await
            .map_err(|err| BackendError::new(&request.url, "fetch_image", err.kind(), err.to_string()))
    }
}
