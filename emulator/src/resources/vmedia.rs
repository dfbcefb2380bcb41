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

//! Virtual media devices.
//!
//! Each (system, device) pair has a [`MediaRecord`] in the state store.
//! Inserting media downloads the image into the image directory through
//! an [`ImageFetcher`]. Ejecting resets the record to defaults and removes
//! the local copy, but keeps the TLS verification settings and the CA
//! certificate. A device holds at most one certificate, with id
//! [`CERTIFICATE_ID`].

use crate::config::VirtualMediaConfig;
use crate::config::VirtualMediaDeviceConfig;
use crate::state::StateCategory;
use crate::state::StateDir;
use crate::state::TypedStore;
use crate::systems::backend_failure;
use redfish_emulator_core::backend::FetchRequest;
use redfish_emulator_core::backend::ImageFetcher;
use redfish_emulator_core::EntityKind;
use redfish_emulator_core::Error;
use serde::Deserialize;
use serde::Serialize;
use slog::info;
use slog::o;
use slog::warn;
use slog::Logger;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Id of the single certificate a device holds.
pub const CERTIFICATE_ID: &str = "Default";

/// Only certificate type accepted.
pub const CERTIFICATE_TYPE: &str = "PEM";

/// State of a virtual media device of a system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MediaRecord {
    /// Image URL as requested.
    pub image: Option<String>,
    pub image_name: Option<String>,
    pub inserted: bool,
    pub write_protected: bool,
    pub user_name: Option<String>,
    pub password: Option<String>,
    /// Verify TLS certificate of the image server.
    pub verify: bool,
    /// PEM encoded CA certificate.
    pub certificate: Option<String>,
    /// Local copy of the image.
    pub image_path: Option<PathBuf>,
}

impl MediaRecord {
    /// Record after ejection: defaults, with TLS settings kept.
    #[must_use]
    fn ejected(&self) -> Self {
        Self {
            verify: self.verify,
            certificate: self.certificate.clone(),
            ..Self::default()
        }
    }
}

/// Certificate of a device as listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub id: &'static str,
    pub string: String,
    pub certificate_type: &'static str,
}

/// Parameters of an insert media request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertMedia {
    pub image: String,
    pub inserted: bool,
    pub write_protected: bool,
    pub user_name: Option<String>,
    pub password: Option<String>,
}

pub struct StaticVirtualMedia<F> {
    log: Logger,
    devices: BTreeMap<String, VirtualMediaDeviceConfig>,
    image_dir: PathBuf,
    records: TypedStore<(String, String), MediaRecord>,
    fetcher: F,
}

impl<F: ImageFetcher> StaticVirtualMedia<F> {
    /// Devices of `config`, downloading images into `image_dir` with
    /// `fetcher`.
    ///
    /// # Errors
    ///
    /// Returns error if the media store cannot be opened.
    pub fn new(
        config: &VirtualMediaConfig,
        image_dir: PathBuf,
        log: &Logger,
        state: &StateDir,
        fetcher: F,
    ) -> Result<Self, Error> {
        Ok(Self {
            log: log.new(o!("resource" => "vmedia")),
            devices: config.devices.clone(),
            image_dir,
            records: TypedStore::new(state.open(StateCategory::VirtualMedia)?),
            fetcher,
        })
    }

    /// Ids of all devices.
    #[must_use]
    pub fn devices(&self) -> Vec<String> {
        self.devices.keys().cloned().collect()
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown devices.
    pub fn device(&self, device: &str) -> Result<&VirtualMediaDeviceConfig, Error> {
        self.devices
            .get(device)
            .ok_or_else(|| Error::not_found(EntityKind::VirtualMedia, device))
    }

    fn key(&self, system: &str, device: &str) -> Result<(String, String), Error> {
        self.device(device)?;
        Ok((system.to_string(), device.to_string()))
    }

    /// Record of `device` of `system`. `system` is a canonical UUID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown devices and store errors.
    pub fn get(&self, system: &str, device: &str) -> Result<MediaRecord, Error> {
        let key = self.key(system, device)?;
        Ok(self.records.get_or_else(&key, MediaRecord::default)?)
    }

    fn put(&self, key: &(String, String), record: &MediaRecord) -> Result<(), Error> {
        Ok(self.records.set(key, record)?)
    }

    /// Download `request.image` and record it as inserted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if media is already inserted, and
    /// [`Error::Backend`] if the download fails.
    pub async fn insert(
        &self,
        system: &str,
        device: &str,
        request: InsertMedia,
    ) -> Result<MediaRecord, Error> {
        let key = self.key(system, device)?;
        let current = self.records.get_or_else(&key, MediaRecord::default)?;
        if current.inserted {
            return Err(Error::Conflict(format!(
                "media already inserted in {device} of {system}"
            )));
        }
        let fetch = FetchRequest {
            url: request.image.clone(),
            username: request.user_name.clone(),
            password: request.password.clone(),
            verify: current.verify,
            ca_certificate: current.certificate.clone(),
            destination: self.image_dir.clone(),
        };
        let fetched = self
            .fetcher
            .fetch(&fetch)
            .await
            .map_err(|err| backend_failure(&self.log, err))?;
        let record = MediaRecord {
            image: Some(request.image),
            image_name: Some(fetched.name),
            inserted: request.inserted,
            write_protected: request.write_protected,
            user_name: request.user_name,
            password: request.password,
            verify: current.verify,
            certificate: current.certificate,
            image_path: Some(fetched.path),
        };
        self.put(&key, &record)?;
        info!(self.log, "media inserted";
            "system" => system,
            "device" => device,
            "image" => record.image.as_deref().unwrap_or(""));
        Ok(record)
    }

    /// Reset the record and remove the local image. Returns the record
    /// before ejection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown devices and store errors.
    pub fn eject(&self, system: &str, device: &str) -> Result<MediaRecord, Error> {
        let key = self.key(system, device)?;
        let current = self.records.get_or_else(&key, MediaRecord::default)?;
        if let Some(path) = &current.image_path {
            if let Err(err) = std::fs::remove_file(path) {
                warn!(self.log, "cannot remove image";
                    "path" => %path.display(), "error" => %err);
            }
        }
        self.put(&key, &current.ejected())?;
        info!(self.log, "media ejected"; "system" => system, "device" => device);
        Ok(current)
    }

    /// Enable or disable TLS verification of image downloads.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown devices and store errors.
    pub fn set_verify(&self, system: &str, device: &str, verify: bool) -> Result<(), Error> {
        let key = self.key(system, device)?;
        let mut record = self.records.get_or_else(&key, MediaRecord::default)?;
        record.verify = verify;
        self.put(&key, &record)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown devices and store errors.
    pub fn list_certificates(&self, system: &str, device: &str) -> Result<Vec<Certificate>, Error> {
        let record = self.get(system, device)?;
        Ok(record
            .certificate
            .into_iter()
            .map(|string| Certificate {
                id: CERTIFICATE_ID,
                string,
                certificate_type: CERTIFICATE_TYPE,
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the device already has a
    /// certificate and [`Error::BadRequest`] for types other than PEM.
    pub fn add_certificate(
        &self,
        system: &str,
        device: &str,
        pem: &str,
        certificate_type: &str,
    ) -> Result<Certificate, Error> {
        check_type(certificate_type)?;
        let key = self.key(system, device)?;
        let mut record = self.records.get_or_else(&key, MediaRecord::default)?;
        if record.certificate.is_some() {
            return Err(Error::Conflict(format!(
                "certificate already present in {device} of {system}"
            )));
        }
        record.certificate = Some(pem.to_string());
        self.put(&key, &record)?;
        info!(self.log, "certificate added"; "system" => system, "device" => device);
        Ok(Certificate {
            id: CERTIFICATE_ID,
            string: pem.to_string(),
            certificate_type: CERTIFICATE_TYPE,
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the device has no certificate `id`.
    pub fn replace_certificate(
        &self,
        system: &str,
        device: &str,
        id: &str,
        pem: &str,
        certificate_type: &str,
    ) -> Result<Certificate, Error> {
        check_type(certificate_type)?;
        let key = self.key(system, device)?;
        let mut record = self.records.get_or_else(&key, MediaRecord::default)?;
        if id != CERTIFICATE_ID || record.certificate.is_none() {
            return Err(Error::not_found(EntityKind::Certificate, id));
        }
        record.certificate = Some(pem.to_string());
        self.put(&key, &record)?;
        info!(self.log, "certificate replaced"; "system" => system, "device" => device);
        Ok(Certificate {
            id: CERTIFICATE_ID,
            string: pem.to_string(),
            certificate_type: CERTIFICATE_TYPE,
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the device has no certificate `id`.
    pub fn delete_certificate(&self, system: &str, device: &str, id: &str) -> Result<(), Error> {
        let key = self.key(system, device)?;
        let mut record = self.records.get_or_else(&key, MediaRecord::default)?;
        if id != CERTIFICATE_ID || record.certificate.take().is_none() {
            return Err(Error::not_found(EntityKind::Certificate, id));
        }
        self.put(&key, &record)?;
        info!(self.log, "certificate deleted"; "system" => system, "device" => device);
        Ok(())
    }
}

fn check_type(certificate_type: &str) -> Result<(), Error> {
    if certificate_type == CERTIFICATE_TYPE {
        Ok(())
    } else {
        Err(Error::bad_request(format!(
            "unsupported certificate type: {certificate_type}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redfish_emulator_backend_mock::MockFetcher;
    use slog::Discard;
    use tokio::test;

    const SYSTEM: &str = "27946b59-9e44-4fa7-8e91-f3527a1ef094";
    const URL: &str = "http://images.test/boot.iso";

    fn vmedia(image_dir: PathBuf, fetcher: &MockFetcher) -> StaticVirtualMedia<MockFetcher> {
        StaticVirtualMedia::new(
            &VirtualMediaConfig::default(),
            image_dir,
            &Logger::root(Discard, o!()),
            &StateDir::in_memory(),
            fetcher.clone(),
        )
        .expect("opened")
    }

    #[test]
    async fn insert_and_eject() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fetcher = MockFetcher::new();
        fetcher.add_image(URL, "boot.iso", b"iso");
        let vmedia = vmedia(dir.path().to_path_buf(), &fetcher);
        vmedia.set_verify(SYSTEM, "Cd", true).expect("set");

        let record = vmedia
            .insert(
                SYSTEM,
                "Cd",
                InsertMedia {
                    image: URL.into(),
                    inserted: true,
                    write_protected: true,
                    ..InsertMedia::default()
                },
            )
            .await
            .expect("inserted");
        let path = record.image_path.clone().expect("downloaded");
        assert!(path.exists());
        assert_eq!(record.image_name.as_deref(), Some("boot.iso"));
        assert!(fetcher.requests()[0].verify);
        assert!(matches!(
            vmedia
                .insert(
                    SYSTEM,
                    "Cd",
                    InsertMedia {
                        image: URL.into(),
                        ..InsertMedia::default()
                    }
                )
                .await,
            Err(Error::Conflict(_))
        ));

        let ejected = vmedia.eject(SYSTEM, "Cd").expect("ejected");
        assert_eq!(ejected, record);
        assert!(!path.exists());
        let after = vmedia.get(SYSTEM, "Cd").expect("read");
        assert!(!after.inserted);
        assert_eq!(after.image, None);
        assert!(after.verify);
    }

    #[test]
    async fn download_failure_is_backend_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vmedia = vmedia(dir.path().to_path_buf(), &MockFetcher::new());
        let err = vmedia
            .insert(
                SYSTEM,
                "Floppy",
                InsertMedia {
                    image: URL.into(),
                    ..InsertMedia::default()
                },
            )
            .await
            .expect_err("missing image");
        assert!(matches!(err, Error::Backend(_)));
        assert!(!vmedia.get(SYSTEM, "Floppy").expect("read").inserted);
    }

    #[test]
    async fn certificate_lifecycle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vmedia = vmedia(dir.path().to_path_buf(), &MockFetcher::new());
        assert!(vmedia.list_certificates(SYSTEM, "Cd").expect("list").is_empty());
        vmedia
            .add_certificate(SYSTEM, "Cd", "PEM-1", "PEM")
            .expect("added");
        assert_eq!(
            vmedia.list_certificates(SYSTEM, "Cd").expect("list")[0].string,
            "PEM-1"
        );
        assert!(matches!(
            vmedia.add_certificate(SYSTEM, "Cd", "PEM-2", "PEM"),
            Err(Error::Conflict(_))
        ));
        vmedia
            .replace_certificate(SYSTEM, "Cd", CERTIFICATE_ID, "PEM-2", "PEM")
            .expect("replaced");
        assert!(vmedia
            .delete_certificate(SYSTEM, "Cd", "Other")
            .is_err_and(|err| err.is_not_found()));
        vmedia
            .delete_certificate(SYSTEM, "Cd", CERTIFICATE_ID)
            .expect("deleted");
        assert!(vmedia.list_certificates(SYSTEM, "Cd").expect("list").is_empty());
        assert!(matches!(
            vmedia.add_certificate(SYSTEM, "Cd", "PEM-3", "PKCS7"),
            Err(Error::BadRequest(_))
        ));
        assert!(vmedia
            .get(SYSTEM, "Usb")
            .is_err_and(|err| err.is_not_found()));
    }
}
