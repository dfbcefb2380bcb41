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

//! Virtual media over systems drivers with and without image attachment.

use redfish_emulator::resources::vmedia::InsertMedia;
use redfish_emulator_backend_mock::ManualClock;
use redfish_emulator_core::BootDevice;
use redfish_emulator_core::Error;
use redfish_emulator_core::SystemsDriver;
use redfish_emulator_tests::emulator_config;
use redfish_emulator_tests::fake_emulator;
use redfish_emulator_tests::rigs::emulator_over;
use redfish_emulator_tests::rigs::nova_driver;
use redfish_emulator_tests::FAKE_NAME;
use redfish_emulator_tests::FAKE_UUID;
use redfish_emulator_tests::SERVER_NAME;
use redfish_emulator_tests::SERVER_UUID;
use std::error::Error as StdError;
use tempfile::tempdir;
use tokio::test;

const IMAGE_URL: &str = "http://images.test/boot.iso";
const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

fn boot_iso() -> InsertMedia {
    InsertMedia {
        image: IMAGE_URL.to_string(),
        inserted: true,
        write_protected: true,
        ..InsertMedia::default()
    }
}

#[test]
async fn inserted_image_is_attached_to_fake_system() -> Result<(), Box<dyn StdError>> {
    let dir = tempdir()?;
    let emulator = fake_emulator(&emulator_config(dir.path()), ManualClock::default())?;
    emulator.fetcher.add_image(IMAGE_URL, "boot.iso", b"iso");

    let record = emulator
        .resources
        .insert_media(FAKE_NAME, "Cd", boot_iso())
        .await?;
    let path = record.image_path.clone().ok_or("image path")?;
    assert!(path.exists());
    assert_eq!(record.image_name.as_deref(), Some("boot.iso"));

    let attached = emulator
        .resources
        .systems()
        .get_boot_image(FAKE_UUID, BootDevice::Cd)
        .await?;
    assert!(attached.inserted);
    assert!(attached.write_protected);
    assert_eq!(attached.image, Some(path.to_string_lossy().into_owned()));

    emulator.resources.eject_media(FAKE_NAME, "Cd").await?;
    assert!(!path.exists());
    let detached = emulator
        .resources
        .systems()
        .get_boot_image(FAKE_UUID, BootDevice::Cd)
        .await?;
    assert!(!detached.inserted);
    assert!(!emulator.resources.vmedia().get(FAKE_UUID, "Cd")?.inserted);
    Ok(())
}

#[test]
async fn second_insert_conflicts() -> Result<(), Box<dyn StdError>> {
    let dir = tempdir()?;
    let emulator = fake_emulator(&emulator_config(dir.path()), ManualClock::default())?;
    emulator.fetcher.add_image(IMAGE_URL, "boot.iso", b"iso");
    emulator
        .resources
        .insert_media(FAKE_UUID, "Cd", boot_iso())
        .await?;
    let err = emulator
        .resources
        .insert_media(FAKE_UUID, "Cd", boot_iso())
        .await
        .err()
        .ok_or("second insert accepted")?;
    assert!(matches!(err, Error::Conflict(_)), "{err}");
    assert_eq!(err.status().as_u16(), 409);
    Ok(())
}

#[test]
async fn failed_download_leaves_device_empty() -> Result<(), Box<dyn StdError>> {
    let dir = tempdir()?;
    let emulator = fake_emulator(&emulator_config(dir.path()), ManualClock::default())?;
    let err = emulator
        .resources
        .insert_media(FAKE_UUID, "Cd", boot_iso())
        .await
        .err()
        .ok_or("missing image inserted")?;
    assert!(matches!(err, Error::Backend(_)), "{err}");
    assert!(!emulator.resources.vmedia().get(FAKE_UUID, "Cd")?.inserted);
    assert!(!emulator
        .resources
        .systems()
        .get_boot_image(FAKE_UUID, BootDevice::Cd)
        .await?
        .inserted);
    Ok(())
}

#[test]
async fn unknown_device_is_not_found() -> Result<(), Box<dyn StdError>> {
    let dir = tempdir()?;
    let emulator = fake_emulator(&emulator_config(dir.path()), ManualClock::default())?;
    emulator.fetcher.add_image(IMAGE_URL, "boot.iso", b"iso");
    let err = emulator
        .resources
        .insert_media(FAKE_UUID, "Tape", boot_iso())
        .await
        .err()
        .ok_or("unknown device accepted")?;
    assert!(err.is_not_found(), "{err}");
    Ok(())
}

#[test]
async fn nova_keeps_media_in_emulator_only() -> Result<(), Box<dyn StdError>> {
    let dir = tempdir()?;
    let (compute, driver) = nova_driver();
    let (fetcher, resources) = emulator_over(&emulator_config(dir.path()), driver)?;
    fetcher.add_image(IMAGE_URL, "boot.iso", b"iso");

    resources.insert_media(SERVER_NAME, "Cd", boot_iso()).await?;
    assert!(resources.vmedia().get(SERVER_UUID, "Cd")?.inserted);
    assert_eq!(compute.call_count("set_server_metadata"), 0);

    resources.eject_media(SERVER_UUID, "Cd").await?;
    assert!(!resources.vmedia().get(SERVER_UUID, "Cd")?.inserted);
    Ok(())
}

#[test]
async fn certificate_lifecycle() -> Result<(), Box<dyn StdError>> {
    let dir = tempdir()?;
    let emulator = fake_emulator(&emulator_config(dir.path()), ManualClock::default())?;
    let vmedia = emulator.resources.vmedia();
    assert!(vmedia.list_certificates(FAKE_UUID, "Cd")?.is_empty());

    let added = vmedia.add_certificate(FAKE_UUID, "Cd", PEM, "PEM")?;
    assert_eq!(added.id, "Default");
    assert!(matches!(
        vmedia.add_certificate(FAKE_UUID, "Cd", PEM, "PEM"),
        Err(Error::Conflict(_))
    ));
    assert!(matches!(
        vmedia.add_certificate(FAKE_UUID, "Floppy", PEM, "PKCS7"),
        Err(Error::BadRequest(_))
    ));

    // Downloads trust the device certificate.
    vmedia.set_verify(FAKE_UUID, "Cd", true)?;
    emulator.fetcher.add_image(IMAGE_URL, "boot.iso", b"iso");
    emulator
        .resources
        .insert_media(FAKE_UUID, "Cd", boot_iso())
        .await?;
    let requests = emulator.fetcher.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].verify);
    assert_eq!(requests[0].ca_certificate.as_deref(), Some(PEM));

    // Ejecting keeps TLS settings.
    emulator.resources.eject_media(FAKE_UUID, "Cd").await?;
    assert_eq!(vmedia.list_certificates(FAKE_UUID, "Cd")?.len(), 1);

    let replaced = vmedia.replace_certificate(FAKE_UUID, "Cd", "Default", "new", "PEM")?;
    assert_eq!(replaced.string, "new");
    vmedia.delete_certificate(FAKE_UUID, "Cd", "Default")?;
    assert!(vmedia
        .delete_certificate(FAKE_UUID, "Cd", "Default")
        .is_err_and(|err| err.is_not_found()));
    assert!(vmedia.list_certificates(FAKE_UUID, "Cd")?.is_empty());
    Ok(())
}
