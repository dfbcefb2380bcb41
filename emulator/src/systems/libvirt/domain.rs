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

//! Pure transforms and readers of the domain configuration tree.
//!
//! [`process`] takes a tree and a [`DomainChange`] and returns the new tree
//! with a [`ChangeSummary`]. It never talks to the hypervisor, so every
//! change can be checked against fixture documents. The driver reads the
//! tree, processes it and redefines the domain only if something changed.
//!
//! BIOS attributes have no counterpart in the hypervisor. They live in the
//! domain `<metadata>` under a private namespace:
//!
//! ```xml
//! <metadata>
//!   <rfe:bios xmlns:rfe="urn:redfish-emulator:bios:1">
//!     <rfe:attribute name="BootMode" value="&quot;Uefi&quot;"/>
//!   </rfe:bios>
//! </metadata>
//! ```

use crate::config::LibvirtConfig;
use crate::systems::default_bios;
use crate::systems::libvirt::xml::Element;
use redfish_emulator_core::BiosAttributes;
use redfish_emulator_core::BootDevice;
use redfish_emulator_core::BootImage;
use redfish_emulator_core::BootMode;
use redfish_emulator_core::Nic;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

pub const BIOS_NAMESPACE: &str = "urn:redfish-emulator:bios:1";
const BIOS_ELEMENT: &str = "rfe:bios";
const BIOS_ATTRIBUTE: &str = "rfe:attribute";

/// Firmware images per architecture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Loaders {
    pub uefi: BTreeMap<String, String>,
    pub secure_boot: BTreeMap<String, String>,
    pub nvram_templates: BTreeMap<String, String>,
}

impl From<&LibvirtConfig> for Loaders {
    fn from(config: &LibvirtConfig) -> Self {
        Self {
            uefi: config.uefi_loaders.clone(),
            secure_boot: config.secure_boot_loaders.clone(),
            nvram_templates: config.nvram_templates.clone(),
        }
    }
}

/// Change requested on the domain configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainChange {
    BootDevice(BootDevice),
    BootMode(BootMode),
    SecureBoot(bool),
    /// Merge attributes over the stored (or default) BIOS attributes.
    UpdateBios(BiosAttributes),
    ResetBios,
    AttachMedia {
        device: BootDevice,
        image: String,
        write_protected: bool,
    },
    DetachMedia(BootDevice),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    /// The new tree differs from the original one.
    pub changed: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    MissingElement(&'static str),
    NoLoader { arch: String, secure_boot: bool },
    UnsupportedDevice(BootDevice),
    RequiresUefi,
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::MissingElement(name) => write!(f, "domain has no <{name}> element"),
            Self::NoLoader { arch, secure_boot } => {
                let kind = if *secure_boot { "secure boot" } else { "UEFI" };
                write!(f, "no {kind} loader configured for architecture {arch}")
            }
            Self::UnsupportedDevice(device) => {
                write!(f, "{device} cannot hold virtual media")
            }
            Self::RequiresUefi => "secure boot requires UEFI boot mode".fmt(f),
        }
    }
}

impl StdError for DomainError {}

/// Apply `change` to a copy of `tree`.
///
/// # Errors
///
/// Returns error if the tree lacks elements the change needs, if no
/// firmware is configured for the domain architecture or if the change
/// is not applicable to the device.
pub fn process(
    tree: &Element,
    change: &DomainChange,
    loaders: &Loaders,
) -> Result<(Element, ChangeSummary), DomainError> {
    let mut next = tree.clone();
    let description = match change {
        DomainChange::BootDevice(device) => {
            set_boot_device(&mut next, *device)?;
            format!("boot device {device}")
        }
        DomainChange::BootMode(mode) => {
            set_boot_mode(&mut next, *mode, loaders)?;
            format!("boot mode {mode}")
        }
        DomainChange::SecureBoot(enabled) => {
            set_secure_boot(&mut next, *enabled, loaders)?;
            format!("secure boot {enabled}")
        }
        DomainChange::UpdateBios(attributes) => {
            let mut merged = bios(&next).unwrap_or_else(default_bios);
            merged.extend(attributes.clone());
            write_bios(&mut next, &merged);
            format!("bios attributes {}", join_keys(attributes))
        }
        DomainChange::ResetBios => {
            write_bios(&mut next, &default_bios());
            "bios reset".to_string()
        }
        DomainChange::AttachMedia {
            device,
            image,
            write_protected,
        } => {
            attach_media(&mut next, *device, image, *write_protected)?;
            format!("{device} media {image}")
        }
        DomainChange::DetachMedia(device) => {
            detach_media(&mut next, *device)?;
            format!("{device} media ejected")
        }
    };
    let summary = ChangeSummary {
        changed: next != *tree,
        description,
    };
    Ok((next, summary))
}

fn join_keys(attributes: &BiosAttributes) -> String {
    attributes.keys().cloned().collect::<Vec<_>>().join(",")
}

const fn boot_dev(device: BootDevice) -> &'static str {
    match device {
        BootDevice::Pxe => "network",
        BootDevice::Hdd => "hd",
        BootDevice::Cd => "cdrom",
        BootDevice::Floppy => "fd",
    }
}

fn from_boot_dev(dev: &str) -> Option<BootDevice> {
    match dev {
        "network" => Some(BootDevice::Pxe),
        "hd" => Some(BootDevice::Hdd),
        "cdrom" => Some(BootDevice::Cd),
        "fd" => Some(BootDevice::Floppy),
        _ => None,
    }
}

const fn disk_device(device: BootDevice) -> Option<&'static str> {
    match device {
        BootDevice::Pxe => None,
        BootDevice::Hdd => Some("disk"),
        BootDevice::Cd => Some("cdrom"),
        BootDevice::Floppy => Some("floppy"),
    }
}

fn from_disk_device(device: &str) -> Option<BootDevice> {
    match device {
        "disk" => Some(BootDevice::Hdd),
        "cdrom" => Some(BootDevice::Cd),
        "floppy" => Some(BootDevice::Floppy),
        _ => None,
    }
}

fn boot_order(element: &Element) -> Option<u32> {
    element.child("boot")?.attr("order")?.parse().ok()
}

/// Current boot device: the first `<os><boot>` entry, otherwise the
/// device with the lowest boot order. `None` if neither maps.
#[must_use]
pub fn boot_device(tree: &Element) -> Option<BootDevice> {
    if let Some(boot) = tree.child("os").and_then(|os| os.child("boot")) {
        return boot.attr("dev").and_then(from_boot_dev);
    }
    let devices = tree.child("devices")?;
    let mut best: Option<(u32, BootDevice)> = None;
    for element in &devices.children {
        let Some(order) = boot_order(element) else {
            continue;
        };
        let mapped = match element.name.as_str() {
            "interface" => Some(BootDevice::Pxe),
            "disk" => element.attr("device").and_then(from_disk_device),
            _ => None,
        };
        if let Some(device) = mapped {
            if best.map_or(true, |(current, _)| order < current) {
                best = Some((order, device));
            }
        }
    }
    best.map(|(_, device)| device)
}

fn set_boot_device(tree: &mut Element, device: BootDevice) -> Result<(), DomainError> {
    tree.child_mut("os")
        .ok_or(DomainError::MissingElement("os"))?
        .remove_children("boot");
    let mut marked = false;
    if let Some(devices) = tree.child_mut("devices") {
        for element in &mut devices.children {
            element.remove_children("boot");
        }
        let target = devices.children.iter_mut().find(|element| match device {
            BootDevice::Pxe => element.name == "interface",
            _ => element.name == "disk" && element.attr("device") == disk_device(device),
        });
        if let Some(target) = target {
            push_boot_order(target);
            marked = true;
        }
    }
    if !marked {
        if let Some(os) = tree.child_mut("os") {
            os.insert_after("type", Element::new("boot").with_attr("dev", boot_dev(device)));
        }
    }
    Ok(())
}

/// Mark `element` as the first boot device. `<boot>` goes before
/// `<address>`, matching the element order the hypervisor reports.
fn push_boot_order(element: &mut Element) {
    let boot = Element::new("boot").with_attr("order", "1");
    match element.children.iter().position(|c| c.name == "address") {
        Some(index) => element.children.insert(index, boot),
        None => element.children.push(boot),
    }
}

fn arch(tree: &Element) -> Result<String, DomainError> {
    tree.child("os")
        .and_then(|os| os.child("type"))
        .and_then(|t| t.attr("arch"))
        .map(ToString::to_string)
        .ok_or(DomainError::MissingElement("type"))
}

/// Firmware boot mode. `None` if the domain has no `<os>` element.
#[must_use]
pub fn boot_mode(tree: &Element) -> Option<BootMode> {
    let os = tree.child("os")?;
    let uefi = os.attr("firmware") == Some("efi")
        || os
            .child("loader")
            .is_some_and(|loader| loader.attr("type") == Some("pflash"));
    Some(if uefi { BootMode::Uefi } else { BootMode::Legacy })
}

fn replace_loader(tree: &mut Element, loader: Option<Element>, nvram: Option<Element>) -> Result<(), DomainError> {
    let os = tree.child_mut("os").ok_or(DomainError::MissingElement("os"))?;
    os.remove_attr("firmware");
    os.remove_children("loader");
    os.remove_children("nvram");
    if let Some(nvram) = nvram {
        os.insert_after("type", nvram);
    }
    if let Some(loader) = loader {
        os.insert_after("type", loader);
    }
    Ok(())
}

fn loader(path: &str, secure: Option<bool>) -> Element {
    let mut loader = Element::new("loader")
        .with_attr("readonly", "yes")
        .with_attr("type", "pflash");
    if let Some(secure) = secure {
        loader.set_attr("secure", if secure { "yes" } else { "no" });
    }
    loader.with_text(path)
}

fn set_boot_mode(tree: &mut Element, mode: BootMode, loaders: &Loaders) -> Result<(), DomainError> {
    match mode {
        BootMode::Legacy => replace_loader(tree, None, None),
        BootMode::Uefi => {
            if boot_mode(tree) == Some(BootMode::Uefi) {
                return Ok(());
            }
            let arch = arch(tree)?;
            let path = loaders.uefi.get(&arch).ok_or_else(|| DomainError::NoLoader {
                arch: arch.clone(),
                secure_boot: false,
            })?;
            replace_loader(tree, Some(loader(path, None)), None)
        }
    }
}

/// True if the loader has secure boot enabled.
#[must_use]
pub fn secure_boot(tree: &Element) -> bool {
    tree.child("os")
        .and_then(|os| os.child("loader"))
        .is_some_and(|loader| loader.attr("secure") == Some("yes"))
}

fn set_secure_boot(tree: &mut Element, enabled: bool, loaders: &Loaders) -> Result<(), DomainError> {
    if boot_mode(tree) != Some(BootMode::Uefi) {
        return Err(DomainError::RequiresUefi);
    }
    let arch = arch(tree)?;
    if enabled {
        let path = loaders.secure_boot.get(&arch).ok_or_else(|| DomainError::NoLoader {
            arch: arch.clone(),
            secure_boot: true,
        })?;
        let nvram = loaders
            .nvram_templates
            .get(&arch)
            .map(|template| Element::new("nvram").with_attr("template", template.as_str()));
        replace_loader(tree, Some(loader(path, Some(true))), nvram)?;
        tree.child_or_insert("features")
            .child_or_insert("smm")
            .set_attr("state", "on");
        Ok(())
    } else {
        let path = loaders.uefi.get(&arch).ok_or(DomainError::NoLoader {
            arch,
            secure_boot: false,
        })?;
        replace_loader(tree, Some(loader(path, Some(false))), None)
    }
}

/// BIOS attributes stored in the domain, `None` if never stored.
#[must_use]
pub fn bios(tree: &Element) -> Option<BiosAttributes> {
    let block = tree.child("metadata")?.child(BIOS_ELEMENT)?;
    Some(
        block
            .children_named(BIOS_ATTRIBUTE)
            .filter_map(|attribute| {
                let name = attribute.attr("name")?;
                let raw = attribute.attr("value").unwrap_or_default();
                let value = serde_json::from_str(raw)
                    .unwrap_or_else(|_| JsonValue::String(raw.to_string()));
                Some((name.to_string(), value))
            })
            .collect(),
    )
}

fn write_bios(tree: &mut Element, attributes: &BiosAttributes) {
    let mut block = Element::new(BIOS_ELEMENT).with_attr("xmlns:rfe", BIOS_NAMESPACE);
    for (name, value) in attributes {
        block.children.push(
            Element::new(BIOS_ATTRIBUTE)
                .with_attr("name", name.as_str())
                .with_attr("value", value.to_string()),
        );
    }
    let metadata = tree.child_or_insert("metadata");
    metadata.remove_children(BIOS_ELEMENT);
    metadata.children.push(block);
}

fn media_kind(device: BootDevice) -> Result<&'static str, DomainError> {
    match device {
        BootDevice::Cd => Ok("cdrom"),
        BootDevice::Floppy => Ok("floppy"),
        BootDevice::Pxe | BootDevice::Hdd => Err(DomainError::UnsupportedDevice(device)),
    }
}

fn find_disk<'a>(tree: &'a Element, kind: &str) -> Option<&'a Element> {
    tree.child("devices")?
        .children_named("disk")
        .find(|disk| disk.attr("device") == Some(kind))
}

fn attach_media(
    tree: &mut Element,
    device: BootDevice,
    image: &str,
    write_protected: bool,
) -> Result<(), DomainError> {
    let kind = media_kind(device)?;
    let devices = tree
        .child_mut("devices")
        .ok_or(DomainError::MissingElement("devices"))?;
    let existing = devices
        .children
        .iter()
        .position(|disk| disk.name == "disk" && disk.attr("device") == Some(kind));
    let index = match existing {
        Some(index) => index,
        None => {
            let disk = new_media_disk(devices, kind);
            devices.children.push(disk);
            devices.children.len() - 1
        }
    };
    let disk = &mut devices.children[index];
    disk.set_attr("type", "file");
    disk.remove_children("source");
    disk.insert_after("driver", Element::new("source").with_attr("file", image));
    let readonly = disk.child("readonly").is_some();
    if write_protected && !readonly {
        disk.insert_after("target", Element::new("readonly"));
    } else if !write_protected {
        disk.remove_children("readonly");
    }
    Ok(())
}

/// New removable disk of `kind` with the first free target name and
/// drive unit on its bus.
fn new_media_disk(devices: &Element, kind: &str) -> Element {
    let (bus, prefix) = if kind == "floppy" {
        ("fdc", "fd")
    } else {
        ("sata", "sd")
    };
    let disks: Vec<&Element> = devices.children_named("disk").collect();
    let names: BTreeSet<&str> = disks
        .iter()
        .filter_map(|disk| disk.child("target")?.attr("dev"))
        .collect();
    let dev = ('a'..='z')
        .map(|letter| format!("{prefix}{letter}"))
        .find(|name| !names.contains(name.as_str()))
        .unwrap_or_else(|| format!("{prefix}z"));
    let units: BTreeSet<u32> = disks
        .iter()
        .filter(|disk| disk.child("target").and_then(|t| t.attr("bus")) == Some(bus))
        .filter_map(|disk| disk.child("address"))
        .filter(|address| address.attr("type") == Some("drive") && address.attr("controller") == Some("0"))
        .filter_map(|address| address.attr("unit")?.parse().ok())
        .collect();
    let unit = (0..).find(|unit| !units.contains(unit)).unwrap_or_default();
    let mut disk = Element::new("disk")
        .with_attr("type", "file")
        .with_attr("device", kind)
        .with_child(
            Element::new("driver")
                .with_attr("name", "qemu")
                .with_attr("type", "raw"),
        )
        .with_child(
            Element::new("target")
                .with_attr("dev", dev)
                .with_attr("bus", bus),
        );
    disk.children.push(
        Element::new("address")
            .with_attr("type", "drive")
            .with_attr("controller", "0")
            .with_attr("bus", "0")
            .with_attr("target", "0")
            .with_attr("unit", unit.to_string()),
    );
    disk
}

fn detach_media(tree: &mut Element, device: BootDevice) -> Result<(), DomainError> {
    let kind = media_kind(device)?;
    if let Some(devices) = tree.child_mut("devices") {
        for disk in devices
            .children_named_mut("disk")
            .filter(|disk| disk.attr("device") == Some(kind))
        {
            disk.remove_children("source");
        }
    }
    Ok(())
}

fn disk_source(disk: &Element) -> Option<String> {
    let source = disk.child("source")?;
    source
        .attr("file")
        .or_else(|| source.attr("dev"))
        .or_else(|| source.attr("volume"))
        .map(ToString::to_string)
}

/// Image attached to the removable disk of `device`.
#[must_use]
pub fn boot_image(tree: &Element, device: BootDevice) -> BootImage {
    let Some(disk) = disk_device(device).and_then(|kind| find_disk(tree, kind)) else {
        return BootImage::default();
    };
    let image = disk_source(disk);
    BootImage {
        inserted: image.is_some(),
        image,
        write_protected: disk.child("readonly").is_some(),
    }
}

#[must_use]
pub fn nics(tree: &Element) -> Vec<Nic> {
    tree.child("devices")
        .into_iter()
        .flat_map(|devices| devices.children_named("interface"))
        .filter_map(|interface| interface.child("mac")?.attr("address"))
        .map(Nic::from_mac)
        .collect()
}

fn unit_multiplier(unit: &str) -> Option<u64> {
    Some(match unit {
        "b" | "bytes" => 1,
        "KB" => 1_000,
        "k" | "KiB" => 1 << 10,
        "MB" => 1_000_000,
        "M" | "MiB" => 1 << 20,
        "GB" => 1_000_000_000,
        "G" | "GiB" => 1 << 30,
        "TB" => 1_000_000_000_000,
        "T" | "TiB" => 1 << 40,
        _ => return None,
    })
}

/// Memory size in whole GiB.
#[must_use]
pub fn memory_gib(tree: &Element) -> Option<u64> {
    let memory = tree.child("memory")?;
    let value: u64 = memory.text.parse().ok()?;
    let bytes = value.checked_mul(unit_multiplier(memory.attr("unit").unwrap_or("KiB"))?)?;
    Some(bytes >> 30)
}

#[must_use]
pub fn vcpus(tree: &Element) -> Option<u32> {
    tree.child("vcpu")?.text.parse().ok()
}

/// Hard disk of the domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disk {
    pub bus: String,
    pub target: String,
    pub source: Option<String>,
}

#[must_use]
pub fn disks(tree: &Element) -> Vec<Disk> {
    tree.child("devices")
        .into_iter()
        .flat_map(|devices| devices.children_named("disk"))
        .filter(|disk| disk.attr("device").unwrap_or("disk") == "disk")
        .filter_map(|disk| {
            let target = disk.child("target")?;
            Some(Disk {
                bus: target.attr("bus").unwrap_or("ide").to_string(),
                target: target.attr("dev")?.to_string(),
                source: disk_source(disk),
            })
        })
        .collect()
}
