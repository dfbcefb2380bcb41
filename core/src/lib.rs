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

//! Core of the Redfish BMC emulator.
//!
//! The emulator lets Redfish clients manage virtual or cloud hosted
//! machines as if they were physical servers with BMCs. This crate holds
//! the parts every backend shares:
//!
//! - [`SystemsDriver`]: the driver contract.
//! - [`Resolution`]: identity resolution with alias redirection.
//! - [`Error`]: the error taxonomy drivers translate backend failures to.
//! - [`backend`]: native APIs of the backends.
//! - [`power`]: power vocabulary and the pending transition simulator.
//! - [`memoize`]: per-session and permanent caches of backend calls.

/// Native backend APIs.
pub mod backend;
/// Systems driver contract.
pub mod driver;
/// Error taxonomy.
pub mod error;
/// Identity resolution.
pub mod identity;
/// Memoization of backend calls.
pub mod memoize;
/// Power state vocabulary and transition simulator.
pub mod power;
/// Values exchanged through the driver contract.
pub mod types;

#[doc(inline)]
pub use driver::SystemsDriver;
#[doc(inline)]
pub use error::BackendError;
#[doc(inline)]
pub use error::BackendErrorKind;
#[doc(inline)]
pub use error::EntityKind;
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use identity::resolve_among;
#[doc(inline)]
pub use identity::Identifiable;
#[doc(inline)]
pub use identity::Resolution;
#[doc(inline)]
pub use memoize::CacheScope;
#[doc(inline)]
pub use memoize::CallKey;
#[doc(inline)]
pub use memoize::Memo;
#[doc(inline)]
pub use memoize::PermanentCache;
#[doc(inline)]
pub use power::Clock;
#[doc(inline)]
pub use power::PowerRecord;
#[doc(inline)]
pub use power::PowerState;
#[doc(inline)]
pub use power::ResetType;
#[doc(inline)]
pub use power::SystemClock;
#[doc(inline)]
pub use types::BiosAttributes;
#[doc(inline)]
pub use types::BootDevice;
#[doc(inline)]
pub use types::BootImage;
#[doc(inline)]
pub use types::BootMode;
#[doc(inline)]
pub use types::IndicatorLed;
#[doc(inline)]
pub use types::Nic;
#[doc(inline)]
pub use types::SimpleStorage;
#[doc(inline)]
pub use types::SimpleStorageMap;
#[doc(inline)]
pub use types::StorageDevice;
#[doc(inline)]
pub use types::VolumeDescriptor;
