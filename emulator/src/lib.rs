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

//! Redfish BMC emulator drivers.
//!
//! The emulator exposes machines managed by a virtualization backend as
//! Redfish systems. This crate provides:
//!
//! - [`config`]: TOML configuration of the emulator.
//! - [`systems`]: one systems driver per backend (fake, hypervisor, cloud
//!   compute, bare-metal provisioning).
//! - [`resources`]: drivers of resources kept by the emulator itself and
//!   the [`Resources`] bundle the endpoint layer reads.
//! - [`state`]: durable store of pseudo-resource state.
//!
//! # Example
//!
//! ```no_run
//! use redfish_emulator::config::EmulatorConfig;
//! use redfish_emulator::config::SystemsConfig;
//! use redfish_emulator::state::StateDir;
//! use redfish_emulator::systems::fake::FakeDriver;
//! use redfish_emulator::Resources;
//! use redfish_emulator_core::backend::NoNotifier;
//! use redfish_emulator_core::SystemClock;
//! # use redfish_emulator_core::backend::FetchRequest;
//! # use redfish_emulator_core::backend::FetchedImage;
//! # use redfish_emulator_core::backend::ImageFetcher;
//! # use redfish_emulator_core::BackendError;
//! # struct Fetcher;
//! # impl ImageFetcher for Fetcher {
//! #     async fn fetch(&self, _: &FetchRequest) -> Result<FetchedImage, BackendError> { todo!() }
//! # }
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EmulatorConfig::load("emulator.toml")?;
//! let log = slog::Logger::root(slog::Discard, slog::o!());
//! let state = StateDir::from_config(&config);
//! let SystemsConfig::Fake(fake) = &config.systems else {
//!     return Ok(());
//! };
//! let driver = FakeDriver::new(fake, &log, &state, NoNotifier, SystemClock)?;
//! let resources = Resources::new(&config, &log, &state, driver, Fetcher)?;
//! resources.reset_system("fake", "On").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod resources;
pub mod state;
pub mod systems;

#[cfg(feature = "backend-http")]
pub mod http;

#[doc(inline)]
pub use config::EmulatorConfig;
#[doc(inline)]
pub use resources::Resources;
#[doc(inline)]
pub use state::StateDir;
#[doc(inline)]
pub use systems::SystemRef;
