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

//! In-memory backends of the Redfish BMC emulator.
//!
//! Each mock keeps its entities in memory, shares state between clones so
//! a test can keep a handle while the driver owns another, and records the
//! calls it receives. Failures are injected through [`Faults`].

pub mod baremetal;
pub mod compute;
pub mod doubles;
pub mod fault;
pub mod hypervisor;

#[doc(inline)]
pub use baremetal::MockBaremetal;
#[doc(inline)]
pub use compute::MockCompute;
#[doc(inline)]
pub use doubles::ManualClock;
#[doc(inline)]
pub use doubles::MockFetcher;
#[doc(inline)]
pub use doubles::RecordingNotifier;
#[doc(inline)]
pub use fault::Fault;
#[doc(inline)]
pub use fault::Faults;
#[doc(inline)]
pub use hypervisor::MockConnection;
#[doc(inline)]
pub use hypervisor::MockHypervisor;
