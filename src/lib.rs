// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A reactive memory-mapped device simulator.
//!
//! This library models hardware peripherals (FLASH, a temperature sensor,
//! an FPGA) as software objects addressed through ordinary 32-bit register
//! reads and writes, and evaluates reactive rules that fire on register
//! writes to produce cross-device effects — write-back to another
//! register, or an arbitrary callback.
//!
//! # Example
//!
//! ```
//! use device_sim::core::manager::DeviceManager;
//! use device_sim::core::handle::{DeviceHandle, KindId};
//! use device_sim::devices;
//!
//! let mut manager = DeviceManager::new();
//! devices::register_builtin_kinds(&mut manager).unwrap();
//! manager.create_device(KindId::Flash, 0).unwrap();
//!
//! let h = DeviceHandle::new(KindId::Flash, 0);
//! manager.write_word(h, 0x00, 0x04).unwrap();
//! assert_eq!(manager.read_word(h, 0x00).unwrap(), 0x04);
//! ```

pub mod config;
pub mod core;
pub mod devices;
