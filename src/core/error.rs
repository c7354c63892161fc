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

//! Simulator error types

use thiserror::Error;

use crate::core::handle::{DeviceHandle, KindId};

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;

/// Simulator error kinds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// A handle referred to an unknown kind id or an otherwise invalid argument
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Human-readable description of what was invalid
        reason: String,
    },

    /// Address is not covered by any region of the instance
    #[error("address 0x{addr:08X} is out of range for {handle}")]
    OutOfRange {
        /// The offending address
        addr: u32,
        /// The device the access targeted
        handle: DeviceHandle,
    },

    /// Word access was not 4-byte aligned
    #[error("misaligned access at address 0x{addr:08X} (must be 4-byte aligned)")]
    Misaligned {
        /// The offending address
        addr: u32,
    },

    /// An instance or kind slot already exists
    #[error("duplicate {what}")]
    Duplicate {
        /// What was duplicated ("kind" or "instance")
        what: String,
    },

    /// A rule set has reached its fixed capacity
    #[error("rule set for {handle} is full (capacity {capacity})")]
    Capacity {
        /// The device whose rule set is full
        handle: DeviceHandle,
        /// The fixed capacity that was reached
        capacity: usize,
    },

    /// A rule's target list exceeds the fixed per-rule fan-out capacity
    #[error("rule target list for {handle} exceeds capacity ({capacity})")]
    TooManyTargets {
        /// The device the rule was being installed on
        handle: DeviceHandle,
        /// The fixed capacity that was exceeded
        capacity: usize,
    },

    /// A rule's Write target referred to a device that does not exist
    #[error("no such target device {handle}")]
    NoTarget {
        /// The target device that could not be found
        handle: DeviceHandle,
    },

    /// Rule dispatch depth exceeded the recursion cap
    #[error("recursion cap ({cap}) exceeded while dispatching rules for {handle}")]
    RecursionCap {
        /// The device whose write chain was truncated
        handle: DeviceHandle,
        /// The configured cap
        cap: u32,
    },
}

impl SimError {
    /// Construct a [`SimError::InvalidArgument`] for a kind id that has no registered slot
    pub fn unknown_kind(kind_id: KindId) -> Self {
        SimError::InvalidArgument {
            reason: format!("kind {kind_id:?} is not registered"),
        }
    }
}
