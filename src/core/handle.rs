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

//! Device kind identifiers and value-typed device handles
//!
//! Rules never hold pointers to the devices they target. Instead a rule's
//! `Write` action carries a [`DeviceHandle`] — a small `Copy` value — which
//! the [`crate::core::manager::DeviceManager`] resolves to a live instance
//! at dispatch time. This avoids the cyclic ownership (instance -> rule set
//! -> target -> manager) that a back-pointer design would need.

use std::fmt;

/// The closed set of device kinds this simulator knows how to build.
///
/// Adding a kind means adding a variant here and registering it with a
/// [`crate::core::manager::DeviceManager`] before any instance of that kind
/// is created; there is no runtime plugin loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindId {
    /// NOR-flash-like device with a status/control/config register block
    /// and a byte-addressable data region.
    Flash,
    /// A simple temperature sensor with alarm limit registers.
    TempSensor,
    /// A configurable-logic device with status/config/control/irq registers.
    Fpga,
}

/// Number of kind slots the [`crate::core::manager::DeviceManager`] reserves.
///
/// Fixed at compile time, per spec: the kind-id enumeration is closed.
pub const MAX_KINDS: usize = 8;

impl KindId {
    /// All kinds known to this crate, in registration order.
    pub const ALL: [KindId; 3] = [KindId::Flash, KindId::TempSensor, KindId::Fpga];

    /// Stable small index used to slot this kind into the manager's
    /// fixed-size kind array.
    pub const fn slot(self) -> usize {
        match self {
            KindId::Flash => 0,
            KindId::TempSensor => 1,
            KindId::Fpga => 2,
        }
    }

    /// Short display name, e.g. for logging.
    pub const fn display_name(self) -> &'static str {
        match self {
            KindId::Flash => "FLASH",
            KindId::TempSensor => "TEMP_SENSOR",
            KindId::Fpga => "FPGA",
        }
    }
}

impl fmt::Display for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A value-typed `(kind_id, instance_id)` pair identifying one device
/// instance anywhere in the simulator.
///
/// `instance_id` is only unique within one kind (spec: "within one kind,
/// `instance_id` is unique"), so the pair is the real identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    /// Which kind this instance belongs to
    pub kind_id: KindId,
    /// The instance's id within its kind
    pub instance_id: u32,
}

impl DeviceHandle {
    /// Construct a new handle.
    pub const fn new(kind_id: KindId, instance_id: u32) -> Self {
        Self {
            kind_id,
            instance_id,
        }
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind_id, self.instance_id)
    }
}

/// Total ordering used when two instance locks must be acquired together,
/// to avoid lock-order inversion: always the lower `(kind_id, instance_id)`
/// first (spec §5). `kind_id` orders by [`KindId::slot`].
impl PartialOrd for DeviceHandle {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeviceHandle {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.kind_id.slot(), self.instance_id).cmp(&(other.kind_id.slot(), other.instance_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_ordering_is_by_kind_then_instance() {
        let a = DeviceHandle::new(KindId::Flash, 5);
        let b = DeviceHandle::new(KindId::Flash, 2);
        let c = DeviceHandle::new(KindId::TempSensor, 0);
        assert!(b < a);
        assert!(a < c);
    }

    #[test]
    fn display_formats_as_kind_slash_id() {
        let h = DeviceHandle::new(KindId::Fpga, 3);
        assert_eq!(h.to_string(), "FPGA/3");
    }
}
