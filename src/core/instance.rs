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

//! A live device instance: kind, id, opaque per-kind state, and its lock.

use std::sync::Mutex;

use crate::core::handle::{DeviceHandle, KindId};
use crate::core::memory::DeviceMemory;
use crate::core::rule::RuleSet;
use crate::devices::{flash::FlashState, fpga::FpgaState, temp_sensor::TempSensorState};

/// Per-kind private state, tagged by variant instead of a `void*` cast
/// (spec §9's first re-architecture note).
///
/// Every variant embeds its own [`DeviceMemory`] and [`RuleSet`] — there is
/// exactly one of each per instance, and both live behind the same
/// [`DeviceInstance`] mutex, which is what lets this crate treat the
/// rule-set lock as "logically part of the instance mutex" (spec §5)
/// without a second lock.
pub enum InstanceState {
    /// Flash device state
    Flash(FlashState),
    /// Temperature sensor state
    TempSensor(TempSensorState),
    /// FPGA device state
    Fpga(FpgaState),
}

impl InstanceState {
    /// The device memory for whichever kind this state holds.
    pub fn memory(&self) -> &DeviceMemory {
        match self {
            InstanceState::Flash(s) => &s.memory,
            InstanceState::TempSensor(s) => &s.memory,
            InstanceState::Fpga(s) => &s.memory,
        }
    }

    /// Mutable device memory for whichever kind this state holds.
    pub fn memory_mut(&mut self) -> &mut DeviceMemory {
        match self {
            InstanceState::Flash(s) => &mut s.memory,
            InstanceState::TempSensor(s) => &mut s.memory,
            InstanceState::Fpga(s) => &mut s.memory,
        }
    }

    /// The rule set for whichever kind this state holds.
    pub fn rules(&self) -> &RuleSet {
        match self {
            InstanceState::Flash(s) => &s.rules,
            InstanceState::TempSensor(s) => &s.rules,
            InstanceState::Fpga(s) => &s.rules,
        }
    }

    /// Mutable rule set for whichever kind this state holds.
    pub fn rules_mut(&mut self) -> &mut RuleSet {
        match self {
            InstanceState::Flash(s) => &mut s.rules,
            InstanceState::TempSensor(s) => &mut s.rules,
            InstanceState::Fpga(s) => &mut s.rules,
        }
    }
}

/// A live simulated peripheral.
///
/// `kind_id` and `instance_id` are immutable for the instance's lifetime.
/// `inner` holds everything that mutates — device memory, rule set, and
/// kind-private fields — behind one `Mutex`, which doubles as the "rule-set
/// mutex" of spec §5.
pub struct DeviceInstance {
    kind_id: KindId,
    instance_id: u32,
    inner: Mutex<InstanceState>,
}

impl DeviceInstance {
    /// Construct a new instance wrapping the given initial state.
    pub fn new(kind_id: KindId, instance_id: u32, state: InstanceState) -> Self {
        Self {
            kind_id,
            instance_id,
            inner: Mutex::new(state),
        }
    }

    /// This instance's kind.
    pub fn kind_id(&self) -> KindId {
        self.kind_id
    }

    /// This instance's id within its kind.
    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    /// This instance's `(kind_id, instance_id)` handle.
    pub fn handle(&self) -> DeviceHandle {
        DeviceHandle::new(self.kind_id, self.instance_id)
    }

    /// Lock the instance's state for exclusive access.
    ///
    /// Poison is treated as unrecoverable (a panic mid-mutation inside one
    /// instance's critical section is a bug in a device kind's hook, not a
    /// condition calling code can sensibly recover a stale lock from).
    pub fn lock(&self) -> std::sync::MutexGuard<'_, InstanceState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
