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

//! The capability table every device kind implements.

use crate::core::error::Result;
use crate::core::handle::{DeviceHandle, KindId};
use crate::core::instance::InstanceState;

/// Static capability table for one device kind.
///
/// A `DeviceKind` is registered once with a [`crate::core::manager::DeviceManager`]
/// and is shared (`Arc`) across every instance of that kind; it carries no
/// per-instance state itself; that lives in the [`InstanceState`] handed to
/// each method while the owning instance's mutex is held.
///
/// This trait intentionally has no `memory_of`/`mutex_of` accessors: the
/// instance mutex is a first-class field on [`crate::core::instance::DeviceInstance`]
/// and the manager passes a `&mut InstanceState` directly, which already
/// embeds the device memory (spec §9's note that these accessors exist in
/// the original "only for legacy symmetry").
pub trait DeviceKind: Send + Sync {
    /// The kind this capability table implements.
    fn kind_id(&self) -> KindId;

    /// Short display name, e.g. `"FLASH"`.
    fn name(&self) -> &str;

    /// Build the zeroed/default [`InstanceState`] variant for this kind,
    /// before [`Self::init`] lays out regions and rules onto it.
    fn new_state(&self) -> InstanceState;

    /// Allocate regions, install the kind's predefined rule catalog, and
    /// otherwise prepare a freshly created instance. `handle` identifies
    /// the instance being initialized, for catalog rules that target "this
    /// device" by handle.
    fn init(&self, state: &mut InstanceState, handle: DeviceHandle) -> Result<()>;

    /// 32-bit read. `handle` is carried only so error values can name the
    /// offending device; the kind never needs it to find its own state.
    fn read(&self, state: &InstanceState, handle: DeviceHandle, addr: u32) -> Result<u32>;

    /// 32-bit write. Implementations must route the store through
    /// [`InstanceState::memory_mut`] so that rule-engine dispatch (driven
    /// by the manager once this call returns) observes the new value.
    fn write(&self, state: &mut InstanceState, handle: DeviceHandle, addr: u32, value: u32) -> Result<()>;

    /// Idempotent reset: reinstalls the kind's predefined rule catalog and
    /// clears kind-specific state. Default: no-op.
    fn reset(&self, _state: &mut InstanceState, _handle: DeviceHandle) -> Result<()> {
        Ok(())
    }

    /// Release any per-kind resources. Default: no-op, since
    /// [`InstanceState`] is plain owned data that drops on its own.
    fn destroy(&self, _state: &mut InstanceState) {}
}
