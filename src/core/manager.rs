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

//! The device registry: kinds, instances, and the top-level read/write API.

use std::sync::{Arc, Mutex};

use crate::core::engine::{self, DepthGuard};
use crate::core::error::{Result, SimError};
use crate::core::handle::{DeviceHandle, KindId, MAX_KINDS};
use crate::core::instance::DeviceInstance;
use crate::core::kind::DeviceKind;
use crate::core::memory::DeviceMemory;
use crate::core::rule::{ActionTarget, Trigger};
use crate::core::sink::{DiagnosticSink, NullSink};

/// Default recursion cap (spec §4.G: "default 16").
pub const DEFAULT_RECURSION_CAP: u32 = 16;

struct KindSlot {
    caps: Arc<dyn DeviceKind>,
    name: String,
    instances: Mutex<Vec<Arc<DeviceInstance>>>,
}

/// Registry of device kinds and their live instances.
///
/// Lock discipline (spec §5): `registry_lock` guards only kind-slot
/// registration; each kind's own `instances` mutex guards that kind's
/// instance list; each instance's own mutex (inside [`DeviceInstance`])
/// guards that instance's memory and rule set. No lock here is ever held
/// while acquiring another instance's lock — [`engine::dispatch`] always
/// releases the source instance's lock before an action target acquires a
/// target instance's lock.
pub struct DeviceManager {
    registry_lock: Mutex<()>,
    kinds: [Option<KindSlot>; MAX_KINDS],
    recursion_cap: u32,
    sink: Arc<dyn DiagnosticSink>,
}

impl DeviceManager {
    /// Create an empty manager with the default recursion cap and a
    /// silent-drop diagnostic sink (spec §7: "default is silent-drop").
    /// Callers that want diagnostics routed through the `log` crate instead
    /// should use [`Self::with_sink`] with [`crate::core::sink::LogSink`].
    pub fn new() -> Self {
        Self::with_sink(Arc::new(NullSink))
    }

    /// Create an empty manager with a caller-supplied diagnostic sink.
    pub fn with_sink(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            registry_lock: Mutex::new(()),
            kinds: Default::default(),
            recursion_cap: DEFAULT_RECURSION_CAP,
            sink,
        }
    }

    /// Override the recursion cap (spec §4.G "default 16", overridable by
    /// [`crate::config::SimConfig`]).
    pub fn with_recursion_cap(mut self, cap: u32) -> Self {
        self.recursion_cap = cap;
        self
    }

    pub(crate) fn recursion_cap(&self) -> u32 {
        self.recursion_cap
    }

    pub(crate) fn sink(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    /// Register a device kind's capability table. Idempotent per slot:
    /// registering the same `kind_id` twice is a [`SimError::Duplicate`].
    pub fn register_kind(&mut self, caps: Arc<dyn DeviceKind>) -> Result<()> {
        let _guard = self.registry_lock.lock().unwrap();
        let kind_id = caps.kind_id();
        let slot = &mut self.kinds[kind_id.slot()];
        if slot.is_some() {
            return Err(SimError::Duplicate {
                what: format!("kind {kind_id}"),
            });
        }
        let name = caps.name().to_string();
        *slot = Some(KindSlot {
            caps,
            name,
            instances: Mutex::new(Vec::new()),
        });
        Ok(())
    }

    fn slot(&self, kind_id: KindId) -> Result<&KindSlot> {
        self.kinds[kind_id.slot()]
            .as_ref()
            .ok_or_else(|| SimError::unknown_kind(kind_id))
    }

    /// Create a new instance of `kind_id` with the given `instance_id`,
    /// running the kind's `init` hook (which allocates regions and
    /// installs the kind's predefined rule catalog).
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidArgument`] if `kind_id` is not registered,
    /// [`SimError::Duplicate`] if `instance_id` already exists for this
    /// kind, or whatever `init` itself returns.
    pub fn create_device(&self, kind_id: KindId, instance_id: u32) -> Result<Arc<DeviceInstance>> {
        let slot = self.slot(kind_id)?;
        let mut instances = slot.instances.lock().unwrap();
        if instances.iter().any(|i| i.instance_id() == instance_id) {
            return Err(SimError::Duplicate {
                what: format!("instance {kind_id}/{instance_id}"),
            });
        }
        let handle = DeviceHandle::new(kind_id, instance_id);
        let mut state = slot.caps.new_state();
        slot.caps.init(&mut state, handle)?;
        let instance = Arc::new(DeviceInstance::new(kind_id, instance_id, state));
        instances.push(instance.clone());
        log::info!("created device {kind_id}/{instance_id} ({})", slot.name);
        Ok(instance)
    }

    /// Destroy an instance: unlink it from its kind's instance list and
    /// run the kind's `destroy` hook.
    pub fn destroy_device(&self, handle: DeviceHandle) -> Result<()> {
        let slot = self.slot(handle.kind_id)?;
        let mut instances = slot.instances.lock().unwrap();
        let idx = instances
            .iter()
            .position(|i| i.instance_id() == handle.instance_id)
            .ok_or(SimError::InvalidArgument {
                reason: format!("no such instance {handle}"),
            })?;
        let instance = instances.remove(idx);
        slot.caps.destroy(&mut instance.lock());
        log::info!("destroyed device {handle}");
        Ok(())
    }

    /// Idempotently reset an instance: the kind's `reset` hook reinstalls
    /// its predefined rule catalog and clears kind-specific state.
    pub fn reset_device(&self, handle: DeviceHandle) -> Result<()> {
        let caps = self.caps_for(handle.kind_id)?;
        let instance = self.get(handle).ok_or(SimError::InvalidArgument {
            reason: format!("no such instance {handle}"),
        })?;
        caps.reset(&mut instance.lock(), handle)
    }

    /// Look up a live instance by handle.
    pub fn get(&self, handle: DeviceHandle) -> Option<Arc<DeviceInstance>> {
        let slot = self.kinds[handle.kind_id.slot()].as_ref()?;
        let instances = slot.instances.lock().unwrap();
        instances
            .iter()
            .find(|i| i.instance_id() == handle.instance_id)
            .cloned()
    }

    fn caps_for(&self, kind_id: KindId) -> Result<Arc<dyn DeviceKind>> {
        Ok(self.slot(kind_id)?.caps.clone())
    }

    /// 32-bit read.
    pub fn read_word(&self, handle: DeviceHandle, addr: u32) -> Result<u32> {
        let caps = self.caps_for(handle.kind_id)?;
        let instance = self.get(handle).ok_or(SimError::InvalidArgument {
            reason: format!("no such instance {handle}"),
        })?;
        caps.read(&instance.lock(), handle, addr)
    }

    /// 32-bit write. Always funnels through the kind's `write` hook, then
    /// dispatches matching rules (spec §4.B, §4.G), bounded by the
    /// recursion cap (spec §4.G policy (a)).
    pub fn write_word(&self, handle: DeviceHandle, addr: u32, value: u32) -> Result<()> {
        let _depth = DepthGuard::enter();
        let depth = DepthGuard::current();

        let caps = self.caps_for(handle.kind_id)?;
        let instance = self.get(handle).ok_or(SimError::InvalidArgument {
            reason: format!("no such instance {handle}"),
        })?;
        caps.write(&mut instance.lock(), handle, addr, value)?;

        engine::dispatch(self, handle, addr, value, depth);
        Ok(())
    }

    /// Apply a masked write — `(current & !mask) | (value & mask)` — then
    /// dispatch rules as [`Self::write_word`] does. Used by
    /// [`ActionTarget::Write`] targets and exposed for direct callers that
    /// want classical bit-mask write semantics (spec §3).
    pub fn write_word_masked(&self, handle: DeviceHandle, addr: u32, value: u32, mask: u32) -> Result<()> {
        let current = self.read_word(handle, addr)?;
        let merged = (current & !mask) | (value & mask);
        self.write_word(handle, addr, merged)
    }

    /// Single-byte read.
    pub fn read_byte(&self, handle: DeviceHandle, addr: u32) -> Result<u8> {
        let instance = self.get(handle).ok_or(SimError::InvalidArgument {
            reason: format!("no such instance {handle}"),
        })?;
        instance.lock().memory().read_byte(addr, handle)
    }

    /// Single-byte write. Coalesces into the one aligned-word engine
    /// notification that byte belongs to (spec §4.B).
    pub fn write_byte(&self, handle: DeviceHandle, addr: u32, value: u8) -> Result<()> {
        self.write_buffer(handle, addr, &[value])
    }

    /// Multi-byte read.
    pub fn read_buffer(&self, handle: DeviceHandle, addr: u32, out: &mut [u8]) -> Result<()> {
        let instance = self.get(handle).ok_or(SimError::InvalidArgument {
            reason: format!("no such instance {handle}"),
        })?;
        instance.lock().memory().read_buffer(addr, out, handle)
    }

    /// Multi-byte write. Stores every byte first, then notifies the rule
    /// engine once per 4-byte-aligned word window the write touched (spec
    /// §4.B: "multi-word buffer writes coalesce into one engine
    /// notification per 4-byte-aligned window").
    pub fn write_buffer(&self, handle: DeviceHandle, addr: u32, data: &[u8]) -> Result<()> {
        let instance = self.get(handle).ok_or(SimError::InvalidArgument {
            reason: format!("no such instance {handle}"),
        })?;
        {
            let mut guard = instance.lock();
            guard.memory_mut().write_buffer(addr, data, handle)?;
        }
        for word_addr in DeviceMemory::aligned_words_touched(addr, data.len()) {
            let value = instance.lock().memory().read_word(word_addr, handle)?;
            let _depth = DepthGuard::enter();
            engine::dispatch(self, handle, word_addr, value, DepthGuard::current());
        }
        Ok(())
    }

    /// Install a rule on an instance's rule set (spec §4.F).
    pub fn install_rule(
        &self,
        handle: DeviceHandle,
        trigger: Trigger,
        targets: Vec<ActionTarget>,
        priority: i32,
        name: impl Into<String>,
    ) -> Result<u64> {
        let instance = self.get(handle).ok_or(SimError::InvalidArgument {
            reason: format!("no such instance {handle}"),
        })?;
        instance
            .lock()
            .rules_mut()
            .install(trigger, targets, priority, name, handle)
    }

    /// Remove a rule by id.
    pub fn remove_rule(&self, handle: DeviceHandle, rule_id: u64) -> Result<()> {
        let instance = self.get(handle).ok_or(SimError::InvalidArgument {
            reason: format!("no such instance {handle}"),
        })?;
        instance.lock().rules_mut().remove(rule_id);
        Ok(())
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices;

    fn manager_with_two_flash() -> DeviceManager {
        let mut manager = DeviceManager::new();
        devices::register_builtin_kinds(&mut manager).unwrap();
        manager.create_device(KindId::Flash, 0).unwrap();
        manager.create_device(KindId::Flash, 1).unwrap();
        manager
    }

    #[test]
    fn register_kind_twice_is_duplicate() {
        let mut manager = DeviceManager::new();
        devices::register_builtin_kinds(&mut manager).unwrap();
        let err = manager
            .register_kind(Arc::new(crate::devices::flash::FlashKind))
            .unwrap_err();
        assert!(matches!(err, SimError::Duplicate { .. }));
    }

    #[test]
    fn create_device_twice_is_duplicate() {
        let mut manager = DeviceManager::new();
        devices::register_builtin_kinds(&mut manager).unwrap();
        manager.create_device(KindId::Flash, 0).unwrap();
        let err = manager.create_device(KindId::Flash, 0).unwrap_err();
        assert!(matches!(err, SimError::Duplicate { .. }));
    }

    #[test]
    fn create_device_unknown_kind_is_invalid_argument() {
        let manager = DeviceManager::new();
        let err = manager.create_device(KindId::Flash, 0).unwrap_err();
        assert!(matches!(err, SimError::InvalidArgument { .. }));
    }

    #[test]
    fn destroy_device_unlinks_and_get_returns_none() {
        let mut manager = DeviceManager::new();
        devices::register_builtin_kinds(&mut manager).unwrap();
        manager.create_device(KindId::Flash, 0).unwrap();
        let h = DeviceHandle::new(KindId::Flash, 0);
        assert!(manager.get(h).is_some());
        manager.destroy_device(h).unwrap();
        assert!(manager.get(h).is_none());
    }

    #[test]
    fn device_isolation_across_same_kind_instances() {
        let manager = manager_with_two_flash();
        let a = DeviceHandle::new(KindId::Flash, 0);
        let b = DeviceHandle::new(KindId::Flash, 1);

        manager.write_word(a, 0x08, 0xAAAA_AAAA).unwrap();
        assert_eq!(manager.read_word(a, 0x08).unwrap(), 0xAAAA_AAAA);
        assert_eq!(manager.read_word(b, 0x08).unwrap(), 0);
    }

    #[test]
    fn write_word_masked_applies_classical_bitmask_semantics() {
        let mut manager = DeviceManager::new();
        devices::register_builtin_kinds(&mut manager).unwrap();
        manager.create_device(KindId::Fpga, 0).unwrap();
        let h = DeviceHandle::new(KindId::Fpga, 0);

        manager.write_word(h, 0x04, 0xFFFF_FFFF).unwrap();
        manager
            .write_word_masked(h, 0x04, 0x0000_00FF, 0x0000_00FF)
            .unwrap();
        assert_eq!(manager.read_word(h, 0x04).unwrap(), 0xFFFF_00FF);
    }

    #[test]
    fn write_buffer_coalesces_into_one_notification_per_aligned_word() {
        let mut manager = DeviceManager::new();
        devices::register_builtin_kinds(&mut manager).unwrap();
        manager.create_device(KindId::Fpga, 0).unwrap();
        let h = DeviceHandle::new(KindId::Fpga, 0);

        let hits: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
        let hits_cb = hits.clone();
        manager
            .install_rule(
                h,
                Trigger::new(0x04, 0, 0),
                vec![ActionTarget::Callback {
                    callback: Arc::new(move |_env| {
                        *hits_cb.lock().unwrap() += 1;
                    }),
                    user_data: 0,
                    handle: h,
                    addr: 0x04,
                    value: 0,
                }],
                0,
                "buffer-coalesce",
            )
            .unwrap();

        manager.write_buffer(h, 0x04, &[1, 2, 3, 4]).unwrap();
        assert_eq!(*hits.lock().unwrap(), 1, "one aligned word touched, one notification");
    }
}
