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

//! Triggers, action targets, rules, and the per-instance rule set.

use std::sync::Arc;

use crate::core::error::{Result, SimError};
use crate::core::handle::DeviceHandle;

/// Maximum number of targets one rule may fan out to.
///
/// The original source (`device_rules.h`) fixes this at 8 per kind; kept
/// as the same bound here.
pub const MAX_TARGETS: usize = 8;

/// Maximum number of rules one device instance's rule set may hold.
pub const MAX_RULES: usize = 8;

/// Match criterion for a rule: fires when `(written_value & mask) ==
/// (expected & mask)` at `addr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    /// Address the trigger watches
    pub addr: u32,
    /// Expected value, masked by `mask` before comparison
    pub expected: u32,
    /// Bits that participate in the comparison
    pub mask: u32,
}

impl Trigger {
    /// Construct a trigger.
    pub const fn new(addr: u32, expected: u32, mask: u32) -> Self {
        Self {
            addr,
            expected,
            mask,
        }
    }

    /// `true` if a write of `value` to this trigger's address matches.
    pub const fn matches(&self, value: u32) -> bool {
        (value & self.mask) == (self.expected & self.mask)
    }
}

/// Envelope delivered to a [`ActionTarget::Callback`] when it fires.
#[derive(Debug, Clone, Copy)]
pub struct CallbackEnvelope {
    /// Address that was written to trigger the rule
    pub triggering_addr: u32,
    /// Value that was written to trigger the rule
    pub triggering_value: u32,
    /// Address configured on the callback target
    pub target_addr: u32,
    /// Value configured on the callback target
    pub target_value: u32,
    /// Opaque data supplied at rule-install time
    pub user_data: u64,
}

/// The effect executed when a rule matches.
#[derive(Clone)]
pub enum ActionTarget {
    /// Write `(current & !mask) | (value & mask)` to another (or the same)
    /// device instance.
    Write {
        /// The device to write to
        handle: DeviceHandle,
        /// Address within the target device
        addr: u32,
        /// Value to write
        value: u32,
        /// Bits of `value` that actually apply
        mask: u32,
    },
    /// Invoke a callback with a [`CallbackEnvelope`].
    ///
    /// Callbacks must be fast and must not try to lock the instance mutex
    /// they are already inside (spec: doing so is a programming error, not
    /// a core bug, and this crate does not attempt to detect it).
    Callback {
        /// The function to invoke
        callback: Arc<dyn Fn(CallbackEnvelope) + Send + Sync>,
        /// Opaque data threaded into the envelope
        user_data: u64,
        /// Device the callback reports as the source of this effect
        handle: DeviceHandle,
        /// Address reported in the envelope
        addr: u32,
        /// Value reported in the envelope
        value: u32,
    },
    /// Reserved; currently a documented no-op.
    Signal,
}

impl std::fmt::Debug for ActionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionTarget::Write {
                handle,
                addr,
                value,
                mask,
            } => f
                .debug_struct("Write")
                .field("handle", handle)
                .field("addr", addr)
                .field("value", value)
                .field("mask", mask)
                .finish(),
            ActionTarget::Callback {
                handle, addr, value, ..
            } => f
                .debug_struct("Callback")
                .field("handle", handle)
                .field("addr", addr)
                .field("value", value)
                .finish(),
            ActionTarget::Signal => f.write_str("Signal"),
        }
    }
}

/// A trigger paired with an ordered, bounded list of targets.
#[derive(Debug, Clone)]
pub struct Rule {
    id: u64,
    trigger: Trigger,
    targets: Vec<ActionTarget>,
    priority: i32,
    active: bool,
    name: String,
    seq: u64,
}

impl Rule {
    /// Stable id returned by [`RuleSet::install`].
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The trigger this rule watches.
    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// Targets in install order.
    pub fn targets(&self) -> &[ActionTarget] {
        &self.targets
    }

    /// Lower value fires first among rules matching the same address.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether this rule currently participates in dispatch.
    pub fn active(&self) -> bool {
        self.active
    }

    /// Rule name, for lookup and diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enable or disable this rule without removing it.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Ordered rule collection attached to one device instance.
///
/// Ordering for dispatch is by ascending `priority`, ties broken by
/// insertion order (spec §3, §4.G property 5 and 6). The set does not
/// itself lock anything — it lives inside the same `Mutex` as the owning
/// instance's [`crate::core::memory::DeviceMemory`] (spec §5: "rule-set
/// mutex is logically part of the instance mutex").
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    next_id: u64,
    next_seq: u64,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            next_id: 1,
            next_seq: 0,
        }
    }

    /// Install a rule, replacing any existing rule of the same `name` in
    /// place (same position, same id; every other field is replaced) per
    /// spec §4.F and §8 property 8. Two rules with different names may
    /// share a trigger address (spec §8 scenario S5 relies on this: two
    /// differently-named rules on one address, fired in priority order).
    ///
    /// # Errors
    ///
    /// Returns [`SimError::TooManyTargets`] if `targets` exceeds
    /// [`MAX_TARGETS`], or [`SimError::Capacity`] if the set is full and no
    /// existing rule shares this name. Both are caller-supplied-data
    /// failures (spec §7: "the core never aborts the process on rule
    /// failure; it records the error and continues"), never a panic.
    pub fn install(
        &mut self,
        trigger: Trigger,
        targets: Vec<ActionTarget>,
        priority: i32,
        name: impl Into<String>,
        handle: DeviceHandle,
    ) -> Result<u64> {
        if targets.len() > MAX_TARGETS {
            return Err(SimError::TooManyTargets {
                handle,
                capacity: MAX_TARGETS,
            });
        }
        let name = name.into();
        if let Some(existing) = self.rules.iter_mut().find(|r| r.name == name) {
            existing.trigger = trigger;
            existing.targets = targets;
            existing.priority = priority;
            existing.name = name;
            existing.active = true;
            return Ok(existing.id);
        }
        if self.rules.len() >= MAX_RULES {
            return Err(SimError::Capacity {
                handle,
                capacity: MAX_RULES,
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.rules.push(Rule {
            id,
            trigger,
            targets,
            priority,
            active: true,
            name,
            seq,
        });
        Ok(id)
    }

    /// Remove a rule by id. No-op if the id is not present.
    pub fn remove(&mut self, rule_id: u64) {
        self.rules.retain(|r| r.id != rule_id);
    }

    /// Look up a rule by its install-time name.
    pub fn find_by_name(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// All rules currently installed, for inspection/testing.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Active rules whose trigger address is `addr` and whose trigger
    /// matches `value`, in priority+insertion dispatch order.
    pub fn matching(&self, addr: u32, value: u32) -> Vec<Rule> {
        let mut matched: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|r| r.active && r.trigger.addr == addr && r.trigger.matches(value))
            .collect();
        matched.sort_by_key(|r| (r.priority, r.seq));
        matched.into_iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::handle::KindId;

    fn h() -> DeviceHandle {
        DeviceHandle::new(KindId::Fpga, 0)
    }

    #[test]
    fn match_correctness() {
        let t = Trigger::new(0x10, 0x01, 0x01);
        assert!(t.matches(0xFF)); // bit 0 set
        assert!(!t.matches(0xFE)); // bit 0 clear
    }

    #[test]
    fn install_replaces_same_name_in_place() {
        let mut rs = RuleSet::new();
        let t1 = Trigger::new(0x20, 1, 0xFFFF_FFFF);
        let id1 = rs
            .install(t1, vec![ActionTarget::Signal], 10, "r1", h())
            .unwrap();
        let t2 = Trigger::new(0x24, 2, 0xFFFF_FFFF);
        let id2 = rs
            .install(t2, vec![ActionTarget::Signal, ActionTarget::Signal], 20, "r1", h())
            .unwrap();
        assert_eq!(id1, id2, "replacement keeps the original rule id");
        assert_eq!(rs.rules().len(), 1);
        assert_eq!(rs.rules()[0].targets().len(), 2);
        assert_eq!(rs.rules()[0].trigger().addr, 0x24);
    }

    #[test]
    fn priority_then_insertion_order() {
        // Two distinctly-named rules on the same address (spec §8 S5):
        // both survive, and `matching` orders lower priority first.
        let mut rs = RuleSet::new();
        rs.install(
            Trigger::new(0x30, 1, 0xFFFF_FFFF),
            vec![ActionTarget::Signal],
            20,
            "p20",
            h(),
        )
        .unwrap();
        rs.install(
            Trigger::new(0x30, 1, 0xFFFF_FFFF),
            vec![ActionTarget::Signal],
            10,
            "p10",
            h(),
        )
        .unwrap();
        assert_eq!(rs.rules().len(), 2);
        let matched = rs.matching(0x30, 1);
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].name(), "p10");
        assert_eq!(matched[1].name(), "p20");
    }

    #[test]
    fn install_same_name_twice_replaces_not_appends() {
        let mut rs = RuleSet::new();
        rs.install(
            Trigger::new(0x30, 1, 0xFFFF_FFFF),
            vec![ActionTarget::Signal],
            20,
            "only",
            h(),
        )
        .unwrap();
        rs.install(
            Trigger::new(0x34, 1, 0xFFFF_FFFF),
            vec![ActionTarget::Signal],
            5,
            "only",
            h(),
        )
        .unwrap();
        assert_eq!(rs.rules().len(), 1);
        assert_eq!(rs.rules()[0].trigger().addr, 0x34);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut rs = RuleSet::new();
        for i in 0..MAX_RULES {
            rs.install(
                Trigger::new(i as u32 * 4, 1, 1),
                vec![ActionTarget::Signal],
                0,
                format!("r{i}"),
                h(),
            )
            .unwrap();
        }
        let err = rs
            .install(
                Trigger::new(0xFFFF, 1, 1),
                vec![ActionTarget::Signal],
                0,
                "overflow",
                h(),
            )
            .unwrap_err();
        assert!(matches!(err, SimError::Capacity { .. }));
    }

    #[test]
    fn install_rejects_oversized_target_list_without_panicking() {
        let mut rs = RuleSet::new();
        let targets = (0..=MAX_TARGETS).map(|_| ActionTarget::Signal).collect();
        let err = rs
            .install(Trigger::new(0x60, 1, 1), targets, 0, "too-many", h())
            .unwrap_err();
        assert!(matches!(err, SimError::TooManyTargets { .. }));
        assert!(rs.rules().is_empty());
    }

    #[test]
    fn remove_drops_rule() {
        let mut rs = RuleSet::new();
        let id = rs
            .install(
                Trigger::new(0x50, 1, 1),
                vec![ActionTarget::Signal],
                0,
                "r",
                h(),
            )
            .unwrap();
        rs.remove(id);
        assert!(rs.rules().is_empty());
    }
}
