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

//! Rule dispatch and the action executor.
//!
//! The manager calls [`dispatch`] after a word write has already been
//! stored. `dispatch` snapshots matching rules under the instance lock,
//! releases it, then runs each target through [`execute_target`] — which
//! may itself call back into [`crate::core::manager::DeviceManager::write_word`],
//! re-entering this module. Recursion is bounded by a thread-local depth
//! counter (spec §4.G policy (a)), not by detecting cycles.

use std::cell::Cell;

use crate::core::error::SimError;
use crate::core::handle::DeviceHandle;
use crate::core::manager::DeviceManager;
use crate::core::rule::{ActionTarget, CallbackEnvelope, Rule};

thread_local! {
    static DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// RAII guard incrementing the thread-local rule-chain depth for the
/// lifetime of one [`crate::core::manager::DeviceManager::write_word`] call
/// (top-level or nested).
pub(crate) struct DepthGuard {
    _private: (),
}

impl DepthGuard {
    /// Enter one nesting level, returning a guard that exits it on drop.
    pub(crate) fn enter() -> Self {
        DEPTH.with(|d| d.set(d.get() + 1));
        DepthGuard { _private: () }
    }

    /// Current nesting level (after [`Self::enter`] has been called for
    /// this frame).
    pub(crate) fn current() -> u32 {
        DEPTH.with(|d| d.get())
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Snapshot matching rules for `(handle, addr, value)` and dispatch their
/// targets in priority+insertion order.
///
/// Called by the manager after the triggering value has already been
/// stored. Does nothing if `depth` has exceeded `manager`'s recursion cap
/// — the store already happened, only further cascading is suppressed.
pub(crate) fn dispatch(manager: &DeviceManager, handle: DeviceHandle, addr: u32, value: u32, depth: u32) {
    if depth > manager.recursion_cap() {
        manager.sink().report(&SimError::RecursionCap {
            handle,
            cap: manager.recursion_cap(),
        });
        return;
    }

    let Some(instance) = manager.get(handle) else {
        return;
    };
    let matched: Vec<Rule> = {
        let guard = instance.lock();
        guard.rules().matching(addr, value)
    };

    for rule in &matched {
        for target in rule.targets() {
            execute_target(target, manager, addr, value);
        }
    }
}

/// Perform one target's effect.
fn execute_target(target: &ActionTarget, manager: &DeviceManager, triggering_addr: u32, triggering_value: u32) {
    match target {
        ActionTarget::Write {
            handle,
            addr,
            value,
            mask,
        } => {
            if manager.get(*handle).is_none() {
                manager
                    .sink()
                    .report(&SimError::NoTarget { handle: *handle });
                return;
            }
            if let Err(e) = manager.write_word_masked(*handle, *addr, *value, *mask) {
                manager.sink().report(&e);
            }
        }
        ActionTarget::Callback {
            callback,
            user_data,
            handle,
            addr,
            value,
        } => {
            let _ = handle;
            callback(CallbackEnvelope {
                triggering_addr,
                triggering_value,
                target_addr: *addr,
                target_value: *value,
                user_data: *user_data,
            });
        }
        ActionTarget::Signal => {
            // Reserved; no semantics defined (spec §9 Open Questions).
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_guard_tracks_nesting() {
        assert_eq!(DepthGuard::current(), 0);
        {
            let _g1 = DepthGuard::enter();
            assert_eq!(DepthGuard::current(), 1);
            {
                let _g2 = DepthGuard::enter();
                assert_eq!(DepthGuard::current(), 2);
            }
            assert_eq!(DepthGuard::current(), 1);
        }
        assert_eq!(DepthGuard::current(), 0);
    }
}
