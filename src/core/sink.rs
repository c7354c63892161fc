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

//! Diagnostic sink: where rule-engine and callback failures are reported.
//!
//! Spec §7: "Callbacks that themselves fail are not retried; their failure
//! is reported to the engine's error channel (an optional sink configured
//! at manager creation; default is silent-drop)."

use std::sync::Mutex;

use crate::core::error::SimError;

/// Receives diagnostics the engine cannot return as a `Result` to any
/// single caller (e.g. a recursion-cap trip several rules deep in a fan-out
/// chain).
pub trait DiagnosticSink: Send + Sync {
    /// Report one error. Must not block on anything that could deadlock
    /// with the instance mutex the engine may still be unwinding through.
    fn report(&self, error: &SimError);
}

/// Routes diagnostics to the `log` crate at `warn` level.
///
/// Not the manager's default (spec §7 is explicit that the default is
/// silent-drop, see [`NullSink`]); opt in with
/// `DeviceManager::with_sink(Arc::new(LogSink))` to wire the teacher's
/// `log`/`env_logger` ambient stack into diagnostics instead.
#[derive(Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, error: &SimError) {
        log::warn!("device-sim diagnostic: {error}");
    }
}

/// Drops every diagnostic. [`crate::core::manager::DeviceManager::new`]'s
/// default sink (spec §7: "default is silent-drop").
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _error: &SimError) {}
}

/// Collects diagnostics for test assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<SimError>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn records(&self) -> Vec<SimError> {
        self.records.lock().unwrap().clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, error: &SimError) {
        self.records.lock().unwrap().push(error.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::handle::{DeviceHandle, KindId};

    #[test]
    fn recording_sink_collects_in_order() {
        let sink = RecordingSink::new();
        let h = DeviceHandle::new(KindId::Flash, 0);
        sink.report(&SimError::NoTarget { handle: h });
        sink.report(&SimError::RecursionCap { handle: h, cap: 16 });
        assert_eq!(sink.records().len(), 2);
    }

    #[test]
    fn null_sink_drops_everything() {
        let sink = NullSink;
        sink.report(&SimError::NoTarget {
            handle: DeviceHandle::new(KindId::Flash, 0),
        });
        // Nothing to assert beyond "did not panic".
    }
}
