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

//! Predefined, process-wide rule tables installed at instance init and
//! reinstalled at reset.
//!
//! Grounded on `plugins/<kind>/<kind>_rule_configs.c` in the original
//! source, which wires a static `device_rule_config_t[]` per kind into a
//! diagnostic callback — none of the original's tables write back to a
//! register, they only log. This rewrite keeps that shape: every catalog
//! rule is a `Callback` target that reports through the `log` crate, never
//! a `Write`.

use std::sync::Arc;

use crate::core::error::Result;
use crate::core::handle::{DeviceHandle, KindId};
use crate::core::rule::{ActionTarget, CallbackEnvelope, RuleSet, Trigger};
use crate::devices::{flash, fpga, temp_sensor};

fn log_callback(label: &'static str) -> Arc<dyn Fn(CallbackEnvelope) + Send + Sync> {
    Arc::new(move |env: CallbackEnvelope| {
        log::debug!(
            "{label}: write 0x{:08X} to 0x{:08X}",
            env.triggering_value,
            env.triggering_addr
        );
    })
}

fn callback_rule(
    name: &'static str,
    trigger: Trigger,
    label: &'static str,
    handle: DeviceHandle,
) -> (Trigger, Vec<ActionTarget>, i32, &'static str) {
    let target = ActionTarget::Callback {
        callback: log_callback(label),
        user_data: 0,
        handle,
        addr: trigger.addr,
        value: trigger.expected,
    };
    (trigger, vec![target], 0, name)
}

/// Install `kind_id`'s predefined rule catalog into `rules`, addressed at
/// `handle` (the instance being initialized or reset).
pub(crate) fn install(kind_id: KindId, handle: DeviceHandle, rules: &mut RuleSet) -> Result<()> {
    let entries = match kind_id {
        KindId::Flash => flash_catalog(handle),
        KindId::TempSensor => temp_sensor_catalog(handle),
        KindId::Fpga => fpga_catalog(handle),
    };
    for (trigger, targets, priority, name) in entries {
        rules.install(trigger, targets, priority, name, handle)?;
    }
    Ok(())
}

fn flash_catalog(handle: DeviceHandle) -> Vec<(Trigger, Vec<ActionTarget>, i32, &'static str)> {
    vec![
        callback_rule(
            "flash-erase-log",
            Trigger::new(flash::FLASH_REG_CONTROL, flash::FLASH_CTRL_ERASE, flash::FLASH_CTRL_ERASE),
            "flash erase",
            handle,
        ),
        callback_rule(
            "flash-read-log",
            Trigger::new(flash::FLASH_REG_CONTROL, flash::FLASH_CTRL_READ, flash::FLASH_CTRL_READ),
            "flash read",
            handle,
        ),
        callback_rule(
            "flash-write-log",
            Trigger::new(flash::FLASH_REG_CONTROL, flash::FLASH_CTRL_WRITE, flash::FLASH_CTRL_WRITE),
            "flash write",
            handle,
        ),
    ]
}

fn temp_sensor_catalog(handle: DeviceHandle) -> Vec<(Trigger, Vec<ActionTarget>, i32, &'static str)> {
    vec![
        callback_rule(
            "temp-alert-log",
            Trigger::new(temp_sensor::TEMP_REG, 0, 0),
            "temp sensor alert check",
            handle,
        ),
        callback_rule(
            "temp-config-log",
            Trigger::new(temp_sensor::CONFIG_REG, temp_sensor::CONFIG_ALERT, temp_sensor::CONFIG_ALERT),
            "temp sensor config",
            handle,
        ),
    ]
}

fn fpga_catalog(handle: DeviceHandle) -> Vec<(Trigger, Vec<ActionTarget>, i32, &'static str)> {
    vec![
        callback_rule(
            "fpga-irq-log",
            Trigger::new(fpga::FPGA_IRQ_REG, 0x1, 0x1),
            "fpga irq",
            handle,
        ),
        callback_rule(
            "fpga-control-log",
            Trigger::new(fpga::FPGA_CONTROL_REG, fpga::CTRL_START, fpga::CTRL_START),
            "fpga control",
            handle,
        ),
        callback_rule(
            "fpga-config-log",
            Trigger::new(fpga::FPGA_CONFIG_REG, 0, 0),
            "fpga config",
            handle,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::handle::KindId;

    #[test]
    fn each_kind_catalog_installs_without_error() {
        for kind_id in KindId::ALL {
            let handle = DeviceHandle::new(kind_id, 0);
            let mut rules = RuleSet::new();
            install(kind_id, handle, &mut rules).unwrap();
            assert!(!rules.rules().is_empty());
        }
    }
}
