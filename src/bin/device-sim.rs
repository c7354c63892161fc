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

//! Illustrative front-end over the device simulator library.
//!
//! This binary is deliberately thin — the spec treats the CLI/test-harness
//! front end as an external collaborator, not part of the specified core
//! (spec §1). It exists to exercise the library end to end and to give the
//! end-to-end scenarios of spec §8 a runnable home, the way
//! `src/test/*_test.c` gave the original's scenarios a runnable home.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;
use device_sim::config::SimConfig;
use device_sim::core::error::SimError;
use device_sim::core::handle::{DeviceHandle, KindId};
use device_sim::core::manager::DeviceManager;
use device_sim::core::rule::{ActionTarget, CallbackEnvelope, Trigger};
use device_sim::core::sink::LogSink;
use device_sim::devices;

/// Run built-in device simulator scenarios.
#[derive(Parser)]
#[command(name = "device-sim")]
#[command(about = "Run the device simulator's built-in scenarios")]
struct Cli {
    /// Run only FLASH scenarios.
    #[arg(long)]
    flash: bool,
    /// Run only TEMP_SENSOR scenarios.
    #[arg(long = "temp-sensor")]
    temp_sensor: bool,
    /// Run only FPGA scenarios.
    #[arg(long)]
    fpga: bool,
    /// Run every scenario (default when no other flag is given).
    #[arg(long)]
    all: bool,
    /// Increase log verbosity; repeat for more (-v, -vv).
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
    /// Path to a TOML config file overriding the recursion cap and enabled
    /// device kinds. Defaults to [`SimConfig::default`] when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

struct Scenario {
    name: &'static str,
    run: fn(&SimConfig) -> Result<(), String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => match SimConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("failed to load config from {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => SimConfig::default(),
    };

    let run_all = cli.all || !(cli.flash || cli.temp_sensor || cli.fpga);
    let mut scenarios: Vec<Scenario> = Vec::new();

    if run_all || cli.flash {
        scenarios.push(Scenario {
            name: "S1 flash status write-ready",
            run: scenario_s1_flash_status,
        });
        scenarios.push(Scenario {
            name: "S6 flash out-of-range write",
            run: scenario_s6_flash_out_of_range,
        });
    }
    if run_all || cli.temp_sensor {
        scenarios.push(Scenario {
            name: "S2 cross-device rule",
            run: scenario_s2_temp_sensor_cross_device,
        });
    }
    if run_all || cli.fpga {
        scenarios.push(Scenario {
            name: "S3 callback fan-out",
            run: scenario_s3_fpga_callback_fan_out,
        });
        scenarios.push(Scenario {
            name: "S4 masked mismatch",
            run: scenario_s4_fpga_masked_mismatch,
        });
        scenarios.push(Scenario {
            name: "S5 priority ordering",
            run: scenario_s5_fpga_priority_ordering,
        });
    }

    let mut all_ok = true;
    for scenario in &scenarios {
        match (scenario.run)(&config) {
            Ok(()) => log::info!("{}: ok", scenario.name),
            Err(e) => {
                log::error!("{}: FAILED ({e})", scenario.name);
                all_ok = false;
            }
        }
    }

    if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Build a manager from `config`: recursion cap, enabled kinds, and a
/// `LogSink` so this binary's diagnostics actually surface through the
/// `env_logger` setup `main` already performs — the library's own default
/// (spec §7's silent-drop) stays untouched for embedders that never ask.
fn new_manager(config: &SimConfig) -> DeviceManager {
    let mut manager = DeviceManager::with_sink(Arc::new(LogSink)).with_recursion_cap(config.recursion_limit);
    devices::register_kinds_by_name(&mut manager, &config.enabled_kinds)
        .expect("configured device kinds register cleanly");
    manager
}

fn scenario_s1_flash_status(config: &SimConfig) -> Result<(), String> {
    let manager = new_manager(config);
    manager
        .create_device(KindId::Flash, 0)
        .map_err(|e| e.to_string())?;
    let h = DeviceHandle::new(KindId::Flash, 0);

    manager
        .write_word(h, 0x00, 0x04)
        .map_err(|e| e.to_string())?;
    let status = manager.read_word(h, 0x00).map_err(|e| e.to_string())?;
    if status != 0x04 {
        return Err(format!("expected status 0x04, got 0x{status:08X}"));
    }
    Ok(())
}

fn scenario_s6_flash_out_of_range(config: &SimConfig) -> Result<(), String> {
    let manager = new_manager(config);
    manager
        .create_device(KindId::Flash, 0)
        .map_err(|e| e.to_string())?;
    let h = DeviceHandle::new(KindId::Flash, 0);

    match manager.write_word(h, 0x14, 0xFFFF_FFFF) {
        Err(SimError::OutOfRange { .. }) => Ok(()),
        Err(other) => Err(format!("expected out-of-range, got {other}")),
        Ok(()) => Err("expected out-of-range write to fail".into()),
    }
}

fn scenario_s2_temp_sensor_cross_device(config: &SimConfig) -> Result<(), String> {
    let manager = new_manager(config);
    manager
        .create_device(KindId::TempSensor, 0)
        .map_err(|e| e.to_string())?;
    let h = DeviceHandle::new(KindId::TempSensor, 0);

    manager
        .install_rule(
            h,
            Trigger::new(0x04, 0x3, 0xFFFF_FFFF),
            vec![ActionTarget::Write {
                handle: h,
                addr: 0x08,
                value: 0x5,
                mask: 0xFFFF_FFFF,
            }],
            0,
            "s2-cross-device",
        )
        .map_err(|e| e.to_string())?;

    manager.write_word(h, 0x04, 0x3).map_err(|e| e.to_string())?;
    let value = manager.read_word(h, 0x08).map_err(|e| e.to_string())?;
    if value != 0x5 {
        return Err(format!("expected 0x5 at 0x08, got 0x{value:08X}"));
    }
    Ok(())
}

fn scenario_s3_fpga_callback_fan_out(config: &SimConfig) -> Result<(), String> {
    let manager = new_manager(config);
    manager
        .create_device(KindId::Fpga, 0)
        .map_err(|e| e.to_string())?;
    let h = DeviceHandle::new(KindId::Fpga, 0);

    let sink: Arc<Mutex<Vec<(u32, u32)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_for_callback = sink.clone();

    manager
        .install_rule(
            h,
            Trigger::new(0x0C, 0x1, 0x1),
            vec![
                ActionTarget::Callback {
                    callback: Arc::new(move |env: CallbackEnvelope| {
                        sink_for_callback
                            .lock()
                            .unwrap()
                            .push((env.triggering_addr, env.triggering_value));
                    }),
                    user_data: 0,
                    handle: h,
                    addr: 0x0C,
                    value: 0x1,
                },
                ActionTarget::Write {
                    handle: h,
                    addr: 0x10,
                    value: 0xDEAD_BEEF,
                    mask: 0xFFFF_FFFF,
                },
            ],
            0,
            "s3-callback-fan-out",
        )
        .map_err(|e| e.to_string())?;

    manager.write_word(h, 0x0C, 0x1).map_err(|e| e.to_string())?;

    let recorded = sink.lock().unwrap().clone();
    if recorded != vec![(0x0C, 0x1)] {
        return Err(format!("expected exactly one (0x0C, 0x1) record, got {recorded:?}"));
    }
    let data = manager.read_word(h, 0x10).map_err(|e| e.to_string())?;
    if data != 0xDEAD_BEEF {
        return Err(format!("expected 0xDEADBEEF at 0x10, got 0x{data:08X}"));
    }
    Ok(())
}

fn scenario_s4_fpga_masked_mismatch(config: &SimConfig) -> Result<(), String> {
    let manager = new_manager(config);
    manager
        .create_device(KindId::Fpga, 0)
        .map_err(|e| e.to_string())?;
    let h = DeviceHandle::new(KindId::Fpga, 0);

    manager
        .install_rule(
            h,
            Trigger::new(0x10, 0x01, 0x01),
            vec![ActionTarget::Write {
                handle: h,
                addr: 0x10,
                value: 0xFFFF_FFFF,
                mask: 0xFFFF_FFFF,
            }],
            0,
            "s4-masked-mismatch",
        )
        .map_err(|e| e.to_string())?;

    manager.write_word(h, 0x10, 0xFE).map_err(|e| e.to_string())?;
    let value = manager.read_word(h, 0x10).map_err(|e| e.to_string())?;
    if value != 0xFE {
        return Err(format!("rule fired unexpectedly, 0x10 now 0x{value:08X}"));
    }
    Ok(())
}

fn scenario_s5_fpga_priority_ordering(config: &SimConfig) -> Result<(), String> {
    let manager = new_manager(config);
    manager
        .create_device(KindId::Fpga, 0)
        .map_err(|e| e.to_string())?;
    let h = DeviceHandle::new(KindId::Fpga, 0);

    manager
        .install_rule(
            h,
            Trigger::new(0x20, 0x1, 0xFFFF_FFFF),
            vec![ActionTarget::Write {
                handle: h,
                addr: 0x30,
                value: 0xAA,
                mask: 0xFFFF_FFFF,
            }],
            10,
            "s5-priority-10",
        )
        .map_err(|e| e.to_string())?;
    manager
        .install_rule(
            h,
            Trigger::new(0x20, 0x1, 0xFFFF_FFFF),
            vec![ActionTarget::Write {
                handle: h,
                addr: 0x30,
                value: 0xBB,
                mask: 0xFFFF_FFFF,
            }],
            20,
            "s5-priority-20",
        )
        .map_err(|e| e.to_string())?;

    manager.write_word(h, 0x20, 0x1).map_err(|e| e.to_string())?;
    let value = manager.read_word(h, 0x30).map_err(|e| e.to_string())?;
    if value != 0xBB {
        return Err(format!("expected final value 0xBB, got 0x{value:08X}"));
    }
    Ok(())
}
