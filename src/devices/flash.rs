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

//! NOR-flash-like device: status/control/config/address/data registers plus
//! a 64KB byte-addressable data region.
//!
//! Grounded on `plugins/flash/flash_device.h` and `flash_device.c`. The
//! header also defines `FLASH_REG_SIZE` at `0x14`, but scenario S6 of the
//! specification is explicit that the flash register region ends at
//! `0x14` and that address is the first unmapped word — so this module
//! maps only the five registers below and leaves `0x14` out of range
//! (documented in DESIGN.md).

use crate::core::error::Result;
use crate::core::handle::DeviceHandle;
use crate::core::instance::InstanceState;
use crate::core::kind::DeviceKind;
use crate::core::memory::DeviceMemory;
use crate::core::region::Region;
use crate::core::rule::RuleSet;
use crate::core::{catalog, handle::KindId};

/// Status register (R).
pub const FLASH_REG_STATUS: u32 = 0x00;
/// Control register (W) — accepts [`FLASH_CTRL_READ`]/[`FLASH_CTRL_WRITE`]/[`FLASH_CTRL_ERASE`].
pub const FLASH_REG_CONTROL: u32 = 0x04;
/// Configuration register (R/W).
pub const FLASH_REG_CONFIG: u32 = 0x08;
/// Address register (R/W), used by read/write/erase commands.
pub const FLASH_REG_ADDRESS: u32 = 0x0C;
/// Data register (R/W), the last byte of one in-flight read/write command.
pub const FLASH_REG_DATA: u32 = 0x10;

/// Busy performing a command.
pub const FLASH_STATUS_BUSY: u32 = 0x01;
/// Last command failed.
pub const FLASH_STATUS_ERROR: u32 = 0x02;
/// Idle and ready for a new command.
pub const FLASH_STATUS_READY: u32 = 0x04;
/// Status register write protection.
pub const FLASH_STATUS_SRWD: u32 = 0x08;
/// Write-enable latch.
pub const FLASH_STATUS_WEL: u32 = 0x10;

/// Read command.
pub const FLASH_CTRL_READ: u32 = 0x01;
/// Write command.
pub const FLASH_CTRL_WRITE: u32 = 0x02;
/// Erase command.
pub const FLASH_CTRL_ERASE: u32 = 0x03;

/// Base address of the byte-addressable data region.
pub const FLASH_DATA_START: u32 = 0x1000;
/// Size of the data region in bytes.
pub const FLASH_MEM_SIZE: u32 = 64 * 1024;

/// Per-instance FLASH state.
pub struct FlashState {
    /// Device memory: register region `[0x00, 0x14)` plus the data region.
    pub memory: DeviceMemory,
    /// Installed rules, seeded from [`catalog`] at init and reset.
    pub rules: RuleSet,
}

/// Capability table for the FLASH kind.
pub struct FlashKind;

impl DeviceKind for FlashKind {
    fn kind_id(&self) -> KindId {
        KindId::Flash
    }

    fn name(&self) -> &str {
        "FLASH"
    }

    fn new_state(&self) -> InstanceState {
        InstanceState::Flash(FlashState {
            memory: DeviceMemory::new(),
            rules: RuleSet::new(),
        })
    }

    fn init(&self, state: &mut InstanceState, handle: DeviceHandle) -> Result<()> {
        let flash = as_flash_mut(state);
        flash.memory.add_region(Region::new(0x0, 4, 5)); // 0x00..0x14
        flash.memory.add_region(Region::new(FLASH_DATA_START, 1, FLASH_MEM_SIZE));
        flash.memory.write_word(FLASH_REG_STATUS, FLASH_STATUS_READY, handle)?;
        catalog::install(KindId::Flash, handle, &mut flash.rules)
    }

    fn read(&self, state: &InstanceState, handle: DeviceHandle, addr: u32) -> Result<u32> {
        as_flash(state).memory.read_word(addr, handle)
    }

    fn write(&self, state: &mut InstanceState, handle: DeviceHandle, addr: u32, value: u32) -> Result<()> {
        let flash = as_flash_mut(state);
        flash.memory.write_word(addr, value, handle)?;
        if addr == FLASH_REG_CONTROL {
            apply_control_command(flash, handle, value)?;
        }
        Ok(())
    }

    fn reset(&self, state: &mut InstanceState, handle: DeviceHandle) -> Result<()> {
        let flash = as_flash_mut(state);
        flash.memory.write_word(FLASH_REG_STATUS, FLASH_STATUS_READY, handle)?;
        catalog::install(KindId::Flash, handle, &mut flash.rules)
    }
}

fn apply_control_command(flash: &mut FlashState, handle: DeviceHandle, command: u32) -> Result<()> {
    if command & FLASH_CTRL_ERASE == FLASH_CTRL_ERASE {
        let zeros = vec![0u8; FLASH_MEM_SIZE as usize];
        flash.memory.write_buffer(FLASH_DATA_START, &zeros, handle)?;
        flash.memory.write_word(FLASH_REG_STATUS, FLASH_STATUS_READY, handle)?;
    } else if command & FLASH_CTRL_WRITE == FLASH_CTRL_WRITE {
        flash.memory.write_word(FLASH_REG_STATUS, FLASH_STATUS_READY, handle)?;
    } else if command & FLASH_CTRL_READ == FLASH_CTRL_READ {
        flash.memory.write_word(FLASH_REG_STATUS, FLASH_STATUS_READY, handle)?;
    }
    Ok(())
}

fn as_flash(state: &InstanceState) -> &FlashState {
    match state {
        InstanceState::Flash(s) => s,
        _ => unreachable!("manager routed a non-FLASH instance into FlashKind"),
    }
}

fn as_flash_mut(state: &mut InstanceState) -> &mut FlashState {
    match state {
        InstanceState::Flash(s) => s,
        _ => unreachable!("manager routed a non-FLASH instance into FlashKind"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h() -> DeviceHandle {
        DeviceHandle::new(KindId::Flash, 0)
    }

    #[test]
    fn status_register_round_trips() {
        let mut state = FlashKind.new_state();
        FlashKind.init(&mut state, h()).unwrap();
        FlashKind.write(&mut state, h(), FLASH_REG_STATUS, 0x04).unwrap();
        assert_eq!(FlashKind.read(&state, h(), FLASH_REG_STATUS).unwrap(), 0x04);
    }

    #[test]
    fn size_register_address_is_out_of_range() {
        let mut state = FlashKind.new_state();
        FlashKind.init(&mut state, h()).unwrap();
        let err = FlashKind.read(&state, h(), 0x14).unwrap_err();
        assert!(matches!(err, crate::core::error::SimError::OutOfRange { .. }));
    }

    #[test]
    fn erase_command_zeroes_data_region() {
        let mut state = FlashKind.new_state();
        FlashKind.init(&mut state, h()).unwrap();
        FlashKind
            .write(&mut state, h(), FLASH_DATA_START, 0xFFFF_FFFF)
            .unwrap();
        FlashKind
            .write(&mut state, h(), FLASH_REG_CONTROL, FLASH_CTRL_ERASE)
            .unwrap();
        assert_eq!(FlashKind.read(&state, h(), FLASH_DATA_START).unwrap(), 0);
        assert_eq!(
            FlashKind.read(&state, h(), FLASH_REG_STATUS).unwrap(),
            FLASH_STATUS_READY
        );
    }
}
