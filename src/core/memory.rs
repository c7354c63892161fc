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

//! Ordered set of regions belonging to one device instance.
//!
//! `DeviceMemory` has no knowledge of the rule engine. A word write is
//! stored here, then the caller (the instance's [`crate::core::kind::DeviceKind::write`]
//! hook, invoked from [`crate::core::manager::DeviceManager`]) decides
//! whether to notify the rule engine. Keeping that decision one layer up
//! avoids giving `DeviceMemory` a back-reference to anything, which would
//! recreate the cyclic ownership spec.md §9 warns against.

use crate::core::error::{Result, SimError};
use crate::core::handle::DeviceHandle;
use crate::core::region::Region;

/// Ordered collection of [`Region`]s for one device instance.
///
/// Regions are kept sorted by base address (spec: "regions of one device
/// are disjoint and stored in base-address order"). Lookup is a linear scan
/// — regions per device are 1-3 in practice, so this stays branch-predictable
/// and is not worth a tree.
#[derive(Debug, Default)]
pub struct DeviceMemory {
    regions: Vec<Region>,
}

impl DeviceMemory {
    /// Create an empty device memory with no regions.
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
        }
    }

    /// Add a region, keeping the region list sorted by base address.
    ///
    /// # Panics
    ///
    /// Panics if the new region's span overlaps an existing one — regions
    /// of one device must be disjoint (spec invariant); an overlap here is
    /// a bug in the device kind laying out its own memory, not a runtime
    /// condition a caller can recover from.
    pub fn add_region(&mut self, region: Region) {
        let span = region.span();
        assert!(
            self.regions.iter().all(|r| {
                let other = r.span();
                span.end <= other.start || other.end <= span.start
            }),
            "region span {span:?} overlaps an existing region"
        );
        let idx = self
            .regions
            .partition_point(|r| r.base_addr() < region.base_addr());
        self.regions.insert(idx, region);
    }

    fn region_for(&self, addr: u32, handle: DeviceHandle) -> Result<&Region> {
        self.regions
            .iter()
            .find(|r| r.contains(addr))
            .ok_or(SimError::OutOfRange { addr, handle })
    }

    fn region_for_mut(&mut self, addr: u32, handle: DeviceHandle) -> Result<&mut Region> {
        self.regions
            .iter_mut()
            .find(|r| r.contains(addr))
            .ok_or(SimError::OutOfRange { addr, handle })
    }

    /// Read a 32-bit little-endian word.
    ///
    /// Word access must be 4-byte aligned; this crate's fixed policy
    /// (spec.md's Open Question on misalignment) is to reject unaligned
    /// access rather than silently downgrade to a byte-wise read.
    pub fn read_word(&self, addr: u32, handle: DeviceHandle) -> Result<u32> {
        if addr % 4 != 0 {
            return Err(SimError::Misaligned { addr });
        }
        let region = self.region_for(addr, handle)?;
        if addr + 4 > region.span().end {
            return Err(SimError::OutOfRange { addr, handle });
        }
        Ok(region.read_word(addr))
    }

    /// Write a 32-bit little-endian word.
    pub fn write_word(&mut self, addr: u32, value: u32, handle: DeviceHandle) -> Result<()> {
        if addr % 4 != 0 {
            return Err(SimError::Misaligned { addr });
        }
        let region = self.region_for_mut(addr, handle)?;
        if addr + 4 > region.span().end {
            return Err(SimError::OutOfRange { addr, handle });
        }
        region.write_word(addr, value);
        Ok(())
    }

    /// Read a single byte. Byte access has no alignment requirement.
    pub fn read_byte(&self, addr: u32, handle: DeviceHandle) -> Result<u8> {
        Ok(self.region_for(addr, handle)?.read_byte(addr))
    }

    /// Write a single byte.
    pub fn write_byte(&mut self, addr: u32, value: u8, handle: DeviceHandle) -> Result<()> {
        self.region_for_mut(addr, handle)?.write_byte(addr, value);
        Ok(())
    }

    /// Read `out.len()` bytes starting at `addr`.
    ///
    /// The whole span must lie within a single region; spanning two
    /// regions in one call is out of range (a device's regions model
    /// distinct register/data banks, not one flat address space).
    pub fn read_buffer(&self, addr: u32, out: &mut [u8], handle: DeviceHandle) -> Result<()> {
        let region = self.region_for(addr, handle)?;
        let end = addr as u64 + out.len() as u64;
        if end > region.span().end as u64 {
            return Err(SimError::OutOfRange { addr, handle });
        }
        region.read_buffer(addr, out);
        Ok(())
    }

    /// Write `data` starting at `addr`.
    pub fn write_buffer(&mut self, addr: u32, data: &[u8], handle: DeviceHandle) -> Result<()> {
        let region = self.region_for_mut(addr, handle)?;
        let end = addr as u64 + data.len() as u64;
        if end > region.span().end as u64 {
            return Err(SimError::OutOfRange { addr, handle });
        }
        region.write_buffer(addr, data);
        Ok(())
    }

    /// The 4-byte-aligned words touched by a `[addr, addr+len)` byte range.
    ///
    /// Used by the manager to coalesce a buffer write into one rule-engine
    /// notification per aligned word, per spec.md §4.B.
    pub fn aligned_words_touched(addr: u32, len: usize) -> impl Iterator<Item = u32> {
        let start = addr & !0x3;
        let end = (addr + len as u32).div_ceil(4) * 4;
        (start..end).step_by(4)
    }
}
