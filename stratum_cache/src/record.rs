// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-capacity pool of reusable block surfaces with least-recently-used eviction.

use alloc::boxed::Box;
use alloc::vec::Vec;
use kurbo::{Affine, Rect, Size};

use crate::backend::{CacheBackend, CacheSurface};
use crate::config::{CacheConfig, CacheConfigError};

/// Handle to a record assigned to one holder.
///
/// Becomes stale once the record is reassigned or released; check with
/// [`CacheRecordPool::is_current`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RecordLease {
    index: u32,
    alloc_count: u32,
}

#[cfg(test)]
impl RecordLease {
    pub(crate) const fn for_test(index: u32, alloc_count: u32) -> Self {
        Self { index, alloc_count }
    }
}

/// One rendered block: a surface, the canvas region it shows, and usage bookkeeping.
pub struct CacheRecord<S> {
    region: Rect,
    surface: S,
    block_resolution: Size,
    last_used_cycle: u64,
    alloc_count: u32,
    allocated: bool,
    on_dealloc: Option<Box<dyn FnOnce()>>,
}

impl<S> core::fmt::Debug for CacheRecord<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CacheRecord")
            .field("region", &self.region)
            .field("last_used_cycle", &self.last_used_cycle)
            .field("alloc_count", &self.alloc_count)
            .field("allocated", &self.allocated)
            .finish_non_exhaustive()
    }
}

impl<S> CacheRecord<S> {
    /// Canvas region drawn into this record.
    pub fn region(&self) -> Rect {
        self.region
    }

    /// The block surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Render cycle in which the record was last drawn or composited.
    pub fn last_used_cycle(&self) -> u64 {
        self.last_used_cycle
    }

    /// How many times the record has been handed out.
    pub fn alloc_count(&self) -> u32 {
        self.alloc_count
    }

    /// Whether the record currently has a holder.
    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Maps surface pixels to canvas coordinates.
    pub fn block_to_canvas(&self) -> Affine {
        Affine::translate(self.region.origin().to_vec2())
            * Affine::scale_non_uniform(
                self.region.width() / self.block_resolution.width,
                self.region.height() / self.block_resolution.height,
            )
    }
}

impl<S: CacheSurface> CacheRecord<S> {
    fn assign(&mut self, region: Rect, on_dealloc: Box<dyn FnOnce()>) {
        if let Some(previous) = self.on_dealloc.replace(on_dealloc) {
            previous();
        }
        self.region = region;
        self.allocated = true;
        self.alloc_count = self.alloc_count.wrapping_add(1);
        self.surface.set_transform(self.block_to_canvas().inverse());
        self.surface.clear();
    }
}

/// A fixed number of block records shared by every node of a block tree.
///
/// Records are created lazily up to the capacity. Past that, allocation reassigns
/// a released record if there is one, and otherwise the record with the oldest
/// [`last_used_cycle`](CacheRecord::last_used_cycle), notifying its previous holder.
pub struct CacheRecordPool<S> {
    records: Vec<CacheRecord<S>>,
    capacity: usize,
    block_resolution: Size,
    cycle: u64,
}

impl<S> core::fmt::Debug for CacheRecordPool<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CacheRecordPool")
            .field("records", &self.records)
            .field("capacity", &self.capacity)
            .field("cycle", &self.cycle)
            .finish_non_exhaustive()
    }
}

impl<S> CacheRecordPool<S> {
    /// Create an empty pool sized from `config`.
    pub fn new(config: &CacheConfig) -> Result<Self, CacheConfigError> {
        config.validate()?;
        Ok(Self {
            records: Vec::new(),
            capacity: config.record_capacity(),
            block_resolution: config.block_resolution,
            cycle: 0,
        })
    }

    /// Maximum number of records.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records created so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record has been created yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pixel size of every record's surface.
    pub fn block_resolution(&self) -> Size {
        self.block_resolution
    }

    /// Current render cycle.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Advance to the next render cycle.
    pub fn begin_cycle(&mut self) -> u64 {
        self.cycle += 1;
        self.cycle
    }

    /// Every record created so far.
    pub fn records(&self) -> &[CacheRecord<S>] {
        &self.records
    }

    /// Whether `lease` still names the assignment it was issued for.
    pub fn is_current(&self, lease: RecordLease) -> bool {
        self.records
            .get(lease.index as usize)
            .is_some_and(|r| r.allocated && r.alloc_count == lease.alloc_count)
    }

    /// The record behind a current lease.
    pub fn get(&self, lease: RecordLease) -> Option<&CacheRecord<S>> {
        self.is_current(lease)
            .then(|| &self.records[lease.index as usize])
    }

    /// Mark the record as used in the current cycle and hand out its surface.
    pub fn start_render(&mut self, lease: RecordLease) -> Option<&mut S> {
        if !self.is_current(lease) {
            return None;
        }
        let cycle = self.cycle;
        let record = &mut self.records[lease.index as usize];
        record.last_used_cycle = cycle;
        Some(&mut record.surface)
    }

    /// Give a record back without notifying the holder.
    ///
    /// Released records are the first to be reassigned.
    pub fn release(&mut self, lease: RecordLease) {
        if self.is_current(lease) {
            let record = &mut self.records[lease.index as usize];
            record.allocated = false;
            record.on_dealloc = None;
        }
    }

    /// Drop every record, notifying current holders.
    pub fn clear(&mut self) {
        for record in &mut self.records {
            if let Some(on_dealloc) = record.on_dealloc.take() {
                on_dealloc();
            }
        }
        self.records.clear();
    }
}

impl<S: CacheSurface> CacheRecordPool<S> {
    /// Assign a record to draw `region`.
    ///
    /// `on_dealloc` runs when the record is later reassigned to someone else (or the
    /// pool is cleared). The surface comes back cleared and mapped to `region`.
    pub fn alloc_canvas<B: CacheBackend<Surface = S>>(
        &mut self,
        backend: &mut B,
        region: Rect,
        on_dealloc: impl FnOnce() + 'static,
    ) -> RecordLease {
        let on_dealloc: Box<dyn FnOnce()> = Box::new(on_dealloc);
        let index = if self.records.len() < self.capacity {
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "Block sizes are small positive pixel counts."
            )]
            let surface = backend.create_surface(
                self.block_resolution.width.ceil() as u32,
                self.block_resolution.height.ceil() as u32,
            );
            self.records.push(CacheRecord {
                region,
                surface,
                block_resolution: self.block_resolution,
                last_used_cycle: self.cycle,
                alloc_count: 0,
                allocated: false,
                on_dealloc: None,
            });
            self.records.len() - 1
        } else {
            let index = self.reusable_index();
            log::trace!(
                target: "stratum_cache",
                "reassigning record {index} (last used in cycle {})",
                self.records[index].last_used_cycle
            );
            index
        };
        let cycle = self.cycle;
        let record = &mut self.records[index];
        record.assign(region, on_dealloc);
        record.last_used_cycle = cycle;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Pool capacity is far below u32::MAX."
        )]
        RecordLease {
            index: index as u32,
            alloc_count: record.alloc_count,
        }
    }

    fn reusable_index(&self) -> usize {
        if let Some(free) = self.records.iter().position(|r| !r.allocated) {
            return free;
        }
        self.records
            .iter()
            .enumerate()
            .min_by_key(|(_, r)| r.last_used_cycle)
            .map_or(0, |(i, _)| i)
    }
}
