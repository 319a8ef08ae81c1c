// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cache tuning parameters.

use kurbo::Size;

/// Parameters of a [`RenderingCache`](crate::RenderingCache).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CacheConfig {
    /// Pixel size of one cached block.
    ///
    /// A new block tree starts with a single block covering this many canvas units.
    pub block_resolution: Size,
    /// Memory budget in bytes, assuming 4 bytes per block pixel.
    pub cache_size: usize,
    /// Largest on-screen size of one block pixel before a block is split into
    /// finer children.
    pub max_scale: f64,
    /// Blocks whose components cost at most this much are drawn straight to the screen.
    pub min_render_cost_per_block: f64,
    /// Views whose visible components cost at most this much bypass the cache.
    pub min_render_cost_to_use_cache: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            block_resolution: Size::new(600.0, 600.0),
            cache_size: 600 * 600 * 4 * 90,
            max_scale: 1.3,
            min_render_cost_per_block: 0.0,
            min_render_cost_to_use_cache: 0.0,
        }
    }
}

impl CacheConfig {
    /// Number of blocks that fit in [`cache_size`](Self::cache_size).
    pub fn record_capacity(&self) -> usize {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "Block sizes are small positive pixel counts."
        )]
        let block_bytes = 4 * (self.block_resolution.width.ceil() as usize)
            * (self.block_resolution.height.ceil() as usize);
        if block_bytes == 0 {
            return 0;
        }
        self.cache_size / block_bytes
    }

    /// Check that the configuration can hold at least one block.
    pub fn validate(&self) -> Result<(), CacheConfigError> {
        let Size { width, height } = self.block_resolution;
        if !(width >= 1.0 && height >= 1.0 && width.is_finite() && height.is_finite()) {
            return Err(CacheConfigError::ZeroBlockResolution);
        }
        if self.record_capacity() == 0 {
            return Err(CacheConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

/// Invalid [`CacheConfig`] values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CacheConfigError {
    /// The memory budget is smaller than a single block.
    ZeroCapacity,
    /// The block resolution is smaller than one pixel or not finite.
    ZeroBlockResolution,
}

impl core::fmt::Display for CacheConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ZeroCapacity => f.write_str("cache budget cannot hold a single block"),
            Self::ZeroBlockResolution => {
                f.write_str("block resolution must be at least one pixel in each direction")
            }
        }
    }
}

impl core::error::Error for CacheConfigError {}
