// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=stratum_cache --heading-base-level=0

//! Stratum Cache: tiled offscreen caching for [`stratum_scene`] layers.
//!
//! Redrawing every stroke of a large drawing on each frame is wasteful when the
//! user only pans or adds ink on top. Stratum Cache splits the canvas into
//! square blocks, draws each block once into an offscreen surface, and
//! composites those surfaces onto the screen until the block's contents change.
//!
//! - Blocks form a 3×3 tree that grows outward as the view pans and refines
//!   inward as it zooms.
//! - Surfaces come from a fixed-size pool and are reassigned least recently used
//!   first.
//! - Adding components above everything a block shows only draws the new ones.
//! - Views or blocks that are cheap to draw skip the cache entirely.
//!
//! ## API overview
//!
//! - [`CacheBackend`] and [`CacheSurface`]: how offscreen surfaces are created and
//!   composited. Implement these for your graphics stack.
//! - [`CacheConfig`]: block resolution, memory budget and cost thresholds.
//! - [`RenderingCache`]: the entry point; call [`RenderingCache::render`] once per
//!   frame with the layer and the current [`Viewport`](stratum_scene::Viewport).
//! - [`CacheRecordPool`] and [`CacheBlockTree`]: the two halves of the cache,
//!   exposed for inspection.
//!
//! ## Example
//!
//! ```
//! use kurbo::{Affine, BezPath, Rect, Shape, Size, Stroke};
//! use stratum_cache::{CacheBackend, CacheConfig, CacheSurface, RenderingCache};
//! use stratum_scene::{Component, Renderer, Rgba8, Scene, Viewport};
//!
//! struct Ink(String, Rect);
//! impl Component for Ink {
//!     fn id(&self) -> &str {
//!         &self.0
//!     }
//!     fn bbox(&self) -> Rect {
//!         self.1
//!     }
//!     fn z_index(&self) -> i32 {
//!         0
//!     }
//!     fn render(&self, renderer: &mut dyn Renderer, _visible: Option<Rect>) {
//!         renderer.fill_path(&self.1.to_path(0.1), Rgba8::new(0, 0, 0, 255));
//!     }
//! }
//!
//! // Counts the paths drawn into a block.
//! #[derive(Default)]
//! struct Tile(usize);
//! impl Renderer for Tile {
//!     fn fill_path(&mut self, _path: &BezPath, _color: Rgba8) {
//!         self.0 += 1;
//!     }
//!     fn stroke_path(&mut self, _path: &BezPath, _style: &Stroke, _color: Rgba8) {}
//!     fn size_of_canvas_pixel_on_screen(&self) -> f64 {
//!         1.0
//!     }
//! }
//! impl CacheSurface for Tile {
//!     fn set_transform(&mut self, _canvas_to_surface: Affine) {}
//!     fn clear(&mut self) {
//!         self.0 = 0;
//!     }
//! }
//!
//! // Counts composited blocks.
//! struct Screen(usize);
//! impl Renderer for Screen {
//!     fn fill_path(&mut self, _path: &BezPath, _color: Rgba8) {}
//!     fn stroke_path(&mut self, _path: &BezPath, _style: &Stroke, _color: Rgba8) {}
//!     fn size_of_canvas_pixel_on_screen(&self) -> f64 {
//!         1.0
//!     }
//! }
//!
//! struct Backend;
//! impl CacheBackend for Backend {
//!     type Surface = Tile;
//!     type Screen = Screen;
//!     fn create_surface(&mut self, _width: u32, _height: u32) -> Tile {
//!         Tile::default()
//!     }
//!     fn is_compatible(&self, _screen: &Screen) -> bool {
//!         true
//!     }
//!     fn composite(&mut self, screen: &mut Screen, _surface: &Tile, _block_to_canvas: Affine) {
//!         screen.0 += 1;
//!     }
//! }
//!
//! let mut scene = Scene::default();
//! scene.add_component(Ink("a".into(), Rect::new(10.0, 10.0, 20.0, 20.0))).unwrap();
//!
//! let config = CacheConfig {
//!     block_resolution: Size::new(256.0, 256.0),
//!     cache_size: 256 * 256 * 4 * 16,
//!     ..CacheConfig::default()
//! };
//! let mut cache = RenderingCache::new(Backend, config).unwrap();
//! let viewport = Viewport::new(Size::new(200.0, 200.0), Affine::IDENTITY);
//!
//! let mut screen = Screen(0);
//! cache.render_scene(&mut screen, &scene, &viewport);
//! cache.render_scene(&mut screen, &scene, &viewport);
//! assert_eq!(screen.0, 2);
//! // The second frame reused the block drawn by the first.
//! assert_eq!(cache.pool().records()[0].surface().0, 1);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod backend;
mod cache;
mod config;
mod record;
mod tree;

#[cfg(test)]
mod testing;

pub use backend::{CacheBackend, CacheSurface};
pub use cache::RenderingCache;
pub use config::{CacheConfig, CacheConfigError};
pub use record::{CacheRecord, CacheRecordPool, RecordLease};
pub use tree::{BLOCK_GRID, BlockId, CacheBlockTree};
