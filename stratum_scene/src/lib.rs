// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=stratum_scene --heading-base-level=0

//! Stratum Scene: a Kurbo-native spatial index for the components of a drawing.
//!
//! Stratum Scene owns every component of a document (strokes, text, images,
//! page backgrounds) and answers "what could be visible here, and in which order"
//! fast enough to re-render on every frame.
//!
//! - Keeps components in a dynamic bounding-box tree that rebalances itself on
//!   insertion and removal.
//! - Returns the components touching a region in draw order (background layer
//!   first, then by z-index), skipping subtrees too small to see.
//! - Culls components hidden behind an opaque one before drawing.
//! - Supports resumable render-all passes that survive edits between steps.
//!
//! ## Sizing modes
//!
//! Most components are indexed by their bounding box. Two other kinds are held
//! beside the tree (see [`SizingMode`]):
//! - fill-screen components (page backgrounds, grids) match every region query and
//!   may occlude the whole viewport;
//! - "anywhere" components carry data and are never spatially visible, but are
//!   still reachable by id and by exhaustive traversal.
//!
//! ## API overview
//!
//! - [`Component`] and [`Renderer`]: the capabilities the index consumes.
//! - [`SpatialTree`]: the bounding-box tree, addressed by generational [`NodeId`]s.
//! - [`SceneRoot`]: one layer (a tree plus the unindexed components).
//! - [`Scene`]: background and foreground layers, an id registry, and the
//!   import/export rect.
//! - [`RenderCursor`]: a cancelable pass over every component in draw order.
//!
//! Key operations:
//! - [`Scene::add_component`] / [`Scene::remove_component`] / [`Scene::modify_component`]
//! - [`Scene::components_intersecting`] → components in draw order.
//! - [`Scene::render`] with an optional visible rect.
//! - [`Scene::render_cursor`] and [`RenderCursor::step`].
//!
//! Bounding boxes are assumed finite; a component whose box has a NaN area is
//! rejected with [`SceneError::NonFiniteBounds`].
//!
//! ## Example
//!
//! ```
//! use kurbo::{BezPath, Rect, Shape, Stroke};
//! use stratum_scene::{Component, Renderer, Rgba8, Scene};
//!
//! struct Square {
//!     id: String,
//!     bbox: Rect,
//!     z: i32,
//! }
//!
//! impl Component for Square {
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//!     fn bbox(&self) -> Rect {
//!         self.bbox
//!     }
//!     fn z_index(&self) -> i32 {
//!         self.z
//!     }
//!     fn render(&self, renderer: &mut dyn Renderer, _visible: Option<Rect>) {
//!         renderer.fill_path(&self.bbox.to_path(0.1), Rgba8::new(0, 0, 0, 255));
//!     }
//! }
//!
//! let mut scene = Scene::default();
//! for (i, x) in [0.0, 40.0, 80.0].into_iter().enumerate() {
//!     let square = Square {
//!         id: format!("square-{i}"),
//!         bbox: Rect::new(x, 0.0, x + 20.0, 20.0),
//!         z: 2 - i as i32,
//!     };
//!     scene.add_component(square).unwrap();
//! }
//!
//! // Query a region: results come back in draw order.
//! let hits = scene.components_intersecting(Rect::new(30.0, 0.0, 100.0, 10.0), false);
//! let ids: Vec<&str> = hits.iter().map(|c| c.id()).collect();
//! assert_eq!(ids, ["square-2", "square-1"]);
//!
//! // Count draw calls with a minimal renderer.
//! struct Counter(usize);
//! impl Renderer for Counter {
//!     fn fill_path(&mut self, _path: &BezPath, _color: Rgba8) {
//!         self.0 += 1;
//!     }
//!     fn stroke_path(&mut self, _path: &BezPath, _style: &Stroke, _color: Rgba8) {}
//!     fn size_of_canvas_pixel_on_screen(&self) -> f64 {
//!         1.0
//!     }
//! }
//! let mut counter = Counter(0);
//! scene.render(&mut counter, Some(Rect::new(0.0, 0.0, 50.0, 50.0)));
//! assert_eq!(counter.0, 2);
//! ```
//!
//! ### Resumable rendering
//!
//! ```
//! # use kurbo::{BezPath, Rect, Stroke};
//! # use stratum_scene::{Component, Renderer, Rgba8, Scene};
//! # struct Dot(String, Rect);
//! # impl Component for Dot {
//! #     fn id(&self) -> &str { &self.0 }
//! #     fn bbox(&self) -> Rect { self.1 }
//! #     fn z_index(&self) -> i32 { 0 }
//! #     fn render(&self, _: &mut dyn Renderer, _: Option<Rect>) {}
//! # }
//! # struct Null;
//! # impl Renderer for Null {
//! #     fn fill_path(&mut self, _: &BezPath, _: Rgba8) {}
//! #     fn stroke_path(&mut self, _: &BezPath, _: &Stroke, _: Rgba8) {}
//! #     fn size_of_canvas_pixel_on_screen(&self) -> f64 { 1.0 }
//! # }
//! let mut scene = Scene::default();
//! for i in 0..3 {
//!     let x = f64::from(i) * 10.0;
//!     scene.add_component(Dot(format!("dot-{i}"), Rect::new(x, 0.0, x + 1.0, 1.0))).unwrap();
//! }
//!
//! let mut cursor = scene.render_cursor();
//! let first = cursor.step(&scene, &mut Null).unwrap();
//! assert_eq!((first.index, first.total), (0, 3));
//!
//! // The scene may change between steps; removed components are skipped.
//! scene.remove_component("dot-1");
//! let next = cursor.step(&scene, &mut Null).unwrap();
//! assert_eq!(next.component.id(), "dot-2");
//! assert!(cursor.step(&scene, &mut Null).is_none());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod component;
mod render;
mod root;
mod scene;
mod tree;
mod types;
pub mod util;

#[cfg(test)]
mod testing;

pub use component::{Component, Renderer};
pub use render::{LeafSource, RenderCursor, RenderStep};
pub use root::SceneRoot;
pub use scene::Scene;
pub use tree::SpatialTree;
pub use types::{
    Layer, LayerFlags, NodeHandle, NodeId, Rgba8, SceneConfig, SceneError, SizingMode, Viewport,
};
