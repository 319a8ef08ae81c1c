// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording backend and components shared by unit tests.
//!
//! Besides the plain fill lists, screens keep a paint log of clipped canvas areas
//! so tests can compare what ends up visible at a point.

use alloc::string::String;
use alloc::vec::Vec;
use kurbo::{Affine, BezPath, Point, Rect, Shape, Size, Stroke, Vec2};
use stratum_scene::{Component, Renderer, Rgba8};

use crate::backend::{CacheBackend, CacheSurface};

#[derive(Clone, Debug)]
pub(crate) struct TestSurface {
    pub(crate) id: u32,
    pub(crate) size: Size,
    pub(crate) transform: Affine,
    pub(crate) fills: Vec<Rgba8>,
    /// Canvas area and color of each fill.
    pub(crate) painted: Vec<(Rect, Rgba8)>,
    pub(crate) clears: usize,
}

impl Renderer for TestSurface {
    fn fill_path(&mut self, path: &BezPath, color: Rgba8) {
        self.fills.push(color);
        self.painted.push((path.bounding_box(), color));
    }

    fn stroke_path(&mut self, path: &BezPath, _style: &Stroke, color: Rgba8) {
        self.fill_path(path, color);
    }

    fn size_of_canvas_pixel_on_screen(&self) -> f64 {
        let [a, b, ..] = self.transform.as_coeffs();
        Vec2::new(a, b).hypot()
    }
}

impl CacheSurface for TestSurface {
    fn set_transform(&mut self, canvas_to_surface: Affine) {
        self.transform = canvas_to_surface;
    }

    fn clear(&mut self) {
        self.fills.clear();
        self.painted.clear();
        self.clears += 1;
    }
}

/// One composite call as seen by the screen.
#[derive(Clone, Debug)]
pub(crate) struct Composite {
    pub(crate) block: u32,
    pub(crate) block_to_canvas: Affine,
    pub(crate) fills: Vec<Rgba8>,
}

#[derive(Clone, Debug)]
pub(crate) struct TestScreen {
    pub(crate) compatible: bool,
    pub(crate) scale: f64,
    /// Direct fills, in draw order.
    pub(crate) fills: Vec<Rgba8>,
    pub(crate) composites: Vec<Composite>,
    /// Open clips, each already intersected with the one below.
    pub(crate) clips: Vec<Rect>,
    /// Visible canvas area and color of every direct fill and composited fill,
    /// in the order they reached the screen.
    pub(crate) painted: Vec<(Rect, Rgba8)>,
}

impl TestScreen {
    pub(crate) fn new() -> Self {
        Self {
            compatible: true,
            scale: 1.0,
            fills: Vec::new(),
            composites: Vec::new(),
            clips: Vec::new(),
            painted: Vec::new(),
        }
    }

    fn clip(&self, area: Rect) -> Rect {
        self.clips.last().map_or(area, |clip| area.intersect(*clip))
    }

    /// Color last painted over `point`, if any.
    pub(crate) fn color_at(&self, point: Point) -> Option<Rgba8> {
        self.painted
            .iter()
            .rev()
            .find(|(area, _)| {
                area.x0 <= point.x && point.x < area.x1 && area.y0 <= point.y && point.y < area.y1
            })
            .map(|&(_, color)| color)
    }

    /// Colors of everything painted, in order.
    pub(crate) fn painted_colors(&self) -> Vec<Rgba8> {
        self.painted.iter().map(|&(_, color)| color).collect()
    }

    pub(crate) fn incompatible() -> Self {
        Self {
            compatible: false,
            ..Self::new()
        }
    }

    /// Every fill that reached the screen, directly or through a block.
    pub(crate) fn visible_fills(&self) -> Vec<Rgba8> {
        let mut all = self.fills.clone();
        for c in &self.composites {
            all.extend_from_slice(&c.fills);
        }
        all
    }
}

impl Renderer for TestScreen {
    fn fill_path(&mut self, path: &BezPath, color: Rgba8) {
        self.fills.push(color);
        let area = self.clip(path.bounding_box());
        self.painted.push((area, color));
    }

    fn stroke_path(&mut self, path: &BezPath, _style: &Stroke, color: Rgba8) {
        self.fill_path(path, color);
    }

    fn size_of_canvas_pixel_on_screen(&self) -> f64 {
        self.scale
    }

    fn push_clip(&mut self, rect: Rect) {
        let clip = self.clip(rect);
        self.clips.push(clip);
    }

    fn pop_clip(&mut self) {
        self.clips.pop();
    }
}

#[derive(Debug, Default)]
pub(crate) struct TestBackend {
    pub(crate) surfaces_created: u32,
}

impl CacheBackend for TestBackend {
    type Surface = TestSurface;
    type Screen = TestScreen;

    fn create_surface(&mut self, width: u32, height: u32) -> TestSurface {
        self.surfaces_created += 1;
        TestSurface {
            id: self.surfaces_created,
            size: Size::new(f64::from(width), f64::from(height)),
            transform: Affine::IDENTITY,
            fills: Vec::new(),
            painted: Vec::new(),
            clears: 0,
        }
    }

    fn is_compatible(&self, screen: &TestScreen) -> bool {
        screen.compatible
    }

    fn composite(&mut self, screen: &mut TestScreen, surface: &TestSurface, block_to_canvas: Affine) {
        let bounds = block_to_canvas.transform_rect_bbox(surface.size.to_rect());
        for &(area, color) in &surface.painted {
            let area = screen.clip(area.intersect(bounds));
            screen.painted.push((area, color));
        }
        screen.composites.push(Composite {
            block: surface.id,
            block_to_canvas,
            fills: surface.fills.clone(),
        });
    }
}

/// A filled rectangle whose color encodes its z-index.
#[derive(Clone, Debug)]
pub(crate) struct Tile {
    pub(crate) id: String,
    pub(crate) bbox: Rect,
    pub(crate) z: i32,
    pub(crate) cost: f64,
    pub(crate) background: bool,
}

impl Tile {
    pub(crate) fn new(id: &str, bbox: Rect, z: i32) -> Self {
        Self {
            id: id.into(),
            bbox,
            z,
            cost: 1.0,
            background: false,
        }
    }

    pub(crate) fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub(crate) fn in_background(mut self) -> Self {
        self.background = true;
        self
    }

    pub(crate) fn color(z: i32) -> Rgba8 {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "Test colors only need to differ for small z values."
        )]
        Rgba8::new(z as u8, 0, 0, 255)
    }
}

impl Component for Tile {
    fn id(&self) -> &str {
        &self.id
    }

    fn bbox(&self) -> Rect {
        self.bbox
    }

    fn z_index(&self) -> i32 {
        self.z
    }

    fn is_background(&self) -> bool {
        self.background
    }

    fn render(&self, renderer: &mut dyn Renderer, _visible_rect: Option<Rect>) {
        renderer.fill_path(&self.bbox.to_path(0.1), Self::color(self.z));
    }

    fn proportional_rendering_time(&self) -> f64 {
        self.cost
    }
}
