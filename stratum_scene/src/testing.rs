// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixtures shared by unit tests.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use kurbo::{BezPath, Rect, Shape, Stroke};

use crate::component::{Component, Renderer};
use crate::types::{Rgba8, SizingMode};

/// A filled rectangle.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TestComponent {
    pub(crate) id: String,
    pub(crate) bbox: Rect,
    pub(crate) z: i32,
    pub(crate) sizing: SizingMode,
    pub(crate) background: bool,
    pub(crate) opaque: bool,
    pub(crate) cost: f64,
    pub(crate) attached: bool,
}

impl TestComponent {
    pub(crate) fn new(id: &str, bbox: Rect, z: i32) -> Self {
        Self {
            id: id.into(),
            bbox,
            z,
            sizing: SizingMode::BoundedBox,
            background: false,
            opaque: false,
            cost: 1.0,
            attached: false,
        }
    }

    pub(crate) fn with_sizing(mut self, sizing: SizingMode) -> Self {
        self.sizing = sizing;
        self
    }

    pub(crate) fn in_background(mut self) -> Self {
        self.background = true;
        self
    }

    pub(crate) fn opaque(mut self) -> Self {
        self.opaque = true;
        self
    }

    fn color(&self) -> Rgba8 {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "Test colors only need to differ for small z values."
        )]
        Rgba8::new(self.z as u8, 0, 0, 255)
    }
}

impl Component for TestComponent {
    fn id(&self) -> &str {
        &self.id
    }

    fn bbox(&self) -> Rect {
        self.bbox
    }

    fn z_index(&self) -> i32 {
        self.z
    }

    fn sizing_mode(&self) -> SizingMode {
        self.sizing
    }

    fn is_background(&self) -> bool {
        self.background
    }

    fn render(&self, renderer: &mut dyn Renderer, visible_rect: Option<Rect>) {
        let area = match self.sizing {
            SizingMode::BoundedBox => self.bbox,
            SizingMode::FillScreen => visible_rect.unwrap_or(self.bbox),
            SizingMode::Anywhere => return,
        };
        renderer.fill_path(&area.to_path(0.1), self.color());
    }

    fn occludes_everything_below_when_rendered_in_rect(&self, rect: Rect) -> bool {
        match self.sizing {
            SizingMode::BoundedBox => self.opaque && self.bbox.contains_rect(rect),
            SizingMode::FillScreen => self.opaque,
            SizingMode::Anywhere => false,
        }
    }

    fn proportional_rendering_time(&self) -> f64 {
        self.cost
    }

    fn on_add_to_image(&mut self) {
        self.attached = true;
    }

    fn on_remove_from_image(&mut self) {
        self.attached = false;
    }
}

/// Rasterizes fills onto a coarse grid of unit pixels anchored at the origin.
#[derive(Clone, Debug)]
pub(crate) struct PixelRenderer {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) pixels: Vec<Rgba8>,
    /// Every fill in draw order.
    pub(crate) fills: Vec<Rgba8>,
    pub(crate) open_objects: usize,
    pub(crate) objects: usize,
}

impl PixelRenderer {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba8::default(); width * height],
            fills: Vec::new(),
            open_objects: 0,
            objects: 0,
        }
    }
}

impl Renderer for PixelRenderer {
    fn fill_path(&mut self, path: &BezPath, color: Rgba8) {
        let bounds = path.bounding_box();
        for y in 0..self.height {
            for x in 0..self.width {
                let (cx, cy) = (x as f64 + 0.5, y as f64 + 0.5);
                if bounds.x0 <= cx && cx <= bounds.x1 && bounds.y0 <= cy && cy <= bounds.y1 {
                    self.pixels[y * self.width + x] = color;
                }
            }
        }
        self.fills.push(color);
    }

    fn stroke_path(&mut self, path: &BezPath, _style: &Stroke, color: Rgba8) {
        self.fill_path(path, color);
    }

    fn size_of_canvas_pixel_on_screen(&self) -> f64 {
        1.0
    }

    fn start_object(&mut self, _bbox: Rect) {
        self.open_objects += 1;
    }

    fn end_object(&mut self) {
        self.open_objects -= 1;
        self.objects += 1;
    }
}
