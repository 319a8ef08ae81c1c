// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability contracts consumed from the editor: drawable components and renderers.

use alloc::boxed::Box;
use kurbo::{BezPath, Line, Rect, Shape, Stroke};

use crate::types::{Rgba8, SizingMode};
use crate::util::max_dimension;

/// A drawable item stored in a scene.
///
/// Components are owned by the tree leaf that holds them. Anything that changes
/// [`bbox`](Self::bbox), [`z_index`](Self::z_index), or [`sizing_mode`](Self::sizing_mode)
/// must go through [`Scene::modify_component`](crate::Scene::modify_component) so the
/// component is re-indexed.
pub trait Component {
    /// Stable identity, unique within a scene.
    fn id(&self) -> &str;

    /// Canvas-space bounding box.
    fn bbox(&self) -> Rect;

    /// Draw order. Higher is drawn later (on top).
    fn z_index(&self) -> i32;

    /// How the component is indexed.
    fn sizing_mode(&self) -> SizingMode {
        SizingMode::BoundedBox
    }

    /// Whether the component belongs to the background layer.
    fn is_background(&self) -> bool {
        false
    }

    /// Draw onto `renderer`. `visible_rect` is `None` when everything is drawn.
    fn render(&self, renderer: &mut dyn Renderer, visible_rect: Option<Rect>);

    /// Whether the component touches `rect`.
    fn intersects_rect(&self, rect: Rect) -> bool {
        self.bbox().overlaps(rect)
    }

    /// Whether the component touches `line`.
    ///
    /// The default is a conservative bounding-box test.
    fn intersects_line(&self, line: Line) -> bool {
        self.bbox().overlaps(line.bounding_box())
    }

    /// Whether drawing this component inside `rect` hides everything drawn before it.
    ///
    /// Returning `true` lets render passes skip lower leaves, so only answer `true`
    /// when the component paints every pixel of `rect` opaquely.
    fn occludes_everything_below_when_rendered_in_rect(&self, _rect: Rect) -> bool {
        false
    }

    /// Relative cost of drawing this component, used by cache heuristics.
    fn proportional_rendering_time(&self) -> f64 {
        1.0
    }

    /// Called once the component has been added to a scene.
    fn on_add_to_image(&mut self) {}

    /// Called when the component is detached from a scene.
    fn on_remove_from_image(&mut self) {}
}

impl<T: Component + ?Sized> Component for Box<T> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn bbox(&self) -> Rect {
        (**self).bbox()
    }

    fn z_index(&self) -> i32 {
        (**self).z_index()
    }

    fn sizing_mode(&self) -> SizingMode {
        (**self).sizing_mode()
    }

    fn is_background(&self) -> bool {
        (**self).is_background()
    }

    fn render(&self, renderer: &mut dyn Renderer, visible_rect: Option<Rect>) {
        (**self).render(renderer, visible_rect);
    }

    fn intersects_rect(&self, rect: Rect) -> bool {
        (**self).intersects_rect(rect)
    }

    fn intersects_line(&self, line: Line) -> bool {
        (**self).intersects_line(line)
    }

    fn occludes_everything_below_when_rendered_in_rect(&self, rect: Rect) -> bool {
        (**self).occludes_everything_below_when_rendered_in_rect(rect)
    }

    fn proportional_rendering_time(&self) -> f64 {
        (**self).proportional_rendering_time()
    }

    fn on_add_to_image(&mut self) {
        (**self).on_add_to_image();
    }

    fn on_remove_from_image(&mut self) {
        (**self).on_remove_from_image();
    }
}

/// A drawing surface.
pub trait Renderer {
    /// Fill `path` (canvas coordinates).
    fn fill_path(&mut self, path: &BezPath, color: Rgba8);

    /// Stroke `path` (canvas coordinates).
    fn stroke_path(&mut self, path: &BezPath, style: &Stroke, color: Rgba8);

    /// Length on screen of one canvas unit.
    fn size_of_canvas_pixel_on_screen(&self) -> f64;

    /// Whether `rect` would cover less than half a screen pixel.
    fn is_too_small_to_render(&self, rect: Rect) -> bool {
        max_dimension(rect) * self.size_of_canvas_pixel_on_screen() < 0.5
    }

    /// Open a group for the component occupying `bbox`.
    fn start_object(&mut self, _bbox: Rect) {}

    /// Close the group opened by [`start_object`](Self::start_object).
    fn end_object(&mut self) {}

    /// Restrict drawing to `rect` (canvas coordinates) until the matching
    /// [`pop_clip`](Self::pop_clip). Nested clips intersect.
    ///
    /// Screens used with a block cache must honor clips; cheap blocks are drawn
    /// directly under a clip to their region.
    fn push_clip(&mut self, _rect: Rect) {}

    /// Drop the clip pushed last.
    fn pop_clip(&mut self) {}
}
