// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identifiers, configuration, and small value types shared across the crate.

use alloc::string::String;
use bitflags::bitflags;
use kurbo::{Affine, Point, Rect, Size, Vec2};


/// Identifier for a node in a [`SpatialTree`](crate::SpatialTree) (generational).
///
/// A `NodeId` stays valid until the node it names is destroyed. Slots are reused,
/// but the generation is bumped on reuse, so a stale id never aliases a new node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// The two layers owned by a [`Scene`](crate::Scene).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Layer {
    /// Page backgrounds, grids, and other components reporting [`is_background`](crate::Component::is_background).
    Background,
    /// Ordinary document content.
    Foreground,
}

impl Layer {
    pub(crate) const fn flag(self) -> LayerFlags {
        match self {
            Self::Background => LayerFlags::BACKGROUND,
            Self::Foreground => LayerFlags::FOREGROUND,
        }
    }
}

bitflags! {
    /// Layer selection for [`Scene`](crate::Scene) queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LayerFlags: u8 {
        /// Include the background layer.
        const BACKGROUND = 0b0000_0001;
        /// Include the foreground (content) layer.
        const FOREGROUND = 0b0000_0010;
    }
}

impl Default for LayerFlags {
    fn default() -> Self {
        Self::FOREGROUND
    }
}

/// Handle to a leaf inside one of a scene's layers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeHandle {
    /// Layer whose tree holds the node.
    pub layer: Layer,
    /// The node within that layer's tree.
    pub node: NodeId,
}

/// How a component participates in spatial indexing.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum SizingMode {
    /// Indexed by its bounding box.
    #[default]
    BoundedBox,
    /// Covers the whole viewport: matches every region query and occlusion test.
    FillScreen,
    /// Never spatially visible; reachable only by exhaustive traversal and id lookup.
    Anywhere,
}

/// Tree construction parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SceneConfig {
    /// Preferred number of children per internal node.
    ///
    /// Insertion descends into an existing child only once a node reaches this
    /// fan-out; nodes holding more than ten times as many are re-clustered.
    pub target_child_count: usize,
    /// Run structural invariant checks after every mutation.
    ///
    /// Only honored in builds with `debug_assertions`; release builds never check.
    pub check_invariants: bool,
    /// Skip drawing leaves hidden behind an occluding component.
    pub occlusion_culling: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            target_child_count: 30,
            check_invariants: false,
            occlusion_culling: true,
        }
    }
}

/// A screen-sized window onto the canvas.
///
/// Used for the render viewport and for a scene's import/export framing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Size of the target surface in screen units.
    pub screen_size: Size,
    /// Maps canvas coordinates to screen coordinates.
    pub canvas_to_screen: Affine,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            screen_size: Size::new(500.0, 500.0),
            canvas_to_screen: Affine::IDENTITY,
        }
    }
}

impl Viewport {
    /// Create a viewport from a screen size and canvas→screen transform.
    pub const fn new(screen_size: Size, canvas_to_screen: Affine) -> Self {
        Self {
            screen_size,
            canvas_to_screen,
        }
    }

    /// A viewport showing exactly `rect` at scale 1.
    pub fn from_canvas_rect(rect: Rect) -> Self {
        Self {
            screen_size: rect.size(),
            canvas_to_screen: Affine::translate(-rect.origin().to_vec2()),
        }
    }

    /// The canvas-space region visible through this viewport.
    pub fn visible_rect(&self) -> Rect {
        self.canvas_to_screen
            .inverse()
            .transform_rect_bbox(Rect::from_origin_size(Point::ORIGIN, self.screen_size))
    }

    /// Length on screen of one canvas unit.
    pub fn scale_factor(&self) -> f64 {
        let [a, b, ..] = self.canvas_to_screen.as_coeffs();
        Vec2::new(a, b).hypot()
    }
}

/// An 8-bit RGBA color.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Rgba8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha (255 is opaque).
    pub a: u8,
}

impl Rgba8 {
    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Errors reported by scene mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneError {
    /// The component's bounding box has a NaN area.
    NonFiniteBounds {
        /// Id of the rejected component.
        id: String,
    },
    /// A component with the same id is already in the scene.
    DuplicateId {
        /// The conflicting id.
        id: String,
    },
    /// No component with this id is in the scene.
    UnknownId {
        /// The id that was looked up.
        id: String,
    },
}

impl core::fmt::Display for SceneError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NonFiniteBounds { id } => {
                write!(f, "component `{id}` has a bounding box with NaN area")
            }
            Self::DuplicateId { id } => write!(f, "a component with id `{id}` already exists"),
            Self::UnknownId { id } => write!(f, "no component with id `{id}`"),
        }
    }
}

impl core::error::Error for SceneError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_from_canvas_rect_round_trips() {
        let rect = Rect::new(-20.0, 10.0, 80.0, 60.0);
        let vp = Viewport::from_canvas_rect(rect);
        assert_eq!(vp.visible_rect(), rect);
        assert_eq!(vp.scale_factor(), 1.0);
    }

    #[test]
    fn scale_factor_follows_zoom() {
        let vp = Viewport::new(
            Size::new(100.0, 100.0),
            Affine::scale(4.0) * Affine::translate((5.0, 5.0)),
        );
        assert!((vp.scale_factor() - 4.0).abs() < 1e-12, "zoom of 4 expected");
        assert_eq!(vp.visible_rect(), Rect::new(-5.0, -5.0, 20.0, 20.0));
    }

    #[test]
    fn layer_flags_default_to_foreground() {
        assert_eq!(LayerFlags::default(), Layer::Foreground.flag());
        assert!(!LayerFlags::default().contains(Layer::Background.flag()));
    }
}
