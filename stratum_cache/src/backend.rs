// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface contract the cache draws blocks through.

use kurbo::Affine;
use stratum_scene::Renderer;

/// An offscreen surface holding one cached block.
///
/// Drawing calls arrive in canvas coordinates; the surface maps them with the
/// transform set by [`set_transform`](Self::set_transform).
pub trait CacheSurface: Renderer {
    /// Map canvas coordinates onto the surface's pixels.
    fn set_transform(&mut self, canvas_to_surface: Affine);

    /// Erase everything drawn so far.
    fn clear(&mut self);
}

/// Creates block surfaces and composites them onto a screen renderer.
pub trait CacheBackend {
    /// Offscreen surface type.
    type Surface: CacheSurface;
    /// Renderer the cache composites onto.
    type Screen: Renderer;

    /// Allocate a blank surface of `width × height` pixels.
    fn create_surface(&mut self, width: u32, height: u32) -> Self::Surface;

    /// Whether blocks can be composited onto `screen`.
    ///
    /// When this returns `false` the cache draws components straight to `screen`.
    fn is_compatible(&self, screen: &Self::Screen) -> bool;

    /// Draw `surface` onto `screen`. `block_to_canvas` maps surface pixels to canvas
    /// coordinates; the screen applies its own canvas→screen transform.
    fn composite(&mut self, screen: &mut Self::Screen, surface: &Self::Surface, block_to_canvas: Affine);
}
