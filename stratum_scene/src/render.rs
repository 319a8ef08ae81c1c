// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw ordering: z-sorting, occlusion culling, and resumable render-all passes.

use alloc::vec::Vec;
use core::ops::ControlFlow;
use kurbo::Rect;

use crate::component::{Component, Renderer};
use crate::types::NodeHandle;

/// A leaf gathered for drawing.
#[derive(Debug)]
pub(crate) struct DrawItem<'a, C> {
    pub(crate) handle: NodeHandle,
    pub(crate) component: &'a C,
    pub(crate) bbox: Rect,
    /// Fill-screen leaves cover any visible rect regardless of their box.
    pub(crate) fills_screen: bool,
}

/// Stable sort by ascending z-index; equal z keeps gather order.
pub(crate) fn sort_by_z<C: Component>(items: &mut [DrawItem<'_, C>]) {
    items.sort_by_key(|item| item.component.z_index());
}

/// Index of the topmost item that hides everything below it within `visible`.
///
/// Items before the returned index never show through and need not be drawn.
/// `items` must already be sorted by z.
pub(crate) fn skip_index<C: Component>(items: &[DrawItem<'_, C>], visible: Rect) -> usize {
    items
        .iter()
        .rposition(|item| {
            (item.fills_screen || item.bbox.contains_rect(visible))
                && item
                    .component
                    .occludes_everything_below_when_rendered_in_rect(visible)
        })
        .unwrap_or(0)
}

/// Draw z-sorted `items`, skipping occluded ones when `cull` is set.
pub(crate) fn draw_items<C: Component>(
    items: &[DrawItem<'_, C>],
    renderer: &mut dyn Renderer,
    visible: Option<Rect>,
    cull: bool,
) {
    let start = match visible {
        Some(visible) if cull => skip_index(items, visible),
        _ => 0,
    };
    if start > 0 {
        log::trace!(
            target: "stratum_scene",
            "occlusion culling skipped {start} of {} leaves",
            items.len()
        );
    }
    for item in &items[start..] {
        renderer.start_object(item.bbox);
        item.component.render(renderer, visible);
        renderer.end_object();
    }
}

/// Something the render cursor can resolve leaf handles against.
pub trait LeafSource {
    /// Component type held by the leaves.
    type Component: Component;

    /// Component and bounding box of a live leaf, or `None` if it no longer holds content.
    fn resolve_leaf(&self, handle: NodeHandle) -> Option<(&Self::Component, Rect)>;
}

/// Progress report for one leaf drawn by a [`RenderCursor`].
#[derive(Debug)]
pub struct RenderStep<'a, C> {
    /// The component just drawn.
    pub component: &'a C,
    /// Position of the leaf in the pass (`0..total`).
    pub index: usize,
    /// Number of leaves the pass was started with.
    pub total: usize,
}

/// A resumable, cancelable render-all pass.
///
/// The cursor snapshots the z-sorted leaf handles when created and borrows nothing
/// afterwards, so the scene may be edited between steps (for example while an
/// async caller awaits). Each [`step`](Self::step) re-validates its handle; leaves
/// removed in the meantime are skipped silently. To cancel, stop stepping.
#[derive(Clone, Debug)]
pub struct RenderCursor {
    queue: Vec<NodeHandle>,
    position: usize,
}

impl RenderCursor {
    pub(crate) fn new(queue: Vec<NodeHandle>) -> Self {
        Self { queue, position: 0 }
    }

    /// Number of leaves scheduled when the pass started.
    pub fn total(&self) -> usize {
        self.queue.len()
    }

    /// Number of leaves visited so far, drawn or skipped.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether every scheduled leaf has been visited.
    pub fn is_finished(&self) -> bool {
        self.position >= self.queue.len()
    }

    /// Draw the next leaf that still holds content.
    ///
    /// Returns `None` once the pass is finished.
    pub fn step<'a, S: LeafSource + ?Sized>(
        &mut self,
        source: &'a S,
        renderer: &mut dyn Renderer,
    ) -> Option<RenderStep<'a, S::Component>> {
        let total = self.queue.len();
        while let Some(&handle) = self.queue.get(self.position) {
            let index = self.position;
            self.position += 1;
            let Some((component, bbox)) = source.resolve_leaf(handle) else {
                continue;
            };
            renderer.start_object(bbox);
            component.render(renderer, None);
            renderer.end_object();
            return Some(RenderStep {
                component,
                index,
                total,
            });
        }
        None
    }

    /// Step to completion, reporting each drawn leaf to `on_leaf`.
    ///
    /// Returns whether the pass finished. Breaking on the last leaf still counts as
    /// finished.
    pub fn run<S: LeafSource + ?Sized>(
        &mut self,
        source: &S,
        renderer: &mut dyn Renderer,
        mut on_leaf: impl FnMut(&S::Component, usize, usize) -> ControlFlow<()>,
    ) -> bool {
        while let Some(step) = self.step(source, renderer) {
            if on_leaf(step.component, step.index, step.total).is_break() {
                return self.is_finished();
            }
        }
        true
    }
}
