// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One layer of a scene: a spatial tree plus components that are not indexed by box.

use alloc::vec::Vec;
use kurbo::Rect;

use crate::component::{Component, Renderer};
use crate::render::{DrawItem, LeafSource, RenderCursor, draw_items, sort_by_z};
use crate::tree::SpatialTree;
use crate::types::{Layer, NodeHandle, NodeId, SceneConfig, SceneError, SizingMode};

/// Root of one scene layer.
///
/// Bounded components live in the spatial tree. Fill-screen components match every
/// region query, and "anywhere" components match none; both are held as leaves
/// parented to the tree root but kept out of its child list. A component stays in
/// the collection chosen when it was added.
pub struct SceneRoot<C> {
    layer: Layer,
    tree: SpatialTree<C>,
    fullscreen_children: Vec<NodeId>,
    data_components: Vec<NodeId>,
}

impl<C> core::fmt::Debug for SceneRoot<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SceneRoot")
            .field("layer", &self.layer)
            .field("tree", &self.tree)
            .field("fullscreen_children", &self.fullscreen_children.len())
            .field("data_components", &self.data_components.len())
            .finish()
    }
}

impl<C> SceneRoot<C> {
    /// Create an empty layer root.
    pub fn new(layer: Layer, config: SceneConfig) -> Self {
        Self {
            layer,
            tree: SpatialTree::new(config),
            fullscreen_children: Vec::new(),
            data_components: Vec::new(),
        }
    }

    /// Which layer this root holds.
    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// The spatial tree of bounded components.
    pub fn tree(&self) -> &SpatialTree<C> {
        &self.tree
    }

    /// Leaves holding fill-screen components, in insertion order.
    pub fn fullscreen_children(&self) -> &[NodeId] {
        &self.fullscreen_children
    }

    /// Leaves holding components that are never spatially visible, in insertion order.
    pub fn data_components(&self) -> &[NodeId] {
        &self.data_components
    }

    /// Bounding box of the bounded components.
    ///
    /// [`Rect::ZERO`] when there are none.
    pub fn bbox(&self) -> Rect {
        self.tree.bbox(self.tree.root()).unwrap_or(Rect::ZERO)
    }

    /// Latest version stamp in this layer; increases with every change.
    pub fn version(&self) -> u64 {
        self.tree.latest_version()
    }

    /// Whether the layer holds no component at all.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty() && self.fullscreen_children.is_empty() && self.data_components.is_empty()
    }

    /// Component held by `leaf`.
    pub fn content(&self, leaf: NodeId) -> Option<&C> {
        self.tree.content(leaf)
    }

    pub(crate) fn content_mut(&mut self, leaf: NodeId) -> Option<&mut C> {
        self.tree.content_mut(leaf)
    }

    /// Leaves that may touch `region`, plus every fill-screen leaf.
    ///
    /// Subtrees whose box `too_small` rejects are pruned. "Anywhere" components are
    /// never returned.
    pub fn leaves_intersecting_region(
        &self,
        region: Rect,
        too_small: impl FnMut(Rect) -> bool,
    ) -> Vec<NodeId> {
        let mut leaves = self.tree.leaves_intersecting_region(region, too_small);
        leaves.extend_from_slice(&self.fullscreen_children);
        leaves
    }

    /// Every leaf of the layer: bounded, then fill-screen, then "anywhere".
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut leaves = self.tree.leaves();
        leaves.extend_from_slice(&self.fullscreen_children);
        leaves.extend_from_slice(&self.data_components);
        leaves
    }

    /// Drop every component without detach notifications.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.fullscreen_children.clear();
        self.data_components.clear();
    }
}

impl<C: Component> SceneRoot<C> {
    /// Add `component` to the collection matching its sizing mode.
    pub fn add_leaf(&mut self, component: C) -> Result<NodeId, SceneError> {
        match component.sizing_mode() {
            SizingMode::BoundedBox => self.tree.insert(component),
            SizingMode::FillScreen => {
                let leaf = self.tree.alloc_unindexed_leaf(component);
                self.fullscreen_children.push(leaf);
                Ok(leaf)
            }
            SizingMode::Anywhere => {
                let leaf = self.tree.alloc_unindexed_leaf(component);
                self.data_components.push(leaf);
                Ok(leaf)
            }
        }
    }

    /// Remove the component held by `leaf`.
    ///
    /// Returns `None` if `leaf` is stale or holds no component.
    pub fn remove_child(&mut self, leaf: NodeId) -> Option<C> {
        for list in [&mut self.fullscreen_children, &mut self.data_components] {
            if let Some(pos) = list.iter().position(|&l| l == leaf) {
                list.remove(pos);
                return self.tree.free_unindexed_leaf(leaf);
            }
        }
        self.tree.remove(leaf)
    }

    /// Leaf holding a component with the same id as `target`.
    ///
    /// Searches the spatial tree around `target`'s box first, then the unindexed
    /// collections.
    pub fn child_with_content(&self, target: &C) -> Option<NodeId> {
        if let Some(leaf) = self.tree.child_with_content(target) {
            return Some(leaf);
        }
        let id = target.id();
        self.fullscreen_children
            .iter()
            .chain(&self.data_components)
            .copied()
            .find(|&leaf| self.tree.content(leaf).is_some_and(|c| c.id() == id))
    }

    /// Leaves to draw, in gather order (not yet z-sorted).
    pub(crate) fn draw_items(
        &self,
        region: Option<Rect>,
        too_small: impl FnMut(Rect) -> bool,
    ) -> Vec<DrawItem<'_, C>> {
        let leaves = match region {
            Some(region) => self.leaves_intersecting_region(region, too_small),
            None => self.leaves(),
        };
        leaves
            .into_iter()
            .filter_map(|node| {
                let component = self.tree.content(node)?;
                Some(DrawItem {
                    handle: NodeHandle {
                        layer: self.layer,
                        node,
                    },
                    component,
                    bbox: self.tree.bbox(node)?,
                    fills_screen: component.sizing_mode() == SizingMode::FillScreen,
                })
            })
            .collect()
    }

    /// Draw the layer in z-order.
    ///
    /// With a `visible_rect`, only leaves that may touch it are drawn, subtrees too
    /// small for `renderer` are skipped, and leaves hidden behind an occluding
    /// component are culled (unless disabled in [`SceneConfig`]).
    pub fn render(&self, renderer: &mut dyn Renderer, visible_rect: Option<Rect>) {
        let mut items = self.draw_items(visible_rect, |r| renderer.is_too_small_to_render(r));
        sort_by_z(&mut items);
        draw_items(
            &items,
            renderer,
            visible_rect,
            self.tree.config().occlusion_culling,
        );
    }

    /// Start a resumable pass over every leaf of the layer in z-order.
    pub fn render_cursor(&self) -> RenderCursor {
        let mut items = self.draw_items(None, |_| false);
        sort_by_z(&mut items);
        RenderCursor::new(items.iter().map(|item| item.handle).collect())
    }
}

impl<C: Component> LeafSource for SceneRoot<C> {
    type Component = C;

    fn resolve_leaf(&self, handle: NodeHandle) -> Option<(&C, Rect)> {
        if handle.layer != self.layer {
            return None;
        }
        Some((self.tree.content(handle.node)?, self.tree.bbox(handle.node)?))
    }
}
