// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial node arena: insertion, removal, rebalancing, and region queries.

use alloc::vec;
use alloc::vec::Vec;
use kurbo::Rect;

use crate::component::Component;
use crate::types::{NodeId, SceneConfig, SceneError};
use crate::util::{divide_into_grid, rect_approx_eq};

/// Nodes with more than this many times the target fan-out are re-clustered.
const OVERFULL_FACTOR: usize = 10;
/// Grid used to find a dense cluster of children in an overfull node.
const CLUSTER_GRID: usize = 4;
/// A cluster is only split off when it holds more than this many children.
const MIN_CLUSTER_SIZE: usize = 4;

#[derive(Clone, Debug)]
struct Node<C> {
    generation: u32,
    version: u64,
    bbox: Rect,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    content: Option<C>,
}

impl<C> Node<C> {
    fn new(generation: u32, version: u64, parent: Option<NodeId>, content: Option<C>) -> Self {
        Self {
            generation,
            version,
            bbox: Rect::ZERO,
            parent,
            children: Vec::new(),
            content,
        }
    }

    fn is_empty(&self) -> bool {
        self.content.is_none() && self.children.is_empty()
    }
}

/// Dynamic bounding-box tree owning its components.
///
/// Every leaf holds exactly one component; internal nodes hold child ids and the
/// union of their children's boxes. Nodes live in an arena addressed by [`NodeId`].
/// Parents own their children through id lists, and the only back-reference is
/// each node's parent id, used to propagate bounding-box changes upward.
pub struct SpatialTree<C> {
    nodes: Vec<Option<Node<C>>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: NodeId,
    latest_version: u64,
    config: SceneConfig,
}

impl<C> core::fmt::Debug for SpatialTree<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let leaves = self
            .nodes
            .iter()
            .flatten()
            .filter(|n| n.content.is_some())
            .count();
        f.debug_struct("SpatialTree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("leaves", &leaves)
            .field("latest_version", &self.latest_version)
            .finish_non_exhaustive()
    }
}

impl<C> SpatialTree<C> {
    /// Create a tree holding only an empty root.
    pub fn new(config: SceneConfig) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: NodeId::new(0, 0),
            latest_version: 0,
            config,
        };
        tree.root = tree.alloc(None, None);
        tree
    }

    /// The root node. Never destroyed while the tree lives.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Configuration the tree was built with.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.generation == id.1)
            .unwrap_or(false)
    }

    /// Parent of a live node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id)?.parent
    }

    /// Children of a live node, in insertion order. Empty for leaves and stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Cached bounding box of a live node.
    pub fn bbox(&self, id: NodeId) -> Option<Rect> {
        self.node_opt(id).map(|n| n.bbox)
    }

    /// Version stamp of a live node; changes whenever the node is modified.
    pub fn version(&self, id: NodeId) -> Option<u64> {
        self.node_opt(id).map(|n| n.version)
    }

    /// Most recent version handed out anywhere in the tree.
    pub fn latest_version(&self) -> u64 {
        self.latest_version
    }

    /// Component stored in a live leaf.
    pub fn content(&self, id: NodeId) -> Option<&C> {
        self.node_opt(id)?.content.as_ref()
    }

    /// Whether the root holds neither content nor children.
    pub fn is_empty(&self) -> bool {
        self.node(self.root).is_empty()
    }

    /// Every leaf in the tree, depth-first in child order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.leaves_intersecting_region_by(None, |_| false)
    }

    /// Leaves whose subtree path intersects `region`.
    ///
    /// Children are only visited when their box intersects `region` and `too_small`
    /// rejects neither them nor any ancestor. Uses an explicit worklist, so tree depth
    /// does not bound the call stack.
    pub fn leaves_intersecting_region(
        &self,
        region: Rect,
        too_small: impl FnMut(Rect) -> bool,
    ) -> Vec<NodeId> {
        self.leaves_intersecting_region_by(Some(region), too_small)
    }

    fn leaves_intersecting_region_by(
        &self,
        region: Option<Rect>,
        mut too_small: impl FnMut(Rect) -> bool,
    ) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut work = vec![self.root];
        while let Some(id) = work.pop() {
            let node = self.node(id);
            if node.is_empty() {
                continue;
            }
            if let Some(region) = region
                && (!node.bbox.overlaps(region) || too_small(node.bbox))
            {
                continue;
            }
            if node.content.is_some() {
                out.push(id);
            } else {
                work.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Destroy every node but the root and reset the root to empty.
    ///
    /// Components are dropped without detach notifications.
    pub fn clear(&mut self) {
        let root = self.root;
        let generation = self.node(root).generation;
        for (i, slot) in self.nodes.iter_mut().enumerate() {
            if i != root.idx() && slot.take().is_some() {
                self.free_list.push(i);
            }
        }
        let version = self.next_version();
        self.nodes[root.idx()] = Some(Node::new(generation, version, None, None));
    }

    // --- arena ---

    fn next_version(&mut self) -> u64 {
        self.latest_version += 1;
        self.latest_version
    }

    pub(crate) fn touch(&mut self, id: NodeId) {
        let version = self.next_version();
        self.node_mut(id).version = version;
    }

    fn alloc(&mut self, parent: Option<NodeId>, content: Option<C>) -> NodeId {
        let version = self.next_version();
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, version, parent, content));
            (idx, generation)
        } else {
            let generation = 1_u32;
            self.nodes
                .push(Some(Node::new(generation, version, parent, content)));
            self.generations.push(generation);
            (self.nodes.len() - 1, generation)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        NodeId::new(idx as u32, generation)
    }

    fn free(&mut self, id: NodeId) -> Option<Node<C>> {
        if !self.is_alive(id) {
            return None;
        }
        let node = self.nodes[id.idx()].take();
        self.free_list.push(id.idx());
        node
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node<C>> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    /// Access a node; panics if `id` is stale.
    fn node(&self, id: NodeId) -> &Node<C> {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    fn node_mut(&mut self, id: NodeId) -> &mut Node<C> {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    pub(crate) fn content_mut(&mut self, id: NodeId) -> Option<&mut C> {
        if !self.is_alive(id) {
            return None;
        }
        self.node_mut(id).content.as_mut()
    }

    // --- bounding boxes ---

    fn computed_bbox(&self, id: NodeId) -> Rect {
        let node = self.node(id);
        if node.content.is_some() {
            return node.bbox;
        }
        node.children
            .iter()
            .map(|&c| self.node(c).bbox)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO)
    }

    fn recompute_bbox(&mut self, id: NodeId, bubble_up: bool) {
        let old = self.node(id).bbox;
        let new = self.computed_bbox(id);
        self.node_mut(id).bbox = new;
        if !bubble_up || old == new {
            return;
        }
        let Some(parent) = self.node(id).parent else {
            return;
        };
        if new.contains_rect(old) {
            // Growth only: ancestors just need to include the new box.
            self.union_bbox_with(parent, new);
        } else {
            self.recompute_bbox(parent, true);
        }
    }

    fn union_bbox_with(&mut self, id: NodeId, other: Rect) {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.node_mut(id);
            node.bbox = node.bbox.union(other);
            current = node.parent;
        }
    }

    // --- rebalancing ---

    fn rebalance(&mut self, id: NodeId) {
        let parent = self.node(id).parent;
        if let Some(parent) = parent
            && let Some(grandparent) = self.node(parent).parent
            && self.node(parent).children.len() == 1
        {
            // Only child of a non-root node: hoist it and drop the parent.
            self.node_mut(grandparent).children.retain(|&c| c != parent);
            self.node_mut(grandparent).children.push(id);
            self.node_mut(id).parent = Some(grandparent);
            self.free(parent);
            self.touch(grandparent);
            self.recompute_bbox(grandparent, true);
        } else if parent.is_some() && self.node(id).is_empty() {
            self.detach(id);
        } else if self.node(id).children.len() > self.config.target_child_count * OVERFULL_FACTOR {
            self.cluster_children(id);
        }
    }

    fn cluster_children(&mut self, id: NodeId) {
        let cells = divide_into_grid(self.node(id).bbox, CLUSTER_GRID, CLUSTER_GRID);
        let mut buckets: Vec<Vec<NodeId>> = vec![Vec::new(); cells.len()];
        for &child in &self.node(id).children {
            let child_bbox = self.node(child).bbox;
            if let Some(cell) = cells.iter().position(|c| c.contains_rect(child_bbox)) {
                buckets[cell].push(child);
            }
        }
        let densest = buckets
            .into_iter()
            .fold(Vec::new(), |best, b| if b.len() > best.len() { b } else { best });
        if densest.len() <= MIN_CLUSTER_SIZE {
            return;
        }

        log::debug!(
            target: "stratum_scene",
            "clustering {} of {} children into a new node",
            densest.len(),
            self.node(id).children.len()
        );
        let cluster = self.alloc(Some(id), None);
        self.node_mut(id).children.retain(|c| !densest.contains(c));
        for &child in &densest {
            self.node_mut(child).parent = Some(cluster);
        }
        self.node_mut(cluster).children = densest;
        self.recompute_bbox(cluster, false);
        self.node_mut(id).children.push(cluster);
        self.touch(id);
    }

    // --- invariants ---

    pub(crate) fn check_rep(&self) {
        if !(cfg!(debug_assertions) && self.config.check_invariants) {
            return;
        }
        let mut work = vec![self.root];
        while let Some(id) = work.pop() {
            let node = self.node(id);
            debug_assert!(
                node.content.is_none() || node.children.is_empty(),
                "a node must not hold both content and children"
            );
            for (i, &child) in node.children.iter().enumerate() {
                debug_assert!(self.is_alive(child), "child ids must be live");
                debug_assert_eq!(
                    self.node(child).parent,
                    Some(id),
                    "a child's parent must be its owner"
                );
                debug_assert!(
                    !node.children[..i].contains(&child),
                    "a child must not appear twice under one parent"
                );
            }
            if !node.children.is_empty() {
                let union = self.computed_bbox(id);
                let tolerance = 1e-6 * union.width().max(union.height()).max(1.0);
                debug_assert!(
                    rect_approx_eq(node.bbox, union, tolerance),
                    "node bbox {:?} must equal the union of its children {:?}",
                    node.bbox,
                    union
                );
            }
            work.extend(node.children.iter().copied());
        }
    }

    // --- removal ---

    /// Unlink `id` from its parent and free it, or reset it when it is the root.
    fn detach(&mut self, id: NodeId) {
        match self.node(id).parent {
            None => {
                let node = self.node_mut(id);
                node.children.clear();
                node.content = None;
                node.bbox = Rect::ZERO;
                self.touch(id);
            }
            Some(parent) => {
                self.free(id);
                self.remove_child(parent, id);
            }
        }
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.touch(parent);
        self.node_mut(parent).children.retain(|&c| c != child);
        let remaining = self.node(parent).children.clone();
        for c in remaining {
            if self.is_alive(c) {
                self.rebalance(c);
            }
        }
        if self.is_alive(parent) {
            self.recompute_bbox(parent, true);
            self.rebalance(parent);
        }
    }
}

impl<C: Component> SpatialTree<C> {
    /// Insert `component` below the root.
    ///
    /// Returns the leaf that now holds the component.
    pub fn insert(&mut self, component: C) -> Result<NodeId, SceneError> {
        let bbox = component.bbox();
        if bbox.area().is_nan() {
            return Err(SceneError::NonFiniteBounds {
                id: component.id().into(),
            });
        }
        let leaf = self.insert_at(self.root, component, bbox);
        self.check_rep();
        Ok(leaf)
    }

    fn insert_at(&mut self, id: NodeId, component: C, leaf_bbox: Rect) -> NodeId {
        self.touch(id);

        if id == self.root && self.node(id).is_empty() {
            let leaf = self.alloc(Some(id), Some(component));
            self.node_mut(leaf).bbox = leaf_bbox;
            let root = self.node_mut(id);
            root.children.push(leaf);
            root.bbox = leaf_bbox;
            return leaf;
        }

        if self.node(id).is_empty() {
            let node = self.node_mut(id);
            node.content = Some(component);
            node.bbox = leaf_bbox;
            if let Some(parent) = node.parent {
                self.union_bbox_with(parent, leaf_bbox);
            }
            return id;
        }

        let split = self.node(id).content.is_some();
        let id = if split { self.split_leaf(id) } else { id };

        let own_bbox = self.node(id).bbox;
        if leaf_bbox.contains_rect(own_bbox) {
            // The new component encloses this whole subtree: make it a sibling of
            // the existing content instead of pushing it further down.
            let wrapper = self.alloc(Some(id), None);
            if self.node(id).children.len() < self.config.target_child_count {
                self.node_mut(id).children.push(wrapper);
            } else {
                let previous = core::mem::take(&mut self.node_mut(id).children);
                let intermediate = self.alloc(Some(id), None);
                for &child in &previous {
                    self.node_mut(child).parent = Some(intermediate);
                }
                self.node_mut(intermediate).children = previous;
                self.recompute_bbox(intermediate, false);
                self.node_mut(id).children = vec![wrapper, intermediate];
            }
            return self.insert_at(wrapper, component, leaf_bbox);
        }

        // A freshly split node only holds the old leaf; descending into it again
        // would split it again.
        if !split && self.node(id).children.len() >= self.config.target_child_count {
            let mut smallest: Option<(NodeId, f64)> = None;
            for &child in &self.node(id).children {
                let child_bbox = self.node(child).bbox;
                if !child_bbox.contains_rect(leaf_bbox) {
                    continue;
                }
                let area = child_bbox.area();
                if smallest.is_none_or(|(_, best)| area < best) {
                    smallest = Some((child, area));
                }
            }
            if let Some((child, _)) = smallest {
                let leaf = self.insert_at(child, component, leaf_bbox);
                self.rebalance(leaf);
                return leaf;
            }
        }

        let leaf = self.alloc(Some(id), Some(component));
        self.node_mut(leaf).bbox = leaf_bbox;
        self.node_mut(id).children.push(leaf);
        self.union_bbox_with(id, leaf_bbox);
        leaf
    }

    /// Put a new internal node in place of the leaf `id`, with `id` as its only child.
    ///
    /// The leaf keeps its id, so handles to it stay valid.
    fn split_leaf(&mut self, id: NodeId) -> NodeId {
        let parent = self
            .node(id)
            .parent
            .expect("the root never holds content directly");
        let internal = self.alloc(Some(parent), None);
        let bbox = self.node(id).bbox;
        for child in &mut self.node_mut(parent).children {
            if *child == id {
                *child = internal;
            }
        }
        self.node_mut(id).parent = Some(internal);
        let node = self.node_mut(internal);
        node.children.push(id);
        node.bbox = bbox;
        internal
    }

    /// Detach the leaf `id` and return its component.
    ///
    /// The component is notified through [`Component::on_remove_from_image`].
    /// Emptied ancestors are destroyed and single-child chains are collapsed.
    /// Returns `None` for stale ids and non-leaf nodes.
    pub fn remove(&mut self, id: NodeId) -> Option<C> {
        if !self.is_alive(id) {
            return None;
        }
        let mut content = self.node_mut(id).content.take()?;
        content.on_remove_from_image();
        self.detach(id);
        self.check_rep();
        Some(content)
    }

    /// Allocate a leaf owned by the root but kept out of its child list.
    ///
    /// Used for components that are not indexed by their bounding box.
    pub(crate) fn alloc_unindexed_leaf(&mut self, component: C) -> NodeId {
        let bbox = component.bbox();
        let root = self.root;
        self.touch(root);
        let leaf = self.alloc(Some(root), Some(component));
        self.node_mut(leaf).bbox = bbox;
        leaf
    }

    /// Free a leaf created by [`alloc_unindexed_leaf`](Self::alloc_unindexed_leaf).
    pub(crate) fn free_unindexed_leaf(&mut self, id: NodeId) -> Option<C> {
        let root = self.root;
        let mut content = self.free(id)?.content?;
        self.touch(root);
        content.on_remove_from_image();
        Some(content)
    }

    /// Leaf holding a component with the same id as `target`, found by a region query.
    pub fn child_with_content(&self, target: &C) -> Option<NodeId> {
        let id = target.id();
        self.leaves_intersecting_region(target.bbox(), |_| false)
            .into_iter()
            .find(|&leaf| self.content(leaf).is_some_and(|c| c.id() == id))
    }
}
