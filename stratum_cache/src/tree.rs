// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Block tree: canvas regions at block granularity, grown outward to follow the view.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;
use kurbo::{Rect, Size};
use stratum_scene::NodeId;
use stratum_scene::util::{divide_into_grid, max_dimension};

use crate::record::RecordLease;

/// Blocks are split into this many children along each axis.
pub const BLOCK_GRID: usize = 3;
/// Position of the centre cell in a row-major `BLOCK_GRID × BLOCK_GRID` grid.
const CENTRE: usize = BLOCK_GRID * BLOCK_GRID / 2;

/// Identifier for a block in a [`CacheBlockTree`] (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct BlockId(u32, u32);

impl BlockId {
    const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Block {
    generation: u32,
    region: Rect,
    parent: Option<BlockId>,
    /// Empty, or `BLOCK_GRID²` cells in row-major order.
    children: Vec<BlockId>,
    lease: Option<RecordLease>,
    /// Sorted ids of the scene leaves drawn into the leased record.
    rendered: Vec<NodeId>,
    rendered_max_z: Option<i32>,
}

impl Block {
    fn new(generation: u32, region: Rect, parent: Option<BlockId>) -> Self {
        Self {
            generation,
            region,
            parent,
            children: Vec::new(),
            lease: None,
            rendered: Vec::new(),
            rendered_max_z: None,
        }
    }

    fn forget_render(&mut self) {
        self.lease = None;
        self.rendered.clear();
        self.rendered_max_z = None;
    }
}

/// Tree of canvas blocks. Each block may lease a record from a
/// [`CacheRecordPool`](crate::CacheRecordPool) holding its rendered pixels.
///
/// Children are created lazily, nine at a time, each covering a third of the
/// parent along both axes. When the view leaves the root, the root is wrapped
/// in a parent three times its size with the old root as the centre child.
pub struct CacheBlockTree {
    nodes: Vec<Option<Block>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: Option<BlockId>,
    evicted: Rc<RefCell<Vec<BlockId>>>,
}

impl core::fmt::Debug for CacheBlockTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let leased = self
            .nodes
            .iter()
            .flatten()
            .filter(|n| n.lease.is_some())
            .count();
        f.debug_struct("CacheBlockTree")
            .field("root", &self.root)
            .field("blocks_alive", &alive)
            .field("blocks_leased", &leased)
            .finish_non_exhaustive()
    }
}

impl Default for CacheBlockTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBlockTree {
    /// Create a tree with no blocks.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: None,
            evicted: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// The outermost block, once one exists.
    pub fn root(&self) -> Option<BlockId> {
        self.root
    }

    /// Returns true if `id` refers to a live block.
    pub fn is_alive(&self, id: BlockId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Number of live blocks.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Whether the tree holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Canvas region covered by a live block.
    pub fn region(&self, id: BlockId) -> Option<Rect> {
        self.node_opt(id).map(|n| n.region)
    }

    /// Parent of a live block.
    pub fn parent(&self, id: BlockId) -> Option<BlockId> {
        self.node_opt(id)?.parent
    }

    /// Instantiated children of a live block (empty or nine).
    pub fn children(&self, id: BlockId) -> &[BlockId] {
        self.node_opt(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Record lease held by a live block.
    pub fn lease(&self, id: BlockId) -> Option<RecordLease> {
        self.node_opt(id)?.lease
    }

    /// Sorted ids of the leaves drawn into the block's record, and their highest z-index.
    pub fn rendered(&self, id: BlockId) -> (&[NodeId], Option<i32>) {
        self.node_opt(id)
            .map_or((&[], None), |n| (n.rendered.as_slice(), n.rendered_max_z))
    }

    /// Drop every block. Ids handed out earlier become stale.
    pub fn clear(&mut self) {
        for (i, slot) in self.nodes.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.free_list.push(i);
            }
        }
        self.root = None;
        self.evicted.borrow_mut().clear();
    }

    // --- arena ---

    fn alloc(&mut self, region: Rect, parent: Option<BlockId>) -> BlockId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Block::new(generation, region, parent));
            (idx, generation)
        } else {
            self.nodes.push(Some(Block::new(1, region, parent)));
            self.generations.push(1);
            (self.nodes.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "BlockId uses 32-bit indices by design."
        )]
        BlockId::new(idx as u32, generation)
    }

    fn free_subtree(&mut self, id: BlockId) {
        let mut work = vec![id];
        while let Some(id) = work.pop() {
            if let Some(node) = self.nodes[id.idx()].take() {
                self.free_list.push(id.idx());
                work.extend(node.children);
            }
        }
    }

    fn node_opt(&self, id: BlockId) -> Option<&Block> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node(&self, id: BlockId) -> &Block {
        self.nodes[id.idx()].as_ref().expect("dangling BlockId")
    }

    fn node_mut(&mut self, id: BlockId) -> &mut Block {
        self.nodes[id.idx()].as_mut().expect("dangling BlockId")
    }

    // --- growth and descent ---

    /// Make sure the root covers `visible`, creating or growing it as needed.
    ///
    /// A new root is `block_size` canvas units anchored at `visible`'s top-left
    /// corner. `visible` must be finite.
    pub fn cover(&mut self, visible: Rect, block_size: Size) -> BlockId {
        let mut root = match self.root {
            Some(root) => root,
            None => {
                let root = self.alloc(Rect::from_origin_size(visible.origin(), block_size), None);
                self.root = Some(root);
                root
            }
        };
        while !self.node(root).region.contains_rect(visible) {
            root = self.generate_parent(root);
        }
        root
    }

    /// Wrap the root in a parent three times its size, keeping it as the centre child.
    pub fn generate_parent(&mut self, id: BlockId) -> BlockId {
        let region = self.node(id).region;
        let grown = region.inflate(region.width(), region.height());
        log::debug!(target: "stratum_cache", "growing block tree from {region:?} to {grown:?}");
        let parent = self.alloc(grown, None);
        let mut children = Vec::with_capacity(BLOCK_GRID * BLOCK_GRID);
        for (i, cell) in divide_into_grid(grown, BLOCK_GRID, BLOCK_GRID)
            .into_iter()
            .enumerate()
        {
            if i == CENTRE {
                children.push(id);
            } else {
                children.push(self.alloc(cell, Some(parent)));
            }
        }
        self.node_mut(id).parent = Some(parent);
        self.node_mut(parent).children = children;
        if self.root == Some(id) {
            self.root = Some(parent);
        }
        parent
    }

    /// Children of a live block, instantiating them on first use.
    pub fn children_or_split(&mut self, id: BlockId) -> Vec<BlockId> {
        if self.node(id).children.is_empty() {
            let region = self.node(id).region;
            let children: Vec<BlockId> = divide_into_grid(region, BLOCK_GRID, BLOCK_GRID)
                .into_iter()
                .map(|cell| self.alloc(cell, Some(id)))
                .collect();
            self.node_mut(id).children = children;
        }
        self.node(id).children.clone()
    }

    /// The deepest descendant of `id` that contains `rect` while `rect` is no larger
    /// than a third of it.
    ///
    /// Returns `None` when `rect` is already too large for `id`'s children.
    pub fn smallest_containing(&mut self, id: BlockId, rect: Rect) -> Option<BlockId> {
        let mut found = None;
        let mut current = id;
        loop {
            let region = self.node(current).region;
            if max_dimension(rect) > max_dimension(region) / BLOCK_GRID as f64 {
                return found;
            }
            let next = self
                .children_or_split(current)
                .into_iter()
                .find(|&child| self.node(child).region.contains_rect(rect));
            match next {
                Some(child) => {
                    found = Some(child);
                    current = child;
                }
                None => return found,
            }
        }
    }

    // --- render bookkeeping ---

    pub(crate) fn set_lease(&mut self, id: BlockId, lease: RecordLease) {
        let node = self.node_mut(id);
        node.forget_render();
        node.lease = Some(lease);
    }

    pub(crate) fn take_lease(&mut self, id: BlockId) -> Option<RecordLease> {
        let node = self.node_mut(id);
        let lease = node.lease;
        node.forget_render();
        lease
    }

    pub(crate) fn set_rendered(&mut self, id: BlockId, rendered: Vec<NodeId>, max_z: Option<i32>) {
        let node = self.node_mut(id);
        node.rendered = rendered;
        node.rendered_max_z = max_z;
    }

    /// Callback that reports `id` once its record is reassigned elsewhere.
    pub(crate) fn eviction_notifier(&self, id: BlockId) -> impl FnOnce() + 'static {
        let evicted = Rc::clone(&self.evicted);
        move || evicted.borrow_mut().push(id)
    }

    /// Forget what evicted blocks had drawn, unless they have since leased a new record.
    pub(crate) fn drain_evictions(&mut self, is_current: impl Fn(RecordLease) -> bool) {
        let evicted = core::mem::take(&mut *self.evicted.borrow_mut());
        for id in evicted {
            if let Some(node) = self.nodes.get_mut(id.idx()).and_then(|n| n.as_mut())
                && node.generation == id.1
                && !node.lease.is_some_and(&is_current)
            {
                node.forget_render();
            }
        }
    }

    /// Drop the children of `id` when no block below it holds a current record.
    ///
    /// Returns true if children were dropped.
    pub(crate) fn prune_children(
        &mut self,
        id: BlockId,
        is_current: impl Fn(RecordLease) -> bool,
    ) -> bool {
        let children = self.node(id).children.clone();
        if children.is_empty() {
            return false;
        }
        let mut work = children.clone();
        while let Some(block) = work.pop() {
            let node = self.node(block);
            if node.lease.is_some_and(&is_current) {
                return false;
            }
            work.extend_from_slice(&node.children);
        }
        for child in children {
            self.free_subtree(child);
        }
        self.node_mut(id).children.clear();
        true
    }
}
