// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering front-end: routes a view through cached blocks when it pays off.

use alloc::vec::Vec;
use kurbo::Rect;
use stratum_scene::util::max_dimension;
use stratum_scene::{Component, NodeId, Renderer, Scene, SceneRoot, Viewport};

use crate::backend::{CacheBackend, CacheSurface};
use crate::config::{CacheConfig, CacheConfigError};
use crate::record::CacheRecordPool;
use crate::tree::{BlockId, CacheBlockTree};

/// How a block's record is brought up to date.
enum Refresh<'a, C> {
    /// The record already shows exactly these leaves.
    Reuse,
    /// Only leaves above everything drawn so far were added.
    DrawOnTop(Vec<&'a C>),
    /// Clear and draw every leaf.
    Redraw,
}

fn draw_leaf<C: Component>(renderer: &mut dyn Renderer, component: &C, visible: Option<Rect>) {
    renderer.start_object(component.bbox());
    component.render(renderer, visible);
    renderer.end_object();
}

/// Renders scene layers through a tree of cached blocks.
///
/// A cache serves one layer: block bookkeeping refers to the leaves of the
/// [`SceneRoot`] it renders, so use one cache per layer.
pub struct RenderingCache<B: CacheBackend> {
    config: CacheConfig,
    backend: B,
    pool: CacheRecordPool<B::Surface>,
    blocks: CacheBlockTree,
}

impl<B: CacheBackend + core::fmt::Debug> core::fmt::Debug for RenderingCache<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderingCache")
            .field("config", &self.config)
            .field("backend", &self.backend)
            .field("pool", &self.pool)
            .field("blocks", &self.blocks)
            .finish()
    }
}

impl<B: CacheBackend> RenderingCache<B> {
    /// Create an empty cache drawing blocks through `backend`.
    pub fn new(backend: B, config: CacheConfig) -> Result<Self, CacheConfigError> {
        Ok(Self {
            pool: CacheRecordPool::new(&config)?,
            config,
            backend,
            blocks: CacheBlockTree::new(),
        })
    }

    /// The cache's configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The surface backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The surface backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The record pool.
    pub fn pool(&self) -> &CacheRecordPool<B::Surface> {
        &self.pool
    }

    /// The block tree.
    pub fn blocks(&self) -> &CacheBlockTree {
        &self.blocks
    }

    /// Number of cached renders so far.
    pub fn cycle(&self) -> u64 {
        self.pool.cycle()
    }

    /// Drop every block and record. Record holders are notified.
    pub fn clear(&mut self) {
        self.pool.clear();
        self.blocks.clear();
    }

    /// Draw the part of `root` visible through `viewport` onto `screen`.
    ///
    /// Falls back to drawing directly when `screen` cannot composite blocks, when
    /// the view is degenerate, or when the visible components are too cheap to be
    /// worth caching.
    pub fn render<C: Component>(
        &mut self,
        screen: &mut B::Screen,
        root: &SceneRoot<C>,
        viewport: &Viewport,
    ) {
        let visible = viewport.visible_rect();
        if !self.backend.is_compatible(screen) {
            log::trace!(target: "stratum_cache", "screen cannot composite blocks; drawing directly");
            root.render(screen, Some(visible));
            return;
        }
        if !(visible.is_finite() && visible.width() > 0.0 && visible.height() > 0.0) {
            log::warn!(target: "stratum_cache", "not caching degenerate view {visible:?}");
            root.render(screen, Some(visible));
            return;
        }

        self.pool.begin_cycle();
        let pool = &self.pool;
        self.blocks.drain_evictions(|lease| pool.is_current(lease));

        let top = self.blocks.cover(visible, self.config.block_resolution);
        let start = self.blocks.smallest_containing(top, visible).unwrap_or(top);

        let cost: f64 = root
            .leaves_intersecting_region(visible, |r| screen.is_too_small_to_render(r))
            .into_iter()
            .filter_map(|leaf| root.content(leaf))
            .map(|c| c.proportional_rendering_time())
            .sum();
        if cost <= self.config.min_render_cost_to_use_cache {
            log::trace!(target: "stratum_cache", "view cost {cost} too low to cache");
            root.render(screen, Some(visible));
            return;
        }

        self.render_block(start, screen, root, viewport);
    }

    /// Draw `scene`: the background layer directly, the foreground through the cache.
    pub fn render_scene<C: Component>(
        &mut self,
        screen: &mut B::Screen,
        scene: &Scene<C>,
        viewport: &Viewport,
    ) {
        scene
            .background()
            .render(screen, Some(viewport.visible_rect()));
        self.render(screen, scene.foreground(), viewport);
    }

    fn render_block<C: Component>(
        &mut self,
        id: BlockId,
        screen: &mut B::Screen,
        root: &SceneRoot<C>,
        viewport: &Viewport,
    ) {
        let Some(region) = self.blocks.region(id) else {
            return;
        };
        let visible = viewport.visible_rect();
        if !region.overlaps(visible) {
            return;
        }

        // Canvas size of one block pixel.
        let block_pixel = region.width() / self.config.block_resolution.width;
        if block_pixel * viewport.scale_factor() > self.config.max_scale {
            for child in self.blocks.children_or_split(id) {
                self.render_block(child, screen, root, viewport);
            }
            return;
        }

        let mut leaves: Vec<(NodeId, &C)> = root
            .leaves_intersecting_region(region, |r| max_dimension(r) < block_pixel)
            .into_iter()
            .filter_map(|leaf| Some((leaf, root.content(leaf)?)))
            .collect();
        leaves.sort_by_key(|(_, c)| c.z_index());
        let cost: f64 = leaves
            .iter()
            .map(|(_, c)| c.proportional_rendering_time())
            .sum();

        if cost <= self.config.min_render_cost_per_block {
            if let Some(lease) = self.blocks.take_lease(id) {
                self.pool.release(lease);
            }
            // Neighbouring blocks draw the same leaves; each only owns its region.
            let shown = region.intersect(visible);
            screen.push_clip(region);
            for (_, component) in &leaves {
                draw_leaf(screen, *component, Some(shown));
            }
            screen.pop_clip();
            let pool = &self.pool;
            self.blocks.prune_children(id, |lease| pool.is_current(lease));
            return;
        }

        let mut ids: Vec<NodeId> = leaves.iter().map(|(leaf, _)| *leaf).collect();
        ids.sort_unstable();
        let max_z = leaves.last().map(|(_, c)| c.z_index());

        let lease = match self.blocks.lease(id) {
            Some(lease) if self.pool.is_current(lease) => lease,
            _ => {
                let notify = self.blocks.eviction_notifier(id);
                let lease = self.pool.alloc_canvas(&mut self.backend, region, notify);
                self.blocks.set_lease(id, lease);
                lease
            }
        };

        let refresh = {
            let (rendered, rendered_max_z) = self.blocks.rendered(id);
            if rendered == ids.as_slice() {
                Refresh::Reuse
            } else {
                let added: Vec<&C> = leaves
                    .iter()
                    .filter(|(leaf, _)| rendered.binary_search(leaf).is_err())
                    .map(|(_, c)| *c)
                    .collect();
                let only_added = !rendered.is_empty()
                    && rendered.len() + added.len() == ids.len()
                    && rendered.iter().all(|leaf| ids.binary_search(leaf).is_ok());
                if only_added && added.iter().all(|c| Some(c.z_index()) > rendered_max_z) {
                    Refresh::DrawOnTop(added)
                } else {
                    Refresh::Redraw
                }
            }
        };

        let Some(surface) = self.pool.start_render(lease) else {
            return;
        };
        match refresh {
            Refresh::Reuse => {}
            Refresh::DrawOnTop(added) => {
                for component in added {
                    draw_leaf(surface, component, Some(region));
                }
            }
            Refresh::Redraw => {
                surface.clear();
                for (_, component) in &leaves {
                    draw_leaf(surface, *component, Some(region));
                }
            }
        }
        self.blocks.set_rendered(id, ids, max_z);

        if let Some(record) = self.pool.get(lease) {
            self.backend
                .composite(screen, record.surface(), record.block_to_canvas());
        }
        let pool = &self.pool;
        self.blocks.prune_children(id, |lease| pool.is_current(lease));
    }
}
