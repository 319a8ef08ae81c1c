// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene container: two layers, an id registry, and import/export framing.

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::ControlFlow;
use hashbrown::HashMap;
use kurbo::Rect;

use crate::component::{Component, Renderer};
use crate::render::{DrawItem, LeafSource, RenderCursor, draw_items, sort_by_z};
use crate::root::SceneRoot;
use crate::types::{Layer, LayerFlags, NodeHandle, NodeId, SceneConfig, SceneError, Viewport};

/// A document's components, split into a background and a foreground layer.
///
/// Components are owned by the scene and addressed by their string id. Every
/// edit goes through the scene so the id registry and the spatial index agree.
pub struct Scene<C> {
    config: SceneConfig,
    background: SceneRoot<C>,
    foreground: SceneRoot<C>,
    registry: HashMap<String, NodeHandle>,
    import_export: Viewport,
    autoresize: bool,
}

impl<C> core::fmt::Debug for Scene<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scene")
            .field("background", &self.background)
            .field("foreground", &self.foreground)
            .field("components", &self.registry.len())
            .field("import_export", &self.import_export)
            .field("autoresize", &self.autoresize)
            .finish_non_exhaustive()
    }
}

impl<C> Default for Scene<C> {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl<C> Scene<C> {
    /// Create an empty scene with a 500×500 import/export rect at the origin.
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            background: SceneRoot::new(Layer::Background, config),
            foreground: SceneRoot::new(Layer::Foreground, config),
            registry: HashMap::new(),
            import_export: Viewport::default(),
            autoresize: false,
        }
    }

    /// Configuration shared by both layers.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// The background layer.
    pub fn background(&self) -> &SceneRoot<C> {
        &self.background
    }

    /// The foreground (content) layer.
    pub fn foreground(&self) -> &SceneRoot<C> {
        &self.foreground
    }

    /// The root of `layer`.
    pub fn layer(&self, layer: Layer) -> &SceneRoot<C> {
        match layer {
            Layer::Background => &self.background,
            Layer::Foreground => &self.foreground,
        }
    }

    fn layer_mut(&mut self, layer: Layer) -> &mut SceneRoot<C> {
        match layer {
            Layer::Background => &mut self.background,
            Layer::Foreground => &mut self.foreground,
        }
    }

    fn selected(&self, layers: LayerFlags) -> impl Iterator<Item = &SceneRoot<C>> {
        [&self.background, &self.foreground]
            .into_iter()
            .filter(move |root| layers.contains(root.layer().flag()))
    }

    /// Bounding box of the foreground's bounded components.
    pub fn bbox(&self) -> Rect {
        self.foreground.bbox()
    }

    /// Version stamp covering both layers; increases with every change.
    pub fn version(&self) -> u64 {
        self.background.version() + self.foreground.version()
    }

    /// Number of components in the scene.
    pub fn estimate_count(&self) -> usize {
        self.registry.len()
    }

    /// Layer and leaf holding the component `id`.
    pub fn find_parent(&self, id: &str) -> Option<(Layer, NodeId)> {
        self.registry.get(id).map(|h| (h.layer, h.node))
    }

    /// Tree parent of `node` in `layer`.
    pub fn node_parent(&self, layer: Layer, node: NodeId) -> Option<NodeId> {
        self.layer(layer).tree().parent(node)
    }

    /// The component with this id.
    pub fn lookup_by_id(&self, id: &str) -> Option<&C> {
        let handle = self.registry.get(id)?;
        self.layer(handle.layer).content(handle.node)
    }

    /// The canvas region used when importing or exporting the document.
    pub fn import_export_rect(&self) -> Rect {
        self.import_export.visible_rect()
    }

    /// The import/export region as a viewport (size plus canvas→screen transform).
    pub fn import_export_viewport(&self) -> Viewport {
        self.import_export
    }

    /// Frame `rect` for import and export.
    pub fn set_import_export_rect(&mut self, rect: Rect) {
        self.import_export = Viewport::from_canvas_rect(rect);
    }

    /// Whether the import/export rect follows the foreground bounds.
    pub fn autoresize_enabled(&self) -> bool {
        self.autoresize
    }

    /// Drop every component without detach notifications.
    ///
    /// The import/export framing is kept.
    pub fn clear(&mut self) {
        self.background.clear();
        self.foreground.clear();
        self.registry.clear();
    }
}

impl<C: Component> Scene<C> {
    /// Add `component` to the layer it reports and notify it.
    ///
    /// Returns the leaf that holds it.
    pub fn add_component(&mut self, component: C) -> Result<NodeId, SceneError> {
        let id = String::from(component.id());
        if self.registry.contains_key(&id) {
            return Err(SceneError::DuplicateId { id });
        }
        let layer = if component.is_background() {
            Layer::Background
        } else {
            Layer::Foreground
        };
        let root = self.layer_mut(layer);
        let node = root.add_leaf(component)?;
        if let Some(component) = root.content_mut(node) {
            component.on_add_to_image();
        }
        self.registry.insert(id, NodeHandle { layer, node });
        self.update_autoresize();
        Ok(node)
    }

    /// Detach the component `id` and hand it back.
    pub fn remove_component(&mut self, id: &str) -> Option<C> {
        let handle = self.registry.remove(id)?;
        let removed = self.layer_mut(handle.layer).remove_child(handle.node);
        self.update_autoresize();
        removed
    }

    /// Mutate the component `id` and re-index it.
    ///
    /// The component is detached, passed to `f`, and added again, so changes to
    /// its box, z-index, sizing mode, or layer take effect. If re-adding fails
    /// (for example because `f` gave it a NaN box) the component is dropped and
    /// the error returned.
    pub fn modify_component(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut C),
    ) -> Result<NodeId, SceneError> {
        let mut component = self
            .remove_component(id)
            .ok_or_else(|| SceneError::UnknownId { id: id.into() })?;
        f(&mut component);
        self.add_component(component)
    }

    /// Keep the import/export rect equal to the foreground bounds.
    ///
    /// Enabling applies the current bounds immediately.
    pub fn set_autoresize_enabled(&mut self, enabled: bool) {
        self.autoresize = enabled;
        self.update_autoresize();
    }

    fn update_autoresize(&mut self) {
        if !self.autoresize {
            return;
        }
        let bbox = self.foreground.bbox();
        // An empty or degenerate foreground keeps the previous framing.
        if bbox.width() > 0.0 && bbox.height() > 0.0 {
            log::debug!(target: "stratum_scene", "auto-resizing import/export rect to {bbox:?}");
            self.import_export = Viewport::from_canvas_rect(bbox);
        }
    }

    /// Components in `layers` that may touch `region`, in draw order.
    ///
    /// Fill-screen components always match; "anywhere" components never do.
    pub fn components_intersecting_in(&self, region: Rect, layers: LayerFlags) -> Vec<&C> {
        self.ordered_items(layers, Some(region), |_| false)
            .into_iter()
            .map(|item| item.component)
            .collect()
    }

    /// Foreground components (and optionally background ones) that may touch `region`.
    pub fn components_intersecting(&self, region: Rect, include_background: bool) -> Vec<&C> {
        let mut layers = LayerFlags::FOREGROUND;
        layers.set(LayerFlags::BACKGROUND, include_background);
        self.components_intersecting_in(region, layers)
    }

    /// Every component of both layers in draw order.
    pub fn all_components(&self) -> Vec<&C> {
        self.ordered_items(LayerFlags::all(), None, |_| false)
            .into_iter()
            .map(|item| item.component)
            .collect()
    }

    /// Draw order: the whole background layer, then the foreground, each by z.
    fn ordered_items(
        &self,
        layers: LayerFlags,
        region: Option<Rect>,
        mut too_small: impl FnMut(Rect) -> bool,
    ) -> Vec<DrawItem<'_, C>> {
        let mut items = Vec::new();
        for root in self.selected(layers) {
            let start = items.len();
            items.extend(root.draw_items(region, &mut too_small));
            sort_by_z(&mut items[start..]);
        }
        items
    }

    /// Draw the background layer, then the foreground, each in z-order.
    ///
    /// With a `visible_rect`, only components that may touch it are drawn and
    /// occluded components are culled (unless disabled in [`SceneConfig`]). An
    /// occluding foreground component also culls the background.
    pub fn render(&self, renderer: &mut dyn Renderer, visible_rect: Option<Rect>) {
        let items = self.ordered_items(LayerFlags::all(), visible_rect, |r| {
            renderer.is_too_small_to_render(r)
        });
        draw_items(&items, renderer, visible_rect, self.config.occlusion_culling);
    }

    /// Start a resumable pass over every component in draw order.
    ///
    /// Step it with [`RenderCursor::step`], passing this scene as the source. The
    /// scene may be edited between steps.
    pub fn render_cursor(&self) -> RenderCursor {
        let items = self.ordered_items(LayerFlags::all(), None, |_| false);
        RenderCursor::new(items.iter().map(|item| item.handle).collect())
    }

    /// Draw every component, reporting `(component, index, total)` after each.
    ///
    /// Returns `false` if `on_progress` broke out before the last component.
    pub fn render_all_with(
        &self,
        renderer: &mut dyn Renderer,
        on_progress: impl FnMut(&C, usize, usize) -> ControlFlow<()>,
    ) -> bool {
        self.render_cursor().run(self, renderer, on_progress)
    }
}

impl<C: Component> LeafSource for Scene<C> {
    type Component = C;

    fn resolve_leaf(&self, handle: NodeHandle) -> Option<(&C, Rect)> {
        self.layer(handle.layer).resolve_leaf(handle)
    }
}
