// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene basics: adding, querying, modifying and removing components.
//!
//! Run:
//! - `cargo run -p stratum_demos --example scene_basics`
//! - `RUST_LOG=debug cargo run -p stratum_demos --example scene_basics` to see auto-resize logs

use kurbo::{BezPath, Rect, Shape};
use stratum_scene::{Component, Renderer, Rgba8, Scene, SceneConfig, SizingMode};

#[derive(Debug)]
struct Figure {
    id: String,
    bbox: Rect,
    z: i32,
    sizing: SizingMode,
    background: bool,
}

impl Figure {
    fn new(id: &str, bbox: Rect, z: i32) -> Self {
        Self {
            id: id.into(),
            bbox,
            z,
            sizing: SizingMode::BoundedBox,
            background: false,
        }
    }
}

impl Component for Figure {
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
    fn render(&self, renderer: &mut dyn Renderer, _visible: Option<Rect>) {
        renderer.fill_path(&self.bbox.to_path(0.1), Rgba8::new(0, 0, 0, 255));
    }
}

struct Printer;

impl Renderer for Printer {
    fn fill_path(&mut self, path: &BezPath, _color: Rgba8) {
        println!("  fill {:?}", path.bounding_box());
    }
    fn stroke_path(&mut self, _path: &BezPath, _style: &kurbo::Stroke, _color: Rgba8) {}
    fn size_of_canvas_pixel_on_screen(&self) -> f64 {
        1.0
    }
    fn start_object(&mut self, bbox: Rect) {
        println!("begin object {bbox:?}");
    }
}

fn main() {
    env_logger::init();
    let mut scene = Scene::new(SceneConfig::default());
    scene.set_autoresize_enabled(true);

    let mut page = Figure::new("page", Rect::new(0.0, 0.0, 10.0, 10.0), -10);
    page.sizing = SizingMode::FillScreen;
    page.background = true;
    scene.add_component(page).unwrap();

    scene
        .add_component(Figure::new("a", Rect::new(0.0, 0.0, 100.0, 100.0), 1))
        .unwrap();
    scene
        .add_component(Figure::new("b", Rect::new(50.0, 50.0, 150.0, 150.0), 2))
        .unwrap();
    scene
        .add_component(Figure::new("c", Rect::new(500.0, 500.0, 600.0, 600.0), 0))
        .unwrap();
    println!("components: {}", scene.estimate_count());
    println!("import/export rect: {:?}", scene.import_export_rect());

    let region = Rect::new(60.0, 60.0, 70.0, 70.0);
    let hits: Vec<_> = scene
        .components_intersecting(region, true)
        .iter()
        .map(|c| c.id().to_owned())
        .collect();
    println!("hits in {region:?}: {hits:?}");

    scene
        .modify_component("c", |c| c.bbox = Rect::new(55.0, 55.0, 65.0, 65.0))
        .unwrap();
    let hits: Vec<_> = scene
        .components_intersecting(region, false)
        .iter()
        .map(|c| c.id().to_owned())
        .collect();
    println!("after moving c: {hits:?}");

    println!("render {region:?}:");
    scene.render(&mut Printer, Some(region));

    let removed = scene.remove_component("a");
    println!("removed {:?}; {} left", removed.map(|c| c.id), scene.estimate_count());
}
