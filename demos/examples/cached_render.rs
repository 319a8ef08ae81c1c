// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cached rendering: how many paths each frame actually draws while panning.
//!
//! Run:
//! - `cargo run -p stratum_demos --example cached_render`
//! - `RUST_LOG=stratum_cache=trace cargo run -p stratum_demos --example cached_render`

use kurbo::{Affine, BezPath, Rect, Shape, Size, Stroke};
use stratum_cache::{CacheBackend, CacheConfig, CacheSurface, RenderingCache};
use stratum_scene::{Component, Renderer, Rgba8, Scene, SceneConfig, Viewport};

struct Dot {
    id: String,
    bbox: Rect,
}

impl Component for Dot {
    fn id(&self) -> &str {
        &self.id
    }
    fn bbox(&self) -> Rect {
        self.bbox
    }
    fn z_index(&self) -> i32 {
        0
    }
    fn render(&self, renderer: &mut dyn Renderer, _visible: Option<Rect>) {
        renderer.fill_path(&self.bbox.to_path(0.1), Rgba8::new(20, 20, 20, 255));
    }
}

/// Counts paths drawn into it.
#[derive(Default)]
struct Counting {
    paths: usize,
}

impl Renderer for Counting {
    fn fill_path(&mut self, _path: &BezPath, _color: Rgba8) {
        self.paths += 1;
    }
    fn stroke_path(&mut self, _path: &BezPath, _style: &Stroke, _color: Rgba8) {
        self.paths += 1;
    }
    fn size_of_canvas_pixel_on_screen(&self) -> f64 {
        1.0
    }
}

impl CacheSurface for Counting {
    fn set_transform(&mut self, _canvas_to_surface: Affine) {}
    fn clear(&mut self) {}
}

#[derive(Default)]
struct Backend {
    composites: usize,
}

impl CacheBackend for Backend {
    type Surface = Counting;
    type Screen = Counting;

    fn create_surface(&mut self, _width: u32, _height: u32) -> Counting {
        Counting::default()
    }
    fn is_compatible(&self, _screen: &Counting) -> bool {
        true
    }
    fn composite(&mut self, _screen: &mut Counting, _surface: &Counting, _block_to_canvas: Affine) {
        self.composites += 1;
    }
}

fn main() {
    env_logger::init();
    let mut scene = Scene::new(SceneConfig::default());
    for y in 0..100 {
        for x in 0..100 {
            let (x0, y0) = (f64::from(x) * 10.0, f64::from(y) * 10.0);
            scene
                .add_component(Dot {
                    id: format!("dot-{x}-{y}"),
                    bbox: Rect::new(x0, y0, x0 + 4.0, y0 + 4.0),
                })
                .unwrap();
        }
    }

    let config = CacheConfig {
        block_resolution: Size::new(256.0, 256.0),
        cache_size: 256 * 256 * 4 * 32,
        ..CacheConfig::default()
    };
    let mut cache = RenderingCache::new(Backend::default(), config).unwrap();

    for frame in 0..6 {
        let pan = f64::from(frame) * 40.0;
        let viewport = Viewport::new(Size::new(400.0, 300.0), Affine::translate((-pan, 0.0)));
        let mut screen = Counting::default();
        let before = cache.backend().composites;
        cache.render_scene(&mut screen, &scene, &viewport);
        let drawn: usize = cache.pool().records().iter().map(|r| r.surface().paths).sum();
        println!(
            "frame {frame}: {} blocks composited, {} paths held in {} records, {} blocks in tree",
            cache.backend().composites - before,
            drawn,
            cache.pool().len(),
            cache.blocks().len(),
        );
    }
}
