// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kurbo::{Affine, BezPath, Rect, Shape, Size, Stroke};
use stratum_cache::{CacheBackend, CacheConfig, CacheSurface, RenderingCache};
use stratum_scene::{Component, Layer, Renderer, Rgba8, SceneConfig, SceneRoot, Viewport};

struct Dab(String, Rect, i32);

impl Component for Dab {
    fn id(&self) -> &str {
        &self.0
    }
    fn bbox(&self) -> Rect {
        self.1
    }
    fn z_index(&self) -> i32 {
        self.2
    }
    fn render(&self, renderer: &mut dyn Renderer, _visible: Option<Rect>) {
        renderer.fill_path(&self.1.to_path(0.1), Rgba8::new(0, 0, 0, 255));
    }
}

#[derive(Default)]
struct Counter(usize);

impl Renderer for Counter {
    fn fill_path(&mut self, _path: &BezPath, _color: Rgba8) {
        self.0 += 1;
    }
    fn stroke_path(&mut self, _path: &BezPath, _style: &Stroke, _color: Rgba8) {
        self.0 += 1;
    }
    fn size_of_canvas_pixel_on_screen(&self) -> f64 {
        1.0
    }
}

impl CacheSurface for Counter {
    fn set_transform(&mut self, _canvas_to_surface: Affine) {}
    fn clear(&mut self) {
        self.0 = 0;
    }
}

struct Backend;

impl CacheBackend for Backend {
    type Surface = Counter;
    type Screen = Counter;

    fn create_surface(&mut self, _width: u32, _height: u32) -> Counter {
        Counter::default()
    }
    fn is_compatible(&self, _screen: &Counter) -> bool {
        true
    }
    fn composite(&mut self, screen: &mut Counter, surface: &Counter, _block_to_canvas: Affine) {
        screen.0 += surface.0;
    }
}

fn dense_layer(n: usize) -> SceneRoot<Dab> {
    let mut root = SceneRoot::new(Layer::Foreground, SceneConfig::default());
    for y in 0..n {
        for x in 0..n {
            let (x0, y0) = (x as f64 * 8.0, y as f64 * 8.0);
            let id = format!("d{x}_{y}");
            root.add_leaf(Dab(id, Rect::new(x0, y0, x0 + 6.0, y0 + 6.0), (x + y * n) as i32))
                .unwrap();
        }
    }
    root
}

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");
    let root = dense_layer(150);
    let viewport = Viewport::new(Size::new(800.0, 600.0), Affine::translate((-100.0, -100.0)));
    let config = CacheConfig {
        block_resolution: Size::new(256.0, 256.0),
        cache_size: 256 * 256 * 4 * 64,
        ..CacheConfig::default()
    };

    group.bench_function("direct_frame", |b| {
        b.iter(|| {
            let mut screen = Counter::default();
            root.render(&mut screen, Some(viewport.visible_rect()));
            black_box(screen.0)
        });
    });

    group.bench_function("warm_frame", |b| {
        let mut cache = RenderingCache::new(Backend, config).unwrap();
        cache.render(&mut Counter::default(), &root, &viewport);
        b.iter(|| {
            let mut screen = Counter::default();
            cache.render(&mut screen, &root, &viewport);
            black_box(screen.0)
        });
    });

    group.bench_function("panning_frames", |b| {
        let mut cache = RenderingCache::new(Backend, config).unwrap();
        let mut dx = 0.0;
        b.iter(|| {
            dx = (dx + 37.0) % 400.0;
            let panned = Viewport::new(
                Size::new(800.0, 600.0),
                Affine::translate((-100.0 - dx, -100.0)),
            );
            let mut screen = Counter::default();
            cache.render(&mut screen, &root, &panned);
            black_box(screen.0)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_cache);
criterion_main!(benches);
