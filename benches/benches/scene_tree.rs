// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{BezPath, Rect, Shape};
use stratum_scene::{Component, Renderer, Rgba8, Scene, SceneConfig};

#[derive(Clone)]
struct Stroke {
    id: String,
    bbox: Rect,
    z: i32,
}

impl Component for Stroke {
    fn id(&self) -> &str {
        &self.id
    }
    fn bbox(&self) -> Rect {
        self.bbox
    }
    fn z_index(&self) -> i32 {
        self.z
    }
    fn render(&self, renderer: &mut dyn Renderer, _visible: Option<Rect>) {
        renderer.fill_path(&self.bbox.to_path(0.1), Rgba8::new(0, 0, 0, 255));
    }
}

struct Sink(usize);

impl Renderer for Sink {
    fn fill_path(&mut self, _path: &BezPath, _color: Rgba8) {
        self.0 += 1;
    }
    fn stroke_path(&mut self, _path: &BezPath, _style: &kurbo::Stroke, _color: Rgba8) {
        self.0 += 1;
    }
    fn size_of_canvas_pixel_on_screen(&self) -> f64 {
        1.0
    }
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_strokes(count: usize, extent: f64, size: f64) -> Vec<Stroke> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|i| {
            let x0 = rng.next_f64() * (extent - size);
            let y0 = rng.next_f64() * (extent - size);
            Stroke {
                id: format!("s{i}"),
                bbox: Rect::new(x0, y0, x0 + size, y0 + size),
                z: i as i32,
            }
        })
        .collect()
}

fn filled(strokes: &[Stroke]) -> Scene<Stroke> {
    let mut scene = Scene::new(SceneConfig::default());
    for s in strokes {
        scene.add_component(s.clone()).unwrap();
    }
    scene
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &n in &[1_000usize, 10_000] {
        let strokes = gen_strokes(n, 4000.0, 12.0);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("random_n{n}"), |b| {
            b.iter(|| black_box(filled(&strokes).estimate_count()));
        });
    }
    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");
    let strokes = gen_strokes(5_000, 4000.0, 12.0);
    group.throughput(Throughput::Elements(strokes.len() as u64));
    group.bench_function("all_n5000", |b| {
        b.iter_batched(
            || filled(&strokes),
            |mut scene| {
                for s in &strokes {
                    black_box(scene.remove_component(&s.id));
                }
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let strokes = gen_strokes(20_000, 4000.0, 12.0);
    let scene = filled(&strokes);
    for &side in &[100.0, 800.0] {
        let region = Rect::new(1000.0, 1000.0, 1000.0 + side, 1000.0 + side);
        group.bench_function(format!("intersecting_{side}"), |b| {
            b.iter(|| black_box(scene.components_intersecting(black_box(region), false).len()));
        });
    }
    group.bench_function("render_view_800", |b| {
        let view = Rect::new(1000.0, 1000.0, 1800.0, 1800.0);
        b.iter(|| {
            let mut sink = Sink(0);
            scene.render(&mut sink, Some(view));
            black_box(sink.0)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_remove, bench_query);
criterion_main!(benches);
