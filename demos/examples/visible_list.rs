// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visible-window example: which rows of a long list does each scroll position show?
//!
//! Run:
//! - `cargo run -p stratum_demos --example visible_list`

use kurbo::{Affine, Rect, Size};
use stratum_scene::{Component, Renderer, Scene, SceneConfig, Viewport};

const ROW_H: f64 = 20.0;
const WIDTH: f64 = 200.0;

struct Row {
    id: String,
    index: usize,
    bbox: Rect,
}

impl Component for Row {
    fn id(&self) -> &str {
        &self.id
    }
    fn bbox(&self) -> Rect {
        self.bbox
    }
    fn z_index(&self) -> i32 {
        0
    }
    fn render(&self, _renderer: &mut dyn Renderer, _visible: Option<Rect>) {}
}

fn main() {
    env_logger::init();
    let mut scene = Scene::new(SceneConfig::default());
    for index in 0..1000_usize {
        let y0 = index as f64 * ROW_H;
        scene
            .add_component(Row {
                id: format!("row-{index}"),
                index,
                bbox: Rect::new(0.0, y0, WIDTH, y0 + ROW_H),
            })
            .unwrap();
    }

    // Simulate a few scroll positions by moving the viewport.
    for scroll in [0.0, 30.0, 200.0, 600.0] {
        let viewport = Viewport::new(Size::new(WIDTH, 100.0), Affine::translate((0.0, -scroll)));
        let mut indices: Vec<_> = scene
            .components_intersecting(viewport.visible_rect(), false)
            .iter()
            .map(|row| row.index)
            .collect();
        indices.sort_unstable();
        println!("scroll={scroll:.1} -> visible indices: {indices:?}");
    }
}
