// Copyright 2025 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle helpers not covered by Kurbo.
//!
//! Use [`Rect::contains_rect`], [`Rect::overlaps`] and
//! [`Affine::transform_rect_bbox`](kurbo::Affine::transform_rect_bbox) for the rest.

use alloc::vec::Vec;
use kurbo::Rect;

/// Larger of a rectangle's width and height.
#[inline]
pub fn max_dimension(r: Rect) -> f64 {
    r.width().max(r.height())
}

/// Equality up to `tolerance` on every edge.
pub fn rect_approx_eq(a: Rect, b: Rect, tolerance: f64) -> bool {
    (a.x0 - b.x0).abs() <= tolerance
        && (a.y0 - b.y0).abs() <= tolerance
        && (a.x1 - b.x1).abs() <= tolerance
        && (a.y1 - b.y1).abs() <= tolerance
}

/// Split `r` into `columns × rows` equal cells, row-major.
pub fn divide_into_grid(r: Rect, columns: usize, rows: usize) -> Vec<Rect> {
    let mut cells = Vec::with_capacity(columns * rows);
    if columns == 0 || rows == 0 {
        return cells;
    }
    let w = r.width() / columns as f64;
    let h = r.height() / rows as f64;
    for row in 0..rows {
        for col in 0..columns {
            let x0 = r.x0 + col as f64 * w;
            let y0 = r.y0 + row as f64 * h;
            cells.push(Rect::new(x0, y0, x0 + w, y0 + h));
        }
    }
    cells
}
