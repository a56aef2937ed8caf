//! Placement policy for agent-created geometry.
//!
//! DESIGN
//! ======
//! An unconstrained generator produces out-of-bounds and stacked geometry at
//! an unacceptable rate for a shared canvas, so every gateway creation runs
//! through this module: kind-default sizing, random placement when the caller
//! gave no position, clamping into the usable rectangle (below the header),
//! and a nudge off any fully-overlapped object of comparable size.

#[cfg(test)]
#[path = "placement_test.rs"]
mod tests;

use rand::Rng;

use syncboard_wire::{BoardObject, ObjectKind};

use crate::consts::{
    CANVAS_HEIGHT, CANVAS_WIDTH, CHARACTER_SIZE, FRAME_SIZE, HEADER_SAFE_Y, OVERLAP_NUDGE_STEP,
    OVERLAP_NUDGE_TRIES, SHAPE_SIZE, STICKY_NOTE_SIZE, TEXT_SIZE,
};

/// Default bounding-box size for a kind when the caller supplied none.
#[must_use]
pub fn default_size(kind: ObjectKind) -> (f64, f64) {
    match kind {
        ObjectKind::StickyNote => STICKY_NOTE_SIZE,
        ObjectKind::Rectangle | ObjectKind::Ellipse => SHAPE_SIZE,
        ObjectKind::Text => TEXT_SIZE,
        ObjectKind::Frame => FRAME_SIZE,
        ObjectKind::Character => CHARACTER_SIZE,
        // Connector geometry is derived from its endpoints, never defaulted.
        ObjectKind::Connector => (0.0, 0.0),
    }
}

/// Center of an object's bounding box, using kind defaults for missing size.
#[must_use]
pub fn object_center(obj: &BoardObject) -> (f64, f64) {
    let (dw, dh) = default_size(obj.kind);
    let w = obj.width.unwrap_or(dw);
    let h = obj.height.unwrap_or(dh);
    (obj.x + w / 2.0, obj.y + h / 2.0)
}

/// Random top-left position that keeps a `w` x `h` box inside the usable
/// rectangle.
#[must_use]
pub fn random_position(w: f64, h: f64) -> (f64, f64) {
    let mut rng = rand::rng();
    let max_x = (CANVAS_WIDTH - w.abs()).max(0.0);
    let max_y = (CANVAS_HEIGHT - h.abs()).max(HEADER_SAFE_Y);
    (rng.random_range(0.0..=max_x), rng.random_range(HEADER_SAFE_Y..=max_y))
}

/// Clamp a top-left position so the whole box lies inside the usable
/// rectangle and below the header.
#[must_use]
pub fn clamp_to_canvas(x: f64, y: f64, w: f64, h: f64) -> (f64, f64) {
    let max_x = (CANVAS_WIDTH - w.abs()).max(0.0);
    let max_y = (CANVAS_HEIGHT - h.abs()).max(HEADER_SAFE_Y);
    (x.clamp(0.0, max_x), y.clamp(HEADER_SAFE_Y, max_y))
}

/// Nudge a candidate box away from any existing object it fully overlaps,
/// stepping diagonally and re-clamping. Gives up (accepting the overlap)
/// after a bounded number of tries so placement always terminates.
#[must_use]
pub fn nudge_off_overlaps(
    mut x: f64,
    mut y: f64,
    w: f64,
    h: f64,
    existing: &[BoardObject],
) -> (f64, f64) {
    for _ in 0..OVERLAP_NUDGE_TRIES {
        let collision = existing
            .iter()
            .any(|obj| fully_overlaps(x, y, w, h, obj) && comparable_size(w, h, obj));
        if !collision {
            break;
        }
        x += OVERLAP_NUDGE_STEP;
        y += OVERLAP_NUDGE_STEP;
        (x, y) = clamp_to_canvas(x, y, w, h);
    }
    (x, y)
}

/// Vector between two objects' centers, anchored at `from`'s center.
/// `None` when the centers coincide — a connector cannot sensibly exist
/// between identical points.
#[must_use]
pub fn connector_vector(from: &BoardObject, to: &BoardObject) -> Option<(f64, f64, f64, f64)> {
    let (fx, fy) = object_center(from);
    let (tx, ty) = object_center(to);
    let (dx, dy) = (tx - fx, ty - fy);
    if dx.hypot(dy) < f64::EPSILON {
        return None;
    }
    Some((fx, fy, dx, dy))
}

/// True when the candidate box covers at least 90% of the smaller of the two
/// boxes.
fn fully_overlaps(x: f64, y: f64, w: f64, h: f64, obj: &BoardObject) -> bool {
    let (dw, dh) = default_size(obj.kind);
    let (ow, oh) = (obj.width.unwrap_or(dw).abs(), obj.height.unwrap_or(dh).abs());
    let (w, h) = (w.abs(), h.abs());

    let ix = (x + w).min(obj.x + ow) - x.max(obj.x);
    let iy = (y + h).min(obj.y + oh) - y.max(obj.y);
    if ix <= 0.0 || iy <= 0.0 {
        return false;
    }
    let smaller = (w * h).min(ow * oh);
    if smaller <= 0.0 {
        return false;
    }
    ix * iy >= 0.9 * smaller
}

/// True when the two boxes are within a 2x linear factor of each other.
fn comparable_size(w: f64, h: f64, obj: &BoardObject) -> bool {
    let (dw, dh) = default_size(obj.kind);
    let a = (w * h).abs();
    let b = (obj.width.unwrap_or(dw) * obj.height.unwrap_or(dh)).abs();
    if a <= 0.0 || b <= 0.0 {
        return false;
    }
    let ratio = if a > b { a / b } else { b / a };
    ratio <= 4.0
}
