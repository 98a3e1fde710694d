//! Axis-aligned boxes in world pixels and contact classification.
//!
//! Y grows downward; the playfield floor sits at `playfield_height`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn is_well_formed(&self) -> bool {
        self.w > 0.0
            && self.h > 0.0
            && self.x.is_finite()
            && self.y.is_finite()
            && self.w.is_finite()
            && self.h.is_finite()
    }
}

/// Strict overlap: boxes that only share an edge do not collide.
#[inline]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

#[inline]
fn spans_x(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && a.right() > b.x
}

/// Tolerance on "was above / was below" tests; absorbs drift from snapping.
pub const CONTACT_SLOP: f32 = 1.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Contact {
    /// Mover came down onto the obstacle's top face.
    Landing,
    /// Mover rose into the obstacle's bottom face.
    HeadBump,
    /// Anything else: push out horizontally.
    Side,
}

/// Classify an overlap from the mover's vertical velocity and its
/// previous-frame edges (`edge - vy`).
pub fn classify(mover: &Rect, vy: f32, obstacle: &Rect) -> Contact {
    let prev_bottom = mover.bottom() - vy;
    let prev_top = mover.y - vy;
    if vy >= 0.0 && prev_bottom <= obstacle.y + CONTACT_SLOP {
        Contact::Landing
    } else if vy < 0.0 && prev_top >= obstacle.bottom() - CONTACT_SLOP {
        Contact::HeadBump
    } else {
        Contact::Side
    }
}

/// A falling mover that crossed the obstacle's top face during this tick
/// without ending inside it. Catches fast falls through thin platforms.
pub fn swept_landing(mover: &Rect, vy: f32, obstacle: &Rect) -> bool {
    if vy <= 0.0 || !spans_x(mover, obstacle) {
        return false;
    }
    let prev_bottom = mover.bottom() - vy;
    prev_bottom <= obstacle.y + CONTACT_SLOP && mover.bottom() >= obstacle.y
}

/// New x for a mover pushed out of an obstacle's side.
/// Uses travel direction, or relative centers when stationary.
pub fn side_push(mover: &Rect, vx: f32, obstacle: &Rect) -> f32 {
    let to_left = obstacle.x - mover.w;
    let to_right = obstacle.right();
    if vx > 0.0 {
        to_left
    } else if vx < 0.0 {
        to_right
    } else if mover.center_x() < obstacle.center_x() {
        to_left
    } else {
        to_right
    }
}
