//! Circle vs axis-aligned rectangle overlap
//!
//! Every contact test in the simulation (ball/brick, ball/paddle,
//! projectile/brick, power-up/paddle) goes through [`intersects`].

use crate::game::state::{Brick, Paddle};
use crate::util::vec2::Vec2;

/// Axis-aligned rectangle, top-left anchored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

impl From<&Brick> for Rect {
    fn from(b: &Brick) -> Self {
        Rect::new(b.x, b.y, b.width, b.height)
    }
}

impl From<&Paddle> for Rect {
    fn from(p: &Paddle) -> Self {
        Rect::new(p.x, p.y, p.width(), p.height)
    }
}

/// True iff the radius-expanded box around `center` overlaps `rect` on both
/// axes. Inequalities are strict, so touching edges do not collide.
#[inline]
pub fn intersects(center: Vec2, radius: f32, rect: &Rect) -> bool {
    center.x + radius > rect.x
        && center.x - radius < rect.x + rect.width
        && center.y + radius > rect.y
        && center.y - radius < rect.y + rect.height
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_rect() -> Rect {
        Rect::new(100.0, 100.0, 50.0, 25.0)
    }

    #[test]
    fn test_overlap_inside() {
        assert!(intersects(Vec2::new(125.0, 110.0), 8.0, &unit_rect()));
    }

    #[test]
    fn test_overlap_via_radius() {
        // Center left of the rect, radius reaches in
        assert!(intersects(Vec2::new(95.0, 110.0), 8.0, &unit_rect()));
        assert!(!intersects(Vec2::new(90.0, 110.0), 8.0, &unit_rect()));
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        assert!(!intersects(Vec2::new(92.0, 110.0), 8.0, &unit_rect()));
        assert!(!intersects(Vec2::new(125.0, 133.0), 8.0, &unit_rect()));
    }

    #[test]
    fn test_needs_overlap_on_both_axes() {
        assert!(!intersects(Vec2::new(125.0, 300.0), 8.0, &unit_rect()));
        assert!(!intersects(Vec2::new(400.0, 110.0), 8.0, &unit_rect()));
    }

    #[test]
    fn test_rect_from_paddle_uses_grown_width() {
        let mut paddle = Paddle::default();
        paddle.growth_factor = 0.2;
        let rect = Rect::from(&paddle);
        assert!((rect.width - 120.0).abs() < 1e-3);
    }
}
