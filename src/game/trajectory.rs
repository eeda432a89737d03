//! Aim-assist path prediction
//!
//! Steps a ghost ball through a private copy of the bricks. Side-wall
//! reflections are free; ceiling and brick reflections count as bounces.
//! The walk ends at the bounce limit, below the paddle line, or on the
//! first brick contact.

use crate::game::constants::{field, trajectory};
use crate::game::state::{Brick, GameState};
use crate::game::systems::collision::{intersects, Rect};
use crate::util::vec2::Vec2;

/// Inputs to one prediction
#[derive(Debug, Clone, Copy)]
pub struct Shot {
    pub origin: Vec2,
    pub angle: f32,
    pub speed: f32,
    pub radius: f32,
}

/// Predicted path points, starting at the shot origin
pub fn predict(shot: Shot, bricks: &[Brick], paddle_y: f32, max_bounces: u32) -> Vec<Vec2> {
    let mut bricks: Vec<Rect> = bricks.iter().map(Rect::from).collect();
    let mut pos = shot.origin;
    let mut vel = Vec2::from_angle(shot.angle, shot.speed);
    let mut bounces = 0;
    let mut points = vec![pos];

    for _ in 0..trajectory::MAX_STEPS {
        if bounces >= max_bounces {
            break;
        }
        let mut next = pos + vel;

        if next.x + shot.radius > field::WIDTH || next.x - shot.radius < 0.0 {
            vel = vel.flip_x();
            next = pos + vel;
        }
        if next.y - shot.radius < 0.0 {
            vel = vel.flip_y();
            next.y = pos.y + vel.y;
            bounces += 1;
        }

        let hit = bricks
            .iter()
            .rposition(|rect| intersects(next, shot.radius, rect));
        if let Some(i) = hit {
            vel = vel.flip_y();
            next.y = pos.y + vel.y;
            bricks.remove(i);
            bounces += 1;
        }

        points.push(next);
        pos = next;

        if pos.y > paddle_y || hit.is_some() {
            break;
        }
    }
    points
}

/// Recompute the guide line for the current aim, or hide it when there is
/// nothing to aim.
pub fn refresh_guide(state: &mut GameState) {
    let shot = match state.original_ball() {
        Some(b) if !b.is_launched() && state.aim.is_aiming => Shot {
            origin: b.position(),
            angle: state.aim.angle,
            speed: b.speed,
            radius: b.radius,
        },
        _ => {
            state.guide_line.is_visible = false;
            state.guide_line.points.clear();
            return;
        }
    };
    state.guide_line.points = predict(
        shot,
        &state.bricks,
        state.paddle.y,
        state.guide_line.max_bounces,
    );
    state.guide_line.is_visible = true;
}
