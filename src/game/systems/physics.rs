//! Ball movement and contacts
//!
//! Balls are iterated newest first. Walls reflect, the paddle sends the
//! ball straight up at its own speed, and the first brick hit (again newest
//! first) reverses vertical velocity.

use rand::Rng;
use tracing::trace;

use crate::game::constants::field;
use crate::game::events::HitSource;
use crate::game::state::GameState;
use crate::game::systems::collision::{intersects, Rect};
use crate::game::systems::{destroy_brick, TickContext};

/// Result of advancing every ball one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BallOutcome {
    /// The original ball fell out; the turn is over
    pub original_lost: bool,
}

pub fn update_balls<R: Rng + ?Sized>(
    state: &mut GameState,
    ctx: &mut TickContext<'_, R>,
) -> BallOutcome {
    let paddle = state.paddle.clone();
    let paddle_width = paddle.width();

    let mut i = state.balls.len();
    while i > 0 {
        i -= 1;
        let ball = &mut state.balls[i];
        if !ball.is_launched() {
            continue;
        }

        ball.x += ball.dx;
        ball.y += ball.dy;

        if ball.x + ball.radius > field::WIDTH || ball.x - ball.radius < 0.0 {
            ball.dx = -ball.dx;
        }
        if ball.y - ball.radius < 0.0 {
            ball.dy = -ball.dy;
        }
        if ball.lower_edge() > paddle.y && ball.x > paddle.x && ball.x < paddle.x + paddle_width {
            ball.dy = -ball.speed;
        }

        if ball.lower_edge() > field::HEIGHT {
            if ball.is_original {
                trace!("Original ball lost");
                return BallOutcome {
                    original_lost: true,
                };
            }
            state.balls.remove(i);
            continue;
        }

        collide_with_bricks(state, ctx, i);
    }
    BallOutcome::default()
}

/// First brick hit (newest first) bounces the ball and takes one strength
fn collide_with_bricks<R: Rng + ?Sized>(
    state: &mut GameState,
    ctx: &mut TickContext<'_, R>,
    ball_index: usize,
) {
    let (center, radius) = {
        let b = &state.balls[ball_index];
        (b.position(), b.radius)
    };
    let now = state.now_ms;
    let Some(hit) = state
        .bricks
        .iter()
        .rposition(|brick| intersects(center, radius, &Rect::from(brick)))
    else {
        return;
    };

    let ball = &mut state.balls[ball_index];
    ball.dy = -ball.dy;
    if state.bricks[hit].register_hit(now) {
        destroy_brick(state, ctx, hit, HitSource::Ball);
    }
}
