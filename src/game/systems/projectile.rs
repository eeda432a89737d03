//! Gun projectiles
//!
//! Firing spawns a pair at the paddle barrels; projectiles fly straight up,
//! never bounce, and are consumed by the first brick they touch.

use rand::Rng;
use tracing::trace;

use crate::game::constants::guns;
use crate::game::events::{GameEvent, HitSource};
use crate::game::state::{GameState, Projectile};
use crate::game::systems::collision::{intersects, Rect};
use crate::game::systems::{destroy_brick, TickContext};
use crate::util::vec2::Vec2;

/// Fire a volley if guns are active and off cooldown. Returns true if fired.
pub fn fire(state: &mut GameState) -> bool {
    let now = state.now_ms;
    if !state.guns.can_fire(now) {
        return false;
    }
    let paddle = &state.paddle;
    let left = Projectile::new(paddle.x + guns::BARREL_INSET, paddle.y);
    let right = Projectile::new(paddle.x + paddle.width() - guns::BARREL_INSET, paddle.y);
    state.projectiles.push(left);
    state.projectiles.push(right);
    state.guns.cooldown_until = now + guns::COOLDOWN_MS;
    trace!(projectiles = state.projectiles.len(), "Guns fired");
    true
}

/// Advance projectiles, resolving brick hits
pub fn update_projectiles<R: Rng + ?Sized>(state: &mut GameState, ctx: &mut TickContext<'_, R>) {
    let now = state.now_ms;
    let mut i = state.projectiles.len();
    while i > 0 {
        i -= 1;
        let p = &mut state.projectiles[i];
        p.y += p.dy;
        if p.y + p.size < 0.0 {
            state.projectiles.remove(i);
            continue;
        }

        let center = Vec2::new(p.x, p.y);
        let radius = p.size;
        let Some(hit) = state
            .bricks
            .iter()
            .rposition(|brick| intersects(center, radius, &Rect::from(brick)))
        else {
            continue;
        };

        state.projectiles.remove(i);
        if state.bricks[hit].register_hit(now) {
            destroy_brick(state, ctx, hit, HitSource::Projectile);
        }
    }
}

/// Clear an elapsed weapon window
pub fn update_guns(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.guns.expire(state.now_ms) {
        events.push(GameEvent::GunsExpired);
    }
}
