//! Per-tick simulation systems
//!
//! Systems mutate the authoritative [`GameState`] and report outcomes
//! through [`TickContext::events`].

pub mod collision;
pub mod physics;
pub mod power_up;
pub mod projectile;

use rand::Rng;

use crate::game::bricks::BrickFieldGenerator;
use crate::game::events::{GameEvent, HitSource};
use crate::game::state::{GameState, PowerUp};
use crate::game::turn;

use self::power_up::PowerUpTable;

/// Shared inputs for one simulation tick
pub struct TickContext<'a, R: Rng + ?Sized> {
    pub generator: &'a BrickFieldGenerator,
    pub power_ups: &'a PowerUpTable,
    pub rng: &'a mut R,
    pub events: &'a mut Vec<GameEvent>,
}

/// Remove a depleted brick: maybe drop a power-up, credit the active
/// player, extend the combo and advance the level once the field is clear.
pub fn destroy_brick<R: Rng + ?Sized>(
    state: &mut GameState,
    ctx: &mut TickContext<'_, R>,
    index: usize,
    source: HitSource,
) {
    let brick = state.bricks.remove(index);
    if let Some(kind) = ctx.power_ups.roll(&mut *ctx.rng) {
        state.power_ups.push(PowerUp::new(brick.center(), kind));
        ctx.events.push(GameEvent::PowerUpSpawned(kind));
    }
    turn::award_brick(state, brick.points);
    ctx.events.push(GameEvent::BrickDestroyed {
        points: brick.points,
        source,
    });
    if state.bricks.is_empty() {
        let advance = turn::advance_level(state, ctx.generator, &mut *ctx.rng);
        ctx.events.push(GameEvent::LevelUp(advance));
    }
}
