//! Power-up spawning, descent and effects

use rand::Rng;
use tracing::debug;

use crate::game::constants::{field, power_up};
use crate::game::events::GameEvent;
use crate::game::state::{Ball, GameState, PowerUpKind};
use crate::game::systems::collision::{intersects, Rect};
use crate::game::systems::TickContext;
use crate::util::vec2::Vec2;
use crate::util::weighted::{WeightError, WeightedTable};

/// Spawn roll plus weighted type choice
#[derive(Debug, Clone)]
pub struct PowerUpTable {
    spawn_chance: f64,
    kinds: WeightedTable<PowerUpKind>,
}

impl PowerUpTable {
    pub fn new() -> Result<Self, WeightError> {
        Self::with_spawn_chance(power_up::SPAWN_CHANCE)
    }

    pub fn with_spawn_chance(spawn_chance: f64) -> Result<Self, WeightError> {
        Ok(Self {
            spawn_chance: spawn_chance.clamp(0.0, 1.0),
            kinds: WeightedTable::new([
                (PowerUpKind::CloneBall, power_up::CLONE_BALL_WEIGHT),
                (PowerUpKind::GrowPaddle, power_up::GROW_PADDLE_WEIGHT),
                (PowerUpKind::Guns, power_up::GUNS_WEIGHT),
            ])?,
        })
    }

    pub fn kind<R: Rng + ?Sized>(&self, rng: &mut R) -> PowerUpKind {
        self.kinds.choose(rng)
    }

    /// Roll for a drop when a brick is destroyed
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<PowerUpKind> {
        if rng.gen_bool(self.spawn_chance) {
            Some(self.kind(rng))
        } else {
            None
        }
    }
}

/// Move power-ups down; collect on paddle contact, drop past the bottom
pub fn update_power_ups<R: Rng + ?Sized>(state: &mut GameState, ctx: &mut TickContext<'_, R>) {
    let paddle_rect = Rect::from(&state.paddle);
    let mut i = state.power_ups.len();
    while i > 0 {
        i -= 1;
        let p = &mut state.power_ups[i];
        p.y += power_up::SPEED;
        let kind = p.kind;
        if intersects(p.center(), p.width / 2.0, &paddle_rect) {
            state.power_ups.remove(i);
            activate(state, ctx, kind);
        } else if p.y > field::HEIGHT {
            state.power_ups.remove(i);
        }
    }
}

/// Apply a collected power-up
pub fn activate<R: Rng + ?Sized>(
    state: &mut GameState,
    ctx: &mut TickContext<'_, R>,
    kind: PowerUpKind,
) {
    ctx.events.push(GameEvent::PowerUpCollected(kind));
    let now = state.now_ms;
    match kind {
        PowerUpKind::CloneBall => {
            let Some(original) = state.original_ball().filter(|b| b.is_launched()) else {
                return;
            };
            let clone = clone_ball(original, &mut *ctx.rng);
            state.balls.push(clone);
            debug!(balls = state.balls.len(), "Ball cloned");
        }
        PowerUpKind::GrowPaddle => {
            if state.paddle.grow(now) {
                ctx.events.push(GameEvent::PaddleGrew {
                    growth_factor: state.paddle.growth_factor,
                });
            }
        }
        PowerUpKind::Guns => {
            state.guns.arm(now);
            debug!(expires_at = ?state.guns.expires_at, "Guns armed");
            ctx.events.push(GameEvent::GunsArmed);
        }
    }
}

/// Non-original copy offset by up to CLONE_OFFSET on each axis, kept in the field
fn clone_ball<R: Rng + ?Sized>(original: &Ball, rng: &mut R) -> Ball {
    let offset = Vec2::new(
        rng.gen_range(-power_up::CLONE_OFFSET..power_up::CLONE_OFFSET),
        rng.gen_range(-power_up::CLONE_OFFSET..power_up::CLONE_OFFSET),
    );
    let r = original.radius;
    let pos = (original.position() + offset).clamp(
        Vec2::new(r, r),
        Vec2::new(field::WIDTH - r, field::HEIGHT - r),
    );
    Ball {
        x: pos.x,
        y: pos.y,
        is_original: false,
        ..original.clone()
    }
}
