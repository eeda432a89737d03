//! Mirrored state on the peer that does not hold the turn
//!
//! Written only by the synchronizer: deltas replace whole fields, turn
//! switches replace the brick layout and level-ups queue dropping rows. The
//! only local evolution is presentation timing (drop animation, guns
//! expiry, level banner).

use tracing::debug;

use crate::game::bricks;
use crate::game::events::{LevelAdvance, TurnHandover};
use crate::game::game_loop::CarriedState;
use crate::game::state::{
    self, Ball, Brick, GameState, GuideLine, GunsState, Millis, PlayerSlot, PowerUp, Projectile,
    ScoreDisplay, Scores,
};
use crate::game::turn;
use crate::net::protocol::GameSnapshot;

/// Position tolerance when matching a settled dropping brick to a received one
const SAME_CELL_EPSILON: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct MirroredState {
    pub current_player: PlayerSlot,
    pub paddle_x: f32,
    pub balls: Vec<Ball>,
    pub bricks: Vec<Brick>,
    pub dropping_bricks: Vec<Brick>,
    pub guide_line: GuideLine,
    pub power_ups: Vec<PowerUp>,
    pub scores: Scores,
    pub score_display: ScoreDisplay,
    pub projectiles: Vec<Projectile>,
    pub guns: GunsState,
    pub level: u32,
    pub ball_speed: f32,
    pub level_banner_at: Option<Millis>,
    pub now_ms: Millis,
}

impl Default for MirroredState {
    fn default() -> Self {
        Self::from_game_state(&GameState::new(PlayerSlot::One, 0))
    }
}

impl MirroredState {
    /// Start mirroring from this peer's own last authoritative state
    pub fn from_game_state(state: &GameState) -> Self {
        Self {
            current_player: state.current_player,
            paddle_x: state.paddle.x,
            balls: state.balls.clone(),
            bricks: state.bricks.clone(),
            dropping_bricks: state.dropping_bricks.clone(),
            guide_line: state.guide_line.clone(),
            power_ups: state.power_ups.clone(),
            scores: state.scores.clone(),
            score_display: state.scores.display(),
            projectiles: state.projectiles.clone(),
            guns: state.guns.clone(),
            level: state.level,
            ball_speed: state.ball_speed,
            level_banner_at: state.level_banner_at,
            now_ms: state.now_ms,
        }
    }

    /// Replace every field present in `delta`
    pub fn apply_delta(&mut self, delta: &GameSnapshot, now: Millis) {
        self.now_ms = now.max(self.now_ms);
        if let Some(x) = delta.paddle_x {
            self.paddle_x = x;
        }
        if let Some(balls) = &delta.balls {
            self.balls = balls.clone();
        }
        if let Some(bricks) = &delta.bricks {
            self.bricks = bricks.clone();
        }
        if let Some(guide) = &delta.guide_line {
            self.guide_line = guide.clone();
        }
        if let Some(power_ups) = &delta.power_ups {
            self.power_ups = power_ups.clone();
        }
        if let Some(scores) = &delta.scores {
            self.scores = scores.clone();
            self.score_display = scores.display();
        }
        if let Some(projectiles) = &delta.projectiles {
            self.projectiles = projectiles.clone();
        }
        if let Some(guns) = &delta.guns_state {
            self.guns = GunsState::from_snapshot(guns, self.now_ms);
        }
        if let Some(new_level) = delta.level {
            self.set_level(new_level, None);
        }
    }

    pub fn apply_turn_switch(&mut self, handover: &TurnHandover) {
        self.current_player = handover.current_player;
        self.bricks = handover.bricks.clone();
        self.dropping_bricks = handover.dropping_bricks.clone();
    }

    pub fn apply_level_up(&mut self, advance: &LevelAdvance, now: Millis) {
        self.now_ms = now.max(self.now_ms);
        self.dropping_bricks = advance.dropping_bricks.clone();
        self.set_level(advance.level, Some(advance.ball_speed));
    }

    fn set_level(&mut self, new_level: u32, speed: Option<f32>) {
        if new_level != self.level {
            self.level = new_level;
            self.level_banner_at = Some(self.now_ms);
            debug!(level = new_level, "Mirrored level change");
        }
        // The level delta may arrive without the levelUp that carries the speed
        self.ball_speed = speed.unwrap_or_else(|| turn::speed_for_level(new_level));
    }

    /// Local presentation clock: animate dropping rows and expire guns
    pub fn advance(&mut self, now: Millis) {
        self.now_ms = now.max(self.now_ms);
        if !self.dropping_bricks.is_empty() && bricks::advance_drop(&mut self.dropping_bricks) {
            for settled in self.dropping_bricks.drain(..) {
                let known = self.bricks.iter().any(|b| {
                    (b.x - settled.x).abs() < SAME_CELL_EPSILON
                        && (b.y - settled.y).abs() < SAME_CELL_EPSILON
                });
                if !known {
                    self.bricks.push(settled);
                }
            }
        }
        self.guns.expire(self.now_ms);
    }

    pub fn guns_active(&self) -> bool {
        self.guns.is_active(self.now_ms)
    }

    pub fn level_banner_active(&self) -> bool {
        state::level_banner_active(self.level_banner_at, self.now_ms)
    }

    pub fn level_progress(&self) -> f32 {
        state::level_progress(self.level)
    }

    /// What the simulator adopts when this peer gains the turn
    pub fn carry_over(&self) -> CarriedState {
        CarriedState {
            bricks: self.bricks.clone(),
            dropping_bricks: self.dropping_bricks.clone(),
            scores: self.scores.clone(),
            level: self.level,
            ball_speed: self.ball_speed,
            paddle_x: self.paddle_x,
            power_ups: self.power_ups.clone(),
            projectiles: self.projectiles.clone(),
            guns: self.guns.clone(),
            level_banner_at: self.level_banner_at,
        }
    }
}
