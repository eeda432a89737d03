//! Authoritative simulation driver
//!
//! Owns the [`GameState`] while this peer holds the turn. Input handlers
//! (pointer, click, fire) mutate it directly; [`GameLoop::tick`] advances
//! one fixed step and returns what happened.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::game::bricks::{self, BrickFieldGenerator};
use crate::game::constants::timing::TICK_MS;
use crate::game::events::GameEvent;
use crate::game::state::{
    Brick, GameOverReason, GameState, GunsState, Millis, PlayerSlot, PowerUp, Projectile, Scores,
};
use crate::game::systems::power_up::{self, PowerUpTable};
use crate::game::systems::{physics, projectile, TickContext};
use crate::game::{trajectory, turn};
use crate::util::weighted::WeightError;

/// Construction options
#[derive(Debug, Clone, Default)]
pub struct GameLoopConfig {
    /// Fixed seed for reproducible fields; entropy when absent
    pub seed: Option<u64>,
    pub current_player: PlayerSlot,
    pub start_ms: Millis,
}

/// State a peer adopts from its mirror when it gains the turn
#[derive(Debug, Clone, Default)]
pub struct CarriedState {
    pub bricks: Vec<Brick>,
    pub dropping_bricks: Vec<Brick>,
    pub scores: Scores,
    pub level: u32,
    pub ball_speed: f32,
    pub paddle_x: f32,
    pub power_ups: Vec<PowerUp>,
    pub projectiles: Vec<Projectile>,
    pub guns: GunsState,
    pub level_banner_at: Option<Millis>,
}

pub struct GameLoop {
    state: GameState,
    generator: BrickFieldGenerator,
    power_ups: PowerUpTable,
    rng: StdRng,
}

impl GameLoop {
    /// New match with a freshly generated field
    pub fn new(config: GameLoopConfig) -> Result<Self, WeightError> {
        let generator = BrickFieldGenerator::new()?;
        let power_ups = PowerUpTable::new()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut state = GameState::new(config.current_player, config.start_ms);
        state.bricks = generator.initial_field(&mut rng, state.level, config.start_ms);
        info!(
            bricks = state.bricks.len(),
            seed = ?config.seed,
            "Game loop created"
        );
        Ok(Self {
            state,
            generator,
            power_ups,
            rng,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn now(&self) -> Millis {
        self.state.now_ms
    }

    /// Advance one fixed step
    pub fn tick(&mut self) -> Vec<GameEvent> {
        let next = self.state.now_ms + TICK_MS;
        self.tick_at(next)
    }

    /// Advance one step with the clock set to `now`
    pub fn tick_at(&mut self, now: Millis) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.state.is_game_over {
            return events;
        }
        self.state.now_ms = now.max(self.state.now_ms);

        let state = &mut self.state;
        let mut ctx = TickContext {
            generator: &self.generator,
            power_ups: &self.power_ups,
            rng: &mut self.rng,
            events: &mut events,
        };

        power_up::update_power_ups(state, &mut ctx);

        let outcome = physics::update_balls(state, &mut ctx);
        if outcome.original_lost {
            turn::end_turn(state, ctx.generator, &mut *ctx.rng, ctx.events);
            return events;
        }

        projectile::update_projectiles(state, &mut ctx);
        projectile::update_guns(state, ctx.events);

        if !state.dropping_bricks.is_empty() && bricks::advance_drop(&mut state.dropping_bricks) {
            debug!(count = state.dropping_bricks.len(), "Dropping rows settled");
            state.bricks.append(&mut state.dropping_bricks);
        }

        let now = state.now_ms;
        for brick in state.bricks.iter_mut() {
            brick.clear_expired_hit(now);
        }
        events
    }

    /// Pointer moved to field x. Before launch this aims; after launch it
    /// drives the paddle.
    pub fn pointer_moved(&mut self, pointer_x: f32) {
        let state = &mut self.state;
        if state.is_game_over {
            return;
        }
        if state.awaiting_launch() {
            if !state.aim.is_aiming {
                state.aim.is_aiming = true;
                state.aim.base_x = pointer_x;
                state.paddle.center_on_field();
                let center = state.paddle.center_x();
                if let Some(ball) = state.original_ball_mut() {
                    ball.x = center;
                }
            } else {
                state.aim.angle = turn::aim_angle(state.aim.base_x, pointer_x);
            }
            trajectory::refresh_guide(state);
        } else {
            state.aim.is_aiming = false;
            state.paddle.follow_pointer(pointer_x);
        }
    }

    /// Launch the waiting original ball along the aim. Returns false if
    /// there is nothing to launch.
    pub fn launch(&mut self) -> bool {
        let state = &mut self.state;
        if state.is_game_over {
            return false;
        }
        let angle = state.aim.angle;
        let Some(ball) = state.original_ball_mut().filter(|b| !b.is_launched()) else {
            return false;
        };
        ball.launch(angle);
        state.aim.is_aiming = false;
        state.guide_line.is_visible = false;
        state.guide_line.points.clear();
        debug!(angle, "Ball launched");
        true
    }

    pub fn fire(&mut self) -> Option<GameEvent> {
        if self.state.is_game_over {
            return None;
        }
        projectile::fire(&mut self.state).then_some(GameEvent::GunsFired)
    }

    /// Gain the turn: adopt the carried state and start a fresh turn
    pub fn take_over(&mut self, player: PlayerSlot, carried: CarriedState, now: Millis) {
        let state = &mut self.state;
        state.now_ms = now.max(state.now_ms);
        state.current_player = player;
        state.bricks = carried.bricks;
        state.dropping_bricks = carried.dropping_bricks;
        state.scores = carried.scores;
        state.level = carried.level;
        state.ball_speed = carried.ball_speed;
        state.paddle.x = carried.paddle_x;
        state.power_ups = carried.power_ups;
        state.projectiles = carried.projectiles;
        state.guns = carried.guns;
        state.level_banner_at = carried.level_banner_at;
        state.combo = Default::default();
        turn::start_turn(state);
        info!(player = %player, bricks = state.bricks.len(), "Took over turn");
    }

    /// Stop simulating; the match is over
    pub fn finish(&mut self, reason: GameOverReason) {
        if !self.state.is_game_over {
            turn::declare_game_over(&mut self.state, reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::{aim, ball, field};

    fn game() -> GameLoop {
        GameLoop::new(GameLoopConfig {
            seed: Some(42),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_new_generates_field() {
        let g = game();
        assert!(!g.state().bricks.is_empty());
        assert!(g.state().awaiting_launch());
    }

    #[test]
    fn test_seeded_fields_are_reproducible() {
        assert_eq!(game().state().bricks, game().state().bricks);
    }

    #[test]
    fn test_tick_advances_clock() {
        let mut g = game();
        g.tick();
        g.tick();
        assert_eq!(g.now(), 2 * TICK_MS);
    }

    #[test]
    fn test_aim_then_launch() {
        let mut g = game();
        g.pointer_moved(100.0);
        assert!(g.state().aim.is_aiming);
        assert_eq!(g.state().balls[0].x, field::WIDTH / 2.0);

        g.pointer_moved(400.0);
        let angle = g.state().aim.angle;
        assert_eq!(angle, aim::MAX_ANGLE);
        assert!(g.state().guide_line.is_visible);

        assert!(g.launch());
        let b = &g.state().balls[0];
        assert!((b.dx - ball::BASE_SPEED * angle.cos()).abs() < 1e-5);
        assert!(b.dy < 0.0);
        assert!(!g.state().guide_line.is_visible);
        assert!(!g.launch());
    }

    #[test]
    fn test_pointer_drives_paddle_after_launch() {
        let mut g = game();
        g.launch();
        g.pointer_moved(100.0);
        assert_eq!(g.state().paddle.x, 50.0);
    }

    #[test]
    fn test_original_ball_drop_ends_turn() {
        let mut g = game();
        {
            let s = g.state_mut();
            s.balls[0].y = field::HEIGHT + 1.0;
            s.balls[0].dy = 1.0;
            s.balls[0].x = 10.0;
        }
        let events = g.tick();
        assert_eq!(g.state().current_player, PlayerSlot::Two);
        assert_eq!(g.state().balls.len(), 1);
        assert!(g.state().balls[0].is_original);
        assert!(!g.state().balls[0].is_launched());
        assert!(matches!(events[0], GameEvent::TurnEnded { .. }));
    }

    #[test]
    fn test_dropping_rows_join_field() {
        let mut g = game();
        {
            let s = g.state_mut();
            s.bricks.clear();
            s.dropping_bricks = vec![Brick {
                target_y: Some(90.0),
                ..Brick::new(27.5, 60.0, 1, 0)
            }];
        }
        for _ in 0..20 {
            g.tick();
        }
        assert!(g.state().dropping_bricks.is_empty());
        assert_eq!(g.state().bricks.len(), 1);
        assert_eq!(g.state().bricks[0].y, 90.0);
    }

    #[test]
    fn test_turn_end_during_drop_leaves_no_stacked_bricks() {
        let mut g = game();
        {
            let s = g.state_mut();
            s.bricks.clear();
            let mut rng = StdRng::seed_from_u64(5);
            let row = BrickFieldGenerator::new().unwrap().row(&mut rng, -1, 2, 0);
            s.dropping_bricks = row
                .into_iter()
                .map(|b| Brick {
                    target_y: Some(b.y + bricks::row_pitch()),
                    ..b
                })
                .collect();
            s.balls[0].y = field::HEIGHT + 1.0;
            s.balls[0].dy = 1.0;
            s.balls[0].x = 10.0;
        }
        let events = g.tick();
        assert!(matches!(events[0], GameEvent::TurnEnded { .. }));
        for _ in 0..40 {
            g.tick();
        }

        let s = g.state();
        assert!(s.dropping_bricks.is_empty());
        let stacked = s
            .bricks
            .iter()
            .enumerate()
            .flat_map(|(i, a)| s.bricks[i + 1..].iter().map(move |b| (a, b)))
            .filter(|(a, b)| (a.x - b.x).abs() < 0.5 && (a.y - b.y).abs() < 0.5)
            .count();
        assert_eq!(stacked, 0);
    }

    #[test]
    fn test_game_over_freezes_simulation() {
        let mut g = game();
        g.launch();
        g.finish(GameOverReason::Other("quit".into()));
        let before = g.state().balls.clone();
        assert!(g.tick().is_empty());
        assert_eq!(g.state().balls, before);
        assert!(!g.launch());
    }

    #[test]
    fn test_take_over_adopts_carried_state() {
        let mut g = game();
        let carried = CarriedState {
            bricks: vec![Brick::new(27.5, 60.0, 3, 0)],
            scores: Scores {
                player1_score: 40,
                player2_score: 0,
                total_score: 140,
            },
            level: 3,
            ball_speed: 3.06,
            paddle_x: 120.0,
            ..Default::default()
        };
        g.take_over(PlayerSlot::Two, carried, 5_000);
        let s = g.state();
        assert_eq!(s.current_player, PlayerSlot::Two);
        assert_eq!(s.bricks.len(), 1);
        assert_eq!(s.level, 3);
        assert_eq!(s.scores.total_score, 140);
        assert_eq!(s.balls[0].speed, 3.06);
        assert_eq!(s.balls[0].x, 170.0);
        assert_eq!(g.now(), 5_000);
    }
}
