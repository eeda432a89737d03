//! Turn, score, combo and level control
//!
//! Reacts to simulator outcomes (brick destroyed, original ball lost,
//! field cleared) and owns every transition of the match-level state.

use rand::Rng;
use tracing::{debug, info};

use crate::game::bricks::{self, BrickFieldGenerator};
use crate::game::constants::{aim, ball, combo, level};
use crate::game::events::{GameEvent, GameOverNotice, LevelAdvance, TurnHandover};
use crate::game::state::{Ball, GameOverReason, GameState, GuideLine};

/// Credit a destroyed brick to the active player and extend the combo
pub fn award_brick(state: &mut GameState, points: u32) {
    let slot = state.current_player;
    state.scores.award(slot, points as u64);
    advance_combo(state);
}

pub fn advance_combo(state: &mut GameState) {
    state.combo.count += 1;
    state.combo.active = true;
    state.combo.last_update = state.now_ms;
}

/// Realize the combo bonus into the total score and reset the combo.
/// Returns the bonus awarded (0 when no combo was running).
pub fn settle_combo(state: &mut GameState) -> u64 {
    if state.combo.count == 0 {
        return 0;
    }
    let bonus = state.combo.count as u64 * combo::BONUS_PER_HIT;
    state.scores.total_score += bonus;
    debug!(count = state.combo.count, bonus, "Combo settled");
    state.combo.count = 0;
    state.combo.active = false;
    state.combo.last_update = state.now_ms;
    bonus
}

/// Ball speed after one level-up; unchanged once the cap would be exceeded
pub fn next_ball_speed(current: f32) -> f32 {
    let candidate = current * ball::LEVEL_SPEED_FACTOR;
    if candidate <= ball::BASE_SPEED * ball::MAX_SPEED_INCREASE {
        candidate
    } else {
        current
    }
}

/// Ball speed reached after climbing from the starting level to `target`
pub fn speed_for_level(target: u32) -> f32 {
    (level::STARTING..target).fold(ball::BASE_SPEED, |speed, _| next_ball_speed(speed))
}

/// Field cleared: bump the level, queue 2-4 dropping rows and speed up
pub fn advance_level<R: Rng + ?Sized>(
    state: &mut GameState,
    generator: &BrickFieldGenerator,
    rng: &mut R,
) -> LevelAdvance {
    state.level += 1;
    state.level_banner_at = Some(state.now_ms);
    state.dropping_bricks = generator.dropping_rows(rng, state.level, state.now_ms);
    state.ball_speed = next_ball_speed(state.ball_speed);
    for b in state.balls.iter_mut() {
        b.speed = state.ball_speed;
    }
    info!(
        level = state.level,
        ball_speed = state.ball_speed,
        rows = state.dropping_bricks.len(),
        "Level up"
    );
    LevelAdvance {
        ball_speed: state.ball_speed,
        level: state.level,
        dropping_bricks: state.dropping_bricks.clone(),
    }
}

/// Reset to a single unlaunched original ball centered on the paddle
pub fn start_turn(state: &mut GameState) {
    state.balls = vec![Ball::new_original(state.paddle.center_x(), state.ball_speed)];
    state.aim = Default::default();
    state.guide_line = GuideLine {
        max_bounces: state.guide_line.max_bounces,
        ..GuideLine::default()
    };
}

/// Original ball lost: settle the combo, hand the turn over, push the field
/// down one row and add a fresh row on top.
///
/// The handover carries the post-shift layout so both peers converge on
/// the same bricks. A breach of the danger zone also ends the match.
pub fn end_turn<R: Rng + ?Sized>(
    state: &mut GameState,
    generator: &BrickFieldGenerator,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) {
    let combo_bonus = settle_combo(state);
    state.current_player = state.current_player.other();
    start_turn(state);

    let breached = bricks::shift_down(&mut state.bricks)
        | bricks::shift_dropping(&mut state.dropping_bricks);
    let mut row = generator.row(rng, 0, state.level, state.now_ms);
    row.append(&mut state.bricks);
    state.bricks = row;

    info!(
        next = %state.current_player,
        combo_bonus,
        bricks = state.bricks.len(),
        "Turn ended"
    );
    events.push(GameEvent::TurnEnded {
        handover: TurnHandover {
            current_player: state.current_player,
            bricks: state.bricks.clone(),
            dropping_bricks: state.dropping_bricks.clone(),
        },
        combo_bonus,
    });

    if breached {
        events.push(GameEvent::GameOver(declare_game_over(
            state,
            GameOverReason::Blocks,
        )));
    }
}

/// Freeze the match. Balls stop where they are.
pub fn declare_game_over(state: &mut GameState, reason: GameOverReason) -> GameOverNotice {
    state.is_game_over = true;
    state.game_over_reason = Some(reason.clone());
    for b in state.balls.iter_mut() {
        b.dx = 0.0;
        b.dy = 0.0;
    }
    info!(reason = ?reason, score = state.scores.total_score, "Game over");
    GameOverNotice {
        reason,
        score: state.scores.total_score,
    }
}

/// Launch angle for a pointer `pointer_x` relative to the aim base
pub fn aim_angle(base_x: f32, pointer_x: f32) -> f32 {
    let normalized = ((pointer_x - base_x) / aim::MAX_DELTA).clamp(-1.0, 1.0);
    let angle = aim::BASE_ANGLE + (normalized + 1.0) * (aim::ANGLE_RANGE / 2.0);
    angle.clamp(aim::MIN_ANGLE, aim::MAX_ANGLE)
}
