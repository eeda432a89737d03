//! Game state definitions and structures
//!
//! Contains every simulated entity (balls, bricks, paddle, power-ups,
//! projectiles) plus the match-level bookkeeping owned by the peer that
//! holds the turn. Entity structs serialize with camelCase names since
//! they travel inside sync messages verbatim.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::constants::{aim, ball, bricks, field, guns, level, paddle, power_up};
use crate::util::vec2::Vec2;

/// Simulation timestamp in milliseconds
pub type Millis = u64;

/// Player seat in a room
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlayerSlot {
    #[default]
    One,
    Two,
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid player slot {0}, expected 1 or 2")]
pub struct InvalidSlot(pub u8);

impl PlayerSlot {
    pub fn number(self) -> u8 {
        match self {
            PlayerSlot::One => 1,
            PlayerSlot::Two => 2,
        }
    }

    pub fn other(self) -> Self {
        match self {
            PlayerSlot::One => PlayerSlot::Two,
            PlayerSlot::Two => PlayerSlot::One,
        }
    }
}

impl From<PlayerSlot> for u8 {
    fn from(slot: PlayerSlot) -> u8 {
        slot.number()
    }
}

impl TryFrom<u8> for PlayerSlot {
    type Error = InvalidSlot;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PlayerSlot::One),
            2 => Ok(PlayerSlot::Two),
            other => Err(InvalidSlot(other)),
        }
    }
}

impl std::fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player {}", self.number())
    }
}

/// Ball state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub speed: f32,
    pub dx: f32,
    pub dy: f32,
    /// Losing the original ball ends the turn; clones are simply removed
    pub is_original: bool,
}

impl Ball {
    /// Unlaunched original ball resting above the paddle
    pub fn new_original(x: f32, speed: f32) -> Self {
        Self {
            x,
            y: ball::START_Y,
            radius: ball::RADIUS,
            speed,
            dx: 0.0,
            dy: 0.0,
            is_original: true,
        }
    }

    /// Launched balls always carry vertical velocity
    pub fn is_launched(&self) -> bool {
        self.dy != 0.0
    }

    pub fn launch(&mut self, angle: f32) {
        let v = Vec2::from_angle(angle, self.speed);
        self.dx = v.x;
        self.dy = v.y;
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn lower_edge(&self) -> f32 {
        self.y + self.radius
    }
}

/// Visual strength class of a brick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrickTier {
    Single,
    Light,
    Medium,
    Heavy,
    Severe,
    Max,
}

impl BrickTier {
    pub fn for_strength(strength: u8) -> Self {
        match strength {
            0 | 1 => BrickTier::Single,
            2..=3 => BrickTier::Light,
            4..=5 => BrickTier::Medium,
            6..=7 => BrickTier::Heavy,
            8..=9 => BrickTier::Severe,
            _ => BrickTier::Max,
        }
    }
}

/// Brick state
///
/// `points` is fixed at creation from the initial strength and is what a
/// depleting hit awards. `original_x`/`original_y` anchor the presentation
/// shake; collision always uses `x`/`y`, which the shake never touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brick {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub strength: u8,
    pub points: u32,
    pub created_at: Millis,
    #[serde(default)]
    pub is_hit: bool,
    #[serde(default)]
    pub hit_time: Millis,
    pub original_x: f32,
    pub original_y: f32,
    /// Resting y while a level-up row is still dropping in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_y: Option<f32>,
}

impl Brick {
    pub fn new(x: f32, y: f32, strength: u8, created_at: Millis) -> Self {
        let strength = strength.clamp(1, bricks::MAX_STRENGTH);
        Self {
            x,
            y,
            width: bricks::WIDTH,
            height: bricks::HEIGHT,
            strength,
            points: strength as u32 * bricks::POINTS_PER_STRENGTH,
            created_at,
            is_hit: false,
            hit_time: 0,
            original_x: x,
            original_y: y,
            target_y: None,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn lower_edge(&self) -> f32 {
        self.y + self.height
    }

    /// Take one hit. Returns true when the brick is depleted.
    pub fn register_hit(&mut self, now: Millis) -> bool {
        self.strength = self.strength.saturating_sub(1);
        self.is_hit = true;
        self.hit_time = now;
        self.strength == 0
    }

    /// Drops the hit flag once the shake window has passed
    pub fn clear_expired_hit(&mut self, now: Millis) {
        if self.is_hit && now.saturating_sub(self.hit_time) >= bricks::HIT_DURATION_MS {
            self.is_hit = false;
        }
    }

    /// Render displacement from `original_x/original_y` while shaking
    pub fn shake_offset(&self, now: Millis) -> Vec2 {
        let elapsed = now.saturating_sub(self.hit_time);
        if !self.is_hit || elapsed >= bricks::HIT_DURATION_MS {
            return Vec2::ZERO;
        }
        let decay = 1.0 - elapsed as f32 / bricks::HIT_DURATION_MS as f32;
        let phase = elapsed as f32 / 20.0;
        Vec2::new(
            phase.sin() * bricks::SHAKE_AMPLITUDE * decay,
            phase.cos() * bricks::SHAKE_AMPLITUDE * decay,
        )
    }

    /// Fade-in opacity in [0, 1]
    pub fn opacity(&self, now: Millis) -> f32 {
        (now.saturating_sub(self.created_at) as f32 / bricks::FADE_IN_MS as f32).min(1.0)
    }

    pub fn tier(&self) -> BrickTier {
        BrickTier::for_strength(self.strength)
    }

    /// Move vertically, keeping the shake anchor in step
    pub fn shift_down(&mut self, dy: f32) {
        self.y += dy;
        self.original_y += dy;
    }
}

/// Paddle state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
    pub base_width: f32,
    pub height: f32,
    /// Width bonus as a fraction of `base_width`, in [0, MAX_GROWTH]
    pub growth_factor: f32,
    pub growth_started_at: Option<Millis>,
}

impl Default for Paddle {
    fn default() -> Self {
        let mut p = Self {
            x: 0.0,
            y: paddle::Y,
            base_width: paddle::BASE_WIDTH,
            height: paddle::HEIGHT,
            growth_factor: 0.0,
            growth_started_at: None,
        };
        p.center_on_field();
        p
    }
}

impl Paddle {
    pub fn width(&self) -> f32 {
        self.base_width * (1.0 + self.growth_factor)
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width() / 2.0
    }

    pub fn center_on_field(&mut self) {
        self.x = (field::WIDTH - self.width()) / 2.0;
    }

    /// Center the paddle under the pointer, kept inside the field
    pub fn follow_pointer(&mut self, pointer_x: f32) {
        let max_x = (field::WIDTH - self.width()).max(0.0);
        self.x = (pointer_x - self.width() / 2.0).clamp(0.0, max_x);
    }

    /// Apply one growth step. Returns false when already at the cap.
    pub fn grow(&mut self, now: Millis) -> bool {
        if self.growth_factor >= paddle::MAX_GROWTH - f32::EPSILON {
            return false;
        }
        self.growth_factor = (self.growth_factor + paddle::GROWTH_STEP).min(paddle::MAX_GROWTH);
        self.growth_started_at = Some(now);
        let max_x = (field::WIDTH - self.width()).max(0.0);
        self.x = self.x.clamp(0.0, max_x);
        true
    }

    /// Progress of the growth animation in [0, 1]; 1 when idle
    pub fn growth_progress(&self, now: Millis) -> f32 {
        match self.growth_started_at {
            Some(start) => {
                (now.saturating_sub(start) as f32 / paddle::GROWTH_ANIMATION_MS as f32).min(1.0)
            }
            None => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerUpKind {
    CloneBall,
    GrowPaddle,
    Guns,
}

/// Falling power-up capsule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerUp {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(rename = "type")]
    pub kind: PowerUpKind,
}

impl PowerUp {
    /// Spawn centered on `center`
    pub fn new(center: Vec2, kind: PowerUpKind) -> Self {
        Self {
            x: center.x - power_up::SIZE / 2.0,
            y: center.y - power_up::SIZE / 2.0,
            width: power_up::SIZE,
            height: power_up::SIZE,
            kind,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Gun projectile, moves straight up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projectile {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub dy: f32,
}

impl Projectile {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            size: guns::PROJECTILE_SIZE,
            dy: -guns::PROJECTILE_SPEED,
        }
    }
}

/// Predicted aim path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideLine {
    pub is_visible: bool,
    pub points: Vec<Vec2>,
    pub max_bounces: u32,
}

/// Weapon window, tracked as absolute expiry on the local clock
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GunsState {
    pub expires_at: Option<Millis>,
    /// Remaining time when the window was last (re)based
    pub window_ms: Millis,
    pub cooldown_until: Millis,
    /// Bumped each time guns are armed, so re-arming is visible to diffs
    pub generation: u32,
}

/// Wire form of the weapon window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GunsSnapshot {
    pub active: bool,
    pub remaining_time: Millis,
    #[serde(default)]
    pub generation: u32,
}

impl GunsState {
    pub fn is_active(&self, now: Millis) -> bool {
        self.expires_at.is_some_and(|t| now < t)
    }

    pub fn remaining(&self, now: Millis) -> Millis {
        self.expires_at.map_or(0, |t| t.saturating_sub(now))
    }

    /// Start (or restart) a full weapon window
    pub fn arm(&mut self, now: Millis) {
        self.expires_at = Some(now + guns::DURATION_MS);
        self.window_ms = guns::DURATION_MS;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn can_fire(&self, now: Millis) -> bool {
        self.is_active(now) && now >= self.cooldown_until
    }

    /// Clears an elapsed window. Returns true if it just expired.
    pub fn expire(&mut self, now: Millis) -> bool {
        match self.expires_at {
            Some(t) if now >= t => {
                self.expires_at = None;
                true
            }
            _ => false,
        }
    }

    /// Wire form. `remaining_time` is the window length captured when guns
    /// were armed, so the snapshot only changes on arm and expiry.
    pub fn snapshot(&self, now: Millis) -> GunsSnapshot {
        let active = self.is_active(now);
        GunsSnapshot {
            active,
            remaining_time: if active { self.window_ms } else { 0 },
            generation: self.generation,
        }
    }

    /// Rebuild a local window from a received snapshot
    pub fn from_snapshot(snapshot: &GunsSnapshot, now: Millis) -> Self {
        let active = snapshot.active && snapshot.remaining_time > 0;
        Self {
            expires_at: active.then(|| now + snapshot.remaining_time),
            window_ms: if active { snapshot.remaining_time } else { 0 },
            cooldown_until: 0,
            generation: snapshot.generation,
        }
    }
}

/// Per-player and aggregate score
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scores {
    pub player1_score: u64,
    pub player2_score: u64,
    pub total_score: u64,
}

/// Rendered score lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreDisplay {
    pub player1: String,
    pub player2: String,
    pub total: String,
}

impl Scores {
    /// Credit `points` to `slot` and to the total
    pub fn award(&mut self, slot: PlayerSlot, points: u64) {
        match slot {
            PlayerSlot::One => self.player1_score += points,
            PlayerSlot::Two => self.player2_score += points,
        }
        self.total_score += points;
    }

    pub fn of(&self, slot: PlayerSlot) -> u64 {
        match slot {
            PlayerSlot::One => self.player1_score,
            PlayerSlot::Two => self.player2_score,
        }
    }

    pub fn display(&self) -> ScoreDisplay {
        ScoreDisplay {
            player1: format!("Player 1: {}", self.player1_score),
            player2: format!("Player 2: {}", self.player2_score),
            total: format!("Total Score: {}", self.total_score),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Combo {
    pub count: u32,
    pub active: bool,
    pub last_update: Millis,
}

/// Why a match ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GameOverReason {
    /// Bricks reached the danger zone
    Blocks,
    Other(String),
}

impl From<String> for GameOverReason {
    fn from(s: String) -> Self {
        if s == "blocks" {
            GameOverReason::Blocks
        } else {
            GameOverReason::Other(s)
        }
    }
}

impl From<GameOverReason> for String {
    fn from(reason: GameOverReason) -> String {
        match reason {
            GameOverReason::Blocks => "blocks".to_string(),
            GameOverReason::Other(s) => s,
        }
    }
}

impl GameOverReason {
    pub fn message(&self) -> &'static str {
        match self {
            GameOverReason::Blocks => "Game Over! The blocks reached the bottom!",
            GameOverReason::Other(_) => "Game Over!",
        }
    }
}

/// Pointer-driven aim before launch
#[derive(Debug, Clone, PartialEq)]
pub struct AimState {
    pub angle: f32,
    pub base_x: f32,
    pub is_aiming: bool,
}

impl Default for AimState {
    fn default() -> Self {
        Self {
            angle: aim::DEFAULT_ANGLE,
            base_x: 0.0,
            is_aiming: false,
        }
    }
}

/// Complete simulated state, written only while this peer holds the turn
#[derive(Debug, Clone)]
pub struct GameState {
    pub current_player: PlayerSlot,
    pub scores: Scores,
    pub is_game_over: bool,
    pub game_over_reason: Option<GameOverReason>,
    pub level: u32,
    pub combo: Combo,
    /// Speed given to every new ball
    pub ball_speed: f32,
    pub paddle: Paddle,
    pub balls: Vec<Ball>,
    pub bricks: Vec<Brick>,
    /// Level-up rows still animating into place
    pub dropping_bricks: Vec<Brick>,
    pub power_ups: Vec<PowerUp>,
    pub projectiles: Vec<Projectile>,
    pub guide_line: GuideLine,
    pub guns: GunsState,
    pub aim: AimState,
    pub level_banner_at: Option<Millis>,
    pub now_ms: Millis,
}

impl GameState {
    /// Fresh match state with an unlaunched ball and no bricks
    pub fn new(current_player: PlayerSlot, now_ms: Millis) -> Self {
        let paddle = Paddle::default();
        let ball = Ball::new_original(paddle.center_x(), ball::BASE_SPEED);
        Self {
            current_player,
            scores: Scores::default(),
            is_game_over: false,
            game_over_reason: None,
            level: level::STARTING,
            combo: Combo::default(),
            ball_speed: ball::BASE_SPEED,
            paddle,
            balls: vec![ball],
            bricks: Vec::new(),
            dropping_bricks: Vec::new(),
            power_ups: Vec::new(),
            projectiles: Vec::new(),
            guide_line: GuideLine {
                max_bounces: crate::game::constants::trajectory::MAX_BOUNCES,
                ..GuideLine::default()
            },
            guns: GunsState::default(),
            aim: AimState::default(),
            level_banner_at: None,
            now_ms,
        }
    }

    pub fn original_ball(&self) -> Option<&Ball> {
        self.balls.iter().find(|b| b.is_original)
    }

    pub fn original_ball_mut(&mut self) -> Option<&mut Ball> {
        self.balls.iter_mut().find(|b| b.is_original)
    }

    /// True while the original ball waits on the paddle
    pub fn awaiting_launch(&self) -> bool {
        self.original_ball().is_some_and(|b| !b.is_launched())
    }

    pub fn level_banner_active(&self) -> bool {
        level_banner_active(self.level_banner_at, self.now_ms)
    }

    pub fn level_progress(&self) -> f32 {
        level_progress(self.level)
    }
}

/// Whether a banner armed at `armed_at` is still showing at `now`
pub fn level_banner_active(armed_at: Option<Millis>, now: Millis) -> bool {
    armed_at.is_some_and(|t| now.saturating_sub(t) < level::BANNER_MS)
}

/// Position of the level marker along the progress line, in [0, 1]
pub fn level_progress(level: u32) -> f32 {
    (level as f32 / level::PROGRESS_LEVELS as f32).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_slot_wire_form() {
        assert_eq!(serde_json::to_string(&PlayerSlot::Two).unwrap(), "2");
        let slot: PlayerSlot = serde_json::from_str("1").unwrap();
        assert_eq!(slot, PlayerSlot::One);
        assert!(serde_json::from_str::<PlayerSlot>("3").is_err());
        assert_eq!(PlayerSlot::One.other(), PlayerSlot::Two);
    }

    #[test]
    fn test_brick_points_follow_initial_strength() {
        let brick = Brick::new(0.0, 0.0, 4, 0);
        assert_eq!(brick.points, 40);
        assert_eq!(Brick::new(0.0, 0.0, 0, 0).strength, 1);
        assert_eq!(Brick::new(0.0, 0.0, 42, 0).strength, bricks::MAX_STRENGTH);
    }

    #[test]
    fn test_brick_hit_depletes_and_shakes() {
        let mut brick = Brick::new(10.0, 20.0, 2, 0);
        assert!(!brick.register_hit(1_000));
        assert_eq!(brick.strength, 1);
        assert!(brick.is_hit);
        assert_ne!(brick.shake_offset(1_050), Vec2::ZERO);
        // Shake is presentation only
        assert_eq!((brick.x, brick.y), (10.0, 20.0));

        brick.clear_expired_hit(1_100);
        assert!(brick.is_hit);
        brick.clear_expired_hit(1_200);
        assert!(!brick.is_hit);
        assert_eq!(brick.shake_offset(1_200), Vec2::ZERO);

        assert!(brick.register_hit(2_000));
        assert_eq!(brick.strength, 0);
    }

    #[test]
    fn test_brick_tiers() {
        assert_eq!(BrickTier::for_strength(1), BrickTier::Single);
        assert_eq!(BrickTier::for_strength(3), BrickTier::Light);
        assert_eq!(BrickTier::for_strength(5), BrickTier::Medium);
        assert_eq!(BrickTier::for_strength(7), BrickTier::Heavy);
        assert_eq!(BrickTier::for_strength(9), BrickTier::Severe);
        assert_eq!(BrickTier::for_strength(10), BrickTier::Max);
    }

    #[test]
    fn test_brick_fades_in() {
        let brick = Brick::new(0.0, 0.0, 3, 1_000);
        assert_eq!(brick.opacity(1_000), 0.0);
        // Clock reads before creation clamp to transparent
        assert_eq!(brick.opacity(900), 0.0);
        assert!((brick.opacity(1_250) - 0.5).abs() < 1e-6);
        assert_eq!(brick.opacity(1_500), 1.0);
        assert_eq!(brick.opacity(9_000), 1.0);
    }

    #[test]
    fn test_brick_tier_tracks_remaining_strength() {
        let mut brick = Brick::new(0.0, 0.0, 4, 0);
        assert_eq!(brick.tier(), BrickTier::Medium);
        brick.register_hit(10);
        assert_eq!(brick.tier(), BrickTier::Light);
        brick.register_hit(20);
        brick.register_hit(30);
        assert_eq!(brick.tier(), BrickTier::Single);
        assert_eq!(Brick::new(0.0, 0.0, 42, 0).tier(), BrickTier::Max);
    }

    #[test]
    fn test_paddle_growth_animation() {
        let mut paddle = Paddle::default();
        assert_eq!(paddle.growth_progress(0), 1.0);

        assert!(paddle.grow(2_000));
        assert_eq!(paddle.growth_progress(2_000), 0.0);
        assert!((paddle.growth_progress(2_250) - 0.5).abs() < 1e-6);
        assert_eq!(paddle.growth_progress(2_500), 1.0);

        // A second step restarts the ramp
        assert!(paddle.grow(3_000));
        assert!((paddle.growth_progress(3_100) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_paddle_growth_saturates() {
        let mut paddle = Paddle::default();
        for _ in 0..4 {
            assert!(paddle.grow(0));
        }
        assert!((paddle.growth_factor - 0.20).abs() < 1e-6);
        assert!(!paddle.grow(0));
        assert!((paddle.width() - 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_paddle_follow_pointer_clamps() {
        let mut paddle = Paddle::default();
        paddle.follow_pointer(-50.0);
        assert_eq!(paddle.x, 0.0);
        paddle.follow_pointer(10_000.0);
        assert_eq!(paddle.x, field::WIDTH - paddle.width());
        paddle.follow_pointer(300.0);
        assert_eq!(paddle.x, 250.0);
    }

    #[test]
    fn test_guns_window() {
        let mut guns = GunsState::default();
        assert!(!guns.is_active(0));
        guns.arm(1_000);
        assert!(guns.is_active(1_000));
        assert_eq!(guns.remaining(11_000), 20_000);
        assert_eq!(guns.generation, 1);

        // Stable across ticks while the window is open
        let snap = guns.snapshot(11_000);
        assert_eq!(snap, guns.snapshot(12_000));
        assert!(snap.active);
        assert_eq!(snap.remaining_time, guns::DURATION_MS);
        let mirrored = GunsState::from_snapshot(&snap, 500);
        assert_eq!(mirrored.expires_at, Some(30_500));

        assert!(!guns.expire(30_999));
        assert!(guns.expire(31_000));
        assert!(!guns.snapshot(31_000).active);
    }

    #[test]
    fn test_scores_award() {
        let mut scores = Scores::default();
        scores.award(PlayerSlot::One, 10);
        scores.award(PlayerSlot::Two, 30);
        assert_eq!(scores.of(PlayerSlot::One), 10);
        assert_eq!(scores.total_score, 40);
        assert_eq!(scores.display().total, "Total Score: 40");
    }

    #[test]
    fn test_game_over_reason_wire_form() {
        assert_eq!(
            serde_json::to_string(&GameOverReason::Blocks).unwrap(),
            "\"blocks\""
        );
        let other: GameOverReason = serde_json::from_str("\"quit\"").unwrap();
        assert_eq!(other, GameOverReason::Other("quit".into()));
    }

    #[test]
    fn test_new_state_has_one_unlaunched_original() {
        let state = GameState::new(PlayerSlot::One, 0);
        assert_eq!(state.balls.len(), 1);
        assert!(state.awaiting_launch());
        assert_eq!(state.level, 1);
        assert!((state.level_progress() - 0.1).abs() < 1e-6);
    }
}
