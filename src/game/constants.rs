/// Play field dimensions
pub mod field {
    pub const WIDTH: f32 = 600.0;
    pub const HEIGHT: f32 = 700.0;
    /// Any brick whose lower edge reaches this line ends the match
    pub const DANGER_ZONE_Y: f32 = HEIGHT - 100.0;
}

/// Simulation clock
pub mod timing {
    /// Milliseconds advanced per simulation tick (~60 Hz)
    pub const TICK_MS: u64 = 16;
}

pub mod paddle {
    pub const BASE_WIDTH: f32 = 100.0;
    pub const HEIGHT: f32 = 12.0;
    /// Paddle top edge
    pub const Y: f32 = super::field::HEIGHT - 30.0;
    pub const GROWTH_STEP: f32 = 0.05;
    pub const MAX_GROWTH: f32 = 0.20;
    /// Duration of the cosmetic growth animation
    pub const GROWTH_ANIMATION_MS: u64 = 500;
}

pub mod ball {
    pub const RADIUS: f32 = 8.0;
    pub const BASE_SPEED: f32 = 3.0;
    /// Ball speed never exceeds BASE_SPEED * MAX_SPEED_INCREASE
    pub const MAX_SPEED_INCREASE: f32 = 1.20;
    /// Per-level speed multiplier
    pub const LEVEL_SPEED_FACTOR: f32 = 1.01;
    /// Resting y of an unlaunched ball
    pub const START_Y: f32 = super::field::HEIGHT - 50.0;
}

/// Aim control mapping pointer travel to a launch angle
pub mod aim {
    use std::f32::consts::PI;

    /// Pointer travel (px) that maps to full deflection
    pub const MAX_DELTA: f32 = 200.0;
    pub const BASE_ANGLE: f32 = -PI * 0.722;
    /// Total sweep from BASE_ANGLE
    pub const ANGLE_RANGE: f32 = PI * 0.556;
    pub const MIN_ANGLE: f32 = -2.27;
    pub const MAX_ANGLE: f32 = -0.70;
    /// Straight up
    pub const DEFAULT_ANGLE: f32 = -PI / 2.0;
}

pub mod bricks {
    pub const ROWS: usize = 8;
    pub const COLS: usize = 10;
    pub const MIN_COLS: usize = 5;
    pub const WIDTH: f32 = 50.0;
    pub const HEIGHT: f32 = 25.0;
    pub const PADDING: f32 = 5.0;
    pub const TOP_OFFSET: f32 = 60.0;
    pub const MAX_STRENGTH: u8 = 10;
    pub const POINTS_PER_STRENGTH: u32 = 10;
    /// Duration of the hit shake
    pub const HIT_DURATION_MS: u64 = 200;
    /// Peak shake displacement in px
    pub const SHAKE_AMPLITUDE: f32 = 2.0;
    pub const FADE_IN_MS: u64 = 500;
    /// Level-up row drop speed (px per tick)
    pub const DROP_SPEED: f32 = 2.0;
    /// Dropping bricks settle once within this distance of their target
    pub const DROP_EPSILON: f32 = 0.1;
    /// Rows spawned on level-up, inclusive range
    pub const LEVEL_ROWS_MIN: usize = 2;
    pub const LEVEL_ROWS_MAX: usize = 4;
    /// Level at which the strength tiers reach full scaling
    pub const LEVEL_FACTOR_CAP: u32 = 20;

    /// Strength tier probabilities: weak, medium, strong
    pub const TIER_WEIGHTS: [f64; 3] = [0.6, 0.2, 0.2];
}

pub mod power_up {
    pub const SIZE: f32 = 15.0;
    /// Fall speed (px per tick)
    pub const SPEED: f32 = 2.0;
    pub const SPAWN_CHANCE: f64 = 0.15;
    pub const CLONE_BALL_WEIGHT: f64 = 0.4;
    pub const GROW_PADDLE_WEIGHT: f64 = 0.3;
    pub const GUNS_WEIGHT: f64 = 0.3;
    /// Max clone offset on each axis
    pub const CLONE_OFFSET: f32 = 20.0;
}

pub mod guns {
    pub const DURATION_MS: u64 = 30_000;
    pub const COOLDOWN_MS: u64 = 500;
    pub const PROJECTILE_SPEED: f32 = 8.0;
    pub const PROJECTILE_SIZE: f32 = 4.0;
    /// Inset of each barrel from the paddle edge
    pub const BARREL_INSET: f32 = 10.0;
}

pub mod combo {
    /// Bonus added to the total score per combo hit at settlement
    pub const BONUS_PER_HIT: u64 = 100;
}

pub mod level {
    pub const STARTING: u32 = 1;
    /// Duration of the level-up banner
    pub const BANNER_MS: u64 = 2_000;
    /// Level at which the progress marker reaches the end of the line
    pub const PROGRESS_LEVELS: u32 = 10;
}

pub mod trajectory {
    pub const MAX_BOUNCES: u32 = 5;
    /// Step ceiling for degenerate inputs
    pub const MAX_STEPS: usize = 10_000;
}

/// Networking constants
pub mod net {
    /// Maximum frame payload in bytes
    pub const MAX_MESSAGE_SIZE: usize = 262_144;
    /// Seats per room
    pub const ROOM_CAPACITY: usize = 2;
    pub const ROOM_ID_LEN: usize = 6;
    /// Outbound frames buffered per connection before drops
    pub const OUTBOUND_QUEUE: usize = 256;
    /// Inbound messages buffered per client before back-pressure
    pub const INBOX_CAPACITY: usize = 256;
}
