//! Procedural brick field generation
//!
//! Rows pick a random column count in [MIN_COLS, COLS], a random subset of
//! columns, and a strength per brick drawn from level-scaled tiers.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::game::constants::{bricks, field};
use crate::game::state::{Brick, Millis};
use crate::util::weighted::{WeightError, WeightedTable};

/// Strength tier for a newly created brick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthTier {
    Weak,
    Medium,
    Strong,
}

/// Left edge of the centered brick grid
pub fn grid_left() -> f32 {
    let grid_width = (bricks::WIDTH + bricks::PADDING) * bricks::COLS as f32 - bricks::PADDING;
    (field::WIDTH - grid_width) / 2.0
}

/// Top-left corner of a grid cell. Negative rows sit above the field.
pub fn cell_origin(col: usize, row: i32) -> (f32, f32) {
    (
        grid_left() + col as f32 * (bricks::WIDTH + bricks::PADDING),
        bricks::TOP_OFFSET + row as f32 * (bricks::HEIGHT + bricks::PADDING),
    )
}

/// Vertical distance of one grid row
pub fn row_pitch() -> f32 {
    bricks::HEIGHT + bricks::PADDING
}

#[derive(Debug, Clone)]
pub struct BrickFieldGenerator {
    tiers: WeightedTable<StrengthTier>,
}

impl BrickFieldGenerator {
    pub fn new() -> Result<Self, WeightError> {
        let [weak, medium, strong] = bricks::TIER_WEIGHTS;
        Ok(Self {
            tiers: WeightedTable::new([
                (StrengthTier::Weak, weak),
                (StrengthTier::Medium, medium),
                (StrengthTier::Strong, strong),
            ])?,
        })
    }

    /// Strength for a new brick at `level`, in [1, MAX_STRENGTH]
    pub fn strength<R: Rng + ?Sized>(&self, rng: &mut R, level: u32) -> u8 {
        let level_factor = (level as f32 / bricks::LEVEL_FACTOR_CAP as f32).min(1.0);
        let raw = match self.tiers.choose(rng) {
            StrengthTier::Weak => 1.0,
            StrengthTier::Medium => (rng.gen::<f32>() * 3.0 + level_factor * 2.0).ceil(),
            StrengthTier::Strong => (rng.gen::<f32>() * 5.0 + level_factor * 5.0).ceil(),
        };
        (raw as u8).clamp(1, bricks::MAX_STRENGTH)
    }

    pub fn brick<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        col: usize,
        row: i32,
        level: u32,
        now: Millis,
    ) -> Brick {
        let (x, y) = cell_origin(col, row);
        Brick::new(x, y, self.strength(rng, level), now)
    }

    /// One row with a random subset of columns filled
    pub fn row<R: Rng + ?Sized>(&self, rng: &mut R, row: i32, level: u32, now: Millis) -> Vec<Brick> {
        let count = rng.gen_range(bricks::MIN_COLS..=bricks::COLS);
        let mut columns: Vec<usize> = (0..bricks::COLS).collect();
        columns.shuffle(rng);
        columns
            .into_iter()
            .take(count)
            .map(|col| self.brick(rng, col, row, level, now))
            .collect()
    }

    /// Opening field of ROWS rows
    pub fn initial_field<R: Rng + ?Sized>(&self, rng: &mut R, level: u32, now: Millis) -> Vec<Brick> {
        (0..bricks::ROWS as i32)
            .flat_map(|row| self.row(rng, row, level, now))
            .collect()
    }

    /// Level-up rows: 2-4 rows stacked above the field, each tagged with the
    /// target y it will drop to.
    pub fn dropping_rows<R: Rng + ?Sized>(&self, rng: &mut R, level: u32, now: Millis) -> Vec<Brick> {
        let rows = rng.gen_range(bricks::LEVEL_ROWS_MIN..=bricks::LEVEL_ROWS_MAX) as i32;
        let drop = rows as f32 * row_pitch();
        (0..rows)
            .flat_map(|i| self.row(rng, i - rows, level, now))
            .map(|mut brick| {
                brick.target_y = Some(brick.y + drop);
                brick
            })
            .collect()
    }
}

/// Push every brick down one row. Returns true if any brick's lower edge
/// reached the danger zone.
pub fn shift_down(bricks: &mut [Brick]) -> bool {
    let pitch = row_pitch();
    let mut breached = false;
    for brick in bricks.iter_mut() {
        brick.shift_down(pitch);
        breached |= brick.lower_edge() >= field::DANGER_ZONE_Y;
    }
    breached
}

/// Push in-flight level-up rows down one row along with the settled field,
/// so they still land below the fresh top row. Returns true if any of them
/// will come to rest in the danger zone.
pub fn shift_dropping(dropping: &mut [Brick]) -> bool {
    let pitch = row_pitch();
    let mut breached = false;
    for brick in dropping.iter_mut() {
        brick.shift_down(pitch);
        if let Some(target) = brick.target_y.as_mut() {
            *target += pitch;
        }
        let resting_y = brick.target_y.unwrap_or(brick.y);
        breached |= resting_y + brick.height >= field::DANGER_ZONE_Y;
    }
    breached
}

/// Advance a level-up drop by one tick. Returns true once every brick has
/// settled on its target; settled bricks have `target_y` cleared.
pub fn advance_drop(dropping: &mut [Brick]) -> bool {
    let mut all_settled = true;
    for brick in dropping.iter_mut() {
        let Some(target) = brick.target_y else {
            continue;
        };
        let distance = target - brick.y;
        if distance.abs() > bricks::DROP_EPSILON {
            let step = distance.signum() * bricks::DROP_SPEED.min(distance.abs());
            brick.shift_down(step);
            all_settled = false;
        }
    }
    if all_settled {
        for brick in dropping.iter_mut() {
            if let Some(target) = brick.target_y.take() {
                let snap = target - brick.y;
                brick.shift_down(snap);
            }
        }
    }
    all_settled
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generator() -> BrickFieldGenerator {
        BrickFieldGenerator::new().unwrap()
    }

    #[test]
    fn test_shift_dropping_moves_targets() {
        let mut dropping = vec![Brick {
            target_y: Some(bricks::TOP_OFFSET),
            ..Brick::new(27.5, bricks::TOP_OFFSET - row_pitch(), 2, 0)
        }];
        assert!(!shift_dropping(&mut dropping));
        let brick = &dropping[0];
        assert_eq!(brick.y, bricks::TOP_OFFSET);
        assert_eq!(brick.original_y, bricks::TOP_OFFSET);
        assert_eq!(brick.target_y, Some(bricks::TOP_OFFSET + row_pitch()));

        // Judged by where the row will rest, not where it is now
        let mut deep = vec![Brick {
            target_y: Some(field::DANGER_ZONE_Y - bricks::HEIGHT - 10.0),
            ..Brick::new(27.5, 100.0, 1, 0)
        }];
        assert!(shift_dropping(&mut deep));
    }

    #[test]
    fn test_grid_is_centered() {
        // 10 * 55 - 5 = 545 wide, (600 - 545) / 2
        assert!((grid_left() - 27.5).abs() < 1e-4);
        let (x, y) = cell_origin(9, 0);
        assert!((x + bricks::WIDTH - (field::WIDTH - 27.5)).abs() < 1e-3);
        assert_eq!(y, bricks::TOP_OFFSET);
    }

    #[test]
    fn test_strength_in_range_at_all_levels() {
        let gen = generator();
        let mut rng = StdRng::seed_from_u64(7);
        for level in [1, 5, 20, 80] {
            for _ in 0..2_000 {
                let s = gen.strength(&mut rng, level);
                assert!((1..=bricks::MAX_STRENGTH).contains(&s));
            }
        }
    }

    #[test]
    fn test_strength_tiers_scale_with_level() {
        let gen = generator();
        let mut rng = StdRng::seed_from_u64(3);
        let mean = |rng: &mut StdRng, level| {
            (0..5_000).map(|_| gen.strength(rng, level) as f64).sum::<f64>() / 5_000.0
        };
        let low = mean(&mut rng, 1);
        let high = mean(&mut rng, 20);
        assert!(high > low + 0.5, "low {low}, high {high}");
    }

    #[test]
    fn test_row_uses_distinct_columns() {
        let gen = generator();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let row = gen.row(&mut rng, 0, 1, 0);
            assert!((bricks::MIN_COLS..=bricks::COLS).contains(&row.len()));
            let mut xs: Vec<i64> = row.iter().map(|b| b.x.round() as i64).collect();
            xs.sort_unstable();
            xs.dedup();
            assert_eq!(xs.len(), row.len());
        }
    }

    #[test]
    fn test_initial_field_rows() {
        let gen = generator();
        let mut rng = StdRng::seed_from_u64(5);
        let field = gen.initial_field(&mut rng, 1, 0);
        assert!(field.len() >= bricks::ROWS * bricks::MIN_COLS);
        assert!(field.len() <= bricks::ROWS * bricks::COLS);
        assert!(field.iter().all(|b| b.strength >= 1 && b.target_y.is_none()));
    }

    #[test]
    fn test_dropping_rows_start_above_field_and_target_grid() {
        let gen = generator();
        let mut rng = StdRng::seed_from_u64(9);
        let rows = gen.dropping_rows(&mut rng, 2, 0);
        assert!(!rows.is_empty());
        for brick in &rows {
            let target = brick.target_y.unwrap();
            assert!(brick.y < bricks::TOP_OFFSET);
            assert!(target >= bricks::TOP_OFFSET);
            let steps = (target - brick.y) / row_pitch();
            assert!((2.0..=4.0).contains(&steps.round()));
        }
    }

    #[test]
    fn test_advance_drop_settles_on_target() {
        let gen = generator();
        let mut rng = StdRng::seed_from_u64(13);
        let mut rows = gen.dropping_rows(&mut rng, 1, 0);
        let targets: Vec<f32> = rows.iter().map(|b| b.target_y.unwrap()).collect();
        let mut ticks = 0;
        while !advance_drop(&mut rows) {
            ticks += 1;
            assert!(ticks < 1_000);
        }
        // 2-4 rows of 30px at 2px per tick
        assert!((30..=60).contains(&ticks));
        for (brick, target) in rows.iter().zip(targets) {
            assert_eq!(brick.y, target);
            assert_eq!(brick.original_y, target);
            assert!(brick.target_y.is_none());
        }
    }

    #[test]
    fn test_shift_down_flags_danger_zone() {
        let mut safe = vec![Brick::new(0.0, 100.0, 1, 0)];
        assert!(!shift_down(&mut safe));
        assert_eq!(safe[0].y, 130.0);

        let mut low = vec![Brick::new(0.0, field::DANGER_ZONE_Y - 50.0, 1, 0)];
        assert!(shift_down(&mut low));
    }
}
