//! Simulation and sync benchmarks
//!
//! A tick must stay well inside the 16 ms frame, including the delta
//! the authority builds right after it.
//!
//! Run with: cargo bench --bench simulation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use coop_brick_breaker::game::constants::{aim, paddle, trajectory as limits};
use coop_brick_breaker::game::game_loop::{GameLoop, GameLoopConfig};
use coop_brick_breaker::game::trajectory::{self, Shot};
use coop_brick_breaker::net::delta::{generate_delta, DeltaTracker};
use coop_brick_breaker::net::protocol::{encode, GameSnapshot, ServerMessage};
use coop_brick_breaker::util::vec2::Vec2;

/// Seeded match with the original ball launched plus `clones` extra balls
fn game_with_balls(clones: usize) -> GameLoop {
    let mut game = GameLoop::new(GameLoopConfig {
        seed: Some(7),
        ..Default::default()
    })
    .expect("power-up weights are valid");
    game.launch();

    let state = game.state_mut();
    let Some(original) = state.original_ball().cloned() else {
        return game;
    };
    for i in 0..clones {
        let mut clone = original.clone();
        clone.is_original = false;
        let angle = aim::MIN_ANGLE + (aim::MAX_ANGLE - aim::MIN_ANGLE) * (i as f32 / clones as f32);
        let v = Vec2::from_angle(angle, clone.speed);
        clone.dx = v.x;
        clone.dy = v.y;
        state.balls.push(clone);
    }
    game
}

/// One tick at various ball counts
fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    group.sample_size(50);

    for clones in [0, 8, 32, 128] {
        let full_field = game_with_balls(clones).state().bricks.len();

        group.throughput(Throughput::Elements(clones as u64 + 1));
        group.bench_with_input(BenchmarkId::new("balls", clones + 1), &clones, |b, &clones| {
            let mut game = game_with_balls(clones);
            b.iter(|| {
                // Keep the field full so every iteration does collision work
                if game.state().bricks.len() < full_field / 2 || game.state().is_game_over {
                    game = game_with_balls(clones);
                }
                black_box(game.tick())
            })
        });
    }
    group.finish();
}

/// Aim-assist prediction through a full field
fn bench_trajectory(c: &mut Criterion) {
    let game = game_with_balls(0);
    let bricks = game.state().bricks.clone();
    let shot = Shot {
        origin: Vec2::new(300.0, paddle::Y - 20.0),
        angle: aim::BASE_ANGLE,
        speed: 3.0,
        radius: 8.0,
    };

    c.bench_function("trajectory_predict", |b| {
        b.iter(|| {
            black_box(trajectory::predict(
                black_box(shot),
                &bricks,
                paddle::Y,
                limits::MAX_BOUNCES,
            ))
        })
    });
}

/// Delta generation and encoding, as the authority and relay do each frame
fn bench_delta(c: &mut Criterion) {
    let mut group = c.benchmark_group("delta");
    let mut game = game_with_balls(8);
    let base = GameSnapshot::from_game_state(game.state());
    for _ in 0..30 {
        game.tick();
    }
    let current = GameSnapshot::from_game_state(game.state());

    group.bench_function("generate", |b| {
        b.iter(|| black_box(generate_delta(black_box(&base), black_box(&current))))
    });

    group.bench_function("tracker_steady_state", |b| {
        let mut tracker = DeltaTracker::new();
        tracker.next_delta(&current);
        b.iter(|| black_box(tracker.next_delta(black_box(&current))))
    });

    let full = ServerMessage::GameUpdateDelta { delta: current };
    group.bench_function("encode_full_snapshot", |b| {
        b.iter(|| black_box(encode(black_box(&full))))
    });
    group.finish();
}

criterion_group!(benches, bench_tick, bench_trajectory, bench_delta);
criterion_main!(benches);
