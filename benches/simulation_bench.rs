use bevy::math::Vec2;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fight_core::actor::ActorId;
use fight_core::ai::{BotProfile, SparringBot};
use fight_core::combat::ComboTracker;
use fight_core::engine::{Simulation, TimeStep};
use fight_core::input::{Button, CommandBuffer, CommandRegistry, Direction, InputSnapshot};
use fight_core::moves::roster;
use fight_core::replay::state_digest;

fn duel() -> (Simulation, ActorId, ActorId) {
    let mut sim = Simulation::default();
    let a = sim.spawn_actor(&roster::alpha(), Vec2::new(0.0, 50.0), true);
    let b = sim.spawn_actor(&roster::beta(), Vec2::new(80.0, 50.0), false);
    (sim, a, b)
}

fn bench_command_buffer(c: &mut Criterion) {
    let registry = CommandRegistry::standard();
    let qcf = registry.get("QCF").cloned().expect("QCF is a standard motion");
    let history = [
        Direction::Back,
        Direction::Down,
        Direction::DownForward,
        Direction::Forward,
    ];

    c.bench_function("buffer_record_and_match_qcf", |b| {
        b.iter(|| {
            let mut buffer = CommandBuffer::default();
            for (i, direction) in history.iter().cycle().take(20).enumerate() {
                buffer.record(*direction, i as f64 * 16.0);
            }
            black_box(buffer.matches(&qcf, 320.0))
        })
    });
}

fn bench_combo_tracker(c: &mut Criterion) {
    c.bench_function("combo_register_20_hits", |b| {
        b.iter(|| {
            let mut tracker = ComboTracker::new();
            for _ in 0..20 {
                black_box(tracker.register_hit(ActorId(1), black_box(80), false, false));
            }
            tracker.reset_combo(ActorId(1))
        })
    });
}

fn bench_simulation(c: &mut Criterion) {
    c.bench_function("tick_idle_pair", |b| {
        let (mut sim, _, _) = duel();
        b.iter(|| black_box(sim.tick(TimeStep::frame(), &[])))
    });

    c.bench_function("tick_pressing_light_60_frames", |b| {
        b.iter(|| {
            let (mut sim, a, _) = duel();
            let press = InputSnapshot::default().with_button(Button::Light);
            for _ in 0..60 {
                black_box(sim.tick(TimeStep::frame(), &[(a, press)]));
            }
        })
    });

    c.bench_function("bot_match_600_frames", |b| {
        b.iter(|| {
            let (mut sim, a, d) = duel();
            let mut bots = [
                SparringBot::new(a, BotProfile::default(), 1),
                SparringBot::new(d, BotProfile::default(), 2),
            ];
            for _ in 0..600 {
                let inputs: Vec<_> = bots
                    .iter_mut()
                    .map(|bot| (bot.actor(), bot.decide(&sim)))
                    .collect();
                sim.tick(TimeStep::frame(), &inputs);
            }
            black_box(state_digest(&sim))
        })
    });
}

criterion_group!(benches, bench_command_buffer, bench_combo_tracker, bench_simulation);
criterion_main!(benches);
