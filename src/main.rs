//! Headless sparring match: two bots fight until a knockout or time over.
//!
//! Usage: `stickfight [config.json] [replay-out.json]`

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;

use fight_core::ai::{BotProfile, SparringBot};
use fight_core::engine::{
    spawn_fighter, FightEvent, FightPlugin, FightSet, FightSimulation, Fighter, FighterInput,
    GroundContact, SimulationConfig,
};
use fight_core::events::CombatEvent;
use fight_core::logging::LoggingPlugin;
use fight_core::moves::roster;
use fight_core::replay::{
    playback, state_digest, ReplayHeader, ReplayOutcome, ReplayPlugin, ReplayRecorder,
    SpawnRecord,
};

const FLOOR_Y: f32 = 50.0;
const GRAVITY: f32 = -1800.0;
const START_GAP: f32 = 300.0;
const ROUND_SECONDS: u32 = 99;

#[derive(Resource)]
struct Bots(Vec<SparringBot>);

#[derive(Resource)]
struct MatchClock {
    frames: u32,
    limit: u32,
    replay_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            SimulationConfig::from_json(&text)
                .with_context(|| format!("parsing config {path}"))?
        }
        None => SimulationConfig::default(),
    };
    let replay_out = args.next().map(PathBuf::from);

    let tick_rate = config.tick_rate.max(1);
    let frame = Duration::from_secs_f64(1.0 / f64::from(tick_rate));

    let exit = App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(frame)))
        .add_plugins(LoggingPlugin::default())
        .add_plugins(FightPlugin { config })
        .add_plugins(ReplayPlugin)
        .insert_resource(MatchClock {
            frames: 0,
            limit: ROUND_SECONDS * tick_rate,
            replay_out,
        })
        .add_systems(Startup, setup_match)
        .add_systems(Update, bot_input_system.before(FightSet::Sync))
        .add_systems(Update, match_end_system.after(FightSet::Tick))
        .add_systems(Update, integrate_bodies_system.after(FightSet::Apply))
        .run();

    match exit {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => bail!("match exited with code {code}"),
    }
}

fn setup_match(
    mut commands: Commands,
    mut sim: ResMut<FightSimulation>,
    mut recorder: ResMut<ReplayRecorder>,
) {
    let left = Vec2::new(-START_GAP / 2.0, FLOOR_Y);
    let right = Vec2::new(START_GAP / 2.0, FLOOR_Y);
    let alpha = roster::alpha();
    let beta = roster::beta();
    spawn_fighter(&mut commands, &mut sim, &alpha, left, true);
    spawn_fighter(&mut commands, &mut sim, &beta, right, false);

    let ids: Vec<_> = sim.0.actors().iter().map(|a| a.id()).collect();
    let bots = ids
        .iter()
        .enumerate()
        .map(|(i, id)| SparringBot::new(*id, BotProfile::default(), 0x5717_c0de + i as u64))
        .collect();
    commands.insert_resource(Bots(bots));

    let spawns = vec![
        SpawnRecord {
            character: alpha.name.clone(),
            position: left.to_array(),
            facing_right: true,
            dummy: false,
        },
        SpawnRecord {
            character: beta.name.clone(),
            position: right.to_array(),
            facing_right: false,
            dummy: false,
        },
    ];
    recorder.start(ReplayHeader::new("sparring", spawns, sim.0.config().clone()));
    info!(fighters = ids.len(), "sparring match started");
}

fn bot_input_system(
    sim: Res<FightSimulation>,
    mut bots: ResMut<Bots>,
    mut fighters: Query<(&Fighter, &mut FighterInput)>,
) {
    for bot in bots.0.iter_mut() {
        let input = bot.decide(&sim.0);
        for (fighter, mut slot) in &mut fighters {
            if fighter.id == bot.actor() {
                slot.0 = input;
            }
        }
    }
}

/// Stand-in for a rapier world: gravity, a flat floor, no walls.
fn integrate_bodies_system(
    time: Res<Time>,
    sim: Res<FightSimulation>,
    mut bodies: Query<(&Fighter, &mut Transform, &mut Velocity, &mut GroundContact)>,
) {
    let dt = time.delta_secs();
    for (fighter, mut transform, mut velocity, mut ground) in &mut bodies {
        if sim.0.is_frozen(fighter.id) {
            continue;
        }
        velocity.linvel.y += GRAVITY * dt;
        transform.translation += velocity.linvel * dt;
        if transform.translation.y <= FLOOR_Y {
            transform.translation.y = FLOOR_Y;
            velocity.linvel.y = velocity.linvel.y.max(0.0);
            ground.0 = true;
        } else {
            ground.0 = false;
        }
    }
}

fn match_end_system(
    mut clock: ResMut<MatchClock>,
    mut reader: EventReader<FightEvent>,
    sim: Res<FightSimulation>,
    mut recorder: ResMut<ReplayRecorder>,
    mut exit: EventWriter<AppExit>,
) {
    clock.frames += 1;

    let mut outcome = None;
    for FightEvent(event) in reader.read() {
        if let CombatEvent::ActorDefeated { actor, by } = event {
            info!(loser = actor.0, winner = ?by.map(|id| id.0), "knockout");
            outcome = Some(match by {
                Some(winner) => ReplayOutcome::Knockout { winner: *winner },
                None => ReplayOutcome::Abandoned,
            });
        }
    }
    if outcome.is_none() && clock.frames >= clock.limit {
        info!("time over");
        outcome = Some(ReplayOutcome::Abandoned);
    }
    let Some(outcome) = outcome else {
        return;
    };

    for actor in sim.0.actors() {
        info!(fighter = actor.name(), health = actor.health(), meter = actor.meter().value(), "final");
    }

    if let Some(recording) = recorder.stop(state_digest(&sim.0), outcome) {
        match playback(&recording, &roster::roster()) {
            Ok(report) => info!(
                ticks = report.ticks,
                events = report.events,
                matches = report.matches,
                "replay verified"
            ),
            Err(err) => warn!(%err, "replay verification failed"),
        }
        if let Some(path) = &clock.replay_out {
            let written = recording
                .to_json()
                .map_err(anyhow::Error::from)
                .and_then(|json| std::fs::write(path, json).map_err(anyhow::Error::from));
            match written {
                Ok(()) => info!(path = %path.display(), "replay saved"),
                Err(err) => warn!(%err, "could not save replay"),
            }
        }
    }
    exit.send(AppExit::Success);
}
