//! Input replays.
//!
//! A replay stores the match setup and, for every tick, the inputs, the time
//! step and the physics body samples the host pushed in. Because the
//! simulation is deterministic, feeding the same ticks into a fresh
//! [`Simulation`] must reproduce the same final state; the recording carries
//! a digest of that state to check it.
//!
//! Workflow:
//! 1. `ReplayRecorder::start` with the spawn list and config
//! 2. `record` every tick's step and inputs
//! 3. `stop` with the final [`state_digest`] → [`ReplayRecording`]
//! 4. [`playback`] rebuilds the match and compares digests

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use thiserror::Error;
use tracing::{info, warn};

use crate::actor::{Actor, ActorId, BodyState, ControlMode, LifecycleState};
use crate::combat::MovePhase;
use crate::engine::{
    FightSet, FightSimulation, Fighter, FighterInput, Simulation, SimulationConfig, TimeScale,
    TimeStep,
};
use crate::input::InputSnapshot;
use crate::moves::CharacterDefinition;

pub const REPLAY_VERSION: u32 = 1;

/// Records fighter inputs while `ReplayRecorder::recording` is set
pub struct ReplayPlugin;

impl Plugin for ReplayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ReplayRecorder>()
            .add_systems(
                Update,
                record_inputs_system
                    .after(FightSet::Sync)
                    .before(FightSet::Tick),
            );
    }
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("replay references unknown character '{0}'")]
    UnknownCharacter(String),
    #[error("replay integrity hash mismatch")]
    Corrupted,
    #[error("unsupported replay version {0}")]
    UnsupportedVersion(u32),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn finish(hasher: Sha3_256) -> u64 {
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    u64::from_le_bytes(bytes)
}

fn snapshot_bits(input: &InputSnapshot) -> u8 {
    (input.up as u8)
        | (input.down as u8) << 1
        | (input.left as u8) << 2
        | (input.right as u8) << 3
        | (input.light as u8) << 4
        | (input.heavy as u8) << 5
        | (input.special as u8) << 6
}

/// Physics state of one actor as synced before a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySample {
    pub actor: ActorId,
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub grounded: bool,
}

impl BodySample {
    pub fn of(actor: &Actor) -> Self {
        let body = actor.body();
        Self {
            actor: actor.id(),
            position: body.position.to_array(),
            velocity: body.velocity.to_array(),
            grounded: body.grounded,
        }
    }

    pub fn body(&self) -> BodyState {
        BodyState {
            position: Vec2::from_array(self.position),
            velocity: Vec2::from_array(self.velocity),
            grounded: self.grounded,
        }
    }
}

/// One simulation tick worth of input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedTick {
    pub tick: u64,
    pub step: TimeStep,
    pub inputs: Vec<(ActorId, InputSnapshot)>,
    /// Empty when nothing outside the simulation moves the bodies
    #[serde(default)]
    pub bodies: Vec<BodySample>,
}

impl RecordedTick {
    pub fn hash(&self) -> u64 {
        let mut hasher = Sha3_256::new();
        hasher.update(self.tick.to_le_bytes());
        hasher.update(self.step.delta_ms.to_bits().to_le_bytes());
        hasher.update(self.step.scale.to_bits().to_le_bytes());
        for (id, input) in &self.inputs {
            hasher.update(id.0.to_le_bytes());
            hasher.update([snapshot_bits(input)]);
        }
        for sample in &self.bodies {
            hasher.update(sample.actor.0.to_le_bytes());
            for v in sample.position.iter().chain(sample.velocity.iter()) {
                hasher.update(v.to_bits().to_le_bytes());
            }
            hasher.update([sample.grounded as u8]);
        }
        finish(hasher)
    }
}

/// How an actor entered the match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRecord {
    pub character: String,
    pub position: [f32; 2],
    pub facing_right: bool,
    #[serde(default)]
    pub dummy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayOutcome {
    InProgress,
    Knockout { winner: ActorId },
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayHeader {
    pub replay_id: String,
    pub spawns: Vec<SpawnRecord>,
    pub config: SimulationConfig,
    pub duration_ticks: u64,
    pub outcome: ReplayOutcome,
    pub version: u32,
}

impl ReplayHeader {
    pub fn new(replay_id: &str, spawns: Vec<SpawnRecord>, config: SimulationConfig) -> Self {
        Self {
            replay_id: replay_id.to_string(),
            spawns,
            config,
            duration_ticks: 0,
            outcome: ReplayOutcome::InProgress,
            version: REPLAY_VERSION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecording {
    pub header: ReplayHeader,
    pub ticks: Vec<RecordedTick>,
    /// [`state_digest`] of the simulation after the last tick
    pub final_digest: u64,
    pub recording_hash: u64,
}

impl ReplayRecording {
    pub fn new(header: ReplayHeader, ticks: Vec<RecordedTick>, final_digest: u64) -> Self {
        let mut recording = Self {
            header,
            ticks,
            final_digest,
            recording_hash: 0,
        };
        recording.recording_hash = recording.compute_hash();
        recording
    }

    fn compute_hash(&self) -> u64 {
        let mut hasher = Sha3_256::new();
        hasher.update(self.header.version.to_le_bytes());
        for spawn in &self.header.spawns {
            hasher.update(spawn.character.as_bytes());
            hasher.update(spawn.position[0].to_bits().to_le_bytes());
            hasher.update(spawn.position[1].to_bits().to_le_bytes());
            hasher.update([spawn.facing_right as u8, spawn.dummy as u8]);
        }
        for tick in &self.ticks {
            hasher.update(tick.hash().to_le_bytes());
        }
        hasher.update(self.final_digest.to_le_bytes());
        finish(hasher)
    }

    /// Integrity check of the stored data (not a re-simulation)
    pub fn verify(&self) -> bool {
        self.recording_hash == self.compute_hash()
    }

    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let recording: Self = serde_json::from_str(json)?;
        if recording.header.version != REPLAY_VERSION {
            return Err(ReplayError::UnsupportedVersion(recording.header.version));
        }
        Ok(recording)
    }
}

/// Captures ticks as they are played
#[derive(Resource, Debug, Clone, Default)]
pub struct ReplayRecorder {
    pub recording: bool,
    pub header: Option<ReplayHeader>,
    pub ticks: Vec<RecordedTick>,
}

impl ReplayRecorder {
    pub fn start(&mut self, header: ReplayHeader) {
        info!(replay = %header.replay_id, "replay recording started");
        self.recording = true;
        self.header = Some(header);
        self.ticks.clear();
    }

    pub fn record(
        &mut self,
        tick: u64,
        step: TimeStep,
        inputs: &[(ActorId, InputSnapshot)],
        bodies: Vec<BodySample>,
    ) {
        if !self.recording {
            return;
        }
        self.ticks.push(RecordedTick {
            tick,
            step,
            inputs: inputs.to_vec(),
            bodies,
        });
    }

    pub fn stop(&mut self, final_digest: u64, outcome: ReplayOutcome) -> Option<ReplayRecording> {
        if !self.recording {
            return None;
        }
        self.recording = false;
        let mut header = self.header.take()?;
        header.duration_ticks = self.ticks.len() as u64;
        header.outcome = outcome;
        info!(replay = %header.replay_id, ticks = header.duration_ticks, "replay recording stopped");
        Some(ReplayRecording::new(
            header,
            std::mem::take(&mut self.ticks),
            final_digest,
        ))
    }

    pub fn cancel(&mut self) {
        self.recording = false;
        self.header = None;
        self.ticks.clear();
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }
}

fn record_inputs_system(
    time: Res<Time>,
    scale: Res<TimeScale>,
    sim: Res<FightSimulation>,
    fighters: Query<(&Fighter, &FighterInput)>,
    mut recorder: ResMut<ReplayRecorder>,
) {
    if !recorder.recording {
        return;
    }
    let inputs: Vec<(ActorId, InputSnapshot)> =
        fighters.iter().map(|(f, input)| (f.id, input.0)).collect();
    let step = TimeStep::from_secs(time.delta_secs()).with_scale(scale.0);
    let bodies = sim.0.actors().iter().map(BodySample::of).collect();
    recorder.record(sim.0.tick_count() + 1, step, &inputs, bodies);
}

/// Hash of everything observable about a simulation's combat state.
pub fn state_digest(sim: &Simulation) -> u64 {
    let mut hasher = Sha3_256::new();
    hasher.update(sim.tick_count().to_le_bytes());
    for actor in sim.actors() {
        hasher.update(actor.id().0.to_le_bytes());
        hasher.update(actor.health().to_le_bytes());
        hasher.update(actor.meter().value().to_le_bytes());
        hasher.update([
            state_code(actor.state()),
            actor.facing_right() as u8,
            actor.is_defeated() as u8,
        ]);
        if let Some(current) = actor.current_move() {
            hasher.update(current.def.id.as_bytes());
            hasher.update(current.elapsed_ms.to_bits().to_le_bytes());
        }
        hasher.update(actor.stun_remaining_ms().to_bits().to_le_bytes());
        let intent = actor.intent();
        for axis in [intent.x, intent.y] {
            match axis {
                Some(v) => hasher.update(v.to_bits().to_le_bytes()),
                None => hasher.update([0xff]),
            }
        }
        hasher.update(sim.combo_count(actor.id()).to_le_bytes());
    }
    hasher.update((sim.windows().count() as u64).to_le_bytes());
    for projectile in sim.projectiles() {
        hasher.update(projectile.position.x.to_bits().to_le_bytes());
    }
    finish(hasher)
}

fn state_code(state: LifecycleState) -> u8 {
    match state {
        LifecycleState::Idle => 0,
        LifecycleState::Moving => 1,
        LifecycleState::Attacking(MovePhase::Startup) => 2,
        LifecycleState::Attacking(MovePhase::Active) => 3,
        LifecycleState::Attacking(MovePhase::Recovery) => 4,
        LifecycleState::Hitstun => 5,
        LifecycleState::Inactive => 6,
    }
}

/// Build the simulation a replay starts from.
pub fn setup_simulation(
    header: &ReplayHeader,
    roster: &[CharacterDefinition],
) -> Result<Simulation, ReplayError> {
    let mut sim = Simulation::new(header.config.clone());
    for spawn in &header.spawns {
        let def = roster
            .iter()
            .find(|c| c.name == spawn.character)
            .ok_or_else(|| ReplayError::UnknownCharacter(spawn.character.clone()))?;
        let id = sim.spawn_actor(def, Vec2::from_array(spawn.position), spawn.facing_right);
        if spawn.dummy {
            sim.set_control_mode(id, ControlMode::Dummy);
        }
    }
    Ok(sim)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackReport {
    pub ticks: u64,
    pub events: usize,
    pub final_digest: u64,
    pub matches: bool,
}

/// Re-simulate a recording from scratch and compare the final state.
pub fn playback(
    recording: &ReplayRecording,
    roster: &[CharacterDefinition],
) -> Result<PlaybackReport, ReplayError> {
    if !recording.verify() {
        return Err(ReplayError::Corrupted);
    }
    let mut sim = setup_simulation(&recording.header, roster)?;
    let mut events = 0;
    for tick in &recording.ticks {
        for sample in &tick.bodies {
            sim.sync_body(sample.actor, sample.body());
        }
        events += sim.tick(tick.step, &tick.inputs).len();
    }
    let final_digest = state_digest(&sim);
    let matches = final_digest == recording.final_digest;
    if !matches {
        warn!(
            replay = %recording.header.replay_id,
            expected = recording.final_digest,
            actual = final_digest,
            "replay diverged"
        );
    }
    Ok(PlaybackReport {
        ticks: sim.tick_count(),
        events,
        final_digest,
        matches,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Finished,
}

/// Steps through a recording one tick at a time for a viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayPlayback {
    pub state: PlaybackState,
    pub cursor: usize,
    pub total_ticks: usize,
    pub speed: f32,
}

impl ReplayPlayback {
    pub fn new(recording: &ReplayRecording) -> Self {
        Self {
            state: PlaybackState::Idle,
            cursor: 0,
            total_ticks: recording.ticks.len(),
            speed: 1.0,
        }
    }

    pub fn play(&mut self) {
        if self.state != PlaybackState::Finished {
            self.state = PlaybackState::Playing;
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Idle;
        self.cursor = 0;
    }

    /// Viewer speed; becomes the time scale of the recorded steps
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.clamp(0.1, 4.0);
    }

    pub fn progress(&self) -> f32 {
        if self.total_ticks == 0 {
            return 0.0;
        }
        (self.cursor as f32 / self.total_ticks as f32).clamp(0.0, 1.0)
    }

    pub fn advance<'a>(&mut self, recording: &'a ReplayRecording) -> Option<&'a RecordedTick> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        let tick = recording.ticks.get(self.cursor)?;
        self.cursor += 1;
        if self.cursor >= recording.ticks.len() {
            self.state = PlaybackState::Finished;
        }
        Some(tick)
    }
}
