use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;

use crate::actor::{ActorId, BodyState};
use crate::events::CombatEvent;
use crate::input::InputSnapshot;
use crate::logging::log_event;
use crate::moves::CharacterDefinition;

use super::config::SimulationConfig;
use super::simulation::{Simulation, TimeStep};

/// Runs the fight simulation inside a Bevy app.
///
/// Each `Update`: physics state is copied into the simulation, one tick runs,
/// then velocity intents are written into rapier `Velocity` components.
#[derive(Default)]
pub struct FightPlugin {
    pub config: SimulationConfig,
}

impl Plugin for FightPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(FightSimulation(Simulation::new(self.config.clone())))
            .init_resource::<TimeScale>()
            .add_event::<FightEvent>()
            .configure_sets(
                Update,
                (FightSet::Sync, FightSet::Tick, FightSet::Apply).chain(),
            )
            .add_systems(Update, sync_bodies_system.in_set(FightSet::Sync))
            .add_systems(Update, fight_tick_system.in_set(FightSet::Tick))
            .add_systems(Update, apply_intents_system.in_set(FightSet::Apply));
    }
}

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FightSet {
    Sync,
    Tick,
    Apply,
}

#[derive(Resource)]
pub struct FightSimulation(pub Simulation);

/// Slow-motion factor applied to the fight delta (hitstop ignores it)
#[derive(Resource, Debug, Clone, Copy)]
pub struct TimeScale(pub f32);

impl Default for TimeScale {
    fn default() -> Self {
        Self(1.0)
    }
}

#[derive(Event, Debug, Clone)]
pub struct FightEvent(pub CombatEvent);

/// Links an entity to its actor in the simulation
#[derive(Component, Debug, Clone, Copy)]
pub struct Fighter {
    pub id: ActorId,
}

/// Input for the next tick. Button flags are consumed by the tick.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct FighterInput(pub InputSnapshot);

/// Written by the host's ground detection
#[derive(Component, Debug, Clone, Copy)]
pub struct GroundContact(pub bool);

impl Default for GroundContact {
    fn default() -> Self {
        Self(true)
    }
}

/// Register a character with the simulation and spawn its entity.
pub fn spawn_fighter(
    commands: &mut Commands,
    sim: &mut FightSimulation,
    def: &CharacterDefinition,
    position: Vec2,
    facing_right: bool,
) -> Entity {
    let id = sim.0.spawn_actor(def, position, facing_right);
    commands
        .spawn((
            Name::new(def.name.clone()),
            Fighter { id },
            FighterInput::default(),
            GroundContact::default(),
            Transform::from_xyz(position.x, position.y, 0.0),
            Velocity::zero(),
        ))
        .id()
}

fn sync_bodies_system(
    mut sim: ResMut<FightSimulation>,
    fighters: Query<(&Fighter, &Transform, Option<&Velocity>, Option<&GroundContact>)>,
) {
    for (fighter, transform, velocity, ground) in &fighters {
        let Some(actor) = sim.0.actor(fighter.id) else {
            continue;
        };
        let body = BodyState {
            position: transform.translation.truncate(),
            velocity: velocity
                .map(|v| v.linvel.truncate())
                .unwrap_or(actor.body().velocity),
            grounded: ground.map_or(actor.body().grounded, |g| g.0),
        };
        sim.0.sync_body(fighter.id, body);
    }
}

fn fight_tick_system(
    time: Res<Time>,
    scale: Res<TimeScale>,
    mut sim: ResMut<FightSimulation>,
    mut fighters: Query<(&Fighter, &mut FighterInput)>,
    mut events: EventWriter<FightEvent>,
) {
    let inputs: Vec<(ActorId, InputSnapshot)> =
        fighters.iter().map(|(f, input)| (f.id, input.0)).collect();

    let step = TimeStep::from_secs(time.delta_secs()).with_scale(scale.0);
    for event in sim.0.tick(step, &inputs) {
        log_event(&event);
        events.send(FightEvent(event));
    }

    for (_, mut input) in &mut fighters {
        input.0.light = false;
        input.0.heavy = false;
        input.0.special = false;
    }
}

fn apply_intents_system(sim: Res<FightSimulation>, mut fighters: Query<(&Fighter, &mut Velocity)>) {
    for (fighter, mut velocity) in &mut fighters {
        let Some(actor) = sim.0.actor(fighter.id) else {
            continue;
        };
        let intent = actor.intent();
        if let Some(x) = intent.x {
            velocity.linvel.x = x;
        }
        if let Some(y) = intent.y {
            velocity.linvel.y = y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::LifecycleState;
    use crate::moves::roster;

    fn app_with_fighter() -> (App, Entity, ActorId) {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(FightPlugin::default());

        let world = app.world_mut();
        let id = world
            .resource_mut::<FightSimulation>()
            .0
            .spawn_actor(&roster::alpha(), Vec2::ZERO, true);
        let entity = world
            .spawn((
                Fighter { id },
                FighterInput::default(),
                GroundContact(true),
                Transform::default(),
                Velocity::zero(),
            ))
            .id();
        (app, entity, id)
    }

    #[test]
    fn test_walk_intent_written_to_velocity() {
        let (mut app, entity, _) = app_with_fighter();
        app.world_mut().get_mut::<FighterInput>(entity).unwrap().0.right = true;
        app.update();
        let velocity = app.world().get::<Velocity>(entity).unwrap();
        assert_eq!(velocity.linvel.x, 300.0);
    }

    #[test]
    fn test_button_edges_consumed() {
        let (mut app, entity, id) = app_with_fighter();
        app.world_mut().get_mut::<FighterInput>(entity).unwrap().0.light = true;
        app.update();

        let sim = app.world().resource::<FightSimulation>();
        assert_eq!(sim.0.actor(id).unwrap().current_move_id(), Some("light"));
        assert!(matches!(
            sim.0.actor(id).unwrap().state(),
            LifecycleState::Attacking(_)
        ));
        assert!(!app.world().get::<FighterInput>(entity).unwrap().0.light);
    }

    #[test]
    fn test_time_scale_resource_default() {
        let (app, _, _) = app_with_fighter();
        assert_eq!(app.world().resource::<TimeScale>().0, 1.0);
    }
}
