#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Portal Runner.

mod actors;
mod portals;

use std::time::Duration;

use glam::Vec2;
use portal_runner_core::{
    ActorId, Command, Event, KeyId, KeyPickup, PortalConfig, PortalId, PortalState, SoundCue,
    TextureMode, BLINK_DURATION,
};
use portal_runner_system_activation::{ActivationStateMachine, DepositOutcome, Transition};
use portal_runner_system_animation::AnimationClock;
use tracing::debug;

use crate::{
    actors::{Actor, Groupings},
    portals::{AnimatedSprite, AnimationLibrary, Portal, SpriteRegistry},
};

const DEFAULT_ARENA_WIDTH: f32 = 1_280.0;
const DEFAULT_ARENA_HEIGHT: f32 = 720.0;
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Represents the authoritative Portal Runner world state.
#[derive(Debug)]
pub struct World {
    now: Duration,
    scene_active: bool,
    arena: Vec2,
    settle_delay: Duration,
    groupings: Option<Groupings>,
    next_actor_id: u32,
    portals: Vec<Portal>,
    next_portal_id: u32,
    sprites: SpriteRegistry,
    animations: AnimationLibrary,
    animation_clock: AnimationClock,
    keys: Vec<KeyPickup>,
    next_key_id: u32,
}

impl World {
    /// Creates a new world with an active, empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            scene_active: true,
            arena: Vec2::new(DEFAULT_ARENA_WIDTH, DEFAULT_ARENA_HEIGHT),
            settle_delay: DEFAULT_SETTLE_DELAY,
            groupings: Some(Groupings::default()),
            next_actor_id: 0,
            portals: Vec::new(),
            next_portal_id: 0,
            sprites: SpriteRegistry::default(),
            animations: AnimationLibrary::with_portal_defaults(),
            animation_clock: AnimationClock::new(),
            keys: Vec::new(),
            next_key_id: 0,
        }
    }

    fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.groupings.as_mut()?.get_mut(id)
    }

    fn portal_mut(&mut self, id: PortalId) -> Option<&mut Portal> {
        self.portals.iter_mut().find(|portal| portal.id == id)
    }

    fn spawn_portal(&mut self, config: PortalConfig, position: Vec2) -> PortalId {
        let id = PortalId::new(self.next_portal_id);
        self.next_portal_id = self.next_portal_id.saturating_add(1);

        if config.texture == TextureMode::Animated {
            self.sprites.register(
                id,
                AnimatedSprite::new(PortalState::Base.animation_key()),
            );
        }

        self.portals.push(Portal {
            id,
            position,
            config,
            activation: ActivationStateMachine::new(self.settle_delay),
        });
        id
    }

    fn announce_transition(
        &mut self,
        portal: PortalId,
        transition: Transition,
        out_events: &mut Vec<Event>,
    ) {
        self.sprites.sync_state(portal, transition.to);
        out_events.push(Event::PortalStateChanged {
            portal,
            from: transition.from,
            to: transition.to,
        });
        if transition.to == PortalState::Activated {
            out_events.push(Event::PortalActivated { portal });
        }
    }

    fn advance_portals(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let transitions: Vec<(PortalId, Transition)> = self
            .portals
            .iter_mut()
            .filter_map(|portal| portal.activation.advance(dt).map(|t| (portal.id, t)))
            .collect();

        for (portal, transition) in transitions {
            self.announce_transition(portal, transition, out_events);
        }
    }

    fn advance_sprites(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Self {
            sprites,
            animations,
            animation_clock,
            ..
        } = self;

        for (portal, sprite) in sprites.iter_mut() {
            let Some(outcome) = animation_clock.advance(
                &mut sprite.clock,
                animations.get(&sprite.animation),
                sprite.playing,
                dt,
            ) else {
                continue;
            };

            sprite.displayed_frame = outcome.displayed_frame;
            if let Some(completion) = outcome.completion {
                sprite.playing = false;
                out_events.push(Event::AnimationCompleted {
                    portal: *portal,
                    animation: completion.animation,
                    frame: completion.frame,
                });
            }
        }
    }

    fn start_dying(actor: ActorId, out_events: &mut Vec<Event>) {
        out_events.push(Event::DeathAnimationStarted { actor });
        out_events.push(Event::SoundCue {
            cue: SoundCue::Death,
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureScene {
            width,
            height,
            settle_delay,
        } => {
            world.arena = Vec2::new(width.max(0.0), height.max(0.0));
            world.settle_delay = settle_delay;
            for portal in &mut world.portals {
                portal.activation.set_settle_delay(settle_delay);
            }
            world.scene_active = true;
            if world.groupings.is_none() {
                world.groupings = Some(Groupings::default());
            }
        }
        Command::Tick { dt } => {
            world.now = world.now.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt, now: world.now });

            if let Some(groupings) = world.groupings.as_mut() {
                for actor in groupings.reap(dt) {
                    out_events.push(Event::ActorDespawned { actor });
                }
            }

            world.advance_portals(dt, out_events);
            world.advance_sprites(dt, out_events);
        }
        Command::SpawnActor { blueprint } => {
            let blink = blueprint.blink;
            let next_id = ActorId::new(world.next_actor_id);
            let Some(groupings) = world.groupings.as_mut() else {
                debug!(kind = %blueprint.kind, "dropping spawn into torn-down scene");
                return;
            };

            world.next_actor_id = world.next_actor_id.saturating_add(1);
            let actor = Actor::from_blueprint(next_id, blueprint);
            out_events.push(Event::ActorSpawned {
                actor: actor.id,
                kind: actor.kind,
                lineage: actor.lineage,
                position: actor.position,
            });
            groupings.insert(actor);

            if blink {
                out_events.push(Event::BlinkStarted {
                    actor: next_id,
                    duration: BLINK_DURATION,
                });
            }
            out_events.push(Event::SoundCue {
                cue: SoundCue::Spawn,
            });
        }
        Command::UpdateActor { actor, player, dt } => {
            let now = world.now;
            let arena = world.arena;
            let Some(target) = world.actor_mut(actor) else {
                debug!(%actor, "ignoring update for missing actor");
                return;
            };

            let outcome = target.update(player, dt, now, arena);
            let parent = outcome.clone_requested.then(|| target.snapshot());

            if outcome.expired {
                out_events.push(Event::ActorExpired { actor });
                World::start_dying(actor, out_events);
            }
            if let Some(parent) = parent {
                out_events.push(Event::CloneRequested { parent });
            }
        }
        Command::DamageActor { actor, amount } => {
            let Some(target) = world.actor_mut(actor) else {
                debug!(%actor, "ignoring damage for missing actor");
                return;
            };

            if target.take_damage(amount) {
                out_events.push(Event::ActorKilled { actor });
                World::start_dying(actor, out_events);
            }
        }
        Command::EvictActor { actor } => {
            let Some(target) = world.actor_mut(actor) else {
                debug!(%actor, "ignoring eviction for missing actor");
                return;
            };

            if target.begin_dying() {
                out_events.push(Event::ActorEvicted {
                    actor,
                    spawn_time: target.spawn_time,
                });
                World::start_dying(actor, out_events);
            }
        }
        Command::SpawnPortal { config, position } => {
            let portal = world.spawn_portal(config, position);
            out_events.push(Event::PortalSpawned { portal, position });
        }
        Command::RemovePortal { portal } => {
            let before = world.portals.len();
            world.portals.retain(|candidate| candidate.id != portal);
            if world.portals.len() != before {
                world.sprites.unregister(portal);
                out_events.push(Event::PortalRemoved { portal });
            }
        }
        Command::BeginInteraction { portal } => {
            let transition = world
                .portal_mut(portal)
                .and_then(|target| target.activation.begin_interaction());
            if let Some(transition) = transition {
                world.announce_transition(portal, transition, out_events);
            }
        }
        Command::EndInteraction { portal } => {
            let transition = world
                .portal_mut(portal)
                .and_then(|target| target.activation.end_interaction());
            if let Some(transition) = transition {
                world.announce_transition(portal, transition, out_events);
            }
        }
        Command::DepositKey { portal } => {
            let Some(target) = world.portal_mut(portal) else {
                debug!(portal = portal.get(), "ignoring key for missing portal");
                return;
            };

            match target.activation.deposit_key() {
                DepositOutcome::Ignored => {
                    out_events.push(Event::KeyDepositIgnored { portal });
                }
                DepositOutcome::Stored {
                    stored_keys,
                    transition,
                    ..
                } => {
                    out_events.push(Event::KeyDeposited {
                        portal,
                        stored_keys,
                    });
                    if let Some(transition) = transition {
                        world.announce_transition(portal, transition, out_events);
                    }
                }
            }
        }
        Command::RegisterAnimation { descriptor } => {
            world.sprites.restart(&descriptor.key);
            world.animations.insert(descriptor);
        }
        Command::SpawnKey { position } => {
            if !world.scene_active {
                return;
            }

            let key = KeyId::new(world.next_key_id);
            world.next_key_id = world.next_key_id.saturating_add(1);
            world.keys.push(KeyPickup { id: key, position });
            out_events.push(Event::KeySpawned { key, position });
        }
        Command::CollectKey { key } => {
            if let Some(index) = world.keys.iter().position(|pickup| pickup.id == key) {
                let _ = world.keys.remove(index);
                out_events.push(Event::KeyCollected { key });
            }
        }
        Command::TearDownScene => {
            if !world.scene_active {
                return;
            }

            world.scene_active = false;
            world.groupings = None;
            world.keys.clear();
            out_events.push(Event::SceneTornDown);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::Vec2;
    use portal_runner_core::{
        ActorId, ActorSnapshot, AnimationDescriptor, KeyPickup, PortalId, PortalSnapshot,
        PortalState, RosterView,
    };

    use super::World;

    /// Monotonic simulation clock reading.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.now
    }

    /// Reports whether the scene still accepts periodic work.
    #[must_use]
    pub fn scene_active(world: &World) -> bool {
        world.scene_active
    }

    /// Dimensions of the playable arena.
    #[must_use]
    pub fn arena(world: &World) -> Vec2 {
        world.arena
    }

    /// Rebuilds the roster of live actors from both groupings.
    ///
    /// Dying actors are excluded and a torn-down scene yields an empty roster.
    #[must_use]
    pub fn roster(world: &World) -> RosterView {
        let Some(groupings) = world.groupings.as_ref() else {
            return RosterView::default();
        };

        RosterView::from_snapshots(
            groupings
                .iter()
                .filter(|actor| actor.is_alive())
                .map(|actor| actor.snapshot())
                .collect(),
        )
    }

    /// Captures the state of a single actor, live or dying.
    #[must_use]
    pub fn actor(world: &World, actor: ActorId) -> Option<ActorSnapshot> {
        world
            .groupings
            .as_ref()?
            .iter()
            .find(|candidate| candidate.id == actor)
            .map(|candidate| candidate.snapshot())
    }

    /// Number of actors held by the groupings, dying ones included.
    #[must_use]
    pub fn grouped_actor_count(world: &World) -> usize {
        world
            .groupings
            .as_ref()
            .map_or(0, |groupings| groupings.iter().count())
    }

    /// Captures the state of a single portal.
    #[must_use]
    pub fn portal(world: &World, portal: PortalId) -> Option<PortalSnapshot> {
        world
            .portals
            .iter()
            .find(|candidate| candidate.id == portal)
            .map(|candidate| candidate.snapshot(world.sprites.get(candidate.id)))
    }

    /// Captures every portal in creation order.
    #[must_use]
    pub fn portals(world: &World) -> Vec<PortalSnapshot> {
        world
            .portals
            .iter()
            .map(|portal| portal.snapshot(world.sprites.get(portal.id)))
            .collect()
    }

    /// Activation state of a portal.
    #[must_use]
    pub fn portal_state(world: &World, portal: PortalId) -> Option<PortalState> {
        world
            .portals
            .iter()
            .find(|candidate| candidate.id == portal)
            .map(|candidate| candidate.activation.state())
    }

    /// Result of the player entering a portal: its correctness flag.
    #[must_use]
    pub fn enter_portal(world: &World, portal: PortalId) -> Option<bool> {
        world
            .portals
            .iter()
            .find(|candidate| candidate.id == portal)
            .map(|candidate| candidate.config.correct)
    }

    /// Key pickups waiting to be collected.
    #[must_use]
    pub fn keys(world: &World) -> &[KeyPickup] {
        &world.keys
    }

    /// Looks up a registered animation.
    #[must_use]
    pub fn animation<'a>(world: &'a World, key: &str) -> Option<&'a AnimationDescriptor> {
        world.animations.get(key)
    }
}
