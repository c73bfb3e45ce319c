use std::{fmt, time::Duration};

use anyhow::{Context, Result};
use glam::Vec2;
use portal_runner_core::{Command, Event, PlayerSnapshot, PortalSnapshot, KEYS_TO_ACTIVATE};
use portal_runner_system_cloning::Cloning;
use portal_runner_system_population::{Config, PopulationManager};
use portal_runner_world::{self as world, query, World};
use tracing::{debug, info};

use crate::{level_config::LevelConfig, placement::ScatterPlacement};

const PLAYER_SPEED: f32 = 220.0;
const PICKUP_RADIUS: f32 = 24.0;
const INTERACT_RADIUS: f32 = 40.0;
const CONTACT_RADIUS: f32 = 20.0;
const STRIKE_COOLDOWN: Duration = Duration::from_millis(250);

/// Headless play session driving the world with a simple key-hunting bot.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    cloning: Cloning,
    population: PopulationManager<LevelConfig, ScatterPlacement>,
    player: Vec2,
    carried_keys: u32,
    strike_ready_in: Duration,
    summary: Summary,
}

impl Session {
    /// Builds the scene described by the level and requests the starting roster.
    pub(crate) fn new(level: LevelConfig, seed: u64) -> Result<Self> {
        let mut world = World::new();
        let mut events = Vec::new();
        for command in level.scene_commands() {
            world::apply(&mut world, command, &mut events);
        }

        let player = level.arena * 0.5;
        let placement = ScatterPlacement::new(seed, level.arena);
        let mut population = PopulationManager::new(Config::new(seed), level, placement);
        population
            .setup_periodic_events()
            .context("failed to register periodic spawners")?;

        let mut session = Self {
            world,
            cloning: Cloning::new(),
            population,
            player,
            carried_keys: 0,
            strike_ready_in: Duration::ZERO,
            summary: Summary::default(),
        };
        session.record(&events);

        let mut commands = Vec::new();
        let spawned = session
            .population
            .spawn_initial_enemies(session.player, &mut commands);
        info!(spawned, "requested initial roster");
        session.dispatch(commands);
        Ok(session)
    }

    /// Advances the simulation by one frame.
    pub(crate) fn step(&mut self, dt: Duration) {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);
        self.record(&events);

        let mut commands = Vec::new();
        self.cloning.handle(&events, &mut commands);
        self.population.handle(
            &events,
            query::scene_active(&self.world),
            self.player,
            &mut commands,
        );
        self.dispatch(commands);

        self.steer(dt);

        let roster = query::roster(&self.world);
        let mut commands = Vec::new();
        self.population
            .update(&roster, PlayerSnapshot::at(self.player), dt, &mut commands);
        self.dispatch(commands);

        let roster = query::roster(&self.world);
        let mut commands = Vec::new();
        let evicted = self.population.control_max_enemies(&roster, &mut commands);
        if evicted > 0 {
            debug!(evicted, "population cap reached");
        }
        self.dispatch(commands);

        self.handle_pickups();
        self.handle_contacts(dt);

        let live = query::roster(&self.world).len();
        self.summary.peak_population = self.summary.peak_population.max(live);
        self.summary.frames = self.summary.frames.saturating_add(1);
        self.summary.elapsed = query::clock(&self.world);
    }

    /// Tears the scene down and reports what happened.
    pub(crate) fn finish(mut self) -> Summary {
        self.summary.escaped = query::portals(&self.world).iter().any(|portal| {
            portal.is_open() && query::enter_portal(&self.world, portal.id) == Some(true)
        });

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::TearDownScene, &mut events);
        self.record(&events);

        let mut commands = Vec::new();
        self.cloning.handle(&events, &mut commands);
        self.population.handle(
            &events,
            query::scene_active(&self.world),
            self.player,
            &mut commands,
        );
        self.dispatch(commands);

        self.summary
    }

    /// Applies commands and feeds the resulting events back to the cloning
    /// system until no further work is produced.
    fn dispatch(&mut self, mut commands: Vec<Command>) {
        while !commands.is_empty() {
            let mut events = Vec::new();
            for command in commands.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            self.record(&events);
            self.cloning.handle(&events, &mut commands);
        }
    }

    fn target_portal(&self) -> Option<PortalSnapshot> {
        query::portals(&self.world).into_iter().find(|portal| {
            portal.config.correct
                && !portal.is_open()
                && !portal.activation_pending
                && portal.stored_keys < KEYS_TO_ACTIVATE
        })
    }

    fn steer(&mut self, dt: Duration) {
        let target = if self.carried_keys > 0 {
            self.target_portal().map(|portal| portal.position)
        } else {
            query::keys(&self.world)
                .iter()
                .map(|key| key.position)
                .min_by(|a, b| a.distance(self.player).total_cmp(&b.distance(self.player)))
        };

        let Some(target) = target else {
            return;
        };

        let offset = target - self.player;
        let reach = PLAYER_SPEED * dt.as_secs_f32();
        self.player = if offset.length() <= reach {
            target
        } else {
            self.player + offset.normalize_or_zero() * reach
        };
    }

    fn handle_pickups(&mut self) {
        let mut commands: Vec<Command> = query::keys(&self.world)
            .iter()
            .filter(|key| key.position.distance(self.player) <= PICKUP_RADIUS)
            .map(|key| Command::CollectKey { key: key.id })
            .collect();

        if self.carried_keys > 0 {
            if let Some(portal) = self
                .target_portal()
                .filter(|portal| portal.position.distance(self.player) <= INTERACT_RADIUS)
            {
                commands.push(Command::BeginInteraction { portal: portal.id });
                commands.push(Command::DepositKey { portal: portal.id });
                self.carried_keys -= 1;
            }
        }

        self.dispatch(commands);
    }

    fn handle_contacts(&mut self, dt: Duration) {
        self.strike_ready_in = self.strike_ready_in.saturating_sub(dt);
        if !self.strike_ready_in.is_zero() {
            return;
        }

        let roster = query::roster(&self.world);
        let mut commands = Vec::new();
        for actor in roster
            .iter()
            .filter(|actor| actor.position.distance(self.player) <= CONTACT_RADIUS)
        {
            self.summary.damage_taken = self
                .summary
                .damage_taken
                .saturating_add(actor.stats.damage);
            commands.push(Command::DamageActor {
                actor: actor.id,
                amount: 1,
            });
        }

        if !commands.is_empty() {
            self.strike_ready_in = STRIKE_COOLDOWN;
            self.dispatch(commands);
        }
    }

    fn record(&mut self, events: &[Event]) {
        let summary = &mut self.summary;
        for event in events {
            match event {
                Event::ActorSpawned { lineage, .. } => {
                    summary.spawned += 1;
                    if lineage.is_clone() {
                        summary.clones += 1;
                    }
                }
                Event::ActorKilled { .. } => summary.killed += 1,
                Event::ActorEvicted { .. } => summary.evicted += 1,
                Event::ActorExpired { .. } => summary.expired += 1,
                Event::ActorDespawned { .. } => summary.despawned += 1,
                Event::KeySpawned { .. } => summary.keys_spawned += 1,
                Event::KeyCollected { .. } => {
                    summary.keys_collected += 1;
                    self.carried_keys += 1;
                }
                Event::KeyDeposited { .. } => summary.keys_deposited += 1,
                Event::KeyDepositIgnored { .. } => summary.deposits_ignored += 1,
                Event::PortalActivated { portal } => {
                    summary.portals_activated += 1;
                    info!(portal = portal.get(), "portal activated");
                }
                Event::AnimationCompleted {
                    portal, animation, ..
                } => {
                    summary.animations_completed += 1;
                    debug!(portal = portal.get(), %animation, "animation completed");
                }
                _ => {}
            }
        }
    }
}

/// Totals gathered over a session.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Summary {
    pub(crate) frames: u32,
    pub(crate) elapsed: Duration,
    pub(crate) spawned: u32,
    pub(crate) clones: u32,
    pub(crate) peak_population: usize,
    pub(crate) killed: u32,
    pub(crate) evicted: u32,
    pub(crate) expired: u32,
    pub(crate) despawned: u32,
    pub(crate) keys_spawned: u32,
    pub(crate) keys_collected: u32,
    pub(crate) keys_deposited: u32,
    pub(crate) deposits_ignored: u32,
    pub(crate) portals_activated: u32,
    pub(crate) animations_completed: u32,
    pub(crate) damage_taken: u32,
    pub(crate) escaped: bool,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "simulated {} frames ({:.1}s)",
            self.frames,
            self.elapsed.as_secs_f32()
        )?;
        writeln!(
            f,
            "actors spawned: {} ({} clones), peak population {}",
            self.spawned, self.clones, self.peak_population
        )?;
        writeln!(
            f,
            "actors removed: {} killed, {} evicted, {} expired, {} despawned",
            self.killed, self.evicted, self.expired, self.despawned
        )?;
        writeln!(
            f,
            "keys: {} spawned, {} collected, {} deposited, {} ignored",
            self.keys_spawned, self.keys_collected, self.keys_deposited, self.deposits_ignored
        )?;
        writeln!(
            f,
            "portals activated: {}, animations completed: {}",
            self.portals_activated, self.animations_completed
        )?;
        writeln!(f, "damage taken: {}", self.damage_taken)?;
        if self.escaped {
            write!(f, "outcome: escaped through the correct portal")
        } else {
            write!(f, "outcome: still searching")
        }
    }
}
