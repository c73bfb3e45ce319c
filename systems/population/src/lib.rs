#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Population management: spawn orchestration and cap enforcement.
//!
//! The [`PopulationManager`] owns its collaborators explicitly: a
//! [`ConfigCache`] over the level's [`ConfigSource`] and a [`Placement`]
//! service. Each frame the host applies the manager's update commands to the
//! world, rebuilds the roster, and then lets the manager enforce the cap, so
//! updates always precede eviction.

mod config;
mod controller;
mod orchestrator;

use std::time::Duration;

use glam::Vec2;
use portal_runner_core::{Command, ConfigError, Event, PlayerSnapshot, RosterView};
use tracing::warn;

pub use crate::{
    config::{ConfigCache, ConfigSource},
    controller::PopulationController,
    orchestrator::{Config, Placement, RepeatingTimer, SpawnOrchestrator},
};

/// Spawn orchestrator and population controller wired to their collaborators.
#[derive(Debug)]
pub struct PopulationManager<S, P> {
    cache: ConfigCache<S>,
    placement: P,
    orchestrator: SpawnOrchestrator,
    controller: PopulationController,
}

impl<S: ConfigSource, P: Placement> PopulationManager<S, P> {
    /// Creates a manager over the provided configuration source and placement
    /// service.
    #[must_use]
    pub fn new(config: Config, source: S, placement: P) -> Self {
        Self {
            cache: ConfigCache::new(source),
            placement,
            orchestrator: SpawnOrchestrator::new(config),
            controller: PopulationController::new(),
        }
    }

    /// Requests the starting roster. Configuration failures are logged and
    /// nothing is spawned.
    pub fn spawn_initial_enemies(&mut self, reference: Vec2, out: &mut Vec<Command>) -> usize {
        match self.orchestrator.spawn_initial_enemies(
            &mut self.cache,
            &mut self.placement,
            reference,
            out,
        ) {
            Ok(spawned) => spawned,
            Err(error) => {
                warn!(%error, "skipping initial enemy spawn");
                0
            }
        }
    }

    /// Registers the repeating enemy and item timers.
    pub fn setup_periodic_events(&mut self) -> Result<(), ConfigError> {
        self.orchestrator.setup_periodic_events(&mut self.cache)
    }

    /// Runs the periodic timers against the latest world events.
    pub fn handle(
        &mut self,
        events: &[Event],
        scene_active: bool,
        reference: Vec2,
        out: &mut Vec<Command>,
    ) {
        self.orchestrator.handle(
            events,
            scene_active,
            &mut self.cache,
            &mut self.placement,
            reference,
            out,
        );
    }

    /// Emits per-frame updates for every live actor.
    pub fn update(
        &self,
        roster: &RosterView,
        player: PlayerSnapshot,
        dt: Duration,
        out: &mut Vec<Command>,
    ) {
        self.controller.update(roster, player, dt, out);
    }

    /// Evicts the oldest surplus actors from a freshly rebuilt roster.
    pub fn control_max_enemies(&mut self, roster: &RosterView, out: &mut Vec<Command>) -> usize {
        self.controller
            .control_max_enemies(roster, &mut self.cache, out)
    }

    /// Drops cached configuration so the next frame re-reads the source.
    pub fn invalidate_config(&mut self) {
        self.cache.invalidate();
    }

    /// Provides access to the configuration cache.
    #[must_use]
    pub const fn cache(&self) -> &ConfigCache<S> {
        &self.cache
    }

    /// Provides mutable access to the configuration cache.
    pub fn cache_mut(&mut self) -> &mut ConfigCache<S> {
        &mut self.cache
    }

    /// Provides access to the spawn orchestrator.
    #[must_use]
    pub const fn orchestrator(&self) -> &SpawnOrchestrator {
        &self.orchestrator
    }
}
