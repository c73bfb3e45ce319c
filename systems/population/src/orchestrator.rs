//! Initial and periodic spawn requests.

use std::{f32::consts::TAU, time::Duration};

use glam::Vec2;
use portal_runner_core::{
    CloneConfig, Command, ConfigError, EnemyConfig, Event, Lineage, PlacementError,
};
use portal_runner_system_cloning::CloneFactory;
use tracing::{debug, info, warn};

use crate::config::{ConfigCache, ConfigSource};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;

/// External service resolving where new entities may appear.
pub trait Placement {
    /// Resolves a position for an enemy of the provided kind near `reference`.
    fn place_enemy(&mut self, kind: &str, reference: Vec2) -> Result<Vec2, PlacementError>;

    /// Resolves a position for a key pickup near `reference`.
    fn place_key(&mut self, reference: Vec2) -> Result<Vec2, PlacementError>;
}

/// Fixed-delay timer fed by simulation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepeatingTimer {
    delay: Duration,
    accumulator: Duration,
}

impl RepeatingTimer {
    /// Creates a timer firing every `delay`; a zero delay never fires.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            accumulator: Duration::ZERO,
        }
    }

    /// Delay between firings.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Accumulates `elapsed` and reports how many times the timer fired.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if self.delay.is_zero() {
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(elapsed);
        let mut fired = 0;
        while self.accumulator >= self.delay {
            self.accumulator -= self.delay;
            fired += 1;
        }
        fired
    }
}

/// Configuration parameters required to construct the orchestrator.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that issues initial and periodic spawn requests.
#[derive(Debug)]
pub struct SpawnOrchestrator {
    factory: CloneFactory,
    enemy_timer: Option<RepeatingTimer>,
    item_timer: Option<RepeatingTimer>,
    rng_state: u64,
    now: Duration,
}

impl SpawnOrchestrator {
    /// Creates an orchestrator without registered timers.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            factory: CloneFactory::new(),
            enemy_timer: None,
            item_timer: None,
            rng_state: config.rng_seed,
            now: Duration::ZERO,
        }
    }

    /// Timer driving periodic enemy spawns, once registered.
    #[must_use]
    pub const fn enemy_timer(&self) -> Option<&RepeatingTimer> {
        self.enemy_timer.as_ref()
    }

    /// Timer driving periodic key spawns, once registered.
    #[must_use]
    pub const fn item_timer(&self) -> Option<&RepeatingTimer> {
        self.item_timer.as_ref()
    }

    /// Requests the starting roster, returning how many spawns were issued.
    ///
    /// Placement failures skip the affected actor and the loop continues.
    pub fn spawn_initial_enemies<S: ConfigSource, P: Placement>(
        &mut self,
        cache: &mut ConfigCache<S>,
        placement: &mut P,
        reference: Vec2,
        out: &mut Vec<Command>,
    ) -> Result<usize, ConfigError> {
        let config = cache.enemy_config()?;
        let mut spawned = 0;
        for _ in 0..config.initial_count {
            if self.spawn_enemy(config, placement, reference, out) {
                spawned += 1;
            }
        }

        info!(
            requested = config.initial_count,
            spawned, "spawned initial enemies"
        );
        Ok(spawned)
    }

    /// Registers the repeating enemy and item timers.
    pub fn setup_periodic_events<S: ConfigSource>(
        &mut self,
        cache: &mut ConfigCache<S>,
    ) -> Result<(), ConfigError> {
        let enemy_delay = cache.enemy_config()?.periodic_spawn_delay;
        let item_delay = cache.item_config()?.keys.spawn_delay;

        self.enemy_timer = Some(RepeatingTimer::new(enemy_delay));
        self.item_timer = Some(RepeatingTimer::new(item_delay));
        info!(?enemy_delay, ?item_delay, "registered periodic spawn timers");
        Ok(())
    }

    /// Consumes world events and emits periodic spawn commands.
    pub fn handle<S: ConfigSource, P: Placement>(
        &mut self,
        events: &[Event],
        scene_active: bool,
        cache: &mut ConfigCache<S>,
        placement: &mut P,
        reference: Vec2,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt, now } => {
                    elapsed = elapsed.saturating_add(*dt);
                    self.now = *now;
                }
                Event::SceneTornDown => self.cancel_timers(),
                _ => {}
            }
        }

        if elapsed.is_zero() {
            return;
        }

        let enemy_ticks = self
            .enemy_timer
            .as_mut()
            .map_or(0, |timer| timer.advance(elapsed));
        let item_ticks = self
            .item_timer
            .as_mut()
            .map_or(0, |timer| timer.advance(elapsed));

        if enemy_ticks == 0 && item_ticks == 0 {
            return;
        }

        if !scene_active {
            debug!(enemy_ticks, item_ticks, "scene inactive; skipping periodic spawns");
            return;
        }

        for _ in 0..enemy_ticks {
            match cache.enemy_config() {
                Ok(config) => {
                    let _ = self.spawn_enemy(config, placement, reference, out);
                }
                Err(error) => warn!(%error, "skipping periodic enemy spawn"),
            }
        }

        for _ in 0..item_ticks {
            match placement.place_key(reference) {
                Ok(position) => out.push(Command::SpawnKey { position }),
                Err(error) => warn!(%error, "skipping periodic key spawn"),
            }
        }
    }

    fn cancel_timers(&mut self) {
        let enemy = self.enemy_timer.take();
        let item = self.item_timer.take();
        if enemy.is_some() || item.is_some() {
            debug!(
                enemy_delay = ?enemy.map(|timer| timer.delay()),
                item_delay = ?item.map(|timer| timer.delay()),
                "cancelled periodic spawn timers"
            );
        }
    }

    fn spawn_enemy<P: Placement>(
        &mut self,
        config: &EnemyConfig,
        placement: &mut P,
        reference: Vec2,
        out: &mut Vec<Command>,
    ) -> bool {
        if config.enabled_types.is_empty() {
            debug!("no enemy types enabled");
            return false;
        }

        let index = (self.advance_rng() % config.enabled_types.len() as u64) as usize;
        let kind = &config.enabled_types[index];
        let position = match placement.place_enemy(kind, reference) {
            Ok(position) => position,
            Err(error) => {
                warn!(%kind, %error, "skipping enemy spawn");
                return false;
            }
        };

        let template = config.template(kind);
        let clone_config = CloneConfig {
            kind: kind.clone(),
            position,
            lineage: Lineage::Original,
            spawn_time: self.now,
            stats: template.stats,
            policy: template.policy,
            facing: Some(self.next_angle()),
            blink: false,
        };
        self.factory.create_clone(&clone_config, out).is_ok()
    }

    fn next_angle(&mut self) -> f32 {
        let fraction = (self.advance_rng() >> 40) as f32 / (1_u64 << 24) as f32;
        fraction * TAU
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }
}
