//! Per-frame actor updates and population cap enforcement.

use std::time::Duration;

use portal_runner_core::{ActorSnapshot, Command, PlayerSnapshot, RosterView};
use tracing::{debug, warn};

use crate::config::{ConfigCache, ConfigSource};

/// Pure system that drives live actors and evicts the oldest surplus.
#[derive(Clone, Copy, Debug, Default)]
pub struct PopulationController;

impl PopulationController {
    /// Creates a new population controller.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Emits an update for every live actor with an enabled body.
    ///
    /// Nothing is emitted while the player is inactive.
    pub fn update(
        &self,
        roster: &RosterView,
        player: PlayerSnapshot,
        dt: Duration,
        out: &mut Vec<Command>,
    ) {
        if !player.active {
            return;
        }

        for actor in roster.iter() {
            if actor.is_alive() && actor.body_enabled {
                out.push(Command::UpdateActor {
                    actor: actor.id,
                    player: player.position,
                    dt,
                });
            }
        }
    }

    /// Evicts the oldest actors until the roster fits the configured cap.
    ///
    /// Returns the number of evictions requested. A configuration failure
    /// skips enforcement for this frame.
    pub fn control_max_enemies<S: ConfigSource>(
        &self,
        roster: &RosterView,
        cache: &mut ConfigCache<S>,
        out: &mut Vec<Command>,
    ) -> usize {
        let cap = match cache.enemy_config() {
            Ok(config) => config.max_enemies,
            Err(error) => {
                warn!(%error, "skipping population cap enforcement");
                return 0;
            }
        };

        let surplus = cap.surplus(roster.len());
        if surplus == 0 {
            return 0;
        }

        let mut oldest: Vec<&ActorSnapshot> = roster.iter().collect();
        oldest.sort_by_key(|actor| actor.spawn_time);
        for actor in oldest.into_iter().take(surplus) {
            out.push(Command::EvictActor { actor: actor.id });
        }

        debug!(live = roster.len(), surplus, "evicting oldest actors");
        surplus
    }
}
