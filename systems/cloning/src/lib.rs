#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Clone construction and staggered clone broods.
//!
//! [`CloneFactory`] validates a [`CloneConfig`] and turns it into a
//! [`Command::SpawnActor`] carrying the lineage and clone policy verbatim.
//! [`Cloning`] reacts to [`Event::CloneRequested`] by scheduling the brood of
//! the requesting actor and releasing each clone once its stagger elapses.

use std::{f32::consts::TAU, time::Duration};

use portal_runner_core::{
    ActorBlueprint, ActorKind, ActorSnapshot, CloneConfig, CloneError, Command, Event, Lineage,
};
use tracing::{debug, warn};

/// Validates clone requests and emits spawn commands for supported kinds.
#[derive(Clone, Copy, Debug, Default)]
pub struct CloneFactory;

impl CloneFactory {
    /// Creates a new clone factory.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Emits exactly one [`Command::SpawnActor`] for a supported kind.
    ///
    /// Unsupported kinds are logged and reported without emitting anything,
    /// so a failed clone never disturbs its siblings.
    pub fn create_clone(
        &self,
        config: &CloneConfig,
        out: &mut Vec<Command>,
    ) -> Result<ActorKind, CloneError> {
        let kind = match config.kind.parse::<ActorKind>() {
            Ok(kind) => kind,
            Err(error) => {
                warn!(kind = %config.kind, %error, "dropping clone of unsupported kind");
                return Err(error.into());
            }
        };

        out.push(Command::SpawnActor {
            blueprint: ActorBlueprint {
                kind,
                position: config.position,
                lineage: config.lineage,
                spawn_time: config.spawn_time,
                stats: config.stats,
                policy: config.policy,
                facing: config.facing,
                blink: config.blink,
            },
        });
        Ok(kind)
    }
}

#[derive(Clone, Debug)]
struct PendingClone {
    due: Duration,
    config: CloneConfig,
}

/// Pure system that schedules and releases clone broods.
#[derive(Debug, Default)]
pub struct Cloning {
    factory: CloneFactory,
    now: Duration,
    pending: Vec<PendingClone>,
}

impl Cloning {
    /// Creates a cloning system with an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of clones waiting for their stagger to elapse.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Consumes world events and emits spawn commands for due clones.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::TimeAdvanced { now, .. } => self.now = *now,
                Event::CloneRequested { parent } => self.schedule_brood(parent),
                Event::SceneTornDown => {
                    if !self.pending.is_empty() {
                        debug!(pending = self.pending.len(), "discarding clone broods");
                    }
                    self.pending.clear();
                }
                _ => {}
            }
        }

        self.release_due(out);
    }

    fn schedule_brood(&mut self, parent: &ActorSnapshot) {
        let count = parent.policy.clone_count;
        if count == 0 {
            return;
        }

        let heading = if parent.velocity.length_squared() > 0.0 {
            parent.velocity.y.atan2(parent.velocity.x)
        } else {
            0.0
        };

        for index in 0..count {
            let facing = heading + TAU * index as f32 / count as f32;
            let due = self
                .now
                .saturating_add(parent.policy.clone_spawn_delay.saturating_mul(index));
            self.pending.push(PendingClone {
                due,
                config: CloneConfig {
                    kind: parent.kind.name().to_owned(),
                    position: parent.position,
                    lineage: Lineage::Clone { parent: parent.id },
                    spawn_time: due,
                    stats: parent.stats,
                    policy: parent.policy,
                    facing: Some(facing),
                    blink: true,
                },
            });
        }

        debug!(parent = %parent.id, count, "scheduled clone brood");
    }

    fn release_due(&mut self, out: &mut Vec<Command>) {
        let now = self.now;
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].due > now {
                index += 1;
                continue;
            }

            let mut pending = self.pending.remove(index);
            pending.config.spawn_time = now;
            let _ = self.factory.create_clone(&pending.config, out);
        }
    }
}
