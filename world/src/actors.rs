//! Actor state owned by the wandering and chasing groupings.

use std::time::Duration;

use glam::Vec2;
use portal_runner_core::{
    ActorBlueprint, ActorId, ActorKind, ActorSnapshot, ActorState, ActorStats, ClonePolicy,
    Grouping, Lineage, DEATH_ANIMATION,
};

/// Live or dying actor stored inside a grouping.
#[derive(Clone, Debug)]
pub(crate) struct Actor {
    pub(crate) id: ActorId,
    pub(crate) kind: ActorKind,
    pub(crate) lineage: Lineage,
    pub(crate) spawn_time: Duration,
    pub(crate) stats: ActorStats,
    pub(crate) policy: ClonePolicy,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) state: ActorState,
    pub(crate) body_enabled: bool,
    pub(crate) cloned: bool,
}

/// Side effects produced by a single actor update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct UpdateOutcome {
    pub(crate) expired: bool,
    pub(crate) clone_requested: bool,
}

impl Actor {
    pub(crate) fn from_blueprint(id: ActorId, blueprint: ActorBlueprint) -> Self {
        let velocity = blueprint
            .facing
            .map_or(Vec2::ZERO, |angle| Vec2::from_angle(angle) * blueprint.stats.speed);

        Self {
            id,
            kind: blueprint.kind,
            lineage: blueprint.lineage,
            spawn_time: blueprint.spawn_time,
            stats: blueprint.stats,
            policy: blueprint.policy,
            position: blueprint.position,
            velocity,
            state: ActorState::Alive,
            body_enabled: true,
            cloned: false,
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        matches!(self.state, ActorState::Alive)
    }

    pub(crate) fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot {
            id: self.id,
            kind: self.kind,
            lineage: self.lineage,
            spawn_time: self.spawn_time,
            stats: self.stats,
            policy: self.policy,
            position: self.position,
            velocity: self.velocity,
            state: self.state,
            body_enabled: self.body_enabled,
            cloned: self.cloned,
        }
    }

    /// Moves the actor into its dying state; returns `false` if it already was.
    pub(crate) fn begin_dying(&mut self) -> bool {
        if !self.is_alive() {
            return false;
        }

        self.state = ActorState::Dying {
            remaining: DEATH_ANIMATION,
        };
        self.body_enabled = false;
        self.velocity = Vec2::ZERO;
        true
    }

    /// Applies damage, returning `true` when the hit killed the actor.
    pub(crate) fn take_damage(&mut self, amount: u32) -> bool {
        if !self.is_alive() {
            return false;
        }

        self.stats.health = self.stats.health.saturating_sub(amount);
        self.stats.health == 0 && self.begin_dying()
    }

    pub(crate) fn update(
        &mut self,
        player: Vec2,
        dt: Duration,
        now: Duration,
        arena: Vec2,
    ) -> UpdateOutcome {
        let mut outcome = UpdateOutcome::default();
        if !self.is_alive() || !self.body_enabled {
            return outcome;
        }

        if self.lifetime_elapsed(now) {
            outcome.expired = self.begin_dying();
            return outcome;
        }

        let distance = self.position.distance(player);
        if self.kind.grouping() == Grouping::Chasing
            && self.policy.chase_radius > 0.0
            && distance <= self.policy.chase_radius
        {
            self.velocity = (player - self.position).normalize_or_zero() * self.policy.chase_speed;
        }

        self.position += self.velocity * dt.as_secs_f32();
        self.bounce(arena);

        if self.may_clone() && distance <= self.policy.clone_detection_radius {
            self.cloned = true;
            outcome.clone_requested = true;
        }

        outcome
    }

    fn lifetime_elapsed(&self, now: Duration) -> bool {
        match (self.lineage, self.policy.clone_lifetime) {
            (Lineage::Clone { .. }, Some(lifetime)) => {
                now.saturating_sub(self.spawn_time) >= lifetime
            }
            _ => false,
        }
    }

    fn may_clone(&self) -> bool {
        !self.cloned
            && self.policy.clone_count > 0
            && self.policy.clone_detection_radius > 0.0
            && (!self.lineage.is_clone() || self.policy.clones_can_clone)
    }

    fn bounce(&mut self, arena: Vec2) {
        if self.position.x < 0.0 {
            self.position.x = -self.position.x;
            self.velocity.x = self.velocity.x.abs();
        } else if self.position.x > arena.x {
            self.position.x = 2.0 * arena.x - self.position.x;
            self.velocity.x = -self.velocity.x.abs();
        }

        if self.position.y < 0.0 {
            self.position.y = -self.position.y;
            self.velocity.y = self.velocity.y.abs();
        } else if self.position.y > arena.y {
            self.position.y = 2.0 * arena.y - self.position.y;
            self.velocity.y = -self.velocity.y.abs();
        }

        self.position = self.position.clamp(Vec2::ZERO, arena.max(Vec2::ZERO));
    }
}

/// The two physics groupings that own every actor.
#[derive(Debug, Default)]
pub(crate) struct Groupings {
    wandering: Vec<Actor>,
    chasing: Vec<Actor>,
}

impl Groupings {
    pub(crate) fn insert(&mut self, actor: Actor) {
        match actor.kind.grouping() {
            Grouping::Wandering => self.wandering.push(actor),
            Grouping::Chasing => self.chasing.push(actor),
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.wandering.iter().chain(self.chasing.iter())
    }

    pub(crate) fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.wandering
            .iter_mut()
            .chain(self.chasing.iter_mut())
            .find(|actor| actor.id == id)
    }

    /// Counts down death animations and sweeps finished actors.
    pub(crate) fn reap(&mut self, dt: Duration) -> Vec<ActorId> {
        let mut reaped = Vec::new();
        for grouping in [&mut self.wandering, &mut self.chasing] {
            grouping.retain_mut(|actor| match &mut actor.state {
                ActorState::Alive => true,
                ActorState::Dying { remaining } => {
                    *remaining = remaining.saturating_sub(dt);
                    if remaining.is_zero() {
                        reaped.push(actor.id);
                        false
                    } else {
                        true
                    }
                }
            });
        }
        reaped.sort();
        reaped
    }
}
