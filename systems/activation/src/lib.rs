#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-portal activation state machine driven by key deposits.

use std::time::Duration;

use portal_runner_core::{PortalState, KEYS_TO_ACTIVATE};

/// State change reported by the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// State before the change.
    pub from: PortalState,
    /// State after the change.
    pub to: PortalState,
}

/// Result of a key deposit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepositOutcome {
    /// The portal is activated or already holds every key.
    Ignored,
    /// The key was stored.
    Stored {
        /// Number of keys stored after the deposit.
        stored_keys: u8,
        /// State change caused by the deposit, if any.
        transition: Option<Transition>,
        /// Whether activation was scheduled behind the settle delay.
        activation_scheduled: bool,
    },
}

/// Activation state of a single portal.
#[derive(Clone, Debug)]
pub struct ActivationStateMachine {
    state: PortalState,
    stored_keys: u8,
    settle_delay: Duration,
    settle_remaining: Option<Duration>,
}

impl ActivationStateMachine {
    /// Creates a machine in the base state that waits `settle_delay` between
    /// the final deposit and activation.
    #[must_use]
    pub const fn new(settle_delay: Duration) -> Self {
        Self {
            state: PortalState::Base,
            stored_keys: 0,
            settle_delay,
            settle_remaining: None,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> PortalState {
        self.state
    }

    /// Number of stored keys.
    #[must_use]
    pub const fn stored_keys(&self) -> u8 {
        self.stored_keys
    }

    /// Reports whether the portal can be entered.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, PortalState::Activated)
    }

    /// Reports whether activation waits on the settle delay.
    #[must_use]
    pub const fn activation_pending(&self) -> bool {
        self.settle_remaining.is_some()
    }

    /// Replaces the delay used by the next scheduled activation.
    ///
    /// A countdown that is already running keeps its remaining time.
    pub fn set_settle_delay(&mut self, settle_delay: Duration) {
        self.settle_delay = settle_delay;
    }

    /// Stores a key unless the portal is activated or already full.
    pub fn deposit_key(&mut self) -> DepositOutcome {
        if self.is_open() || self.stored_keys >= KEYS_TO_ACTIVATE {
            return DepositOutcome::Ignored;
        }

        self.stored_keys += 1;
        let mut transition = self.move_to(PortalState::Activating);
        let mut activation_scheduled = false;

        if self.stored_keys == KEYS_TO_ACTIVATE {
            if self.settle_delay.is_zero() {
                let from = transition.map_or(self.state, |change| change.from);
                let _ = self.move_to(PortalState::Activated);
                transition = Some(Transition {
                    from,
                    to: PortalState::Activated,
                });
            } else {
                self.settle_remaining = Some(self.settle_delay);
                activation_scheduled = true;
            }
        }

        DepositOutcome::Stored {
            stored_keys: self.stored_keys,
            transition,
            activation_scheduled,
        }
    }

    /// Runs the settle countdown, activating the portal once it elapses.
    pub fn advance(&mut self, dt: Duration) -> Option<Transition> {
        let remaining = self.settle_remaining?;
        if remaining > dt {
            self.settle_remaining = Some(remaining - dt);
            return None;
        }

        self.settle_remaining = None;
        self.move_to(PortalState::Activated)
    }

    /// Marks the start of a player interaction with an idle portal.
    pub fn begin_interaction(&mut self) -> Option<Transition> {
        if self.state == PortalState::Base {
            self.move_to(PortalState::Interaction)
        } else {
            None
        }
    }

    /// Marks the end of a player interaction that did not deposit a key.
    pub fn end_interaction(&mut self) -> Option<Transition> {
        if self.state == PortalState::Interaction {
            self.move_to(PortalState::Base)
        } else {
            None
        }
    }

    fn move_to(&mut self, next: PortalState) -> Option<Transition> {
        if self.state == next {
            return None;
        }

        let from = self.state;
        self.state = next;
        Some(Transition { from, to: next })
    }
}
