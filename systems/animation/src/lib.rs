#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Manual, engine-independent frame driver for animated sprites.
//!
//! The clock is a stateless algorithm: every sprite owns its own
//! [`AnimationClockState`] and the world applies [`AnimationClock::advance`]
//! to each registered sprite once per tick.

use std::time::Duration;

use portal_runner_core::{
    AnimationClockState, AnimationDescriptor, FrameDescriptor, Playback, MAX_CATCH_UP_STEPS,
};

/// Notification produced when a one-shot animation reaches its final frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationCompletion {
    /// Key of the completed animation.
    pub animation: String,
    /// Final frame of the animation.
    pub frame: FrameDescriptor,
}

/// Result of a single clock advance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockOutcome {
    /// Frame displayed after the advance, if the descriptor resolves to one.
    pub displayed_frame: Option<u32>,
    /// Logical frames advanced during the call.
    pub steps: u32,
    /// Completion notification, emitted exactly once per one-shot playback.
    pub completion: Option<AnimationCompletion>,
}

/// Stateless algorithm that advances manually synced sprite clocks.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnimationClock;

impl AnimationClock {
    /// Creates a new animation clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Advances the clock by `delta`, returning `None` when the sprite is not
    /// eligible for manual sync or its animation data is not ready yet.
    pub fn advance(
        &self,
        state: &mut AnimationClockState,
        animation: Option<&AnimationDescriptor>,
        playing: bool,
        delta: Duration,
    ) -> Option<ClockOutcome> {
        if !state.needs_manual_sync || !playing {
            return None;
        }

        let animation = animation?;
        let last_frame = animation.frames.len().checked_sub(1)?;

        if state.initialized {
            state.timer = state.timer.saturating_add(delta);
        } else {
            state.timer = delta;
            state.frame_index = 0;
            state.interval = animation.frame_interval();
            state.initialized = true;
        }

        if state.frame_index > last_frame {
            state.frame_index = last_frame;
        }

        let mut steps = 0;
        let mut completion = None;
        while steps < MAX_CATCH_UP_STEPS && state.timer >= state.interval {
            state.timer -= state.interval;
            steps += 1;

            match animation.playback {
                Playback::Loop => {
                    state.frame_index = (state.frame_index + 1) % animation.frames.len();
                }
                Playback::Once => {
                    if state.frame_index < last_frame {
                        state.frame_index += 1;
                    }
                    if state.frame_index == last_frame {
                        state.needs_manual_sync = false;
                        completion = Some(AnimationCompletion {
                            animation: animation.key.clone(),
                            frame: animation.frames[last_frame].clone(),
                        });
                        break;
                    }
                }
            }
        }

        let displayed_frame = animation
            .frames
            .get(state.frame_index)
            .and_then(FrameDescriptor::resolve);

        Some(ClockOutcome {
            displayed_frame,
            steps,
            completion,
        })
    }
}
