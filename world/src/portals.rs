//! Portal state, the animated sprite registry and the animation library.

use std::collections::BTreeMap;

use glam::Vec2;
use portal_runner_core::{
    AnimationClockState, AnimationDescriptor, Playback, PortalConfig, PortalId, PortalSnapshot,
    PortalState, SpriteSnapshot, PORTAL_ACTIVATING_ANIMATION, PORTAL_IDLE_ANIMATION,
    PORTAL_OPEN_ANIMATION,
};
use portal_runner_system_activation::ActivationStateMachine;

#[derive(Clone, Debug)]
pub(crate) struct Portal {
    pub(crate) id: PortalId,
    pub(crate) position: Vec2,
    pub(crate) config: PortalConfig,
    pub(crate) activation: ActivationStateMachine,
}

impl Portal {
    pub(crate) fn snapshot(&self, sprite: Option<&AnimatedSprite>) -> PortalSnapshot {
        PortalSnapshot {
            id: self.id,
            position: self.position,
            config: self.config.clone(),
            state: self.activation.state(),
            stored_keys: self.activation.stored_keys(),
            activation_pending: self.activation.activation_pending(),
            sprite: sprite.map(AnimatedSprite::snapshot),
        }
    }
}

/// Sprite whose frames are driven by the manual animation clock.
#[derive(Clone, Debug)]
pub(crate) struct AnimatedSprite {
    pub(crate) animation: String,
    pub(crate) clock: AnimationClockState,
    pub(crate) displayed_frame: Option<u32>,
    pub(crate) playing: bool,
}

impl AnimatedSprite {
    pub(crate) fn new(animation: &str) -> Self {
        Self {
            animation: animation.to_owned(),
            clock: AnimationClockState::new(),
            displayed_frame: None,
            playing: true,
        }
    }

    /// Switches to `animation`, restarting the clock when the clip changes.
    pub(crate) fn play(&mut self, animation: &str) {
        if self.animation == animation {
            return;
        }

        *self = Self::new(animation);
    }

    fn snapshot(&self) -> SpriteSnapshot {
        SpriteSnapshot {
            animation: self.animation.clone(),
            clock: self.clock,
            displayed_frame: self.displayed_frame,
            playing: self.playing,
        }
    }
}

/// Single authoritative registry of animated sprites, visited once per tick.
#[derive(Debug, Default)]
pub(crate) struct SpriteRegistry {
    sprites: BTreeMap<PortalId, AnimatedSprite>,
}

impl SpriteRegistry {
    pub(crate) fn register(&mut self, portal: PortalId, sprite: AnimatedSprite) {
        let _ = self.sprites.insert(portal, sprite);
    }

    pub(crate) fn unregister(&mut self, portal: PortalId) {
        let _ = self.sprites.remove(&portal);
    }

    pub(crate) fn get(&self, portal: PortalId) -> Option<&AnimatedSprite> {
        self.sprites.get(&portal)
    }

    pub(crate) fn get_mut(&mut self, portal: PortalId) -> Option<&mut AnimatedSprite> {
        self.sprites.get_mut(&portal)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&PortalId, &mut AnimatedSprite)> {
        self.sprites.iter_mut()
    }

    /// Restarts the clock of every sprite currently playing `animation`.
    pub(crate) fn restart(&mut self, animation: &str) {
        for sprite in self.sprites.values_mut() {
            if sprite.animation == animation {
                *sprite = AnimatedSprite::new(animation);
            }
        }
    }

    /// Selects the clip matching the portal's activation state.
    pub(crate) fn sync_state(&mut self, portal: PortalId, state: PortalState) {
        if let Some(sprite) = self.get_mut(portal) {
            sprite.play(state.animation_key());
        }
    }
}

/// Animations available to animated sprites, keyed by name.
#[derive(Debug)]
pub(crate) struct AnimationLibrary {
    animations: BTreeMap<String, AnimationDescriptor>,
}

impl AnimationLibrary {
    /// Library holding the three built-in portal clips.
    pub(crate) fn with_portal_defaults() -> Self {
        let mut library = Self {
            animations: BTreeMap::new(),
        };
        library.insert(AnimationDescriptor::sequential(
            PORTAL_IDLE_ANIMATION,
            4,
            Some(8.0),
            Playback::Loop,
        ));
        library.insert(AnimationDescriptor::sequential(
            PORTAL_ACTIVATING_ANIMATION,
            6,
            Some(12.0),
            Playback::Once,
        ));
        library.insert(AnimationDescriptor::sequential(
            PORTAL_OPEN_ANIMATION,
            4,
            Some(10.0),
            Playback::Loop,
        ));
        library
    }

    pub(crate) fn insert(&mut self, descriptor: AnimationDescriptor) {
        let _ = self.animations.insert(descriptor.key.clone(), descriptor);
    }

    pub(crate) fn get(&self, key: &str) -> Option<&AnimationDescriptor> {
        self.animations.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switching_clips_restarts_the_clock() {
        let mut sprite = AnimatedSprite::new(PORTAL_IDLE_ANIMATION);
        sprite.clock.frame_index = 2;
        sprite.clock.initialized = true;

        sprite.play(PORTAL_IDLE_ANIMATION);
        assert_eq!(sprite.clock.frame_index, 2);

        sprite.play(PORTAL_ACTIVATING_ANIMATION);
        assert_eq!(sprite.animation, PORTAL_ACTIVATING_ANIMATION);
        assert_eq!(sprite.clock, AnimationClockState::new());
        assert!(sprite.playing);
    }

    #[test]
    fn default_library_covers_every_portal_state() {
        let library = AnimationLibrary::with_portal_defaults();
        for state in [
            PortalState::Base,
            PortalState::Interaction,
            PortalState::Activating,
            PortalState::Activated,
        ] {
            assert!(library.get(state.animation_key()).is_some());
        }
        assert_eq!(
            library
                .get(PORTAL_ACTIVATING_ANIMATION)
                .map(|clip| clip.playback),
            Some(Playback::Once)
        );
    }
}
