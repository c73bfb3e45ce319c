#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Portal Runner engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots such as [`RosterView`], and respond exclusively with new command
//! batches.

use std::{collections::BTreeMap, fmt, str::FromStr, time::Duration};

use glam::Vec2;
use serde::Deserialize;

/// Upper bound on logical frames the animation clock advances in one tick.
pub const MAX_CATCH_UP_STEPS: u32 = 5;

/// Playback rate assumed when an animation does not declare one.
pub const DEFAULT_FRAME_RATE: f32 = 10.0;

/// Number of stored keys that triggers portal activation.
pub const KEYS_TO_ACTIVATE: u8 = 3;

/// Length of the death animation played before a dying actor is reaped.
pub const DEATH_ANIMATION: Duration = Duration::from_millis(400);

/// Length of the blink indicator shown on freshly cloned actors.
pub const BLINK_DURATION: Duration = Duration::from_millis(600);

/// Looping clip shown while a portal waits for keys.
pub const PORTAL_IDLE_ANIMATION: &str = "portal-idle";

/// One-shot clip shown while a portal is charging.
pub const PORTAL_ACTIVATING_ANIMATION: &str = "portal-activating";

/// Looping clip shown once a portal can be entered.
pub const PORTAL_OPEN_ANIMATION: &str = "portal-open";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Configures the playable arena and the portal settle delay.
    ConfigureScene {
        /// Width of the arena measured in world units.
        width: f32,
        /// Height of the arena measured in world units.
        height: f32,
        /// Pause between the third key deposit and portal activation.
        settle_delay: Duration,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Inserts a fully stamped actor into the grouping matching its kind.
    SpawnActor {
        /// Validated construction parameters produced by the clone factory.
        blueprint: ActorBlueprint,
    },
    /// Runs the per-frame update of a single live actor.
    UpdateActor {
        /// Identifier of the actor to update.
        actor: ActorId,
        /// Current position of the player.
        player: Vec2,
        /// Duration of simulated time covered by the update.
        dt: Duration,
    },
    /// Applies damage to an actor, killing it when its health is exhausted.
    DamageActor {
        /// Identifier of the actor receiving damage.
        actor: ActorId,
        /// Amount of health removed.
        amount: u32,
    },
    /// Soft-cancels an actor because the population cap was exceeded.
    EvictActor {
        /// Identifier of the actor selected for eviction.
        actor: ActorId,
    },
    /// Creates a new portal at the provided position.
    SpawnPortal {
        /// Static configuration describing the portal.
        config: PortalConfig,
        /// World position of the portal.
        position: Vec2,
    },
    /// Removes a portal and unregisters its animated sprite.
    RemovePortal {
        /// Identifier of the portal to remove.
        portal: PortalId,
    },
    /// Signals that the player started interacting with a portal.
    BeginInteraction {
        /// Identifier of the portal being approached.
        portal: PortalId,
    },
    /// Signals that the player stopped interacting with a portal.
    EndInteraction {
        /// Identifier of the portal being left.
        portal: PortalId,
    },
    /// Deposits a single key into a portal.
    DepositKey {
        /// Identifier of the portal receiving the key.
        portal: PortalId,
    },
    /// Registers or replaces an animation in the world's library.
    RegisterAnimation {
        /// Animation made available to animated sprites.
        descriptor: AnimationDescriptor,
    },
    /// Places a key pickup into the arena.
    SpawnKey {
        /// World position of the pickup.
        position: Vec2,
    },
    /// Removes a key pickup collected by the player.
    CollectKey {
        /// Identifier of the collected pickup.
        key: KeyId,
    },
    /// Deactivates the scene and drops both physics groupings.
    TearDownScene,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Monotonic clock reading after the tick.
        now: Duration,
    },
    /// Confirms that an actor was inserted into a grouping.
    ActorSpawned {
        /// Identifier assigned to the new actor.
        actor: ActorId,
        /// Behavioural variant of the actor.
        kind: ActorKind,
        /// Lineage stamped onto the actor.
        lineage: Lineage,
        /// Position the actor appeared at.
        position: Vec2,
    },
    /// Requests the blink indicator for a fresh clone.
    BlinkStarted {
        /// Identifier of the blinking actor.
        actor: ActorId,
        /// Length of the indicator.
        duration: Duration,
    },
    /// Requests playback of a sound effect.
    SoundCue {
        /// Sound that should be played.
        cue: SoundCue,
    },
    /// Announces that an actor detected the player and wants to clone itself.
    CloneRequested {
        /// State of the parent at the moment of detection.
        parent: ActorSnapshot,
    },
    /// Reports that a clone outlived its configured lifetime.
    ActorExpired {
        /// Identifier of the expired clone.
        actor: ActorId,
    },
    /// Reports that an actor's health reached zero.
    ActorKilled {
        /// Identifier of the killed actor.
        actor: ActorId,
    },
    /// Reports that an actor was evicted by the population cap.
    ActorEvicted {
        /// Identifier of the evicted actor.
        actor: ActorId,
        /// Spawn time of the evicted actor.
        spawn_time: Duration,
    },
    /// Requests the death animation for an actor entering its dying state.
    DeathAnimationStarted {
        /// Identifier of the dying actor.
        actor: ActorId,
    },
    /// Confirms that a dying actor was swept from its grouping.
    ActorDespawned {
        /// Identifier of the removed actor.
        actor: ActorId,
    },
    /// Confirms that a portal was created.
    PortalSpawned {
        /// Identifier assigned to the portal.
        portal: PortalId,
        /// World position of the portal.
        position: Vec2,
    },
    /// Confirms that a portal was removed.
    PortalRemoved {
        /// Identifier of the removed portal.
        portal: PortalId,
    },
    /// Announces a portal state transition.
    PortalStateChanged {
        /// Identifier of the portal.
        portal: PortalId,
        /// State before the transition.
        from: PortalState,
        /// State after the transition.
        to: PortalState,
    },
    /// Confirms that a key was stored in a portal.
    KeyDeposited {
        /// Identifier of the portal.
        portal: PortalId,
        /// Number of keys stored after the deposit.
        stored_keys: u8,
    },
    /// Reports that a deposit was ignored because the portal is full.
    KeyDepositIgnored {
        /// Identifier of the portal.
        portal: PortalId,
    },
    /// Announces that a portal became enterable.
    PortalActivated {
        /// Identifier of the activated portal.
        portal: PortalId,
    },
    /// Reports that a one-shot animation reached its final frame.
    AnimationCompleted {
        /// Identifier of the portal owning the sprite.
        portal: PortalId,
        /// Key of the completed animation.
        animation: String,
        /// Final frame of the animation.
        frame: FrameDescriptor,
    },
    /// Confirms that a key pickup was placed.
    KeySpawned {
        /// Identifier assigned to the pickup.
        key: KeyId,
        /// World position of the pickup.
        position: Vec2,
    },
    /// Confirms that a key pickup was collected.
    KeyCollected {
        /// Identifier of the collected pickup.
        key: KeyId,
    },
    /// Announces that the scene was torn down.
    SceneTornDown,
}

/// Sound effects requested by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Played whenever an actor spawns.
    Spawn,
    /// Played when an actor starts dying.
    Death,
}

/// Unique identifier assigned to an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Unique identifier assigned to a portal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortalId(u32);

impl PortalId {
    /// Creates a new portal identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a key pickup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(u32);

impl KeyId {
    /// Creates a new key identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Physics grouping that owns an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Grouping {
    /// Actors with simple wandering behaviour.
    Wandering,
    /// Actors of every chasing variant.
    Chasing,
}

/// Closed set of actor variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActorKind {
    /// Drifts across the arena without regard for the player.
    Wanderer,
    /// Hunts the player and splits into clones when close.
    Chaser,
    /// Slow, durable hunter.
    Brute,
}

impl ActorKind {
    /// Every supported variant in declaration order.
    pub const ALL: [ActorKind; 3] = [ActorKind::Wanderer, ActorKind::Chaser, ActorKind::Brute];

    /// Canonical configuration name of the variant.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wanderer => "WANDERER",
            Self::Chaser => "CHASER",
            Self::Brute => "BRUTE",
        }
    }

    /// Grouping that owns actors of this variant.
    #[must_use]
    pub const fn grouping(self) -> Grouping {
        match self {
            Self::Wanderer => Grouping::Wandering,
            Self::Chaser | Self::Brute => Grouping::Chasing,
        }
    }

    /// Parameters used when the level configuration omits a template.
    #[must_use]
    pub fn default_template(self) -> EnemyTemplate {
        match self {
            Self::Wanderer => EnemyTemplate {
                stats: ActorStats::new(60.0, 2, 1),
                policy: ClonePolicy::default(),
            },
            Self::Chaser => EnemyTemplate {
                stats: ActorStats::new(80.0, 3, 1),
                policy: ClonePolicy {
                    clone_detection_radius: 160.0,
                    chase_radius: 240.0,
                    chase_speed: 110.0,
                    clones_can_clone: false,
                    clone_lifetime: Some(Duration::from_millis(5_000)),
                    clone_count: 2,
                    clone_spawn_delay: Duration::from_millis(250),
                },
            },
            Self::Brute => EnemyTemplate {
                stats: ActorStats::new(45.0, 8, 2),
                policy: ClonePolicy {
                    chase_radius: 200.0,
                    chase_speed: 70.0,
                    ..ClonePolicy::default()
                },
            },
        }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActorKind {
    type Err = UnknownActorKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| UnknownActorKind(value.to_owned()))
    }
}

/// Error returned when an actor kind name is not part of the closed set.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unsupported actor kind `{0}`")]
pub struct UnknownActorKind(String);

impl UnknownActorKind {
    /// Name that failed to parse.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Parent/child relationship stamped onto every actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lineage {
    /// Spawned directly by the orchestrator.
    Original,
    /// Produced by cloning another actor.
    Clone {
        /// Actor that spawned the clone.
        parent: ActorId,
    },
}

impl Lineage {
    /// Reports whether the lineage describes a clone.
    #[must_use]
    pub const fn is_clone(&self) -> bool {
        matches!(self, Self::Clone { .. })
    }

    /// Parent of the actor, present iff the actor is a clone.
    #[must_use]
    pub const fn parent(&self) -> Option<ActorId> {
        match self {
            Self::Original => None,
            Self::Clone { parent } => Some(*parent),
        }
    }
}

/// Kinematic and combat parameters of an actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorStats {
    /// Wandering speed in world units per second.
    pub speed: f32,
    /// Remaining health.
    pub health: u32,
    /// Damage dealt to the player on contact.
    pub damage: u32,
}

impl ActorStats {
    /// Creates a new stats block.
    #[must_use]
    pub const fn new(speed: f32, health: u32, damage: u32) -> Self {
        Self {
            speed,
            health,
            damage,
        }
    }
}

/// Clone-policy parameters carried verbatim through every clone generation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClonePolicy {
    /// Player distance that triggers cloning.
    pub clone_detection_radius: f32,
    /// Player distance within which chasing variants steer toward the player.
    pub chase_radius: f32,
    /// Speed used while chasing.
    pub chase_speed: f32,
    /// Whether clones may clone again.
    pub clones_can_clone: bool,
    /// Lifetime of clones; `None` keeps them alive indefinitely.
    pub clone_lifetime: Option<Duration>,
    /// Number of clones produced per cloning event.
    pub clone_count: u32,
    /// Stagger between successive clones of one brood.
    pub clone_spawn_delay: Duration,
}

impl Default for ClonePolicy {
    fn default() -> Self {
        Self {
            clone_detection_radius: 0.0,
            chase_radius: 0.0,
            chase_speed: 0.0,
            clones_can_clone: false,
            clone_lifetime: None,
            clone_count: 0,
            clone_spawn_delay: Duration::ZERO,
        }
    }
}

/// Per-kind spawn parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyTemplate {
    /// Kinematic parameters of spawned actors.
    pub stats: ActorStats,
    /// Clone policy of spawned actors.
    pub policy: ClonePolicy,
}

impl Default for EnemyTemplate {
    fn default() -> Self {
        Self {
            stats: ActorStats::new(0.0, 1, 0),
            policy: ClonePolicy::default(),
        }
    }
}

/// Input of the clone factory describing a single actor to construct.
#[derive(Clone, Debug, PartialEq)]
pub struct CloneConfig {
    /// Configuration name of the requested kind; validated by the factory.
    pub kind: String,
    /// Position the actor appears at.
    pub position: Vec2,
    /// Lineage stamped onto the actor.
    pub lineage: Lineage,
    /// Monotonic clock reading stamped as the actor's spawn time.
    pub spawn_time: Duration,
    /// Kinematic parameters.
    pub stats: ActorStats,
    /// Clone policy propagated verbatim.
    pub policy: ClonePolicy,
    /// Initial facing angle in radians.
    pub facing: Option<f32>,
    /// Whether the actor should blink to signal that it is fresh.
    pub blink: bool,
}

/// Validated construction parameters for an actor.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorBlueprint {
    /// Behavioural variant.
    pub kind: ActorKind,
    /// Position the actor appears at.
    pub position: Vec2,
    /// Lineage stamped onto the actor.
    pub lineage: Lineage,
    /// Spawn time stamped onto the actor.
    pub spawn_time: Duration,
    /// Kinematic parameters.
    pub stats: ActorStats,
    /// Clone policy.
    pub policy: ClonePolicy,
    /// Initial facing angle in radians.
    pub facing: Option<f32>,
    /// Whether the actor should blink.
    pub blink: bool,
}

/// Lifecycle state of an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorState {
    /// The actor participates in the simulation.
    Alive,
    /// The actor plays its death animation and awaits reaping.
    Dying {
        /// Time left until the actor is swept from its grouping.
        remaining: Duration,
    },
}

/// Immutable representation of a single actor used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorSnapshot {
    /// Unique identifier assigned to the actor.
    pub id: ActorId,
    /// Behavioural variant.
    pub kind: ActorKind,
    /// Lineage of the actor.
    pub lineage: Lineage,
    /// Monotonic clock reading at creation.
    pub spawn_time: Duration,
    /// Kinematic parameters.
    pub stats: ActorStats,
    /// Clone policy.
    pub policy: ClonePolicy,
    /// Current position.
    pub position: Vec2,
    /// Current velocity in world units per second.
    pub velocity: Vec2,
    /// Lifecycle state.
    pub state: ActorState,
    /// Whether the physics body participates in the simulation.
    pub body_enabled: bool,
    /// Whether the actor already produced its clone brood.
    pub cloned: bool,
}

impl ActorSnapshot {
    /// Grouping that owns the actor.
    #[must_use]
    pub const fn grouping(&self) -> Grouping {
        self.kind.grouping()
    }

    /// Reports whether the actor is still alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        matches!(self.state, ActorState::Alive)
    }
}

/// Read-only roster of live actors rebuilt from both groupings.
#[derive(Clone, Debug, Default)]
pub struct RosterView {
    snapshots: Vec<ActorSnapshot>,
}

impl RosterView {
    /// Creates a new roster from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ActorSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured actors in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ActorSnapshot> {
        self.snapshots.iter()
    }

    /// Number of live actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no actor is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Retrieves the snapshot of the provided actor.
    #[must_use]
    pub fn get(&self, actor: ActorId) -> Option<&ActorSnapshot> {
        self.snapshots
            .binary_search_by_key(&actor, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }
}

/// Player state consumed by the per-frame update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Current player position.
    pub position: Vec2,
    /// Whether the player participates in the simulation.
    pub active: bool,
}

impl PlayerSnapshot {
    /// Creates an active player snapshot at the provided position.
    #[must_use]
    pub const fn at(position: Vec2) -> Self {
        Self {
            position,
            active: true,
        }
    }
}

/// Configured ceiling on simultaneously live actors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyCap {
    /// No ceiling is enforced.
    Unlimited,
    /// At most the provided number of actors may be alive.
    Limited(u32),
}

impl EnemyCap {
    /// Number of actors that must be evicted to honour the cap.
    #[must_use]
    pub fn surplus(self, live: usize) -> usize {
        match self {
            Self::Unlimited => 0,
            Self::Limited(max) => live.saturating_sub(usize::try_from(max).unwrap_or(usize::MAX)),
        }
    }
}

/// Enemy spawn configuration supplied by the level provider.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemyConfig {
    /// Number of actors spawned when the scene starts.
    pub initial_count: u32,
    /// Delay between periodic enemy spawns.
    pub periodic_spawn_delay: Duration,
    /// Population cap.
    pub max_enemies: EnemyCap,
    /// Kind names eligible for spawning.
    pub enabled_types: Vec<String>,
    /// Per-kind overrides keyed by upper-case kind name.
    pub templates: BTreeMap<String, EnemyTemplate>,
}

impl EnemyConfig {
    /// Resolves the spawn parameters for the provided kind name.
    ///
    /// Explicit templates win; known kinds fall back to their defaults and
    /// unknown names yield an inert template that the factory will reject.
    #[must_use]
    pub fn template(&self, kind: &str) -> EnemyTemplate {
        let key = kind.trim().to_ascii_uppercase();
        if let Some(template) = self.templates.get(&key) {
            return *template;
        }

        kind.parse::<ActorKind>()
            .map(ActorKind::default_template)
            .unwrap_or_default()
    }
}

/// Item spawn configuration supplied by the level provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemConfig {
    /// Key pickup settings.
    pub keys: KeyItemConfig,
}

/// Key pickup spawn settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyItemConfig {
    /// Delay between periodic key spawns.
    pub spawn_delay: Duration,
}

/// Failures reported by the level/config provider.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The provider could not produce a configuration right now.
    #[error("configuration unavailable: {reason}")]
    Unavailable {
        /// Explanation supplied by the provider.
        reason: String,
    },
    /// The provider produced a configuration that cannot be used.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Failures reported by the placement service.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// No admissible position could be found.
    #[error("no free position for {subject} after {attempts} attempts")]
    NoFreeSpot {
        /// What was being placed.
        subject: String,
        /// Number of candidate positions examined.
        attempts: u32,
    },
    /// The placement service is not available.
    #[error("placement service unavailable")]
    Unavailable,
}

/// Failures reported by the clone factory.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CloneError {
    /// The requested kind is not part of the closed set.
    #[error(transparent)]
    UnknownKind(#[from] UnknownActorKind),
}

/// Activation state of a portal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortalState {
    /// Initial state; also the steady state of static-art portals.
    Base,
    /// The player is interacting with the portal.
    Interaction,
    /// The portal stores at least one key and is charging.
    Activating,
    /// Terminal state; the portal can be entered.
    Activated,
}

impl PortalState {
    /// Animation played by animated portals in this state.
    #[must_use]
    pub const fn animation_key(self) -> &'static str {
        match self {
            Self::Base | Self::Interaction => PORTAL_IDLE_ANIMATION,
            Self::Activating => PORTAL_ACTIVATING_ANIMATION,
            Self::Activated => PORTAL_OPEN_ANIMATION,
        }
    }
}

/// How a portal obtains its visuals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureMode {
    /// Frames are driven by the manual animation clock.
    Animated,
    /// Externally supplied static art; no animation is needed.
    Static,
}

/// Static configuration of a portal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortalConfig {
    /// Whether entering the portal counts as the correct answer.
    pub correct: bool,
    /// Answer text displayed on the portal.
    pub answer: String,
    /// Damage dealt to the player when entering a wrong portal.
    pub damage: u32,
    /// Visual mode of the portal.
    pub texture: TextureMode,
}

/// Immutable representation of a portal used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct PortalSnapshot {
    /// Identifier of the portal.
    pub id: PortalId,
    /// World position of the portal.
    pub position: Vec2,
    /// Static configuration.
    pub config: PortalConfig,
    /// Activation state.
    pub state: PortalState,
    /// Number of stored keys.
    pub stored_keys: u8,
    /// Whether activation is scheduled but the settle delay has not elapsed.
    pub activation_pending: bool,
    /// Animated sprite, absent for static-art portals.
    pub sprite: Option<SpriteSnapshot>,
}

impl PortalSnapshot {
    /// Reports whether the portal can be entered.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == PortalState::Activated
    }
}

/// Immutable representation of an animated sprite.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteSnapshot {
    /// Key of the current animation.
    pub animation: String,
    /// Clock driving the sprite.
    pub clock: AnimationClockState,
    /// Frame currently displayed, once resolved.
    pub displayed_frame: Option<u32>,
    /// Whether the current animation is playing.
    pub playing: bool,
}

/// Key pickup placed in the arena.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyPickup {
    /// Identifier of the pickup.
    pub id: KeyId,
    /// World position of the pickup.
    pub position: Vec2,
}

/// Whether an animation wraps or stops at its last frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Playback {
    /// Wraps indefinitely.
    Loop,
    /// Stops at the last frame and signals completion.
    Once,
}

impl Playback {
    /// Interprets a repeat count where `-1` means looping forever.
    #[must_use]
    pub const fn from_repeat(repeat: i32) -> Self {
        if repeat == -1 {
            Self::Loop
        } else {
            Self::Once
        }
    }
}

/// Description of a single animation frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameDescriptor {
    /// Explicit frame index into the sprite sheet.
    pub index: Option<u32>,
    /// Frame name, resolved when it is numeric.
    pub name: Option<String>,
    /// Bare numeric frame value.
    pub value: Option<u32>,
}

impl FrameDescriptor {
    /// Frame addressed by explicit index.
    #[must_use]
    pub const fn indexed(index: u32) -> Self {
        Self {
            index: Some(index),
            name: None,
            value: None,
        }
    }

    /// Frame addressed by name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            index: None,
            name: Some(name.into()),
            value: None,
        }
    }

    /// Frame addressed by a bare numeric value.
    #[must_use]
    pub const fn bare(value: u32) -> Self {
        Self {
            index: None,
            name: None,
            value: Some(value),
        }
    }

    /// Resolves the concrete frame number: explicit index, then numeric name,
    /// then bare value.
    #[must_use]
    pub fn resolve(&self) -> Option<u32> {
        self.index
            .or_else(|| {
                self.name
                    .as_deref()
                    .and_then(|name| name.trim().parse().ok())
            })
            .or(self.value)
    }
}

/// Animation played by a manually synced sprite.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationDescriptor {
    /// Library key of the animation.
    pub key: String,
    /// Ordered frames.
    pub frames: Vec<FrameDescriptor>,
    /// Frames per second; [`DEFAULT_FRAME_RATE`] when absent.
    pub frame_rate: Option<f32>,
    /// Looping or one-shot playback.
    pub playback: Playback,
}

impl AnimationDescriptor {
    /// Creates an animation whose frames are addressed by consecutive indices.
    #[must_use]
    pub fn sequential(
        key: impl Into<String>,
        frame_count: u32,
        frame_rate: Option<f32>,
        playback: Playback,
    ) -> Self {
        Self {
            key: key.into(),
            frames: (0..frame_count).map(FrameDescriptor::indexed).collect(),
            frame_rate,
            playback,
        }
    }

    /// Time each frame stays on screen, rounded to whole nanoseconds.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        let rate = self
            .frame_rate
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .unwrap_or(DEFAULT_FRAME_RATE);
        let nanos = (1_000_000_000.0_f64 / f64::from(rate)).round();
        Duration::from_nanos((nanos as u64).max(1))
    }
}

/// Manual clock attached to every animated sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationClockState {
    /// Time accumulated since the last advanced frame.
    pub timer: Duration,
    /// Time each frame stays on screen.
    pub interval: Duration,
    /// Index of the displayed frame within the active animation.
    pub frame_index: usize,
    /// Whether the clock was initialised for the active animation.
    pub initialized: bool,
    /// Cleared once a one-shot animation completes.
    pub needs_manual_sync: bool,
}

impl AnimationClockState {
    /// Creates a clock awaiting its first tick.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timer: Duration::ZERO,
            interval: Duration::ZERO,
            frame_index: 0,
            initialized: false,
            needs_manual_sync: true,
        }
    }
}

impl Default for AnimationClockState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_parse_case_insensitively() {
        assert_eq!("CHASER".parse::<ActorKind>(), Ok(ActorKind::Chaser));
        assert_eq!(" wanderer ".parse::<ActorKind>(), Ok(ActorKind::Wanderer));
        let error = "DRAGON".parse::<ActorKind>().expect_err("unknown kind");
        assert_eq!(error.name(), "DRAGON");
    }

    #[test]
    fn chasing_variants_share_a_grouping() {
        assert_eq!(ActorKind::Wanderer.grouping(), Grouping::Wandering);
        assert_eq!(ActorKind::Chaser.grouping(), Grouping::Chasing);
        assert_eq!(ActorKind::Brute.grouping(), Grouping::Chasing);
    }

    #[test]
    fn lineage_exposes_parent_only_for_clones() {
        let parent = ActorId::new(7);
        assert_eq!(Lineage::Original.parent(), None);
        assert!(!Lineage::Original.is_clone());
        assert_eq!(Lineage::Clone { parent }.parent(), Some(parent));
        assert!(Lineage::Clone { parent }.is_clone());
    }

    #[test]
    fn frame_resolution_prefers_index_then_name_then_value() {
        let mut frame = FrameDescriptor {
            index: Some(4),
            name: Some("9".to_owned()),
            value: Some(12),
        };
        assert_eq!(frame.resolve(), Some(4));
        frame.index = None;
        assert_eq!(frame.resolve(), Some(9));
        frame.name = Some("glow".to_owned());
        assert_eq!(frame.resolve(), Some(12));
        assert_eq!(FrameDescriptor::default().resolve(), None);
    }

    #[test]
    fn frame_interval_defaults_to_ten_frames_per_second() {
        let animation = AnimationDescriptor::sequential("idle", 3, None, Playback::Loop);
        assert_eq!(animation.frame_interval(), Duration::from_millis(100));

        let invalid = AnimationDescriptor::sequential("idle", 3, Some(0.0), Playback::Loop);
        assert_eq!(invalid.frame_interval(), Duration::from_millis(100));

        let fast = AnimationDescriptor::sequential("idle", 3, Some(20.0), Playback::Loop);
        assert_eq!(fast.frame_interval(), Duration::from_millis(50));
    }

    #[test]
    fn repeat_minus_one_loops() {
        assert_eq!(Playback::from_repeat(-1), Playback::Loop);
        assert_eq!(Playback::from_repeat(0), Playback::Once);
        assert_eq!(Playback::from_repeat(3), Playback::Once);
    }

    #[test]
    fn cap_surplus_counts_excess_actors() {
        assert_eq!(EnemyCap::Limited(3).surplus(5), 2);
        assert_eq!(EnemyCap::Limited(3).surplus(2), 0);
        assert_eq!(EnemyCap::Unlimited.surplus(500), 0);
    }

    #[test]
    fn templates_fall_back_to_kind_defaults() {
        let mut config = EnemyConfig {
            initial_count: 0,
            periodic_spawn_delay: Duration::ZERO,
            max_enemies: EnemyCap::Unlimited,
            enabled_types: Vec::new(),
            templates: BTreeMap::new(),
        };
        assert_eq!(
            config.template("chaser"),
            ActorKind::Chaser.default_template()
        );
        assert_eq!(config.template("DRAGON"), EnemyTemplate::default());

        let custom = EnemyTemplate {
            stats: ActorStats::new(1.0, 1, 1),
            policy: ClonePolicy::default(),
        };
        let _ = config.templates.insert("CHASER".to_owned(), custom);
        assert_eq!(config.template("Chaser"), custom);
    }

    #[test]
    fn portal_states_select_clips() {
        assert_eq!(PortalState::Base.animation_key(), PORTAL_IDLE_ANIMATION);
        assert_eq!(PortalState::Interaction.animation_key(), PORTAL_IDLE_ANIMATION);
        assert_eq!(
            PortalState::Activating.animation_key(),
            PORTAL_ACTIVATING_ANIMATION
        );
        assert_eq!(PortalState::Activated.animation_key(), PORTAL_OPEN_ANIMATION);
    }
}
