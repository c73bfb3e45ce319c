use std::{collections::BTreeMap, fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use glam::Vec2;
use portal_runner_core::{
    ActorKind, AnimationDescriptor, Command, ConfigError, EnemyCap, EnemyConfig, EnemyTemplate,
    FrameDescriptor, ItemConfig, KeyItemConfig, Playback, PortalConfig, TextureMode,
};
use portal_runner_system_population::ConfigSource;
use serde::Deserialize;

const SUPPORTED_LEVEL_VERSION: u32 = 1;
const UNLIMITED_KEYWORD: &str = "unlimited";
const DEFAULT_LEVEL: &str = include_str!("../levels/default.toml");

/// Portal placed into the scene when the level starts.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PortalPlacement {
    pub(crate) config: PortalConfig,
    pub(crate) position: Vec2,
}

/// Fully validated level description.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LevelConfig {
    pub(crate) arena: Vec2,
    pub(crate) settle_delay: Duration,
    pub(crate) enemies: EnemyConfig,
    pub(crate) items: ItemConfig,
    pub(crate) portals: Vec<PortalPlacement>,
    pub(crate) animations: Vec<AnimationDescriptor>,
}

impl LevelConfig {
    /// Loads the level compiled into the binary.
    pub(crate) fn embedded_default() -> Result<Self> {
        Self::parse(DEFAULT_LEVEL).context("failed to parse the built-in level")
    }

    /// Loads a level manifest from disk.
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read level manifest at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid level manifest at {}", path.display()))
    }

    /// Commands that build the static part of the scene.
    pub(crate) fn scene_commands(&self) -> Vec<Command> {
        let mut commands = vec![Command::ConfigureScene {
            width: self.arena.x,
            height: self.arena.y,
            settle_delay: self.settle_delay,
        }];
        commands.extend(
            self.animations
                .iter()
                .cloned()
                .map(|descriptor| Command::RegisterAnimation { descriptor }),
        );
        commands.extend(self.portals.iter().map(|portal| Command::SpawnPortal {
            config: portal.config.clone(),
            position: portal.position,
        }));
        commands
    }

    fn parse(contents: &str) -> Result<Self> {
        let manifest: Manifest =
            toml::from_str(contents).context("failed to parse level manifest toml contents")?;
        if manifest.version != SUPPORTED_LEVEL_VERSION {
            bail!(
                "unsupported level manifest version {}; expected {}",
                manifest.version,
                SUPPORTED_LEVEL_VERSION
            );
        }

        let arena = Vec2::new(manifest.arena.width, manifest.arena.height);
        if !arena.is_finite() || arena.min_element() <= 0.0 {
            bail!("arena dimensions must be positive, got {arena}");
        }

        Ok(Self {
            arena,
            settle_delay: Duration::from_millis(manifest.activation.settle_delay_ms),
            enemies: manifest.enemies.into_config()?,
            items: ItemConfig {
                keys: KeyItemConfig {
                    spawn_delay: Duration::from_millis(manifest.items.keys.spawn_delay_ms),
                },
            },
            portals: manifest
                .portals
                .into_iter()
                .map(PortalEntry::into_placement)
                .collect(),
            animations: manifest
                .animations
                .into_iter()
                .map(AnimationEntry::into_descriptor)
                .collect(),
        })
    }
}

impl ConfigSource for LevelConfig {
    fn enemy_config(&self) -> Result<EnemyConfig, ConfigError> {
        Ok(self.enemies.clone())
    }

    fn item_config(&self) -> Result<ItemConfig, ConfigError> {
        Ok(self.items)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    version: u32,
    arena: ArenaSection,
    #[serde(default)]
    activation: ActivationSection,
    enemies: EnemySection,
    items: ItemSection,
    #[serde(default)]
    portals: Vec<PortalEntry>,
    #[serde(default)]
    animations: Vec<AnimationEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArenaSection {
    width: f32,
    height: f32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActivationSection {
    settle_delay_ms: u64,
}

impl Default for ActivationSection {
    fn default() -> Self {
        Self {
            settle_delay_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnemySection {
    initial_count: u32,
    periodic_spawn_delay_ms: u64,
    max_enemies: MaxEnemies,
    enabled_types: Vec<String>,
    #[serde(default)]
    templates: BTreeMap<String, TemplateEntry>,
}

impl EnemySection {
    fn into_config(self) -> Result<EnemyConfig> {
        let mut templates = BTreeMap::new();
        for (name, entry) in self.templates {
            let kind: ActorKind = name
                .parse()
                .with_context(|| format!("template for unknown enemy type `{name}`"))?;
            let _ = templates.insert(kind.name().to_owned(), entry.merge(kind.default_template()));
        }

        Ok(EnemyConfig {
            initial_count: self.initial_count,
            periodic_spawn_delay: Duration::from_millis(self.periodic_spawn_delay_ms),
            max_enemies: self.max_enemies.into_cap()?,
            enabled_types: self.enabled_types,
            templates,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MaxEnemies {
    Count(u32),
    Keyword(String),
}

impl MaxEnemies {
    fn into_cap(self) -> Result<EnemyCap> {
        match self {
            Self::Count(count) => Ok(EnemyCap::Limited(count)),
            Self::Keyword(keyword) if keyword.eq_ignore_ascii_case(UNLIMITED_KEYWORD) => {
                Ok(EnemyCap::Unlimited)
            }
            Self::Keyword(keyword) => {
                bail!("max_enemies must be a count or `{UNLIMITED_KEYWORD}`, got `{keyword}`")
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateEntry {
    speed: Option<f32>,
    health: Option<u32>,
    damage: Option<u32>,
    clone_detection_radius: Option<f32>,
    chase_radius: Option<f32>,
    chase_speed: Option<f32>,
    clones_can_clone: Option<bool>,
    clone_lifetime_ms: Option<u64>,
    clone_count: Option<u32>,
    clone_spawn_delay_ms: Option<u64>,
}

impl TemplateEntry {
    fn merge(self, base: EnemyTemplate) -> EnemyTemplate {
        let mut template = base;
        let stats = &mut template.stats;
        let policy = &mut template.policy;

        stats.speed = self.speed.unwrap_or(stats.speed);
        stats.health = self.health.unwrap_or(stats.health);
        stats.damage = self.damage.unwrap_or(stats.damage);
        policy.clone_detection_radius = self
            .clone_detection_radius
            .unwrap_or(policy.clone_detection_radius);
        policy.chase_radius = self.chase_radius.unwrap_or(policy.chase_radius);
        policy.chase_speed = self.chase_speed.unwrap_or(policy.chase_speed);
        policy.clones_can_clone = self.clones_can_clone.unwrap_or(policy.clones_can_clone);
        if let Some(lifetime) = self.clone_lifetime_ms {
            policy.clone_lifetime = (lifetime > 0).then(|| Duration::from_millis(lifetime));
        }
        policy.clone_count = self.clone_count.unwrap_or(policy.clone_count);
        if let Some(delay) = self.clone_spawn_delay_ms {
            policy.clone_spawn_delay = Duration::from_millis(delay);
        }
        template
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ItemSection {
    keys: KeySection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeySection {
    spawn_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PortalEntry {
    answer: String,
    correct: bool,
    #[serde(default)]
    damage: u32,
    #[serde(default = "animated_texture")]
    texture: TextureMode,
    x: f32,
    y: f32,
}

fn animated_texture() -> TextureMode {
    TextureMode::Animated
}

impl PortalEntry {
    fn into_placement(self) -> PortalPlacement {
        PortalPlacement {
            config: PortalConfig {
                correct: self.correct,
                answer: self.answer,
                damage: self.damage,
                texture: self.texture,
            },
            position: Vec2::new(self.x, self.y),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnimationEntry {
    key: String,
    frames: Vec<FrameEntry>,
    frame_rate: Option<f32>,
    #[serde(default)]
    repeat: i32,
}

impl AnimationEntry {
    fn into_descriptor(self) -> AnimationDescriptor {
        AnimationDescriptor {
            key: self.key,
            frames: self.frames.into_iter().map(FrameEntry::into_frame).collect(),
            frame_rate: self.frame_rate,
            playback: Playback::from_repeat(self.repeat),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FrameEntry {
    Index(u32),
    Name(String),
    Detailed {
        index: Option<u32>,
        name: Option<String>,
        value: Option<u32>,
    },
}

impl FrameEntry {
    fn into_frame(self) -> FrameDescriptor {
        match self {
            Self::Index(index) => FrameDescriptor::indexed(index),
            Self::Name(name) => FrameDescriptor::named(name),
            Self::Detailed { index, name, value } => FrameDescriptor { index, name, value },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        version = 1

        [arena]
        width = 400.0
        height = 300.0

        [enemies]
        initial_count = 2
        periodic_spawn_delay_ms = 1000
        max_enemies = "Unlimited"
        enabled_types = ["CHASER"]

        [items.keys]
        spawn_delay_ms = 750
    "#;

    #[test]
    fn embedded_level_parses() {
        let level = LevelConfig::embedded_default().expect("built-in level is valid");
        assert_eq!(level.enemies.max_enemies, EnemyCap::Limited(14));
        assert_eq!(level.portals.len(), 2);
        assert_eq!(level.portals[1].config.texture, TextureMode::Static);
        assert_eq!(level.settle_delay, Duration::from_millis(500));
    }

    #[test]
    fn minimal_level_uses_defaults() {
        let level = LevelConfig::parse(MINIMAL).expect("minimal level parses");
        assert_eq!(level.arena, Vec2::new(400.0, 300.0));
        assert_eq!(level.enemies.max_enemies, EnemyCap::Unlimited);
        assert_eq!(level.settle_delay, Duration::from_millis(500));
        assert_eq!(level.items.keys.spawn_delay, Duration::from_millis(750));
        assert!(level.enemies.templates.is_empty());
        assert_eq!(
            level.enemies.template("CHASER"),
            ActorKind::Chaser.default_template()
        );
    }

    #[test]
    fn unsupported_versions_are_rejected() {
        let manifest = MINIMAL.replace("version = 1", "version = 2");
        let error = LevelConfig::parse(&manifest).expect_err("version 2 is unsupported");
        assert!(error.to_string().contains("unsupported level manifest version"));
    }

    #[test]
    fn unknown_cap_keywords_are_rejected() {
        let manifest = MINIMAL.replace("\"Unlimited\"", "\"lots\"");
        assert!(LevelConfig::parse(&manifest).is_err());
    }

    #[test]
    fn templates_override_only_listed_fields() {
        let manifest = format!(
            "{MINIMAL}\n[enemies.templates.chaser]\nhealth = 9\nclone_lifetime_ms = 0\n"
        );
        let level = LevelConfig::parse(&manifest).expect("template parses");
        let template = level.enemies.template("CHASER");
        let defaults = ActorKind::Chaser.default_template();

        assert_eq!(template.stats.health, 9);
        assert_eq!(template.stats.speed, defaults.stats.speed);
        assert_eq!(template.policy.clone_lifetime, None);
        assert_eq!(template.policy.clone_count, defaults.policy.clone_count);
    }

    #[test]
    fn templates_for_unknown_kinds_are_rejected() {
        let manifest = format!("{MINIMAL}\n[enemies.templates.DRAGON]\nhealth = 9\n");
        assert!(LevelConfig::parse(&manifest).is_err());
    }

    #[test]
    fn animation_frames_accept_every_descriptor_form() {
        let manifest = format!(
            "{MINIMAL}\n[[animations]]\nkey = \"glow\"\nframes = [4, \"5\", {{ value = 6 }}]\n"
        );
        let level = LevelConfig::parse(&manifest).expect("animation parses");
        let animation = &level.animations[0];

        assert_eq!(animation.playback, Playback::Once);
        assert_eq!(animation.frame_rate, None);
        let resolved: Vec<Option<u32>> =
            animation.frames.iter().map(FrameDescriptor::resolve).collect();
        assert_eq!(resolved, vec![Some(4), Some(5), Some(6)]);
    }

    #[test]
    fn scene_commands_configure_before_spawning_portals() {
        let level = LevelConfig::embedded_default().expect("built-in level is valid");
        let commands = level.scene_commands();

        assert!(matches!(
            commands.first(),
            Some(Command::ConfigureScene { .. })
        ));
        assert_eq!(
            commands
                .iter()
                .filter(|command| matches!(command, Command::SpawnPortal { .. }))
                .count(),
            2
        );
    }
}
