//! Cached access to the level configuration provider.

use portal_runner_core::{ConfigError, EnemyConfig, ItemConfig};

/// Provider of enemy and item spawn configuration.
pub trait ConfigSource {
    /// Resolves the enemy spawn configuration.
    fn enemy_config(&self) -> Result<EnemyConfig, ConfigError>;

    /// Resolves the item spawn configuration.
    fn item_config(&self) -> Result<ItemConfig, ConfigError>;
}

/// Last-known-good cache in front of a [`ConfigSource`].
///
/// A failed fetch leaves the cache empty so the next call retries; a
/// successful fetch is reused until [`ConfigCache::invalidate`] is called.
#[derive(Debug)]
pub struct ConfigCache<S> {
    source: S,
    enemy: Option<EnemyConfig>,
    item: Option<ItemConfig>,
}

impl<S: ConfigSource> ConfigCache<S> {
    /// Creates an empty cache over the provided source.
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self {
            source,
            enemy: None,
            item: None,
        }
    }

    /// Enemy configuration, fetched on first use.
    pub fn enemy_config(&mut self) -> Result<&EnemyConfig, ConfigError> {
        let config = match self.enemy.take() {
            Some(config) => config,
            None => self.source.enemy_config()?,
        };
        let cached: &EnemyConfig = self.enemy.insert(config);
        Ok(cached)
    }

    /// Item configuration, fetched on first use.
    pub fn item_config(&mut self) -> Result<ItemConfig, ConfigError> {
        if let Some(config) = self.item {
            return Ok(config);
        }

        let config = self.source.item_config()?;
        self.item = Some(config);
        Ok(config)
    }

    /// Drops cached values so the next access re-reads the source.
    pub fn invalidate(&mut self) {
        self.enemy = None;
        self.item = None;
    }

    /// Reports whether an enemy configuration is cached.
    #[must_use]
    pub const fn is_warm(&self) -> bool {
        self.enemy.is_some()
    }

    /// Provides read-only access to the wrapped source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Provides mutable access to the wrapped source.
    ///
    /// Changes only become visible after [`ConfigCache::invalidate`].
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, collections::BTreeMap, time::Duration};

    use portal_runner_core::{EnemyCap, KeyItemConfig};

    use super::*;

    struct CountingSource {
        fetches: Cell<u32>,
        cap: u32,
    }

    impl ConfigSource for CountingSource {
        fn enemy_config(&self) -> Result<EnemyConfig, ConfigError> {
            self.fetches.set(self.fetches.get() + 1);
            Ok(EnemyConfig {
                initial_count: 0,
                periodic_spawn_delay: Duration::ZERO,
                max_enemies: EnemyCap::Limited(self.cap),
                enabled_types: Vec::new(),
                templates: BTreeMap::new(),
            })
        }

        fn item_config(&self) -> Result<ItemConfig, ConfigError> {
            Ok(ItemConfig {
                keys: KeyItemConfig {
                    spawn_delay: Duration::from_secs(1),
                },
            })
        }
    }

    #[test]
    fn cached_config_is_reused_until_invalidated() {
        let mut cache = ConfigCache::new(CountingSource {
            fetches: Cell::new(0),
            cap: 4,
        });
        assert!(!cache.is_warm());

        for _ in 0..3 {
            let config = cache.enemy_config().expect("source never fails");
            assert_eq!(config.max_enemies, EnemyCap::Limited(4));
        }
        assert_eq!(cache.source().fetches.get(), 1);

        cache.source_mut().cap = 9;
        assert_eq!(
            cache.enemy_config().map(|config| config.max_enemies),
            Ok(EnemyCap::Limited(4))
        );

        cache.invalidate();
        assert_eq!(
            cache.enemy_config().map(|config| config.max_enemies),
            Ok(EnemyCap::Limited(9))
        );
        assert_eq!(cache.source().fetches.get(), 2);
    }
}
