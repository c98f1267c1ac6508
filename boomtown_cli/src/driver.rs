// The poll loop: load a world, tick it on an interval, print the news.
//
// Two clocks are supported. Wall-clock mode reads `SystemTime` and sleeps
// `interval_ms` between polls, like a server handling periodic requests.
// Simulated mode advances a virtual clock by `interval_ms` per poll without
// sleeping, which makes long runs instant and reproducible for a given seed.
//
// Startup order: optional `GameConfig` and `Catalog` JSON files override the
// built-in defaults; the world comes from `--world` if that file exists,
// otherwise a demo town (with `--demo`) or an empty town is created. A
// loaded world keeps the config and catalog stored in it unless the files
// are given explicitly.

use crate::demo::demo_world;
use crate::host::WorldHost;
use crate::store::{JsonFileStore, MemoryStore, StoreError, WorldStore};
use boomtown_sim::catalog::Catalog;
use boomtown_sim::config::{ConfigError, GameConfig};
use boomtown_sim::types::Timestamp;
use boomtown_sim::world::WorldState;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("system clock is before the Unix epoch")]
    Clock,
}

/// Command-line options for a driver run.
#[derive(Clone, Debug)]
pub struct DriverConfig {
    pub world_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub seed: u64,
    pub interval_ms: u64,
    /// Stop after this many polls. `None` runs until killed.
    pub polls: Option<u64>,
    pub simulated: bool,
    pub demo: bool,
    pub log_level: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            world_path: None,
            config_path: None,
            catalog_path: None,
            seed: 1,
            interval_ms: 1_000,
            polls: None,
            simulated: false,
            demo: false,
            log_level: "info".into(),
        }
    }
}

fn read_file(path: &Path) -> Result<String, DriverError> {
    std::fs::read_to_string(path).map_err(|source| DriverError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_config(path: &Path) -> Result<GameConfig, DriverError> {
    GameConfig::from_json(&read_file(path)?).map_err(|source| DriverError::Config {
        path: path.to_path_buf(),
        source,
    })
}

fn load_catalog(path: &Path) -> Result<Catalog, DriverError> {
    Catalog::from_json(&read_file(path)?).map_err(|source| DriverError::Config {
        path: path.to_path_buf(),
        source,
    })
}

fn wall_clock() -> Result<Timestamp, DriverError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| DriverError::Clock)?;
    Ok(Timestamp(elapsed.as_millis() as u64))
}

/// Resolve the starting world from the store and the option flags.
pub fn initial_world(
    config: &DriverConfig,
    store: &dyn WorldStore,
    now: Timestamp,
) -> Result<WorldState, DriverError> {
    let game_config = config.config_path.as_deref().map(load_config).transpose()?;
    let catalog = config.catalog_path.as_deref().map(load_catalog).transpose()?;

    if let Some(mut world) = store.load()? {
        info!(turn = world.turn, users = world.users.len(), "Loaded world");
        if let Some(game_config) = game_config {
            world.news.set_capacity(game_config.news_capacity);
            world.config = game_config;
        }
        if let Some(catalog) = catalog {
            world.catalog = catalog;
        }
        return Ok(world);
    }

    let game_config = game_config.unwrap_or_default();
    let catalog = catalog.unwrap_or_default();
    let world = if config.demo {
        info!("Seeding demo town");
        demo_world(now, game_config, catalog)
    } else {
        warn!("No saved world found; starting an empty town");
        WorldState::with_config(Some(now), game_config, catalog)
    };
    Ok(world)
}

/// Run the poll loop to completion.
pub fn run(config: &DriverConfig) -> Result<(), DriverError> {
    match &config.world_path {
        Some(path) => run_with_store(config, JsonFileStore::new(path)),
        None => run_with_store(config, MemoryStore::new()),
    }
}

fn run_with_store<S: WorldStore>(config: &DriverConfig, store: S) -> Result<(), DriverError> {
    let start = wall_clock()?;
    let world = initial_world(config, &store, start)?;
    let host = WorldHost::new(world, config.seed, store);
    let interval = config.interval_ms.max(1);

    let mut poll = 0u64;
    while config.polls.is_none_or(|limit| poll < limit) {
        poll += 1;
        let now = if config.simulated {
            start.plus_millis(poll.saturating_mul(interval))
        } else {
            std::thread::sleep(Duration::from_millis(interval));
            wall_clock()?
        };

        let report = host.poll(now)?;
        for entry in report.news.iter().rev() {
            println!("[turn {}] {}", entry.turn, entry.message);
        }
    }

    host.with_world(|world| {
        info!(
            turn = world.turn,
            is_day = world.is_day,
            npcs = world.active_npcs.len(),
            events = world.active_events.len(),
            "Driver finished"
        );
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_flag_seeds_a_town() {
        let config = DriverConfig {
            demo: true,
            ..DriverConfig::default()
        };
        let world = initial_world(&config, &MemoryStore::new(), Timestamp(5)).unwrap();
        assert!(!world.users.is_empty());
        assert_eq!(world.last_tick, Some(Timestamp(5)));
    }

    #[test]
    fn stored_world_wins_over_demo() {
        let store = MemoryStore::new();
        let mut saved = WorldState::new(Timestamp(0));
        saved.turn = 9;
        store.save(&saved).unwrap();
        let config = DriverConfig {
            demo: true,
            ..DriverConfig::default()
        };
        let world = initial_world(&config, &store, Timestamp(5)).unwrap();
        assert_eq!(world.turn, 9);
        assert!(world.users.is_empty());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let config = DriverConfig {
            config_path: Some(PathBuf::from("/definitely/not/here.json")),
            ..DriverConfig::default()
        };
        let err = initial_world(&config, &MemoryStore::new(), Timestamp(0)).unwrap_err();
        assert!(matches!(err, DriverError::Read { .. }));
    }

    #[test]
    fn simulated_run_saves_to_file() {
        let dir = std::env::temp_dir().join(format!("boomtown_driver_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("world.json");
        let config = DriverConfig {
            world_path: Some(path.clone()),
            polls: Some(130),
            simulated: true,
            demo: true,
            ..DriverConfig::default()
        };
        run(&config).unwrap();

        let world = JsonFileStore::new(&path).load().unwrap().unwrap();
        // 130 simulated seconds: one full day and the start of the next.
        assert_eq!(world.turn, 2);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
