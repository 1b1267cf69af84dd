//! Store configuration.
//!
//! Defaults can be overridden from the environment:
//!
//! - `DOTSTORE_FILE` - snapshot file path, or `:memory:` for a volatile store
//! - `DOTSTORE_ID_STRATEGY` - `timestamp` (default) or `uuid`

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Snapshot file used when nothing else is configured, relative to the
/// working directory.
pub const DEFAULT_SNAPSHOT_FILE: &str = "dotstore.json";

/// Reserved top-level key holding every collection.
pub const DEFAULT_COLLECTIONS_KEY: &str = "_collections";

pub const FILE_ENV: &str = "DOTSTORE_FILE";
pub const ID_STRATEGY_ENV: &str = "DOTSTORE_ID_STRATEGY";

const MEMORY_LOCATION: &str = ":memory:";

/// Where the store root is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotLocation {
    /// A JSON file, rewritten on every mutation.
    File(PathBuf),
    /// Nowhere; the store is lost when the process exits.
    Memory,
}

impl SnapshotLocation {
    /// `:memory:` selects a volatile store; anything else is a file path.
    pub fn parse(s: &str) -> Self {
        if s == MEMORY_LOCATION {
            SnapshotLocation::Memory
        } else {
            SnapshotLocation::File(PathBuf::from(s))
        }
    }
}

impl fmt::Display for SnapshotLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotLocation::File(path) => write!(f, "{}", path.display()),
            SnapshotLocation::Memory => write!(f, "{}", MEMORY_LOCATION),
        }
    }
}

/// How `_id` values are generated for documents inserted without one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// Base-36 milliseconds followed by random characters.
    #[default]
    Timestamp,
    /// Random v4 UUID.
    Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown id strategy '{0}' (expected 'timestamp' or 'uuid')")]
pub struct ParseIdStrategyError(String);

impl FromStr for IdStrategy {
    type Err = ParseIdStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timestamp" => Ok(IdStrategy::Timestamp),
            "uuid" => Ok(IdStrategy::Uuid),
            _ => Err(ParseIdStrategyError(s.to_string())),
        }
    }
}

/// Configuration for opening a store.
///
/// # Example
///
/// ```rust
/// use dotstore::{IdStrategy, SnapshotLocation, StoreConfig};
///
/// let config = StoreConfig::default()
///     .with_file("data/app.json")
///     .id_strategy(IdStrategy::Uuid);
/// assert_eq!(config.snapshot, SnapshotLocation::File("data/app.json".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub snapshot: SnapshotLocation,
    /// Pretty-print the snapshot file.
    pub pretty: bool,
    /// Top-level key that collections are stored under.
    pub collections_key: String,
    pub id_strategy: IdStrategy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            snapshot: SnapshotLocation::File(PathBuf::from(DEFAULT_SNAPSHOT_FILE)),
            pretty: true,
            collections_key: DEFAULT_COLLECTIONS_KEY.to_string(),
            id_strategy: IdStrategy::default(),
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `DOTSTORE_FILE` and `DOTSTORE_ID_STRATEGY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = StoreConfig::default();

        if let Some(location) = lookup(FILE_ENV).filter(|s| !s.trim().is_empty()) {
            config.snapshot = SnapshotLocation::parse(location.trim());
        }

        if let Some(strategy) = lookup(ID_STRATEGY_ENV) {
            match strategy.parse() {
                Ok(strategy) => config.id_strategy = strategy,
                Err(error) => tracing::warn!(%error, "ignoring {}", ID_STRATEGY_ENV),
            }
        }

        config
    }

    /// A volatile store with default settings.
    pub fn memory() -> Self {
        StoreConfig::default().in_memory()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = SnapshotLocation::File(path.into());
        self
    }

    #[must_use]
    pub fn in_memory(mut self) -> Self {
        self.snapshot = SnapshotLocation::Memory;
        self
    }

    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub fn collections_key(mut self, key: impl Into<String>) -> Self {
        self.collections_key = key.into();
        self
    }

    #[must_use]
    pub fn id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }
}
