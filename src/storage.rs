pub mod memory;
pub mod roster;
pub mod sqlite;

pub use memory::MemoryPunchStore;
pub use roster::{CompetitionRecord, JsonRosterProvider, RosterFile, StageSchedule};
pub use sqlite::SqlitePunchStore;

use crate::model::{Competition, Entrant, Punch, StationCode};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt;

/// Station code to unix timestamp for one chip.
pub type PunchMap = BTreeMap<StationCode, i64>;

#[derive(Debug)]
pub struct StorageError {
    store: &'static str,
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl StorageError {
    #[must_use]
    pub fn new(store: &'static str, message: impl Into<String>) -> Self {
        Self {
            store,
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(
        store: &'static str,
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            store,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn store(&self) -> &'static str {
        self.store
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.store, self.message)
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

/// Idempotent keyed store of punches. The key is `(chip, station, stage)`; a later write to the
/// same key replaces the earlier one. Station codes arrive already normalized through
/// [`Punch::new`].
#[async_trait]
pub trait PunchStore: Send + Sync {
    async fn record(&self, punch: &Punch) -> Result<(), StorageError>;

    /// All punches of one chip on one stage. Empty when nothing was recorded.
    async fn punches_for(&self, chip_number: i64, stage: &str) -> Result<PunchMap, StorageError>;

    /// Every punch of a stage grouped by chip, for full-competition exports.
    async fn stage_punches(&self, stage: &str) -> Result<HashMap<i64, PunchMap>, StorageError>;
}

/// Read-only roster and competition metadata. Filtering predicates (vacancy, running flag,
/// external ranking id) live here, not in the engine.
#[async_trait]
pub trait EntrantProvider: Send + Sync {
    async fn all_categories(&self) -> Result<Vec<String>, StorageError>;

    async fn all_entrants(&self, stage: &str) -> Result<Vec<Entrant>, StorageError>;

    async fn entrants_by_category(
        &self,
        category: &str,
        stage: &str,
    ) -> Result<Vec<Entrant>, StorageError>;

    async fn entrant_by_start_number(
        &self,
        start_number: i64,
        stage: &str,
    ) -> Result<Option<Entrant>, StorageError>;

    async fn entrants_by_chip_number(
        &self,
        chip_number: i64,
        stage: &str,
    ) -> Result<Vec<Entrant>, StorageError>;

    /// Entrants carrying a non-empty external ranking id.
    async fn official_entrants(&self, stage: &str) -> Result<Vec<Entrant>, StorageError>;

    async fn competition_metadata(&self, stage: &str) -> Result<Option<Competition>, StorageError>;

    /// Re-reads the underlying source, when it has one.
    async fn refresh(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
