use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{PunchMap, PunchStore, StorageError};
use crate::model::{Punch, StationCode};

type PunchKey = (i64, StationCode, String);

/// Punch store kept in process memory. Each upsert happens under the write lock, so readers see
/// either the old or the new timestamp for a key.
#[derive(Debug, Default)]
pub struct MemoryPunchStore {
    punches: RwLock<HashMap<PunchKey, i64>>,
}

impl MemoryPunchStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.punches.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.punches.read().await.is_empty()
    }
}

#[async_trait]
impl PunchStore for MemoryPunchStore {
    async fn record(&self, punch: &Punch) -> Result<(), StorageError> {
        self.punches
            .write()
            .await
            .insert((punch.chip_number, punch.station, punch.stage.clone()), punch.timestamp);
        Ok(())
    }

    async fn punches_for(&self, chip_number: i64, stage: &str) -> Result<PunchMap, StorageError> {
        let punches = self.punches.read().await;
        Ok(punches
            .iter()
            .filter(|((chip, _, s), _)| *chip == chip_number && s == stage)
            .map(|((_, station, _), ts)| (*station, *ts))
            .collect())
    }

    async fn stage_punches(&self, stage: &str) -> Result<HashMap<i64, PunchMap>, StorageError> {
        let punches = self.punches.read().await;
        let mut by_chip: HashMap<i64, PunchMap> = HashMap::new();
        for ((chip, station, s), ts) in punches.iter() {
            if s == stage {
                by_chip.entry(*chip).or_default().insert(*station, *ts);
            }
        }
        Ok(by_chip)
    }
}
