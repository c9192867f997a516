use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{EntrantProvider, StorageError};
use crate::model::{Competition, Entrant, RosterRecord};

const STORE: &str = "roster";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StageSchedule {
    pub date: NaiveDate,
    /// Seconds after local midnight.
    #[serde(default)]
    pub first_start: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CompetitionRecord {
    pub name: String,
    #[serde(default)]
    pub place: String,
    #[serde(default)]
    pub organizer: String,
    #[serde(default)]
    pub stages: BTreeMap<String, StageSchedule>,
}

/// On-disk roster export: competition header, optional official category table, entrants.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RosterFile {
    pub competition: CompetitionRecord,
    #[serde(default)]
    pub official_categories: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub entrants: Vec<RosterRecord>,
}

/// Roster provider reading a JSON export of the registration database.
pub struct JsonRosterProvider {
    path: Option<PathBuf>,
    utc_offset: FixedOffset,
    roster: RwLock<RosterFile>,
}

impl JsonRosterProvider {
    /// # Errors
    ///
    /// Will return `Err` if the file is not readable or is not a roster document
    pub async fn open(
        path: impl AsRef<Path>,
        utc_offset: FixedOffset,
    ) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let roster = read_roster(&path).await?;
        Ok(Self {
            path: Some(path),
            utc_offset,
            roster: RwLock::new(roster),
        })
    }

    #[must_use]
    pub fn from_roster(roster: RosterFile, utc_offset: FixedOffset) -> Self {
        Self {
            path: None,
            utc_offset,
            roster: RwLock::new(roster),
        }
    }

    pub async fn official_categories(&self) -> Option<BTreeMap<String, String>> {
        self.roster.read().await.official_categories.clone()
    }

    async fn project<P>(&self, stage: &str, keep: P) -> Vec<Entrant>
    where
        P: Fn(&RosterRecord) -> bool,
    {
        let roster = self.roster.read().await;
        roster
            .entrants
            .iter()
            .filter(|record| keep(record))
            .filter_map(|record| match record.for_stage(stage) {
                Ok(entrant) => entrant,
                Err(e) => {
                    warn!(
                        start_number = record.start_number,
                        stage,
                        error = %e,
                        "Skipping roster record"
                    );
                    None
                }
            })
            .collect()
    }
}

async fn read_roster(path: &Path) -> Result<RosterFile, StorageError> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        StorageError::with_source(STORE, format!("cannot read {}", path.display()), e)
    })?;
    let roster: RosterFile = serde_json::from_str(&contents).map_err(|e| {
        StorageError::with_source(STORE, format!("cannot parse {}", path.display()), e)
    })?;
    debug!(path = %path.display(), entrants = roster.entrants.len(), "Loaded roster");
    Ok(roster)
}

#[async_trait]
impl EntrantProvider for JsonRosterProvider {
    async fn all_categories(&self) -> Result<Vec<String>, StorageError> {
        let roster = self.roster.read().await;
        let mut categories: Vec<String> = Vec::new();
        for record in &roster.entrants {
            if !categories.contains(&record.category) {
                categories.push(record.category.clone());
            }
        }
        Ok(categories)
    }

    async fn all_entrants(&self, stage: &str) -> Result<Vec<Entrant>, StorageError> {
        Ok(self.project(stage, |_| true).await)
    }

    async fn entrants_by_category(
        &self,
        category: &str,
        stage: &str,
    ) -> Result<Vec<Entrant>, StorageError> {
        Ok(self.project(stage, |record| record.category == category).await)
    }

    async fn entrant_by_start_number(
        &self,
        start_number: i64,
        stage: &str,
    ) -> Result<Option<Entrant>, StorageError> {
        Ok(self
            .project(stage, |record| record.start_number == start_number)
            .await
            .into_iter()
            .next())
    }

    async fn entrants_by_chip_number(
        &self,
        chip_number: i64,
        stage: &str,
    ) -> Result<Vec<Entrant>, StorageError> {
        Ok(self
            .project(stage, |record| {
                record
                    .stages
                    .get(stage)
                    .is_some_and(|attrs| attrs.chip_number == Some(chip_number))
            })
            .await)
    }

    async fn official_entrants(&self, stage: &str) -> Result<Vec<Entrant>, StorageError> {
        let entrants = self.project(stage, |_| true).await;
        Ok(entrants.into_iter().filter(Entrant::is_official_eligible).collect())
    }

    async fn competition_metadata(&self, stage: &str) -> Result<Option<Competition>, StorageError> {
        let roster = self.roster.read().await;
        let record = &roster.competition;
        Ok(record.stages.get(stage).map(|schedule| Competition {
            name: record.name.clone(),
            place: record.place.clone(),
            organizer: record.organizer.clone(),
            date: schedule.date,
            first_start_offset: schedule.first_start,
            utc_offset: self.utc_offset,
        }))
    }

    async fn refresh(&self) -> Result<(), StorageError> {
        if let Some(path) = &self.path {
            let fresh = read_roster(path).await?;
            *self.roster.write().await = fresh;
        }
        Ok(())
    }
}
