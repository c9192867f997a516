use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::aggregate::ResultsAggregator;
use super::document::ResultsDocumentBuilder;
use super::partition::{OfficialCategories, partition_official, partition_snapshot};
use super::ranking::{live_station_ranking, rank_category};
use crate::error::{Result, ResultsError};
use crate::model::{
    CategoryResult, Competition, Entrant, LiveRankingEntry, Punch, ResultList, ResultsMode,
    StationCode, TimedEntrant,
};
use crate::storage::{EntrantProvider, PunchMap, PunchStore};

const NOTIFICATION_CAPACITY: usize = 64;

/// Entry point for the surrounding service layer. Every call recomputes from current store state.
pub struct ResultsService {
    punches: Arc<dyn PunchStore>,
    roster: Arc<dyn EntrantProvider>,
    official: OfficialCategories,
    notifications: broadcast::Sender<Arc<ResultList>>,
}

impl ResultsService {
    #[must_use]
    pub fn new(punches: Arc<dyn PunchStore>, roster: Arc<dyn EntrantProvider>) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            punches,
            roster,
            official: OfficialCategories::default(),
            notifications,
        }
    }

    #[must_use]
    pub fn with_official_categories(mut self, official: OfficialCategories) -> Self {
        self.official = official;
        self
    }

    /// Single-person documents produced by [`ResultsService::ingest_punch`].
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ResultList>> {
        self.notifications.subscribe()
    }

    /// # Errors
    ///
    /// Will return `Err` if the roster is unavailable
    pub async fn categories(&self) -> Result<Vec<String>> {
        Ok(self.roster.all_categories().await?)
    }

    /// # Errors
    ///
    /// Will return `Err` if the roster is unavailable or no entrant has that start number
    pub async fn entrant(&self, start_number: i64, stage: &str) -> Result<Entrant> {
        self.roster
            .entrant_by_start_number(start_number, stage)
            .await?
            .ok_or_else(|| ResultsError::not_found(format!("start number {start_number}")))
    }

    /// # Errors
    ///
    /// Will return `Err` if the roster source cannot be re-read
    pub async fn refresh_roster(&self) -> Result<()> {
        Ok(self.roster.refresh().await?)
    }

    async fn competition(&self, stage: &str) -> Result<Competition> {
        self.roster
            .competition_metadata(stage)
            .await?
            .ok_or_else(|| ResultsError::not_found(format!("competition stage {stage}")))
    }

    /// Looks up punches chip by chip, for calls that touch a handful of entrants.
    async fn punches_by_chip(
        &self,
        entrants: &[Entrant],
        stage: &str,
    ) -> Result<HashMap<i64, PunchMap>> {
        let mut chips: Vec<i64> = entrants.iter().filter_map(|e| e.chip_number).collect();
        chips.sort_unstable();
        chips.dedup();

        let maps =
            try_join_all(chips.iter().map(|chip| self.punches.punches_for(*chip, stage))).await?;
        Ok(chips.into_iter().zip(maps).collect())
    }

    async fn timed_category(
        &self,
        category: &str,
        stage: &str,
        competition: &Competition,
    ) -> Result<Vec<TimedEntrant>> {
        let entrants = self.roster.entrants_by_category(category, stage).await?;
        if entrants.is_empty() {
            return Err(ResultsError::not_found(format!("category {category}")));
        }
        let punches = self.punches_by_chip(&entrants, stage).await?;
        Ok(ResultsAggregator::new(competition).compute_all(entrants, &punches))
    }

    /// Computed results for one category. In complete mode `category` may be a raw code or an
    /// official division name and the result is ranked.
    ///
    /// # Errors
    ///
    /// Will return `Err` if a store is unavailable or the category has no entrants
    pub async fn compute_category_results(
        &self,
        category: &str,
        stage: &str,
        mode: ResultsMode,
    ) -> Result<CategoryResult> {
        let competition = self.competition(stage).await?;
        self.category_result(category, stage, mode, &competition).await
    }

    /// A results document holding just one category.
    ///
    /// # Errors
    ///
    /// Will return `Err` if a store is unavailable or the category has no entrants
    pub async fn build_category_document(
        &self,
        category: &str,
        stage: &str,
        mode: ResultsMode,
    ) -> Result<ResultList> {
        let competition = self.competition(stage).await?;
        let result = self.category_result(category, stage, mode, &competition).await?;
        Ok(ResultsDocumentBuilder::new(&competition).build(mode, &[result]))
    }

    async fn category_result(
        &self,
        category: &str,
        stage: &str,
        mode: ResultsMode,
        competition: &Competition,
    ) -> Result<CategoryResult> {
        match mode {
            ResultsMode::Snapshot => {
                let timed = self.timed_category(category, stage, competition).await?;
                partition_snapshot(timed)
                    .into_iter()
                    .next()
                    .ok_or_else(|| ResultsError::not_found(format!("category {category}")))
            }
            ResultsMode::Complete => {
                let division = self
                    .official
                    .resolve(category)
                    .ok_or_else(|| {
                        ResultsError::not_found(format!("official category {category}"))
                    })?
                    .to_string();
                let mut groups = self.official_partition(stage, competition).await?;
                let index = groups
                    .iter()
                    .position(|g| g.category == division)
                    .ok_or_else(|| {
                        ResultsError::not_found(format!("official category {division}"))
                    })?;
                Ok(groups.swap_remove(index))
            }
        }
    }

    async fn official_partition(
        &self,
        stage: &str,
        competition: &Competition,
    ) -> Result<Vec<CategoryResult>> {
        let entrants = self.roster.official_entrants(stage).await?;
        let punches = self.punches.stage_punches(stage).await?;
        let timed = ResultsAggregator::new(competition).compute_all(entrants, &punches);
        let mut groups = partition_official(timed, &self.official);
        for group in &mut groups {
            rank_category(&mut group.entries);
        }
        Ok(groups)
    }

    /// Live ranking of one category at one station.
    ///
    /// # Errors
    ///
    /// Will return `Err` if a store is unavailable or the category has no entrants
    pub async fn compute_live_station_ranking(
        &self,
        category: &str,
        stage: &str,
        station_code: i64,
    ) -> Result<Vec<LiveRankingEntry>> {
        let competition = self.competition(stage).await?;
        let timed = self.timed_category(category, stage, &competition).await?;
        Ok(live_station_ranking(timed, StationCode::normalize(station_code)))
    }

    /// Full results document for a stage.
    ///
    /// # Errors
    ///
    /// Will return `Err` if a store is unavailable or the stage has no competition record
    pub async fn build_document(&self, stage: &str, mode: ResultsMode) -> Result<ResultList> {
        let competition = self.competition(stage).await?;
        let categories = match mode {
            ResultsMode::Snapshot => {
                let entrants = self.roster.all_entrants(stage).await?;
                let punches = self.punches.stage_punches(stage).await?;
                let timed = ResultsAggregator::new(&competition).compute_all(entrants, &punches);
                partition_snapshot(timed)
            }
            ResultsMode::Complete => self.official_partition(stage, &competition).await?,
        };
        debug!(
            stage,
            mode = mode.as_str(),
            categories = categories.len(),
            "Built results document"
        );
        Ok(ResultsDocumentBuilder::new(&competition).build(mode, &categories))
    }

    /// Snapshot document scoped to the categories of one chip, including a punch that may not be
    /// stored yet.
    ///
    /// # Errors
    ///
    /// Will return `Err` if a store is unavailable or no entrant runs with this chip
    pub async fn build_single_person_document(
        &self,
        chip_number: i64,
        station_code: i64,
        timestamp: i64,
        stage: &str,
    ) -> Result<ResultList> {
        let competition = self.competition(stage).await?;
        let entrants = self.roster.entrants_by_chip_number(chip_number, stage).await?;
        if entrants.is_empty() {
            return Err(ResultsError::not_found(format!("chip {chip_number}")));
        }

        let mut punches = self.punches.punches_for(chip_number, stage).await?;
        punches.insert(StationCode::normalize(station_code), timestamp);
        let mut by_chip = HashMap::new();
        by_chip.insert(chip_number, punches);

        let timed = ResultsAggregator::new(&competition).compute_all(entrants, &by_chip);
        let categories = partition_snapshot(timed);
        Ok(ResultsDocumentBuilder::new(&competition).build(ResultsMode::Snapshot, &categories))
    }

    /// Records a punch and publishes the single-person document for it. Punches from chips no
    /// entrant runs with are stored but yield `None`.
    ///
    /// # Errors
    ///
    /// Will return `Err` if a store is unavailable
    pub async fn ingest_punch(&self, punch: Punch) -> Result<Option<Arc<ResultList>>> {
        self.punches.record(&punch).await?;
        info!(
            chip = punch.chip_number,
            station = punch.station.value(),
            stage = %punch.stage,
            "Recorded punch"
        );

        match self
            .build_single_person_document(
                punch.chip_number,
                punch.station.value(),
                punch.timestamp,
                &punch.stage,
            )
            .await
        {
            Ok(document) => {
                let document = Arc::new(document);
                // No subscribers is fine.
                let _ = self.notifications.send(Arc::clone(&document));
                Ok(Some(document))
            }
            Err(ResultsError::NotFound { what }) => {
                warn!(chip = punch.chip_number, %what, "Punch does not match a running entrant");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
