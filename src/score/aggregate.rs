use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::model::{
    Competition, ComputedTiming, Entrant, ResultStatus, TimedEntrant, elapsed_since,
};
use crate::storage::PunchMap;

/// Official and punch-derived finish times further apart than this are logged.
pub const FINISH_DISCREPANCY_TOLERANCE_SECS: f64 = 1.0;

/// Joins punches with entrant start times for one stage of a competition.
pub struct ResultsAggregator<'a> {
    competition: &'a Competition,
}

impl<'a> ResultsAggregator<'a> {
    #[must_use]
    pub fn new(competition: &'a Competition) -> Self {
        Self { competition }
    }

    /// Computes timing for one entrant. Entrants without a usable start time yield `None`.
    #[must_use]
    pub fn compute(&self, entrant: Entrant, punches: &PunchMap) -> Option<TimedEntrant> {
        let Some(start_time) = entrant.start_time else {
            debug!(start_number = entrant.start_number, "Entrant has no start time, skipping");
            return None;
        };
        let Some(start) = self.competition.entrant_start(start_time) else {
            warn!(
                start_number = entrant.start_number,
                start_time,
                "Start time is out of range, skipping"
            );
            return None;
        };

        // The roster is authoritative once it carries a time or a final status.
        let roster_decided =
            entrant.official_time.is_some() || entrant.finish_status != ResultStatus::Active;

        let mut timing = ComputedTiming {
            status: entrant.finish_status,
            running_time: entrant.official_time,
            finish_punch: None,
            split_times: BTreeMap::new(),
            time_behind: None,
            position: None,
        };

        for (&station, &timestamp) in punches {
            let elapsed = elapsed_since(start, timestamp);
            if elapsed < 0.0 {
                warn!(
                    start_number = entrant.start_number,
                    station = station.value(),
                    elapsed,
                    "Punch recorded before the entrant's start"
                );
            }

            if station.is_finish() {
                timing.finish_punch = Some(elapsed);
                if roster_decided {
                    if let Some(official) = entrant.official_time {
                        if (official - elapsed).abs() > FINISH_DISCREPANCY_TOLERANCE_SECS {
                            warn!(
                                start_number = entrant.start_number,
                                official,
                                punched = elapsed,
                                "Official time disagrees with finish punch"
                            );
                        }
                    }
                } else {
                    timing.running_time = Some(elapsed);
                    timing.status = ResultStatus::Ok;
                }
            } else {
                timing.split_times.insert(station, elapsed);
            }
        }

        Some(TimedEntrant {
            entrant,
            start,
            timing,
        })
    }

    /// Computes timing for every entrant, looking each chip up in `punches_by_chip`.
    #[must_use]
    pub fn compute_all(
        &self,
        entrants: Vec<Entrant>,
        punches_by_chip: &HashMap<i64, PunchMap>,
    ) -> Vec<TimedEntrant> {
        let empty = PunchMap::new();
        entrants
            .into_iter()
            .filter_map(|entrant| {
                let punches = entrant
                    .chip_number
                    .and_then(|chip| punches_by_chip.get(&chip))
                    .unwrap_or(&empty);
                self.compute(entrant, punches)
            })
            .collect()
    }
}
