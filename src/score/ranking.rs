use std::cmp::Ordering;
use tracing::warn;

use crate::model::{LiveRankingEntry, ResultStatus, StationCode, TimedEntrant};

/// OK finishers always precede every other status.
#[must_use]
pub fn status_priority(status: ResultStatus) -> u8 {
    match status {
        ResultStatus::Ok => 0,
        _ => 1,
    }
}

/// Sort key `(priority, time)`. A missing time sorts after every real one.
fn compare_keys(a: (u8, Option<f64>), b: (u8, Option<f64>)) -> Ordering {
    let time = |t: Option<f64>| t.unwrap_or(f64::INFINITY);
    a.0.cmp(&b.0).then_with(|| time(a.1).total_cmp(&time(b.1)))
}

/// Stable sort of a category by status priority, then running time.
pub fn sort_entries(entries: &mut [TimedEntrant]) {
    entries.sort_by(|a, b| {
        compare_keys(
            (status_priority(a.timing.status), a.timing.running_time),
            (status_priority(b.timing.status), b.timing.running_time),
        )
    });
}

/// Fastest time among OK entrants, if any of them has one.
#[must_use]
pub fn winning_time(entries: &[TimedEntrant]) -> Option<f64> {
    entries
        .iter()
        .filter(|e| e.timing.status == ResultStatus::Ok)
        .filter_map(|e| e.timing.running_time)
        .min_by(f64::total_cmp)
}

/// Sorts a category, assigns positions to OK entrants and computes their time behind the winner.
pub fn rank_category(entries: &mut [TimedEntrant]) {
    sort_entries(entries);

    let winner = winning_time(entries);
    if winner.is_none() && entries.iter().any(|e| e.timing.status == ResultStatus::Ok) {
        warn!("OK entrants without running time, skipping time behind");
    }

    for (index, entry) in entries.iter_mut().enumerate() {
        if entry.timing.status != ResultStatus::Ok {
            entry.timing.position = None;
            entry.timing.time_behind = None;
            continue;
        }
        entry.timing.position = u32::try_from(index + 1).ok();
        entry.timing.time_behind = match (winner, entry.timing.running_time) {
            (Some(winner), Some(time)) => Some(time - winner),
            _ => None,
        };
    }
}

/// At an intermediate control nobody has a final result yet, so only entrants already out of
/// the race drop behind.
fn live_priority(status: ResultStatus, station: StationCode) -> u8 {
    if station.is_finish() {
        status_priority(status)
    } else {
        u8::from(status.is_terminal_failure())
    }
}

/// Ranking of the entrants with a punch at `station`. At the finish the official time wins over
/// the punch-derived one; elsewhere the split at that station is used.
///
/// Positions at an intermediate control are provisional split ranks: entrants still on the
/// course are numbered by their split there, which says nothing about their final place. Only
/// entrants already out of the race go unranked.
#[must_use]
pub fn live_station_ranking(
    entries: Vec<TimedEntrant>,
    station: StationCode,
) -> Vec<LiveRankingEntry> {
    let mut reached: Vec<(u8, Option<f64>, TimedEntrant)> = entries
        .into_iter()
        .filter_map(|entry| {
            let time = if station.is_finish() {
                let punched = entry.timing.finish_punch?;
                entry.timing.running_time.or(Some(punched))
            } else {
                Some(*entry.timing.split_times.get(&station)?)
            };
            Some((live_priority(entry.timing.status, station), time, entry))
        })
        .collect();

    reached.sort_by(|a, b| compare_keys((a.0, a.1), (b.0, b.1)));

    reached
        .into_iter()
        .enumerate()
        .map(|(index, (priority, time, entry))| LiveRankingEntry {
            start_number: entry.entrant.start_number,
            name: entry.entrant.name(),
            club: entry.entrant.club.as_ref().map(|c| c.name.clone()),
            country: entry.entrant.country.clone(),
            status: entry.timing.status,
            competition_time: time,
            position: if priority == 0 && time.is_some() {
                u32::try_from(index + 1).ok()
            } else {
                None
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComputedTiming, Entrant};
    use chrono::DateTime;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn timed(start_number: i64, status: ResultStatus, time: Option<f64>) -> TimedEntrant {
        TimedEntrant {
            entrant: Entrant {
                start_number,
                given_name: format!("Runner{start_number}"),
                family_name: "Test".into(),
                chip_number: Some(start_number + 1000),
                club: None,
                country: None,
                category: "M21E".into(),
                start_time: Some(0.0),
                finish_status: status,
                official_time: time,
                wre_id: None,
            },
            start: DateTime::from_timestamp(0, 0).unwrap().fixed_offset(),
            timing: ComputedTiming {
                status,
                running_time: time,
                finish_punch: None,
                split_times: BTreeMap::new(),
                time_behind: None,
                position: None,
            },
        }
    }

    #[test]
    fn ok_finishers_rank_by_time_and_others_follow() {
        let mut entries = vec![
            timed(1, ResultStatus::Ok, Some(120.0)),
            timed(2, ResultStatus::Ok, Some(100.0)),
            timed(3, ResultStatus::DidNotFinish, None),
            timed(4, ResultStatus::Ok, Some(110.0)),
        ];
        rank_category(&mut entries);

        let order: Vec<i64> = entries.iter().map(|e| e.entrant.start_number).collect();
        assert_eq!(order, vec![2, 4, 1, 3]);
        let positions: Vec<Option<u32>> = entries.iter().map(|e| e.timing.position).collect();
        assert_eq!(positions, vec![Some(1), Some(2), Some(3), None]);
        assert_eq!(entries[2].timing.time_behind, Some(20.0));
        assert_eq!(entries[3].timing.time_behind, None);
    }

    #[test]
    fn no_ok_entrant_means_no_time_behind() {
        let mut entries = vec![
            timed(1, ResultStatus::MissingPunch, Some(90.0)),
            timed(2, ResultStatus::Active, None),
        ];
        rank_category(&mut entries);
        assert!(entries.iter().all(|e| e.timing.time_behind.is_none()));
        assert!(entries.iter().all(|e| e.timing.position.is_none()));
        assert_eq!(entries[0].entrant.start_number, 1);
    }

    #[test]
    fn live_ranking_only_lists_entrants_that_reached_the_station() {
        let control = StationCode::normalize(31);
        let mut fast = timed(1, ResultStatus::Active, None);
        fast.timing.split_times.insert(control, 200.0);
        let mut slow = timed(2, ResultStatus::Active, None);
        slow.timing.split_times.insert(control, 250.0);
        let mut out = timed(3, ResultStatus::DidNotFinish, None);
        out.timing.split_times.insert(control, 150.0);
        let missing = timed(4, ResultStatus::Active, None);

        let ranking = live_station_ranking(vec![slow, missing, out, fast], control);
        let order: Vec<i64> = ranking.iter().map(|e| e.start_number).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(ranking[0].position, Some(1));
        // Still running, yet ranked by split.
        assert_eq!(ranking[1].status, ResultStatus::Active);
        assert_eq!(ranking[1].position, Some(2));
        assert_eq!(ranking[2].position, None);
        assert_eq!(ranking[1].competition_time, Some(250.0));
    }

    #[test]
    fn live_finish_ranking_prefers_official_time_over_punch() {
        let mut official = timed(1, ResultStatus::Ok, Some(400.0));
        official.timing.finish_punch = Some(390.0);
        let mut punched = timed(2, ResultStatus::Ok, None);
        punched.timing.finish_punch = Some(395.0);
        let not_punched = timed(3, ResultStatus::Ok, Some(100.0));

        let entries = vec![official, punched, not_punched];
        let ranking = live_station_ranking(entries, StationCode::FINISH);
        let order: Vec<i64> = ranking.iter().map(|e| e.start_number).collect();
        assert_eq!(order, vec![2, 1]);
        assert_eq!(ranking[0].competition_time, Some(395.0));
        assert_eq!(ranking[1].competition_time, Some(400.0));
        assert_eq!(ranking[1].position, Some(2));
    }

    fn status_strategy() -> impl Strategy<Value = ResultStatus> {
        (0i64..=5).prop_map(|code| ResultStatus::from_code(code).unwrap())
    }

    proptest! {
        #[test]
        fn positions_are_contiguous_among_ok_finishers(
            rows in prop::collection::vec(
                (status_strategy(), prop::option::of(0u32..20_000)),
                0..40,
            )
        ) {
            let mut entries: Vec<TimedEntrant> = rows
                .iter()
                .enumerate()
                .map(|(i, (status, time))| timed(i as i64, *status, time.map(f64::from)))
                .collect();
            rank_category(&mut entries);

            let ok_count = entries.iter().filter(|e| e.timing.status == ResultStatus::Ok).count();
            // Every OK entrant precedes every other status.
            for (index, entry) in entries.iter().enumerate() {
                prop_assert_eq!(entry.timing.status == ResultStatus::Ok, index < ok_count);
            }
            let positions: Vec<u32> = entries.iter().filter_map(|e| e.timing.position).collect();
            let expected: Vec<u32> = (1..=ok_count as u32).collect();
            prop_assert_eq!(positions, expected);
            for entry in &entries {
                if let Some(behind) = entry.timing.time_behind {
                    prop_assert!(behind >= 0.0);
                }
            }
        }
    }
}
