use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};

use crate::model::{
    CategoryResult, ClassInfo, ClassResult, Competition, DateAndOptionalTime, Event, Organisation,
    Person, PersonName, PersonRaceResult, PersonResult, ResultList, ResultsMode, SplitTime,
    TimedEntrant,
};

pub const IOF_VERSION: &str = "3.0";
pub const CREATOR: &str = concat!("rusty-orienteering v", env!("CARGO_PKG_VERSION"));

/// Assembles computed categories into a results list.
pub struct ResultsDocumentBuilder<'a> {
    competition: &'a Competition,
    created_at: DateTime<FixedOffset>,
}

impl<'a> ResultsDocumentBuilder<'a> {
    #[must_use]
    pub fn new(competition: &'a Competition) -> Self {
        Self {
            competition,
            created_at: Utc::now().with_timezone(&competition.utc_offset),
        }
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<FixedOffset>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Builds the document. Time behind and position are only emitted in complete mode.
    #[must_use]
    pub fn build(&self, mode: ResultsMode, categories: &[CategoryResult]) -> ResultList {
        let first_start = self.competition.first_start();
        ResultList {
            iof_version: IOF_VERSION.to_string(),
            create_time: self.created_at.to_rfc3339_opts(SecondsFormat::Secs, false),
            creator: CREATOR.to_string(),
            status: mode,
            event: Event {
                name: self.competition.name.clone(),
                start_time: match first_start {
                    Some(first_start) => DateAndOptionalTime {
                        date: first_start.date_naive().to_string(),
                        time: Some(first_start.format("%H:%M:%S%:z").to_string()),
                    },
                    None => DateAndOptionalTime {
                        date: self.competition.date.to_string(),
                        time: None,
                    },
                },
            },
            class_results: categories
                .iter()
                .map(|category| class_result(category, mode))
                .collect(),
        }
    }
}

fn class_result(category: &CategoryResult, mode: ResultsMode) -> ClassResult {
    ClassResult {
        class: ClassInfo {
            name: category.display_name.clone(),
            short_name: category.category.clone(),
        },
        person_results: category
            .entries
            .iter()
            .map(|entry| person_result(entry, mode))
            .collect(),
    }
}

fn person_result(entry: &TimedEntrant, mode: ResultsMode) -> PersonResult {
    let entrant = &entry.entrant;
    let timing = &entry.timing;
    let official = mode == ResultsMode::Complete;

    let mut split_times: Vec<SplitTime> = timing
        .split_times
        .iter()
        .filter(|(station, _)| station.is_split_control())
        .map(|(station, time)| SplitTime {
            control_code: station.to_string(),
            time: *time,
        })
        .collect();
    split_times.sort_by(|a, b| a.time.total_cmp(&b.time));

    PersonResult {
        person: Person {
            id: entrant.wre_id.clone(),
            name: PersonName {
                given: entrant.given_name.clone(),
                family: entrant.family_name.clone(),
            },
        },
        organisation: entrant.club.as_ref().map(|club| Organisation {
            name: club.name.clone(),
            short_name: club.short_name.clone(),
            country: entrant.country.clone(),
        }),
        result: PersonRaceResult {
            bib_number: entrant.start_number.to_string(),
            start_time: entry.start.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            time: timing.running_time,
            time_behind: if official { timing.time_behind } else { None },
            position: if official { timing.position } else { None },
            status: timing.status,
            split_times,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Club, ComputedTiming, Entrant, ResultStatus, StationCode};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn competition() -> Competition {
        Competition {
            name: "Spring Cup".into(),
            place: "Zagreb".into(),
            organizer: "OK Test".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
            first_start_offset: 36_000.0,
            utc_offset: FixedOffset::east_opt(2 * 3600).unwrap(),
        }
    }

    fn category(competition: &Competition) -> CategoryResult {
        let mut split_times = BTreeMap::new();
        split_times.insert(StationCode::normalize(15), 300.0);
        split_times.insert(StationCode::normalize(10), 290.0);
        split_times.insert(StationCode::normalize(12), 100.0);
        CategoryResult {
            category: "M21E".into(),
            display_name: "M21E".into(),
            entries: vec![TimedEntrant {
                entrant: Entrant {
                    start_number: 12,
                    given_name: "Ivo".into(),
                    family_name: "Kovac".into(),
                    chip_number: Some(1),
                    club: Some(Club {
                        name: "OK Vihor".into(),
                        short_name: Some("VIH".into()),
                    }),
                    country: Some("CRO".into()),
                    category: "M21E".into(),
                    start_time: Some(60.0),
                    finish_status: ResultStatus::Ok,
                    official_time: Some(1800.0),
                    wre_id: Some("WRE-12".into()),
                },
                start: competition.entrant_start(60.0).unwrap(),
                timing: ComputedTiming {
                    status: ResultStatus::Ok,
                    running_time: Some(1800.0),
                    finish_punch: None,
                    split_times,
                    time_behind: Some(0.0),
                    position: Some(1),
                },
            }],
        }
    }

    #[test]
    fn header_and_person_fields_follow_the_competition() {
        let competition = competition();
        let created = DateTime::parse_from_rfc3339("2024-05-04T12:00:00+02:00").unwrap();
        let doc = ResultsDocumentBuilder::new(&competition)
            .with_created_at(created)
            .build(ResultsMode::Complete, &[category(&competition)]);

        assert_eq!(doc.iof_version, "3.0");
        assert_eq!(doc.create_time, "2024-05-04T12:00:00+02:00");
        assert_eq!(doc.event.start_time.date, "2024-05-04");
        assert_eq!(doc.event.start_time.time.as_deref(), Some("10:00:00+02:00"));

        let person = &doc.class_results[0].person_results[0];
        assert_eq!(person.result.start_time, "2024-05-04T10:01:00+02:00");
        assert_eq!(person.result.position, Some(1));
        assert_eq!(person.result.time_behind, Some(0.0));
        assert_eq!(person.organisation.as_ref().unwrap().short_name.as_deref(), Some("VIH"));

        let codes: Vec<&str> =
            person.result.split_times.iter().map(|s| s.control_code.as_str()).collect();
        assert_eq!(codes, vec!["12", "15"]);
    }

    #[test]
    fn snapshot_mode_omits_official_fields() {
        let competition = competition();
        let doc = ResultsDocumentBuilder::new(&competition)
            .build(ResultsMode::Snapshot, &[category(&competition)]);
        let result = &doc.class_results[0].person_results[0].result;
        assert_eq!(doc.status, ResultsMode::Snapshot);
        assert_eq!(result.position, None);
        assert_eq!(result.time_behind, None);
        assert_eq!(result.time, Some(1800.0));
    }
}
