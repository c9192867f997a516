#![allow(dead_code)]

use chrono::{DateTime, FixedOffset};
use serde_json::json;
use std::sync::Arc;

use rusty_orienteering::model::Punch;
use rusty_orienteering::score::ResultsService;
use rusty_orienteering::storage::{JsonRosterProvider, MemoryPunchStore, PunchStore, RosterFile};

pub const STAGE: &str = "1";
/// Starts at local midnight so start offsets equal elapsed time.
pub const MIDNIGHT_STAGE: &str = "2";

pub struct TestContext {
    pub service: Arc<ResultsService>,
    pub punches: Arc<MemoryPunchStore>,
}

pub fn venue_offset() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).expect("valid offset")
}

/// Unix seconds of a stage's first start.
pub fn stage_start(stage: &str) -> i64 {
    let local = match stage {
        STAGE => "2024-05-04T10:00:00+02:00",
        MIDNIGHT_STAGE => "2024-05-05T00:00:00+02:00",
        other => panic!("no fixture stage {other}"),
    };
    DateTime::parse_from_rfc3339(local).expect("fixture date").timestamp()
}

fn running(chip: i64, start_hundredths: i64) -> serde_json::Value {
    json!({ "is_running": true, "chip_number": chip, "start_time": start_hundredths })
}

/// Women's elite has A (start 0s, punches 120s), B (official 100s), C (DNF), D (start 180s,
/// punches 110s) and E, who has a blank ranking id. Ivan runs both stages.
pub fn fixture_roster() -> RosterFile {
    let value = json!({
        "competition": {
            "name": "Spring Cup",
            "place": "Samobor",
            "organizer": "OK Vihor",
            "stages": {
                "1": { "date": "2024-05-04", "first_start": 36000.0 },
                "2": { "date": "2024-05-05", "first_start": 0.0 }
            }
        },
        "entrants": [
            {
                "start_number": 101, "first_name": "Ana", "last_name": "Horvat",
                "category": "W21E", "club_long_name": "OK Vihor", "club_short_name": "VIH",
                "country": "CRO", "wre_id": "WRE-101",
                "stages": { "1": running(5001, 0) }
            },
            {
                "start_number": 102, "first_name": "Bea", "last_name": "Kranjc",
                "category": "W21E", "club_long_name": "OK Kapela", "club_short_name": null,
                "country": "SLO", "wre_id": "WRE-102",
                "stages": { "1": {
                    "is_running": true, "chip_number": 5002, "start_time": 6000,
                    "finish_type": 1, "competition_time": 10000
                } }
            },
            {
                "start_number": 103, "first_name": "Cvita", "last_name": "Zoric",
                "category": "W21E", "club_long_name": null, "club_short_name": null,
                "country": "CRO", "wre_id": "WRE-103",
                "stages": { "1": {
                    "is_running": true, "chip_number": 5003, "start_time": 12000,
                    "finish_type": 3
                } }
            },
            {
                "start_number": 104, "first_name": "Dora", "last_name": "Babic",
                "category": "W21E", "club_long_name": "OK Vihor", "club_short_name": "VIH",
                "country": "CRO", "wre_id": "WRE-104",
                "stages": { "1": running(5004, 18000) }
            },
            {
                "start_number": 105, "first_name": "Ema", "last_name": "Kovac",
                "category": "W21E", "club_long_name": "OK Vihor", "club_short_name": "VIH",
                "country": "CRO", "wre_id": "  ",
                "stages": { "1": running(5005, 24000) }
            },
            {
                "start_number": 199, "first_name": "", "last_name": "",
                "category": "W21E", "club_long_name": null, "club_short_name": null,
                "country": null, "wre_id": null, "is_vacant": true,
                "stages": { "1": running(5099, 30000) }
            },
            {
                "start_number": 201, "first_name": "Ivan", "last_name": "Peric",
                "category": "M21E", "club_long_name": "OK Kapela", "club_short_name": "KAP",
                "country": "CRO", "wre_id": "WRE-201",
                "stages": { "1": running(6001, 0), "2": running(6001, 0) }
            },
            {
                "start_number": 202, "first_name": "Luka", "last_name": "Novak",
                "category": "M21E", "club_long_name": null, "club_short_name": null,
                "country": "CRO", "wre_id": "WRE-202",
                "stages": { "1": { "is_running": false, "chip_number": 6002, "start_time": 0 } }
            },
            {
                "start_number": 301, "first_name": "Marko", "last_name": "Juric",
                "category": "M35", "club_long_name": "OK Vihor", "club_short_name": "VIH",
                "country": "CRO", "wre_id": "WRE-301",
                "stages": { "1": running(7001, 6000) }
            }
        ]
    });
    serde_json::from_value(value).expect("fixture roster")
}

pub fn setup_test_context() -> TestContext {
    setup_test_context_with(fixture_roster())
}

pub fn setup_test_context_with(roster: RosterFile) -> TestContext {
    let punches = Arc::new(MemoryPunchStore::new());
    let roster = Arc::new(JsonRosterProvider::from_roster(roster, venue_offset()));
    let service = Arc::new(ResultsService::new(punches.clone(), roster));
    TestContext {
        service,
        punches,
    }
}

impl TestContext {
    /// Stores a punch `elapsed` seconds after the stage's first start.
    pub async fn punch_at(&self, chip: i64, station: i64, stage: &str, elapsed: i64) {
        let punch = Punch::new(chip, station, stage_start(stage) + elapsed, stage);
        self.punches.record(&punch).await.expect("memory store");
    }

    /// The usual women's elite picture: A finishes at 120s, D at 110s after her 180s start.
    pub async fn women_elite_finished(&self) {
        self.punch_at(5001, 0, STAGE, 120).await;
        self.punch_at(5004, 0, STAGE, 180 + 110).await;
    }
}
