use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ResultsError;

/// Station codes below this value are read at the finish line.
pub const FINISH_STATION_THRESHOLD: i64 = 10;

/// A timing station code, normalized on construction so every finish reading lands on `0`.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct StationCode(i64);

impl StationCode {
    pub const FINISH: StationCode = StationCode(0);

    #[must_use]
    pub fn normalize(raw: i64) -> Self {
        if raw < FINISH_STATION_THRESHOLD {
            Self::FINISH
        } else {
            Self(raw)
        }
    }

    #[must_use]
    pub fn value(self) -> i64 {
        self.0
    }

    #[must_use]
    pub fn is_finish(self) -> bool {
        self.0 == 0
    }

    /// Intermediate controls reported as split times. Station `10` is reserved and never is one.
    #[must_use]
    pub fn is_split_control(self) -> bool {
        self.0 > FINISH_STATION_THRESHOLD
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Punch {
    pub chip_number: i64,
    pub station: StationCode,
    pub stage: String,
    /// Unix seconds.
    pub timestamp: i64,
}

impl Punch {
    #[must_use]
    pub fn new(
        chip_number: i64,
        station_code: i64,
        timestamp: i64,
        stage: impl Into<String>,
    ) -> Self {
        Self {
            chip_number,
            station: StationCode::normalize(station_code),
            stage: stage.into(),
            timestamp,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultStatus {
    Active,
    #[serde(rename = "OK")]
    Ok,
    Disqualified,
    DidNotFinish,
    DidNotStart,
    MissingPunch,
}

impl ResultStatus {
    /// Decodes the roster's finish-type code.
    ///
    /// # Errors
    /// Returns `InvalidInput` for codes outside `0..=5`.
    pub fn from_code(code: i64) -> Result<Self, ResultsError> {
        match code {
            0 => Ok(ResultStatus::Active),
            1 => Ok(ResultStatus::Ok),
            2 => Ok(ResultStatus::Disqualified),
            3 => Ok(ResultStatus::DidNotFinish),
            4 => Ok(ResultStatus::DidNotStart),
            5 => Ok(ResultStatus::MissingPunch),
            other => Err(ResultsError::invalid_input(format!(
                "unknown finish status code {other}"
            ))),
        }
    }

    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            ResultStatus::Active => 0,
            ResultStatus::Ok => 1,
            ResultStatus::Disqualified => 2,
            ResultStatus::DidNotFinish => 3,
            ResultStatus::DidNotStart => 4,
            ResultStatus::MissingPunch => 5,
        }
    }

    /// Statuses that end an entrant's race without a valid result.
    #[must_use]
    pub fn is_terminal_failure(self) -> bool {
        !matches!(self, ResultStatus::Active | ResultStatus::Ok)
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultStatus::Active => "Active",
            ResultStatus::Ok => "OK",
            ResultStatus::Disqualified => "DISQ",
            ResultStatus::DidNotFinish => "DNF",
            ResultStatus::DidNotStart => "DNS",
            ResultStatus::MissingPunch => "MP",
        };
        write!(f, "{s}")
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResultsMode {
    Snapshot,
    Complete,
}

impl ResultsMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResultsMode::Snapshot => "snapshot",
            ResultsMode::Complete => "complete",
        }
    }
}

impl FromStr for ResultsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snapshot" => Ok(ResultsMode::Snapshot),
            "complete" | "official" => Ok(ResultsMode::Complete),
            other => Err(format!("unknown results mode '{other}', expected snapshot or complete")),
        }
    }
}

/// Per-stage attributes of a roster record, as kept by the timing database.
/// Times are hundredths of a second.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct StageAttributes {
    #[serde(default)]
    pub is_running: bool,
    pub chip_number: Option<i64>,
    pub start_time: Option<i64>,
    #[serde(default)]
    pub finish_type: i64,
    pub competition_time: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RosterRecord {
    pub start_number: i64,
    pub first_name: String,
    pub last_name: String,
    pub category: String,
    pub club_long_name: Option<String>,
    pub club_short_name: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub is_vacant: bool,
    pub wre_id: Option<String>,
    #[serde(default)]
    pub stages: BTreeMap<String, StageAttributes>,
}

impl RosterRecord {
    /// Projects the record onto one stage. Vacant places and entrants not running the stage
    /// yield `None`.
    ///
    /// # Errors
    /// Returns `InvalidInput` when the stage carries an unknown finish status code.
    pub fn for_stage(&self, stage: &str) -> Result<Option<Entrant>, ResultsError> {
        if self.is_vacant {
            return Ok(None);
        }
        let Some(attrs) = self.stages.get(stage) else {
            return Ok(None);
        };
        if !attrs.is_running {
            return Ok(None);
        }

        let club = self.club_long_name.as_ref().filter(|n| !n.is_empty()).map(|name| Club {
            name: name.clone(),
            short_name: self.club_short_name.clone(),
        });

        Ok(Some(Entrant {
            start_number: self.start_number,
            given_name: self.first_name.clone(),
            family_name: self.last_name.clone(),
            chip_number: attrs.chip_number,
            club,
            country: self.country.clone(),
            category: self.category.clone(),
            start_time: attrs.start_time.map(hundredths_to_seconds),
            finish_status: ResultStatus::from_code(attrs.finish_type)?,
            official_time: attrs.competition_time.filter(|t| *t > 0).map(hundredths_to_seconds),
            wre_id: self.wre_id.clone().filter(|id| !id.trim().is_empty()),
        }))
    }
}

#[must_use]
pub fn hundredths_to_seconds(value: i64) -> f64 {
    value as f64 / 100.0
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Club {
    pub name: String,
    pub short_name: Option<String>,
}

/// An entrant as seen for a single stage. Times are seconds.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Entrant {
    pub start_number: i64,
    pub given_name: String,
    pub family_name: String,
    pub chip_number: Option<i64>,
    pub club: Option<Club>,
    pub country: Option<String>,
    pub category: String,
    /// Offset from the first start of the stage.
    pub start_time: Option<f64>,
    pub finish_status: ResultStatus,
    pub official_time: Option<f64>,
    pub wre_id: Option<String>,
}

impl Entrant {
    #[must_use]
    pub fn name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }

    #[must_use]
    pub fn is_official_eligible(&self) -> bool {
        self.wre_id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }
}

/// Competition metadata for one stage.
#[derive(Clone, Debug, PartialEq)]
pub struct Competition {
    pub name: String,
    pub place: String,
    pub organizer: String,
    pub date: NaiveDate,
    /// Seconds after local midnight of `date`.
    pub first_start_offset: f64,
    pub utc_offset: FixedOffset,
}

impl Competition {
    /// The instant every entrant start time and punch is measured from. `None` when the stage
    /// date and offset fall outside the representable range.
    #[must_use]
    pub fn first_start(&self) -> Option<DateTime<FixedOffset>> {
        let local = self
            .date
            .and_time(NaiveTime::MIN)
            .checked_add_signed(seconds_delta(self.first_start_offset)?)?;
        let utc = local
            .checked_sub_signed(TimeDelta::seconds(i64::from(self.utc_offset.local_minus_utc())))?;
        Some(DateTime::from_naive_utc_and_offset(utc, self.utc_offset))
    }

    #[must_use]
    pub fn entrant_start(&self, start_time: f64) -> Option<DateTime<FixedOffset>> {
        self.first_start()?.checked_add_signed(seconds_delta(start_time)?)
    }
}

/// `None` for non-finite values or ones beyond what a `TimeDelta` holds.
#[must_use]
pub fn seconds_delta(seconds: f64) -> Option<TimeDelta> {
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}

/// Elapsed seconds between `start` and a unix timestamp.
#[must_use]
pub fn elapsed_since(start: DateTime<FixedOffset>, timestamp: i64) -> f64 {
    timestamp as f64 - start.timestamp_millis() as f64 / 1000.0
}

/// Timing derived from punches and the roster. Recomputed on every pass, never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct ComputedTiming {
    pub status: ResultStatus,
    pub running_time: Option<f64>,
    /// Elapsed time of the finish punch, when one was recorded.
    pub finish_punch: Option<f64>,
    pub split_times: BTreeMap<StationCode, f64>,
    pub time_behind: Option<f64>,
    pub position: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimedEntrant {
    pub entrant: Entrant,
    pub start: DateTime<FixedOffset>,
    pub timing: ComputedTiming,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryResult {
    /// Raw category code in snapshot mode, official division in complete mode.
    pub category: String,
    pub display_name: String,
    pub entries: Vec<TimedEntrant>,
}

/// One line of a live ranking at a single station.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LiveRankingEntry {
    pub start_number: i64,
    pub name: String,
    pub club: Option<String>,
    pub country: Option<String>,
    pub status: ResultStatus,
    pub competition_time: Option<f64>,
    pub position: Option<u32>,
}
