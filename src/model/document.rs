//! Logical structure of a results list, laid out after the IOF 3.0 `ResultList`.

use serde::{Deserialize, Serialize};

use super::types::{ResultStatus, ResultsMode};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultList {
    pub iof_version: String,
    pub create_time: String,
    pub creator: String,
    pub status: ResultsMode,
    pub event: Event,
    pub class_results: Vec<ClassResult>,
}

impl ResultList {
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassResult> {
        self.class_results.iter().find(|c| c.class.name == name)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub name: String,
    pub start_time: DateAndOptionalTime,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DateAndOptionalTime {
    pub date: String,
    pub time: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassResult {
    pub class: ClassInfo,
    pub person_results: Vec<PersonResult>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub name: String,
    pub short_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonResult {
    pub person: Person,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organisation: Option<Organisation>,
    pub result: PersonRaceResult,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Person {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: PersonName,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PersonName {
    pub given: String,
    pub family: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Organisation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonRaceResult {
    pub bib_number: String,
    pub start_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_behind: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    pub status: ResultStatus,
    #[serde(default)]
    pub split_times: Vec<SplitTime>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SplitTime {
    pub control_code: String,
    pub time: f64,
}
