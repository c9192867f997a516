use ahash::RandomState;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::model::{CategoryResult, TimedEntrant};

/// Built-in merge of elite category codes into the divisions of an official ranking export.
const DEFAULT_OFFICIAL_CATEGORIES: &[(&str, &str)] = &[
    ("M21E", "Men"),
    ("M21", "Men"),
    ("H21E", "Men"),
    ("MOPEN", "Men"),
    ("W21E", "Women"),
    ("W21", "Women"),
    ("D21E", "Women"),
    ("WOPEN", "Women"),
];

/// Lookup table from raw category code to official division.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficialCategories {
    table: BTreeMap<String, String>,
}

impl Default for OfficialCategories {
    fn default() -> Self {
        Self::new(
            DEFAULT_OFFICIAL_CATEGORIES
                .iter()
                .map(|(code, division)| ((*code).to_string(), (*division).to_string()))
                .collect(),
        )
    }
}

impl OfficialCategories {
    #[must_use]
    pub fn new(table: BTreeMap<String, String>) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn division(&self, category: &str) -> Option<&str> {
        self.table.get(category).map(String::as_str)
    }

    #[must_use]
    pub fn is_division(&self, name: &str) -> bool {
        self.table.values().any(|d| d == name)
    }

    /// Resolves either a raw code or a division name to the division.
    #[must_use]
    pub fn resolve<'a>(&'a self, category: &'a str) -> Option<&'a str> {
        self.division(category)
            .or_else(|| self.is_division(category).then_some(category))
    }
}

/// Order-preserving grouping: buckets appear in first-seen order and keep roster order inside.
fn group_by<F>(entries: Vec<TimedEntrant>, mut key: F) -> Vec<CategoryResult>
where
    F: FnMut(&TimedEntrant) -> Option<String>,
{
    let mut index: HashMap<String, usize, RandomState> = HashMap::default();
    let mut groups: Vec<CategoryResult> = Vec::new();

    for entry in entries {
        let Some(category) = key(&entry) else {
            continue;
        };
        let slot = *index.entry(category.clone()).or_insert_with(|| {
            groups.push(CategoryResult {
                category: category.clone(),
                display_name: category.clone(),
                entries: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].entries.push(entry);
    }

    groups
}

/// Groups by the roster's raw category.
#[must_use]
pub fn partition_snapshot(entries: Vec<TimedEntrant>) -> Vec<CategoryResult> {
    group_by(entries, |entry| Some(entry.entrant.category.clone()))
}

/// Groups official-eligible entrants into divisions. Entrants without an external ranking id or
/// whose category has no division are dropped.
#[must_use]
pub fn partition_official(
    entries: Vec<TimedEntrant>,
    official: &OfficialCategories,
) -> Vec<CategoryResult> {
    group_by(entries, |entry| {
        if !entry.entrant.is_official_eligible() {
            return None;
        }
        let division = official.division(&entry.entrant.category);
        if division.is_none() {
            warn!(
                start_number = entry.entrant.start_number,
                category = %entry.entrant.category,
                "Category has no official division, leaving entrant out"
            );
        }
        division.map(str::to_string)
    })
}
