use chrono::FixedOffset;
use serde_json::Value;
use std::{fs, path::PathBuf};

/// # Errors
///
/// Will return `Err` if the file is not readable or is not a json roster export
pub fn check_readable_file_and_json(file: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(file);
    if !path.is_file() || fs::metadata(&path).is_err() {
        return Err(format!("The roster file '{file}' is not readable."));
    }
    let contents = fs::read_to_string(&path)
        .map_err(|e| format!("The roster file '{file}' is not readable: {e}"))?;
    let json: Value = serde_json::from_str(&contents)
        .map_err(|e| format!("The roster file '{file}' is not valid json: {e}"))?;
    validate_json_format(&json)?;
    Ok(path)
}

/// Validate the json file format
/// format we expect is this:
/// { "competition": { "name": "..",
///     "stages": { "1": { "date": "YYYY-MM-DD", "first_start": <seconds> } } }
/// , "official_categories": { "M21E": "Men", ... }
/// , "entrants": [{ "start_number": <int>, "first_name": "..", "last_name": "..",
///     "category": "..", "stages": { "1": {..} } }]
/// }
///
/// # Errors
///
/// Will return `Err` if the json is not in the correct format
fn validate_json_format(json: &Value) -> Result<(), String> {
    let Some(root) = json.as_object() else {
        return Err("The roster file is not a json object.".to_string());
    };
    let competition = root
        .get("competition")
        .and_then(Value::as_object)
        .ok_or_else(|| "The roster file has no 'competition' object.".to_string())?;
    if !competition.get("name").is_some_and(Value::is_string) {
        return Err("The competition has no 'name'.".to_string());
    }
    if !root.get("entrants").is_some_and(Value::is_array) {
        return Err("The roster file has no 'entrants' array.".to_string());
    }
    if let Some(official) = root.get("official_categories") {
        if !official.is_object() && !official.is_null() {
            return Err("'official_categories' must map category codes to divisions.".to_string());
        }
    }
    Ok(())
}

/// # Errors
///
/// Will return `Err` if the directory does not exist or cannot be written
pub fn check_writable_dir(dir: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(dir);
    let metadata = fs::metadata(&path)
        .map_err(|_| format!("The output directory '{dir}' does not exist."))?;
    if !metadata.is_dir() || metadata.permissions().readonly() {
        return Err(format!("The output directory '{dir}' is not writable."));
    }
    Ok(path)
}

/// Parses `+HH:MM`, `-HH:MM` or `Z`.
///
/// # Errors
///
/// Will return `Err` if the offset is malformed or out of range
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, String> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| "invalid offset".to_string());
    }
    let (sign, rest) = match value.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(format!("UTC offset '{value}' must start with + or -")),
    };
    let (hours, minutes) = rest
        .split_once(':')
        .ok_or_else(|| format!("UTC offset '{value}' must look like +HH:MM"))?;
    let hours: i32 = hours.parse().map_err(|_| format!("bad hours in UTC offset '{value}'"))?;
    let minutes: i32 = minutes.parse().map_err(|_| format!("bad minutes in UTC offset '{value}'"))?;
    if !(0..60).contains(&minutes) {
        return Err(format!("bad minutes in UTC offset '{value}'"));
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("UTC offset '{value}' is out of range"))
}
