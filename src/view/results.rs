use maud::{DOCTYPE, Markup, html};

use crate::model::{CategoryResult, LiveRankingEntry, ResultsMode, StationCode};

/// `H:MM:SS` for times of an hour or more, `M:SS` below. Negative times keep their sign.
#[must_use]
pub fn format_running_time(seconds: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "" };
    let total = seconds.abs().round() as i64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{sign}{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{sign}{minutes}:{secs:02}")
    }
}

fn page(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
            }
            body { (body) }
        }
    }
}

#[must_use]
pub fn render_live_ranking(
    category: &str,
    station: StationCode,
    entries: &[LiveRankingEntry],
) -> Markup {
    let heading = if station.is_finish() {
        format!("{category} finish")
    } else {
        format!("{category} control {station}")
    };
    page(
        &heading,
        html! {
            h3 { (heading) }
            table class="styled-table" {
                thead {
                    tr {
                        th { "PLACE" }
                        th { "NAME" }
                        th { "CLUB" }
                        th { "TIME" }
                    }
                }
                tbody {
                    @for entry in entries {
                        tr {
                            td {
                                @if let Some(p) = entry.position {
                                    (p) "."
                                } @else {
                                    (entry.status)
                                }
                            }
                            td { (entry.name) }
                            td { (entry.club.as_deref().unwrap_or("")) }
                            td {
                                @if let Some(t) = entry.competition_time {
                                    (format_running_time(t))
                                }
                            }
                        }
                    }
                    @if entries.is_empty() {
                        tr { td colspan="4" { "No punches yet" } }
                    }
                }
            }
        },
    )
}

#[must_use]
pub fn render_category(result: &CategoryResult, mode: ResultsMode) -> Markup {
    let official = mode == ResultsMode::Complete;
    page(
        &result.display_name,
        html! {
            h3 { (result.display_name) }
            table class="styled-table" {
                thead {
                    tr {
                        @if official { th { "PLACE" } }
                        th { "NAME" }
                        th { "CLUB" }
                        th { "STATUS" }
                        th { "TIME" }
                        @if official { th { "BEHIND" } }
                    }
                }
                tbody {
                    @for entry in &result.entries {
                        tr {
                            @if official {
                                td { @if let Some(p) = entry.timing.position { (p) "." } }
                            }
                            td { (entry.entrant.name()) }
                            td { (entry.entrant.club.as_ref().map_or("", |c| c.name.as_str())) }
                            td { (entry.timing.status) }
                            td {
                                @if let Some(t) = entry.timing.running_time {
                                    (format_running_time(t))
                                }
                            }
                            @if official {
                                td {
                                    @if let Some(b) = entry.timing.time_behind {
                                        "+" (format_running_time(b))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}
