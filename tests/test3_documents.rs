mod common;
use crate::common::{
    MIDNIGHT_STAGE, STAGE, fixture_roster, setup_test_context, setup_test_context_with,
    stage_start,
};

use rusty_orienteering::model::{Punch, ResultList, ResultStatus, ResultsMode};
use rusty_orienteering::storage::PunchStore;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn bibs(document: &ResultList, class: &str) -> Vec<String> {
    document
        .class(class)
        .map(|c| c.person_results.iter().map(|p| p.result.bib_number.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test3_document_header() -> TestResult {
    let ctx = setup_test_context();
    let document = ctx.service.build_document(STAGE, ResultsMode::Snapshot).await?;

    assert_eq!(document.iof_version, "3.0");
    assert_eq!(document.status, ResultsMode::Snapshot);
    assert_eq!(document.event.name, "Spring Cup");
    assert_eq!(document.event.start_time.date, "2024-05-04");
    assert_eq!(document.event.start_time.time.as_deref(), Some("10:00:00+02:00"));

    let json = serde_json::to_value(&document)?;
    assert_eq!(json["iofVersion"], "3.0");
    assert_eq!(json["status"], "snapshot");
    assert!(json["classResults"].is_array());
    Ok(())
}

#[tokio::test]
async fn test3_complete_mode_lists_only_official_entrants() -> TestResult {
    let ctx = setup_test_context();
    ctx.women_elite_finished().await;

    let snapshot = ctx.service.build_document(STAGE, ResultsMode::Snapshot).await?;
    let classes: Vec<&str> = snapshot.class_results.iter().map(|c| c.class.name.as_str()).collect();
    assert_eq!(classes, vec!["W21E", "M21E", "M35"]);
    assert_eq!(bibs(&snapshot, "W21E"), vec!["101", "102", "103", "104", "105"]);
    let ana = &snapshot.class("W21E").expect("W21E").person_results[0];
    assert_eq!(ana.result.position, None);
    assert_eq!(ana.result.time_behind, None);
    assert_eq!(ana.result.start_time, "2024-05-04T10:00:00+02:00");

    let complete = ctx.service.build_document(STAGE, ResultsMode::Complete).await?;
    let classes: Vec<&str> = complete.class_results.iter().map(|c| c.class.name.as_str()).collect();
    assert_eq!(classes, vec!["Women", "Men"]);
    assert_eq!(bibs(&complete, "Women"), vec!["102", "104", "101", "103"]);

    let women = complete.class("Women").expect("Women");
    assert_eq!(women.person_results[0].person.id.as_deref(), Some("WRE-102"));
    assert_eq!(women.person_results[0].result.position, Some(1));
    assert_eq!(women.person_results[2].result.time_behind, Some(20.0));
    assert_eq!(women.person_results[3].result.status, ResultStatus::DidNotFinish);
    assert_eq!(women.person_results[3].result.position, None);
    Ok(())
}

#[tokio::test]
async fn test3_only_real_controls_become_splits() -> TestResult {
    let ctx = setup_test_context();
    ctx.punch_at(6001, 15, STAGE, 300).await;
    ctx.punch_at(6001, 42, STAGE, 540).await;
    // Station 5 is a finish unit.
    ctx.punch_at(6001, 5, STAGE, 900).await;

    let document = ctx.service.build_document(STAGE, ResultsMode::Snapshot).await?;
    let ivan = &document.class("M21E").expect("M21E").person_results[0];
    let splits: Vec<(&str, f64)> = ivan
        .result
        .split_times
        .iter()
        .map(|s| (s.control_code.as_str(), s.time))
        .collect();
    assert_eq!(splits, vec![("15", 300.0), ("42", 540.0)]);
    assert_eq!(ivan.result.time, Some(900.0));
    assert_eq!(ivan.result.status, ResultStatus::Ok);
    Ok(())
}

#[tokio::test]
async fn test3_single_finisher_round_trip() -> TestResult {
    let ctx = setup_test_context();
    ctx.punch_at(6001, 0, MIDNIGHT_STAGE, 3661).await;

    let document = ctx.service.build_document(MIDNIGHT_STAGE, ResultsMode::Complete).await?;
    let men = document.class("Men").expect("Men");
    assert_eq!(men.person_results.len(), 1);

    let result = &men.person_results[0].result;
    assert_eq!(result.time, Some(3661.0));
    assert_eq!(result.position, Some(1));
    assert_eq!(result.time_behind, Some(0.0));
    assert_eq!(result.start_time, "2024-05-05T00:00:00+02:00");

    let html = rusty_orienteering::view::results::render_category(
        &ctx.service.compute_category_results("Men", MIDNIGHT_STAGE, ResultsMode::Complete).await?,
        ResultsMode::Complete,
    )
    .into_string();
    assert!(html.contains("1:01:01"));
    Ok(())
}

#[tokio::test]
async fn test3_single_person_document_includes_the_new_punch() -> TestResult {
    let ctx = setup_test_context();
    ctx.punch_at(6001, 15, STAGE, 300).await;

    let finish = stage_start(STAGE) + 900;
    let document = ctx.service.build_single_person_document(6001, 0, finish, STAGE).await?;
    assert_eq!(document.status, ResultsMode::Snapshot);
    assert_eq!(document.class_results.len(), 1);

    let men = document.class("M21E").expect("M21E");
    assert_eq!(men.person_results.len(), 1);
    let ivan = &men.person_results[0];
    assert_eq!(ivan.person.name.family, "Peric");
    assert_eq!(ivan.result.time, Some(900.0));
    assert_eq!(ivan.result.split_times.len(), 1);

    // Building the document does not store the punch.
    let stored = ctx.punches.punches_for(6001, STAGE).await?;
    assert_eq!(stored.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test3_ingested_punches_are_published() -> TestResult {
    let ctx = setup_test_context();
    let mut rx = ctx.service.subscribe();

    let punch = Punch::new(5001, 0, stage_start(STAGE) + 120, STAGE);
    let document = ctx.service.ingest_punch(punch).await?.expect("Ana runs with chip 5001");
    let published = rx.recv().await?;
    assert_eq!(published, document);
    assert_eq!(bibs(&document, "W21E"), vec!["101"]);

    let stray = Punch::new(9999, 31, stage_start(STAGE) + 10, STAGE);
    assert!(ctx.service.ingest_punch(stray).await?.is_none());
    assert!(rx.try_recv().is_err());
    assert_eq!(ctx.punches.len().await, 2);
    Ok(())
}

#[tokio::test]
async fn test3_absurd_start_time_leaves_the_rest_of_the_document() -> TestResult {
    let mut roster = fixture_roster();
    let ana = roster
        .entrants
        .iter_mut()
        .find(|e| e.start_number == 101)
        .expect("Ana is in the fixture");
    if let Some(stage) = ana.stages.get_mut(STAGE) {
        stage.start_time = Some(9_000_000_000_000_000);
    }
    let ctx = setup_test_context_with(roster);
    ctx.women_elite_finished().await;

    // Run on its own task so a panic would surface as a join error.
    let service = ctx.service.clone();
    let snapshot = tokio::spawn(async move {
        service.build_document(STAGE, ResultsMode::Snapshot).await
    })
    .await??;
    assert_eq!(bibs(&snapshot, "W21E"), vec!["102", "103", "104", "105"]);
    assert_eq!(bibs(&snapshot, "M21E"), vec!["201"]);

    let complete = ctx.service.build_document(STAGE, ResultsMode::Complete).await?;
    assert_eq!(bibs(&complete, "Women"), vec!["102", "104", "103"]);

    let ranking = ctx.service.compute_live_station_ranking("W21E", STAGE, 0).await?;
    let order: Vec<i64> = ranking.iter().map(|e| e.start_number).collect();
    assert_eq!(order, vec![104]);
    Ok(())
}
