//! End-to-end tests for the statistics job
//!
//! Each test drives a full run (read, join, aggregate, materialize, report)
//! against the in-memory store.

use chrono::NaiveDate;
use contrib_stats::stats::{Opportunity, PipelineOptions, Proposal, SuggestionStatus};
use contrib_stats::storage::{MemoryStore, TranslationContributionRecord};
use contrib_stats::{RunOutcome, StatsError, StatsJob};

fn proposal(
    id: &str,
    target: &str,
    status: SuggestionStatus,
    edited: bool,
    html: &str,
) -> Proposal {
    Proposal {
        id: id.to_string(),
        suggestion_type: "translate_content".to_string(),
        target_id: target.to_string(),
        language_code: "es".to_string(),
        author_id: "u1".to_string(),
        status,
        edited_by_reviewer: edited,
        content_html: html.to_string(),
        last_updated: "2024-01-05T09:30:00Z".to_string(),
        deleted: false,
    }
}

fn opportunity(id: &str, topic: &str) -> Opportunity {
    Opportunity {
        id: id.to_string(),
        topic_id: topic.to_string(),
        deleted: false,
    }
}

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

/// Serialized statistics of stored records, without their timestamps
fn stored_stats(records: &[TranslationContributionRecord]) -> String {
    let stats: Vec<_> = records.iter().cloned().map(|r| r.into_stats()).collect();
    serde_json::to_string(&stats).unwrap()
}

async fn run(store: &MemoryStore) -> contrib_stats::Result<contrib_stats::RunSummary> {
    StatsJob::new(PipelineOptions::default())
        .run(store, store)
        .await
}

fn assert_single_accepted(record: &TranslationContributionRecord) {
    assert_eq!(record.submitted_translations_count, 1);
    assert_eq!(record.submitted_translation_word_count, 2);
    assert_eq!(record.accepted_translations_count, 1);
    assert_eq!(record.accepted_translations_without_reviewer_edits_count, 1);
    assert_eq!(record.accepted_translation_word_count, 2);
    assert_eq!(record.rejected_translations_count, 0);
    assert_eq!(record.rejected_translation_word_count, 0);
    assert_eq!(record.contribution_dates, vec![jan(5)]);
}

#[tokio::test]
async fn test_single_accepted_proposal_with_topic() {
    let store = MemoryStore::new(
        vec![proposal("s1", "exp1", SuggestionStatus::Accepted, false, "<p>hi there</p>")],
        vec![opportunity("exp1", "t1")],
    );

    let started = chrono::Utc::now();
    let summary = run(&store).await.unwrap();

    assert_eq!(summary.records_produced, 1);
    let record = store.record("es.u1.t1").await.expect("record for es.u1.t1");
    assert!(record.last_updated >= started);
    assert_eq!(record.language_code, "es");
    assert_eq!(record.contributor_user_id, "u1");
    assert_eq!(record.topic_id, "t1");
    assert_single_accepted(&record);
}

#[tokio::test]
async fn test_unmatched_proposal_gets_empty_topic() {
    let store = MemoryStore::new(
        vec![proposal("s1", "exp1", SuggestionStatus::Accepted, false, "<p>hi there</p>")],
        vec![opportunity("other", "t9")],
    );

    let summary = run(&store).await.unwrap();

    assert_eq!(summary.records_produced, 1);
    assert_eq!(summary.report.matched_targets, 0);
    let record = store.record("es.u1.").await.expect("record for es.u1.");
    assert_eq!(record.topic_id, "");
    assert_single_accepted(&record);
}

#[tokio::test]
async fn test_accepted_and_rejected_share_key() {
    let mut rejected = proposal(
        "s2",
        "exp1",
        SuggestionStatus::Rejected,
        false,
        "<p>one two three four five</p>",
    );
    rejected.last_updated = "2024-01-06 14:00:00".to_string();

    let store = MemoryStore::new(
        vec![
            proposal("s1", "exp1", SuggestionStatus::Accepted, true, "<b>a</b> b c"),
            rejected,
        ],
        vec![opportunity("exp1", "t1")],
    );

    run(&store).await.unwrap();

    let record = store.record("es.u1.t1").await.unwrap();
    assert_eq!(record.submitted_translations_count, 2);
    assert_eq!(record.submitted_translation_word_count, 8);
    assert_eq!(record.accepted_translations_count, 1);
    assert_eq!(record.accepted_translations_without_reviewer_edits_count, 0);
    assert_eq!(record.accepted_translation_word_count, 3);
    assert_eq!(record.rejected_translations_count, 1);
    assert_eq!(record.rejected_translation_word_count, 5);
    assert_eq!(record.contribution_dates, vec![jan(5), jan(6)]);
}

#[tokio::test]
async fn test_no_relevant_proposals_reports_zero() {
    let mut question = proposal("s1", "exp1", SuggestionStatus::Accepted, false, "x");
    question.suggestion_type = "add_question".to_string();
    let store = MemoryStore::new(vec![question], vec![opportunity("exp1", "t1")]);

    let summary = run(&store).await.unwrap();

    assert_eq!(summary.records_produced, 0);
    assert_eq!(summary.outcome(), RunOutcome::NoRecords);
    assert_eq!(summary.to_string(), "SUCCESS 0");
    assert!(store.records().await.is_empty());
    assert_eq!(store.summaries().await, vec![0]);
}

#[tokio::test]
async fn test_duplicate_opportunity_fails_without_output() {
    let store = MemoryStore::new(
        vec![proposal("s1", "exp1", SuggestionStatus::Accepted, false, "x")],
        vec![opportunity("exp1", "t1"), opportunity("exp1", "t2")],
    );

    let err = run(&store).await.unwrap_err();

    assert!(err.is_data_integrity());
    match err {
        StatsError::DuplicateOpportunity { id, occurrences } => {
            assert_eq!(id, "exp1");
            assert_eq!(occurrences, 2);
        }
        other => panic!("Expected DuplicateOpportunity, got {other:?}"),
    }
    assert!(store.write_attempts().await.is_empty());
    assert!(store.summaries().await.is_empty());
}

#[tokio::test]
async fn test_rerun_replaces_records_identically() {
    let proposals = vec![
        proposal("s1", "exp1", SuggestionStatus::Accepted, false, "<p>hi there</p>"),
        proposal("s2", "exp2", SuggestionStatus::Rejected, false, "<p>nope</p>"),
        proposal("s3", "exp3", SuggestionStatus::InReview, false, "<p>pending</p>"),
    ];
    let opportunities = vec![opportunity("exp1", "t1"), opportunity("exp2", "t1")];
    let store = MemoryStore::new(proposals, opportunities);

    run(&store).await.unwrap();
    let first = store.records().await;
    run(&store).await.unwrap();
    let second = store.records().await;

    assert_eq!(stored_stats(&first), stored_stats(&second));
    assert!(first
        .iter()
        .zip(&second)
        .all(|(a, b)| a.id == b.id && b.last_updated >= a.last_updated));
    assert_eq!(store.summaries().await, vec![2, 2]);
}

#[tokio::test]
async fn test_records_from_earlier_runs_are_replaced_not_merged() {
    let store = MemoryStore::new(
        vec![proposal("s1", "exp1", SuggestionStatus::Accepted, false, "<p>hi there</p>")],
        vec![opportunity("exp1", "t1")],
    );
    let mut stale = TranslationContributionRecord::from_stats(
        &"es.u1.t1".parse().unwrap(),
        &contrib_stats::stats::AggregateStats::empty(&"es.u1.t1".parse().unwrap()),
        chrono::Utc::now(),
    );
    stale.submitted_translations_count = 40;
    store.seed_record(stale).await;

    run(&store).await.unwrap();

    let record = store.record("es.u1.t1").await.unwrap();
    assert_single_accepted(&record);
}

#[tokio::test]
async fn test_malformed_records_do_not_abort_run() {
    let mut bad_date = proposal("s1", "exp1", SuggestionStatus::Accepted, false, "x");
    bad_date.last_updated = "05/01/2024".to_string();
    let broken_markup = proposal(
        "s2",
        "exp1",
        SuggestionStatus::Accepted,
        false,
        "<p class=\"unterminated>some words",
    );
    let store = MemoryStore::new(vec![bad_date, broken_markup], vec![opportunity("exp1", "t1")]);

    let summary = run(&store).await.unwrap();

    assert_eq!(summary.records_produced, 1);
    assert_eq!(summary.report.records_skipped, 1);
    let record = store.record("es.u1.t1").await.unwrap();
    assert_eq!(record.submitted_translations_count, 1);
    assert_eq!(record.submitted_translation_word_count, 3);
}

#[tokio::test]
async fn test_colliding_keys_fail_before_any_write() {
    let mut first = proposal("s1", "exp1", SuggestionStatus::Accepted, false, "<p>one</p>");
    first.language_code = "a.b".to_string();
    first.author_id = "c".to_string();
    let mut second = proposal("s2", "exp2", SuggestionStatus::Accepted, false, "<p>two</p>");
    second.language_code = "a".to_string();
    second.author_id = "b.c".to_string();
    let store = MemoryStore::new(vec![first, second], vec![]);

    let err = run(&store).await.unwrap_err();

    assert!(err.is_data_integrity());
    assert!(matches!(err, StatsError::UnrepresentableKey { ref id } if id == "a.b.c."));
    assert!(store.write_attempts().await.is_empty());
    assert!(store.summaries().await.is_empty());
}
