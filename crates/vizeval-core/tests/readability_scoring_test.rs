//! Judge-scored readability flowing from the pipeline into the global scores.

mod common;

use std::sync::Arc;

use common::*;
use vizeval_core::judge::ReadabilityJudge;
use vizeval_core::providers::llm::{ContentPart, FakeClient};
use vizeval_core::scoring::{PASS_RATE, QUALITY_SCORE, READABILITY_SCORE};
use vizeval_core::storage::MemoryBlobStore;
use vizeval_core::{score, Aspect, Coordinator};

#[tokio::test]
async fn three_passing_tests_average_their_readability() {
    let client = Arc::new(FakeClient::new("judge".into()).with_queue([
        r#"{"Rationale": "clean axes", "Score": 4}"#,
        r#"Here you go: {"Rationale": "excellent", "Score": 5}"#,
        "```json\n{\n  \"Rationale\": \"crowded labels\"\n  \"Score\": 3\n}\n```",
    ]));
    let mut suite = suite();
    suite.readability = Some(Arc::new(ReadabilityJudge::new(client.clone())));

    let tests = vec![
        test_case("r0", "college", "Count departments per building", "bar"),
        test_case("r1", "college", "Average budget per department", "bar"),
        test_case("r2", "flights", "Flights per airline", "bar"),
    ];
    let coordinator = Coordinator::new(
        pipeline(Arc::new(MemoryBlobStore::new()), suite),
        Arc::new(StubFactory::default()),
    );
    let records = coordinator.evaluate_all(&tests, 1, None).await;

    let readability: Vec<f64> = records
        .iter()
        .map(|r| r.readability_value())
        .collect();
    assert_eq!(readability, vec![4.0, 5.0, 3.0]);
    assert_eq!(
        records[0].results.last().map(|r| r.aspect),
        Some(Aspect::Readability)
    );

    let scores = score(&records);
    assert_eq!(scores[PASS_RATE], 1.0);
    assert_eq!(scores[READABILITY_SCORE], 4.0);
    assert_eq!(scores[QUALITY_SCORE], 4.0);

    let sent = client.requests();
    assert_eq!(sent.len(), 3);
    assert!(matches!(&sent[0].parts[1], ContentPart::ImageUrl(url) if url.starts_with("data:image/svg+xml;base64,")));
}

#[tokio::test]
async fn failing_tests_never_reach_the_judge() {
    let client = Arc::new(FakeClient::new("judge".into()).with_response(
        r#"{"Rationale": "fine", "Score": 5}"#.to_string(),
    ));
    let mut suite = suite();
    suite.readability = Some(Arc::new(ReadabilityJudge::new(client.clone())));

    let tests = vec![
        test_case("ok", "college", "Count departments per building", "bar"),
        test_case("pie", "college", "Share of budget", "pie"),
    ];
    let records = Coordinator::new(
        pipeline(Arc::new(MemoryBlobStore::new()), suite),
        Arc::new(StubFactory::default()),
    )
    .evaluate_all(&tests, 2, None)
    .await;

    assert_eq!(client.requests().len(), 1);
    let scores = score(&records);
    assert_eq!(scores[PASS_RATE], 0.5);
    assert_eq!(scores[READABILITY_SCORE], 5.0);
    assert_eq!(scores[QUALITY_SCORE], 2.5);
}
