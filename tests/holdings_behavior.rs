//! Behavior-driven tests for holdings fetching and normalization.
//!
//! These tests verify HOW the engine handles the provider's drifting
//! holdings formats: weight variants, per-row failures, schema drift,
//! and transient transport errors.

use std::sync::Arc;

use fundgrid_tests::*;

// =============================================================================
// Holdings: Weight Normalization
// =============================================================================

#[tokio::test]
async fn when_weights_arrive_in_mixed_formats_all_normalize_to_fractions() {
    // Given: One fund reporting the same weight three different ways
    let client = Arc::new(ScriptedHttpClient::new().route(
        "/000001/holdings",
        &holdings_body(
            "2024Q4",
            &[("600519", "3.46%"), ("000858", "3.46"), ("300750", "0.0346")],
        ),
    ));
    let engine = engine(client);

    // When: The holdings are fetched
    let outcome = engine.holdings(&fund("000001")).await;

    // Then: Every row carries the same decimal fraction
    let holdings = outcome.value().expect("usable outcome");
    assert_eq!(holdings.len(), 3);
    for holding in holdings {
        assert!(
            (holding.weight - 0.0346).abs() < 1e-12,
            "weight {} not normalized",
            holding.weight
        );
    }
}

// =============================================================================
// Holdings: Per-Row Failure Isolation
// =============================================================================

#[tokio::test]
async fn when_some_rows_are_bad_the_rest_survive_as_partial() {
    // Given: A fund with one unmappable code and one unparsable weight
    let client = Arc::new(ScriptedHttpClient::new().route(
        "/000001/holdings",
        &holdings_body(
            "2024Q4",
            &[("600519", "3.46%"), ("900001", "1.20%"), ("000858", "N/A")],
        ),
    ));
    let engine = engine(client);

    // When: The holdings are fetched
    let outcome = engine.holdings(&fund("000001")).await;

    // Then: The good row survives and both bad rows are recorded
    assert!(outcome.is_usable() && !outcome.is_success());
    let holdings = outcome.value().expect("usable outcome");
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].security_code.as_str(), "600519.SH");

    let failed: Vec<&str> = outcome.failures().iter().map(|f| f.item.as_str()).collect();
    assert_eq!(failed, vec!["900001", "000858"]);
}

#[tokio::test]
async fn when_every_row_is_bad_the_fund_fails_with_the_full_record() {
    // Given: A fund whose rows are all unparsable
    let client = Arc::new(ScriptedHttpClient::new().route(
        "/000001/holdings",
        &holdings_body("2024Q4", &[("600519", "N/A"), ("000858", "--")]),
    ));
    let engine = engine(client);

    // When: The holdings are fetched
    let outcome = engine.holdings(&fund("000001")).await;

    // Then: The outcome is a failure that still names every dropped row
    assert_eq!(outcome.error(), Some(&FetchError::AllRowsUnparsable));
    assert_eq!(outcome.failures().len(), 2);
    assert!(outcome.value().is_none());
}

#[tokio::test]
async fn when_one_fund_fails_its_siblings_in_the_batch_are_unaffected() {
    // Given: Three funds, the middle one with nothing parsable
    let client = Arc::new(
        ScriptedHttpClient::new()
            .route(
                "/000001/holdings",
                &holdings_body("2024Q4", &[("600519", "3.46%")]),
            )
            .route(
                "/110022/holdings",
                &holdings_body("2024Q4", &[("000858", "N/A")]),
            )
            .route(
                "/161725/holdings",
                &holdings_body("2024Q4", &[("300750", "2.10%")]),
            ),
    );
    let engine = engine(client);
    let funds = vec![fund("000001"), fund("110022"), fund("161725")];

    // When: All three are fetched as one batch
    let results = engine.holdings_batch(&funds, None).await;

    // Then: Each fund keeps its own outcome
    assert_eq!(results.len(), 3);
    assert!(results[&fund("000001")].is_success());
    assert!(results[&fund("161725")].is_success());
    assert_eq!(
        results[&fund("110022")].error(),
        Some(&FetchError::AllRowsUnparsable)
    );
}

// =============================================================================
// Holdings: Upstream Failure Modes
// =============================================================================

#[tokio::test]
async fn when_the_rows_field_disappears_the_call_fails_fast_as_schema_drift() {
    // Given: A holdings response that parses as JSON but lost its rows
    let client = Arc::new(
        ScriptedHttpClient::new().route("/000001/holdings", r#"{"data":{"period":"2024Q4"}}"#),
    );
    let engine = engine(client.clone());

    // When: The holdings are fetched
    let outcome = engine.holdings(&fund("000001")).await;

    // Then: Schema drift is surfaced after exactly one request, unretried
    assert!(matches!(
        outcome.error(),
        Some(FetchError::UpstreamSchemaChanged { .. })
    ));
    assert_eq!(client.requests_to("/000001/holdings"), 1);
}

#[tokio::test(start_paused = true)]
async fn when_the_upstream_blips_the_fetch_retries_and_succeeds() {
    // Given: A transport that fails twice before recovering
    let client = Arc::new(ScriptedHttpClient::new().route_sequence(
        "/000001/holdings",
        vec![
            Err(HttpError::new("connection refused")),
            Err(HttpError::new("connection refused")),
            Ok(HttpResponse::ok_json(holdings_body(
                "2024Q4",
                &[("600519", "3.46%")],
            ))),
        ],
    ));
    let engine = engine(client.clone());

    // When: The holdings are fetched once
    let outcome = engine.holdings(&fund("000001")).await;

    // Then: The third attempt wins and the caller never sees the blip
    assert!(outcome.is_success());
    assert_eq!(client.requests_to("/000001/holdings"), 3);
}
