use std::sync::Arc;
use std::time::Duration;

use queueline_core::{CancelToken, PlayerRecord, PlayerStatus, Position, Roster};
use queueline_mock_surface::{MockEvent, MockRow, MockSurface};
use queueline_recon::{ReconConfig, ReconEngine, ReconciliationOutcome};
use queueline_resolve::MatchOptions;

fn fast_config() -> ReconConfig {
    ReconConfig {
        inter_op_delay: Duration::from_millis(1),
        settle_delay: Duration::from_millis(1),
        ..ReconConfig::default()
    }
}

fn engine(surface: &Arc<MockSurface>) -> ReconEngine {
    ReconEngine::new(surface.clone(), fast_config())
}

fn player(id: &str, first: &str, last: &str) -> PlayerRecord {
    PlayerRecord::new(id)
        .with_name(first, last)
        .with_position(Position::Quarterback)
        .with_status(PlayerStatus::Active)
}

fn pool() -> Vec<MockRow> {
    vec![
        MockRow::new("mahomes", "Patrick Mahomes QB KC"),
        MockRow::new("allen", "Josh Allen QB BUF"),
        MockRow::new("kelce", "Travis Kelce TE KC"),
    ]
}

#[tokio::test]
async fn add_through_a_directly_rendered_trigger() {
    let surface = Arc::new(MockSurface::new().with_pool(pool()));
    let engine = engine(&surface);
    let summary = engine
        .add_players(&[player("1", "Josh", "Allen")], &CancelToken::new())
        .await;
    assert_eq!(summary.len(), 1);
    assert_eq!(summary.items[0].outcome, ReconciliationOutcome::Added);
    assert_eq!(surface.queued_keys().await, vec!["allen".to_string()]);
}

#[tokio::test]
async fn add_falls_back_to_the_filter_when_the_row_is_not_rendered() {
    let surface = Arc::new(MockSurface::new().with_pool(pool()).with_window(1));
    let engine = engine(&surface);
    let summary = engine
        .add_players(&[player("1", "Josh", "Allen")], &CancelToken::new())
        .await;
    assert_eq!(summary.items[0].outcome, ReconciliationOutcome::Added);
    assert_eq!(surface.queued_keys().await, vec!["allen".to_string()]);
    // The filter was driven to find the row and restored afterwards.
    let journal = surface.journal().await;
    assert!(journal
        .iter()
        .any(|e| matches!(e, MockEvent::FilterSet { value, .. } if value == "Josh Allen")));
    assert_eq!(surface.current_filter().await, "");
}

#[tokio::test]
async fn add_retries_variations_with_the_instrumented_driver() {
    let surface = Arc::new(
        MockSurface::new()
            .with_pool(pool())
            .with_window(1)
            .reject_native_filter(),
    );
    let engine = engine(&surface);
    let summary = engine
        .add_players(&[player("1", "Travis", "Kelce")], &CancelToken::new())
        .await;
    assert_eq!(summary.items[0].outcome, ReconciliationOutcome::Added);
    assert_eq!(surface.queued_keys().await, vec!["kelce".to_string()]);
    assert_eq!(surface.current_filter().await, "");
}

#[tokio::test]
async fn add_reports_not_found_after_exhausting_every_strategy() {
    let surface = Arc::new(MockSurface::new().with_pool(pool()));
    let engine = engine(&surface);
    let summary = engine
        .add_players(&[player("9", "Nobody", "Matches")], &CancelToken::new())
        .await;
    assert_eq!(summary.items[0].outcome, ReconciliationOutcome::NotFound);
    assert!(surface.queued_keys().await.is_empty());
    assert_eq!(surface.current_filter().await, "");
}

#[tokio::test]
async fn add_is_idempotent_for_an_already_queued_target() {
    let surface = Arc::new(MockSurface::new().with_pool(pool()));
    let engine = engine(&surface);
    let target = [player("1", "Josh", "Allen")];

    let first = engine.add_players(&target, &CancelToken::new()).await;
    assert_eq!(first.items[0].outcome, ReconciliationOutcome::Added);

    let second = engine.add_players(&target, &CancelToken::new()).await;
    assert_eq!(
        second.items[0].outcome,
        ReconciliationOutcome::AlreadyPresentOrAddedElsewhere
    );
    // No duplicate entry and no second add trigger fired.
    assert_eq!(surface.queued_keys().await, vec!["allen".to_string()]);
    let adds = surface
        .journal()
        .await
        .iter()
        .filter(|e| matches!(e, MockEvent::AddTriggered(_)))
        .count();
    assert_eq!(adds, 1);
}

#[tokio::test]
async fn add_without_a_full_name_is_an_error_not_a_panic() {
    let surface = Arc::new(MockSurface::new().with_pool(pool()));
    let engine = engine(&surface);
    let summary = engine
        .add_players(&[PlayerRecord::new("nameless")], &CancelToken::new())
        .await;
    assert!(matches!(
        summary.items[0].outcome,
        ReconciliationOutcome::Error(_)
    ));
}

#[tokio::test]
async fn cancelled_add_batch_reports_not_attempted() {
    let surface = Arc::new(MockSurface::new().with_pool(pool()));
    let engine = engine(&surface);
    let cancel = CancelToken::new();
    cancel.cancel();
    let summary = engine
        .add_players(
            &[player("1", "Josh", "Allen"), player("2", "Travis", "Kelce")],
            &cancel,
        )
        .await;
    assert_eq!(summary.len(), 2);
    assert!(summary
        .items
        .iter()
        .all(|i| i.outcome == ReconciliationOutcome::NotAttempted));
    assert!(surface.journal().await.is_empty());
}

fn queued_rows() -> Vec<MockRow> {
    vec![
        MockRow::new("allen", "Josh Allen QB BUF Remove"),
        MockRow::new("kelce", "Travis Kelce TE KC Remove"),
    ]
}

#[tokio::test]
async fn clear_queue_removes_every_entry() {
    let surface = Arc::new(MockSurface::new().with_queued(queued_rows()));
    let engine = engine(&surface);
    let summary = engine.clear_queue(&CancelToken::new()).await;
    assert_eq!(summary.len(), 2);
    assert!(summary
        .items
        .iter()
        .all(|i| i.outcome == ReconciliationOutcome::Removed));
    assert!(surface.queued_keys().await.is_empty());
}

#[tokio::test]
async fn clear_queue_on_an_empty_surface_does_nothing() {
    let surface = Arc::new(MockSurface::new().with_pool(pool()));
    let engine = engine(&surface);
    let summary = engine.clear_queue(&CancelToken::new()).await;
    assert!(summary.is_empty());
    assert!(surface.journal().await.is_empty());
}

#[tokio::test]
async fn clear_queue_downgrades_a_detached_element_and_continues() {
    let surface = Arc::new(MockSurface::new().with_queued(queued_rows()));
    let engine = engine(&surface);
    surface.detach_next_trigger().await;
    let summary = engine.clear_queue(&CancelToken::new()).await;
    // Bound is the initially observed count, so one failed attempt costs one
    // removal; the loop must not run away past the bound.
    assert_eq!(summary.len(), 2);
    assert_eq!(summary.count_of("error"), 1);
    assert_eq!(summary.count_of("removed"), 1);
    assert_eq!(surface.queued_keys().await.len(), 1);
}

#[tokio::test]
async fn cancelled_clear_reports_remaining_entries() {
    let surface = Arc::new(MockSurface::new().with_queued(queued_rows()));
    let engine = engine(&surface);
    let cancel = CancelToken::new();
    cancel.cancel();
    let summary = engine.clear_queue(&cancel).await;
    assert_eq!(summary.len(), 2);
    assert!(summary
        .items
        .iter()
        .all(|i| i.outcome == ReconciliationOutcome::NotAttempted));
    assert_eq!(surface.queued_keys().await.len(), 2);
}

#[tokio::test]
async fn validate_partitions_lines_against_the_live_queue() {
    let surface = Arc::new(
        MockSurface::new()
            .with_pool(pool())
            .with_queued(vec![MockRow::new("allen", "Josh Allen QB BUF Remove")]),
    );
    let engine = engine(&surface);
    let roster: Roster = [
        player("1", "Josh", "Allen").with_team("BUF"),
        player("2", "Patrick", "Mahomes").with_team("KC"),
    ]
    .into_iter()
    .map(|p| (p.id.clone(), p))
    .collect();
    let lines = vec![
        "Josh Allen".to_string(),
        "Patrick Mahomes".to_string(),
        "Zzyzx Nonesuch".to_string(),
        "   ".to_string(),
    ];
    let report = engine
        .validate_against_queue(&lines, &roster, &MatchOptions::new(), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(report.in_queue, vec!["Josh Allen".to_string()]);
    assert_eq!(report.not_in_queue, vec!["Patrick Mahomes".to_string()]);
    assert_eq!(report.invalid, vec!["Zzyzx Nonesuch".to_string()]);
    assert!(report.not_attempted.is_empty());
}
