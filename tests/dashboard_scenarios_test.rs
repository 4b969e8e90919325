//! End-to-end dashboard flows against the stub backend

mod common;

use common::{StubBackend, REPORT_BYTES};
use feedback_dash_core::types::AspectTags;
use feedback_dash_core::{
    DashboardError, DashboardQueries, DashboardView, FilterState, NotesBook, QueryKind,
    ReportExporter, ReviewId, Sentiment, SessionState, ThreadState, ThreadView,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_export_with_month_from_raw_input() {
    let backend = StubBackend::start().await;
    let dir = TempDir::new().unwrap();
    let (session, api) = backend.login(dir.path()).await;
    let exporter = ReportExporter::new(api, session, dir.path().join("downloads"));

    let filters = FilterState::new()
        .with_min_rating_text("")
        .with_search("")
        .with_month_text("2024-03")
        .with_sentiment_text("")
        .with_aspect_text("");
    assert!(exporter.is_enabled(&filters));

    let report = exporter.export(&filters).await.unwrap();
    assert_eq!(report.path, dir.path().join("downloads").join("report_2024-03.pdf"));
    assert_eq!(std::fs::read(&report.path).unwrap(), REPORT_BYTES);

    let sent = backend.requests_to("/analytics/report/");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].path, "/analytics/report/2024-03");
    assert_eq!(sent[0].query, None);
}

#[tokio::test]
async fn test_export_without_month_sends_nothing() {
    let backend = StubBackend::start().await;
    let dir = TempDir::new().unwrap();
    let (session, api) = backend.login(dir.path()).await;
    let exporter = ReportExporter::new(api, session, dir.path());

    let filters = FilterState::new();
    assert!(!exporter.is_enabled(&filters));

    let err = exporter.export(&filters).await.unwrap_err();
    assert!(matches!(err, DashboardError::Validation(ref m) if m == "Please select a month first"));
    assert!(backend.requests_to("/analytics/report/").is_empty());
}

#[tokio::test]
async fn test_export_is_single_flight() {
    let backend = StubBackend::start().await;
    let dir = TempDir::new().unwrap();
    let (session, api) = backend.login(dir.path()).await;
    let exporter = Arc::new(ReportExporter::new(api, session, dir.path()));
    let filters = FilterState::new().with_month_text("2024-03");

    backend.state.hold_reports.store(true, Ordering::SeqCst);
    let first = tokio::spawn({
        let exporter = exporter.clone();
        let filters = filters.clone();
        async move { exporter.export(&filters).await }
    });
    while !exporter.is_busy() {
        tokio::task::yield_now().await;
    }

    let err = exporter.export(&filters).await.unwrap_err();
    assert!(matches!(err, DashboardError::InFlight(_)));
    assert!(!exporter.is_enabled(&filters));

    backend.state.release.notify_one();
    first.await.unwrap().unwrap();

    assert!(!exporter.is_busy());
    assert_eq!(backend.requests_to("/analytics/report/").len(), 1);
}

#[tokio::test]
async fn test_malformed_aspects_render_without_tags() {
    let backend = StubBackend::start().await;
    let dir = TempDir::new().unwrap();
    let (session, api) = backend.login(dir.path()).await;
    let queries = DashboardQueries::new(api, session, 8);

    queries.mount(FilterState::new()).await.unwrap();
    let snapshot = queries.snapshot().await;
    let DashboardView::Ready(view) = snapshot.view() else {
        panic!("dashboard should be ready");
    };

    let slow = view.reviews.iter().find(|r| r.id == ReviewId(1)).unwrap();
    assert_eq!(slow.aspect_tags(), AspectTags::Empty);
    assert!(slow.aspect_tags().tags().is_empty());

    let great = view.reviews.iter().find(|r| r.id == ReviewId(2)).unwrap();
    assert_eq!(great.aspect_tags().tags(), ["Food".to_string()]);
}

#[tokio::test]
async fn test_blank_note_is_not_submitted() {
    let backend = StubBackend::start().await;
    let dir = TempDir::new().unwrap();
    let (session, api) = backend.login(dir.path()).await;
    let notes = NotesBook::new(api, session);
    let review = ReviewId(1);

    assert_eq!(notes.toggle(review).await.unwrap(), ThreadState::Expanded);
    let before = notes.view(review).await;
    assert_eq!(before.view, ThreadView::Empty);

    let err = notes.add_note(review, "   ").await.unwrap_err();
    assert!(matches!(err, DashboardError::Validation(_)));

    let posts = backend
        .requests_to("/reviews/1/notes")
        .into_iter()
        .filter(|r| r.method == "POST")
        .count();
    assert_eq!(posts, 0);
    assert_eq!(notes.view(review).await, before);
}

#[tokio::test]
async fn test_note_thread_lifecycle() {
    let backend = StubBackend::start().await;
    let dir = TempDir::new().unwrap();
    let (session, api) = backend.login(dir.path()).await;
    let notes = NotesBook::new(api, session);
    let review = ReviewId(2);

    // Collapsed threads never load
    assert_eq!(notes.view(review).await.view, ThreadView::Hidden);
    assert!(backend.requests_to("/reviews/2/notes").is_empty());

    notes.toggle(review).await.unwrap();
    notes.set_draft(review, "Offered a voucher").await;
    notes.submit_draft(review).await.unwrap();

    let snapshot = notes.view(review).await;
    assert!(snapshot.draft.is_empty());
    let ThreadView::Notes(list) = snapshot.view else {
        panic!("expected notes, got {:?}", snapshot.view);
    };
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].content, "Offered a voucher");

    // Collapse and re-expand reuses the cached thread
    notes.toggle(review).await.unwrap();
    notes.toggle(review).await.unwrap();
    let gets = backend
        .requests_to("/reviews/2/notes")
        .into_iter()
        .filter(|r| r.method == "GET")
        .count();
    assert_eq!(gets, 2);
}

#[tokio::test]
async fn test_metrics_failure_blocks_dashboard() {
    let backend = StubBackend::start().await;
    let dir = TempDir::new().unwrap();
    let (session, api) = backend.login(dir.path()).await;
    let queries = DashboardQueries::new(api, session.clone(), 8);

    backend.state.fail_metrics.store(true, Ordering::SeqCst);
    queries.mount(FilterState::new()).await.unwrap();

    let snapshot = queries.snapshot().await;
    match snapshot.view() {
        DashboardView::Failed { message } => assert!(message.contains("Internal Server Error")),
        other => panic!("expected failed view, got {other:?}"),
    }
    // A server error is not a session problem
    assert!(session.is_authenticated());

    backend.state.fail_metrics.store(false, Ordering::SeqCst);
    queries.retry().await.unwrap();
    assert!(matches!(queries.snapshot().await.view(), DashboardView::Ready(_)));
}

#[tokio::test]
async fn test_revoked_token_forces_logout() {
    let backend = StubBackend::start().await;
    let dir = TempDir::new().unwrap();
    let (session, api) = backend.login(dir.path()).await;
    let queries = DashboardQueries::new(api, session.clone(), 8);

    backend.state.revoked.store(true, Ordering::SeqCst);
    let err = queries.mount(FilterState::new()).await.unwrap_err();

    assert!(err.is_auth());
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert!(!dir.path().join("session.token").exists());

    // Nothing further goes out once logged out
    let sent = backend.requests().len();
    assert!(queries.apply_filters(FilterState::new().with_search("x")).await.is_err());
    assert_eq!(backend.requests().len(), sent);
}

#[tokio::test]
async fn test_sentiment_change_keeps_insight() {
    let backend = StubBackend::start().await;
    let dir = TempDir::new().unwrap();
    let (session, api) = backend.login(dir.path()).await;
    let queries = DashboardQueries::new(api, session, 8);

    let filters = FilterState::new();
    queries.mount(filters.clone()).await.unwrap();
    let refetched = queries
        .apply_filters(filters.with_sentiment(Some(Sentiment::Negative)))
        .await
        .unwrap();

    assert!(refetched.contains(&QueryKind::Metrics));
    assert!(refetched.contains(&QueryKind::Reviews));
    assert!(!refetched.contains(&QueryKind::WeeklyInsight));
    assert_eq!(backend.requests_to("/analytics/weekly-insight").len(), 1);
    assert_eq!(backend.requests_to("/analytics/dashboard").len(), 2);

    // Going back hits the cache
    queries.apply_filters(filters).await.unwrap();
    assert_eq!(backend.requests_to("/analytics/dashboard").len(), 2);
}
