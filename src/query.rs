//! Query coordination for the dashboard
//!
//! Three independent queries hang off the shared [`FilterState`]:
//! aggregate metrics, the review list and the weekly insight. Each lives in
//! its own [`QuerySlot`], which provides:
//!
//! - cache-by-key: an LRU of successful results keyed by the facet tuple the
//!   query depends on, so an unchanged key never re-fetches
//! - generation tagging: every issued request takes the next sequence number
//!   of its slot, and a result whose number is no longer the latest is
//!   discarded on arrival
//! - per-slot state for rendering its own loading indicator
//!
//! A failure in one slot never touches the others. The view model in
//! [`DashboardSnapshot::view`] applies the escalation policy: a metrics
//! failure takes over the whole view, review and insight failures degrade to
//! an empty list and a placeholder.

use crate::client::FeedbackApi;
use crate::error::{DashboardError, Result};
use crate::filters::{Facet, FilterState};
use crate::session::SessionGuard;
use crate::types::{DashboardMetrics, Review, WeeklyInsight, INSIGHT_PLACEHOLDER};
use lru::LruCache;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// The dashboard's queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Metrics,
    Reviews,
    WeeklyInsight,
}

impl QueryKind {
    pub const ALL: [QueryKind; 3] = [Self::Metrics, Self::Reviews, Self::WeeklyInsight];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Metrics => "metrics",
            Self::Reviews => "reviews",
            Self::WeeklyInsight => "weekly-insight",
        }
    }

    /// Whether this query's key includes `facet`
    pub fn depends_on(&self, facet: Facet) -> bool {
        match self {
            Self::Metrics | Self::Reviews => Facet::ALL.contains(&facet),
            Self::WeeklyInsight => false,
        }
    }

    /// Queries whose key is affected by any of `facets`
    pub fn affected_by(facets: &[Facet]) -> Vec<QueryKind> {
        Self::ALL
            .into_iter()
            .filter(|kind| facets.iter().any(|f| kind.depends_on(*f)))
            .collect()
    }
}

/// What a query slot currently holds for rendering
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<V> {
    /// Never requested
    Idle,
    /// Request outstanding; `previous` is the last value shown, if any
    Loading { previous: Option<V> },
    Ready(V),
    Failed { message: String },
}

impl<V> QueryState<V> {
    /// Value to render, including the stale one kept while reloading
    pub fn value(&self) -> Option<&V> {
        match self {
            Self::Ready(v) => Some(v),
            Self::Loading { previous } => previous.as_ref(),
            Self::Idle | Self::Failed { .. } => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Result of asking a slot for a key
#[derive(Debug)]
pub enum LoadOutcome<V> {
    /// Served from cache, no request issued
    Cached(V),
    /// Fetched and stored
    Fetched(V),
    /// Same key already in flight, no request issued
    Joined,
    /// Arrived after a newer request for this slot; dropped
    Superseded,
    Failed(DashboardError),
}

impl<V> LoadOutcome<V> {
    pub fn issued_request(&self) -> bool {
        matches!(self, Self::Fetched(_) | Self::Superseded | Self::Failed(_))
    }

    pub fn into_error(self) -> Option<DashboardError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

struct SlotInner<K, V> {
    cache: LruCache<K, V>,
    /// Latest generation handed out
    issued: u64,
    in_flight: Option<(K, u64)>,
    state: QueryState<V>,
    requests: u64,
}

/// Generation-tagged, LRU-backed holder for one query
pub struct QuerySlot<K, V> {
    name: &'static str,
    inner: Mutex<SlotInner<K, V>>,
}

impl<K, V> QuerySlot<K, V>
where
    K: Hash + Eq + Clone + Send,
    V: Clone + Send,
{
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            name,
            inner: Mutex::new(SlotInner {
                cache: LruCache::new(capacity),
                issued: 0,
                in_flight: None,
                state: QueryState::Idle,
                requests: 0,
            }),
        }
    }

    /// Resolve `key`, calling `fetch` only when neither the cache nor an
    /// outstanding request already covers it
    pub async fn load<F, Fut>(&self, key: K, fetch: F) -> LoadOutcome<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let generation = {
            let mut inner = self.inner.lock().await;

            if let Some(value) = inner.cache.get(&key).cloned() {
                // A cache hit is the newest answer; anything still in flight is stale
                inner.issued += 1;
                inner.in_flight = None;
                inner.state = QueryState::Ready(value.clone());
                debug!(query = self.name, "cache hit");
                return LoadOutcome::Cached(value);
            }

            if matches!(&inner.in_flight, Some((pending, _)) if *pending == key) {
                debug!(query = self.name, "joining in-flight request");
                return LoadOutcome::Joined;
            }

            inner.issued += 1;
            inner.requests += 1;
            let generation = inner.issued;
            inner.in_flight = Some((key.clone(), generation));
            let previous = inner.state.value().cloned();
            inner.state = QueryState::Loading { previous };
            generation
        };

        debug!(query = self.name, generation, "issuing request");
        let result = fetch().await;

        let mut inner = self.inner.lock().await;
        if generation != inner.issued {
            debug!(
                query = self.name,
                generation,
                latest = inner.issued,
                "discarding superseded result"
            );
            return LoadOutcome::Superseded;
        }
        inner.in_flight = None;

        match result {
            Ok(value) => {
                inner.cache.put(key, value.clone());
                inner.state = QueryState::Ready(value.clone());
                LoadOutcome::Fetched(value)
            }
            Err(error) => {
                warn!(query = self.name, "request failed: {}", error);
                inner.state = QueryState::Failed {
                    message: error.to_string(),
                };
                LoadOutcome::Failed(error)
            }
        }
    }

    /// Drop cached results and orphan any outstanding request
    pub async fn invalidate(&self) {
        let mut inner = self.inner.lock().await;
        inner.cache.clear();
        inner.issued += 1;
        inner.in_flight = None;
        debug!(query = self.name, "invalidated");
    }

    pub async fn state(&self) -> QueryState<V> {
        self.inner.lock().await.state.clone()
    }

    /// Number of network requests this slot has issued
    pub async fn request_count(&self) -> u64 {
        self.inner.lock().await.requests
    }
}

/// Point-in-time copy of everything the dashboard renders
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub filters: FilterState,
    pub metrics: QueryState<DashboardMetrics>,
    pub reviews: QueryState<Vec<Review>>,
    pub insight: QueryState<WeeklyInsight>,
}

/// What the dashboard should show
#[derive(Debug)]
pub enum DashboardView<'a> {
    /// First metrics load for the mount, blocks the view
    Loading,
    /// Metrics failed: full-view error with retry and logout
    Failed { message: &'a str },
    Ready(ReadyView<'a>),
}

#[derive(Debug)]
pub struct ReadyView<'a> {
    pub metrics: &'a DashboardMetrics,
    pub metrics_refreshing: bool,
    pub reviews: &'a [Review],
    pub reviews_loading: bool,
    pub insight: &'a str,
    pub insight_loading: bool,
}

impl DashboardSnapshot {
    pub fn view(&self) -> DashboardView<'_> {
        if let Some(message) = self.metrics.error() {
            return DashboardView::Failed { message };
        }
        let Some(metrics) = self.metrics.value() else {
            return DashboardView::Loading;
        };

        let insight = self
            .insight
            .value()
            .map(|i| i.summary.as_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(INSIGHT_PLACEHOLDER);

        DashboardView::Ready(ReadyView {
            metrics,
            metrics_refreshing: self.metrics.is_loading(),
            reviews: self.reviews.value().map(Vec::as_slice).unwrap_or(&[]),
            reviews_loading: self.reviews.is_loading(),
            insight,
            insight_loading: self.insight.is_loading(),
        })
    }
}

/// Coordinates the dashboard's three queries against the shared filter state
pub struct DashboardQueries {
    api: Arc<dyn FeedbackApi>,
    session: Arc<SessionGuard>,
    metrics: QuerySlot<FilterState, DashboardMetrics>,
    reviews: QuerySlot<FilterState, Vec<Review>>,
    insight: QuerySlot<(), WeeklyInsight>,
    applied: Mutex<Option<FilterState>>,
}

impl DashboardQueries {
    pub fn new(api: Arc<dyn FeedbackApi>, session: Arc<SessionGuard>, cache_capacity: usize) -> Self {
        Self {
            api,
            session,
            metrics: QuerySlot::new(QueryKind::Metrics.name(), cache_capacity),
            reviews: QuerySlot::new(QueryKind::Reviews.name(), cache_capacity),
            // Unit key: at most one entry
            insight: QuerySlot::new(QueryKind::WeeklyInsight.name(), 1),
            applied: Mutex::new(None),
        }
    }

    /// Load every query for a freshly mounted dashboard
    pub async fn mount(&self, filters: FilterState) -> Result<Vec<QueryKind>> {
        *self.applied.lock().await = Some(filters.clone());
        self.load(&filters, &QueryKind::ALL).await
    }

    /// Re-derive only the queries whose key changed since the last snapshot
    pub async fn apply_filters(&self, filters: FilterState) -> Result<Vec<QueryKind>> {
        let kinds = {
            let mut applied = self.applied.lock().await;
            let kinds = match applied.as_ref() {
                Some(previous) => QueryKind::affected_by(&previous.changed_facets(&filters)),
                None => QueryKind::ALL.to_vec(),
            };
            *applied = Some(filters.clone());
            kinds
        };

        if kinds.is_empty() {
            return Ok(kinds);
        }
        debug!("Filters now {}; refreshing {:?}", filters, kinds);
        self.load(&filters, &kinds).await
    }

    /// Load the weekly insight alone, reusing a cached one
    pub async fn load_insight(&self) -> Result<()> {
        self.load(&FilterState::default(), &[QueryKind::WeeklyInsight])
            .await
            .map(|_| ())
    }

    /// Force a fresh weekly insight, independent of the filters
    pub async fn refresh_insight(&self) -> Result<()> {
        self.insight.invalidate().await;
        self.load_insight().await
    }

    /// Full reload after a failure: drop every cache and mount again
    pub async fn retry(&self) -> Result<Vec<QueryKind>> {
        self.metrics.invalidate().await;
        self.reviews.invalidate().await;
        self.insight.invalidate().await;
        let filters = self.applied.lock().await.clone().unwrap_or_default();
        self.mount(filters).await
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            filters: self.applied.lock().await.clone().unwrap_or_default(),
            metrics: self.metrics.state().await,
            reviews: self.reviews.state().await,
            insight: self.insight.state().await,
        }
    }

    /// Requests issued so far by one query
    pub async fn request_count(&self, kind: QueryKind) -> u64 {
        match kind {
            QueryKind::Metrics => self.metrics.request_count().await,
            QueryKind::Reviews => self.reviews.request_count().await,
            QueryKind::WeeklyInsight => self.insight.request_count().await,
        }
    }

    /// Resolve `kinds` for `filters` concurrently
    ///
    /// Individual failures stay in their slots; only a rejected session is
    /// returned as an error, after the session has been expired.
    pub async fn load(&self, filters: &FilterState, kinds: &[QueryKind]) -> Result<Vec<QueryKind>> {
        self.session.admit()?;
        let generation = self.session.generation();

        let want = |kind: QueryKind| kinds.contains(&kind);
        let api = &self.api;

        let metrics = async {
            if !want(QueryKind::Metrics) {
                return None;
            }
            self.metrics
                .load(filters.clone(), || api.fetch_metrics(filters))
                .await
                .into_error()
        };
        let reviews = async {
            if !want(QueryKind::Reviews) {
                return None;
            }
            self.reviews
                .load(filters.clone(), || api.fetch_reviews(filters))
                .await
                .into_error()
        };
        let insight = async {
            if !want(QueryKind::WeeklyInsight) {
                return None;
            }
            self.insight
                .load((), || api.fetch_weekly_insight())
                .await
                .into_error()
        };

        let (metrics, reviews, insight) = tokio::join!(metrics, reviews, insight);

        if let Some(auth) = [metrics, reviews, insight]
            .into_iter()
            .flatten()
            .find(DashboardError::is_auth)
        {
            self.session.expire(generation, "dashboard query was rejected");
            return Err(auth);
        }

        Ok(kinds.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockFeedbackApi;
    use crate::types::{Rating, ReviewId, Sentiment};
    use chrono::NaiveDate;
    use secrecy::SecretString;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn metrics(total: u64) -> DashboardMetrics {
        DashboardMetrics {
            total_reviews: total,
            average_rating: 4.0,
            rating_distribution: BTreeMap::from([(Rating::new(4).unwrap(), total)]),
            monthly_trend: vec![],
        }
    }

    fn review(id: i64) -> Review {
        Review {
            id: ReviewId(id),
            rating: 4,
            content: "Nice".into(),
            sentiment: Some("Positive".into()),
            aspects: None,
            summary: None,
            response: None,
            suggested_action: None,
            created_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    fn logged_in() -> Arc<SessionGuard> {
        let session = SessionGuard::in_memory();
        session
            .establish(SecretString::new("token".to_string().into()))
            .unwrap();
        Arc::new(session)
    }

    fn happy_mock() -> MockFeedbackApi {
        let mut api = MockFeedbackApi::new();
        api.expect_fetch_metrics().returning(|_| Ok(metrics(3)));
        api.expect_fetch_reviews()
            .returning(|_| Ok(vec![review(1), review(2)]));
        api.expect_fetch_weekly_insight().returning(|| {
            Ok(WeeklyInsight {
                summary: "Service improved".into(),
            })
        });
        api
    }

    #[tokio::test]
    async fn test_mount_loads_all_three() {
        let queries = DashboardQueries::new(Arc::new(happy_mock()), logged_in(), 8);
        let loaded = queries.mount(FilterState::new()).await.unwrap();
        assert_eq!(loaded, QueryKind::ALL.to_vec());

        let snapshot = queries.snapshot().await;
        match snapshot.view() {
            DashboardView::Ready(view) => {
                assert_eq!(view.metrics.total_reviews, 3);
                assert_eq!(view.reviews.len(), 2);
                assert_eq!(view.insight, "Service improved");
                assert!(!view.metrics_refreshing);
            }
            other => panic!("expected ready view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sentiment_change_does_not_refetch_insight() {
        let mut api = MockFeedbackApi::new();
        api.expect_fetch_metrics().times(2).returning(|_| Ok(metrics(1)));
        api.expect_fetch_reviews().times(2).returning(|_| Ok(vec![]));
        api.expect_fetch_weekly_insight().times(1).returning(|| {
            Ok(WeeklyInsight {
                summary: "Steady".into(),
            })
        });

        let queries = DashboardQueries::new(Arc::new(api), logged_in(), 8);
        let base = FilterState::new();
        queries.mount(base.clone()).await.unwrap();

        let refreshed = queries
            .apply_filters(base.with_sentiment(Some(Sentiment::Negative)))
            .await
            .unwrap();
        assert_eq!(refreshed, vec![QueryKind::Metrics, QueryKind::Reviews]);
        assert_eq!(queries.request_count(QueryKind::WeeklyInsight).await, 1);
    }

    #[tokio::test]
    async fn test_unchanged_filters_reuse_results() {
        let mut api = MockFeedbackApi::new();
        api.expect_fetch_metrics().times(2).returning(|_| Ok(metrics(1)));
        api.expect_fetch_reviews().times(2).returning(|_| Ok(vec![]));
        api.expect_fetch_weekly_insight()
            .times(1)
            .returning(|| Ok(WeeklyInsight { summary: "x".into() }));

        let queries = DashboardQueries::new(Arc::new(api), logged_in(), 8);
        let base = FilterState::new();
        let searched = base.with_search("cold");

        queries.mount(base.clone()).await.unwrap();
        assert!(queries.apply_filters(base.clone()).await.unwrap().is_empty());

        // Back to a previously seen key: served from cache
        queries.apply_filters(searched).await.unwrap();
        queries.apply_filters(base).await.unwrap();
        assert_eq!(queries.request_count(QueryKind::Metrics).await, 2);
        assert_eq!(queries.request_count(QueryKind::Reviews).await, 2);
    }

    #[tokio::test]
    async fn test_metrics_failure_is_terminal_for_view() {
        let mut api = MockFeedbackApi::new();
        api.expect_fetch_metrics().returning(|_| {
            Err(DashboardError::Service {
                status: 500,
                message: "Internal Server Error".into(),
            })
        });
        api.expect_fetch_reviews().returning(|_| Ok(vec![review(1)]));
        api.expect_fetch_weekly_insight()
            .returning(|| Ok(WeeklyInsight { summary: "x".into() }));

        let queries = DashboardQueries::new(Arc::new(api), logged_in(), 8);
        queries.mount(FilterState::new()).await.unwrap();

        let snapshot = queries.snapshot().await;
        // The other slots still succeeded independently
        assert!(matches!(snapshot.reviews, QueryState::Ready(_)));
        match snapshot.view() {
            DashboardView::Failed { message } => assert!(message.contains("500")),
            other => panic!("expected failed view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_partial_failures_degrade() {
        let mut api = MockFeedbackApi::new();
        api.expect_fetch_metrics().returning(|_| Ok(metrics(2)));
        api.expect_fetch_reviews().returning(|_| {
            Err(DashboardError::Service {
                status: 502,
                message: "Bad Gateway".into(),
            })
        });
        api.expect_fetch_weekly_insight().returning(|| {
            Err(DashboardError::Service {
                status: 503,
                message: "Unavailable".into(),
            })
        });

        let queries = DashboardQueries::new(Arc::new(api), logged_in(), 8);
        queries.mount(FilterState::new()).await.unwrap();

        match queries.snapshot().await.view() {
            DashboardView::Ready(view) => {
                assert!(view.reviews.is_empty());
                assert_eq!(view.insight, INSIGHT_PLACEHOLDER);
            }
            other => panic!("expected ready view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_auth_error_expires_session() {
        let mut api = MockFeedbackApi::new();
        api.expect_fetch_metrics().returning(|_| Ok(metrics(1)));
        api.expect_fetch_reviews()
            .returning(|_| Err(DashboardError::Auth("expired".into())));
        api.expect_fetch_weekly_insight()
            .returning(|| Ok(WeeklyInsight { summary: "x".into() }));

        let session = logged_in();
        let queries = DashboardQueries::new(Arc::new(api), session.clone(), 8);
        let err = queries.mount(FilterState::new()).await.unwrap_err();
        assert!(err.is_auth());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_unauthenticated_issues_nothing() {
        let mut api = MockFeedbackApi::new();
        api.expect_fetch_metrics().times(0);
        api.expect_fetch_reviews().times(0);
        api.expect_fetch_weekly_insight().times(0);

        let queries =
            DashboardQueries::new(Arc::new(api), Arc::new(SessionGuard::in_memory()), 8);
        assert!(queries.mount(FilterState::new()).await.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn test_retry_refetches_everything() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut api = MockFeedbackApi::new();
        api.expect_fetch_metrics().returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(DashboardError::Service {
                    status: 500,
                    message: "boom".into(),
                })
            } else {
                Ok(metrics(7))
            }
        });
        api.expect_fetch_reviews().times(2).returning(|_| Ok(vec![]));
        api.expect_fetch_weekly_insight()
            .times(2)
            .returning(|| Ok(WeeklyInsight { summary: "x".into() }));

        let queries = DashboardQueries::new(Arc::new(api), logged_in(), 8);
        queries.mount(FilterState::new()).await.unwrap();
        assert!(matches!(
            queries.snapshot().await.view(),
            DashboardView::Failed { .. }
        ));

        queries.retry().await.unwrap();
        assert!(matches!(
            queries.snapshot().await.view(),
            DashboardView::Ready(_)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_superseded_result_is_discarded() {
        let slot: Arc<QuerySlot<&'static str, u32>> = Arc::new(QuerySlot::new("test", 4));
        let (release_old, old_gate) = oneshot::channel::<()>();

        let old_slot = slot.clone();
        let old = tokio::spawn(async move {
            old_slot
                .load("old", || async move {
                    let _ = old_gate.await;
                    Ok(1)
                })
                .await
        });

        // Let the old request register before issuing the newer one
        tokio::task::yield_now().await;
        while slot.request_count().await == 0 {
            tokio::task::yield_now().await;
        }

        let newer = slot.load("new", || async { Ok(2) }).await;
        assert!(matches!(newer, LoadOutcome::Fetched(2)));

        release_old.send(()).unwrap();
        let old = old.await.unwrap();
        assert!(matches!(old, LoadOutcome::Superseded));
        assert_eq!(slot.state().await, QueryState::Ready(2));
    }

    #[tokio::test]
    async fn test_same_key_in_flight_is_joined() {
        let slot: Arc<QuerySlot<u8, u32>> = Arc::new(QuerySlot::new("test", 4));
        let (release, gate) = oneshot::channel::<()>();

        let first_slot = slot.clone();
        let first = tokio::spawn(async move {
            first_slot
                .load(1, || async move {
                    let _ = gate.await;
                    Ok(10)
                })
                .await
        });
        while slot.request_count().await == 0 {
            tokio::task::yield_now().await;
        }

        let second = slot.load(1, || async { Ok(99) }).await;
        assert!(matches!(second, LoadOutcome::Joined));
        assert!(slot.state().await.is_loading());

        release.send(()).unwrap();
        assert!(matches!(first.await.unwrap(), LoadOutcome::Fetched(10)));
        assert_eq!(slot.request_count().await, 1);
    }

    #[tokio::test]
    async fn test_failure_replaces_ready_state() {
        let slot: QuerySlot<u8, u32> = QuerySlot::new("test", 4);
        slot.load(1, || async { Ok(5) }).await;
        let outcome = slot
            .load(2, || async {
                Err(DashboardError::Service {
                    status: 500,
                    message: "x".into(),
                })
            })
            .await;
        assert!(outcome.issued_request());
        assert_eq!(slot.state().await.error(), Some("Service error (500): x"));
    }
}
