//! HTTP client for the feedback backend
//!
//! [`FeedbackApi`] is the seam between the dashboard core and the backend.
//! [`HttpFeedbackApi`] implements it over reqwest, attaching the session's
//! bearer token to every dashboard-scoped request.

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::filters::{FilterState, QueryParams};
use crate::session::{SessionGeneration, SessionGuard};
use crate::types::{DashboardMetrics, Month, NewReview, Note, Review, ReviewId, WeeklyInsight};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Backend operations consumed by the dashboard
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackApi: Send + Sync {
    /// `GET /analytics/dashboard`
    async fn fetch_metrics(&self, filters: &FilterState) -> Result<DashboardMetrics>;

    /// `GET /reviews/`
    async fn fetch_reviews(&self, filters: &FilterState) -> Result<Vec<Review>>;

    /// `GET /analytics/weekly-insight`
    async fn fetch_weekly_insight(&self) -> Result<WeeklyInsight>;

    /// `GET /analytics/report/{month}`, the rendered document bytes
    async fn fetch_report(&self, month: Month, filters: &FilterState) -> Result<Vec<u8>>;

    /// `GET /reviews/{id}/notes`
    async fn fetch_notes(&self, review: ReviewId) -> Result<Vec<Note>>;

    /// `POST /reviews/{id}/notes`
    async fn add_note(&self, review: ReviewId, content: &str) -> Result<Note>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Request bound to the session generation whose token it carries
struct Authorized {
    request: RequestBuilder,
    generation: SessionGeneration,
}

impl Authorized {
    fn map(self, f: impl FnOnce(RequestBuilder) -> RequestBuilder) -> Self {
        Self {
            request: f(self.request),
            generation: self.generation,
        }
    }
}

/// reqwest-backed implementation of [`FeedbackApi`]
pub struct HttpFeedbackApi {
    base_url: String,
    client: Client,
    session: Arc<SessionGuard>,
}

impl HttpFeedbackApi {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<SessionGuard>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            session,
        })
    }

    pub fn from_config(config: &DashboardConfig, session: Arc<SessionGuard>) -> Result<Self> {
        Self::new(&config.api_url, config.request_timeout(), session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionGuard> {
        &self.session
    }

    /// Exchange credentials for a token and install it in the session
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let token = self.request_token(username, password).await?;
        self.session.establish(token)
    }

    /// `POST /auth/token` with a form-encoded body
    pub async fn request_token(&self, username: &str, password: &str) -> Result<SecretString> {
        debug!("Requesting token for {}", username);
        let response = self
            .client
            .post(self.url("/auth/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(DashboardError::Auth("Invalid credentials".to_string()));
        }
        let body: TokenResponse = Self::expect_success(response).await?.json().await?;
        Ok(SecretString::new(body.access_token.into()))
    }

    /// `POST /reviews/`, public and unauthenticated
    pub async fn submit_review(&self, review: &NewReview) -> Result<Review> {
        review.validate()?;
        debug!("Submitting {}-star review", review.rating);
        let response = self
            .client
            .post(self.url("/reviews/"))
            .json(review)
            .send()
            .await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request builder carrying the bearer token; fails without a session
    fn authorized(&self, method: Method, path: &str) -> Result<Authorized> {
        let (header, generation) = self.session.bearer_header()?;
        let request = self
            .client
            .request(method, self.url(path))
            .header(AUTHORIZATION, header);
        Ok(Authorized {
            request,
            generation,
        })
    }

    async fn send(&self, authorized: Authorized, path: &str) -> Result<Response> {
        debug!("Sending request to {}", path);
        let response = authorized.request.send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // Only the token this request carried is torn down
            self.session
                .expire(authorized.generation, "backend rejected the session token");
            return Err(DashboardError::Auth(
                "Session expired, please log in again".to_string(),
            ));
        }
        Self::expect_success(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &QueryParams) -> Result<T> {
        let request = self.authorized(Method::GET, path)?.map(|r| r.query(params));
        Ok(self.send(request, path).await?.json().await?)
    }

    async fn expect_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_detail(&body).unwrap_or(body);
        warn!("Request failed with status {}: {}", status, message);
        Err(DashboardError::Service {
            status: status.as_u16(),
            message,
        })
    }
}

/// FastAPI-style `{"detail": "..."}` bodies carry the useful message
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("detail")?.as_str().map(str::to_string)
}

#[async_trait]
impl FeedbackApi for HttpFeedbackApi {
    async fn fetch_metrics(&self, filters: &FilterState) -> Result<DashboardMetrics> {
        self.get_json("/analytics/dashboard", &filters.query_params())
            .await
    }

    async fn fetch_reviews(&self, filters: &FilterState) -> Result<Vec<Review>> {
        self.get_json("/reviews/", &filters.query_params()).await
    }

    async fn fetch_weekly_insight(&self) -> Result<WeeklyInsight> {
        self.get_json("/analytics/weekly-insight", &QueryParams::new())
            .await
    }

    async fn fetch_report(&self, month: Month, filters: &FilterState) -> Result<Vec<u8>> {
        let path = format!("/analytics/report/{month}");
        let request = self
            .authorized(Method::GET, &path)?
            .map(|r| r.query(&filters.report_params()));
        let bytes = self.send(request, &path).await?.bytes().await?;
        debug!("Received {} byte report for {}", bytes.len(), month);
        Ok(bytes.to_vec())
    }

    async fn fetch_notes(&self, review: ReviewId) -> Result<Vec<Note>> {
        self.get_json(&format!("/reviews/{review}/notes"), &QueryParams::new())
            .await
    }

    async fn add_note(&self, review: ReviewId, content: &str) -> Result<Note> {
        let path = format!("/reviews/{review}/notes");
        let request = self
            .authorized(Method::POST, &path)?
            .map(|r| r.query(&[("note_content", content)]));
        Ok(self.send(request, &path).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_extraction() {
        assert_eq!(
            error_detail(r#"{"detail": "Review not found"}"#).as_deref(),
            Some("Review not found")
        );
        assert_eq!(error_detail(r#"{"detail": [{"loc": []}]}"#), None);
        assert_eq!(error_detail("No data for this month"), None);
    }

    #[test]
    fn test_base_url_normalized() {
        let api = HttpFeedbackApi::new(
            "http://localhost:8000/",
            Duration::from_secs(5),
            Arc::new(SessionGuard::in_memory()),
        )
        .unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("/reviews/"), "http://localhost:8000/reviews/");
    }

    #[tokio::test]
    async fn test_no_request_without_session() {
        // Port 9 (discard) is never contacted: the guard fails first
        let api = HttpFeedbackApi::new(
            "http://127.0.0.1:9",
            Duration::from_secs(1),
            Arc::new(SessionGuard::in_memory()),
        )
        .unwrap();
        let err = api.fetch_weekly_insight().await.unwrap_err();
        assert!(err.is_auth());
    }
}
