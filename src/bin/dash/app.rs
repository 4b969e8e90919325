//! Dashboard application state and input handling
//!
//! Key handling is synchronous and returns an [`Action`]; [`App::dispatch`]
//! runs the action on a spawned task so input stays responsive while
//! requests are in flight. Task outcomes come back over an [`AppEvent`]
//! channel and everything else is re-read from the core services by
//! [`App::sync`] once per frame.

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use feedback_dash_core::export::{EXPORT_FAILED, MONTH_REQUIRED};
use feedback_dash_core::filters::{cycle, recent_months};
use feedback_dash_core::notes::ThreadSnapshot;
use feedback_dash_core::{
    Aspect, DashboardConfig, DashboardError, DashboardQueries, DashboardSnapshot, DashboardView,
    ErrorKind, FilterState, HttpFeedbackApi, Month, NotesBook, Rating, ReportExporter, Review,
    ReviewId, Sentiment, SessionGuard, ThreadState,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const MONTH_OPTIONS: usize = 12;

/// Outcome of a background task
#[derive(Debug)]
pub enum AppEvent {
    LoggedIn,
    LoginFailed(String),
    Alert(String),
    Notice(String),
    /// A note was refused because an earlier one for the review is still saving
    NoteBusy(ReviewId, String),
}

/// Work requested by a key press
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Quit,
    Login { username: String, password: String },
    ApplyFilters(FilterState),
    Retry,
    RefreshInsight,
    ToggleNotes(ReviewId),
    SaveDraft(ReviewId, String),
    SubmitNote(ReviewId, String),
    DismissNoteAlert(ReviewId),
    Export(FilterState),
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub focus: LoginField,
    pub pending: bool,
    pub error: Option<String>,
}

impl LoginForm {
    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
}

/// Text entry currently capturing keys on the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search(String),
    Note(ReviewId, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
    pub is_error: bool,
}

/// Per-login orchestration services
struct Services {
    queries: Arc<DashboardQueries>,
    notes: Arc<NotesBook>,
    exporter: Arc<ReportExporter>,
}

pub struct App {
    api: Arc<HttpFeedbackApi>,
    session: Arc<SessionGuard>,
    cache_capacity: usize,
    download_dir: PathBuf,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
    services: Option<Services>,

    pub screen: Screen,
    pub login: LoginForm,
    pub input: InputMode,
    pub filters: FilterState,
    pub months: Vec<Month>,
    pub selected: usize,
    pub alert: Option<Alert>,
    pub dashboard: Option<DashboardSnapshot>,
    pub threads: HashMap<ReviewId, ThreadSnapshot>,
    pub export_busy: bool,
}

impl App {
    pub fn new(config: &DashboardConfig, api: Arc<HttpFeedbackApi>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let session = api.session().clone();
        Self {
            api,
            session,
            cache_capacity: config.cache_capacity,
            download_dir: config.download_dir.clone(),
            events_tx,
            events_rx,
            services: None,
            screen: Screen::Login,
            login: LoginForm::default(),
            input: InputMode::Normal,
            filters: FilterState::new(),
            months: recent_months(Local::now().date_naive(), MONTH_OPTIONS),
            selected: 0,
            alert: None,
            dashboard: None,
            threads: HashMap::new(),
            export_busy: false,
        }
    }

    /// Open the dashboard straight away when a stored session exists
    pub fn start(&mut self) {
        if self.session.is_authenticated() {
            self.enter_dashboard();
        }
    }

    pub fn reviews(&self) -> &[Review] {
        self.dashboard
            .as_ref()
            .and_then(|s| s.reviews.value())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn selected_review(&self) -> Option<&Review> {
        self.reviews().get(self.selected)
    }

    fn view_failed(&self) -> bool {
        matches!(
            self.dashboard.as_ref().map(DashboardSnapshot::view),
            Some(DashboardView::Failed { .. })
        )
    }

    pub fn export_label(&self) -> String {
        match self.filters.month() {
            _ if self.export_busy => "Downloading...".to_string(),
            Some(month) => format!("Download {month} Report"),
            None => "Select Month to Download Report".to_string(),
        }
    }

    fn set_alert(&mut self, message: impl Into<String>, is_error: bool) {
        self.alert = Some(Alert {
            message: message.into(),
            is_error,
        });
    }

    /// Map a key press to an action, updating local UI state
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }
        match self.screen {
            Screen::Login => self.handle_login_key(key.code),
            Screen::Dashboard => match self.input.clone() {
                InputMode::Normal => self.handle_dashboard_key(key.code),
                InputMode::Search(buffer) => self.handle_search_key(key.code, buffer),
                InputMode::Note(review, buffer) => self.handle_note_key(key.code, review, buffer),
            },
        }
    }

    fn handle_login_key(&mut self, code: KeyCode) -> Action {
        if self.login.pending {
            return Action::None;
        }
        match code {
            KeyCode::Esc => return Action::Quit,
            KeyCode::Tab | KeyCode::Down | KeyCode::Up => {
                self.login.focus = match self.login.focus {
                    LoginField::Username => LoginField::Password,
                    LoginField::Password => LoginField::Username,
                };
            }
            KeyCode::Char(c) => self.login.focused_mut().push(c),
            KeyCode::Backspace => {
                self.login.focused_mut().pop();
            }
            KeyCode::Enter => {
                if self.login.username.trim().is_empty() || self.login.password.is_empty() {
                    self.login.error = Some("Username and password are required".to_string());
                    return Action::None;
                }
                self.login.pending = true;
                self.login.error = None;
                return Action::Login {
                    username: self.login.username.trim().to_string(),
                    password: self.login.password.clone(),
                };
            }
            _ => {}
        }
        Action::None
    }

    fn handle_dashboard_key(&mut self, code: KeyCode) -> Action {
        if self.view_failed() {
            return match code {
                KeyCode::Char('r') => Action::Retry,
                KeyCode::Char('L') => Action::Logout,
                KeyCode::Char('q') => Action::Quit,
                _ => Action::None,
            };
        }

        match code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Esc => {
                self.alert = None;
                match self.selected_review().map(|r| r.id) {
                    Some(review)
                        if self.threads.get(&review).is_some_and(|t| t.alert.is_some()) =>
                    {
                        Action::DismissNoteAlert(review)
                    }
                    _ => Action::None,
                }
            }
            KeyCode::Char('/') => {
                self.input = InputMode::Search(self.filters.search().to_string());
                Action::None
            }
            KeyCode::Char('m') => {
                let month = cycle(&self.months, self.filters.month());
                self.change_filters(self.filters.with_month(month))
            }
            KeyCode::Char('r') => {
                let ratings: Vec<Rating> = Rating::all_descending().collect();
                let rating = cycle(&ratings, self.filters.min_rating());
                self.change_filters(self.filters.with_min_rating(rating))
            }
            KeyCode::Char('s') => {
                let sentiment = cycle(&Sentiment::ALL, self.filters.sentiment());
                self.change_filters(self.filters.with_sentiment(sentiment))
            }
            KeyCode::Char('a') => {
                let aspect = cycle(&Aspect::ALL, self.filters.aspect());
                self.change_filters(self.filters.with_aspect(aspect))
            }
            KeyCode::Char('c') => self.change_filters(self.filters.cleared()),
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected + 1 < self.reviews().len() {
                    self.selected += 1;
                }
                Action::None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                Action::None
            }
            KeyCode::Enter => match self.selected_review() {
                Some(review) => Action::ToggleNotes(review.id),
                None => Action::None,
            },
            KeyCode::Char('n') => {
                let Some(review) = self.selected_review().map(|r| r.id) else {
                    return Action::None;
                };
                let draft = self
                    .threads
                    .get(&review)
                    .map(|t| t.draft.clone())
                    .unwrap_or_default();
                self.input = InputMode::Note(review, draft);
                Action::None
            }
            KeyCode::Char('e') => {
                if self.filters.month().is_none() {
                    self.set_alert(MONTH_REQUIRED, true);
                    return Action::None;
                }
                if self.export_busy {
                    return Action::None;
                }
                self.export_busy = true;
                Action::Export(self.filters.clone())
            }
            KeyCode::Char('i') => Action::RefreshInsight,
            KeyCode::Char('L') => Action::Logout,
            _ => Action::None,
        }
    }

    fn handle_search_key(&mut self, code: KeyCode, mut buffer: String) -> Action {
        match code {
            KeyCode::Esc => {
                self.input = InputMode::Normal;
                Action::None
            }
            KeyCode::Enter => {
                self.input = InputMode::Normal;
                self.change_filters(self.filters.with_search(buffer.trim()))
            }
            KeyCode::Backspace => {
                buffer.pop();
                self.input = InputMode::Search(buffer);
                Action::None
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                self.input = InputMode::Search(buffer);
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_note_key(&mut self, code: KeyCode, review: ReviewId, mut buffer: String) -> Action {
        let submitting = self.threads.get(&review).is_some_and(|t| t.submitting);
        match code {
            KeyCode::Esc => {
                self.input = InputMode::Normal;
                Action::SaveDraft(review, buffer)
            }
            // Disabled while a submission for this review is outstanding
            KeyCode::Enter if submitting => Action::None,
            KeyCode::Enter => {
                if buffer.trim().is_empty() {
                    self.set_alert("Note content is required", true);
                    return Action::None;
                }
                self.input = InputMode::Normal;
                Action::SubmitNote(review, buffer)
            }
            KeyCode::Backspace => {
                buffer.pop();
                self.input = InputMode::Note(review, buffer);
                Action::None
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                self.input = InputMode::Note(review, buffer);
                Action::None
            }
            _ => Action::None,
        }
    }

    fn change_filters(&mut self, next: FilterState) -> Action {
        if next == self.filters {
            return Action::None;
        }
        self.filters = next.clone();
        self.selected = 0;
        Action::ApplyFilters(next)
    }

    fn enter_dashboard(&mut self) {
        let api = self.api.clone();
        self.services = Some(Services {
            queries: Arc::new(DashboardQueries::new(
                api.clone(),
                self.session.clone(),
                self.cache_capacity,
            )),
            notes: Arc::new(NotesBook::new(api.clone(), self.session.clone())),
            exporter: Arc::new(ReportExporter::new(
                api,
                self.session.clone(),
                self.download_dir.clone(),
            )),
        });
        self.screen = Screen::Dashboard;
        self.login = LoginForm::default();
        self.input = InputMode::Normal;
        self.selected = 0;

        if let Some(services) = &self.services {
            let queries = services.queries.clone();
            let filters = self.filters.clone();
            self.spawn(async move { queries.mount(filters).await.map(|_| None) });
        }
    }

    fn leave_dashboard(&mut self, message: Option<String>) {
        self.services = None;
        self.dashboard = None;
        self.threads.clear();
        self.filters = FilterState::new();
        self.export_busy = false;
        self.alert = None;
        self.input = InputMode::Normal;
        self.screen = Screen::Login;
        self.login = LoginForm {
            error: message,
            ..LoginForm::default()
        };
    }

    /// Run a core operation in the background, reporting failures as alerts
    ///
    /// Authentication failures are not reported: the session guard has
    /// already been cleared and [`App::sync`] returns to the login screen.
    fn spawn<F>(&self, work: F)
    where
        F: std::future::Future<Output = feedback_dash_core::Result<Option<String>>>
            + Send
            + 'static,
    {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            match work.await {
                Ok(Some(notice)) => {
                    let _ = tx.send(AppEvent::Notice(notice));
                }
                Ok(None) => {}
                Err(e) if e.is_auth() => debug!("Background task hit an expired session"),
                Err(e) if e.kind() == ErrorKind::Busy => debug!("{}", e),
                Err(e) => {
                    let _ = tx.send(AppEvent::Alert(e.to_string()));
                }
            }
        });
    }

    /// Execute an action; returns true when the app should quit
    pub fn dispatch(&mut self, action: Action) -> bool {
        match action {
            Action::None => {}
            Action::Quit => return true,
            Action::Login { username, password } => {
                let api = self.api.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let event = match api.login(&username, &password).await {
                        Ok(()) => AppEvent::LoggedIn,
                        Err(e) => AppEvent::LoginFailed(login_failure(&e)),
                    };
                    let _ = tx.send(event);
                });
            }
            Action::Logout => {
                if let Err(e) = self.session.logout() {
                    warn!("Logout failed to clear stored token: {}", e);
                }
                self.leave_dashboard(None);
            }
            other => {
                let Some(services) = &self.services else {
                    return false;
                };
                match other {
                    Action::ApplyFilters(filters) => {
                        let queries = services.queries.clone();
                        self.spawn(async move { queries.apply_filters(filters).await.map(|_| None) });
                    }
                    Action::Retry => {
                        let queries = services.queries.clone();
                        self.spawn(async move { queries.retry().await.map(|_| None) });
                    }
                    Action::RefreshInsight => {
                        let queries = services.queries.clone();
                        self.spawn(async move { queries.refresh_insight().await.map(|_| None) });
                    }
                    Action::ToggleNotes(review) => {
                        let notes = services.notes.clone();
                        self.spawn(async move { notes.toggle(review).await.map(|_| None) });
                    }
                    Action::SaveDraft(review, draft) => {
                        let notes = services.notes.clone();
                        self.spawn(async move {
                            notes.set_draft(review, draft).await;
                            Ok::<_, DashboardError>(None)
                        });
                    }
                    Action::SubmitNote(review, content) => {
                        let notes = services.notes.clone();
                        let tx = self.events_tx.clone();
                        tokio::spawn(async move {
                            let event = match notes.submit(review, content.clone()).await {
                                Ok(_) => AppEvent::Notice(format!("Note added to review #{review}")),
                                Err(e) if e.is_auth() => return,
                                Err(e) if e.kind() == ErrorKind::Busy => {
                                    AppEvent::NoteBusy(review, content)
                                }
                                Err(e) => AppEvent::Alert(e.to_string()),
                            };
                            let _ = tx.send(event);
                        });
                    }
                    Action::DismissNoteAlert(review) => {
                        let notes = services.notes.clone();
                        self.spawn(async move {
                            notes.dismiss_alert(review).await;
                            Ok::<_, DashboardError>(None)
                        });
                    }
                    Action::Export(filters) => {
                        let exporter = services.exporter.clone();
                        let tx = self.events_tx.clone();
                        tokio::spawn(async move {
                            let event = match exporter.export(&filters).await {
                                Ok(report) => AppEvent::Notice(format!(
                                    "Saved {}",
                                    report.path.display()
                                )),
                                Err(e) if e.is_auth() => return,
                                Err(e) if e.kind() == ErrorKind::Busy => {
                                    debug!("{}", e);
                                    return;
                                }
                                Err(DashboardError::Validation(message)) => AppEvent::Alert(message),
                                Err(e) => {
                                    warn!("{}: {}", EXPORT_FAILED, e);
                                    AppEvent::Alert(EXPORT_FAILED.to_string())
                                }
                            };
                            let _ = tx.send(event);
                        });
                    }
                    Action::None | Action::Quit | Action::Login { .. } | Action::Logout => {}
                }
            }
        }
        false
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::LoggedIn => {
                info!("Login succeeded");
                self.enter_dashboard();
            }
            AppEvent::LoginFailed(message) => {
                self.login.pending = false;
                self.login.password.clear();
                self.login.error = Some(message);
            }
            AppEvent::Alert(message) => self.set_alert(message, true),
            AppEvent::Notice(message) => self.set_alert(message, false),
            AppEvent::NoteBusy(review, content) => {
                self.set_alert(
                    format!("A note for review #{review} is still being saved"),
                    true,
                );
                // Hand the text back to the composer unless the user moved on
                if self.input == InputMode::Normal {
                    self.input = InputMode::Note(review, content);
                }
            }
        }
    }

    /// Drain task outcomes and refresh render state from the services
    pub async fn sync(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }

        if self.screen == Screen::Dashboard && !self.session.is_authenticated() {
            self.leave_dashboard(Some("Session expired, please log in again".to_string()));
            return;
        }

        let Some(services) = &self.services else {
            return;
        };
        let snapshot = services.queries.snapshot().await;
        self.export_busy = services.exporter.is_busy();

        let mut threads = HashMap::new();
        if let Some(reviews) = snapshot.reviews.value() {
            for review in reviews {
                let thread = services.notes.view(review.id).await;
                if thread.state == ThreadState::Expanded
                    || thread.submitting
                    || thread.alert.is_some()
                    || !thread.draft.is_empty()
                {
                    threads.insert(review.id, thread);
                }
            }
        }
        self.threads = threads;

        let count = snapshot.reviews.value().map_or(0, Vec::len);
        if self.selected >= count {
            self.selected = count.saturating_sub(1);
        }
        self.dashboard = Some(snapshot);
    }
}

fn login_failure(error: &DashboardError) -> String {
    match error.kind() {
        ErrorKind::Auth => "Invalid credentials".to_string(),
        _ => format!("Login failed: {error}"),
    }
}
