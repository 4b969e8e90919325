//! Per-review admin note threads
//!
//! Each review row owns a [`NoteThread`] that starts collapsed. Notes are only
//! fetched while a thread is expanded, and the fetched list stays cached when
//! the thread is collapsed again, so re-expanding does not hit the backend
//! until a successful submission invalidates it.

use crate::client::FeedbackApi;
use crate::error::{DashboardError, Result};
use crate::query::{LoadOutcome, QuerySlot, QueryState};
use crate::session::SessionGuard;
use crate::types::{Note, ReviewId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const EMPTY_THREAD_MESSAGE: &str = "No notes yet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadState {
    #[default]
    Collapsed,
    Expanded,
}

impl ThreadState {
    fn toggled(self) -> Self {
        match self {
            Self::Collapsed => Self::Expanded,
            Self::Expanded => Self::Collapsed,
        }
    }
}

#[derive(Debug, Default)]
struct ThreadUi {
    state: ThreadState,
    draft: String,
    alert: Option<String>,
}

/// Notes, composer and submission state for one review
pub struct NoteThread {
    review: ReviewId,
    notes: QuerySlot<(), Vec<Note>>,
    ui: Mutex<ThreadUi>,
    submitting: AtomicBool,
}

/// Clears the submission flag when the attempt finishes, however it ends
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl NoteThread {
    fn new(review: ReviewId) -> Self {
        Self {
            review,
            notes: QuerySlot::new("notes", 1),
            ui: Mutex::new(ThreadUi::default()),
            submitting: AtomicBool::new(false),
        }
    }

    pub fn review(&self) -> ReviewId {
        self.review
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Requests issued for this thread's notes
    pub async fn fetch_count(&self) -> u64 {
        self.notes.request_count().await
    }
}

/// What a thread shows beneath its review row
#[derive(Debug, Clone, PartialEq)]
pub enum ThreadView {
    Hidden,
    Loading,
    Empty,
    Notes(Vec<Note>),
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadSnapshot {
    pub review: ReviewId,
    pub state: ThreadState,
    pub view: ThreadView,
    pub draft: String,
    pub submitting: bool,
    pub alert: Option<String>,
}

/// All note threads for the current session
pub struct NotesBook {
    api: Arc<dyn FeedbackApi>,
    session: Arc<SessionGuard>,
    threads: Mutex<HashMap<ReviewId, Arc<NoteThread>>>,
}

impl NotesBook {
    pub fn new(api: Arc<dyn FeedbackApi>, session: Arc<SessionGuard>) -> Self {
        Self {
            api,
            session,
            threads: Mutex::new(HashMap::new()),
        }
    }

    pub async fn thread(&self, review: ReviewId) -> Arc<NoteThread> {
        self.threads
            .lock()
            .await
            .entry(review)
            .or_insert_with(|| Arc::new(NoteThread::new(review)))
            .clone()
    }

    /// Flip a row between collapsed and expanded, loading notes on expand
    pub async fn toggle(&self, review: ReviewId) -> Result<ThreadState> {
        let thread = self.thread(review).await;
        let state = {
            let mut ui = thread.ui.lock().await;
            ui.state = ui.state.toggled();
            ui.state
        };
        debug!("Notes for review {} now {:?}", review, state);

        if state == ThreadState::Expanded {
            self.load(&thread).await?;
        }
        Ok(state)
    }

    /// Fetch the thread's notes unless already cached
    pub async fn load(&self, thread: &NoteThread) -> Result<()> {
        self.session.admit()?;
        let generation = self.session.generation();
        let review = thread.review;
        let outcome = thread
            .notes
            .load((), || self.api.fetch_notes(review))
            .await;

        if let LoadOutcome::Failed(error) = outcome {
            if error.is_auth() {
                self.session.expire(generation, "note fetch was rejected");
                return Err(error);
            }
            // Rendered through the thread's own state; the row stays usable
            debug!("Notes for review {} unavailable: {}", review, error);
        }
        Ok(())
    }

    pub async fn set_draft(&self, review: ReviewId, draft: impl Into<String>) {
        let thread = self.thread(review).await;
        thread.ui.lock().await.draft = draft.into();
    }

    /// Store `content` as the draft and submit it
    ///
    /// While a submission for the review is outstanding this fails with
    /// [`DashboardError::InFlight`] and leaves the stored draft untouched.
    pub async fn submit(&self, review: ReviewId, content: impl Into<String>) -> Result<Note> {
        let thread = self.thread(review).await;
        if thread.is_submitting() {
            return Err(DashboardError::InFlight("note submission"));
        }
        thread.ui.lock().await.draft = content.into();
        self.submit_draft(review).await
    }

    /// Submit the thread's current draft
    pub async fn submit_draft(&self, review: ReviewId) -> Result<Note> {
        let thread = self.thread(review).await;
        let draft = thread.ui.lock().await.draft.clone();
        self.add_note(review, &draft).await
    }

    /// Attach a note to a review
    ///
    /// Blank content is rejected without a request. While a submission for
    /// the same review is outstanding further attempts fail with
    /// [`DashboardError::InFlight`]. On success the thread's cache is
    /// invalidated, the draft cleared and, if expanded, the notes re-fetched.
    /// On failure the draft is kept and an alert recorded.
    pub async fn add_note(&self, review: ReviewId, content: &str) -> Result<Note> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DashboardError::validation("Note content is required"));
        }
        self.session.admit()?;
        let generation = self.session.generation();

        let thread = self.thread(review).await;
        if thread
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DashboardError::InFlight("note submission"));
        }
        let _guard = SubmitGuard(&thread.submitting);

        match self.api.add_note(review, content).await {
            Ok(note) => {
                info!("Added note {} to review {}", note.id.0, review);
                thread.notes.invalidate().await;
                let expanded = {
                    let mut ui = thread.ui.lock().await;
                    ui.draft.clear();
                    ui.alert = None;
                    ui.state == ThreadState::Expanded
                };
                if expanded {
                    self.load(&thread).await?;
                }
                Ok(note)
            }
            Err(error) => {
                warn!("Failed to add note to review {}: {}", review, error);
                if error.is_auth() {
                    self.session.expire(generation, "note submission was rejected");
                }
                thread.ui.lock().await.alert = Some("Failed to add note".to_string());
                Err(error)
            }
        }
    }

    pub async fn dismiss_alert(&self, review: ReviewId) {
        let thread = self.thread(review).await;
        thread.ui.lock().await.alert = None;
    }

    /// Render state of a thread; rows never interacted with are not tracked
    pub async fn view(&self, review: ReviewId) -> ThreadSnapshot {
        let tracked = self.threads.lock().await.get(&review).cloned();
        let Some(thread) = tracked else {
            return ThreadSnapshot {
                review,
                state: ThreadState::Collapsed,
                view: ThreadView::Hidden,
                draft: String::new(),
                submitting: false,
                alert: None,
            };
        };
        let ui = thread.ui.lock().await;

        let view = match ui.state {
            ThreadState::Collapsed => ThreadView::Hidden,
            ThreadState::Expanded => match thread.notes.state().await {
                QueryState::Idle => ThreadView::Loading,
                QueryState::Loading { previous: Some(notes) } if !notes.is_empty() => {
                    ThreadView::Notes(notes)
                }
                QueryState::Loading { .. } => ThreadView::Loading,
                QueryState::Ready(notes) if notes.is_empty() => ThreadView::Empty,
                QueryState::Ready(notes) => ThreadView::Notes(notes),
                QueryState::Failed { message } => ThreadView::Unavailable(message),
            },
        };

        ThreadSnapshot {
            review,
            state: ui.state,
            view,
            draft: ui.draft.clone(),
            submitting: thread.is_submitting(),
            alert: ui.alert.clone(),
        }
    }
}
