//! Admin note commands

use super::context::Context;
use super::render;
use clap::Subcommand;
use feedback_dash_core::notes::EMPTY_THREAD_MESSAGE;
use feedback_dash_core::{DashboardError, NotesBook, Result, ReviewId, ThreadView};

#[derive(Subcommand)]
pub enum NotesAction {
    /// Show the notes attached to a review
    List {
        /// Review id
        review: i64,
    },

    /// Attach a note to a review
    Add {
        /// Review id
        review: i64,

        /// Note text
        content: String,
    },
}

/// Handle `feedback notes`
pub async fn handle(ctx: &Context, action: NotesAction) -> Result<()> {
    let book = NotesBook::new(ctx.api.clone(), ctx.session.clone());

    match action {
        NotesAction::List { review } => {
            let review = ReviewId(review);
            book.toggle(review).await?;
            match book.view(review).await.view {
                ThreadView::Notes(notes) => {
                    for note in &notes {
                        println!("{}", render::note(note));
                    }
                }
                ThreadView::Empty => println!("{EMPTY_THREAD_MESSAGE}"),
                ThreadView::Unavailable(message) => return Err(DashboardError::Other(message)),
                ThreadView::Hidden | ThreadView::Loading => {}
            }
            Ok(())
        }
        NotesAction::Add { review, content } => {
            let note = book.add_note(ReviewId(review), &content).await?;
            println!("Added note {} to review #{}", note.id.0, review);
            Ok(())
        }
    }
}
