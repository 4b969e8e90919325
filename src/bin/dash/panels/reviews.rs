//! Review list with per-row note threads

use crate::colors::DashboardColors;
use feedback_dash_core::notes::{ThreadSnapshot, EMPTY_THREAD_MESSAGE};
use feedback_dash_core::{Review, ReviewId, ThreadView};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};
use std::collections::HashMap;

const INDENT: &str = "     ";

pub struct ReviewsPanel<'a> {
    reviews: &'a [Review],
    threads: &'a HashMap<ReviewId, ThreadSnapshot>,
    selected: usize,
    loading: bool,
    /// Review whose note composer has focus, with the text typed so far
    composing: Option<(ReviewId, &'a str)>,
}

impl<'a> ReviewsPanel<'a> {
    pub fn new(reviews: &'a [Review], threads: &'a HashMap<ReviewId, ThreadSnapshot>) -> Self {
        Self {
            reviews,
            threads,
            selected: 0,
            loading: false,
            composing: None,
        }
    }

    pub fn selected(mut self, selected: usize) -> Self {
        self.selected = selected;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn composing(mut self, composing: Option<(ReviewId, &'a str)>) -> Self {
        self.composing = composing;
        self
    }

    fn review_lines(review: &Review) -> Vec<Line<'static>> {
        let tone = DashboardColors::tone(review.tone());
        let sentiment = review.sentiment_label();

        let mut header = vec![
            Span::styled(
                format!("#{:<5}", review.id),
                Style::default().fg(DashboardColors::SECONDARY),
            ),
            Span::styled(
                format!("{}★ ", review.rating),
                Style::default().fg(tone).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{:<9}", review.sentiment.as_deref().unwrap_or("Unknown")),
                Style::default().fg(DashboardColors::sentiment(sentiment)),
            ),
            Span::styled(
                review.created_at.format("%Y-%m-%d ").to_string(),
                Style::default().fg(DashboardColors::SECONDARY),
            ),
        ];
        for tag in review.aspect_tags().tags() {
            header.push(Span::styled(
                format!("[{tag}] "),
                Style::default().fg(DashboardColors::HIGHLIGHT),
            ));
        }

        let mut lines = vec![
            Line::from(header),
            Line::styled(
                format!("{INDENT}{}", review.content),
                Style::default().fg(DashboardColors::TEXT),
            ),
        ];
        if let Some(summary) = review.summary.as_deref().filter(|s| !s.is_empty()) {
            lines.push(Line::styled(
                format!("{INDENT}Summary: {summary}"),
                Style::default().fg(DashboardColors::SECONDARY),
            ));
        }
        if let Some(action) = review.suggested_action.as_deref().filter(|s| !s.is_empty()) {
            lines.push(Line::styled(
                format!("{INDENT}Suggested: {action}"),
                Style::default().fg(DashboardColors::SECONDARY),
            ));
        }
        lines
    }

    fn thread_lines(thread: &ThreadSnapshot) -> Vec<Line<'static>> {
        let muted = Style::default().fg(DashboardColors::SECONDARY);
        let mut lines = Vec::new();
        match &thread.view {
            ThreadView::Hidden => {}
            ThreadView::Loading => {
                lines.push(Line::styled(
                    format!("{INDENT}Loading notes..."),
                    Style::default().fg(DashboardColors::LOADING),
                ));
            }
            ThreadView::Empty => {
                lines.push(Line::styled(format!("{INDENT}{EMPTY_THREAD_MESSAGE}"), muted));
            }
            ThreadView::Notes(notes) => {
                for note in notes {
                    lines.push(Line::from(vec![
                        Span::styled(format!("{INDENT}{} ", note.formatted_timestamp()), muted),
                        Span::styled(note.content.clone(), Style::default().fg(DashboardColors::TEXT)),
                    ]));
                }
            }
            ThreadView::Unavailable(message) => {
                lines.push(Line::styled(
                    format!("{INDENT}Notes unavailable: {message}"),
                    Style::default().fg(DashboardColors::ERROR),
                ));
            }
        }
        if thread.submitting {
            lines.push(Line::styled(
                format!("{INDENT}Adding note..."),
                Style::default().fg(DashboardColors::LOADING),
            ));
        }
        if let Some(alert) = &thread.alert {
            lines.push(Line::styled(
                format!("{INDENT}{alert}"),
                Style::default().fg(DashboardColors::ERROR),
            ));
        }
        lines
    }

    fn composer_line(text: &str) -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("{INDENT}Note> "),
                Style::default().fg(DashboardColors::HEADER),
            ),
            Span::styled(
                format!("{text}_"),
                Style::default()
                    .fg(DashboardColors::TEXT)
                    .add_modifier(Modifier::UNDERLINED),
            ),
        ])
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut title = format!(" Reviews ({}) ", self.reviews.len());
        if self.loading {
            title.push_str("loading... ");
        }
        let block = Block::default()
            .title(title)
            .title_bottom(" [Enter] notes  [n] add note  [j/k] move ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(DashboardColors::BORDER));

        if self.reviews.is_empty() {
            let message = if self.loading {
                "Loading reviews..."
            } else {
                "No reviews match the current filters"
            };
            let empty = List::new(vec![ListItem::new(Line::styled(
                message,
                Style::default().fg(DashboardColors::SECONDARY),
            ))])
            .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = self
            .reviews
            .iter()
            .map(|review| {
                let mut lines = Self::review_lines(review);
                if let Some(thread) = self.threads.get(&review.id) {
                    lines.extend(Self::thread_lines(thread));
                }
                if let Some((id, text)) = self.composing {
                    if id == review.id {
                        lines.push(Self::composer_line(text));
                    }
                }
                lines.push(Line::raw(""));
                ListItem::new(lines)
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }
}
