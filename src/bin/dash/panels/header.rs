//! Title bar with the export button

use crate::colors::DashboardColors;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub struct HeaderPanel<'a> {
    export_label: &'a str,
    export_enabled: bool,
    refreshing: bool,
}

impl<'a> HeaderPanel<'a> {
    pub fn new(export_label: &'a str, export_enabled: bool) -> Self {
        Self {
            export_label,
            export_enabled,
            refreshing: false,
        }
    }

    /// Show the metrics refresh indicator
    pub fn refreshing(mut self, refreshing: bool) -> Self {
        self.refreshing = refreshing;
        self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(DashboardColors::BORDER));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [title_area, button_area] = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Fill(1), Constraint::Length(36)])
            .areas(inner);

        let mut title = vec![Span::styled(
            "Feedback Analytics",
            Style::default()
                .fg(DashboardColors::HEADER)
                .add_modifier(Modifier::BOLD),
        )];
        if self.refreshing {
            title.push(Span::styled(
                "  refreshing...",
                Style::default().fg(DashboardColors::LOADING),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(title)), title_area);

        let button_style = if self.export_enabled {
            Style::default()
                .fg(DashboardColors::POSITIVE)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DashboardColors::SECONDARY)
        };
        let button = Paragraph::new(Line::from(vec![
            Span::styled("[e] ", Style::default().fg(DashboardColors::SECONDARY)),
            Span::styled(self.export_label, button_style),
        ]))
        .right_aligned();
        frame.render_widget(button, button_area);
    }
}
