//! Full-view loading and error states

use crate::colors::DashboardColors;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Blocking indicator for the first metrics load
pub struct LoadingScreen;

impl LoadingScreen {
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let body = Paragraph::new("Loading dashboard...")
            .alignment(Alignment::Center)
            .style(Style::default().fg(DashboardColors::LOADING))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(body, area);
    }
}

/// Terminal metrics failure with retry and logout actions
pub struct ErrorScreen<'a> {
    message: &'a str,
}

impl<'a> ErrorScreen<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { message }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::styled(
                "Error loading dashboard",
                Style::default()
                    .fg(DashboardColors::ERROR)
                    .add_modifier(Modifier::BOLD),
            ),
            Line::raw(""),
            Line::raw(self.message),
            Line::raw(""),
            Line::styled(
                "r: retry   L: logout   q: quit",
                Style::default().fg(DashboardColors::SECONDARY),
            ),
        ];
        let body = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(DashboardColors::ERROR)),
            );
        frame.render_widget(body, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::test_support::render_to_string;

    #[test]
    fn test_error_screen_offers_retry_and_logout() {
        let text = render_to_string(60, 9, |f, area| {
            ErrorScreen::new("Service error (500): boom").render(f, area)
        });
        assert!(text.contains("Error loading dashboard"));
        assert!(text.contains("Service error (500): boom"));
        assert!(text.contains("r: retry"));
        assert!(text.contains("L: logout"));
    }
}
