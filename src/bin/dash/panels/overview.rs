//! KPI summary and weekly insight

use crate::colors::DashboardColors;
use feedback_dash_core::DashboardMetrics;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub struct OverviewPanel<'a> {
    metrics: &'a DashboardMetrics,
    insight: &'a str,
    insight_loading: bool,
}

impl<'a> OverviewPanel<'a> {
    pub fn new(metrics: &'a DashboardMetrics, insight: &'a str) -> Self {
        Self {
            metrics,
            insight,
            insight_loading: false,
        }
    }

    pub fn insight_loading(mut self, loading: bool) -> Self {
        self.insight_loading = loading;
        self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let label = Style::default().fg(DashboardColors::HEADER);
        let value = Style::default()
            .fg(DashboardColors::TEXT)
            .add_modifier(Modifier::BOLD);

        let mut insight_title = vec![Span::styled("Weekly insight", label)];
        if self.insight_loading {
            insight_title.push(Span::styled(
                " (updating)",
                Style::default().fg(DashboardColors::LOADING),
            ));
        }
        insight_title.push(Span::styled(
            "  [i] refresh",
            Style::default().fg(DashboardColors::SECONDARY),
        ));

        let lines = vec![
            Line::from(vec![
                Span::styled("Total reviews   ", label),
                Span::styled(self.metrics.total_reviews.to_string(), value),
            ]),
            Line::from(vec![
                Span::styled("Average rating  ", label),
                Span::styled(format!("{:.1} / 5", self.metrics.average_rating), value),
            ]),
            Line::raw(""),
            Line::from(insight_title),
            Line::styled(self.insight, Style::default().fg(DashboardColors::TEXT)),
        ];

        let panel = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(" Overview ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DashboardColors::BORDER)),
        );
        frame.render_widget(panel, area);
    }
}
