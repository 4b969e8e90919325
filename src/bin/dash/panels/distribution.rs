//! Rating distribution bar chart

use crate::colors::DashboardColors;
use feedback_dash_core::types::RatingTone;
use feedback_dash_core::{DashboardMetrics, Rating};
use ratatui::{
    layout::{Direction, Rect},
    style::Style,
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};

pub struct DistributionPanel<'a> {
    metrics: &'a DashboardMetrics,
}

impl<'a> DistributionPanel<'a> {
    pub fn new(metrics: &'a DashboardMetrics) -> Self {
        Self { metrics }
    }

    /// One bar per rating, 5 stars first; missing ratings count as zero
    fn bars(&self) -> Vec<Bar<'static>> {
        Rating::all_descending()
            .map(|rating| {
                let color = DashboardColors::tone(RatingTone::of(rating.value()));
                Bar::default()
                    .value(self.metrics.count_for(rating))
                    .label(Line::from(format!("{rating}★")))
                    .style(Style::default().fg(color))
                    .value_style(Style::default().fg(DashboardColors::TEXT))
            })
            .collect()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let bars = self.bars();
        let chart = BarChart::default()
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .data(BarGroup::default().bars(&bars))
            .block(
                Block::default()
                    .title(" Rating distribution ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(DashboardColors::BORDER)),
            );
        frame.render_widget(chart, area);
    }
}
