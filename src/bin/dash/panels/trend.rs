//! Monthly sentiment trend

use crate::colors::DashboardColors;
use feedback_dash_core::types::SentimentBucket;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Width of the stacked bar in cells
const BAR_CELLS: u64 = 20;

pub struct TrendPanel<'a> {
    buckets: &'a [SentimentBucket],
}

impl<'a> TrendPanel<'a> {
    pub fn new(buckets: &'a [SentimentBucket]) -> Self {
        Self { buckets }
    }

    /// Cells for each sentiment, scaled to the busiest month
    fn segments(bucket: &SentimentBucket, busiest: u64) -> [u64; 3] {
        if busiest == 0 {
            return [0; 3];
        }
        let scale = |n: u64| n * BAR_CELLS / busiest;
        [
            scale(bucket.positive),
            scale(bucket.neutral),
            scale(bucket.negative),
        ]
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let busiest = self.buckets.iter().map(SentimentBucket::total).max().unwrap_or(0);

        let lines: Vec<Line> = if self.buckets.is_empty() {
            vec![Line::styled(
                "No trend data",
                Style::default().fg(DashboardColors::SECONDARY),
            )]
        } else {
            self.buckets
                .iter()
                .map(|bucket| {
                    let [pos, neu, neg] = Self::segments(bucket, busiest);
                    Line::from(vec![
                        Span::styled(
                            format!("{:<8} ", bucket.month),
                            Style::default().fg(DashboardColors::HEADER),
                        ),
                        Span::styled(
                            "█".repeat(pos as usize),
                            Style::default().fg(DashboardColors::POSITIVE),
                        ),
                        Span::styled(
                            "█".repeat(neu as usize),
                            Style::default().fg(DashboardColors::NEUTRAL),
                        ),
                        Span::styled(
                            "█".repeat(neg as usize),
                            Style::default().fg(DashboardColors::NEGATIVE),
                        ),
                        Span::styled(
                            format!(" {}", bucket.total()),
                            Style::default().fg(DashboardColors::SECONDARY),
                        ),
                    ])
                })
                .collect()
        };

        let panel = Paragraph::new(lines).block(
            Block::default()
                .title(" Sentiment trend ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DashboardColors::BORDER)),
        );
        frame.render_widget(panel, area);
    }
}
