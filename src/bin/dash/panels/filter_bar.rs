//! Active facets and the search input

use crate::colors::DashboardColors;
use feedback_dash_core::FilterState;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub struct FilterBar<'a> {
    filters: &'a FilterState,
    /// Search text being edited, if the search box has focus
    editing: Option<&'a str>,
}

impl<'a> FilterBar<'a> {
    pub fn new(filters: &'a FilterState) -> Self {
        Self {
            filters,
            editing: None,
        }
    }

    pub fn editing(mut self, buffer: Option<&'a str>) -> Self {
        self.editing = buffer;
        self
    }

    fn facet(key: char, label: &'static str, value: Option<String>) -> Vec<Span<'static>> {
        let value_style = match value {
            Some(_) => Style::default()
                .fg(DashboardColors::HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
            None => Style::default().fg(DashboardColors::SECONDARY),
        };
        vec![
            Span::styled(format!("[{key}] "), Style::default().fg(DashboardColors::SECONDARY)),
            Span::styled(format!("{label}: "), Style::default().fg(DashboardColors::HEADER)),
            Span::styled(value.unwrap_or_else(|| "All".to_string()), value_style),
            Span::raw("   "),
        ]
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        spans.extend(Self::facet(
            'r',
            "Rating",
            self.filters.min_rating().map(|r| format!("{r}+ stars")),
        ));
        spans.extend(Self::facet(
            'm',
            "Month",
            self.filters.month().map(|m| m.to_string()),
        ));
        spans.extend(Self::facet(
            's',
            "Sentiment",
            self.filters.sentiment().map(|s| s.to_string()),
        ));
        spans.extend(Self::facet(
            'a',
            "Aspect",
            self.filters.aspect().map(|a| a.label().to_string()),
        ));

        spans.push(Span::styled("[/] ", Style::default().fg(DashboardColors::SECONDARY)));
        spans.push(Span::styled("Search: ", Style::default().fg(DashboardColors::HEADER)));
        match self.editing {
            Some(buffer) => spans.push(Span::styled(
                format!("{buffer}_"),
                Style::default()
                    .fg(DashboardColors::TEXT)
                    .add_modifier(Modifier::UNDERLINED),
            )),
            None if self.filters.search().is_empty() => spans.push(Span::styled(
                "-",
                Style::default().fg(DashboardColors::SECONDARY),
            )),
            None => spans.push(Span::styled(
                format!("\"{}\"", self.filters.search()),
                Style::default().fg(DashboardColors::HIGHLIGHT),
            )),
        }

        let bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .title(" Filters ([c] clear) ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DashboardColors::BORDER)),
        );
        frame.render_widget(bar, area);
    }
}
