//! Login form

use crate::app::{LoginField, LoginForm};
use crate::colors::DashboardColors;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub struct LoginPanel<'a> {
    form: &'a LoginForm,
    api_url: &'a str,
}

impl<'a> LoginPanel<'a> {
    pub fn new(form: &'a LoginForm, api_url: &'a str) -> Self {
        Self { form, api_url }
    }

    fn field(&self, label: &'static str, value: String, field: LoginField) -> Line<'static> {
        let focused = self.form.focus == field;
        let style = if focused {
            Style::default()
                .fg(DashboardColors::HIGHLIGHT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DashboardColors::TEXT)
        };
        let cursor = if focused { "_" } else { "" };
        Line::from(vec![
            Span::styled(format!("{label:<10}"), Style::default().fg(DashboardColors::HEADER)),
            Span::styled(format!("{value}{cursor}"), style),
        ])
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let [_, middle, _] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(9),
                Constraint::Fill(1),
            ])
            .areas(area);

        let status = if self.form.pending {
            Line::styled("Signing in...", Style::default().fg(DashboardColors::LOADING))
        } else if let Some(error) = &self.form.error {
            Line::styled(error.clone(), Style::default().fg(DashboardColors::ERROR))
        } else {
            Line::styled(
                "Tab: switch field   Enter: sign in   Esc: quit",
                Style::default().fg(DashboardColors::SECONDARY),
            )
        };

        let lines = vec![
            Line::styled(
                format!("Admin sign-in for {}", self.api_url),
                Style::default().fg(DashboardColors::SECONDARY),
            ),
            Line::raw(""),
            self.field("Username", self.form.username.clone(), LoginField::Username),
            self.field(
                "Password",
                "*".repeat(self.form.password.chars().count()),
                LoginField::Password,
            ),
            Line::raw(""),
            status,
        ];

        let form = Paragraph::new(lines).block(
            Block::default()
                .title(" Feedback Analytics ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DashboardColors::BORDER)),
        );
        frame.render_widget(form, middle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::test_support::render_to_string;

    #[test]
    fn test_password_is_masked() {
        let form = LoginForm {
            username: "admin".into(),
            password: "hunter2".into(),
            focus: LoginField::Password,
            ..LoginForm::default()
        };
        let text = render_to_string(60, 12, |f, area| {
            LoginPanel::new(&form, "http://localhost:8000").render(f, area)
        });
        assert!(text.contains("admin"));
        assert!(text.contains("*******_"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn test_error_shown() {
        let form = LoginForm {
            error: Some("Invalid credentials".into()),
            ..LoginForm::default()
        };
        let text = render_to_string(60, 12, |f, area| LoginPanel::new(&form, "x").render(f, area));
        assert!(text.contains("Invalid credentials"));
    }
}
