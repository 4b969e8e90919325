//! Feedback Dash - terminal analytics dashboard
//!
//! Shows review metrics, the sentiment trend, the rating distribution, the
//! weekly insight and the filtered review list with per-review admin notes.
//!
//! Usage:
//!   feedback-dash [OPTIONS]
//!
//! Examples:
//!   feedback-dash                              # Backend from config
//!   feedback-dash --api http://localhost:8000
//!   feedback-dash --refresh 100                # Faster input polling (ms)

mod app;
mod colors;
mod panels;

use anyhow::{Context as _, Result};
use app::{App, InputMode, Screen};
use clap::Parser;
use colors::DashboardColors;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use feedback_dash_core::config::data_dir;
use feedback_dash_core::{logging, DashboardConfig, DashboardView, HttpFeedbackApi, SessionGuard};
use panels::{
    DistributionPanel, ErrorScreen, FilterBar, HeaderPanel, LoadingScreen, LoginPanel,
    OverviewPanel, ReviewsPanel, TrendPanel,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error};

/// Dashboard CLI arguments
#[derive(Parser)]
#[command(name = "feedback-dash")]
#[command(about = "Terminal analytics dashboard for the customer-feedback service")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config)
    #[arg(long)]
    api: Option<String>,

    /// Input poll interval in milliseconds (overrides config)
    #[arg(long)]
    refresh: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        DashboardConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(api) = args.api {
        config.api_url = api;
    }
    if let Some(refresh) = args.refresh {
        config.refresh_ms = refresh;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    // Log to a file so output never lands on the alternate screen
    let log_path = data_dir()?.join("feedback-dash.log");
    logging::init_file(&config.log_level, &log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    debug!("Dashboard v{} starting...", env!("CARGO_PKG_VERSION"));
    debug!("API URL: {}", config.api_url);

    let session = Arc::new(SessionGuard::persistent(&config.session_file)?);
    let api = Arc::new(HttpFeedbackApi::from_config(&config, session)?);
    let mut app = App::new(&config, api);
    app.start();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &config).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!("Error: {:?}", err);
        return Err(err);
    }

    debug!("Dashboard exiting cleanly");
    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    config: &DashboardConfig,
) -> Result<()> {
    let poll = config.refresh_interval();

    loop {
        app.sync().await;
        terminal.draw(|f| draw(f, app, &config.api_url))?;

        // Input poll doubles as the frame interval; fetches run on their own tasks
        if event::poll(poll)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let action = app.handle_key(key);
                    if app.dispatch(action) {
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn draw(f: &mut Frame, app: &App, api_url: &str) {
    let area = f.area();

    if app.screen == Screen::Login {
        LoginPanel::new(&app.login, api_url).render(f, area);
        return;
    }

    let Some(snapshot) = app.dashboard.as_ref() else {
        LoadingScreen.render(f, area);
        return;
    };

    let view = match snapshot.view() {
        DashboardView::Loading => {
            LoadingScreen.render(f, area);
            return;
        }
        DashboardView::Failed { message } => {
            ErrorScreen::new(message).render(f, area);
            return;
        }
        DashboardView::Ready(view) => view,
    };

    let [header_area, filter_area, summary_area, reviews_area, footer_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(9),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .areas(area);

    let export_label = app.export_label();
    HeaderPanel::new(&export_label, app.filters.month().is_some() && !app.export_busy)
        .refreshing(view.metrics_refreshing)
        .render(f, header_area);

    let search_buffer = match &app.input {
        InputMode::Search(buffer) => Some(buffer.as_str()),
        _ => None,
    };
    FilterBar::new(&app.filters)
        .editing(search_buffer)
        .render(f, filter_area);

    let [overview_area, trend_area, distribution_area] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .areas(summary_area);
    OverviewPanel::new(view.metrics, view.insight)
        .insight_loading(view.insight_loading)
        .render(f, overview_area);
    TrendPanel::new(&view.metrics.monthly_trend).render(f, trend_area);
    DistributionPanel::new(view.metrics).render(f, distribution_area);

    let composing = match &app.input {
        InputMode::Note(review, text) => Some((*review, text.as_str())),
        _ => None,
    };
    ReviewsPanel::new(view.reviews, &app.threads)
        .selected(app.selected)
        .loading(view.reviews_loading)
        .composing(composing)
        .render(f, reviews_area);

    // Footer: transient alert, else key help
    let footer = match &app.alert {
        Some(alert) => Paragraph::new(format!("{}  (Esc to dismiss)", alert.message)).style(
            Style::default().fg(if alert.is_error {
                DashboardColors::ERROR
            } else {
                DashboardColors::POSITIVE
            }),
        ),
        None => Paragraph::new(
            "/ search | r m s a facets | c clear | j k select | Enter notes | n note | e export | i insight | L logout | q quit",
        )
        .style(Style::default().fg(Color::Gray)),
    };
    f.render_widget(footer, footer_area);
}
