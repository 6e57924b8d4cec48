// main.rs for thermocarte, a terminal temperature map of French départements
mod app;
mod color;
mod config;
mod dataset;
mod error;
mod event;
mod export;
mod geo;
mod months;
mod panel;
mod render;
mod ui;
mod view;

use anyhow::{Context, Result, bail};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use crate::app::{App, Message};
use crate::config::{Cli, Command, Paths};
use crate::dataset::{FsFetcher, default_sources, load_all};
use crate::geo::{BoundaryInfo, RegionCode, load_boundaries};
use crate::panel::PanelState;

const TICK_RATE: Duration = Duration::from_millis(50);

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Export { region }) => {
            fmt().with_env_filter(env_filter()).with_writer(io::stderr).init();
            run_export(&cli.paths, cli.month, region)
        }
        None => {
            // The terminal belongs to the interface, so logs go to a file.
            let log_file = fs::File::create(&cli.paths.log_file)
                .with_context(|| format!("creating log file {}", cli.paths.log_file.display()))?;
            fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .init();
            run_tui(&cli.paths, cli.month)
        }
    }
}

/// Loads boundaries and every département series, then builds the state.
fn load_app(paths: &Paths) -> Result<(App, String)> {
    info!(path = %paths.geojson.display(), "loading boundaries");
    let boundaries = load_boundaries(&paths.geojson)
        .with_context(|| format!("loading boundaries from {}", paths.geojson.display()))?;
    let boundary_info = BoundaryInfo::gather(&paths.geojson, &boundaries);
    info!(features = boundaries.regions.len(), "boundaries loaded");

    let sources = default_sources(&paths.data_dir);
    let (table, report) = load_all(&FsFetcher, &sources);

    let app = App::new(boundaries, boundary_info, table, paths.output_dir.clone());
    Ok((app, report.summary()))
}

fn month_position(app: &App, month: months::MonthKey) -> Result<usize> {
    match app.months.iter().position(|m| *m == month) {
        Some(index) => Ok(index),
        None => bail!(
            "month {} is outside {}..{}",
            month,
            app.months[0],
            app.months[app.months.len() - 1]
        ),
    }
}

fn run_export(paths: &Paths, month: Option<months::MonthKey>, region: Option<String>) -> Result<()> {
    let (mut app, summary) = load_app(paths)?;
    info!("{}", summary);

    let now = Instant::now();
    if let Some(month) = month {
        let index = month_position(&app, month)?;
        app.handle(Message::SelectMonth(index), now);
    }
    let bounds = app.boundaries.bbox().map(|b| b.padded(0.05)).unwrap_or(app.viewport.bounds);

    let map = export::export_map(&app.overlay, bounds, &paths.output_dir)?;
    println!("Map written to {}", map.display());

    if let Some(code) = region {
        app.handle(Message::OpenRegion(RegionCode::new(code.as_str())), now);
        let PanelState::Open(panel) = &app.panel else {
            bail!("no département with code '{}' in the boundary file", code);
        };
        let chart = export::export_chart(panel, &app.months, &paths.output_dir)?;
        println!("Trend chart written to {}", chart.display());
    }
    Ok(())
}

fn run_tui(paths: &Paths, month: Option<months::MonthKey>) -> Result<()> {
    let (mut app, summary) = load_app(paths)?;
    if let Some(month) = month {
        let index = month_position(&app, month)?;
        app.handle(Message::SelectMonth(index), Instant::now());
    }
    app.notification = summary;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    // Restore the terminal even if drawing panics.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        default_hook(info);
    }));

    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    let result = event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    info!("exiting");
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let events = event::EventHandler::new(TICK_RATE);
    while !app.quit {
        terminal.draw(|frame| ui::render(frame, app))?;
        let ev = events.next().context("terminal event thread stopped")?;
        if let Some(message) = event::to_message(ev, app.current_screen) {
            app.handle(message, Instant::now());
        }
    }
    Ok(())
}
