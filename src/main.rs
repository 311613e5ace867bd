use std::{io, path::PathBuf, sync::Arc, time::Duration};
use tui::{
    backend::CrosstermBackend,
    Terminal,
};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;

mod app;
mod models;
mod services;
mod utils;

use app::filter::{Filter, SortColumn};
use app::state::{App, AppEvent, InputMode, Job};
use app::ui;
use models::config::Config;
use services::api::{EscClient, ReportSource};
use services::{chart, logger};

#[derive(Parser)]
#[command(name = "stock-report")]
#[command(about = "Portfolio analysis report for a trading-game user", long_about = None)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Open the report for this user immediately
    #[arg(short, long)]
    user: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    logger::init(&config.log_file);

    let source: Arc<dyn ReportSource> =
        Arc::new(EscClient::new(&config.base_url, config.request_timeout_secs)?);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app and run it
    let app = App::new(config);
    let res = run_app(&mut terminal, app, source, cli.user).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        logger::log_error("Application Error", &format!("{:?}", err))?;
        println!("{:?}", err)
    }

    Ok(())
}

/// Runs one job on the runtime and posts its outcome back to the UI loop.
fn spawn_job(job: Job, source: Arc<dyn ReportSource>, tx: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let event = match job {
            Job::Positions { session, user_id } => AppEvent::Positions {
                session,
                result: source.fetch_positions(&user_id).await.map_err(|e| e.to_string()),
            },
            Job::TopRanker { session } => AppEvent::TopRanker {
                session,
                result: source.fetch_top_ranker().await.map_err(|e| e.to_string()),
            },
            Job::Chart { session, generation, tickers } => AppEvent::Chart {
                session,
                generation,
                batch: chart::fetch_batch(source.as_ref(), &tickers).await,
            },
        };
        if tx.send(event).await.is_err() {
            logger::log_error("Event Channel", "UI loop is gone, dropping result").unwrap_or(());
        }
    });
}

async fn run_app<B: tui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    source: Arc<dyn ReportSource>,
    initial_user: Option<String>,
) -> io::Result<()> {
    let (tx, mut rx) = mpsc::channel(32);
    let dispatch = |jobs: Vec<Job>| {
        for job in jobs {
            spawn_job(job, source.clone(), tx.clone());
        }
    };

    if let Some(user) = initial_user {
        dispatch(app.open_report(&user));
    }

    loop {
        // Apply finished network work
        while let Ok(event) = rx.try_recv() {
            dispatch(app.handle_event(event));
        }

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if app.is_open() {
                    match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Esc | KeyCode::Char('x') => app.close_report(),
                        KeyCode::Down | KeyCode::Char('j') => app.next(),
                        KeyCode::Up | KeyCode::Char('k') => app.previous(),
                        KeyCode::Enter => dispatch(app.activate_cursor()),
                        KeyCode::Char('f') => dispatch(app.toggle_filter()),
                        KeyCode::Char('w') => dispatch(app.set_filter(Filter::Winners)),
                        KeyCode::Char('l') => dispatch(app.set_filter(Filter::Losers)),
                        KeyCode::Char(c @ '1'..='5') => {
                            let index = c as usize - '1' as usize;
                            app.click_column(SortColumn::ALL[index]);
                        }
                        _ => {}
                    }
                } else {
                    match app.input_mode {
                        InputMode::Normal => match key.code {
                            KeyCode::Char('q') => return Ok(()),
                            KeyCode::Char('e') | KeyCode::Enter => app.enter_edit_mode(),
                            _ => {}
                        },
                        InputMode::Editing => match key.code {
                            KeyCode::Enter => dispatch(app.submit_input()),
                            KeyCode::Esc => app.exit_edit_mode(),
                            KeyCode::Char(c) => app.input.push(c),
                            KeyCode::Backspace => {
                                app.input.pop();
                            }
                            _ => {}
                        },
                    }
                }
            }
        }

        // Draw UI
        terminal.draw(|f| ui::draw(f, &mut app))?;
    }
}
