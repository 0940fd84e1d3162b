use std::{error::Error, io, path::PathBuf, sync::Arc, time::Duration};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use kicks::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    logging,
    observer::ChannelObserver,
    runtime::{CrosstermEventSource, FixedTicker, KickEvent, KickEventSource, Runner, Ticker},
    KickCounter,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use tracing::info;

const TICK_RATE_MS: u64 = 250;

/// fetal movement counter: one-hour sessions, one effective movement per five minutes
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// session length in minutes
    #[clap(short = 's', long)]
    session_mins: Option<u32>,

    /// effective movement window in minutes
    #[clap(short = 'w', long)]
    window_mins: Option<u32>,

    /// cancel without asking for confirmation
    #[clap(long)]
    no_confirm: bool,

    /// write the log here instead of the state directory
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// persist the given options as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    fn apply(&self, cfg: &mut Config) {
        if let Some(mins) = self.session_mins {
            cfg.session_mins = mins;
        }
        if let Some(mins) = self.window_mins {
            cfg.window_mins = mins;
        }
        if self.no_confirm {
            cfg.confirm_cancel = false;
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);
    let cadence = match config.cadence() {
        Ok(cadence) => cadence,
        Err(err) => Cli::command().error(ErrorKind::InvalidValue, err).exit(),
    };
    if cli.save_config {
        store.save(&config)?;
    }

    if !io::stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_path = cli.log_file.clone().unwrap_or_else(AppDirs::log_path);
    logging::init(&log_path)?;
    info!(?config, "starting");

    let rt = tokio::runtime::Runtime::new()?;
    let events = CrosstermEventSource::new();
    let observer = Arc::new(ChannelObserver::new(events.sender()));
    let counter = KickCounter::new(cadence, observer, rt.handle().clone());
    let mut app = App::new(counter, config.confirm_cancel);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));
    let result = start_tui(&mut terminal, &mut app, &runner);

    app.counter.cancel();
    rt.shutdown_background();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    info!("exiting");

    result
}

fn start_tui<B: Backend, E: KickEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            KickEvent::Tick => continue,
            KickEvent::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    break;
                }

                if app.confirming_cancel {
                    match key.code {
                        KeyCode::Char('y') | KeyCode::Char('Y') => app.answer_cancel(true),
                        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                            app.answer_cancel(false)
                        }
                        _ => {}
                    }
                } else {
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') => break,
                        KeyCode::Char(' ') | KeyCode::Enter => app.on_primary(),
                        KeyCode::Char('c') => app.request_cancel(),
                        _ => {}
                    }
                }
            }
            KickEvent::Resize => {}
            notification => app.apply(&notification),
        }
        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
