//! Cue CLI - Binary entry point and terminal session management.
//!
//! # Architecture
//!
//! The CLI loads the config and catalog, builds a [`cue_engine::Player`] and
//! hands it to [`cue_tui::App`], then runs the frame loop inside a RAII
//! terminal session that restores the terminal on every exit path.
//!
//! ```text
//! main() -> load config + catalog -> TerminalSession::new() -> run_app() -> App + TUI
//!                                                                  |
//!                                                                  v
//!                                             restore terminal, print proofs
//! ```
//!
//! # Event Loop
//!
//! A fixed 16ms render cadence:
//!
//! 1. Wait for frame tick
//! 2. Drain input queue (non-blocking via [`cue_tui::InputPump`])
//! 3. Advance host and player clocks (`app.tick()`)
//! 4. Render frame; a panic while rendering becomes the failure screen
//! 5. Check for quit

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::{
    env,
    fs::{self, OpenOptions},
    io::{Stdout, Write, stdout},
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cue_engine::{
    Catalog, CueConfig, EngagementSettings, ListenerRegistry, Player, RecordingNavigator,
    RecordingSink, ui_options,
};
use cue_tui::{App, InputPump, draw, handle_events};

const CATALOG_ENV: &str = "CUE_CATALOG";
const FRAME_DURATION: Duration = Duration::from_millis(16);

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_cue_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: drop logs instead of writing over the TUI.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_cue_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in cue_log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn cue_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.cue/logs/cue.log
    if let Some(config_path) = CueConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("cue.log"));
    }

    // Fallback: ./.cue/logs/cue.log
    candidates.push(PathBuf::from(".cue").join("logs").join("cue.log"));

    candidates
}

/// First argument, then `[catalog] path`, then `$CUE_CATALOG`.
fn resolve_catalog_path(arg: Option<String>, config: Option<&CueConfig>) -> Option<PathBuf> {
    arg.filter(|raw| !raw.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| config.and_then(CueConfig::catalog_path))
        .or_else(|| {
            env::var(CATALOG_ENV)
                .ok()
                .filter(|raw| !raw.trim().is_empty())
                .map(PathBuf::from)
        })
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    let catalog = Catalog::from_json(&json)
        .with_context(|| format!("failed to parse catalog {}", path.display()))?;
    tracing::info!(
        items = catalog.len(),
        rejected = catalog.rejected().len(),
        path = %path.display(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// RAII wrapper for terminal state with guaranteed cleanup on drop.
///
/// Raw mode, bracketed paste and the alternate screen are all undone on drop,
/// so the terminal stays usable after panics or early returns.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen, EnableBracketedPaste) {
            let _ = disable_raw_mode();
            let _ = execute!(out, LeaveAlternateScreen, DisableBracketedPaste);
            return Err(err.into());
        }

        match Terminal::new(CrosstermBackend::new(out)) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen, DisableBracketedPaste);
                Err(err.into())
            }
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        );
        let _ = self.terminal.show_cursor();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    // Read and parse failures are logged by the loader; fall back to defaults.
    let config = CueConfig::load().ok().flatten();
    let settings = EngagementSettings::from_config(config.as_ref());
    let options = ui_options(config.as_ref());

    let Some(catalog_path) = resolve_catalog_path(env::args().nth(1), config.as_ref()) else {
        bail!(
            "no catalog given: pass a catalog JSON path, set [catalog] path in ~/.cue/config.toml, or set {CATALOG_ENV}"
        );
    };
    let catalog = load_catalog(&catalog_path)?;

    let player = Player::new(
        catalog,
        settings,
        RecordingSink::new(),
        RecordingNavigator::new(),
        ListenerRegistry::new(),
    );
    let mut app = App::new(player, options);

    // The default hook prints to stderr, which would land on top of the TUI.
    panic::set_hook(Box::new(|info| {
        tracing::error!("panic: {info}");
    }));

    let result = {
        let mut session = TerminalSession::new()?;
        run_app(&mut session.terminal, &mut app).await
    };
    let _ = panic::take_hook();

    // Terminal is restored; proofs go to stdout as JSON lines.
    let mut out = stdout().lock();
    for proof in app.take_proofs() {
        match serde_json::to_string(&proof) {
            Ok(line) => writeln!(out, "{line}")?,
            Err(err) => tracing::warn!("failed to serialize proof: {err}"),
        }
    }

    result
}

async fn run_app<B>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B: Backend,
    B::Error: Send + Sync + 'static,
{
    let mut input = InputPump::new();
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result: Result<()> = loop {
        frames.tick().await;

        // Non-blocking input (drain queue only)
        let quit_now = match handle_events(app, &mut input) {
            Ok(q) => q,
            Err(e) => break Err(e),
        };
        if quit_now {
            break Ok(());
        }

        app.tick(Instant::now());

        let drawn = panic::catch_unwind(AssertUnwindSafe(|| {
            terminal.draw(|frame| draw(frame, app)).map(|_| ())
        }));
        match drawn {
            Ok(Ok(())) => {}
            Ok(Err(e)) => break Err(e.into()),
            Err(_) => {
                app.fail("The screen could not be drawn.");
                if let Err(e) = terminal.clear() {
                    break Err(e.into());
                }
            }
        }
    };

    input.shutdown().await;
    result
}
