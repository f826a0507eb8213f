//! Terminal input: a background reader and the key map onto [`App`].

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

use cue_engine::machine::VideoPhase;
use cue_engine::{CheckInChoice, Screen};

use crate::app::{App, InputMode, SEEK_STEP_SECONDS};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 256;
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering
const PAGE_MIN_ROWS: i32 = 1;

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Reads crossterm events on a blocking thread and queues them for the frame loop.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();
        let join = tokio::task::spawn_blocking(move || input_loop(stop2, tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Unblock a reader that is waiting on channel capacity.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best effort; never block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: Arc<AtomicBool>, tx: mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain queued input into the app. Returns `true` once the user asked to quit.
pub fn handle_events(app: &mut App, input: &mut InputPump) -> Result<bool> {
    for _ in 0..MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };
        apply_event(app, ev, Instant::now());
        if app.should_quit() {
            return Ok(true);
        }
    }
    Ok(app.should_quit())
}

pub fn apply_event(app: &mut App, ev: Event, now: Instant) {
    match ev {
        Event::Key(key) => handle_key(app, key, now),
        Event::Paste(text) if matches!(app.mode(), InputMode::Filter | InputMode::Compose) => {
            for c in text.chars().filter(|c| !c.is_control()) {
                app.push_char(c);
            }
        }
        _ => {}
    }
}

pub fn handle_key(app: &mut App, key: KeyEvent, now: Instant) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.request_quit();
        return;
    }

    match app.mode() {
        InputMode::Filter => match key.code {
            KeyCode::Char(c) => app.push_char(c),
            KeyCode::Backspace => app.pop_char(),
            KeyCode::Enter | KeyCode::Esc => app.end_text_entry(),
            _ => {}
        },
        InputMode::Compose => match key.code {
            KeyCode::Char(c) => app.push_char(c),
            KeyCode::Backspace => app.pop_char(),
            KeyCode::Enter => app.commit_compose(now),
            KeyCode::Esc => app.end_text_entry(),
            _ => {}
        },
        InputMode::ResolvePractice => match key.code {
            KeyCode::Char('y' | 'Y') => app.resolve_practice(true, now),
            KeyCode::Char('n' | 'N') | KeyCode::Esc => app.resolve_practice(false, now),
            _ => {}
        },
        InputMode::Normal => {
            app.clear_status();
            if app.is_browsing() {
                browser_key(app, key, now);
            } else {
                player_key(app, key, now);
            }
        }
    }
}

fn browser_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.request_quit(),
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
        KeyCode::PageUp => app.move_cursor(-10),
        KeyCode::PageDown => app.move_cursor(10),
        KeyCode::Enter => app.open_selected(now),
        KeyCode::Char('/') => app.begin_filter(),
        KeyCode::Char('p') => app.cycle_pillar(),
        KeyCode::Tab => app.cycle_kind(),
        KeyCode::Char('x') => app.clear_filter(),
        _ => {}
    }
}

fn player_key(app: &mut App, key: KeyEvent, now: Instant) {
    match app.player().screen() {
        Screen::Unavailable { .. } => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                app.close(now);
            }
            return;
        }
        Screen::Failed { .. } => {
            match key.code {
                KeyCode::Char('r') => app.retry(now),
                KeyCode::Esc | KeyCode::Char('q') => app.close(now),
                _ => {}
            }
            return;
        }
        Screen::Playing(_) => {}
        Screen::Idle | Screen::Closed => return,
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.close(now),
        KeyCode::Tab => app.next_section(),
        KeyCode::Char('t') => app.toggle_section(now),
        KeyCode::Char('r') => app.begin_compose(now),
        KeyCode::Char('l') => app.launch_practice(now),
        _ => content_key(app, key, now),
    }
}

/// Keys whose meaning depends on the kind of content playing.
fn content_key(app: &mut App, key: KeyEvent, now: Instant) {
    if app.block().is_some() {
        block_key(app, key, now);
    } else if let Some(phase) = app.video_phase() {
        video_key(app, phase, key, now);
    } else if app.practice().is_some() {
        if matches!(
            key.code,
            KeyCode::Enter | KeyCode::Right | KeyCode::Char(' ' | 'n')
        ) {
            app.advance(now);
        }
    } else if app.lesson().is_some() {
        lesson_key(app, key, now);
    }
}

fn next_step_index(code: KeyCode) -> Option<usize> {
    match code {
        KeyCode::Char(c @ '1'..='9') => c.to_digit(10).map(|d| d as usize - 1),
        _ => None,
    }
}

fn block_key(app: &mut App, key: KeyEvent, now: Instant) {
    let page = (i32::from(app.article().viewport_height()) - 1).max(PAGE_MIN_ROWS);
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.scroll_article(-1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_article(1),
        KeyCode::PageUp => app.scroll_article(-page),
        KeyCode::PageDown | KeyCode::Char(' ') => app.scroll_article(page),
        KeyCode::Home | KeyCode::Char('g') => app.scroll_article_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.scroll_article_to_end(),
        KeyCode::Char('c') => app.complete(now),
        code => {
            if let Some(index) = next_step_index(code) {
                app.open_next_step(index, now);
            }
        }
    }
}

fn video_key(app: &mut App, phase: VideoPhase, key: KeyEvent, now: Instant) {
    match (key.code, phase) {
        (KeyCode::Up, _) => app.previous_dimension(),
        (KeyCode::Down, _) => app.next_dimension(),
        (KeyCode::Left | KeyCode::Char('-'), _) => app.adjust_state(false, now),
        (KeyCode::Right | KeyCode::Char('+' | '='), _) => app.adjust_state(true, now),
        (KeyCode::Enter, VideoPhase::PreCheck { dismissed: false }) => app.dismiss_pre_check(now),
        (KeyCode::Enter | KeyCode::Char(' '), VideoPhase::PreCheck { .. }) => {
            app.start_playback(now);
        }
        (KeyCode::Char(' '), VideoPhase::Playing) => app.toggle_playback(now),
        (KeyCode::Char('['), _) => app.seek(-SEEK_STEP_SECONDS, now),
        (KeyCode::Char(']'), _) => app.seek(SEEK_STEP_SECONDS, now),
        (KeyCode::Char('y'), _) => app.set_helped(true, now),
        (KeyCode::Char('n'), _) => app.set_helped(false, now),
        (KeyCode::Char('c'), _) => app.complete(now),
        (code, _) => {
            if let Some(index) = next_step_index(code) {
                app.open_next_step(index, now);
            }
        }
    }
}

fn lesson_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ') => app.advance(now),
        KeyCode::Left => app.back(now),
        KeyCode::Char(c @ '1'..='4') => {
            let choice = c
                .to_digit(10)
                .and_then(|d| CheckInChoice::ALL.get(d as usize - 1).copied());
            if let Some(choice) = choice {
                app.check_in(choice, now);
            }
        }
        _ => {}
    }
}
