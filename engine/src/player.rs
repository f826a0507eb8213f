//! The player: catalog, collaborators, and whatever screen is showing.
//!
//! Only one session exists at a time. Completion, close, switching items,
//! failure and retry all end it through the same teardown.

use std::time::Instant;

use cue_types::{ContentError, ContentId, ContentItem};

use crate::action::{ActionError, Outcome, PlayerAction};
use crate::capture::{CloseLatch, Navigator, ProofSink};
use crate::catalog::{Catalog, Selection};
use crate::config::EngagementSettings;
use crate::listeners::EventSource;
use crate::session::Session;

#[derive(Debug)]
pub enum Screen {
    Idle,
    Playing(Box<Session>),
    /// Content was absent or malformed. Only closing is possible.
    Unavailable { reason: String },
    /// An unrecoverable error; offers a retry of the same item.
    Failed {
        content_id: Option<ContentId>,
        message: String,
    },
    Closed,
}

impl Screen {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing(_) => "playing",
            Self::Unavailable { .. } => "unavailable",
            Self::Failed { .. } => "failed",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug)]
pub struct Player<S, N, E> {
    catalog: Catalog,
    settings: EngagementSettings,
    sink: S,
    navigator: N,
    events: E,
    screen: Screen,
    /// Last item mounted, so a failed screen can remount it.
    last_item: Option<ContentItem>,
    close_latch: CloseLatch,
}

impl<S: ProofSink, N: Navigator, E: EventSource> Player<S, N, E> {
    pub fn new(
        catalog: Catalog,
        settings: EngagementSettings,
        sink: S,
        navigator: N,
        events: E,
    ) -> Self {
        Self {
            catalog,
            settings,
            sink,
            navigator,
            events,
            screen: Screen::Idle,
            last_item: None,
            close_latch: CloseLatch::default(),
        }
    }

    /// Make a catalog item active. A changed selection replaces the session;
    /// re-selecting the playing item leaves it alone.
    pub fn select(&mut self, id: &str, now: Instant) -> Selection {
        let selection = self.catalog.select(id);
        let playing_it = self
            .session()
            .is_some_and(|session| session.item().id().as_str() == id);
        match selection {
            Selection::Changed { .. } => self.mount_active(now),
            Selection::Unchanged if !playing_it => self.mount_active(now),
            Selection::Unchanged | Selection::NotFound => {}
        }
        selection
    }

    fn mount_active(&mut self, now: Instant) {
        match self.catalog.active().cloned() {
            Some(item) => self.mount(item, now),
            None => self.show_unavailable("content not available".to_string()),
        }
    }

    /// Mount an item that did not come from a catalog selection.
    pub fn open(&mut self, item: Option<ContentItem>, now: Instant) {
        self.catalog.clear_active();
        match item {
            Some(item) => self.mount(item, now),
            None => self.show_unavailable("content not available".to_string()),
        }
    }

    pub fn open_result(&mut self, item: Result<ContentItem, ContentError>, now: Instant) {
        match item {
            Ok(item) => self.open(Some(item), now),
            Err(error) => {
                tracing::warn!("cannot open content: {error}");
                self.catalog.clear_active();
                self.show_unavailable(error.to_string());
            }
        }
    }

    pub fn open_json(&mut self, json: &str, now: Instant) {
        self.open_result(ContentItem::from_json(json), now);
    }

    fn mount(&mut self, item: ContentItem, now: Instant) {
        self.end_session();
        let session = Session::mount(item.clone(), &self.settings, &mut self.events, now);
        self.last_item = Some(item);
        self.close_latch.rearm();
        self.screen = Screen::Playing(Box::new(session));
    }

    fn show_unavailable(&mut self, reason: String) {
        self.end_session();
        self.last_item = None;
        self.close_latch.rearm();
        self.screen = Screen::Unavailable { reason };
    }

    pub fn dispatch(&mut self, action: PlayerAction, now: Instant) -> Result<Outcome, ActionError> {
        let Screen::Playing(session) = &mut self.screen else {
            return Err(ActionError::NothingPlaying);
        };
        let outcome = session.dispatch(action, now, &mut self.sink, &mut self.navigator)?;
        if outcome == Outcome::Completed {
            self.end_session();
            self.screen = Screen::Closed;
            self.close_latch.fire(&mut self.navigator);
        }
        Ok(outcome)
    }

    /// Leave whatever is showing. Returns `true` if the close callback fired.
    pub fn close(&mut self) -> bool {
        if matches!(self.screen, Screen::Idle) {
            return false;
        }
        self.end_session();
        self.screen = Screen::Closed;
        let fired = self.close_latch.fire(&mut self.navigator);
        if fired {
            tracing::info!("player closed");
        }
        fired
    }

    /// Error boundary: drop the session and show the failure screen.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        let content_id = self.last_item.as_ref().map(|item| item.id().clone());
        tracing::warn!(
            content = ?content_id.as_ref().map(ContentId::as_str),
            "player failed: {message}"
        );
        self.end_session();
        self.screen = Screen::Failed {
            content_id,
            message,
        };
    }

    /// Remount the failed item in a fresh session.
    pub fn retry(&mut self, now: Instant) -> bool {
        if !matches!(self.screen, Screen::Failed { .. }) {
            return false;
        }
        match self.last_item.clone() {
            Some(item) => {
                self.mount(item, now);
                true
            }
            None => false,
        }
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        match &mut self.screen {
            Screen::Playing(session) => session.tick(now),
            _ => false,
        }
    }

    /// Discard and tear down the current session, if any.
    fn end_session(&mut self) {
        let mut session = match std::mem::replace(&mut self.screen, Screen::Idle) {
            Screen::Playing(session) => session,
            other => {
                self.screen = other;
                return;
            }
        };
        session.discard();
        let released = session.teardown(&mut self.events);
        tracing::debug!(
            session = %session.id(),
            status = ?session.status(),
            tasks = released.tasks,
            listeners = released.listeners,
            "session ended"
        );
    }

    #[must_use]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match &self.screen {
            Screen::Playing(session) => Some(session.as_ref()),
            _ => None,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn settings(&self) -> &EngagementSettings {
        &self.settings
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    #[must_use]
    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.navigator
    }

    #[must_use]
    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }
}
