//! Host state around the player.
//!
//! The engine owns engagement semantics. This layer owns what only a terminal
//! host knows: the browser cursor and filter, text entry, the article viewport
//! geometry, and the simulated media clock. Every navigation request the
//! player raises is followed here after each dispatch.

use std::time::Instant;

use cue_engine::machine::{BlockMachine, LessonMachine, PracticeMachine, VideoMachine, VideoPhase};
use cue_engine::{
    ActionError, CheckInChoice, ContentFilter, EngagementMachine, EventTopic, ListenerRegistry,
    NavigationRequest, NextStepKind, Outcome, Player, PlayerAction, RecordingNavigator,
    RecordingSink, Screen, ScrollMetrics, Selection, Session,
};
use cue_types::ui::{TruthSection, UiOptions};
use cue_types::{
    CompletionProof, ContentItem, ContentKind, ContentPayload, LessonScene, LinkRef, SceneType,
    SessionId, StateDimension,
};

use crate::media::{MediaClock, MediaSample};

pub type CuePlayer = Player<RecordingSink, RecordingNavigator, ListenerRegistry>;

/// Seconds moved by one seek key press.
pub const SEEK_STEP_SECONDS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing into the browser's title filter.
    Filter,
    /// Typing a reflection answer.
    Compose,
    /// A practice was handed off; waiting to hear whether it was finished.
    ResolvePractice,
}

/// Article viewport geometry in rows. Changes are reported to the player as scroll samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArticleView {
    offset: u16,
    content_height: u16,
    viewport_height: u16,
    dirty: bool,
}

impl ArticleView {
    pub fn set_layout(&mut self, content_height: u16, viewport_height: u16) {
        if (content_height, viewport_height) == (self.content_height, self.viewport_height) {
            return;
        }
        self.content_height = content_height;
        self.viewport_height = viewport_height;
        self.offset = self.offset.min(self.max_offset());
        self.dirty = true;
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let target = (i32::from(self.offset) + delta).clamp(0, i32::from(self.max_offset()));
        self.scroll_to(target as u16);
    }

    pub fn scroll_to_end(&mut self) {
        self.scroll_to(self.max_offset());
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_to(0);
    }

    fn scroll_to(&mut self, offset: u16) {
        if offset != self.offset {
            self.offset = offset;
            self.dirty = true;
        }
    }

    fn max_offset(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    #[must_use]
    pub fn offset(&self) -> u16 {
        self.offset
    }

    #[must_use]
    pub fn viewport_height(&self) -> u16 {
        self.viewport_height
    }

    fn take_metrics(&mut self) -> Option<ScrollMetrics> {
        if !self.dirty || self.viewport_height == 0 {
            return None;
        }
        self.dirty = false;
        Some(ScrollMetrics::new(
            f64::from(self.offset),
            f64::from(self.content_height),
            f64::from(self.viewport_height),
        ))
    }
}

/// Next-step links of an item in display order: insights, practices, wellbeing.
#[must_use]
pub fn next_step_links(item: &ContentItem) -> Vec<(NextStepKind, &LinkRef)> {
    let Some(next) = item.next_steps() else {
        return Vec::new();
    };
    next.insights
        .iter()
        .map(|link| (NextStepKind::Insight, link))
        .chain(next.practices.iter().map(|link| (NextStepKind::Practice, link)))
        .chain(next.wellbeing.iter().map(|link| (NextStepKind::Wellbeing, link)))
        .collect()
}

pub struct App {
    player: CuePlayer,
    options: UiOptions,
    mode: InputMode,
    filter: ContentFilter,
    cursor: usize,
    draft: String,
    dimension: StateDimension,
    section: TruthSection,
    article: ArticleView,
    media: MediaClock,
    mounted: Option<SessionId>,
    status: Option<String>,
    should_quit: bool,
}

impl App {
    #[must_use]
    pub fn new(player: CuePlayer, options: UiOptions) -> Self {
        Self {
            player,
            options,
            mode: InputMode::Normal,
            filter: ContentFilter::new(),
            cursor: 0,
            draft: String::new(),
            dimension: StateDimension::Energy,
            section: TruthSection::Lineage,
            article: ArticleView::default(),
            media: MediaClock::default(),
            mounted: None,
            status: None,
            should_quit: false,
        }
    }

    #[must_use]
    pub fn player(&self) -> &CuePlayer {
        &self.player
    }

    #[must_use]
    pub fn options(&self) -> UiOptions {
        self.options
    }

    #[must_use]
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    #[must_use]
    pub fn filter(&self) -> &ContentFilter {
        &self.filter
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    #[must_use]
    pub fn dimension(&self) -> StateDimension {
        self.dimension
    }

    #[must_use]
    pub fn section_cursor(&self) -> TruthSection {
        self.section
    }

    #[must_use]
    pub fn article(&self) -> &ArticleView {
        &self.article
    }

    #[must_use]
    pub fn media(&self) -> &MediaClock {
        &self.media
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    /// Proofs emitted so far, leaving none behind.
    pub fn take_proofs(&mut self) -> Vec<CompletionProof> {
        self.player.sink_mut().take()
    }

    #[must_use]
    pub fn is_browsing(&self) -> bool {
        matches!(self.player.screen(), Screen::Idle | Screen::Closed)
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.player.session()
    }

    #[must_use]
    pub fn visible_items(&self) -> Vec<&ContentItem> {
        self.player.catalog().filter(&self.filter)
    }

    // Browser

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.visible_items().len();
        self.cursor = match len {
            0 => 0,
            len => self.cursor.saturating_add_signed(delta).min(len - 1),
        };
    }

    /// All pillars, then each pillar in catalog order, then all again.
    pub fn cycle_pillar(&mut self) {
        let next = {
            let pillars = self.player.catalog().pillars();
            match &self.filter.pillar {
                None => pillars.first().map(|p| (*p).to_string()),
                Some(current) => pillars
                    .iter()
                    .position(|p| p == current)
                    .and_then(|i| pillars.get(i + 1))
                    .map(|p| (*p).to_string()),
            }
        };
        self.filter.pillar = next;
        self.cursor = 0;
    }

    pub fn cycle_kind(&mut self) {
        self.filter.kind = match self.filter.kind {
            None => Some(ContentKind::ALL[0]),
            Some(kind) => ContentKind::ALL
                .iter()
                .position(|&k| k == kind)
                .and_then(|i| ContentKind::ALL.get(i + 1))
                .copied(),
        };
        self.cursor = 0;
    }

    pub fn clear_filter(&mut self) {
        self.filter = ContentFilter::new();
        self.cursor = 0;
    }

    pub fn begin_filter(&mut self) {
        self.draft = self.filter.text_query.clone().unwrap_or_default();
        self.mode = InputMode::Filter;
    }

    pub fn end_text_entry(&mut self) {
        self.draft.clear();
        self.mode = InputMode::Normal;
    }

    pub fn push_char(&mut self, c: char) {
        match self.mode {
            InputMode::Filter => {
                self.draft.push(c);
                self.sync_query();
            }
            InputMode::Compose => self.draft.push(c),
            InputMode::Normal | InputMode::ResolvePractice => {}
        }
    }

    pub fn pop_char(&mut self) {
        match self.mode {
            InputMode::Filter => {
                self.draft.pop();
                self.sync_query();
            }
            InputMode::Compose => {
                self.draft.pop();
            }
            InputMode::Normal | InputMode::ResolvePractice => {}
        }
    }

    fn sync_query(&mut self) {
        self.filter.text_query = (!self.draft.is_empty()).then(|| self.draft.clone());
        self.cursor = 0;
    }

    pub fn open_selected(&mut self, now: Instant) {
        let id = self
            .visible_items()
            .get(self.cursor)
            .map(|item| item.id().as_str().to_string());
        if let Some(id) = id {
            self.open(&id, now);
        }
    }

    pub fn open(&mut self, id: &str, now: Instant) -> Selection {
        let selection = self.player.select(id, now);
        if selection == Selection::NotFound {
            self.status = Some(format!("{id} is not in this catalog"));
        }
        self.sync_view();
        selection
    }

    // Player

    pub fn close(&mut self, now: Instant) {
        self.player.close();
        self.follow_navigation(now);
        self.sync_view();
    }

    pub fn retry(&mut self, now: Instant) {
        self.player.retry(now);
        self.sync_view();
    }

    /// Error boundary for the host: show the failure screen in place of the session.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.player.fail(message);
        self.sync_view();
    }

    pub fn dispatch(&mut self, action: PlayerAction, now: Instant) -> Result<Outcome, ActionError> {
        let result = self.player.dispatch(action, now);
        match &result {
            Ok(Outcome::PracticeLaunched(id)) => {
                self.mode = InputMode::ResolvePractice;
                self.status = Some(format!("Opened practice {id}. Did you finish it? (y/n)"));
            }
            Ok(Outcome::Completed) => self.status = Some("Saved.".to_string()),
            Ok(Outcome::Applied) => {}
            // Gate refusals already show as the session's notice.
            Err(error) if error.is_gate() => {}
            Err(error) => self.status = Some(error.to_string()),
        }
        self.follow_navigation(now);
        self.sync_view();
        result
    }

    fn act(&mut self, action: PlayerAction, now: Instant) {
        let _ = self.dispatch(action, now);
    }

    fn follow_navigation(&mut self, now: Instant) {
        let requests = self.player.navigator_mut().take();
        for request in requests {
            match request {
                NavigationRequest::Close => tracing::debug!("back to browser"),
                // Handed off through the resolution prompt instead.
                NavigationRequest::Practice(_) if self.mode == InputMode::ResolvePractice => {}
                NavigationRequest::Practice(id)
                | NavigationRequest::Insight(id)
                | NavigationRequest::Wellbeing(id) => {
                    self.open(id.as_str(), now);
                }
            }
        }
    }

    /// Reset per-session view state whenever a different session is mounted.
    fn sync_view(&mut self) {
        let current = self.player.session().map(Session::id);
        if current == self.mounted {
            return;
        }
        self.mounted = current;
        self.article = ArticleView::default();
        self.dimension = StateDimension::Energy;
        self.section = TruthSection::Lineage;
        if matches!(self.mode, InputMode::Compose | InputMode::ResolvePractice) {
            self.end_text_entry();
        }
        self.media = match self.player.session().map(|s| s.item().payload()) {
            Some(ContentPayload::WellbeingVideo(video)) => {
                MediaClock::load(f64::from(video.duration_minutes) * 60.0)
            }
            _ => MediaClock::default(),
        };
    }

    pub fn advance(&mut self, now: Instant) {
        self.act(PlayerAction::Advance, now);
    }

    pub fn back(&mut self, now: Instant) {
        self.act(PlayerAction::Back, now);
    }

    pub fn complete(&mut self, now: Instant) {
        self.act(PlayerAction::Complete, now);
    }

    pub fn launch_practice(&mut self, now: Instant) {
        self.act(PlayerAction::LaunchPractice, now);
    }

    pub fn resolve_practice(&mut self, completed: bool, now: Instant) {
        self.mode = InputMode::Normal;
        self.act(PlayerAction::PracticeResolved { completed }, now);
        self.status = Some(if completed {
            "Practice counted.".to_string()
        } else {
            "Practice not counted.".to_string()
        });
    }

    pub fn check_in(&mut self, choice: CheckInChoice, now: Instant) {
        self.act(PlayerAction::CheckIn(choice), now);
    }

    pub fn set_helped(&mut self, helped: bool, now: Instant) {
        self.act(PlayerAction::SetHelped(helped), now);
    }

    pub fn open_next_step(&mut self, index: usize, now: Instant) {
        let link = self.session().and_then(|session| {
            next_step_links(session.item())
                .get(index)
                .map(|(kind, link)| (*kind, link.id.clone()))
        });
        if let Some((kind, id)) = link {
            self.act(PlayerAction::OpenNextStep { kind, id }, now);
        }
    }

    /// Start typing a reflection, seeded with what was already written.
    ///
    /// Where no reflection can be written, the refusal comes from the player.
    pub fn begin_compose(&mut self, now: Instant) {
        match self.current_reflection() {
            Some(text) => {
                self.draft = text;
                self.mode = InputMode::Compose;
            }
            None if self.session().is_some() => {
                self.act(PlayerAction::EditReflection(String::new()), now);
            }
            None => {}
        }
    }

    fn current_reflection(&self) -> Option<String> {
        match self.session()?.machine() {
            EngagementMachine::Block(block) => block.reflection().map(str::to_string),
            EngagementMachine::Video(video) => {
                (video.phase() == VideoPhase::PostCheck).then(|| video.reflection().to_string())
            }
            EngagementMachine::Lesson(lesson) => {
                let (index, scene) = self.current_scene()?;
                (scene.scene_type == SceneType::Reflection)
                    .then(|| lesson.reflection(index).unwrap_or_default().to_string())
            }
            EngagementMachine::Practice(_) => None,
        }
    }

    pub fn commit_compose(&mut self, now: Instant) {
        let text = std::mem::take(&mut self.draft);
        self.mode = InputMode::Normal;
        self.act(PlayerAction::EditReflection(text), now);
    }

    // Truth Layer

    pub fn next_section(&mut self) {
        let next = (self.section.index() + 1) % TruthSection::ALL.len();
        self.section = TruthSection::from_index(next).unwrap_or(TruthSection::Lineage);
    }

    pub fn toggle_section(&mut self, now: Instant) {
        self.act(PlayerAction::ToggleSection(self.section), now);
    }

    // Article

    pub fn scroll_article(&mut self, delta: i32) {
        self.article.scroll_by(delta);
    }

    pub fn scroll_article_to_end(&mut self) {
        self.article.scroll_to_end();
    }

    pub fn scroll_article_to_top(&mut self) {
        self.article.scroll_to_top();
    }

    /// Called by the renderer with the wrapped body height and the rows it had.
    pub fn record_article_layout(&mut self, content_height: u16, viewport_height: u16) {
        self.article.set_layout(content_height, viewport_height);
    }

    // Video

    pub fn next_dimension(&mut self) {
        let all = StateDimension::ALL;
        let index = all.iter().position(|&d| d == self.dimension).unwrap_or(0);
        self.dimension = all[(index + 1) % all.len()];
    }

    pub fn previous_dimension(&mut self) {
        let all = StateDimension::ALL;
        let index = all.iter().position(|&d| d == self.dimension).unwrap_or(0);
        self.dimension = all[(index + all.len() - 1) % all.len()];
    }

    pub fn adjust_state(&mut self, raise: bool, now: Instant) {
        let Some(values) = self.video().and_then(VideoMachine::slider_values) else {
            return;
        };
        let current = values.get(self.dimension);
        let rating = if raise {
            current.raised()
        } else {
            current.lowered()
        };
        self.act(
            PlayerAction::AdjustState {
                dimension: self.dimension,
                rating,
            },
            now,
        );
    }

    pub fn dismiss_pre_check(&mut self, now: Instant) {
        self.act(PlayerAction::DismissPreCheck, now);
    }

    pub fn start_playback(&mut self, now: Instant) {
        if self.dispatch(PlayerAction::StartPlayback, now).is_ok() {
            self.media.play(now);
        }
    }

    pub fn toggle_playback(&mut self, now: Instant) {
        if self.video_phase() == Some(VideoPhase::Playing) {
            self.media.toggle(now);
        }
    }

    pub fn seek(&mut self, delta: f64, now: Instant) {
        if self.video_phase() != Some(VideoPhase::Playing) {
            return;
        }
        if let Some(sample) = self.media.seek(delta, now) {
            self.report_media(sample, now);
        }
    }

    fn report_media(&mut self, sample: MediaSample, now: Instant) {
        if self.listens(EventTopic::MediaTime) {
            self.act(
                PlayerAction::MediaTime {
                    current: sample.current,
                    duration: sample.duration,
                },
                now,
            );
        }
        if sample.ended && self.listens(EventTopic::MediaEnded) {
            self.act(PlayerAction::MediaEnded, now);
        }
    }

    /// Host events reach the player only while the session holds a listener.
    fn listens(&self, topic: EventTopic) -> bool {
        self.player.events().is_subscribed(topic)
    }

    /// Feed host events into the player and run its timers.
    pub fn tick(&mut self, now: Instant) {
        let metrics = self.article.take_metrics();
        if let Some(metrics) = metrics
            && self.listens(EventTopic::Scroll)
        {
            self.act(PlayerAction::Scroll(metrics), now);
        }
        if self.video_phase() == Some(VideoPhase::Playing)
            && let Some(sample) = self.media.advance(now)
        {
            self.report_media(sample, now);
        }
        self.player.tick(now);
    }

    // Machine views for rendering and key mapping.

    #[must_use]
    pub fn block(&self) -> Option<&BlockMachine> {
        match self.session()?.machine() {
            EngagementMachine::Block(machine) => Some(machine),
            _ => None,
        }
    }

    #[must_use]
    pub fn video(&self) -> Option<&VideoMachine> {
        match self.session()?.machine() {
            EngagementMachine::Video(machine) => Some(machine),
            _ => None,
        }
    }

    #[must_use]
    pub fn video_phase(&self) -> Option<VideoPhase> {
        self.video().map(VideoMachine::phase)
    }

    #[must_use]
    pub fn practice(&self) -> Option<&PracticeMachine> {
        match self.session()?.machine() {
            EngagementMachine::Practice(machine) => Some(machine),
            _ => None,
        }
    }

    #[must_use]
    pub fn lesson(&self) -> Option<&LessonMachine> {
        match self.session()?.machine() {
            EngagementMachine::Lesson(machine) => Some(machine),
            _ => None,
        }
    }

    /// The lesson scene on screen, with its index.
    #[must_use]
    pub fn current_scene(&self) -> Option<(usize, &LessonScene)> {
        let session = self.session()?;
        let EngagementMachine::Lesson(lesson) = session.machine() else {
            return None;
        };
        let ContentPayload::MicroLesson(content) = session.item().payload() else {
            return None;
        };
        let index = lesson.current_scene()?;
        content.scenes.get(index).map(|scene| (index, scene))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use cue_engine::{Catalog, EngagementSettings};
    use serde_json::json;

    use super::*;

    fn truth(pillar: &str, pre_post: bool) -> serde_json::Value {
        json!({
            "lineage": { "people": ["Deb Dana"] },
            "targeting": { "pillar": pillar },
            "state_fit": { "best_when": "wired", "not_when": "shut down" },
            "proof_hooks": { "pre_post_state": pre_post, "completion_log": true }
        })
    }

    pub(crate) fn catalog() -> Catalog {
        let records = json!([
            {
                "id": "b-1",
                "kind": "block",
                "pillar_id": "regulation",
                "title": "Why breath works",
                "truth_layer": truth("regulation", false),
                "body": "Slow exhales calm the system.",
                "reading_time_minutes": 2,
                "embedded_practice": {
                    "id": "p-1",
                    "title": "Box breathing",
                    "duration_minutes": 1
                },
                "next_steps": { "practices": [{ "id": "p-1", "title": "Box breathing" }] }
            },
            {
                "id": "v-1",
                "kind": "wellbeing_video",
                "pillar_id": "connection",
                "title": "Downshift",
                "truth_layer": truth("connection", true),
                "video_url": "https://example.com/v.mp4",
                "thumbnail_url": "https://example.com/v.jpg",
                "duration_minutes": 1,
                "chapters": [],
                "primary_purpose": "downshift"
            },
            {
                "id": "l-1",
                "kind": "micro_lesson",
                "pillar_id": "growth",
                "title": "Your window",
                "truth_layer": truth("growth", false),
                "scenes": [
                    { "label": "What a window is", "type": "teaching" },
                    { "label": "Edges", "type": "teaching" },
                    { "label": "When do you narrow?", "type": "reflection" },
                    {
                        "label": "Try it",
                        "type": "practice_injection",
                        "practice": { "id": "p-1", "title": "Box breathing", "duration_minutes": 1 }
                    },
                    { "label": "Widening", "type": "teaching" },
                    { "label": "How are you now?", "type": "state_check" },
                    { "label": "One thing to keep", "type": "reflection" }
                ]
            },
            {
                "id": "p-1",
                "kind": "practice",
                "pillar_id": "regulation",
                "title": "Box breathing",
                "truth_layer": truth("regulation", false),
                "steps": [
                    { "instruction": "In for four", "duration_seconds": 4 },
                    { "instruction": "Out for four", "duration_seconds": 4 }
                ]
            }
        ]);
        Catalog::from_json(&records.to_string()).unwrap()
    }

    pub(crate) fn app() -> App {
        app_with(UiOptions::default())
    }

    pub(crate) fn app_with(options: UiOptions) -> App {
        let player = Player::new(
            catalog(),
            EngagementSettings::default(),
            RecordingSink::new(),
            RecordingNavigator::new(),
            ListenerRegistry::new(),
        );
        App::new(player, options)
    }

    #[test]
    fn filter_cycles_narrow_the_browser() {
        let mut app = app();
        assert_eq!(app.visible_items().len(), 4);
        app.cycle_pillar();
        assert_eq!(app.filter().pillar.as_deref(), Some("regulation"));
        assert_eq!(app.visible_items().len(), 2);
        app.cycle_pillar();
        app.cycle_pillar();
        assert_eq!(app.filter().pillar.as_deref(), Some("growth"));
        app.cycle_pillar();
        assert_eq!(app.filter().pillar, None);

        app.cycle_kind();
        assert_eq!(app.filter().kind, Some(ContentKind::Block));
        assert_eq!(app.visible_items().len(), 1);
        app.clear_filter();
        assert!(app.filter().is_empty());
    }

    #[test]
    fn typing_a_filter_updates_the_query_live() {
        let mut app = app();
        app.begin_filter();
        for c in "BOX".chars() {
            app.push_char(c);
        }
        let titles: Vec<&str> = app.visible_items().iter().map(|i| i.title()).collect();
        assert_eq!(titles, ["Box breathing"]);
        app.pop_char();
        app.pop_char();
        app.pop_char();
        assert_eq!(app.filter().text_query, None);
    }

    #[test]
    fn cursor_stays_inside_the_list() {
        let mut app = app();
        app.move_cursor(10);
        assert_eq!(app.cursor(), 3);
        app.move_cursor(-10);
        assert_eq!(app.cursor(), 0);
    }

    #[test]
    fn short_article_reveals_after_first_layout() {
        let now = Instant::now();
        let mut app = app();
        app.open("b-1", now);
        app.record_article_layout(3, 20);
        app.tick(now);
        assert!(app.session().is_some_and(Session::truth_layer_visible));
    }

    #[test]
    fn launching_practice_waits_for_resolution_without_leaving() {
        let now = Instant::now();
        let mut app = app();
        app.open("b-1", now);
        app.record_article_layout(3, 20);
        app.tick(now);
        app.launch_practice(now);
        assert_eq!(app.mode(), InputMode::ResolvePractice);
        assert_eq!(app.session().map(|s| s.item().id().as_str()), Some("b-1"));

        app.resolve_practice(true, now);
        app.complete(now);
        let proofs = app.take_proofs();
        assert_eq!(proofs.len(), 1);
        assert!(proofs[0].practice_completed());
        assert!(app.is_browsing());
    }

    #[test]
    fn next_step_opens_the_linked_item() {
        let now = Instant::now();
        let mut app = app();
        app.open("b-1", now);
        app.open_next_step(0, now);
        assert_eq!(app.session().map(|s| s.item().id().as_str()), Some("p-1"));
    }

    #[test]
    fn video_plays_to_the_post_check_on_the_simulated_clock() {
        let t0 = Instant::now();
        let mut app = app();
        app.open("v-1", t0);
        app.start_playback(t0);
        assert!(!app.media().is_running());
        assert_eq!(
            app.session().and_then(|s| s.notice()).map(|n| n.message().to_string()),
            Some(ActionError::PreCheckPending.to_string())
        );

        app.adjust_state(true, t0);
        app.dismiss_pre_check(t0);
        app.start_playback(t0);
        assert!(app.media().is_running());

        app.tick(t0 + Duration::from_secs(30));
        assert_eq!(app.session().map(|s| s.percent_engaged().value()), Some(50));
        app.tick(t0 + Duration::from_secs(61));
        assert_eq!(app.video_phase(), Some(VideoPhase::PostCheck));

        app.set_helped(true, t0);
        app.complete(t0);
        let proofs = app.take_proofs();
        assert_eq!(proofs[0].state_before().map(|s| s.energy.value()), Some(6));
    }

    #[test]
    fn compose_commits_the_reflection() {
        let now = Instant::now();
        let mut app = app();
        app.open("b-1", now);
        app.begin_compose(now);
        assert_eq!(app.mode(), InputMode::Normal);

        app.record_article_layout(3, 20);
        app.tick(now);
        app.begin_compose(now);
        assert_eq!(app.mode(), InputMode::Compose);
        for c in "calmer".chars() {
            app.push_char(c);
        }
        app.commit_compose(now);
        assert_eq!(app.block().and_then(BlockMachine::reflection), Some("calmer"));
    }

    #[test]
    fn switching_items_resets_view_state() {
        let now = Instant::now();
        let mut app = app();
        app.open("b-1", now);
        app.record_article_layout(40, 10);
        app.scroll_article(5);
        app.next_section();
        app.open("p-1", now);
        assert_eq!(app.article().offset(), 0);
        assert_eq!(app.section_cursor(), TruthSection::Lineage);
    }

    #[test]
    fn samples_follow_the_session_listeners() {
        let now = Instant::now();
        let mut app = app();
        app.open("b-1", now);
        assert!(app.listens(EventTopic::Scroll));
        assert!(!app.listens(EventTopic::MediaTime));

        app.close(now);
        assert_eq!(app.player().events().live_count(), 0);

        // A practice holds no scroll listener, so layout changes stay in the host.
        app.open("p-1", now);
        app.record_article_layout(3, 20);
        app.tick(now);
        assert_eq!(app.status(), None);
        assert!(!app.listens(EventTopic::Scroll));

        app.open("v-1", now);
        assert!(app.listens(EventTopic::MediaTime));
        assert!(app.listens(EventTopic::MediaEnded));
        assert!(!app.listens(EventTopic::Scroll));
    }

    #[test]
    fn unknown_id_reports_status() {
        let mut app = app();
        assert_eq!(app.open("nope", Instant::now()), Selection::NotFound);
        assert!(app.status().is_some_and(|s| s.contains("nope")));
    }
}
