//! One mount of one item: machine, disclosure, timers, listeners, notice.

use std::time::{Duration, Instant};

use cue_types::ui::DisclosureState;
use cue_types::{ContentId, ContentItem, ContentKind, Percent, SessionId};

use crate::action::{ActionError, NextStepKind, Outcome, PlayerAction};
use crate::capture::{CompletionEmitter, Navigator, ProofSink};
use crate::config::EngagementSettings;
use crate::listeners::{EventSource, EventTopic, Subscriptions};
use crate::machine::{Effect, EngagementMachine};
use crate::schedule::{TaskAction, TaskId, TaskList};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Completed,
    Discarded,
}

/// Short auto-dismissing message shown when a gate refuses an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    message: String,
    task: TaskId,
}

impl Notice {
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// What a teardown released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Released {
    pub tasks: usize,
    pub listeners: usize,
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    item: ContentItem,
    machine: EngagementMachine,
    disclosure: DisclosureState,
    emitter: CompletionEmitter,
    tasks: TaskList,
    subscriptions: Subscriptions,
    notice: Option<Notice>,
    notice_ttl: Duration,
    status: SessionStatus,
}

impl Session {
    /// Build the machine for `item` and subscribe to the host events it needs.
    pub fn mount(
        item: ContentItem,
        settings: &EngagementSettings,
        events: &mut dyn EventSource,
        now: Instant,
    ) -> Self {
        let id = SessionId::new();
        let machine = EngagementMachine::for_item(&item, settings, now);
        let subscriptions = Subscriptions::attach(events, machine.topics());
        let mut session = Self {
            id,
            item,
            machine,
            disclosure: DisclosureState::new(),
            emitter: CompletionEmitter::new(id),
            tasks: TaskList::new(),
            subscriptions,
            notice: None,
            notice_ttl: settings.notice_ttl,
            status: SessionStatus::Active,
        };
        if let Some((step, shows_for)) = session.machine.step_timer() {
            session.schedule_step(step, shows_for, now);
        }
        tracing::debug!(
            session = %id,
            content = %session.item.id(),
            kind = %session.item.kind(),
            "session mounted"
        );
        session
    }

    pub fn dispatch(
        &mut self,
        action: PlayerAction,
        now: Instant,
        sink: &mut dyn ProofSink,
        navigator: &mut dyn Navigator,
    ) -> Result<Outcome, ActionError> {
        if self.status != SessionStatus::Active {
            return Err(ActionError::SessionFinished);
        }
        let result = match &action {
            PlayerAction::ToggleSection(section) => {
                if self.machine.truth_layer_visible() {
                    self.disclosure.toggle(*section);
                    Ok(Outcome::Applied)
                } else {
                    Err(ActionError::NotRevealed)
                }
            }
            PlayerAction::OpenNextStep { kind, id } => self
                .open_next_step(*kind, id, navigator)
                .map(|()| Outcome::Applied),
            action => self
                .machine
                .apply(action, now)
                .map(|effect| self.carry_out(effect, now, sink, navigator)),
        };
        if let Err(error) = &result {
            if error.is_gate() {
                self.show_notice(error.to_string(), now);
            } else {
                tracing::debug!(action = action.name(), "action refused: {error}");
            }
        }
        result
    }

    fn carry_out(
        &mut self,
        effect: Effect,
        now: Instant,
        sink: &mut dyn ProofSink,
        navigator: &mut dyn Navigator,
    ) -> Outcome {
        match effect {
            Effect::None => Outcome::Applied,
            Effect::LaunchPractice(id) => {
                navigator.open_practice(&id);
                Outcome::PracticeLaunched(id)
            }
            Effect::StepEntered { step, shows_for } => {
                self.schedule_step(step, shows_for, now);
                Outcome::Applied
            }
            Effect::Complete => {
                self.status = SessionStatus::Completed;
                if let Some(draft) = self.machine.proof_draft(&self.item)
                    && let Err(error) = self.emitter.emit(draft, sink)
                {
                    tracing::warn!(session = %self.id, "proof not emitted: {error}");
                }
                Outcome::Completed
            }
        }
    }

    fn open_next_step(
        &self,
        kind: NextStepKind,
        id: &ContentId,
        navigator: &mut dyn Navigator,
    ) -> Result<(), ActionError> {
        let Some(next) = self.item.next_steps() else {
            return Err(ActionError::NotApplicable {
                action: "open_next_step",
                kind: self.item.kind(),
            });
        };
        let links = match kind {
            NextStepKind::Insight => &next.insights,
            NextStepKind::Practice => &next.practices,
            NextStepKind::Wellbeing => &next.wellbeing,
        };
        if !links.iter().any(|link| &link.id == id) {
            return Err(ActionError::UnknownNextStep(id.clone()));
        }
        match kind {
            NextStepKind::Insight => navigator.open_insight(id),
            NextStepKind::Practice => navigator.open_practice(id),
            NextStepKind::Wellbeing => navigator.open_wellbeing(id),
        }
        Ok(())
    }

    fn schedule_step(&mut self, step: usize, shows_for: Duration, now: Instant) {
        self.tasks
            .cancel_matching(|task| matches!(task, TaskAction::StepElapsed { .. }));
        if shows_for.is_zero() {
            self.machine.mark_step_elapsed(step);
        } else {
            self.tasks
                .schedule(now + shows_for, TaskAction::StepElapsed { step });
        }
    }

    fn show_notice(&mut self, message: String, now: Instant) {
        if let Some(previous) = self.notice.take() {
            self.tasks.cancel(previous.task);
        }
        let task = self
            .tasks
            .schedule(now + self.notice_ttl, TaskAction::DismissNotice);
        self.notice = Some(Notice { message, task });
    }

    /// Flush throttled samples and run due tasks. Returns `true` if anything changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.status != SessionStatus::Active {
            return false;
        }
        let mut changed = self.machine.tick(now);
        for task in self.tasks.take_due(now) {
            match task {
                TaskAction::DismissNotice => self.notice = None,
                TaskAction::StepElapsed { step } => self.machine.mark_step_elapsed(step),
            }
            changed = true;
        }
        changed
    }

    /// End without a proof. No effect on a completed session.
    pub fn discard(&mut self) {
        if self.status == SessionStatus::Active {
            self.emitter.discard();
            self.status = SessionStatus::Discarded;
            tracing::debug!(session = %self.id, "session discarded");
        }
    }

    /// Cancel every pending task and hand back every listener.
    pub fn teardown(&mut self, events: &mut dyn EventSource) -> Released {
        self.notice = None;
        Released {
            tasks: self.tasks.cancel_all(),
            listeners: self.subscriptions.release(events),
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn item(&self) -> &ContentItem {
        &self.item
    }

    #[must_use]
    pub fn kind(&self) -> ContentKind {
        self.item.kind()
    }

    #[must_use]
    pub fn machine(&self) -> &EngagementMachine {
        &self.machine
    }

    #[must_use]
    pub fn disclosure(&self) -> &DisclosureState {
        &self.disclosure
    }

    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn percent_engaged(&self) -> Percent {
        self.machine.percent_engaged()
    }

    #[must_use]
    pub fn truth_layer_visible(&self) -> bool {
        self.machine.truth_layer_visible()
    }

    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn subscribed_topics(&self) -> Vec<EventTopic> {
        self.subscriptions.topics()
    }
}
