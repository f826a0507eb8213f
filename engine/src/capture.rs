//! Proof capture and the outbound collaborator contracts.
//!
//! Whatever a machine collected arrives here as a [`ProofDraft`]. The emitter
//! seals it into a [`CompletionProof`] and hands it to the sink at most once per
//! session. The close latch does the same for the navigation callback.

use chrono::Utc;
use thiserror::Error;

use cue_types::{CompletionProof, ContentId, ProofDraft, SessionId};

/// Receives completion records. Storage is the sink's business.
pub trait ProofSink {
    fn on_complete(&mut self, proof: CompletionProof);
}

/// Fire-and-forget navigation callbacks.
pub trait Navigator {
    fn open_practice(&mut self, id: &ContentId);
    fn open_insight(&mut self, id: &ContentId);
    fn open_wellbeing(&mut self, id: &ContentId);
    fn close(&mut self);
}

/// Sink that keeps every proof in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    proofs: Vec<CompletionProof>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn proofs(&self) -> &[CompletionProof] {
        &self.proofs
    }

    pub fn take(&mut self) -> Vec<CompletionProof> {
        std::mem::take(&mut self.proofs)
    }
}

impl ProofSink for RecordingSink {
    fn on_complete(&mut self, proof: CompletionProof) {
        self.proofs.push(proof);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationRequest {
    Practice(ContentId),
    Insight(ContentId),
    Wellbeing(ContentId),
    Close,
}

/// Navigator that queues requests for the host to act on after dispatch.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    requests: Vec<NavigationRequest>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn requests(&self) -> &[NavigationRequest] {
        &self.requests
    }

    pub fn take(&mut self) -> Vec<NavigationRequest> {
        std::mem::take(&mut self.requests)
    }

    #[must_use]
    pub fn close_count(&self) -> usize {
        self.requests
            .iter()
            .filter(|r| matches!(r, NavigationRequest::Close))
            .count()
    }
}

impl Navigator for RecordingNavigator {
    fn open_practice(&mut self, id: &ContentId) {
        self.requests.push(NavigationRequest::Practice(id.clone()));
    }

    fn open_insight(&mut self, id: &ContentId) {
        self.requests.push(NavigationRequest::Insight(id.clone()));
    }

    fn open_wellbeing(&mut self, id: &ContentId) {
        self.requests.push(NavigationRequest::Wellbeing(id.clone()));
    }

    fn close(&mut self) {
        self.requests.push(NavigationRequest::Close);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("a completion proof was already emitted for this session")]
    AlreadyEmitted,
    #[error("the session was discarded without completing")]
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmitterState {
    Armed,
    Emitted,
    Discarded,
}

/// One-shot gate between a session and the proof sink.
#[derive(Debug)]
pub struct CompletionEmitter {
    session_id: SessionId,
    state: EmitterState,
}

impl CompletionEmitter {
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            state: EmitterState::Armed,
        }
    }

    pub fn emit(
        &mut self,
        draft: ProofDraft,
        sink: &mut dyn ProofSink,
    ) -> Result<(), CaptureError> {
        match self.state {
            EmitterState::Emitted => return Err(CaptureError::AlreadyEmitted),
            EmitterState::Discarded => return Err(CaptureError::Discarded),
            EmitterState::Armed => {}
        }
        self.state = EmitterState::Emitted;
        let proof = CompletionProof::seal(self.session_id, draft, Utc::now());
        tracing::info!(
            session = %proof.session_id(),
            content = %proof.content_id(),
            kind = %proof.kind(),
            percent = proof.percent_engaged().value(),
            "completion proof emitted"
        );
        sink.on_complete(proof);
        Ok(())
    }

    /// Disarm without emitting. Has no effect once a proof went out.
    pub fn discard(&mut self) {
        if self.state == EmitterState::Armed {
            self.state = EmitterState::Discarded;
        }
    }

    #[must_use]
    pub fn has_emitted(&self) -> bool {
        self.state == EmitterState::Emitted
    }
}

/// Guards the close callback so it fires once per mounted screen.
#[derive(Debug, Default)]
pub struct CloseLatch {
    fired: bool,
}

impl CloseLatch {
    /// Returns `true` if this call invoked the callback.
    pub fn fire(&mut self, navigator: &mut dyn Navigator) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        navigator.close();
        true
    }

    pub fn rearm(&mut self) {
        self.fired = false;
    }

    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
