//! Bounded, non-blocking queues from the controller to the presentation
//! layer and to the trial recorder.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use serde::{Deserialize, Serialize};
use subliminal_core::{FlashVisuals, TrialResult};
use tracing::{debug, warn};

/// UI-side updates that do not fit the per-frame instruction payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PresentationEvent {
    /// Word to draw on the stimulus panel and the guess button labels.
    ChoicesReady { target: String, choices: [String; 3] },
    FlashVisuals(FlashVisuals),
    Background { label: String },
    GuessPrompt,
    Result { correct: bool },
    Menu,
}

/// Senders owned by the controller. Either side may be absent.
#[derive(Debug, Default)]
pub struct Outbox {
    presentation: Option<Sender<PresentationEvent>>,
    results: Option<Sender<TrialResult>>,
    dropped: u64,
}

impl Outbox {
    /// Outbox with both queues connected, plus their receiving ends.
    pub fn bounded(
        capacity: usize,
    ) -> (Self, Receiver<PresentationEvent>, Receiver<TrialResult>) {
        let (ptx, prx) = bounded(capacity);
        let (rtx, rrx) = bounded(capacity);
        let outbox = Self {
            presentation: Some(ptx),
            results: Some(rtx),
            dropped: 0,
        };
        (outbox, prx, rrx)
    }

    pub fn with_presentation(mut self, tx: Sender<PresentationEvent>) -> Self {
        self.presentation = Some(tx);
        self
    }

    pub fn with_results(mut self, tx: Sender<TrialResult>) -> Self {
        self.results = Some(tx);
        self
    }

    /// Messages discarded because a queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn publish(&mut self, event: PresentationEvent) {
        if let Some(tx) = &self.presentation {
            match tx.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(event)) => {
                    self.dropped += 1;
                    warn!(?event, dropped = self.dropped, "presentation queue full");
                }
                Err(TrySendError::Disconnected(_)) => {
                    debug!("presentation receiver gone");
                    self.presentation = None;
                }
            }
        }
    }

    pub fn emit_result(&mut self, result: TrialResult) {
        if let Some(tx) = &self.results {
            match tx.try_send(result) {
                Ok(()) => {}
                Err(TrySendError::Full(result)) => {
                    self.dropped += 1;
                    warn!(
                        trial = result.trial_index,
                        dropped = self.dropped,
                        "result queue full, trial result lost"
                    );
                }
                Err(TrySendError::Disconnected(_)) => {
                    debug!("result receiver gone");
                    self.results = None;
                }
            }
        }
    }
}
