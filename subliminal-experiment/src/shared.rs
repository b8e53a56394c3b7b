//! Thread-safe handle over a [`PhaseController`].
//!
//! Every entry point, `tick` included, runs under one mutex so entry
//! actions can never interleave. The current phase is mirrored into an
//! atomic after each call for lock-free reads from the control surface.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rand::Rng;
use subliminal_core::{FrameInstructions, Phase, TrialResult};
use subliminal_timing::Timer;

use crate::error::ControllerError;
use crate::state::PhaseController;

/// Requests from the interactive control surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Start {
        flash_ms: u32,
        repetitions: u32,
        background: String,
        display: String,
    },
    SetForwardMask(u32),
    SetBackwardMask(u32),
    Guess(String),
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Started,
    /// Applied (clamped) mask duration.
    MaskSet(u32),
    Guessed(Box<TrialResult>),
    Reset,
}

pub struct SharedController<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    inner: Arc<Mutex<PhaseController<T, R>>>,
    phase: Arc<AtomicU8>,
}

impl<T, R> Clone for SharedController<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            phase: Arc::clone(&self.phase),
        }
    }
}

impl<T, R> SharedController<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub fn new(controller: PhaseController<T, R>) -> Self {
        let phase = Arc::new(AtomicU8::new(controller.phase().as_u8()));
        Self {
            inner: Arc::new(Mutex::new(controller)),
            phase,
        }
    }

    /// Lock-free; reflects the state after the most recent entry call.
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Runs `f` with exclusive access. A poisoned lock is recovered: a panic
    /// elsewhere must not end the session.
    pub fn with<O>(&self, f: impl FnOnce(&mut PhaseController<T, R>) -> O) -> O {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let out = f(&mut guard);
        self.phase.store(guard.phase().as_u8(), Ordering::Release);
        out
    }

    pub fn tick(&self, now_ns: u64, refresh_hz: f32) -> FrameInstructions {
        self.with(|c| c.tick(now_ns, refresh_hz))
    }

    pub fn start_experiment(
        &self,
        flash_ms: u32,
        repetitions: u32,
        background: &str,
        display_descriptor: &str,
    ) -> Result<(), ControllerError> {
        self.with(|c| c.start_experiment(flash_ms, repetitions, background, display_descriptor))
    }

    pub fn handle_guess(&self, guess: &str) -> Result<TrialResult, ControllerError> {
        self.with(|c| c.handle_guess(guess))
    }

    pub fn reset_to_menu(&self) {
        self.with(|c| c.reset_to_menu())
    }

    pub fn set_forward_mask_ms(&self, ms: u32) -> u32 {
        self.with(|c| c.set_forward_mask_ms(ms))
    }

    pub fn set_backward_mask_ms(&self, ms: u32) -> u32 {
        self.with(|c| c.set_backward_mask_ms(ms))
    }

    pub fn dispatch(&self, command: ControlCommand) -> Result<CommandOutcome, ControllerError> {
        match command {
            ControlCommand::Start {
                flash_ms,
                repetitions,
                background,
                display,
            } => self
                .start_experiment(flash_ms, repetitions, &background, &display)
                .map(|()| CommandOutcome::Started),
            ControlCommand::SetForwardMask(ms) => {
                Ok(CommandOutcome::MaskSet(self.set_forward_mask_ms(ms)))
            }
            ControlCommand::SetBackwardMask(ms) => {
                Ok(CommandOutcome::MaskSet(self.set_backward_mask_ms(ms)))
            }
            ControlCommand::Guess(word) => self
                .handle_guess(&word)
                .map(|result| CommandOutcome::Guessed(Box::new(result))),
            ControlCommand::Reset => {
                self.reset_to_menu();
                Ok(CommandOutcome::Reset)
            }
        }
    }
}
