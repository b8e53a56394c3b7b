use rand::Rng;
use subliminal_core::{
    DisplayMode, FixationInstruction, FrameInstructions, MaskTileInstruction, Phase,
    StimulusInstruction, TrialConfig, TrialResult, Vec3,
};
use subliminal_timing::{Timer, effective_refresh_rate, frames_for};
use tracing::{debug, info, warn};

use crate::config::ExperimentConfig;
use crate::error::{ConfigError, ControllerError};
use crate::outbox::{Outbox, PresentationEvent};
use crate::randomizer::TrialRandomizer;
use crate::trial::TrialRuntimeState;
use crate::visual;

const NS_PER_MS: u64 = 1_000_000;

/// Trial phase state machine.
///
/// Driven once per display frame through [`tick`](Self::tick); the control
/// surface enters through `start_experiment`, `handle_guess`,
/// `reset_to_menu` and the mask setters. Timed phases compare monotonic
/// instants passed in by the caller, Flashing counts frames.
pub struct PhaseController<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    timer: T,
    randomizer: TrialRandomizer<R>,
    config: ExperimentConfig,
    forward_mask_ms: u32,
    backward_mask_ms: u32,
    trial: Option<TrialConfig>,
    state: TrialRuntimeState,
    trial_counter: u32,
    last_tick_ns: Option<u64>,
    refresh_hz: f32,
    outbox: Outbox,
}

impl<T, R> PhaseController<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub fn new(config: ExperimentConfig, timer: T, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            timer,
            randomizer: TrialRandomizer::new(rng),
            forward_mask_ms: config.forward_mask.default_ms,
            backward_mask_ms: config.backward_mask.default_ms,
            refresh_hz: config.default_refresh_hz,
            config,
            trial: None,
            state: TrialRuntimeState::default(),
            trial_counter: 0,
            last_tick_ns: None,
            outbox: Outbox::default(),
        })
    }

    pub fn with_outbox(mut self, outbox: Outbox) -> Self {
        self.outbox = outbox;
        self
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Snapshot of the running trial, if any.
    pub fn trial_config(&self) -> Option<&TrialConfig> {
        self.trial.as_ref()
    }

    pub fn runtime(&self) -> &TrialRuntimeState {
        &self.state
    }

    pub fn forward_mask_ms(&self) -> u32 {
        self.forward_mask_ms
    }

    pub fn backward_mask_ms(&self) -> u32 {
        self.backward_mask_ms
    }

    /// Refresh rate observed on the latest tick.
    pub fn refresh_hz(&self) -> f32 {
        self.refresh_hz
    }

    /// Number of trials started so far.
    pub fn trial_count(&self) -> u32 {
        self.trial_counter
    }

    pub fn dropped_messages(&self) -> u64 {
        self.outbox.dropped()
    }

    /// Frame count a flash of `ms` would get at the current refresh rate,
    /// for labelling the duration control.
    pub fn preview_frames(&self, ms: u32) -> u32 {
        frames_for(ms, self.refresh_hz)
    }

    /// Clamps into the configured bounds and returns the applied value.
    /// Takes effect from the next trial.
    pub fn set_forward_mask_ms(&mut self, ms: u32) -> u32 {
        self.forward_mask_ms = self.config.forward_mask.clamp(ms);
        self.forward_mask_ms
    }

    /// Clamps into the configured bounds and returns the applied value.
    /// Takes effect from the next trial.
    pub fn set_backward_mask_ms(&mut self, ms: u32) -> u32 {
        self.backward_mask_ms = self.config.backward_mask.clamp(ms);
        self.backward_mask_ms
    }

    pub fn start_experiment(
        &mut self,
        flash_ms: u32,
        repetitions: u32,
        background: &str,
        display_descriptor: &str,
    ) -> Result<(), ControllerError> {
        if flash_ms < 1 {
            warn!(flash_ms, "rejected trial start");
            return Err(ControllerError::InvalidFlashDuration(flash_ms));
        }
        if repetitions < 1 {
            warn!(repetitions, "rejected trial start");
            return Err(ControllerError::InvalidRepetitions(repetitions));
        }
        if self.state.phase.is_trial_active() {
            warn!(phase = %self.state.phase, "rejected trial start, trial already running");
            return Err(ControllerError::TrialInProgress(self.state.phase));
        }
        let words = self
            .randomizer
            .pick_words(&self.config.vocabulary)
            .ok_or(ControllerError::NoChoices)?;

        let display_mode = DisplayMode::from_descriptor(display_descriptor);
        let trial = TrialConfig {
            flash_ms,
            repetitions,
            background: background.to_string(),
            display_descriptor: display_descriptor.to_string(),
            display_mode,
            forward_mask_ms: self.forward_mask_ms,
            backward_mask_ms: self.backward_mask_ms,
        };

        self.trial_counter += 1;
        info!(
            trial = self.trial_counter,
            flash_ms,
            repetitions,
            background,
            display = display_descriptor,
            forward_mask_ms = trial.forward_mask_ms,
            backward_mask_ms = trial.backward_mask_ms,
            "starting trial"
        );

        let visuals = visual::resolve(display_mode, background);
        self.state = TrialRuntimeState::default();
        self.state.timestamps.started_at_epoch_ms = self.timer.unix_millis();
        self.state.visuals = Some(visuals.clone());
        self.outbox.publish(PresentationEvent::ChoicesReady {
            target: words.target.clone(),
            choices: words.choices.clone(),
        });
        self.outbox.publish(PresentationEvent::FlashVisuals(visuals));
        self.state.words = Some(words);
        self.trial = Some(trial);

        let now = self.timer.now();
        self.enter_waiting(now);
        Ok(())
    }

    /// Per-frame entry point. A repeated timestamp is the same frame and a
    /// smaller one is ignored; both return the current instructions without
    /// advancing.
    pub fn tick(&mut self, now_ns: u64, refresh_hz: f32) -> FrameInstructions {
        self.refresh_hz = effective_refresh_rate(Some(refresh_hz), self.config.default_refresh_hz);
        match self.last_tick_ns {
            Some(last) if now_ns < last => {
                warn!(now_ns, last_ns = last, "non-monotonic tick ignored");
                return self.instructions();
            }
            Some(last) if now_ns == last => return self.instructions(),
            _ => {}
        }
        self.last_tick_ns = Some(now_ns);
        self.advance(now_ns);
        self.instructions()
    }

    /// Scores the guess, hands the result to the recorder and returns to
    /// Menu. Outside Guessing this is a reported no-op.
    pub fn handle_guess(&mut self, guess: &str) -> Result<TrialResult, ControllerError> {
        if !self.state.phase.allows_guess() {
            warn!(phase = %self.state.phase, guess, "guess outside guessing phase");
            return Err(ControllerError::NotGuessing(self.state.phase));
        }
        let (Some(trial), Some(words)) = (self.trial.take(), self.state.words.take()) else {
            // unreachable while Guessing, but leave the machine consistent
            self.go_to_menu();
            return Err(ControllerError::NotGuessing(Phase::Menu));
        };

        let now = self.timer.now();
        let response_time_ms = self
            .state
            .timestamps
            .guess_started_ns
            .map_or(0, |start| now.saturating_sub(start) / NS_PER_MS);
        let correct = guess == words.target;
        let samples = std::mem::take(&mut self.state.samples);
        let flash_background = self
            .state
            .flash_background
            .take()
            .unwrap_or_else(|| trial.background.clone());

        let result = TrialResult {
            trial_index: self.trial_counter,
            started_at_epoch_ms: self.state.timestamps.started_at_epoch_ms,
            background: trial.background,
            display_descriptor: trial.display_descriptor,
            flash_background,
            flash_duration_target_ms: trial.flash_ms,
            forward_mask_ms: trial.forward_mask_ms,
            backward_mask_ms: trial.backward_mask_ms,
            repetitions: trial.repetitions,
            wait_durations_ms: samples.wait_durations_ms,
            flash_durations_ms: samples.flash_durations_ms,
            target_word: words.target,
            choices: words.choices,
            guess: guess.to_string(),
            correct,
            response_time_ms,
        };
        info!(
            trial = result.trial_index,
            correct,
            response_time_ms,
            "trial finished"
        );

        self.outbox.emit_result(result.clone());
        self.outbox.publish(PresentationEvent::Background {
            label: result.background.clone(),
        });
        self.outbox.publish(PresentationEvent::Result { correct });
        self.state = TrialRuntimeState::default();
        Ok(result)
    }

    /// Operator abort. Safe from any phase; nothing is recorded.
    pub fn reset_to_menu(&mut self) {
        if self.state.phase.is_trial_active() {
            info!(phase = %self.state.phase, "trial aborted");
        }
        if let Some(trial) = &self.trial {
            self.outbox.publish(PresentationEvent::Background {
                label: trial.background.clone(),
            });
        }
        self.go_to_menu();
    }

    /// Visibility and placement for the current phase.
    pub fn instructions(&self) -> FrameInstructions {
        let phase = self.state.phase;
        let placement = &self.config.placement;
        let geometry = &self.config.mask;

        let stimulus_visible = phase.shows_stimulus();
        let stimulus = StimulusInstruction {
            visible: stimulus_visible,
            offset: Vec3::new(0.0, 0.0, placement.stimulus_depth),
            word: if stimulus_visible {
                self.state.words.as_ref().map(|w| w.target.clone())
            } else {
                None
            },
            visuals: self.state.visuals.clone(),
        };

        let masking = phase.is_masking();
        // tiles are anchored at the panel's bottom-left corner
        let mask_origin = Vec3::new(
            -geometry.panel_width / 2.0,
            -geometry.panel_height / 2.0,
            placement.mask_depth,
        );
        let mask_tiles = self
            .state
            .mask_layout
            .tiles
            .iter()
            .map(|tile| MaskTileInstruction {
                visible: masking,
                offset: mask_origin + tile.offset,
                width: tile.width,
                height: tile.height,
                color: tile.color,
            })
            .collect();

        let fixation_origin = Vec3::new(0.0, 0.0, placement.fixation_depth);
        let fixation = FixationInstruction {
            visible: phase.shows_fixation(),
            offsets: placement
                .fixation_bars
                .iter()
                .map(|bar| fixation_origin + *bar)
                .collect(),
        };

        FrameInstructions {
            phase,
            stimulus,
            mask_tiles,
            fixation,
        }
    }

    fn advance(&mut self, now: u64) {
        let Some(trial) = &self.trial else {
            return;
        };
        let forward_ns = u64::from(trial.forward_mask_ms) * NS_PER_MS;
        let backward_ns = u64::from(trial.backward_mask_ms) * NS_PER_MS;
        let elapsed_ns = now.saturating_sub(self.state.timestamps.phase_entered_ns);

        match self.state.phase {
            Phase::Menu | Phase::Guessing => {}
            Phase::Waiting => {
                if elapsed_ns >= self.state.wait_ms.saturating_mul(NS_PER_MS) {
                    self.enter_forward_masking(now);
                }
            }
            Phase::ForwardMasking => {
                if elapsed_ns >= forward_ns {
                    self.enter_flashing(now);
                }
            }
            Phase::Flashing => {
                if self.state.frames_remaining == 0 {
                    let started = self.state.timestamps.flash_started_ns.unwrap_or(now);
                    let actual_ms = now.saturating_sub(started) as f64 / NS_PER_MS as f64;
                    self.state.samples.flash_durations_ms.push(actual_ms);
                    debug!("flash completed, actual duration {actual_ms:.2} ms");
                    self.enter_backward_masking(now);
                } else {
                    self.state.frames_remaining -= 1;
                }
            }
            Phase::BackwardMasking => {
                if elapsed_ns >= backward_ns {
                    self.check_repetitions(now);
                }
            }
            Phase::Processing => {
                if elapsed_ns >= self.config.processing_delay_ms.saturating_mul(NS_PER_MS) {
                    self.enter_guessing(now);
                }
            }
        }
    }

    fn enter(&mut self, phase: Phase, now: u64) {
        self.state.phase = phase;
        self.state.timestamps.phase_entered_ns = now;
    }

    fn enter_waiting(&mut self, now: u64) {
        self.enter(Phase::Waiting, now);
        let wait_ms = self.randomizer.draw_wait_ms(self.config.wait_range_ms);
        self.state.wait_ms = wait_ms;
        self.state.samples.wait_durations_ms.push(wait_ms);
        if let Some(trial) = &self.trial {
            self.outbox.publish(PresentationEvent::Background {
                label: trial.background.clone(),
            });
        }
        debug!(
            wait_ms,
            repetition = self.state.current_repetition,
            "waiting"
        );
    }

    fn enter_forward_masking(&mut self, now: u64) {
        let forward_mask_ms = self.trial.as_ref().map_or(0, |t| t.forward_mask_ms);
        if forward_mask_ms == 0 {
            self.enter_flashing(now);
            return;
        }
        self.enter(Phase::ForwardMasking, now);
        self.state.mask_layout = self.randomizer.mask_layout(&self.config.mask);
        debug!(forward_mask_ms, "forward mask");
    }

    fn enter_flashing(&mut self, now: u64) {
        let Some(trial) = &self.trial else {
            return;
        };
        let frames = frames_for(trial.flash_ms, self.refresh_hz);
        let visuals = visual::resolve(trial.display_mode, &trial.background);
        let flash_ms = trial.flash_ms;

        self.enter(Phase::Flashing, now);
        self.state.timestamps.flash_started_ns = Some(now);
        // this tick already shows the first frame
        self.state.frames_remaining = frames - 1;
        self.state.flash_background = Some(visuals.background_label.clone());
        if self.state.visuals.as_ref() != Some(&visuals) {
            self.state.visuals = Some(visuals.clone());
            self.outbox.publish(PresentationEvent::FlashVisuals(visuals));
        }
        debug!(
            frames,
            refresh_hz = self.refresh_hz,
            flash_ms,
            "flashing"
        );
    }

    fn enter_backward_masking(&mut self, now: u64) {
        let Some(trial) = &self.trial else {
            return;
        };
        let backward_mask_ms = trial.backward_mask_ms;
        self.outbox.publish(PresentationEvent::Background {
            label: trial.background.clone(),
        });
        if backward_mask_ms == 0 {
            self.check_repetitions(now);
            return;
        }
        self.enter(Phase::BackwardMasking, now);
        self.state.mask_layout = self.randomizer.mask_layout(&self.config.mask);
        debug!(backward_mask_ms, "backward mask");
    }

    fn check_repetitions(&mut self, now: u64) {
        let repetitions = self.trial.as_ref().map_or(1, |t| t.repetitions);
        if self.state.current_repetition + 1 < repetitions {
            self.state.current_repetition += 1;
            self.enter_waiting(now);
        } else {
            self.enter_processing(now);
        }
    }

    fn enter_processing(&mut self, now: u64) {
        self.enter(Phase::Processing, now);
        if let Some(trial) = &self.trial {
            self.outbox.publish(PresentationEvent::Background {
                label: trial.background.clone(),
            });
        }
        debug!(
            processing_delay_ms = self.config.processing_delay_ms,
            "processing"
        );
    }

    fn enter_guessing(&mut self, now: u64) {
        self.enter(Phase::Guessing, now);
        self.state.timestamps.guess_started_ns = Some(now);
        self.outbox.publish(PresentationEvent::GuessPrompt);
        debug!("awaiting guess");
    }

    fn go_to_menu(&mut self) {
        self.trial = None;
        self.state = TrialRuntimeState::default();
        self.outbox.publish(PresentationEvent::Menu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use subliminal_timing::ManualTimer;

    const HZ: f32 = 90.0;

    fn controller(config: ExperimentConfig) -> (PhaseController<ManualTimer, StdRng>, ManualTimer) {
        let timer = ManualTimer::new();
        let c = PhaseController::new(config, timer.clone(), StdRng::seed_from_u64(42)).unwrap();
        (c, timer)
    }

    fn fast_config() -> ExperimentConfig {
        ExperimentConfig {
            wait_range_ms: (100, 100),
            processing_delay_ms: 50,
            ..ExperimentConfig::default()
        }
    }

    /// Advances one frame at `HZ` and ticks.
    fn frame(c: &mut PhaseController<ManualTimer, StdRng>, timer: &ManualTimer) -> FrameInstructions {
        timer.advance(subliminal_timing::frame_period(HZ));
        c.tick(timer.now(), HZ)
    }

    fn run_until(
        c: &mut PhaseController<ManualTimer, StdRng>,
        timer: &ManualTimer,
        phase: Phase,
    ) -> FrameInstructions {
        for _ in 0..100_000 {
            let out = frame(c, timer);
            if out.phase == phase {
                return out;
            }
        }
        panic!("never reached {phase}");
    }

    #[test]
    fn starts_in_menu() {
        let (c, _) = controller(ExperimentConfig::default());
        assert_eq!(c.phase(), Phase::Menu);
        assert!(c.trial_config().is_none());
        assert_eq!(c.forward_mask_ms(), 50);
        assert_eq!(c.backward_mask_ms(), 150);
    }

    #[test]
    fn ticks_without_start_stay_in_menu() {
        let (mut c, timer) = controller(ExperimentConfig::default());
        for _ in 0..1000 {
            let out = frame(&mut c, &timer);
            assert_eq!(out.phase, Phase::Menu);
            assert!(!out.stimulus.visible);
            assert!(!out.fixation.visible);
            assert!(out.mask_tiles.is_empty());
        }
    }

    #[test]
    fn start_enters_waiting_with_a_drawn_wait() {
        let (mut c, _) = controller(ExperimentConfig::default());
        c.start_experiment(100, 1, "Indoor room", "Black void, white letters")
            .unwrap();
        assert_eq!(c.phase(), Phase::Waiting);
        let rt = c.runtime();
        assert!((4000..=7000).contains(&rt.wait_ms));
        assert_eq!(rt.samples.wait_durations_ms, vec![rt.wait_ms]);
        let words = rt.words.as_ref().unwrap();
        assert!(words.choices.contains(&words.target));
        assert_eq!(c.trial_count(), 1);
    }

    #[test]
    fn invalid_start_arguments_are_rejected() {
        let (mut c, _) = controller(ExperimentConfig::default());
        assert_eq!(
            c.start_experiment(0, 1, "Indoor room", "White letters"),
            Err(ControllerError::InvalidFlashDuration(0))
        );
        assert_eq!(
            c.start_experiment(100, 0, "Indoor room", "White letters"),
            Err(ControllerError::InvalidRepetitions(0))
        );
        assert_eq!(c.phase(), Phase::Menu);
        assert_eq!(c.trial_count(), 0);
    }

    #[test]
    fn second_start_during_trial_is_rejected() {
        let (mut c, _) = controller(ExperimentConfig::default());
        c.start_experiment(100, 1, "Indoor room", "White letters")
            .unwrap();
        let wait = c.runtime().wait_ms;
        assert_eq!(
            c.start_experiment(100, 1, "Indoor room", "White letters"),
            Err(ControllerError::TrialInProgress(Phase::Waiting))
        );
        assert_eq!(c.runtime().wait_ms, wait);
        assert_eq!(c.trial_count(), 1);
    }

    #[test]
    fn same_timestamp_is_idempotent() {
        let (mut c, timer) = controller(fast_config());
        c.start_experiment(100, 1, "Indoor room", "Black void").unwrap();
        let a = c.tick(timer.now(), HZ);
        let b = c.tick(timer.now(), HZ);
        assert_eq!(a, b);
        assert_eq!(c.runtime().samples.wait_durations_ms.len(), 1);

        let flashing = run_until(&mut c, &timer, Phase::Flashing);
        let remaining = c.runtime().frames_remaining;
        let again = c.tick(timer.now(), HZ);
        assert_eq!(flashing, again);
        assert_eq!(c.runtime().frames_remaining, remaining);
    }

    #[test]
    fn backwards_timestamp_is_ignored() {
        let (mut c, timer) = controller(fast_config());
        c.start_experiment(100, 1, "Indoor room", "Black void").unwrap();
        timer.advance_ms(50);
        let before = c.tick(timer.now(), HZ);
        let after = c.tick(timer.now() - 10 * NS_PER_MS, HZ);
        assert_eq!(before, after);
    }

    #[test]
    fn flashing_holds_for_computed_frames() {
        let (mut c, timer) = controller(fast_config());
        c.start_experiment(100, 1, "Indoor room", "Black void, white letters")
            .unwrap();
        let first = run_until(&mut c, &timer, Phase::Flashing);
        assert!(first.stimulus.visible);
        let mut shown = 1;
        loop {
            let out = frame(&mut c, &timer);
            if out.phase != Phase::Flashing {
                assert_eq!(out.phase, Phase::BackwardMasking);
                break;
            }
            assert!(out.stimulus.visible);
            shown += 1;
        }
        assert_eq!(shown, 9);
        let measured = c.runtime().samples.flash_durations_ms[0];
        assert!((measured - 100.0).abs() < 0.5, "measured {measured}");
    }

    #[test]
    fn masks_are_visible_only_while_masking() {
        let (mut c, timer) = controller(fast_config());
        c.start_experiment(100, 1, "Indoor room", "Black void").unwrap();
        let fwd = run_until(&mut c, &timer, Phase::ForwardMasking);
        assert_eq!(fwd.mask_tiles.len(), 40);
        assert!(fwd.mask_visible());
        assert!(!fwd.stimulus.visible);
        assert!(!fwd.fixation.visible);
        let forward_layout = c.runtime().mask_layout.clone();

        let flash = run_until(&mut c, &timer, Phase::Flashing);
        assert!(!flash.mask_visible());
        assert_eq!(flash.stimulus.word.as_deref(), Some(c.runtime().words.as_ref().unwrap().target.as_str()));

        let back = run_until(&mut c, &timer, Phase::BackwardMasking);
        assert!(back.mask_visible());
        assert_ne!(c.runtime().mask_layout, forward_layout);
    }

    #[test]
    fn fixation_shown_while_waiting_and_processing() {
        let (mut c, timer) = controller(fast_config());
        c.start_experiment(100, 1, "Indoor room", "Black void").unwrap();
        let waiting = c.tick(timer.now(), HZ);
        assert_eq!(waiting.phase, Phase::Waiting);
        assert!(waiting.fixation.visible);
        assert_eq!(waiting.fixation.offsets.len(), 2);
        assert!((waiting.fixation.offsets[0].z - 1.05).abs() < 1e-6);
        let processing = run_until(&mut c, &timer, Phase::Processing);
        assert!(processing.fixation.visible);
        let guessing = run_until(&mut c, &timer, Phase::Guessing);
        assert!(!guessing.fixation.visible);
    }

    #[test]
    fn zero_mask_durations_skip_masking() {
        let mut config = fast_config();
        config.forward_mask.min_ms = 0;
        config.backward_mask.min_ms = 0;
        let (mut c, timer) = controller(config);
        assert_eq!(c.set_forward_mask_ms(0), 0);
        assert_eq!(c.set_backward_mask_ms(0), 0);
        c.start_experiment(30, 2, "Indoor room", "Black void").unwrap();

        let mut seen = Vec::new();
        for _ in 0..10_000 {
            let out = frame(&mut c, &timer);
            if seen.last() != Some(&out.phase) {
                seen.push(out.phase);
            }
            if out.phase == Phase::Guessing {
                break;
            }
        }
        assert_eq!(
            seen,
            vec![
                Phase::Waiting,
                Phase::Flashing,
                Phase::Waiting,
                Phase::Flashing,
                Phase::Processing,
                Phase::Guessing
            ]
        );
        assert!(c.runtime().mask_layout.is_empty());
    }

    #[test]
    fn mask_setters_clamp_and_apply_to_next_trial() {
        let (mut c, _) = controller(fast_config());
        assert_eq!(c.set_forward_mask_ms(0), 10);
        assert_eq!(c.set_forward_mask_ms(5000), 200);
        assert_eq!(c.set_backward_mask_ms(3), 10);
        assert_eq!(c.set_backward_mask_ms(400), 250);

        c.set_forward_mask_ms(80);
        c.start_experiment(100, 1, "Indoor room", "Black void").unwrap();
        c.set_forward_mask_ms(120);
        assert_eq!(c.trial_config().unwrap().forward_mask_ms, 80);
        assert_eq!(c.forward_mask_ms(), 120);
    }

    #[test]
    fn guess_outside_guessing_is_a_noop() {
        let (mut c, _) = controller(fast_config());
        assert_eq!(
            c.handle_guess("APPLE"),
            Err(ControllerError::NotGuessing(Phase::Menu))
        );
        c.start_experiment(100, 1, "Indoor room", "Black void").unwrap();
        assert_eq!(
            c.handle_guess("APPLE"),
            Err(ControllerError::NotGuessing(Phase::Waiting))
        );
        assert_eq!(c.phase(), Phase::Waiting);
    }

    #[test]
    fn guess_builds_complete_result() {
        let (mut c, timer) = controller(fast_config());
        c.start_experiment(100, 3, "Indoor room", "White letters")
            .unwrap();
        run_until(&mut c, &timer, Phase::Guessing);
        let target = c.runtime().words.as_ref().unwrap().target.clone();
        timer.advance_ms(1234);

        let result = c.handle_guess(&target).unwrap();
        assert!(result.correct);
        assert_eq!(result.guess, target);
        assert_eq!(result.trial_index, 1);
        assert_eq!(result.repetitions, 3);
        assert_eq!(result.wait_durations_ms, vec![100, 100, 100]);
        assert_eq!(result.flash_durations_ms.len(), 3);
        assert_eq!(result.flash_duration_target_ms, 100);
        assert_eq!(result.forward_mask_ms, 50);
        assert_eq!(result.backward_mask_ms, 150);
        assert_eq!(result.background, "Indoor room");
        assert_eq!(result.flash_background, "Indoor room");
        assert_eq!(result.display_descriptor, "White letters");
        assert_eq!(result.response_time_ms, 1234);
        assert_eq!(c.phase(), Phase::Menu);
        assert!(c.trial_config().is_none());
    }

    #[test]
    fn wrong_guess_is_incorrect() {
        let (mut c, timer) = controller(fast_config());
        c.start_experiment(100, 1, "Indoor room", "White letters")
            .unwrap();
        run_until(&mut c, &timer, Phase::Guessing);
        let words = c.runtime().words.clone().unwrap();
        let decoy = words.choices.iter().find(|w| **w != words.target).unwrap();
        let result = c.handle_guess(decoy).unwrap();
        assert!(!result.correct);
    }

    #[test]
    fn reset_during_flashing_leaves_clean_state() {
        let (mut c, timer) = controller(fast_config());
        c.start_experiment(200, 3, "Indoor room", "Black void").unwrap();
        run_until(&mut c, &timer, Phase::Flashing);
        assert!(c.runtime().frames_remaining > 0);

        c.reset_to_menu();
        assert_eq!(c.phase(), Phase::Menu);
        let idle = frame(&mut c, &timer);
        assert_eq!(idle.phase, Phase::Menu);
        assert!(idle.mask_tiles.is_empty());

        c.start_experiment(100, 1, "Indoor room", "Black void").unwrap();
        let rt = c.runtime();
        assert_eq!(rt.frames_remaining, 0);
        assert_eq!(rt.current_repetition, 0);
        assert_eq!(rt.samples.wait_durations_ms.len(), 1);
        assert!(rt.samples.flash_durations_ms.is_empty());
        assert!(rt.mask_layout.is_empty());
        assert_eq!(c.trial_count(), 2);
    }

    #[test]
    fn reset_from_menu_is_harmless() {
        let (mut c, _) = controller(fast_config());
        c.reset_to_menu();
        c.reset_to_menu();
        assert_eq!(c.phase(), Phase::Menu);
    }

    #[test]
    fn invalid_refresh_rate_uses_default() {
        let (mut c, timer) = controller(fast_config());
        c.tick(timer.now() + 1, 0.0);
        assert_eq!(c.refresh_hz(), 90.0);
        c.tick(timer.now() + 2, 120.0);
        assert_eq!(c.refresh_hz(), 120.0);
        assert_eq!(c.preview_frames(100), 12);
    }

    #[test]
    fn huge_configured_delays_do_not_overflow() {
        let config = ExperimentConfig::from_json_str(
            r#"{"wait_range_ms": [20000000000000, 20000000000000], "processing_delay_ms": 18446744073709551615}"#,
        )
        .unwrap();
        let (mut c, timer) = controller(config);
        c.start_experiment(100, 1, "Indoor room", "Black void").unwrap();
        for _ in 0..100 {
            assert_eq!(frame(&mut c, &timer).phase, Phase::Waiting);
        }
        timer.set_ns(u64::MAX - 1);
        assert_eq!(c.tick(timer.now(), HZ).phase, Phase::Waiting);
        assert_eq!(c.runtime().wait_ms, 20_000_000_000_000);
    }

    #[test]
    fn presentation_events_follow_the_trial() {
        let (outbox, prx, rrx) = Outbox::bounded(256);
        let timer = ManualTimer::new();
        let mut c = PhaseController::new(fast_config(), timer.clone(), StdRng::seed_from_u64(9))
            .unwrap()
            .with_outbox(outbox);
        c.start_experiment(100, 1, "Landscape", "White letters").unwrap();
        run_until(&mut c, &timer, Phase::Guessing);
        let target = c.runtime().words.as_ref().unwrap().target.clone();
        c.handle_guess(&target).unwrap();

        let events: Vec<PresentationEvent> = prx.try_iter().collect();
        assert!(matches!(events[0], PresentationEvent::ChoicesReady { .. }));
        assert!(matches!(events[1], PresentationEvent::FlashVisuals(_)));
        assert!(events.contains(&PresentationEvent::GuessPrompt));
        assert_eq!(
            events.last(),
            Some(&PresentationEvent::Result { correct: true })
        );
        let result = rrx.try_recv().unwrap();
        assert_eq!(result.target_word, target);
        assert!(rrx.try_recv().is_err());
    }
}
