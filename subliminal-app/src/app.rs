use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use rand::SeedableRng;
use rand::rngs::StdRng;
use subliminal_core::Phase;
use subliminal_experiment::{
    CommandOutcome, ExperimentConfig, Outbox, PhaseController, PresentationEvent, SharedController,
};
use subliminal_recorder::{CsvTrialLogger, spawn_recorder};
use subliminal_timing::{HighPrecisionTimer, Timer, effective_refresh_rate, frame_period};
use tracing::{debug, info, warn};

use crate::cli::RunArgs;
use crate::command::{self, Input};

type Controller = SharedController<HighPrecisionTimer, StdRng>;

pub fn load_config(path: Option<&Path>) -> Result<ExperimentConfig> {
    match path {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ExperimentConfig::default()),
    }
}

/// Live session: render-tick thread, presentation consumer, recorder, and
/// the stdin control surface on the calling thread.
pub struct App {
    controller: Controller,
    timer: HighPrecisionTimer,
    refresh_hz: f32,
    shutdown: Arc<AtomicBool>,
}

impl App {
    pub fn run(args: RunArgs) -> Result<()> {
        let config = load_config(args.config.as_deref())?;
        let refresh_hz = effective_refresh_rate(args.refresh_hz, config.default_refresh_hz);
        let rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let timer = HighPrecisionTimer::new();

        let (outbox, events, results) = Outbox::bounded(config.queue_capacity);
        let controller = PhaseController::new(config, timer.clone(), rng)
            .context("building phase controller")?
            .with_outbox(outbox);

        let logger = CsvTrialLogger::create(&args.output_dir).context("opening session log")?;
        let recorder = spawn_recorder(logger, results).context("spawning recorder thread")?;
        let presenter = spawn_presenter(events).context("spawning presentation thread")?;

        let app = App {
            controller: SharedController::new(controller),
            timer,
            refresh_hz,
            shutdown: Arc::new(AtomicBool::new(false)),
        };
        info!(
            refresh_hz,
            frame_ms = frame_period(refresh_hz).as_secs_f64() * 1e3,
            "session started"
        );
        let ticker = app.spawn_ticker().context("spawning tick thread")?;

        let outcome = app.control_loop(io::stdin().lock());

        app.shutdown.store(true, Ordering::Release);
        match ticker.join() {
            Ok(timer) => log_calibration(&timer),
            Err(_) => warn!("tick thread panicked"),
        }
        // last controller handle; closes both queues
        drop(app);
        if presenter.join().is_err() {
            warn!("presentation thread panicked");
        }
        match recorder.join() {
            Ok(summary) => info!(written = summary.written, failed = summary.failed, "session closed"),
            Err(_) => warn!("recorder thread panicked"),
        }
        outcome
    }

    /// Paces `tick` at the refresh rate and records every frame interval.
    /// Hands the timer back on shutdown for calibration statistics.
    fn spawn_ticker(&self) -> io::Result<JoinHandle<HighPrecisionTimer>> {
        let controller = self.controller.clone();
        let mut timer = self.timer.clone();
        let shutdown = Arc::clone(&self.shutdown);
        let hz = self.refresh_hz;
        let period = frame_period(hz);

        thread::Builder::new()
            .name("render-tick".into())
            .spawn(move || {
                let mut last_phase = Phase::Menu;
                let mut frame_start = timer.now();
                while !shutdown.load(Ordering::Acquire) {
                    let frame = controller.tick(frame_start, hz);
                    if frame.phase != last_phase {
                        debug!(from = %last_phase, to = %frame.phase, "phase change");
                        last_phase = frame.phase;
                    }
                    let spent = timer.elapsed(frame_start);
                    if spent < period {
                        timer.sleep(period - spent);
                    }
                    let now = timer.now();
                    timer.record_frame(Duration::from_nanos(now.saturating_sub(frame_start)));
                    frame_start = now;
                }
                timer
            })
    }

    fn control_loop(&self, input: impl BufRead) -> Result<()> {
        println!("ready: start <ms> <reps> \"<background>\" \"<display>\" | forward <ms> | backward <ms> | guess <word> | reset | status | quit");
        for line in input.lines() {
            let line = line.context("reading control input")?;
            match command::parse_line(&line) {
                Ok(None) => {}
                Ok(Some(Input::Quit)) => break,
                Ok(Some(Input::Status)) => self.print_status(),
                Ok(Some(Input::Control(cmd))) => match self.controller.dispatch(cmd) {
                    Ok(outcome) => print_outcome(&outcome),
                    Err(e) => println!("rejected: {e}"),
                },
                Err(e) => println!("error: {e}"),
            }
        }
        Ok(())
    }

    fn print_status(&self) {
        let status = self.controller.with(|c| {
            format!(
                "phase={} trials={} forward_mask_ms={} backward_mask_ms={} refresh_hz={:.1} preview=\"100 ({} fr)\" dropped={}",
                c.phase(),
                c.trial_count(),
                c.forward_mask_ms(),
                c.backward_mask_ms(),
                c.refresh_hz(),
                c.preview_frames(100),
                c.dropped_messages(),
            )
        });
        println!("{status}");
    }
}

fn print_outcome(outcome: &CommandOutcome) {
    match outcome {
        CommandOutcome::Started => println!("trial started"),
        CommandOutcome::MaskSet(ms) => println!("mask set to {ms} ms"),
        CommandOutcome::Guessed(result) => println!(
            "{} (target {}, {} ms)",
            if result.correct { "correct" } else { "incorrect" },
            result.target_word,
            result.response_time_ms
        ),
        CommandOutcome::Reset => println!("back to menu"),
    }
}

/// Stands in for the display: logs every UI update it would apply.
fn spawn_presenter(events: Receiver<PresentationEvent>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("presentation".into())
        .spawn(move || {
            for event in events.iter() {
                match &event {
                    PresentationEvent::ChoicesReady { choices, .. } => {
                        info!(choices = %choices.join(" / "), "choices ready")
                    }
                    PresentationEvent::GuessPrompt => {
                        println!("guess now")
                    }
                    PresentationEvent::Result { correct } => info!(correct, "result shown"),
                    other => debug!(event = ?other, "presentation update"),
                }
            }
        })
}

fn log_calibration(timer: &HighPrecisionTimer) {
    let stats = timer.calibration_stats();
    info!(
        mean_frame_ms = stats.average_frame_time_ns / 1e6,
        jitter_ms = stats.jitter_ns / 1e6,
        min_frame_ms = stats.min_frame_time_ns / 1e6,
        max_frame_ms = stats.max_frame_time_ns / 1e6,
        effective_fps = stats.effective_fps,
        "frame timing"
    );
}
