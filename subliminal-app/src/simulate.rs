//! One trial on a simulated clock. Same seed, same result.

use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use subliminal_core::{Phase, TrialResult};
use subliminal_experiment::{ExperimentConfig, Outbox, PhaseController};
use subliminal_recorder::{CsvTrialLogger, spawn_recorder};
use subliminal_timing::{ManualTimer, Timer, frame_period};
use tracing::{debug, info};

use crate::app::load_config;
use crate::cli::{GuessStrategy, SimulateArgs};

/// Every timed phase at its longest, plus a second of slack per repetition.
fn time_budget_ms(config: &ExperimentConfig, args: &SimulateArgs) -> u64 {
    let cycle_ms = config
        .wait_range_ms
        .1
        .saturating_add(u64::from(config.forward_mask.max_ms))
        .saturating_add(u64::from(args.flash_ms))
        .saturating_add(u64::from(config.backward_mask.max_ms))
        .saturating_add(1_000);
    u64::from(args.repetitions)
        .saturating_mul(cycle_ms)
        .saturating_add(config.processing_delay_ms)
}

pub fn simulate(args: &SimulateArgs) -> Result<TrialResult> {
    let config = load_config(args.config.as_deref())?;
    let budget_ms = time_budget_ms(&config, args);

    let mut timer = ManualTimer::new().with_epoch_ms(args.epoch_ms);
    let (outbox, events, results) = Outbox::bounded(config.queue_capacity);
    let mut controller = PhaseController::new(config, timer.clone(), StdRng::seed_from_u64(args.seed))
        .context("building phase controller")?
        .with_outbox(outbox);

    let recorder = match &args.output_dir {
        Some(dir) => {
            let logger = CsvTrialLogger::create(dir).context("opening session log")?;
            Some(spawn_recorder(logger, results).context("spawning recorder thread")?)
        }
        None => None,
    };

    if let Some(ms) = args.forward_mask_ms {
        controller.set_forward_mask_ms(ms);
    }
    if let Some(ms) = args.backward_mask_ms {
        controller.set_backward_mask_ms(ms);
    }
    controller.start_experiment(args.flash_ms, args.repetitions, &args.background, &args.display)?;

    let period = frame_period(args.refresh_hz);
    let mut flash_frames = 0u32;
    while controller.phase() != Phase::Guessing {
        if timer.now() / 1_000_000 > budget_ms {
            bail!("trial did not reach the guess prompt within {budget_ms} ms");
        }
        timer.sleep(period);
        timer.record_frame(period);
        let frame = controller.tick(timer.now(), args.refresh_hz);
        if frame.stimulus.visible {
            flash_frames += 1;
        }
    }
    info!(
        flash_frames,
        refresh_hz = controller.refresh_hz(),
        "reached guess prompt"
    );

    timer.sleep(std::time::Duration::from_millis(args.response_ms));
    let words = controller
        .runtime()
        .words
        .clone()
        .context("guessing phase without a word set")?;
    let guess = match args.guess {
        GuessStrategy::Target => words.target.clone(),
        GuessStrategy::Decoy => words
            .choices
            .iter()
            .find(|w| **w != words.target)
            .cloned()
            .context("no decoy among the choices")?,
    };
    let result = controller.handle_guess(&guess)?;

    drop(controller);
    for event in events.try_iter() {
        debug!(event = ?event, "presentation update");
    }
    if let Some(recorder) = recorder {
        let summary = recorder
            .join()
            .map_err(|_| anyhow::anyhow!("recorder thread panicked"))?;
        info!(written = summary.written, "simulated trial recorded");
    }
    Ok(result)
}
