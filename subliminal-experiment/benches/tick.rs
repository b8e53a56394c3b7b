use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use pprof::criterion::{Output, PProfProfiler};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use subliminal_core::Phase;
use subliminal_experiment::{ExperimentConfig, PhaseController};
use subliminal_timing::{frame_period, ManualTimer, Timer};

const HZ: f32 = 90.0;

/// Controller parked in `phase` with a trial running.
fn parked_in(phase: Phase) -> (PhaseController<ManualTimer, StdRng>, ManualTimer) {
    let timer = ManualTimer::new();
    let mut c = PhaseController::new(ExperimentConfig::default(), timer.clone(), StdRng::seed_from_u64(7))
        .expect("default config is valid");
    c.start_experiment(500, 4, "Indoor room", "Black void, white letters")
        .expect("valid trial");
    while c.phase() != phase {
        timer.advance(frame_period(HZ));
        c.tick(timer.now(), HZ);
    }
    (c, timer)
}

pub fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    group
        .sample_size(50)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));

    group.bench_function("menu_idle", |b| {
        let timer = ManualTimer::new();
        let mut ctl = PhaseController::new(ExperimentConfig::default(), timer.clone(), StdRng::seed_from_u64(1))
            .expect("default config is valid");
        b.iter(|| {
            timer.advance(frame_period(HZ));
            black_box(ctl.tick(black_box(timer.now()), HZ));
        });
    });

    // mask frames clone all 40 tiles into the instruction payload
    group.bench_function("forward_masking", |b| {
        let (mut ctl, timer) = parked_in(Phase::ForwardMasking);
        let now = timer.now();
        b.iter(|| black_box(ctl.tick(black_box(now), HZ)));
    });

    group.bench_function("full_trial", |b| {
        b.iter_batched(
            || {
                let timer = ManualTimer::new();
                let ctl = PhaseController::new(ExperimentConfig::default(), timer.clone(), StdRng::seed_from_u64(3))
                    .expect("default config is valid");
                (ctl, timer)
            },
            |(mut ctl, timer)| {
                ctl.start_experiment(100, 2, "Landscape", "White letters")
                    .expect("valid trial");
                while ctl.phase() != Phase::Guessing {
                    timer.advance(frame_period(HZ));
                    black_box(ctl.tick(timer.now(), HZ));
                }
                black_box(ctl.handle_guess("APPLE").ok());
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
        .confidence_level(0.95)
        .noise_threshold(0.02);
    targets = bench_tick
}

criterion_main!(benches);
