use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use subliminal_core::TrialResult;
use tracing::{info, warn};

use crate::logger::CsvTrialLogger;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecorderSummary {
    pub written: u64,
    pub failed: u64,
}

/// Drains `results` on a dedicated thread until every sender is gone.
/// A failed write is logged and skipped; later trials are still recorded.
pub fn spawn_recorder(
    mut logger: CsvTrialLogger,
    results: Receiver<TrialResult>,
) -> io::Result<JoinHandle<RecorderSummary>> {
    thread::Builder::new()
        .name("trial-recorder".into())
        .spawn(move || {
            let mut summary = RecorderSummary::default();
            for result in results.iter() {
                match logger.log(&result) {
                    Ok(()) => summary.written += 1,
                    Err(e) => {
                        summary.failed += 1;
                        warn!(trial = result.trial_index, error = %e, "trial not recorded");
                    }
                }
            }
            info!(
                written = summary.written,
                failed = summary.failed,
                path = %logger.path().display(),
                "recorder stopped"
            );
            summary
        })
}
