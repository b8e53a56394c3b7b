pub mod frames;
pub mod manual;
pub mod timer;

pub use frames::{DEFAULT_REFRESH_HZ, effective_refresh_rate, frame_period, frames_for};
pub use manual::ManualTimer;
pub use timer::{CalibrationStats, HighPrecisionTimer, Timer};
