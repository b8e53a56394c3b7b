//! Conversion of requested stimulus durations into whole display frames.
//!
//! The stimulus is scheduled by frame count, not by polling the clock: a
//! fixed frame budget keeps it on screen for an integral number of refreshes
//! no matter how much the tick jitters.

use std::time::Duration;

/// Used when the display does not report a refresh rate.
pub const DEFAULT_REFRESH_HZ: f32 = 90.0;

/// `max(1, round(duration_ms * refresh_hz / 1000))`.
///
/// A non-finite or non-positive `refresh_hz` is replaced by
/// [`DEFAULT_REFRESH_HZ`].
pub fn frames_for(duration_ms: u32, refresh_hz: f32) -> u32 {
    let hz = effective_refresh_rate(Some(refresh_hz), DEFAULT_REFRESH_HZ);
    let frames = (f64::from(duration_ms) * f64::from(hz) / 1000.0).round();
    // `as` saturates at u32::MAX for absurd inputs
    frames.max(1.0) as u32
}

/// Picks the observed refresh rate when it is usable, else `fallback`.
pub fn effective_refresh_rate(observed: Option<f32>, fallback: f32) -> f32 {
    match observed {
        Some(hz) if hz.is_finite() && hz > 0.0 => hz,
        _ => fallback,
    }
}

/// Duration of one frame at `refresh_hz`.
pub fn frame_period(refresh_hz: f32) -> Duration {
    let hz = effective_refresh_rate(Some(refresh_hz), DEFAULT_REFRESH_HZ);
    Duration::from_secs_f64(1.0 / f64::from(hz))
}
