//! Persists finished trials as CSV rows, one file per session.

pub mod csv;
pub mod error;
pub mod logger;
pub mod worker;

pub use error::RecorderError;
pub use logger::CsvTrialLogger;
pub use worker::{RecorderSummary, spawn_recorder};
