//! Row formatting. Every field is quoted, list fields are `|`-joined.

use subliminal_core::TrialResult;

pub const COLUMNS: [&str; 17] = [
    "session_id",
    "trial_index",
    "started_at_epoch_ms",
    "waiting_background",
    "flash_display_type",
    "flash_background",
    "flash_duration_target_ms",
    "forward_mask_ms",
    "backward_mask_ms",
    "repetitions",
    "wait_durations_ms",
    "flash_durations_ms",
    "target_message",
    "choices",
    "guess",
    "correct",
    "response_time_ms",
];

const LIST_SEPARATOR: &str = "|";

/// Wraps in double quotes, doubling any embedded quote.
pub fn escape(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn join_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = fields
        .into_iter()
        .map(|f| escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

pub fn header() -> String {
    join_line(COLUMNS)
}

pub fn row(session_id: &str, result: &TrialResult) -> String {
    let waits = result
        .wait_durations_ms
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR);
    let flashes = result
        .flash_durations_ms
        .iter()
        .map(|ms| format!("{ms:.2}"))
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR);

    join_line([
        session_id.to_string(),
        result.trial_index.to_string(),
        result.started_at_epoch_ms.to_string(),
        result.background.clone(),
        result.display_descriptor.clone(),
        result.flash_background.clone(),
        result.flash_duration_target_ms.to_string(),
        result.forward_mask_ms.to_string(),
        result.backward_mask_ms.to_string(),
        result.repetitions.to_string(),
        waits,
        flashes,
        result.target_word.clone(),
        result.choices.join(LIST_SEPARATOR),
        result.guess.clone(),
        result.correct.to_string(),
        result.response_time_ms.to_string(),
    ])
}
