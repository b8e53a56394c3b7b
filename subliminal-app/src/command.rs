//! Line protocol of the interactive control surface.
//!
//! ```text
//! start <flash_ms> <repetitions> "<background>" "<display descriptor>"
//! forward <ms>
//! backward <ms>
//! guess <word>
//! reset
//! status
//! quit
//! ```

use subliminal_experiment::ControlCommand;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Control(ControlCommand),
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unbalanced quotes")]
    Quoting,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("`{0}` is not a non-negative integer")]
    Number(String),
}

const START_USAGE: &str = "start <flash_ms> <repetitions> \"<background>\" \"<display>\"";

/// `Ok(None)` for blank lines and `#` comments.
pub fn parse_line(line: &str) -> Result<Option<Input>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let words = shlex::split(line).ok_or(ParseError::Quoting)?;
    let Some((verb, rest)) = words.split_first() else {
        return Ok(None);
    };

    let input = match (verb.to_ascii_lowercase().as_str(), rest) {
        ("start", [flash, reps, background, display]) => Input::Control(ControlCommand::Start {
            flash_ms: number(flash)?,
            repetitions: number(reps)?,
            background: background.clone(),
            display: display.clone(),
        }),
        ("start", _) => return Err(ParseError::Usage(START_USAGE)),
        ("forward", [ms]) => Input::Control(ControlCommand::SetForwardMask(number(ms)?)),
        ("forward", _) => return Err(ParseError::Usage("forward <ms>")),
        ("backward", [ms]) => Input::Control(ControlCommand::SetBackwardMask(number(ms)?)),
        ("backward", _) => return Err(ParseError::Usage("backward <ms>")),
        ("guess", [word]) => Input::Control(ControlCommand::Guess(word.clone())),
        ("guess", _) => return Err(ParseError::Usage("guess <word>")),
        ("reset", []) => Input::Control(ControlCommand::Reset),
        ("status", []) => Input::Status,
        ("quit" | "exit", []) => Input::Quit,
        _ => return Err(ParseError::Unknown(verb.clone())),
    };
    Ok(Some(input))
}

fn number(raw: &str) -> Result<u32, ParseError> {
    raw.parse().map_err(|_| ParseError::Number(raw.to_string()))
}
