use std::str::FromStr;

use scene::RegionKind;

/// One step of a replayable interaction script.
///
/// Text form: `state:NAME`, `district:NAME`, `hover:NAME`, `leave`, `back`,
/// `reset`, `wait:MS`, `explore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Click { kind: RegionKind, name: String },
    Hover(String),
    Leave,
    Back,
    Reset,
    /// Advance frames until at least this many milliseconds have passed.
    Wait(u64),
    Explore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepParseError(pub String);

impl std::fmt::Display for StepParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid script step {:?}", self.0)
    }
}

impl std::error::Error for StepParseError {}

impl FromStr for Step {
    type Err = StepParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || StepParseError(s.to_string());
        let (verb, arg) = match s.split_once(':') {
            Some((v, a)) => (v.trim(), Some(a.trim())),
            None => (s.trim(), None),
        };
        let named = |arg: Option<&str>| match arg {
            Some(a) if !a.is_empty() => Ok(a.to_string()),
            _ => Err(err()),
        };
        match (verb, arg) {
            ("state", a) => Ok(Step::Click {
                kind: RegionKind::State,
                name: named(a)?,
            }),
            ("district", a) => Ok(Step::Click {
                kind: RegionKind::District,
                name: named(a)?,
            }),
            ("hover", a) => Ok(Step::Hover(named(a)?)),
            ("wait", Some(ms)) => ms.parse().map(Step::Wait).map_err(|_| err()),
            ("leave", None) => Ok(Step::Leave),
            ("back", None) => Ok(Step::Back),
            ("reset", None) => Ok(Step::Reset),
            ("explore", None) => Ok(Step::Explore),
            _ => Err(err()),
        }
    }
}
