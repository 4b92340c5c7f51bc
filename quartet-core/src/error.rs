use core::fmt;

use crate::prune::CullReason;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchError {
    ZeroSeed,
    HorizonOutOfRange { horizon: u16, max: u16 },
    /// Starting node carries a timer speed the game never reaches.
    InvalidTimerSpeed { timer_speed: u8 },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSeed => write!(f, "seed 0 is outside the generator cycle"),
            Self::HorizonOutOfRange { horizon, max } => {
                write!(f, "horizon out of range: {horizon} (allowed 1..={max})")
            }
            Self::InvalidTimerSpeed { timer_speed } => write!(
                f,
                "timer speed {timer_speed:#04x} is not an even value in 0x40..=0x80"
            ),
        }
    }
}

impl std::error::Error for SearchError {}

/// Why a recorded schedule does not replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    Search(SearchError),
    LengthMismatch { expected: usize, actual: usize },
    FirstDelayOutOfRange { delay: u16, min: u16, max: u16 },
    DelayOutOfRange { turn: u16, delay: u16, limit: u8 },
    ConstraintViolated { turn: u16, reason: CullReason },
    DelayLimitExceeded { total: u32, cutoff: u32 },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search(err) => write!(f, "{err}"),
            Self::LengthMismatch { expected, actual } => write!(
                f,
                "schedule length mismatch: expected {expected} delays, got {actual}"
            ),
            Self::FirstDelayOutOfRange { delay, min, max } => write!(
                f,
                "first-turn delay {delay} out of range (allowed {min}..={max})"
            ),
            Self::DelayOutOfRange { turn, delay, limit } => write!(
                f,
                "delay {delay} at turn {turn} exceeds the input window (limit {limit})"
            ),
            Self::ConstraintViolated { turn, reason } => {
                write!(f, "turn {turn} rolls an unusable face: {reason}")
            }
            Self::DelayLimitExceeded { total, cutoff } => {
                write!(f, "total delay {total} exceeds cutoff {cutoff}")
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

impl From<SearchError> for ScheduleError {
    fn from(err: SearchError) -> Self {
        Self::Search(err)
    }
}
