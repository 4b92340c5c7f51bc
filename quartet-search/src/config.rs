use std::env;
use std::str::FromStr;
use std::thread;

use quartet_core::constants::{DEFAULT_DELAY_CUTOFF, TURN_COUNT};
use quartet_core::SearchConfig;

pub const ENV_DELAY_CUTOFF: &str = "QUARTET_DELAY_CUTOFF";
pub const ENV_HORIZON: &str = "QUARTET_HORIZON";
pub const ENV_JOBS: &str = "QUARTET_JOBS";

/// Half the hardware threads: the searches are CPU-bound and gain nothing
/// from hyperthread siblings.
pub fn default_jobs() -> usize {
    thread::available_parallelism()
        .map(|threads| threads.get() / 2)
        .unwrap_or(1)
        .max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub search: SearchConfig,
    pub jobs: usize,
}

impl Settings {
    pub fn from_env() -> Self {
        let mut horizon = read_env_u16(ENV_HORIZON, TURN_COUNT);
        if horizon > TURN_COUNT {
            tracing::warn!(
                "{} ({}) > {}. Falling back to the full horizon.",
                ENV_HORIZON,
                horizon,
                TURN_COUNT
            );
            horizon = TURN_COUNT;
        }

        Self {
            search: SearchConfig {
                delay_cutoff: read_env_u32(ENV_DELAY_CUTOFF, DEFAULT_DELAY_CUTOFF),
                horizon,
            },
            jobs: read_env_optional_usize(ENV_JOBS).unwrap_or_else(default_jobs),
        }
    }

    /// Command-line values win over the environment.
    pub fn with_overrides(
        mut self,
        delay_cutoff: Option<u32>,
        horizon: Option<u16>,
        jobs: Option<usize>,
    ) -> Self {
        if let Some(delay_cutoff) = delay_cutoff {
            self.search.delay_cutoff = delay_cutoff;
        }
        if let Some(horizon) = horizon {
            self.search.horizon = horizon;
        }
        if let Some(jobs) = jobs {
            self.jobs = jobs;
        }
        self
    }
}

/// Parses a positive value from `name`. Unset falls through silently;
/// anything unparsable or zero is reported before falling back.
fn read_env_positive<T>(name: &str) -> Option<T>
where
    T: FromStr + PartialEq + Default + Copy,
{
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Some(value),
        _ => {
            tracing::warn!("{} ({:?}) is not a positive number. Falling back to defaults.", name, raw);
            None
        }
    }
}

pub fn read_env_u32(name: &str, default: u32) -> u32 {
    read_env_positive(name).unwrap_or(default)
}

pub fn read_env_u16(name: &str, default: u16) -> u16 {
    read_env_positive(name).unwrap_or(default)
}

pub fn read_env_optional_usize(name: &str) -> Option<usize> {
    read_env_positive(name)
}
