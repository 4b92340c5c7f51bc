pub mod collection;
pub mod constants;
pub mod error;
pub mod expand;
pub mod node;
pub mod prune;
pub mod rng;
pub mod search;
pub mod timer;
pub mod verify;

pub use error::{ScheduleError, SearchError};
pub use search::{search_seed, SearchConfig, SearchOutcome, SearchStats, SeedSchedule, SeedSearch};
pub use verify::{replay_schedule, ReplaySummary};
