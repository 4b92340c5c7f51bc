pub mod config;
pub mod output;
pub mod scheduler;
pub mod seeds;
