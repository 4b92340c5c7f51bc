use crate::output::ScheduleSink;
use crate::seeds::seed_to_hex;
use anyhow::{anyhow, Context, Result};
use quartet_core::{search_seed, SearchConfig};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    /// Searches allowed to run at once.
    pub jobs: usize,
    pub search: SearchConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerReport {
    pub jobs: usize,
    pub dispatched: usize,
    /// Seeds whose schedule reached the sink.
    pub solved: usize,
    /// Seeds where every path was culled.
    pub exhausted: usize,
    pub failed: usize,
    pub write_failures: usize,
    pub panicked: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SeedFinish {
    Solved,
    Unwritten,
    Exhausted,
    Failed,
}

/// Counting semaphore built on a bounded channel of unit tokens.
struct Permits {
    tx: SyncSender<()>,
    rx: Receiver<()>,
}

/// Returns its token on drop, including when the worker unwinds.
struct Permit {
    tx: SyncSender<()>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        // Capacity equals the number of tokens, so this never finds the channel full.
        let _ = self.tx.try_send(());
    }
}

impl Permits {
    fn new(count: usize) -> Self {
        let (tx, rx) = sync_channel(count);
        for _ in 0..count {
            let _ = tx.try_send(());
        }
        Self { tx, rx }
    }

    /// Blocks until a worker slot is free.
    fn acquire(&self) -> Result<Permit> {
        self.rx
            .recv()
            .map_err(|_| anyhow!("permit channel closed"))?;
        Ok(Permit {
            tx: self.tx.clone(),
        })
    }

    /// Waits for every outstanding worker to hand its permit back.
    fn drain(&self, count: usize) -> Result<()> {
        for _ in 0..count {
            self.rx
                .recv()
                .map_err(|_| anyhow!("permit channel closed"))?;
        }
        Ok(())
    }
}

fn run_one(seed: u16, config: SearchConfig, sink: &dyn ScheduleSink) -> SeedFinish {
    let outcome = match search_seed(seed, config) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(seed = %seed_to_hex(seed), "seed search rejected: {err}");
            return SeedFinish::Failed;
        }
    };
    match outcome.best {
        Some(best) => match sink.record(&best) {
            Ok(()) => SeedFinish::Solved,
            Err(err) => {
                tracing::error!(seed = %seed_to_hex(seed), "failed to record schedule: {err:#}");
                SeedFinish::Unwritten
            }
        },
        None => SeedFinish::Exhausted,
    }
}

/// Runs one search per seed with at most `config.jobs` in flight.
///
/// Seeds are pulled from `seeds` only once a worker slot is free, so they
/// start strictly in input order; they finish in whatever order the searches
/// take. A zero seed or the end of the iterator stops dispatch. Returns after
/// every dispatched search has finished.
pub fn run_scheduler<I>(
    seeds: I,
    sink: Arc<dyn ScheduleSink>,
    config: SchedulerConfig,
) -> Result<SchedulerReport>
where
    I: IntoIterator<Item = u16>,
{
    if config.jobs == 0 {
        return Err(anyhow!("scheduler jobs must be >= 1"));
    }
    config
        .search
        .validate()
        .map_err(|err| anyhow!("invalid search config: {err}"))?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .thread_name(|idx| format!("seed-search-{idx}"))
        .panic_handler(|_| tracing::error!("seed search panicked"))
        .build()
        .context("failed to build rayon threadpool")?;

    let permits = Permits::new(config.jobs);
    let finished: Arc<Mutex<Vec<SeedFinish>>> = Arc::new(Mutex::new(Vec::new()));
    let mut dispatched = 0usize;
    let mut seeds = seeds.into_iter();

    loop {
        let permit = permits.acquire()?;
        let Some(seed) = seeds.next().filter(|&seed| seed != 0) else {
            drop(permit);
            break;
        };
        dispatched += 1;
        tracing::info!(seed = %seed_to_hex(seed), dispatched, "seed search started");

        let sink = Arc::clone(&sink);
        let finished = Arc::clone(&finished);
        let search = config.search;
        pool.spawn(move || {
            let _permit = permit;
            let result = run_one(seed, search, sink.as_ref());
            match finished.lock() {
                Ok(mut finished) => finished.push(result),
                Err(poisoned) => poisoned.into_inner().push(result),
            }
        });
    }

    permits.drain(config.jobs)?;

    let finished = match finished.lock() {
        Ok(finished) => finished.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    let count = |kind: SeedFinish| finished.iter().filter(|f| **f == kind).count();
    let solved = count(SeedFinish::Solved);
    let unwritten = count(SeedFinish::Unwritten);
    let report = SchedulerReport {
        jobs: config.jobs,
        dispatched,
        solved,
        exhausted: count(SeedFinish::Exhausted),
        failed: count(SeedFinish::Failed),
        write_failures: unwritten,
        panicked: dispatched - finished.len(),
    };

    tracing::info!(
        dispatched = report.dispatched,
        solved = report.solved,
        exhausted = report.exhausted,
        write_failures = report.write_failures,
        panicked = report.panicked,
        "all seed searches finished"
    );

    Ok(report)
}
