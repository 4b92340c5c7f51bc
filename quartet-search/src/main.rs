use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use quartet_core::{replay_schedule, search_seed, SearchConfig};
use quartet_search::config::Settings;
use quartet_search::output::{load_schedule, write_schedule, DirectorySink, OutputFormat};
use quartet_search::scheduler::{run_scheduler, SchedulerConfig};
use quartet_search::seeds::{parse_seed, parse_seed_csv, seed_to_hex, SeedReader};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "quartet-search")]
#[command(about = "Exhaustive minimum-delay input search for Quartet face rolls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search every seed of a seed file (or list) and write one schedule per solved seed
    Search {
        /// One hex seed per line; a zero seed ends the list
        #[arg(long, default_value = "known_seeds_sorted.txt")]
        seed_file: PathBuf,
        /// Comma-separated seeds, used instead of --seed-file
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[arg(long)]
        delay_cutoff: Option<u32>,
        #[arg(long)]
        horizon: Option<u16>,
        /// Concurrent searches (default: half the hardware threads)
        #[arg(long)]
        jobs: Option<usize>,
        #[arg(long, value_enum, default_value_t = CliFormat::Text)]
        format: CliFormat,
    },
    /// Search a single seed on the current thread
    RunSeed {
        #[arg(long)]
        seed: String,
        #[arg(long)]
        delay_cutoff: Option<u32>,
        #[arg(long)]
        horizon: Option<u16>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = CliFormat::Text)]
        format: CliFormat,
    },
    /// Replay a written schedule and check every turn against the game rules
    Verify {
        #[arg(long)]
        input: PathBuf,
        /// Needed for text schedules whose file name does not carry the seed
        #[arg(long)]
        seed: Option<String>,
        #[arg(long)]
        delay_cutoff: Option<u32>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliFormat {
    Text,
    Json,
}

impl From<CliFormat> for OutputFormat {
    fn from(value: CliFormat) -> Self {
        match value {
            CliFormat::Text => OutputFormat::Text,
            CliFormat::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let Cli { command } = Cli::parse();
    let settings = Settings::from_env();

    match command {
        Commands::Search {
            seed_file,
            seeds,
            out_dir,
            delay_cutoff,
            horizon,
            jobs,
            format,
        } => {
            let settings = settings.with_overrides(delay_cutoff, horizon, jobs);
            let format: OutputFormat = format.into();
            let source: Box<dyn Iterator<Item = u16>> = match seeds {
                Some(csv) => Box::new(parse_seed_csv(&csv)?.into_iter()),
                None => Box::new(SeedReader::open(&seed_file)?),
            };
            let sink = Arc::new(DirectorySink::new(&out_dir, format)?);

            let report = run_scheduler(
                source,
                sink,
                SchedulerConfig {
                    jobs: settings.jobs,
                    search: settings.search,
                },
            )?;

            println!("jobs={}", report.jobs);
            println!("delay_cutoff={}", settings.search.delay_cutoff);
            println!("horizon={}", settings.search.horizon);
            println!("format={}", format.as_str());
            println!("out_dir={}", out_dir.display());
            println!("dispatched={}", report.dispatched);
            println!("solved={}", report.solved);
            println!("exhausted={}", report.exhausted);
            println!("failed={}", report.failed);
            println!("write_failures={}", report.write_failures);
            println!("panicked={}", report.panicked);
        }
        Commands::RunSeed {
            seed,
            delay_cutoff,
            horizon,
            output,
            format,
        } => {
            let settings = settings.with_overrides(delay_cutoff, horizon, None);
            let seed = parse_seed(&seed)?;
            let outcome = search_seed(seed, settings.search)?;
            let stats = outcome.stats;

            println!("seed={}", seed_to_hex(seed));
            println!("delay_cutoff={}", settings.search.delay_cutoff);
            println!("horizon={}", settings.search.horizon);
            println!("turns_completed={}", stats.turns_completed);
            println!("peak_live={}", stats.peak_live);
            println!("peak_pending={}", stats.peak_pending);
            println!("peak_node_bytes={}", stats.peak_node_bytes);
            println!("candidates={}", stats.candidates_considered);

            match outcome.best {
                Some(best) => {
                    println!("total_delay={}", best.total_delay);
                    if let Some(path) = output {
                        write_schedule(&path, &best, format.into())?;
                        println!("output={}", path.display());
                    }
                }
                None => {
                    println!(
                        "exhausted_at={}",
                        stats
                            .exhausted_at
                            .map(|turn| turn.to_string())
                            .unwrap_or_else(|| "none".to_string())
                    );
                }
            }
        }
        Commands::Verify {
            input,
            seed,
            delay_cutoff,
        } => {
            let seed = seed.as_deref().map(parse_seed).transpose()?;
            let recorded = load_schedule(&input, seed)?;
            let horizon = recorded
                .schedule
                .len()
                .checked_sub(1)
                .and_then(|turns| u16::try_from(turns).ok())
                .ok_or_else(|| anyhow!("schedule in {} is empty or too long", input.display()))?;
            let config = SearchConfig {
                delay_cutoff: delay_cutoff.unwrap_or(settings.search.delay_cutoff),
                horizon,
            };
            let summary = replay_schedule(recorded.seed, &recorded.schedule, &config)?;
            if summary.total_delay != recorded.total_delay {
                return Err(anyhow!(
                    "recorded total {} does not match replayed total {}",
                    recorded.total_delay,
                    summary.total_delay
                ));
            }

            println!("input={}", input.display());
            println!("seed={}", seed_to_hex(summary.seed));
            println!("turns={}", summary.turns);
            println!("total_delay={}", summary.total_delay);
            println!("final_rng_state={:#06x}", summary.final_rng_state);
            println!("final_timer_speed={:#04x}", summary.final_timer_speed);
        }
    }

    Ok(())
}
