use crate::seeds::{parse_seed, seed_to_hex};
use anyhow::{anyhow, Context, Result};
use quartet_core::SeedSchedule;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Receives the winning schedule of every seed that has one. Called from
/// worker threads in completion order.
pub trait ScheduleSink: Send + Sync {
    fn record(&self, schedule: &SeedSchedule) -> Result<()>;
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
        }
    }
}

/// `{ 0x0001 0x0000 ... } : 0x1AE4`
pub fn format_schedule_text(schedule: &SeedSchedule) -> String {
    let mut out = String::with_capacity(schedule.schedule.len() * 7 + 16);
    out.push('{');
    for delay in &schedule.schedule {
        out.push_str(&format!(" 0x{delay:04X}"));
    }
    out.push_str(&format!(" }} : 0x{:04X}\n", schedule.total_delay));
    out
}

/// Parses the text layout back into `(delays, total)`.
pub fn parse_schedule_text(text: &str) -> Result<(Vec<u16>, u32)> {
    let text = text.trim();
    let body = text
        .strip_prefix('{')
        .ok_or_else(|| anyhow!("schedule text must start with '{{'"))?;
    let (delays, total) = body
        .split_once('}')
        .ok_or_else(|| anyhow!("schedule text is missing '}}'"))?;
    let total = total
        .trim()
        .strip_prefix(':')
        .ok_or_else(|| anyhow!("schedule text is missing ': <total>'"))?;

    let delays = delays
        .split_whitespace()
        .map(|token| {
            parse_hex(token).and_then(|value| {
                u16::try_from(value).with_context(|| format!("delay out of range: {token}"))
            })
        })
        .collect::<Result<Vec<u16>>>()?;
    let total = parse_hex(total.trim())?;
    Ok((delays, total))
}

fn parse_hex(token: &str) -> Result<u32> {
    let hex = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .ok_or_else(|| anyhow!("expected 0x-prefixed value, got '{token}'"))?;
    u32::from_str_radix(hex, 16).with_context(|| format!("invalid hex value: {token}"))
}

pub fn schedule_file_name(seed: u16, format: OutputFormat) -> String {
    format!("seed_{}.{}", seed_to_hex(seed), format.extension())
}

pub fn write_schedule(path: &Path, schedule: &SeedSchedule, format: OutputFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    let bytes = match format {
        OutputFormat::Text => format_schedule_text(schedule).into_bytes(),
        OutputFormat::Json => serde_json::to_vec_pretty(schedule)?,
    };
    fs::write(path, bytes).with_context(|| format!("failed writing {}", path.display()))
}

/// Loads a schedule written by [`write_schedule`]. Text files carry no seed,
/// so it comes from `seed` or from a `seed_0xABCD.txt` file name.
pub fn load_schedule(path: &Path, seed: Option<u16>) -> Result<SeedSchedule> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading schedule {}", path.display()))?;

    if path.extension().is_some_and(|e| e == "json") {
        let mut schedule: SeedSchedule = serde_json::from_str(&raw)
            .with_context(|| format!("invalid schedule json {}", path.display()))?;
        if let Some(seed) = seed {
            schedule.seed = seed;
        }
        return Ok(schedule);
    }

    let seed = match seed {
        Some(seed) => seed,
        None => seed_from_file_name(path).ok_or_else(|| {
            anyhow!(
                "cannot tell the seed of {}; pass --seed",
                path.display()
            )
        })?,
    };
    let (schedule, total_delay) = parse_schedule_text(&raw)
        .with_context(|| format!("invalid schedule text {}", path.display()))?;
    Ok(SeedSchedule {
        seed,
        schedule,
        total_delay,
    })
}

fn seed_from_file_name(path: &Path) -> Option<u16> {
    let stem = path.file_stem()?.to_str()?;
    parse_seed(stem.strip_prefix("seed_")?).ok()
}

/// Writes one file per seed into a directory.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    format: OutputFormat,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed creating {}", dir.display()))?;
        Ok(Self { dir, format })
    }

    pub fn path_for(&self, seed: u16) -> PathBuf {
        self.dir.join(schedule_file_name(seed, self.format))
    }
}

impl ScheduleSink for DirectorySink {
    fn record(&self, schedule: &SeedSchedule) -> Result<()> {
        let path = self.path_for(schedule.seed);
        write_schedule(&path, schedule, self.format)?;
        tracing::info!(
            seed = %seed_to_hex(schedule.seed),
            total_delay = schedule.total_delay,
            path = %path.display(),
            "schedule written"
        );
        Ok(())
    }
}

/// Keeps every recorded schedule in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<SeedSchedule>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded schedules ordered by seed.
    pub fn records(&self) -> Vec<SeedSchedule> {
        let mut records = match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        records.sort_by_key(|record| record.seed);
        records
    }
}

impl ScheduleSink for MemorySink {
    fn record(&self, schedule: &SeedSchedule) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow!("schedule store poisoned"))?
            .push(schedule.clone());
        Ok(())
    }
}
