use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Seeds are written as four hex digits, with or without a `0x` prefix.
pub fn parse_seed(seed: &str) -> Result<u16> {
    let s = seed.trim();
    if s.is_empty() {
        return Err(anyhow!("empty seed"));
    }
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(hex, 16).with_context(|| format!("invalid hex seed: {s}"))
}

pub fn seed_to_hex(seed: u16) -> String {
    format!("0x{seed:04X}")
}

pub fn parse_seed_csv(input: &str) -> Result<Vec<u16>> {
    let mut seeds = Vec::new();
    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        seeds.push(parse_seed(token)?);
    }
    if seeds.is_empty() {
        return Err(anyhow!("no seeds parsed from --seeds"));
    }
    Ok(seeds)
}

/// Streams seeds from a line-oriented source, one hex seed per line.
///
/// Blank lines and `#` comments are skipped. Enumeration ends at the first
/// zero seed, at end of input, or at the first line that does not parse;
/// the dispatcher treats all three as running out of work.
pub struct SeedReader<R> {
    lines: Lines<R>,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> SeedReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            done: false,
        }
    }
}

impl SeedReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed opening seed file {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for SeedReader<R> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        if self.done {
            return None;
        }
        loop {
            self.line_no += 1;
            let line = match self.lines.next() {
                None => break,
                Some(Ok(line)) => line,
                Some(Err(err)) => {
                    tracing::warn!(line = self.line_no, "seed input unreadable, stopping: {err}");
                    break;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match parse_seed(trimmed) {
                Ok(0) => {
                    tracing::debug!(line = self.line_no, "zero seed ends the input");
                    break;
                }
                Ok(seed) => return Some(seed),
                Err(err) => {
                    tracing::warn!(line = self.line_no, "malformed seed ends the input: {err:#}");
                    break;
                }
            }
        }
        self.done = true;
        None
    }
}
