use core::mem;

use serde::{Deserialize, Serialize};

use crate::collection::merge_generation;
use crate::constants::{
    DEFAULT_DELAY_CUTOFF, FIRST_TURN_MAX_DELAY, FIRST_TURN_MIN_DELAY, TURN_COUNT,
};
use crate::error::SearchError;
use crate::expand::{expand_first_turn, expand_into};
use crate::node::{DelayHistory, SearchNode};
use crate::prune::{settle_first_turn, settle_turn};
use crate::timer::is_valid_timer_speed;

/// Heap and inline bytes held by one node.
pub const NODE_BYTES: usize = mem::size_of::<SearchNode>() + mem::size_of::<DelayHistory>();

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Paths whose total delay exceeds this are dropped.
    pub delay_cutoff: u32,
    /// Last turn searched. Shorter horizons are for diagnostics.
    pub horizon: u16,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            delay_cutoff: DEFAULT_DELAY_CUTOFF,
            horizon: TURN_COUNT,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.horizon == 0 || self.horizon > TURN_COUNT {
            return Err(SearchError::HorizonOutOfRange {
                horizon: self.horizon,
                max: TURN_COUNT,
            });
        }
        Ok(())
    }
}

/// Winning input schedule for one seed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSchedule {
    pub seed: u16,
    /// First-turn delay followed by one delay per turn up to the horizon.
    pub schedule: Vec<u16>,
    pub total_delay: u32,
}

impl SeedSchedule {
    pub fn recomputed_total(&self) -> u32 {
        self.schedule.iter().map(|&d| d as u32).sum()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub turns_completed: u16,
    /// Turn after which no path survived.
    pub exhausted_at: Option<u16>,
    pub candidates_considered: u64,
    pub peak_live: usize,
    pub peak_pending: usize,
    /// Upper bound on node storage held at once.
    pub peak_node_bytes: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    pub seed: u16,
    pub best: Option<SeedSchedule>,
    pub stats: SearchStats,
}

/// Breadth-first search over the input delays of a single seed.
///
/// Each call to [`SeedSearch::step`] runs one turn: every live node is
/// expanded into the pending generation, which is then sorted, merged and
/// collapsed into the next live set. The live set is always ordered by
/// ascending total delay, so its first node is the best path so far.
#[derive(Debug)]
pub struct SeedSearch {
    seed: u16,
    config: SearchConfig,
    initial: Option<SearchNode>,
    live: Vec<SearchNode>,
    pending: Vec<SearchNode>,
    next_turn: u16,
    stats: SearchStats,
}

impl SeedSearch {
    pub fn new(seed: u16, config: SearchConfig) -> Result<Self, SearchError> {
        let initial = SearchNode::from_seed(seed)?;
        Self::from_initial_node(seed, initial, config)
    }

    /// Starts from a prepared node instead of the one derived from `seed`.
    /// The node's timer speed must be one the game can reach.
    pub fn from_initial_node(
        seed: u16,
        initial: SearchNode,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        if !is_valid_timer_speed(initial.timer_speed) {
            return Err(SearchError::InvalidTimerSpeed {
                timer_speed: initial.timer_speed,
            });
        }
        Ok(Self {
            seed,
            config,
            initial: Some(initial),
            live: Vec::new(),
            pending: Vec::new(),
            next_turn: 0,
            stats: SearchStats::default(),
        })
    }

    pub fn seed(&self) -> u16 {
        self.seed
    }

    pub fn config(&self) -> SearchConfig {
        self.config
    }

    pub fn live(&self) -> &[SearchNode] {
        &self.live
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.next_turn > self.config.horizon || self.stats.exhausted_at.is_some()
    }

    /// Runs the next turn. Returns `false` once the search is over.
    pub fn step(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }

        let turn = self.next_turn;
        let cutoff = self.config.delay_cutoff;
        let parent_count;

        if let Some(initial) = self.initial.take() {
            parent_count = 1;
            expand_first_turn(&initial, cutoff, &mut self.pending);
            self.stats.candidates_considered +=
                (FIRST_TURN_MAX_DELAY - FIRST_TURN_MIN_DELAY + 1) as u64;
            self.record_pending(parent_count);
            merge_generation(&mut self.live, &mut self.pending, false);
            self.live.iter_mut().for_each(settle_first_turn);
        } else {
            let mut parents = mem::take(&mut self.live);
            parent_count = parents.len();
            for parent in parents.drain(..) {
                self.stats.candidates_considered +=
                    expand_into(&parent, turn, cutoff, &mut self.pending) as u64;
            }
            // Reuse the drained buffer for the next generation.
            self.live = parents;
            self.record_pending(parent_count);
            merge_generation(&mut self.live, &mut self.pending, true);
            for node in &mut self.live {
                settle_turn(node, turn);
            }
        }

        self.stats.turns_completed = turn;
        self.stats.peak_live = self.stats.peak_live.max(self.live.len());
        self.next_turn = turn + 1;

        tracing::debug!(
            seed = %format!("{:#06x}", self.seed),
            turn,
            parents = parent_count,
            live = self.live.len(),
            best_total = self.live.first().map(|node| node.total_delay),
            "turn complete"
        );

        if self.live.is_empty() {
            self.stats.exhausted_at = Some(turn);
            return false;
        }
        !self.is_finished()
    }

    fn record_pending(&mut self, parent_count: usize) {
        let pending = self.pending.len();
        self.stats.peak_pending = self.stats.peak_pending.max(pending);
        self.stats.peak_node_bytes = self
            .stats
            .peak_node_bytes
            .max((pending + parent_count) * NODE_BYTES);
    }

    /// The best surviving path, if any.
    pub fn best(&self) -> Option<SeedSchedule> {
        self.live.first().map(|node| SeedSchedule {
            seed: self.seed,
            schedule: node.schedule(self.config.horizon),
            total_delay: node.total_delay,
        })
    }

    pub fn run(mut self) -> SearchOutcome {
        while self.step() {}
        let best = self.best();

        tracing::info!(
            seed = %format!("{:#06x}", self.seed),
            turns = self.stats.turns_completed,
            exhausted_at = self.stats.exhausted_at,
            peak_live = self.stats.peak_live,
            peak_pending = self.stats.peak_pending,
            peak_node_mib = self.stats.peak_node_bytes / (1024 * 1024),
            total_delay = best.as_ref().map(|b| b.total_delay),
            "seed search finished"
        );

        SearchOutcome {
            seed: self.seed,
            best,
            stats: self.stats,
        }
    }
}

/// Runs the whole search for one seed.
pub fn search_seed(seed: u16, config: SearchConfig) -> Result<SearchOutcome, SearchError> {
    Ok(SeedSearch::new(seed, config)?.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::is_sorted_by_total;

    fn short(horizon: u16) -> SearchConfig {
        SearchConfig {
            horizon,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn rejects_out_of_range_horizons() {
        assert!(matches!(
            SeedSearch::new(0x1234, short(0)),
            Err(SearchError::HorizonOutOfRange { .. })
        ));
        assert!(matches!(
            SeedSearch::new(0x1234, short(TURN_COUNT + 1)),
            Err(SearchError::HorizonOutOfRange { .. })
        ));
        assert!(matches!(
            SeedSearch::new(0, short(4)),
            Err(SearchError::ZeroSeed)
        ));
    }

    #[test]
    fn prepared_nodes_need_a_reachable_timer_speed() {
        for timer_speed in [0x00, 0x3E, 0x41, 0x82, 0xFF] {
            let mut initial = SearchNode::from_seed(0x1234).unwrap();
            initial.timer_speed = timer_speed;
            assert!(matches!(
                SeedSearch::from_initial_node(0x1234, initial, short(4)),
                Err(SearchError::InvalidTimerSpeed { timer_speed: t }) if t == timer_speed
            ));
        }
        let mut initial = SearchNode::from_seed(0x1234).unwrap();
        initial.timer_speed = 0x80;
        assert!(SeedSearch::from_initial_node(0x1234, initial, short(4)).is_ok());
    }

    #[test]
    fn live_set_stays_sorted_and_consistent_every_turn() {
        let mut search = SeedSearch::new(0x4C1D, short(6)).unwrap();
        let mut turn = 0u16;
        loop {
            let more = search.step();
            let live = search.live();
            assert!(is_sorted_by_total(live), "unsorted after turn {turn}");
            for node in live {
                let recorded: u32 = node.first_turn_delay as u32
                    + node.delays[1..=turn as usize]
                        .iter()
                        .map(|&d| d as u32)
                        .sum::<u32>();
                assert_eq!(node.total_delay, recorded);
                assert_eq!(node.turn_count, turn + 1);
                assert!(node.face_progress <= 0x0F);
                assert_ne!(node.rng.state(), 0);
            }
            if !more {
                break;
            }
            turn += 1;
        }
    }

    #[test]
    fn full_face_at_start_exhausts_on_the_first_turn() {
        let mut initial = SearchNode::from_seed(0x7777).unwrap();
        initial.face_progress = 0b1111;
        let outcome = SeedSearch::from_initial_node(0x7777, initial, short(8))
            .unwrap()
            .run();
        assert_eq!(outcome.best, None);
        assert_eq!(outcome.stats.exhausted_at, Some(0));
        assert_eq!(outcome.stats.turns_completed, 0);
    }

    #[test]
    fn zero_cutoff_leaves_nothing() {
        let config = SearchConfig {
            delay_cutoff: 0,
            horizon: 4,
        };
        let outcome = search_seed(0x1234, config).unwrap();
        assert!(outcome.best.is_none());
        assert_eq!(outcome.stats.exhausted_at, Some(0));
    }

    #[test]
    fn schedule_total_matches_reported_total() {
        let outcome = search_seed(0x0F0F, short(5)).unwrap();
        if let Some(best) = outcome.best {
            assert_eq!(best.schedule.len(), 6);
            assert_eq!(best.recomputed_total(), best.total_delay);
        } else {
            assert!(outcome.stats.exhausted_at.is_some());
        }
    }
}
