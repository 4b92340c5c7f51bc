use serde::{Deserialize, Serialize};

use crate::constants::{FIRST_TURN_MAX_DELAY, FIRST_TURN_MIN_DELAY};
use crate::error::ScheduleError;
use crate::expand::{first_turn_child, turn_child, TurnPhase};
use crate::node::SearchNode;
use crate::prune::{constraint_violation, hits_delay_limit, settle_first_turn, settle_turn};
use crate::search::SearchConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub seed: u16,
    pub turns: u16,
    pub total_delay: u32,
    pub final_rng_state: u16,
    pub final_timer_speed: u8,
}

/// Replays one schedule through the game model and checks every input
/// window and face constraint along the way.
///
/// The schedule holds the first-turn delay followed by one delay per turn up
/// to `config.horizon`.
pub fn replay_schedule(
    seed: u16,
    schedule: &[u16],
    config: &SearchConfig,
) -> Result<ReplaySummary, ScheduleError> {
    config.validate()?;
    let expected = config.horizon as usize + 1;
    if schedule.len() != expected {
        return Err(ScheduleError::LengthMismatch {
            expected,
            actual: schedule.len(),
        });
    }

    let initial = SearchNode::from_seed(seed)?;
    let first_delay = schedule[0];
    if !(FIRST_TURN_MIN_DELAY..=FIRST_TURN_MAX_DELAY).contains(&first_delay) {
        return Err(ScheduleError::FirstDelayOutOfRange {
            delay: first_delay,
            min: FIRST_TURN_MIN_DELAY,
            max: FIRST_TURN_MAX_DELAY,
        });
    }
    let mut node = first_turn_child(&initial, first_delay);
    if let Some(reason) = constraint_violation(&node.probe()) {
        return Err(ScheduleError::ConstraintViolated { turn: 0, reason });
    }
    settle_first_turn(&mut node);

    for turn in 1..=config.horizon {
        let phase = TurnPhase::of(turn);
        let delay = schedule[turn as usize];
        let limit = phase.delay_limit(node.timer_speed);
        if delay > limit as u16 {
            return Err(ScheduleError::DelayOutOfRange { turn, delay, limit });
        }
        node = turn_child(&node, turn, delay as u8);
        if !phase.selects_new_face() {
            if let Some(reason) = constraint_violation(&node.probe()) {
                return Err(ScheduleError::ConstraintViolated { turn, reason });
            }
        }
        settle_turn(&mut node, turn);
    }

    if hits_delay_limit(node.total_delay, config.delay_cutoff) {
        return Err(ScheduleError::DelayLimitExceeded {
            total: node.total_delay,
            cutoff: config.delay_cutoff,
        });
    }

    Ok(ReplaySummary {
        seed,
        turns: config.horizon,
        total_delay: node.total_delay,
        final_rng_state: node.rng.state(),
        final_timer_speed: node.timer_speed,
    })
}
