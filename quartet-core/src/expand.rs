use crate::constants::{
    BOARD_CLEAR_EARLY_LAST_TURN, FIRST_TURN_MAX_DELAY, FIRST_TURN_MIN_DELAY, TICKS_BEFORE_INPUT,
    TICKS_BEFORE_ROLL, TICKS_BOARD_CLEAR, TICKS_BOARD_CLEAR_EARLY, TICKS_CONSECUTIVE_INPUT,
};
use crate::node::{FaceProbe, SearchNode};
use crate::prune::should_cull;
use crate::rng::{FaceRng, NextFace};
use crate::timer::delay_budget;

/// The four kinds of turn, repeating every four turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TurnPhase {
    /// Third corner placed, fourth completes and clears the board.
    BoardClear,
    /// First corner of a new face.
    NewFace,
    SecondCorner,
    /// Completes the face, so the following roll may be any type.
    ThirdCorner,
}

impl TurnPhase {
    pub fn of(turn: u16) -> Self {
        match turn & 3 {
            0 => Self::BoardClear,
            1 => Self::NewFace,
            2 => Self::SecondCorner,
            _ => Self::ThirdCorner,
        }
    }

    /// Ticks from the previous roll to the earliest input, plus the ticks
    /// from the input to this turn's roll.
    pub fn pre_roll_ticks(self, turn: u16) -> u32 {
        match self {
            Self::BoardClear => {
                let clear = if turn <= BOARD_CLEAR_EARLY_LAST_TURN {
                    TICKS_BOARD_CLEAR_EARLY
                } else {
                    TICKS_BOARD_CLEAR
                };
                TICKS_BEFORE_INPUT + TICKS_CONSECUTIVE_INPUT + TICKS_BEFORE_ROLL + clear
            }
            Self::NewFace => TICKS_BEFORE_INPUT + TICKS_BEFORE_ROLL,
            Self::SecondCorner | Self::ThirdCorner => {
                TICKS_BEFORE_INPUT + TICKS_CONSECUTIVE_INPUT + TICKS_BEFORE_ROLL
            }
        }
    }

    /// Largest delay that still lands inside the input window.
    pub fn delay_limit(self, timer_speed: u8) -> u8 {
        let budget = delay_budget(timer_speed);
        match self {
            Self::NewFace => budget,
            // The first frame of a consecutive input is unusable.
            Self::BoardClear | Self::SecondCorner | Self::ThirdCorner => budget - 1,
        }
    }

    pub fn selects_new_face(self) -> bool {
        self == Self::ThirdCorner
    }
}

/// Generator state at delay 0 of `turn` for a node.
#[inline]
pub fn window_start(node: &SearchNode, turn: u16) -> FaceRng {
    node.rng.advance(TurnPhase::of(turn).pre_roll_ticks(turn))
}

/// Rolls the face that an input `delay` ticks into the window produces.
#[inline]
pub fn roll_after_delay(window: FaceRng, delay: u32) -> (FaceRng, NextFace) {
    window.advance(delay).roll_next_face()
}

/// Copies `parent` with a fresh roll and `delay` charged to `slot`. Slot 0
/// is the first-turn delay; later slots index the per-turn history.
fn child_with(
    parent: &SearchNode,
    rng: FaceRng,
    next_face: NextFace,
    slot: u16,
    delay: u16,
    total_delay: u32,
) -> SearchNode {
    let mut child = parent.clone();
    child.rng = rng;
    child.next_face = next_face;
    if slot == 0 {
        child.first_turn_delay = delay;
    } else {
        // Per-turn delays never exceed the 78-tick budget.
        child.delays[slot as usize] = delay as u8;
    }
    child.total_delay = total_delay;
    child
}

/// Builds the turn-0 node for `delay`. The initial countdown lets the first
/// input wait up to 260 ticks.
pub fn first_turn_child(initial: &SearchNode, delay: u16) -> SearchNode {
    let (rng, next_face) = roll_after_delay(initial.rng, delay as u32);
    child_with(initial, rng, next_face, 0, delay, delay as u32)
}

/// Every turn-0 candidate that passes the constraint and delay rules, in
/// ascending delay order.
pub fn expand_first_turn(initial: &SearchNode, cutoff: u32, pending: &mut Vec<SearchNode>) {
    for delay in FIRST_TURN_MIN_DELAY..=FIRST_TURN_MAX_DELAY {
        let (rng, next_face) = roll_after_delay(initial.rng, delay as u32);
        let probe = FaceProbe {
            next_face,
            total_delay: delay as u32,
            ..initial.probe()
        };
        if should_cull(&probe, false, cutoff) {
            continue;
        }
        pending.push(child_with(initial, rng, next_face, 0, delay, probe.total_delay));
    }
}

/// Builds the child of `node` that waits `delay` ticks on `turn`. Performs no
/// range or pruning checks.
pub fn turn_child(node: &SearchNode, turn: u16, delay: u8) -> SearchNode {
    let (rng, next_face) = roll_after_delay(window_start(node, turn), delay as u32);
    child_with(node, rng, next_face, turn, delay as u16, node.total_delay + delay as u32)
}

/// Pushes every child of `node` on `turn` that survives pruning, one per
/// delay in `0..=limit`, in ascending delay order. Culled children are
/// rejected before their history is copied. Returns the number of
/// candidates considered.
pub fn expand_into(
    node: &SearchNode,
    turn: u16,
    cutoff: u32,
    pending: &mut Vec<SearchNode>,
) -> usize {
    let phase = TurnPhase::of(turn);
    let relaxed = phase.selects_new_face();
    let window = window_start(node, turn);
    let limit = phase.delay_limit(node.timer_speed);

    for delay in 0..=limit {
        let (rng, next_face) = roll_after_delay(window, delay as u32);
        let probe = FaceProbe {
            next_face,
            total_delay: node.total_delay + delay as u32,
            ..node.probe()
        };
        if should_cull(&probe, relaxed, cutoff) {
            continue;
        }
        pending.push(child_with(
            node,
            rng,
            next_face,
            turn,
            delay as u16,
            probe.total_delay,
        ));
    }

    limit as usize + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_DELAY_CUTOFF, TIMER_SPEED_INITIAL, TIMER_SPEED_MAX};
    use crate::prune::cull_reason;

    #[test]
    fn phases_cycle_every_four_turns() {
        assert_eq!(TurnPhase::of(1), TurnPhase::NewFace);
        assert_eq!(TurnPhase::of(2), TurnPhase::SecondCorner);
        assert_eq!(TurnPhase::of(3), TurnPhase::ThirdCorner);
        assert_eq!(TurnPhase::of(4), TurnPhase::BoardClear);
        assert_eq!(TurnPhase::of(2862), TurnPhase::SecondCorner);
        assert!(TurnPhase::of(7).selects_new_face());
        assert!(!TurnPhase::of(8).selects_new_face());
    }

    #[test]
    fn pre_roll_ticks_follow_the_phase_table() {
        assert_eq!(TurnPhase::of(1).pre_roll_ticks(1), 30);
        assert_eq!(TurnPhase::of(2).pre_roll_ticks(2), 31);
        assert_eq!(TurnPhase::of(3).pre_roll_ticks(3), 31);
        assert_eq!(TurnPhase::of(4).pre_roll_ticks(4), 132);
        assert_eq!(TurnPhase::of(12).pre_roll_ticks(12), 132);
        assert_eq!(TurnPhase::of(16).pre_roll_ticks(16), 131);
    }

    #[test]
    fn only_new_face_turns_get_the_full_budget() {
        let budget = delay_budget(TIMER_SPEED_INITIAL);
        assert_eq!(TurnPhase::NewFace.delay_limit(TIMER_SPEED_INITIAL), budget);
        assert_eq!(TurnPhase::SecondCorner.delay_limit(TIMER_SPEED_INITIAL), budget - 1);
        assert_eq!(TurnPhase::BoardClear.delay_limit(TIMER_SPEED_MAX), 37);
    }

    #[test]
    fn children_match_their_recorded_delay() {
        let mut parent = SearchNode::from_seed(0x2A17).unwrap();
        parent.total_delay = 40;
        parent.timer_speed = 0x46;
        let turn = 3;
        let mut pending = Vec::new();
        let considered = expand_into(&parent, turn, u32::MAX, &mut pending);

        // Relaxed turn: nothing but the cutoff can cull.
        assert_eq!(considered, TurnPhase::ThirdCorner.delay_limit(0x46) as usize + 1);
        assert_eq!(pending.len(), considered);
        for (delay, child) in pending.iter().enumerate() {
            assert_eq!(child.delays[turn as usize] as usize, delay);
            assert_eq!(child.total_delay, 40 + delay as u32);
            assert_eq!(*child, turn_child(&parent, turn, delay as u8));
            assert_eq!(parent.delays[turn as usize], 0);
        }
    }

    #[test]
    fn inline_culling_agrees_with_the_raw_rule_in_every_phase() {
        let mut parent = SearchNode::from_seed(0x91C3).unwrap();
        parent.total_delay = 100;
        for turn in 1..=8u16 {
            let phase = TurnPhase::of(turn);
            let cutoff = 120;
            let mut pending = Vec::new();
            expand_into(&parent, turn, cutoff, &mut pending);

            let expected: Vec<SearchNode> = (0..=phase.delay_limit(parent.timer_speed))
                .map(|delay| turn_child(&parent, turn, delay))
                .filter(|child| {
                    let raw_violation = !phase.selects_new_face()
                        && (child.next_face.face_type() != child.face_type
                            || child.face_progress & (1 << child.next_face.corner()) != 0);
                    let keep = !raw_violation && child.total_delay <= cutoff;
                    assert_eq!(
                        keep,
                        cull_reason(&child.probe(), phase.selects_new_face(), cutoff).is_none()
                    );
                    keep
                })
                .collect();
            assert_eq!(pending, expected, "turn={turn}");
        }
    }

    #[test]
    fn first_turn_candidates_cover_the_initial_countdown() {
        let initial = SearchNode::from_seed(0x5EED).unwrap();
        let mut pending = Vec::new();
        expand_first_turn(&initial, DEFAULT_DELAY_CUTOFF, &mut pending);

        let expected: Vec<SearchNode> = (FIRST_TURN_MIN_DELAY..=FIRST_TURN_MAX_DELAY)
            .map(|delay| first_turn_child(&initial, delay))
            .filter(|child| cull_reason(&child.probe(), false, DEFAULT_DELAY_CUTOFF).is_none())
            .collect();
        assert_eq!(pending, expected);
        assert!(pending
            .windows(2)
            .all(|pair| pair[0].first_turn_delay < pair[1].first_turn_delay));
    }

    #[test]
    fn first_turn_and_later_turns_charge_separate_slots() {
        let initial = SearchNode::from_seed(0x5EED).unwrap();
        let first = first_turn_child(&initial, 17);
        assert_eq!(first.first_turn_delay, 17);
        assert_eq!(first.total_delay, 17);
        assert!(first.delays.iter().all(|&d| d == 0));

        let later = turn_child(&first, 1, 9);
        assert_eq!(later.first_turn_delay, 17);
        assert_eq!(later.delays[1], 9);
        assert_eq!(later.total_delay, 26);
        assert_eq!(later.schedule(1), vec![17, 9]);
    }

    #[test]
    fn first_turn_with_a_full_face_has_no_candidates() {
        let mut initial = SearchNode::from_seed(0x5EED).unwrap();
        initial.face_progress = 0b1111;
        let mut pending = Vec::new();
        expand_first_turn(&initial, DEFAULT_DELAY_CUTOFF, &mut pending);
        assert!(pending.is_empty());
    }
}
