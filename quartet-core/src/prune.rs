use core::fmt;

use crate::constants::{TIMER_SPEED_BOARD_CLEAR_PENALTY, TIMER_SPEED_MAX, TIMER_SPEED_RECOVERY};
use crate::expand::TurnPhase;
use crate::node::{FaceProbe, SearchNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CullReason {
    FaceTypeMismatch,
    CornerTaken,
    DelayLimit,
}

impl fmt::Display for CullReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FaceTypeMismatch => write!(f, "FACE_TYPE_MISMATCH"),
            Self::CornerTaken => write!(f, "CORNER_TAKEN"),
            Self::DelayLimit => write!(f, "DELAY_LIMIT"),
        }
    }
}

#[inline]
pub fn hits_delay_limit(total_delay: u32, cutoff: u32) -> bool {
    total_delay > cutoff
}

/// The rolled face must be of the required type and land on an empty corner.
#[inline]
pub fn constraint_violation(probe: &FaceProbe) -> Option<CullReason> {
    if probe.next_face.face_type() != probe.face_type {
        return Some(CullReason::FaceTypeMismatch);
    }
    if probe.next_face.corner_bit() & probe.face_progress != 0 {
        return Some(CullReason::CornerTaken);
    }
    None
}

/// `relaxed` is set on turns that complete a face: whatever face comes next
/// starts a new one, so only the delay cutoff applies.
#[inline]
pub fn cull_reason(probe: &FaceProbe, relaxed: bool, cutoff: u32) -> Option<CullReason> {
    if !relaxed {
        if let Some(reason) = constraint_violation(probe) {
            return Some(reason);
        }
    }
    hits_delay_limit(probe.total_delay, cutoff).then_some(CullReason::DelayLimit)
}

#[inline]
pub fn should_cull(probe: &FaceProbe, relaxed: bool, cutoff: u32) -> bool {
    cull_reason(probe, relaxed, cutoff).is_some()
}

/// Places the accepted corner after the first turn.
pub fn settle_first_turn(node: &mut SearchNode) {
    node.face_progress |= node.next_face.corner_bit();
    node.turn_count += 1;
}

/// Applies the board and timer changes of `turn` to a surviving node.
pub fn settle_turn(node: &mut SearchNode, turn: u16) {
    let phase = TurnPhase::of(turn);
    if phase == TurnPhase::BoardClear {
        node.timer_speed -= TIMER_SPEED_BOARD_CLEAR_PENALTY;
    }
    if phase.selects_new_face() {
        node.face_type = node.next_face.face_type();
        node.face_progress = 0;
    }
    node.face_progress |= node.next_face.corner_bit();
    node.turn_count += 1;
    if node.timer_speed < TIMER_SPEED_MAX {
        node.timer_speed += TIMER_SPEED_RECOVERY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TIMER_SPEED_INITIAL;
    use crate::rng::NextFace;

    fn probe(face_type: u8, face_progress: u8, next_face: u8, total_delay: u32) -> FaceProbe {
        FaceProbe {
            face_type,
            face_progress,
            next_face: NextFace::from_raw(next_face),
            total_delay,
        }
    }

    #[test]
    fn matching_face_on_free_corner_survives() {
        let p = probe(2, 0b0001, 0x21, 10);
        assert_eq!(cull_reason(&p, false, 100), None);
    }

    #[test]
    fn wrong_type_and_taken_corner_are_culled() {
        assert_eq!(
            cull_reason(&probe(2, 0b0001, 0x12, 10), false, 100),
            Some(CullReason::FaceTypeMismatch)
        );
        assert_eq!(
            cull_reason(&probe(2, 0b0010, 0x21, 10), false, 100),
            Some(CullReason::CornerTaken)
        );
    }

    #[test]
    fn relaxed_turns_only_check_the_cutoff() {
        let p = probe(2, 0b1111, 0x12, 10);
        assert_eq!(cull_reason(&p, true, 100), None);
        assert_eq!(cull_reason(&p, true, 9), Some(CullReason::DelayLimit));
    }

    #[test]
    fn cutoff_is_inclusive() {
        assert!(!should_cull(&probe(0, 0, 0x01, 100), false, 100));
        assert!(should_cull(&probe(0, 0, 0x01, 101), false, 100));
    }

    #[test]
    fn board_clear_speeds_timer_up_then_recovers() {
        let mut node = SearchNode::from_seed(0xBEEF).unwrap();
        node.timer_speed = 0x50;
        node.next_face = NextFace::from_raw(0x02);
        node.face_progress = 0b0011;
        settle_turn(&mut node, 4);
        assert_eq!(node.timer_speed, 0x50 - 6 + 2);
        assert_eq!(node.face_progress, 0b0111);
        assert_eq!(node.turn_count, 1);
    }

    #[test]
    fn timer_recovery_stops_at_max() {
        let mut node = SearchNode::from_seed(0xBEEF).unwrap();
        node.timer_speed = TIMER_SPEED_MAX;
        settle_turn(&mut node, 1);
        assert_eq!(node.timer_speed, TIMER_SPEED_MAX);

        node.timer_speed = TIMER_SPEED_INITIAL;
        settle_turn(&mut node, 2);
        assert_eq!(node.timer_speed, TIMER_SPEED_INITIAL + 2);
    }

    #[test]
    fn completing_a_face_adopts_the_rolled_type() {
        let mut node = SearchNode::from_seed(0xBEEF).unwrap();
        node.face_type = 1;
        node.face_progress = 0b1011;
        node.next_face = NextFace::from_raw(0x30);
        settle_turn(&mut node, 3);
        assert_eq!(node.face_type, 3);
        assert_eq!(node.face_progress, 0b0001);
    }

    #[test]
    fn first_turn_only_places_the_corner() {
        let mut node = SearchNode::from_seed(0xBEEF).unwrap();
        node.face_progress = 0b0001;
        node.next_face = NextFace::from_raw(0x03);
        let timer = node.timer_speed;
        settle_first_turn(&mut node);
        assert_eq!(node.face_progress, 0b1001);
        assert_eq!(node.timer_speed, timer);
        assert_eq!(node.turn_count, 1);
    }
}
