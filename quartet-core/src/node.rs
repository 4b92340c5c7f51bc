use crate::constants::{HISTORY_SLOTS, STARTUP_TICKS, TIMER_SPEED_INITIAL};
use crate::error::SearchError;
use crate::rng::{FaceRng, NextFace};

/// Per-turn delays, slot `i` for turn `i`. Slot 0 is unused; the first turn
/// can wait longer than a byte holds and is kept in its own field.
pub type DelayHistory = [u8; HISTORY_SLOTS];

/// Fields two paths must share to behave identically from here on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKey {
    pub rng: FaceRng,
    pub face_type: u8,
    pub face_progress: u8,
    pub next_face: NextFace,
}

/// What the pruning rules look at. Cheap to build before a child is copied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceProbe {
    pub face_type: u8,
    pub face_progress: u8,
    pub next_face: NextFace,
    pub total_delay: u32,
}

/// One candidate path through the game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchNode {
    pub rng: FaceRng,
    pub face_type: u8,
    /// Corner bits already placed on the current face.
    pub face_progress: u8,
    pub next_face: NextFace,
    pub timer_speed: u8,
    pub turn_count: u16,
    pub first_turn_delay: u16,
    pub delays: Box<DelayHistory>,
    pub total_delay: u32,
}

impl SearchNode {
    /// The state right before the first input window: the first face is
    /// rolled without any chance to delay it, then the startup ticks run.
    pub fn from_seed(seed: u16) -> Result<Self, SearchError> {
        let rng = FaceRng::from_seed(seed).ok_or(SearchError::ZeroSeed)?;
        let (rng, first_face) = rng.roll_next_face();
        Ok(Self {
            rng: rng.advance(STARTUP_TICKS),
            face_type: first_face.face_type(),
            face_progress: first_face.corner_bit(),
            next_face: first_face,
            timer_speed: TIMER_SPEED_INITIAL,
            turn_count: 0,
            first_turn_delay: 0,
            delays: Box::new([0; HISTORY_SLOTS]),
            total_delay: 0,
        })
    }

    pub fn state_key(&self) -> StateKey {
        StateKey {
            rng: self.rng,
            face_type: self.face_type,
            face_progress: self.face_progress,
            next_face: self.next_face,
        }
    }

    pub fn probe(&self) -> FaceProbe {
        FaceProbe {
            face_type: self.face_type,
            face_progress: self.face_progress,
            next_face: self.next_face,
            total_delay: self.total_delay,
        }
    }

    /// Duplicate test used when collapsing a generation.
    pub fn same_search_state(&self, other: &Self) -> bool {
        self.total_delay == other.total_delay && self.state_key() == other.state_key()
    }

    /// First-turn delay followed by turns `1..=horizon`.
    pub fn schedule(&self, horizon: u16) -> Vec<u16> {
        let mut schedule = Vec::with_capacity(horizon as usize + 1);
        schedule.push(self.first_turn_delay);
        schedule.extend(self.delays[1..=horizon as usize].iter().map(|&d| d as u16));
        schedule
    }
}
