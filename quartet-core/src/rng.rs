use crate::constants::{LFSR_FEEDBACK, LFSR_PERIOD, NEXT_FACE_MASK};

const PERIOD: usize = LFSR_PERIOD as usize;

/// States in sequence order, starting from state 1.
static SEQUENCE: [u16; PERIOD] = build_sequence();
/// Sequence index of every state. Entry 0 is unused; state 0 is not in the cycle.
static SEQUENCE_INDEX: [u16; PERIOD + 1] = build_sequence_index();

/// One step of the 16-bit Galois LFSR.
///
/// The machine keeps the state as two bytes and shifts the high byte into the
/// low one; viewed as a little-endian word this is a right shift with the
/// feedback folded into the high byte.
#[inline]
pub const fn lfsr_step(state: u16) -> u16 {
    let feedback = if state & 1 != 0 { LFSR_FEEDBACK } else { 0 };
    (state >> 1) ^ feedback
}

const fn build_sequence() -> [u16; PERIOD] {
    let mut table = [0u16; PERIOD];
    let mut state = 1u16;
    let mut i = 0;
    while i < PERIOD {
        table[i] = state;
        state = lfsr_step(state);
        i += 1;
    }
    table
}

const fn build_sequence_index() -> [u16; PERIOD + 1] {
    let mut table = [0u16; PERIOD + 1];
    let mut state = 1u16;
    let mut i = 0;
    while i < PERIOD {
        table[state as usize] = i as u16;
        state = lfsr_step(state);
        i += 1;
    }
    table
}

/// Position of a non-zero state in the generator cycle.
#[inline]
pub fn sequence_index(state: u16) -> u16 {
    debug_assert!(state != 0, "state 0 is outside the generator cycle");
    SEQUENCE_INDEX[state as usize]
}

/// Fast-forward `ticks` steps, wrapping modulo the period.
#[inline]
pub fn advance(state: u16, ticks: u32) -> u16 {
    let index = sequence_index(state) as u32 + ticks % LFSR_PERIOD;
    let index = if index >= LFSR_PERIOD {
        index - LFSR_PERIOD
    } else {
        index
    };
    SEQUENCE[index as usize]
}

/// Candidate for the next required face: type in the high nibble, corner in
/// the low nibble.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NextFace(u8);

impl NextFace {
    pub fn from_raw(raw: u8) -> Self {
        Self(raw & NEXT_FACE_MASK)
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn face_type(self) -> u8 {
        self.0 >> 4
    }

    pub fn corner(self) -> u8 {
        self.0 & 0x0F
    }

    pub fn corner_bit(self) -> u8 {
        1 << self.corner()
    }
}

/// Generator state of the game's face roller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceRng {
    state: u16,
}

impl FaceRng {
    /// Seeds are given high byte first; the generator keeps them the other way round.
    pub fn from_seed(seed: u16) -> Option<Self> {
        Self::from_state(seed.swap_bytes())
    }

    pub fn from_state(state: u16) -> Option<Self> {
        (state != 0).then_some(Self { state })
    }

    pub fn state(self) -> u16 {
        self.state
    }

    pub fn step(self) -> Self {
        Self {
            state: lfsr_step(self.state),
        }
    }

    pub fn advance(self, ticks: u32) -> Self {
        Self {
            state: advance(self.state, ticks),
        }
    }

    /// Rolls the next face from the high byte of the following state. The
    /// game ticks the generator once more after loading the roll.
    pub fn roll_next_face(self) -> (Self, NextFace) {
        let rolled = self.step();
        let next_face = NextFace::from_raw((rolled.state >> 8) as u8);
        (rolled.step(), next_face)
    }
}
