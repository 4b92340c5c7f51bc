/// Turns searched after the initial turn.
pub const TURN_COUNT: u16 = 2862;
/// Delay history slots per node; slot 0 belongs to the first turn.
pub const HISTORY_SLOTS: usize = TURN_COUNT as usize + 1;

/// Best total delay known from earlier runs. Anything above it is culled.
pub const DEFAULT_DELAY_CUTOFF: u32 = 6884;

// Generator.
pub const LFSR_PERIOD: u32 = 0xFFFF;
pub const LFSR_FEEDBACK: u16 = 0xB400;
/// Bits of the generator high byte that form a (type, corner) pair.
pub const NEXT_FACE_MASK: u8 = 0x33;

// Countdown timer.
pub const TIMER_SPEED_INITIAL: u8 = 0x40;
pub const TIMER_SPEED_MAX: u8 = 0x80;
pub const TIMER_SPEED_RECOVERY: u8 = 2;
pub const TIMER_SPEED_BOARD_CLEAR_PENALTY: u8 = 6;
pub const TIMER_COUNTDOWN_START: u8 = 0x14;

// Frame counts between input windows.
/// Ticks before the first input window opens (5) plus ticks before the
/// first roll after it (10).
pub const STARTUP_TICKS: u32 = 5 + 10;
/// The initial countdown; the first input may wait at most this many ticks.
pub const FIRST_TURN_MAX_DELAY: u16 = 260;
pub const FIRST_TURN_MIN_DELAY: u16 = 1;
pub const TICKS_BEFORE_INPUT: u32 = 14;
/// A consecutive input cannot land on the first frame of its window.
pub const TICKS_CONSECUTIVE_INPUT: u32 = 1;
pub const TICKS_BEFORE_ROLL: u32 = 16;
/// Board clears on early turns award a 1-up and take one frame longer.
pub const TICKS_BOARD_CLEAR_EARLY: u32 = 101;
pub const TICKS_BOARD_CLEAR: u32 = 100;
pub const BOARD_CLEAR_EARLY_LAST_TURN: u16 = 12;
