use crate::constants::{TIMER_COUNTDOWN_START, TIMER_SPEED_INITIAL, TIMER_SPEED_MAX};

static DELAY_BUDGETS: [u8; TIMER_SPEED_MAX as usize + 1] = build_delay_budgets();

/// Simulates the countdown for every valid speed: a sub-counter gains the
/// speed each frame and the countdown drops whenever it wraps past 0x100.
const fn build_delay_budgets() -> [u8; TIMER_SPEED_MAX as usize + 1] {
    let mut table = [0u8; TIMER_SPEED_MAX as usize + 1];
    let mut speed = TIMER_SPEED_INITIAL as usize;
    while speed <= TIMER_SPEED_MAX as usize {
        let mut countdown = TIMER_COUNTDOWN_START;
        let mut sub_timer = 0u16;
        let mut frames = 0u8;
        loop {
            sub_timer += speed as u16;
            if sub_timer >= 0x100 {
                sub_timer -= 0x100;
                countdown -= 1;
                if countdown == 0 {
                    break;
                }
            }
            frames += 1;
        }
        // The last counted frame is the one the countdown fires on.
        table[speed] = frames - 1;
        speed += 2;
    }
    table
}

pub fn is_valid_timer_speed(timer_speed: u8) -> bool {
    timer_speed % 2 == 0 && (TIMER_SPEED_INITIAL..=TIMER_SPEED_MAX).contains(&timer_speed)
}

/// Input frames available at `timer_speed` before the countdown fires.
#[inline]
pub fn delay_budget(timer_speed: u8) -> u8 {
    debug_assert!(
        is_valid_timer_speed(timer_speed),
        "timer speed {timer_speed:#04x} is never reached"
    );
    DELAY_BUDGETS[timer_speed as usize]
}
