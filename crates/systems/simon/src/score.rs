//! Two-digit decimal score counter
//!
//! The score is kept as two independent decimal digits (tens, units) so the
//! display multiplexer can consume it without any binary-to-BCD conversion,
//! matching how the hardware carried the digits. Range is 0-99; behavior
//! past 99 is an explicit policy because nothing in the game contract pins
//! it down.

use serde::{Deserialize, Serialize};

/// What `increment` does once the counter reads 99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScoreOverflow {
    /// 99 rolls over to 00
    #[default]
    Wrap,
    /// The counter stays at 99
    Saturate,
}

/// Decimal score counter, 0-99.
#[derive(Debug, Clone)]
pub struct ScoreCounter {
    tens: u8,
    units: u8,
    overflow: ScoreOverflow,
}

impl ScoreCounter {
    pub fn new(overflow: ScoreOverflow) -> Self {
        Self {
            tens: 0,
            units: 0,
            overflow,
        }
    }

    /// Advance the score by one round.
    pub fn increment(&mut self) {
        self.units += 1;
        if self.units == 10 {
            self.units = 0;
            self.tens += 1;
            if self.tens == 10 {
                match self.overflow {
                    ScoreOverflow::Wrap => {
                        self.tens = 0;
                    }
                    ScoreOverflow::Saturate => {
                        self.tens = 9;
                        self.units = 9;
                    }
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.tens = 0;
        self.units = 0;
    }

    /// The (tens, units) digit pair driving the display.
    pub fn digits(&self) -> (u8, u8) {
        (self.tens, self.units)
    }

    /// Combined value, 0-99.
    pub fn value(&self) -> u8 {
        self.tens * 10 + self.units
    }

    /// Restore from a saved value; out-of-range values clamp to 99.
    pub fn set_value(&mut self, value: u8) {
        let value = value.min(99);
        self.tens = value / 10;
        self.units = value % 10;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_carries_into_tens() {
        let mut score = ScoreCounter::new(ScoreOverflow::Wrap);
        for _ in 0..10 {
            score.increment();
        }
        assert_eq!(score.digits(), (1, 0));
        assert_eq!(score.value(), 10);
    }

    #[test]
    fn test_wrap_past_99() {
        let mut score = ScoreCounter::new(ScoreOverflow::Wrap);
        score.set_value(99);
        score.increment();
        assert_eq!(score.value(), 0);
    }

    #[test]
    fn test_saturate_at_99() {
        let mut score = ScoreCounter::new(ScoreOverflow::Saturate);
        score.set_value(99);
        score.increment();
        assert_eq!(score.value(), 99);
        score.increment();
        assert_eq!(score.value(), 99);
    }

    #[test]
    fn test_reset() {
        let mut score = ScoreCounter::new(ScoreOverflow::Wrap);
        score.set_value(42);
        score.reset();
        assert_eq!(score.digits(), (0, 0));
    }

    #[test]
    fn test_set_value_clamps() {
        let mut score = ScoreCounter::new(ScoreOverflow::Wrap);
        score.set_value(200);
        assert_eq!(score.value(), 99);
    }
}
