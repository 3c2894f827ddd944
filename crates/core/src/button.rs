//! Button input conditioning
//!
//! Mechanical buttons bounce: a single physical press shows up as a burst of
//! transitions on the raw line. The debouncer only lets the clean level
//! follow the raw line once it has been continuously asserted (or released)
//! for a minimum number of consecutive clock cycles.
//!
//! The conditioned output is a level, not an event. Edge detection happens
//! in the game controller, which samples the levels once per millisecond
//! tick and owns the sampling history.

/// Single-line debouncer.
#[derive(Debug, Clone)]
pub struct Debouncer {
    /// Cycles the raw line must hold a new level before it is accepted
    stable_cycles: u16,

    /// Current clean output level
    stable: bool,

    /// Consecutive cycles the raw line has disagreed with the output
    count: u16,
}

impl Debouncer {
    pub fn new(stable_cycles: u16) -> Self {
        Self {
            stable_cycles: stable_cycles.max(1),
            stable: false,
            count: 0,
        }
    }

    /// Sample the raw line for one clock cycle and return the clean level.
    pub fn step(&mut self, raw: bool) -> bool {
        if raw == self.stable {
            self.count = 0;
        } else {
            self.count += 1;
            if self.count >= self.stable_cycles {
                self.stable = raw;
                self.count = 0;
            }
        }
        self.stable
    }

    /// Clean level without sampling.
    pub fn level(&self) -> bool {
        self.stable
    }

    pub fn reset(&mut self) {
        self.stable = false;
        self.count = 0;
    }
}

/// Conditioner for the four game buttons.
///
/// Accepts the raw lines as an active-high bitmask (bit i = button i) and
/// produces the debounced levels in the same encoding.
#[derive(Debug, Clone)]
pub struct ButtonPad {
    lines: [Debouncer; 4],
}

impl ButtonPad {
    pub fn new(stable_cycles: u16) -> Self {
        Self {
            lines: core::array::from_fn(|_| Debouncer::new(stable_cycles)),
        }
    }

    /// Sample all four raw lines for one clock cycle; returns the clean
    /// levels as a bitmask.
    pub fn step(&mut self, raw_mask: u8) -> u8 {
        let mut levels = 0u8;
        for (i, line) in self.lines.iter_mut().enumerate() {
            if line.step(raw_mask & (1 << i) != 0) {
                levels |= 1 << i;
            }
        }
        levels
    }

    /// Clean levels from the last sample.
    pub fn levels(&self) -> u8 {
        let mut levels = 0u8;
        for (i, line) in self.lines.iter().enumerate() {
            if line.level() {
                levels |= 1 << i;
            }
        }
        levels
    }

    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
    }
}
