//! Millisecond tick generation
//!
//! The game logic expresses every delay (playback durations, input windows,
//! inter-round pauses) in milliseconds, while the system itself is stepped
//! one clock cycle at a time. The tick generator divides the free-running
//! clock down to a steady one-millisecond pulse: given N clock ticks per
//! millisecond, it emits one pulse every N cycles, phase-aligned to reset.
//!
//! # Implementation
//!
//! A plain cycle counter, no failure modes. Downstream timing counts these
//! pulses instead of raw cycles, so the same game configuration works at any
//! clock rate.

/// Clock divider producing a one-cycle pulse every `ticks_per_ms` cycles.
#[derive(Debug, Clone)]
pub struct TickGenerator {
    /// Clock cycles per millisecond pulse
    ticks_per_ms: u16,

    /// Cycles counted since the last pulse (or since reset)
    count: u16,
}

impl TickGenerator {
    /// Create a generator for the given clock rate.
    ///
    /// `ticks_per_ms` is the number of clock cycles per millisecond
    /// (50 for the 50 kHz reference clock). A zero value is coerced to 1
    /// so the divider still pulses; callers validate their configuration
    /// before construction.
    pub fn new(ticks_per_ms: u16) -> Self {
        Self {
            ticks_per_ms: ticks_per_ms.max(1),
            count: 0,
        }
    }

    /// Advance one clock cycle. Returns true on the cycle that completes a
    /// millisecond.
    pub fn step(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.ticks_per_ms {
            self.count = 0;
            return true;
        }
        false
    }

    /// Re-align the divider phase, as a hardware reset line would.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Configured cycles per millisecond.
    pub fn ticks_per_ms(&self) -> u16 {
        self.ticks_per_ms
    }
}
