//! Sound line generation
//!
//! While an indicator is lit the sound output carries a square wave whose
//! pitch identifies the indicator; while no indicator is lit the line idles
//! low. Waveform quality is out of scope - the generator just toggles the
//! line at the configured frequency, the way the original hardware gated a
//! tone onto a single output pin.

/// Square-wave generator for the sound output line.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    /// Half-period in clock cycles per indicator
    half_periods: [u32; 4],

    /// Cycles left until the next level toggle
    countdown: u32,

    /// Indicator the current tone belongs to
    active: Option<u8>,

    /// Current output level
    level: bool,
}

impl ToneGenerator {
    /// Build a generator for the given clock rate and per-indicator
    /// frequency table (Hz). Frequencies above clock/2 cannot be produced
    /// and are clamped to the fastest representable toggle rate.
    pub fn new(clock_hz: u32, tone_hz: [u16; 4]) -> Self {
        let half_periods =
            core::array::from_fn(|i| (clock_hz / (2 * u32::from(tone_hz[i].max(1)))).max(1));
        Self {
            half_periods,
            countdown: 0,
            active: None,
            level: false,
        }
    }

    /// Advance one clock cycle. `indicator` is the currently lit indicator,
    /// if any.
    pub fn step(&mut self, indicator: Option<u8>) {
        match indicator {
            Some(i) => {
                let i = i & 0x03;
                if self.active != Some(i) {
                    // New tone starts phase-aligned
                    self.active = Some(i);
                    self.level = true;
                    self.countdown = self.half_periods[i as usize];
                    return;
                }
                self.countdown -= 1;
                if self.countdown == 0 {
                    self.level = !self.level;
                    self.countdown = self.half_periods[i as usize];
                }
            }
            None => {
                self.active = None;
                self.level = false;
                self.countdown = 0;
            }
        }
    }

    /// Current sound line level.
    pub fn output(&self) -> bool {
        self.level
    }
}
