//! Simon Says game system
//!
//! Wires the core building blocks - millisecond tick generator, free-running
//! LFSR, button debouncers, game controller, display multiplexer and tone
//! generator - into a single synchronous clock domain behind the
//! [`simon_core::System`] trait.
//!
//! # Boundary signals
//!
//! Inputs: four active-high button lines, an external reset line (active
//! while `set_reset(true)`), a segment-polarity-invert line, and the clock
//! itself (`step_cycle`). Outputs: four one-hot indicator lines, seven
//! segment lines, two digit-select lines and the sound line.
//!
//! Every component's state advances exactly once per clock cycle; game
//! logic is further gated by the derived millisecond tick. There is no
//! concurrency: the random register is mutated only by its own free-running
//! update, score and sequence only by the controller, and the display only
//! reads the score digits.

mod controller;
mod score;

pub use controller::{GameController, GameState, MultiPressPolicy};
pub use score::{ScoreCounter, ScoreOverflow};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use simon_core::types::PinState;
use simon_core::{ButtonPad, DisplayMux, Lfsr, System, TickGenerator, ToneGenerator};

/// Clock cycles each display digit stays selected, in milliseconds.
/// Two digits at 5 ms each give a 100 Hz refresh - steady to the eye, and
/// several digit-select edges inside every game-timing window.
const DIGIT_SLOT_MS: u32 = 5;

/// Game configuration.
///
/// Durations are in milliseconds of game time; they are independent of the
/// clock rate, which only sets how many cycles one millisecond takes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimonConfig {
    /// Clock cycles per millisecond (50 for the 50 kHz reference clock)
    pub ticks_per_ms: u16,

    /// Cycles a button line must hold a new level to pass the debouncer
    pub debounce_cycles: u16,

    /// Pause between the start press (or a completed round) and playback
    pub start_delay_ms: u32,

    /// Indicator on-duration per playback element
    pub show_on_ms: u32,

    /// Indicator off gap after each playback element
    pub show_gap_ms: u32,

    /// Echo window after each correct press
    pub input_feedback_ms: u32,

    /// Input window per verification step; 0 disables the timeout
    pub input_timeout_ms: u32,

    /// Score behavior past 99
    pub score_overflow: ScoreOverflow,

    /// Resolution of simultaneous button edges
    pub multi_press: MultiPressPolicy,

    /// Sound frequency per indicator, Hz (the classic Simon tones)
    pub tone_hz: [u16; 4],

    /// Power-on LFSR content; zero is coerced to the default seed
    pub lfsr_seed: u16,

    /// Initial level of the segment-polarity-invert line
    /// (true for common-anode displays)
    pub segments_invert: bool,
}

impl Default for SimonConfig {
    fn default() -> Self {
        Self {
            ticks_per_ms: 50,
            debounce_cycles: 8,
            start_delay_ms: 500,
            show_on_ms: 300,
            show_gap_ms: 100,
            input_feedback_ms: 300,
            input_timeout_ms: 5000,
            score_overflow: ScoreOverflow::Wrap,
            multi_press: MultiPressPolicy::Ignore,
            tone_hz: [209, 252, 310, 415],
            lfsr_seed: simon_core::lfsr::DEFAULT_SEED,
            segments_invert: false,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("ticks_per_ms must be nonzero")]
    ZeroTickRate,
    #[error("debounce_cycles must be nonzero")]
    ZeroDebounce,
    #[error("{0} must be nonzero")]
    ZeroDuration(&'static str),
    #[error("tone frequency must be nonzero")]
    ZeroToneFrequency,
    #[error("tone frequency {0} Hz exceeds half the {1} Hz clock")]
    ToneTooFast(u16, u32),
}

impl SimonConfig {
    /// Clock frequency implied by the tick rate, Hz.
    pub fn clock_hz(&self) -> u32 {
        u32::from(self.ticks_per_ms) * 1000
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticks_per_ms == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.debounce_cycles == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        for (name, value) in [
            ("start_delay_ms", self.start_delay_ms),
            ("show_on_ms", self.show_on_ms),
            ("show_gap_ms", self.show_gap_ms),
            ("input_feedback_ms", self.input_feedback_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDuration(name));
            }
        }
        for freq in self.tone_hz {
            if freq == 0 {
                return Err(ConfigError::ZeroToneFrequency);
            }
            if u32::from(freq) * 2 > self.clock_hz() {
                return Err(ConfigError::ToneTooFast(freq, self.clock_hz()));
            }
        }
        Ok(())
    }
}

/// The complete Simon game system.
pub struct SimonSystem {
    config: SimonConfig,
    lfsr: Lfsr,
    ticks: TickGenerator,
    pad: ButtonPad,
    controller: GameController,
    mux: DisplayMux,
    tone: ToneGenerator,

    /// Raw active-high button lines
    buttons: u8,

    /// External reset line, honored synchronously every cycle
    reset_line: bool,

    /// Segment/digit-select polarity line
    segments_invert: bool,
}

impl SimonSystem {
    pub fn new(config: SimonConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            lfsr: Lfsr::with_seed(config.lfsr_seed),
            ticks: TickGenerator::new(config.ticks_per_ms),
            pad: ButtonPad::new(config.debounce_cycles),
            controller: GameController::new(&config),
            mux: DisplayMux::new(DIGIT_SLOT_MS * u32::from(config.ticks_per_ms)),
            tone: ToneGenerator::new(config.clock_hz(), config.tone_hz),
            buttons: 0,
            reset_line: false,
            segments_invert: config.segments_invert,
            config,
        })
    }

    /// Set the raw button lines (bit i = button i, active high).
    pub fn set_buttons(&mut self, mask: u8) {
        self.buttons = mask & 0x0F;
    }

    /// Drive the external reset line. While asserted, each cycle forces the
    /// cleared idle state; the random register keeps free-running.
    pub fn set_reset(&mut self, asserted: bool) {
        self.reset_line = asserted;
    }

    /// Drive the segment-polarity-invert line.
    pub fn set_segments_invert(&mut self, invert: bool) {
        self.segments_invert = invert;
    }

    /// Advance one clock cycle.
    pub fn step_cycle(&mut self) {
        // The random register runs unconditionally, reset or not: its
        // unpredictability comes from how long it has been running when the
        // player first presses a button.
        self.lfsr.step();

        let tick = self.ticks.step();
        let levels = self.pad.step(self.buttons);

        if self.reset_line {
            self.controller.reset();
            self.ticks.reset();
            self.pad.reset();
        } else if tick {
            self.controller.tick(levels, self.lfsr.index());
        }

        self.mux
            .step(self.controller.display_digits(), self.segments_invert);
        self.tone.step(self.controller.active_indicator());
    }

    /// One-hot indicator output lines.
    pub fn indicators(&self) -> u8 {
        match self.controller.active_indicator() {
            Some(i) => 1 << i,
            None => 0,
        }
    }

    /// Segment output lines (bit 0 = a through bit 6 = g, after polarity).
    pub fn segments(&self) -> u8 {
        self.mux.segments()
    }

    /// Digit-select output lines (bit 0 = tens, bit 1 = units, after
    /// polarity).
    pub fn digit_select(&self) -> u8 {
        self.mux.digit_select()
    }

    /// Sound output line.
    pub fn sound(&self) -> bool {
        self.tone.output()
    }

    /// Snapshot of all output lines for this cycle.
    pub fn pins(&self) -> PinState {
        PinState {
            indicators: self.indicators(),
            segments: self.segments(),
            digit_select: self.digit_select(),
            sound: self.sound(),
        }
    }

    pub fn controller(&self) -> &GameController {
        &self.controller
    }

    pub fn config(&self) -> &SimonConfig {
        &self.config
    }
}

impl System for SimonSystem {
    type Error = std::convert::Infallible;

    fn reset(&mut self) {
        self.controller.reset();
        self.ticks.reset();
        self.pad.reset();
        self.buttons = 0;
        // LFSR deliberately untouched
    }

    fn step_cycles(&mut self, n: u32) -> Result<(), Self::Error> {
        for _ in 0..n {
            self.step_cycle();
        }
        Ok(())
    }

    fn save_state(&self) -> Value {
        serde_json::json!({
            "system": "simon",
            "version": 1,
            "controller": self.controller.save_state(),
            "lfsr": self.lfsr.value(),
        })
    }

    fn load_state(&mut self, v: &Value) -> Result<(), serde_json::Error> {
        if let Some(ctrl) = v.get("controller") {
            self.controller.load_state(ctrl);
        }
        if let Some(reg) = v.get("lfsr").and_then(|r| r.as_u64()) {
            self.lfsr.set_value(reg as u16);
        }
        Ok(())
    }

    fn supports_save_states(&self) -> bool {
        true
    }
}
