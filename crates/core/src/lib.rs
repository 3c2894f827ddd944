//! Core digital building blocks for the Simon game simulation.
//!
//! Everything here models a component of a single synchronous clock domain:
//! state advances exactly once per `step`, there is no parallelism and no
//! blocking. Systems compose these blocks and expose the [`System`] trait
//! to frontends.

pub mod button;
pub mod clock;
pub mod display;
pub mod lfsr;
pub mod tone;

pub use button::{ButtonPad, Debouncer};
pub use clock::TickGenerator;
pub use display::{decode_digit, DisplayMux, SEGMENT_PATTERNS};
pub use lfsr::Lfsr;
pub use tone::ToneGenerator;

pub mod types {
    use serde::{Deserialize, Serialize};

    /// Snapshot of a system's output lines on one clock cycle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PinState {
        /// One-hot indicator lines
        pub indicators: u8,
        /// Segment lines a-g (after polarity)
        pub segments: u8,
        /// Digit-select lines (after polarity)
        pub digit_select: u8,
        /// Sound line level
        pub sound: bool,
    }
}

use serde_json::Value;

/// A clock-steppable system tying components together.
pub trait System {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Force power-on state (the external reset line)
    fn reset(&mut self);

    /// Advance the system by `n` clock cycles.
    fn step_cycles(&mut self, n: u32) -> Result<(), Self::Error>;

    /// Return a JSON-serializable save state for debugging.
    /// Save states capture simulation state only, never configuration.
    fn save_state(&self) -> Value;

    /// Load a JSON save state.
    /// Missing fields are left at their current values.
    fn load_state(&mut self, v: &Value) -> Result<(), serde_json::Error>;

    /// Check if this system supports save/load state functionality
    fn supports_save_states(&self) -> bool {
        false // Default: no save state support
    }
}
