//! Headless Simon demo frontend.
//!
//! Plays the game against itself: starts a round, watches the indicator
//! outputs to learn the sequence, then replays it through the button
//! inputs. Useful for eyeballing the game flow at full simulation speed and
//! for producing save-state dumps.

use anyhow::Result;
use clap::Parser;
use simon_core::System;
use simon_system::{SimonConfig, SimonSystem};
use std::fs::File;
use std::io::Write;

#[derive(Parser)]
struct Args {
    /// Clock ticks per millisecond (50 = the 50 kHz reference clock)
    #[arg(long, default_value_t = 50)]
    ticks_per_ms: u16,

    /// Number of rounds to play before stopping
    #[arg(long, default_value_t = 3)]
    rounds: u32,

    /// Power-on seed for the random register
    #[arg(long, default_value_t = 0xACE1)]
    seed: u16,

    /// Drive the display in inverted polarity (common-anode wiring)
    #[arg(long, default_value_t = false)]
    invert: bool,

    /// Dump the final save-state to this file as JSON
    #[arg(long, default_value = "state.json")]
    save: String,

    /// Print the save-state after every round
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Suppress per-round output (still writes --save)
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn step_ms(sys: &mut SimonSystem, ms: u32) -> Result<()> {
    let ticks = u32::from(sys.config().ticks_per_ms);
    sys.step_cycles(ms * ticks)?;
    Ok(())
}

/// Hold a button for a few milliseconds, then release - long enough to pass
/// the debouncer and be sampled by the game tick at any clock rate.
fn press_button(sys: &mut SimonSystem, index: u8) -> Result<()> {
    sys.set_buttons(1 << index);
    step_ms(sys, 4)?;
    sys.set_buttons(0);
    step_ms(sys, 4)?;
    Ok(())
}

fn lit_indicator(sys: &SimonSystem) -> Option<u8> {
    match sys.indicators() {
        0 => None,
        mask => Some(mask.trailing_zeros() as u8),
    }
}

fn wait_for_led(sys: &mut SimonSystem) -> Result<u8> {
    for _ in 0..10_000_000u32 {
        if let Some(led) = lit_indicator(sys) {
            return Ok(led);
        }
        sys.step_cycle();
    }
    anyhow::bail!("no indicator lit - game wedged?");
}

fn wait_for_leds_off(sys: &mut SimonSystem) -> Result<()> {
    for _ in 0..10_000_000u32 {
        if lit_indicator(sys).is_none() {
            return Ok(());
        }
        sys.step_cycle();
    }
    anyhow::bail!("indicator stuck on");
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = SimonConfig {
        ticks_per_ms: args.ticks_per_ms,
        lfsr_seed: args.seed,
        segments_invert: args.invert,
        ..SimonConfig::default()
    };
    let mut sys = SimonSystem::new(config)?;

    // Power-on reset, then any button starts the game
    sys.set_reset(true);
    sys.step_cycles(100)?;
    sys.set_reset(false);
    sys.step_cycles(1)?;
    press_button(&mut sys, 0)?;
    log::info!("game started");

    let mut sequence: Vec<u8> = Vec::new();
    for round in 0..args.rounds {
        // Playback: one new element per round, preceded by the full replay
        for step in 0..=round as usize {
            let led = wait_for_led(&mut sys)?;
            if step < sequence.len() {
                anyhow::ensure!(
                    led == sequence[step],
                    "playback diverged at step {step}: saw {led}, recorded {}",
                    sequence[step]
                );
            } else {
                sequence.push(led);
            }
            wait_for_leds_off(&mut sys)?;
        }

        // Reproduce the sequence through the buttons
        for step in 0..sequence.len() {
            step_ms(&mut sys, 150)?;
            press_button(&mut sys, sequence[step])?;
            step_ms(&mut sys, 350)?;
        }

        let score = sys.controller().score().value();
        if !args.quiet {
            println!(
                "Round {}: sequence {:?}, score {:02}",
                round + 1,
                sequence,
                score
            );
        }
        if args.debug {
            println!("pins: {}", serde_json::to_string(&sys.pins())?);
            println!("{}", serde_json::to_string_pretty(&sys.save_state())?);
        }
    }

    let state = sys.save_state();
    let mut f = File::create(&args.save)?;
    write!(f, "{}", serde_json::to_string_pretty(&state)?)?;
    if !args.quiet {
        println!(
            "Final score {:02}, state written to {}",
            sys.controller().score().value(),
            args.save
        );
    }

    Ok(())
}
