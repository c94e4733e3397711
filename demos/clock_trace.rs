//! Pulse clock trace.
//!
//! Drives a randomized, evolving block sequencer from a synthetic square
//! clock and prints every gate change. Run with `RUST_LOG=evoseq=debug`
//! to also see clock measurements and evolution decisions.

use anyhow::Result;
use evoseq::config::EvolutionConfig;
use evoseq::pitch::{Pitch, Scale};
use evoseq::randomizer::ScaleRandomizer;
use evoseq::sequencer::{Inputs, PulseSequencer, Sequencer};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

// Ticks per quarter note of the synthetic clock
const PERIOD: usize = 96;
const BLOCKS: usize = 4;
const CYCLES: usize = 6;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut sequencer =
        PulseSequencer::with_rng(BLOCKS, EvolutionConfig::advanced(), StdRng::seed_from_u64(7))?;
    sequencer.randomize(&ScaleRandomizer::new(Scale::Dorian, Pitch::D));

    println!("tick  block pulse     cv  gate");
    let mut gate = false;
    // One extra period for the clock to measure itself
    for tick in 0..PERIOD * (BLOCKS * CYCLES + 1) {
        let clock = if tick % PERIOD < PERIOD / 2 { 10.0 } else { 0.0 };
        let out = sequencer.process(&Inputs::new(clock, 0.0));

        if out.is_gate_high() != gate {
            gate = out.is_gate_high();
            let block = sequencer
                .current_block()
                .map_or_else(|| "-".to_string(), |b| b.to_string());
            println!(
                "{tick:>5} {block:>5} {:>5} {:>6.3}  {}",
                sequencer.current_pulse(),
                out.cv,
                if gate { "on" } else { "off" }
            );
        }
    }

    let engine = sequencer.engine();
    println!(
        "\nevolution count {} ({} blocks substituted)",
        engine.evolution_count(),
        engine.mapping().substituted_count()
    );
    Ok(())
}
