//! Probabilistic step substitution.
//!
//! The `EvolutionEngine` grows and shrinks a step-to-step substitution
//! mapping once per cycle, so a sequence slowly drifts away from its
//! authored content and back. The mapping and its ratchet table are owned
//! by the engine; everything else only reads them.

mod engine;
mod mapping;

pub use engine::{EvolutionEngine, MAX_RUN, Mutation, Resolution};
pub use mapping::{EvolutionMapping, NO_SUBSTITUTION, RatchetTable};
