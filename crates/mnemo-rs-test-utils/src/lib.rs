//! Test helpers shared across Mnemo crates.

pub mod embedding;
pub mod store;

pub use embedding::{
    CountingEmbedder, FailingEmbedder, FixedEmbedder, HashingEmbedder, SwitchableEmbedder,
};
pub use store::{SCENARIO_DIMENSION, TempStore, scenario_embedder};
