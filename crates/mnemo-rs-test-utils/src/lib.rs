//! Test helpers shared across Mnemo crates.

pub mod backend;
pub mod llm;
pub mod ports;

pub use backend::{FailingSearchIndex, UnavailableKeyValue};
pub use llm::FixedLLM;
pub use ports::{
    EchoGenerator, FailingEmbedder, FailingGenerator, FixedGenerator, HashingEmbedder,
    SlowGenerator,
};
