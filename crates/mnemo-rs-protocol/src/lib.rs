//! Port contracts shared by the Mnemo memory crates.
//!
//! The memory subsystem never talks to a model directly. It goes through the
//! two ports defined here, which callers back with a real provider or a test
//! double.

mod error;
mod message;
mod port;

pub use error::PortError;
pub use message::{PromptMessage, PromptRole};
pub use port::{EmbeddingPort, GenerationPort};
