//! Long-term memory: decaying records, links and domain documents.

pub mod decay;
pub mod store;

pub use decay::DecayModel;
pub use store::{CreateMemoryOptions, MemoryStore, SearchOptions};
