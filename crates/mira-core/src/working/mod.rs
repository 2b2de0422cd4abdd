//! Working memory: the bounded per-conversation turn buffer.

pub mod buffer;
pub mod render;
pub mod summary;
pub mod topic;

pub use buffer::WorkingMemory;
pub use topic::infer_topic;
