//! Data models for the MIRA engine.

pub mod event;
pub mod memory;
pub mod metadata;
pub mod tool;
pub mod working;

pub use event::*;
pub use memory::*;
pub use metadata::*;
pub use tool::*;
pub use working::*;
