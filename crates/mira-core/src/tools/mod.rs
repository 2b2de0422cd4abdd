//! Tool activation registry: keyword self-activation and idle-turn expiry.

pub mod catalog;
pub mod registry;

pub use catalog::default_catalog;
pub use registry::ToolRegistry;
