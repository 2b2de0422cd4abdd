//! Background maintenance: the event processor and dream consolidation.

pub mod dream;
pub mod handler;
pub mod processor;

pub use handler::EventHandler;
pub use processor::{EventOutcome, EventProcessor, EventProcessorHandle, EventProcessorStatus};
