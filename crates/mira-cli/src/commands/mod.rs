pub mod chat;
pub mod daemon;
pub mod doc;
pub mod link;
pub mod maintenance;
pub mod memory;
pub mod tools;
pub mod utils;
