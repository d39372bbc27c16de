pub mod processor;
pub mod stats;
pub mod store;
pub mod walker;
