pub mod alert;
pub mod config;
pub mod deduplication;
pub mod discovery;
pub mod enrichment;
pub mod error;
pub mod scheduler;
pub mod scoring;
pub mod sources;
pub mod types;

// Re-export for tests
pub use scheduler::Scheduler;
