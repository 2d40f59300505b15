pub mod controller;
pub mod tracker;

pub use controller::{CheckpointSink, DatabaseSink, MemorySink, ProgressController};
pub use tracker::{save_threshold, watched_percentage, CheckpointTracker};
