pub mod algorithm;
pub mod breaks;
pub mod config;
pub mod persisted;

pub use algorithm::generate;
pub use breaks::{derive_breaks, with_derived_breaks};
pub use config::GeneratorConfig;
pub use persisted::{PersistedBreak, PersistedExercise, PersistedSegments};
