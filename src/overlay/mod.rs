pub mod bake;
pub mod sequencer;

pub use bake::{bake_frame, frame_time, preview_at, OverlayFrameState};
pub use sequencer::{edge_factor, is_active, EdgeTiming};
