pub mod checkpoint;
pub mod overlay;
pub mod segment;

pub use checkpoint::ProgressCheckpoint;
pub use overlay::{Overlay, OverlayKind};
pub use segment::{Segment, SegmentKind, SegmentList};
