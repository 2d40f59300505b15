pub mod video;

pub use video::StoredVideo;
