pub mod controller;
pub mod countdown;
pub mod recovery;
pub mod simulated;
pub mod state;
pub mod surface;
pub mod synchronizer;

pub use controller::PreviewController;
pub use countdown::{CountdownView, StartCountdown, StartCountdownMode};
pub use recovery::{RecoveryAction, RecoveryPolicy, StallRecovery};
pub use simulated::{SimulatedSurface, SimulatedSurfaceConfig};
pub use state::{BreakSchedule, PreviewPhase, PreviewWindow, ScheduledBreak, SyncFrame};
pub use surface::{PlayPoll, PlayRejection, PreviewSurface};
pub use synchronizer::{PlaybackSynchronizer, SyncStats, SyncTuning};
