use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{
    state::{BreakSchedule, PreviewPhase, SyncFrame},
    surface::PreviewSurface,
    synchronizer::{PlaybackSynchronizer, SyncTuning},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

const TEARDOWN_POLL_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy)]
struct PrimarySample {
    time: f64,
    playing: bool,
    at: Duration,
}

struct ControllerState<S: PreviewSurface> {
    sync: PlaybackSynchronizer<S>,
    last_primary: Option<PrimarySample>,
}

impl<S: PreviewSurface> ControllerState<S> {
    /// Primary position now, extrapolated from the last time update while playing.
    fn estimated_primary(&self, clock: Duration) -> Option<(f64, bool)> {
        self.last_primary.map(|sample| {
            let time = if sample.playing {
                sample.time + clock.saturating_sub(sample.at).as_secs_f64()
            } else {
                sample.time
            };
            (time, sample.playing)
        })
    }
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Async owner of a [`PlaybackSynchronizer`].
///
/// Primary time updates tick it directly; while a break is active (or its exit
/// animation is running) a high-frequency ticker keeps it moving between them.
/// Every resulting frame is published on a `watch` channel.
pub struct PreviewController<S: PreviewSurface + Send + 'static> {
    state: Arc<Mutex<ControllerState<S>>>,
    frames_tx: Arc<watch::Sender<SyncFrame>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    tick_interval: Duration,
    seek_timeout: Duration,
    origin: Instant,
}

impl<S: PreviewSurface + Send + 'static> PreviewController<S> {
    pub fn new(surface: S, schedule: BreakSchedule, tuning: SyncTuning, tick_hz: u32) -> Self {
        let (frames_tx, _) = watch::channel(SyncFrame::default());
        Self {
            state: Arc::new(Mutex::new(ControllerState {
                sync: PlaybackSynchronizer::new(surface, schedule, tuning),
                last_primary: None,
            })),
            frames_tx: Arc::new(frames_tx),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs_f64(1.0 / f64::from(tick_hz.max(1))),
            seek_timeout: tuning.seek_timeout,
            origin: Instant::now(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncFrame> {
        self.frames_tx.subscribe()
    }

    fn clock(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Feed a time update from the primary surface.
    pub async fn on_time_update(&self, primary_time: f64, primary_playing: bool) -> SyncFrame {
        let clock = self.clock();
        let frame = {
            let mut state = self.state.lock().await;
            state.last_primary = Some(PrimarySample {
                time: primary_time,
                playing: primary_playing,
                at: clock,
            });
            state.sync.tick(clock, primary_time, primary_playing)
        };

        self.frames_tx.send_replace(frame.clone());

        if frame.phase == PreviewPhase::Idle {
            self.cancel_ticker().await;
        } else {
            self.ensure_ticker().await;
        }

        frame
    }

    pub async fn phase(&self) -> PreviewPhase {
        self.state.lock().await.sync.phase()
    }

    /// Replace the break list; the old list's effects are torn down first.
    pub async fn set_schedule(&self, schedule: BreakSchedule) {
        self.cancel_ticker().await;
        let clock = self.clock();
        let mut state = self.state.lock().await;
        state.sync.set_schedule(clock, schedule);
        self.frames_tx.send_replace(SyncFrame::default());
    }

    /// Stop the ticker, clear pending animation and pause the preview once any
    /// in-flight play request has settled.
    pub async fn shutdown(&self) {
        self.cancel_ticker().await;

        let deadline = self.clock() + self.seek_timeout;
        loop {
            let clock = self.clock();
            let settled = self.state.lock().await.sync.teardown(clock);
            if settled {
                break;
            }
            if clock >= deadline {
                log_warn!("preview play request still unresolved at shutdown; leaving it");
                break;
            }
            time::sleep(TEARDOWN_POLL_INTERVAL).await;
        }

        self.frames_tx.send_replace(SyncFrame::default());
        log_info!("preview controller shut down");
    }

    async fn ensure_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(ticker) = ticker_guard.as_ref() {
            if !ticker.handle.is_finished() {
                return;
            }
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();
        let state = self.state.clone();
        let frames_tx = self.frames_tx.clone();
        let tick_interval = self.tick_interval;
        let origin = self.origin;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let clock = origin.elapsed();
                        let frame = {
                            let mut guard = state.lock().await;
                            let Some((time, playing)) = guard.estimated_primary(clock) else {
                                break;
                            };
                            guard.sync.tick(clock, time, playing)
                        };

                        let idle = frame.phase == PreviewPhase::Idle;
                        frames_tx.send_replace(frame);
                        if idle {
                            log_debug!("preview ticker idle; stopping");
                            break;
                        }
                    }
                    _ = token_clone.cancelled() => {
                        break;
                    }
                }
            }
        });

        *ticker_guard = Some(Ticker {
            handle,
            cancel_token,
        });
    }

    async fn cancel_ticker(&self) {
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.cancel_token.cancel();
            if let Err(err) = ticker.handle.await {
                if !err.is_cancelled() {
                    log_warn!("preview ticker task failed: {err}");
                }
            }
        }
    }
}
