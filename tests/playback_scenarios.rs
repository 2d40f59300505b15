use std::time::Duration;

use repcast_lib::playback::{
    BreakSchedule, PlaybackSynchronizer, PreviewPhase, PreviewSurface, SimulatedSurface,
    SimulatedSurfaceConfig, SyncFrame, SyncTuning,
};
use repcast_lib::{generate, GeneratorConfig};

const TICK: Duration = Duration::from_millis(16);

struct Harness {
    sync: PlaybackSynchronizer<SimulatedSurface>,
    surface: SimulatedSurface,
    clock: Duration,
}

impl Harness {
    fn new(config: SimulatedSurfaceConfig) -> Self {
        let schedule =
            BreakSchedule::from_segments(&generate(&GeneratorConfig::for_duration(185.0)).unwrap());
        Self::with_schedule(schedule, config)
    }

    fn with_schedule(schedule: BreakSchedule, config: SimulatedSurfaceConfig) -> Self {
        let surface = SimulatedSurface::new(config);
        Self {
            sync: PlaybackSynchronizer::new(surface.clone(), schedule, SyncTuning::default()),
            surface,
            clock: Duration::ZERO,
        }
    }

    fn tick(&mut self, primary_time: f64, primary_playing: bool) -> SyncFrame {
        let frame = self.sync.tick(self.clock, primary_time, primary_playing);
        self.clock += TICK;
        frame
    }

    /// Enter the last break at 161s and run until the preview is playing.
    fn playing_in_last_break(config: SimulatedSurfaceConfig) -> Self {
        let mut harness = Self::new(config);
        for _ in 0..3 {
            harness.tick(161.0, true);
        }
        assert!(harness.surface.is_playing());
        harness
    }
}

fn instant() -> SimulatedSurfaceConfig {
    SimulatedSurfaceConfig::default()
}

#[test]
fn preview_surface_starts_muted_without_controls() {
    let harness = Harness::new(instant());
    assert!(harness.surface.is_muted());
    assert!(!harness.surface.controls_visible());
}

#[test]
fn approaching_then_final_countdown() {
    let mut harness = Harness::new(instant());

    let frame = harness.tick(171.0, true);
    assert_eq!(frame.phase, PreviewPhase::Approaching);
    assert!(frame.popup_visible);
    assert_eq!(frame.countdown, None);
    assert_eq!(frame.next_label.as_deref(), Some("Exercise 4"));
    assert_eq!(harness.surface.seeks(), vec![180.0]);

    harness.tick(171.0, true);
    harness.tick(171.0, true);
    assert!(harness.surface.is_playing());

    let frame = harness.tick(176.0, true);
    assert_eq!(frame.phase, PreviewPhase::FinalCountdown);
    assert!(!frame.popup_visible);
    assert_eq!(frame.countdown, Some(4));
    assert!(harness.surface.is_playing());
}

#[test]
fn countdown_counts_whole_seconds_to_break_end() {
    let mut harness = Harness::new(instant());
    let samples = [(175.0, 5), (175.5, 5), (176.0, 4), (178.3, 2), (179.2, 1), (179.99, 1)];
    for (time, expected) in samples {
        assert_eq!(harness.tick(time, true).countdown, Some(expected), "at {time}");
    }
}

#[test]
fn one_seek_for_a_whole_break() {
    let mut harness = Harness::new(SimulatedSurfaceConfig {
        seek_latency_polls: 2,
        play_latency_polls: 1,
        reject_autoplay: false,
    });

    let last = (0..=350)
        .map(|step| {
            let frame = harness.tick(150.0 + step as f64 * 0.1, true);
            harness.surface.advance(0.1);
            frame
        })
        .last()
        .unwrap();

    assert_eq!(harness.surface.seeks(), vec![180.0]);
    assert_eq!(harness.sync.stats().seek_timeouts, 0);
    assert_eq!(last.phase, PreviewPhase::Idle);
    assert!(!harness.surface.is_playing());
}

#[test]
fn loops_back_when_preview_runs_past_its_window() {
    let mut harness = Harness::playing_in_last_break(instant());

    harness.surface.set_time(200.5);
    harness.tick(165.0, true);

    assert_eq!(harness.surface.seeks(), vec![180.0, 180.0]);
    assert!(harness.sync.is_seek_pending());
}

#[test]
fn reseeks_only_when_drift_exceeds_tolerance() {
    let mut harness = Harness::playing_in_last_break(instant());

    harness.surface.set_time(179.6);
    harness.tick(165.0, true);
    assert_eq!(harness.surface.seeks().len(), 1);

    harness.surface.set_time(170.0);
    harness.tick(165.1, true);
    assert_eq!(harness.surface.seeks(), vec![180.0, 180.0]);
}

#[test]
fn stuck_seek_times_out_and_playback_proceeds() {
    let mut harness = Harness::new(SimulatedSurfaceConfig {
        seek_latency_polls: 10_000,
        play_latency_polls: 0,
        reject_autoplay: false,
    });

    let mut clock = Duration::ZERO;
    while clock < Duration::from_millis(500) {
        harness.sync.tick(clock, 161.0, true);
        assert_eq!(harness.surface.play_calls(), 0);
        clock += TICK;
    }

    harness.sync.tick(clock, 161.0, true);
    assert_eq!(harness.sync.stats().seek_timeouts, 1);
    assert!(!harness.sync.is_seek_pending());
    assert_eq!(harness.surface.play_calls(), 1);

    harness.sync.tick(clock + TICK, 161.0, true);
    assert!(harness.surface.is_playing());
}

#[test]
fn autoplay_rejection_is_swallowed_and_retried() {
    let mut harness = Harness::new(SimulatedSurfaceConfig {
        reject_autoplay: true,
        ..instant()
    });

    harness.tick(161.0, true);
    harness.tick(161.1, true);
    let frame = harness.tick(161.2, true);

    assert_eq!(frame.phase, PreviewPhase::Approaching);
    assert_eq!(harness.sync.stats().play_rejections, 1);
    assert_eq!(harness.sync.stats().plays_issued, 2);
    assert!(!harness.surface.is_playing());

    harness.surface.set_reject_autoplay(false);
    harness.tick(161.3, true);
    assert!(harness.surface.is_playing());
}

#[test]
fn never_pauses_while_play_request_is_unresolved() {
    let mut harness = Harness::new(SimulatedSurfaceConfig {
        seek_latency_polls: 0,
        play_latency_polls: 5,
        reject_autoplay: false,
    });

    harness.tick(161.0, true);
    harness.tick(161.1, true);
    assert!(harness.sync.is_play_in_flight());

    for _ in 0..10 {
        harness.tick(161.2, false);
    }

    assert_eq!(harness.surface.pauses_during_play_request(), 0);
    assert_eq!(harness.surface.pause_calls(), 1);
    assert!(!harness.surface.is_playing());
    assert!(!harness.sync.is_play_in_flight());
}

#[test]
fn jumping_between_breaks_waits_for_play_request_before_seeking() {
    let mut harness = Harness::new(SimulatedSurfaceConfig {
        seek_latency_polls: 0,
        play_latency_polls: 5,
        reject_autoplay: false,
    });

    harness.tick(45.0, true);
    harness.tick(45.1, true);
    assert!(harness.sync.is_play_in_flight());

    let frame = harness.tick(101.0, true);
    assert_eq!(frame.next_label.as_deref(), Some("Exercise 3"));
    assert_eq!(harness.surface.seeks(), vec![60.0]);
    assert!(!harness.sync.is_seek_pending());

    for step in 1..=10 {
        harness.tick(101.0 + step as f64 * 0.1, true);
        if harness.sync.is_play_in_flight() {
            assert!(!harness.sync.is_seek_pending(), "seek raced a play at step {step}");
        }
    }

    assert_eq!(harness.surface.seeks(), vec![60.0, 120.0]);
    assert_eq!(harness.surface.pause_calls(), 1);
    assert_eq!(harness.surface.pauses_during_play_request(), 0);
}

#[test]
fn leaving_break_during_play_request_pauses_after_it_resolves() {
    let mut harness = Harness::new(SimulatedSurfaceConfig {
        seek_latency_polls: 0,
        play_latency_polls: 3,
        reject_autoplay: false,
    });

    harness.tick(179.0, true);
    harness.tick(179.5, true);
    assert!(harness.sync.is_play_in_flight());

    for step in 0..6 {
        harness.tick(180.0 + step as f64 * 0.1, true);
    }

    assert_eq!(harness.surface.pauses_during_play_request(), 0);
    assert!(!harness.surface.is_playing());
}

#[test]
fn preview_follows_primary_pause_and_resume() {
    let mut harness = Harness::playing_in_last_break(instant());

    let frame = harness.tick(162.0, false);
    assert_eq!(frame.phase, PreviewPhase::Approaching);
    assert!(!harness.surface.is_playing());
    assert_eq!(harness.surface.pause_calls(), 1);

    harness.tick(162.0, true);
    harness.tick(162.1, true);
    assert!(harness.surface.is_playing());
    assert_eq!(harness.surface.seeks().len(), 1);
}

#[test]
fn exit_animation_lasts_half_a_second() {
    let mut harness = Harness::playing_in_last_break(instant());

    let left_at = harness.clock;
    let frame = harness.sync.tick(left_at, 180.0, true);
    assert_eq!(frame.phase, PreviewPhase::ExitAnimating);
    assert!(!frame.popup_visible);
    assert!(!harness.surface.is_playing());

    let frame = harness
        .sync
        .tick(left_at + Duration::from_millis(499), 180.5, true);
    assert_eq!(frame.phase, PreviewPhase::ExitAnimating);

    let frame = harness
        .sync
        .tick(left_at + Duration::from_millis(500), 180.5, true);
    assert_eq!(frame.phase, PreviewPhase::Idle);
}

#[test]
fn seeking_back_into_a_break_repositions_the_preview() {
    let mut harness = Harness::playing_in_last_break(instant());

    harness.tick(181.0, true);
    harness.tick(165.0, true);

    assert_eq!(harness.surface.seeks(), vec![180.0, 180.0]);
}

#[test]
fn earlier_breaks_preview_their_own_exercise() {
    let mut harness = Harness::new(instant());

    let frame = harness.tick(45.0, true);
    assert_eq!(frame.next_label.as_deref(), Some("Exercise 2"));
    harness.tick(61.0, true);
    let frame = harness.tick(101.0, true);
    assert_eq!(frame.next_label.as_deref(), Some("Exercise 3"));

    assert_eq!(harness.surface.seeks(), vec![60.0, 120.0]);
}

#[test]
fn disabled_schedule_never_touches_the_preview() {
    let mut harness = Harness::with_schedule(BreakSchedule::disabled(), instant());

    for step in 0..200 {
        let frame = harness.tick(step as f64, true);
        assert_eq!(frame.phase, PreviewPhase::Idle);
        assert!(!frame.popup_visible);
    }

    assert!(harness.surface.seeks().is_empty());
    assert_eq!(harness.surface.play_calls(), 0);
}

#[test]
fn teardown_waits_for_play_request() {
    let mut harness = Harness::new(SimulatedSurfaceConfig {
        seek_latency_polls: 0,
        play_latency_polls: 2,
        reject_autoplay: false,
    });
    harness.tick(161.0, true);
    harness.tick(161.1, true);

    let clock = harness.clock;
    assert!(!harness.sync.teardown(clock));
    assert!(!harness.sync.teardown(clock + TICK));
    assert!(harness.sync.teardown(clock + TICK * 2));

    assert_eq!(harness.sync.phase(), PreviewPhase::Idle);
    assert_eq!(harness.surface.pauses_during_play_request(), 0);
    assert!(!harness.surface.is_playing());
}
