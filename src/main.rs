use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use repcast_lib::playback::{
    BreakSchedule, PlaybackSynchronizer, PreviewSurface, RecoveryAction, SimulatedSurface,
    SimulatedSurfaceConfig, StallRecovery, StartCountdown, SyncFrame,
};
use repcast_lib::{
    generate, init_logging, AppState, GeneratorConfig, PersistedSegments, SettingsStore,
    SETTINGS_FILE_NAME,
};

#[derive(Debug, Parser)]
#[command(name = "repcast")]
#[command(about = "Workout video segmentation and break preview tooling")]
struct Cli {
    /// Directory holding the SQLite store and settings file.
    #[arg(long, global = true, default_value = ".repcast")]
    data_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print an exercise/break plan for a video of the given length.
    Generate {
        #[command(flatten)]
        plan: PlanArgs,
        /// Commit the plan for this video id instead of only printing it.
        #[arg(long)]
        save: Option<String>,
    },
    /// Drive the break preview against a simulated surface and print what a
    /// viewer would see.
    Simulate {
        #[command(flatten)]
        plan: PlanArgs,
        /// Use the committed segments for this video id instead of a fresh plan.
        #[arg(long)]
        video: Option<String>,
        #[command(flatten)]
        run: SimulationArgs,
    },
    /// Print the overlays of a committed video at one instant, faded with the
    /// stored overlay settings.
    Overlays {
        #[arg(long)]
        video: String,
        /// Playback position in seconds, as the editor preview shows it.
        #[arg(long, conflicts_with = "frame")]
        at: Option<f64>,
        /// Output frame number, as the renderer bakes it.
        #[arg(long)]
        frame: Option<u32>,
    },
    /// Feed playback positions through the progress tracker and store the result.
    Progress {
        #[arg(long)]
        video: String,
        #[arg(long)]
        duration: f64,
        /// Playback positions in seconds, in order.
        times: Vec<f64>,
        #[arg(long)]
        ended: bool,
        /// Close the player at this position after the time updates.
        #[arg(long)]
        close_at: Option<f64>,
    },
    /// Show or change player settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Debug, clap::Args)]
struct PlanArgs {
    #[arg(long, default_value_t = 185.0)]
    duration: f64,
    #[arg(long, default_value_t = 40.0)]
    exercise: f64,
    #[arg(long = "break", default_value_t = 20.0)]
    break_secs: f64,
    #[arg(long, default_value_t = 0.0)]
    first_start: f64,
    #[arg(long, default_value = "Exercise")]
    name_template: String,
    #[arg(long, default_value = "Break")]
    break_name: String,
}

impl PlanArgs {
    fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            total_duration_secs: self.duration,
            exercise_secs: self.exercise,
            break_secs: self.break_secs,
            first_start_secs: self.first_start,
            exercise_name_template: self.name_template.clone(),
            break_name: self.break_name.clone(),
        }
    }
}

#[derive(Debug, clap::Args)]
struct SimulationArgs {
    #[arg(long, default_value_t = 0.0)]
    from: f64,
    #[arg(long)]
    to: Option<f64>,
    #[arg(long, default_value_t = 0.1)]
    step: f64,
    #[arg(long, default_value_t = 2)]
    seek_latency: u32,
    #[arg(long, default_value_t = 1)]
    play_latency: u32,
    #[arg(long)]
    reject_autoplay: bool,
    /// Freeze the primary clock here until stall recovery steps in.
    #[arg(long)]
    stall_at: Option<f64>,
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    Show,
    /// Merge a JSON object of camelCase fields into the stored settings.
    Set { patch: String },
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { plan, save } => run_generate(&cli.data_dir, &plan, save).await,
        Commands::Simulate { plan, video, run } => {
            let persisted = match video {
                Some(video_id) => AppState::open(&cli.data_dir)?
                    .db
                    .get_video_segments(&video_id)
                    .await?
                    .map(|stored| stored.segments)
                    .with_context(|| format!("no committed segments for {video_id}"))?,
                None => PersistedSegments::from(&generate(&plan.config())?),
            };
            let to = run.to.unwrap_or(plan.duration);
            run_simulate(&cli.data_dir, &persisted, &run, to)
        }
        Commands::Overlays { video, at, frame } => {
            run_overlays(&cli.data_dir, &video, at, frame).await
        }
        Commands::Progress {
            video,
            duration,
            times,
            ended,
            close_at,
        } => run_progress(&cli.data_dir, &video, duration, &times, ended, close_at).await,
        Commands::Settings { action } => run_settings(&cli.data_dir, action),
    }
}

async fn run_generate(data_dir: &Path, plan: &PlanArgs, save: Option<String>) -> Result<()> {
    let segments = generate(&plan.config())?;
    let persisted = PersistedSegments::from(&segments);

    if let Some(video_id) = save {
        let state = AppState::open(data_dir)?;
        state
            .db
            .save_video_segments(&video_id, &persisted, &[], None)
            .await?;
        log::info!("saved {} segments for {video_id}", segments.len());
    }

    println!("{}", serde_json::to_string_pretty(&segments)?);
    Ok(())
}

fn run_simulate(
    data_dir: &Path,
    persisted: &PersistedSegments,
    run: &SimulationArgs,
    to: f64,
) -> Result<()> {
    if !(run.step > 0.0) || !run.step.is_finite() {
        bail!("step must be a positive number of seconds, got {}", run.step);
    }
    if to < run.from {
        bail!("--to ({to}) is before --from ({})", run.from);
    }

    let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE_NAME))?.player();
    let surface = SimulatedSurface::new(SimulatedSurfaceConfig {
        seek_latency_polls: run.seek_latency,
        play_latency_polls: run.play_latency,
        reject_autoplay: run.reject_autoplay,
    });
    let handle = surface.clone();
    let mut sync = PlaybackSynchronizer::new(
        surface,
        BreakSchedule::from_persisted(Some(persisted)),
        settings.sync_tuning(),
    );
    let mut start_countdown = StartCountdown::choose(
        persisted.first_exercise_start(),
        settings.start_countdown_secs,
    );
    let mut recovery = StallRecovery::new(settings.recovery_policy());

    let mut last = SyncFrame::default();
    let mut last_countdown = None;
    let mut stalled = false;
    let mut stall_pending = run.stall_at;
    let mut clock = Duration::ZERO;
    let mut primary = run.from;
    let tick = Duration::from_secs_f64(run.step);

    while primary <= to {
        let start = start_countdown.sample(clock, primary);
        if start.value != last_countdown {
            if let Some(value) = start.value {
                let mode = if start.hold_playback { "hold" } else { "preroll" };
                println!("{primary:>8.2}s  start countdown {value} ({mode})");
            }
            last_countdown = start.value;
        }
        let playing = !start.hold_playback;

        if let Some(stall_at) = stall_pending {
            if primary >= stall_at {
                println!("{primary:>8.2}s  primary stalled");
                stalled = true;
                stall_pending = None;
            }
        }
        match recovery.observe(clock, primary, playing) {
            Some(RecoveryAction::Nudge { to }) => {
                println!("{primary:>8.2}s  recovery: nudge to {to:.2}s");
                primary = to;
                stalled = false;
            }
            Some(RecoveryAction::Reload { resume_at }) => {
                println!("{primary:>8.2}s  recovery: reload at {resume_at:.2}s");
                stalled = false;
            }
            None => {}
        }

        let frame = sync.tick(clock, primary, playing);
        if frame.phase != last.phase
            || frame.countdown != last.countdown
            || frame.popup_visible != last.popup_visible
        {
            println!(
                "{primary:>8.2}s  {:<15} popup={:<5} countdown={:<4} preview={:.2}s next={}",
                format!("{:?}", frame.phase),
                frame.popup_visible,
                frame
                    .countdown
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".into()),
                handle.current_time(),
                frame.next_label.as_deref().unwrap_or("-"),
            );
        }
        last = frame;

        handle.advance(run.step);
        clock += tick;
        if playing && !stalled {
            primary += run.step;
        }
    }

    println!("{}", serde_json::to_string_pretty(&sync.stats())?);
    Ok(())
}

async fn run_overlays(
    data_dir: &Path,
    video_id: &str,
    at: Option<f64>,
    frame: Option<u32>,
) -> Result<()> {
    let state = AppState::open(data_dir)?;
    let active = match (at, frame) {
        (Some(now), _) => state.preview_overlays(video_id, now).await?,
        (None, Some(frame)) => state.bake_overlays(video_id, frame).await?,
        (None, None) => bail!("pass --at <seconds> or --frame <n>"),
    };
    println!("{}", serde_json::to_string_pretty(&active)?);
    Ok(())
}

async fn run_progress(
    data_dir: &Path,
    video_id: &str,
    duration: f64,
    times: &[f64],
    ended: bool,
    close_at: Option<f64>,
) -> Result<()> {
    let state = AppState::open(data_dir)?;
    let resumed = state.progress.load(&state.db, video_id).await?;
    println!("resuming {video_id} at {resumed}%");

    for &time in times {
        state.progress.on_time_update(time, duration, video_id).await;
    }
    if let Some(time) = close_at {
        state.progress.on_close(time, duration, video_id).await;
    }
    if ended {
        state.progress.on_ended(video_id).await;
    }

    let expected = state.progress.last_saved(video_id).await;
    let stored = wait_for_checkpoint(&state, video_id, expected).await?;
    println!("stored checkpoint for {video_id}: {stored}%");
    Ok(())
}

/// Checkpoint writes run in the background; wait briefly for the last one.
async fn wait_for_checkpoint(state: &AppState, video_id: &str, expected: u8) -> Result<u8> {
    let mut stored = 0;
    for _ in 0..100 {
        stored = state.db.get_checkpoint(video_id).await?.unwrap_or(0);
        if stored >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(stored)
}

fn run_settings(data_dir: &Path, action: SettingsAction) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let store = SettingsStore::new(data_dir.join(SETTINGS_FILE_NAME))?;

    match action {
        SettingsAction::Show => {}
        SettingsAction::Reset => store.update(Default::default())?,
        SettingsAction::Set { patch } => {
            let patch: serde_json::Value =
                serde_json::from_str(&patch).context("settings patch is not valid JSON")?;
            let serde_json::Value::Object(fields) = patch else {
                bail!("settings patch must be a JSON object");
            };

            let mut current = serde_json::to_value(store.player())?;
            if let serde_json::Value::Object(existing) = &mut current {
                existing.extend(fields);
            }
            let updated = serde_json::from_value(current).context("invalid settings value")?;
            store.update(updated)?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&store.player())?);
    Ok(())
}
