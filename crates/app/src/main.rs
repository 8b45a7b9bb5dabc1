use std::{path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use fuelmix_core::{
    render_sequence, AppConfig, EasingCurve, PeriodManifest, Recorder, RecordingSettings,
    SegmentPlan, Sequencer, TitleStyle,
};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Sequence {
            input,
            output,
            no_values,
            timing,
        } => run_sequence(&input, output, no_values, &timing),
        Commands::Plan {
            input,
            json,
            timing,
        } => run_plan(&input, json, &timing),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_sequence(
    input: &PathBuf,
    output: PathBuf,
    no_values: bool,
    timing: &TimingArgs,
) -> fuelmix_core::Result<()> {
    let config = timing.resolve()?;
    let manifest = PeriodManifest::from_path(input)?;
    tracing::info!(?input, periods = manifest.periods.len(), "loaded periods");

    let sequencer = Sequencer::new(config.sequence.clone())?;
    let sequence = sequencer.build(&manifest.periods)?;
    tracing::info!(
        frames = sequence.len(),
        seconds = sequence.duration_seconds(),
        columns = ?sequence.columns(),
        "sequence ready"
    );

    // Only touch the output once the whole sequence has been built.
    let mut recorder = Recorder::create(RecordingSettings {
        output_path: output,
        include_values: !no_values,
    })?;
    render_sequence(&sequence, &config.style, &mut recorder)?;
    tracing::info!(
        output = ?recorder.settings().output_path,
        frames = recorder.frames_written(),
        "frame manifest written"
    );
    Ok(())
}

fn run_plan(input: &PathBuf, json: bool, timing: &TimingArgs) -> fuelmix_core::Result<()> {
    let config = timing.resolve()?;
    let manifest = PeriodManifest::from_path(input)?;
    let sequencer = Sequencer::new(config.sequence.clone())?;
    let plan = sequencer.plan(&manifest.periods)?;

    let frames: usize = plan.iter().map(SegmentPlan::frame_count).sum();
    let seconds = frames as f64 / config.sequence.fps;
    tracing::info!(periods = plan.len(), frames, seconds, "planned sequence");

    if json {
        let report = serde_json::json!({
            "fps": config.sequence.fps,
            "frames": frames,
            "seconds": seconds,
            "segments": plan,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{:<16} {:>8} {:>12}", "period", "held", "transition");
    for segment in &plan {
        println!(
            "{:<16} {:>8} {:>12}",
            segment.label, segment.held_frames, segment.transition_frames
        );
    }
    println!("{frames} frames, {seconds:.2} s at {} fps", config.sequence.fps);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Frame sequencer for generation-mix animations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the full frame sequence and write it as a JSON-lines manifest.
    Sequence {
        /// Period manifest (`{ "periods": [...] }`) produced by data preparation.
        input: PathBuf,
        /// Output path for the frame manifest.
        output: PathBuf,
        /// Leave per-frame values out of the manifest.
        #[arg(long)]
        no_values: bool,
        #[command(flatten)]
        timing: TimingArgs,
    },
    /// Validate the periods and report how many frames each one contributes.
    Plan {
        /// Period manifest (`{ "periods": [...] }`) produced by data preparation.
        input: PathBuf,
        /// Print the plan as JSON instead of a table.
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        timing: TimingArgs,
    },
}

/// Timing options. Flags win over the configuration file.
#[derive(Args, Debug)]
struct TimingArgs {
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Playback frame rate.
    #[arg(long)]
    fps: Option<f64>,
    /// Seconds spent morphing between consecutive periods.
    #[arg(long)]
    transition: Option<f64>,
    /// Default seconds each period is held on screen.
    #[arg(long)]
    pause: Option<f64>,
    /// Per-label hold, e.g. `--pause-for 2025=3`. Repeatable.
    #[arg(long = "pause-for", value_name = "LABEL=SECONDS", value_parser = parse_pause_override)]
    pause_for: Vec<(String, f64)>,
    /// Transition titles: `source` or `composite`.
    #[arg(long)]
    title: Option<TitleStyle>,
    /// Easing applied to the blend fraction.
    #[arg(long)]
    easing: Option<EasingCurve>,
}

impl TimingArgs {
    fn resolve(&self) -> fuelmix_core::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::debug!(?path, "reading configuration");
                AppConfig::from_path(path)?
            }
            None => AppConfig::default(),
        };

        let sequence = &mut config.sequence;
        if let Some(fps) = self.fps {
            sequence.fps = fps;
        }
        if let Some(seconds) = self.transition {
            sequence.transition_seconds = seconds;
        }
        if let Some(seconds) = self.pause {
            sequence.pause.default_seconds = seconds;
        }
        for (label, seconds) in &self.pause_for {
            sequence.pause.overrides.insert(label.clone(), *seconds);
        }
        if let Some(style) = self.title {
            sequence.title_style = style;
        }
        if let Some(easing) = self.easing {
            sequence.easing = easing;
        }

        sequence.validate()?;
        tracing::debug!(
            fps = sequence.fps,
            transition = sequence.transition_seconds,
            titles = %sequence.title_style,
            easing = %sequence.easing,
            "timing resolved"
        );
        Ok(config)
    }
}

fn parse_pause_override(raw: &str) -> Result<(String, f64), String> {
    let (label, seconds) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=SECONDS, got `{raw}`"))?;
    let seconds = seconds
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("invalid seconds in `{raw}`: {err}"))?;
    Ok((label.trim().to_string(), seconds))
}
