use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use riffcheck::analysis::{Metric, gap_stats};
use riffcheck::backend::{AnalysisClient, MediaClient, ViewScope};
use riffcheck::chart::{ChartPoints, MarkerHover, YAxis};
use riffcheck::config::AppConfig;
use riffcheck::pipeline::{ChartFrame, ComparisonView, Overlay, ViewState, load_view};
use riffcheck::playback::{ClockFactory, DualTransport, Transport, WaveformOptions};
use riffcheck::render::{RenderOptions, write_svg};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "riffcheck", version, about = "Compare a guitar take against its reference recording")]
struct Cli {
    /// Config file (defaults to ~/.config/riffcheck/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where the analysis result comes from.
#[derive(Args)]
struct InputArgs {
    /// Saved analysis result (JSON)
    #[arg(required_unless_present = "task", conflicts_with = "task")]
    file: Option<PathBuf>,

    /// Fetch the result for this task id from the analysis backend
    #[arg(long)]
    task: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Buffering {
    /// Both tracks ready
    None,
    /// User take still buffering
    User,
    /// Reference track still buffering
    Reference,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the aligned reference/user series for one metric
    Compare {
        #[command(flatten)]
        input: InputArgs,

        /// pitch, rhythm or technique
        #[arg(short, long, default_value = "pitch")]
        metric: Metric,
    },

    /// Render a comparison chart to SVG
    Render {
        #[command(flatten)]
        input: InputArgs,

        /// pitch, rhythm or technique
        #[arg(short, long, default_value = "pitch")]
        metric: Metric,

        /// Output file
        #[arg(short, long)]
        out: PathBuf,

        /// Chart width in pixels (overrides config)
        #[arg(long)]
        width: Option<f64>,

        /// Chart height in pixels (overrides config)
        #[arg(long)]
        height: Option<f64>,

        /// Highlight the mismatch marker at this sample index (technique only)
        #[arg(long)]
        hover: Option<usize>,
    },

    /// Show scores and feedback for a result
    Scores {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Summarize every saved result in a directory
    Report {
        /// Directory to scan for *.json results
        dir: PathBuf,

        /// Number of parallel workers (0 = auto-detect from config)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: usize,
    },

    /// Show song metadata and asset URLs from the media backend
    Song {
        song_id: String,
    },

    /// Dry-run synchronized playback of a take against a song's reference audio
    SyncCheck {
        song_id: String,

        /// User recording URL or path
        user_audio: String,

        /// Media duration to simulate, in seconds
        #[arg(long, default_value = "30", value_parser = parse_duration)]
        duration: f64,

        /// Playback rate (0.5 - 2.0, overrides config)
        #[arg(long)]
        rate: Option<f64>,

        /// Simulate a track that hasn't finished buffering
        #[arg(long, value_enum, default_value = "none")]
        buffering: Buffering,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Compare { input, metric } => {
            let view = load_input(&input, &config)?;
            let frame = view.frame(metric, &config.chart);
            if frame.domain.is_empty() {
                println!("No {} data in this result.", metric.label());
                return Ok(());
            }
            print_frame(&frame);
        }

        Commands::Render { input, metric, out, width, height, hover } => {
            let view = load_input(&input, &config)?;
            let mut chart = config.chart;
            if let Some(w) = width {
                chart.width = w;
            }
            if let Some(h) = height {
                chart.height = h;
            }

            let frame = view.frame(metric, &chart);
            let mut marker_hover = MarkerHover::default();
            if let Some(index) = hover {
                marker_hover.enter(index);
            }
            let options = RenderOptions {
                title: format!("{} comparison", metric.label()),
                hover: marker_hover,
            };

            let file = std::fs::File::create(&out)
                .with_context(|| format!("Failed to create {}", out.display()))?;
            let mut writer = std::io::BufWriter::new(file);
            write_svg(&mut writer, &frame, &options)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Wrote {} chart to {}", metric.label(), out.display());
        }

        Commands::Scores { input } => {
            let view = load_input(&input, &config)?;
            let result = view.result();
            let s = &result.scores;
            println!("Overall:  {:>5.1}", s.overall_score);
            println!("Pitch:    {:>5.1}%", s.pitch_match_percentage);
            println!("Rhythm:   {:>5.1}%", s.rhythm_match_percentage);
            println!("Tempo:    {:>5.1}%", s.tempo_match_percentage);
            if !result.feedback.is_empty() {
                println!();
                println!("{}", result.feedback);
            }
        }

        Commands::Report { dir, jobs } => {
            let workers = if jobs > 0 { jobs } else { config.resolve_workers() };
            let report = riffcheck::report::summarize_dir(&dir, workers, config.resolve_step())
                .context("Report failed")?;

            if report.summaries.is_empty() {
                println!("No analysis results found in {}.", dir.display());
                return Ok(());
            }
            print_report(&report.summaries);
            if report.failed > 0 {
                println!();
                println!("{} files could not be parsed (run with -v for details)", report.failed);
            }
        }

        Commands::Song { song_id } => {
            let media = MediaClient::new(&config.backend);
            let song = media.song(&song_id).context("Song lookup failed")?;
            println!("{} by {}", song.title, song.artist);
            println!("Cover:    {}", media.cover_url(&song));
            if !song.audio.is_empty() {
                println!("Audio:    {}", media.resolve(&song.audio));
            }
            println!("Download: {}", media.audio_url(&song_id)?);
            println!("Notation: {}", media.notation_url(&song_id)?);
        }

        Commands::SyncCheck { song_id, user_audio, duration, rate, buffering } => {
            let media = MediaClient::new(&config.backend);
            let reference_url = media.audio_url(&song_id)?;

            let mut factory = ClockFactory::new(duration);
            let options = WaveformOptions {
                width_px: config.playback.width_px,
                ..Default::default()
            };
            let mut dual = DualTransport::open(&mut factory, &user_audio, &reference_url, &options)
                .context("Failed to open transports")?;
            let rate = dual.set_playback_rate(rate.unwrap_or(config.playback.playback_rate));

            match buffering {
                Buffering::None => {}
                Buffering::User => dual.user_mut().set_buffered(false),
                Buffering::Reference => dual.reference_mut().set_buffered(false),
            }

            let outcome = dual.play_both();
            for notice in dual.take_notices() {
                println!("Notice: {}", notice.message);
            }
            println!(
                "Started: {:?} at {:.2}x, width {}px",
                outcome.toggled,
                rate,
                dual.width()
            );

            println!("{:>6} {:>8} {:>8} {:>7}", "Tick", "User", "Ref", "Drift");
            let mut tick = 0;
            while dual.user().state().is_playing || dual.reference().state().is_playing {
                tick += 1;
                dual.user_mut().advance(1.0);
                dual.reference_mut().advance(1.0);
                if tick % 5 == 0 {
                    let pos = dual.positions();
                    println!(
                        "{:>6} {:>8.2} {:>8.2} {:>+7.3}",
                        tick,
                        pos.user,
                        pos.reference,
                        pos.drift()
                    );
                }
            }
            dual.close();
        }
    }

    Ok(())
}

/// Parse a finite, non-negative number of seconds.
fn parse_duration(s: &str) -> std::result::Result<f64, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("expected a finite number of seconds >= 0, got {s}"));
    }
    Ok(secs)
}

/// Load the analysis result from a file or the analysis backend.
fn load_input(input: &InputArgs, config: &AppConfig) -> Result<ComparisonView> {
    let step = config.resolve_step();

    if let Some(task) = &input.task {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;
        let client = Arc::new(AnalysisClient::new(&config.backend));
        let scope = ViewScope::new();

        return match rt.block_on(load_view(&scope, client, task, step)) {
            ViewState::Ready(view) => Ok(view),
            ViewState::NoResults(reason) => anyhow::bail!("No results for task {task}: {reason}"),
            ViewState::Cancelled | ViewState::Loading => {
                anyhow::bail!("Fetch for task {task} did not complete")
            }
        };
    }

    let path = input
        .file
        .as_ref()
        .context("Pass a result file or --task <ID>")?;
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let result = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(ComparisonView::new(result, step))
}

/// Print the aligned series and a summary of the overlay.
fn print_frame(frame: &ChartFrame) {
    match &frame.domain.points {
        ChartPoints::Line(points) => {
            println!("{:>6} {:>10} {:>10} {:>8}", "Sec", "Reference", "User", "Gap");
            println!("{}", "-".repeat(37));
            for p in points {
                let fmt = |v: Option<f64>| v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into());
                let gap = match (p.original, p.played) {
                    (Some(o), Some(u)) => format!("{:+.2}", u - o),
                    _ => "-".into(),
                };
                println!(
                    "{:>6.1} {:>10} {:>10} {:>8}",
                    p.second,
                    fmt(p.original),
                    fmt(p.played),
                    gap
                );
            }
        }
        ChartPoints::Technique(series) => {
            println!("{:>6} {:<24} {:<24}", "Sec", "Reference", "User");
            println!("{}", "-".repeat(56));
            for s in &frame.samples {
                let fmt = |v: &Option<riffcheck::analysis::SampleValue>| {
                    v.as_ref().map(|v| v.labels().join("+")).unwrap_or_else(|| "-".into())
                };
                println!("{:>6.1} {:<24} {:<24}", s.second, fmt(&s.original), fmt(&s.played));
            }
            println!();
            println!(
                "Matched: {}  Mismatched: {}  Skipped: {}",
                series.matched.len(),
                series.mismatched(),
                series.skipped
            );
        }
    }

    println!();
    if let YAxis::Continuous { domain, ticks } = &frame.domain.y_axis {
        println!(
            "Y domain: [{:.2}, {:.2}] ({} ticks)",
            domain[0],
            domain[1],
            ticks.len()
        );
    }

    match &frame.overlay {
        Overlay::Divergence(regions) => {
            let stats = gap_stats(&frame.samples);
            println!(
                "Divergence bands: {}  Mean gap: {:.2}  Max gap: {:.2}",
                regions.len(),
                stats.mean_abs_gap,
                stats.max_abs_gap
            );
        }
        Overlay::Mismatch(overlays) => {
            let seconds: Vec<String> = overlays
                .iter()
                .map(|o| format!("{:.1}s", o.marker.second))
                .collect();
            if !seconds.is_empty() {
                println!("Mismatches at: {}", seconds.join(", "));
            }
        }
    }
}

/// Print a table of per-result summaries.
fn print_report(summaries: &[riffcheck::report::ResultSummary]) {
    println!(
        "{:<30} {:>5} {:>5} {:>5} {:>7} {:>7} {:>6}",
        "Result", "Ovr", "Pit%", "Rhy%", "PitGap", "RhyGap", "TqMis"
    );
    println!("{}", "-".repeat(72));

    for s in summaries {
        let name = s
            .path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();
        // Truncate long names
        let name: String = if name.chars().count() > 30 {
            format!("{}...", name.chars().take(27).collect::<String>())
        } else {
            name
        };

        println!(
            "{:<30} {:>5.1} {:>5.1} {:>5.1} {:>7.2} {:>7.3} {:>3}/{:<3}",
            name,
            s.scores.overall_score,
            s.scores.pitch_match_percentage,
            s.scores.rhythm_match_percentage,
            s.pitch.mean_abs_gap,
            s.rhythm.mean_abs_gap,
            s.technique_mismatches,
            s.technique_samples,
        );
    }

    println!();
    println!("Ovr=Overall  Pit%/Rhy%=Match percentages  PitGap/RhyGap=Mean absolute gap");
    println!("TqMis=Technique mismatches / samples");
}
