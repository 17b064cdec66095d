use std::path::PathBuf;

use anyhow::{Context, Result};
use chordtrace::analyzer::{BatchResult, Transcription};
use chordtrace::config::AppConfig;
use chordtrace::window::Pacing;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chordtrace", version, about = "Chord and key transcription from detected note streams")]
struct Cli {
    /// Path to a config file (default: ~/.config/chordtrace/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug)]
enum WindowArg {
    Auto,
    Seconds(f64),
}

fn parse_window(value: &str) -> std::result::Result<WindowArg, String> {
    if value.eq_ignore_ascii_case("auto") {
        return Ok(WindowArg::Auto);
    }
    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Ok(WindowArg::Seconds(seconds)),
        Ok(_) => Err(format!("window width must be positive, got {}", value)),
        Err(_) => Err(format!("expected 'auto' or a width in seconds, got '{}'", value)),
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Transcribe note files (.json, .mid) into chord events and a key
    Analyze {
        /// Note files or directories to search
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Window width: 'auto' or seconds (overrides config)
        #[arg(short, long, value_parser = parse_window)]
        window: Option<WindowArg>,

        /// Number of parallel workers (0 = auto-detect from config)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: usize,

        /// Emit JSON instead of the text report
        #[arg(long)]
        json: bool,

        /// Also list every active window's chord segment
        #[arg(long)]
        segments: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let mut config = AppConfig::load(cli.config.as_deref());

    match cli.command {
        Commands::Analyze {
            paths,
            window,
            jobs,
            json,
            segments,
        } => {
            match window {
                Some(WindowArg::Auto) => config.analysis.window_width = None,
                Some(WindowArg::Seconds(seconds)) => config.analysis.window_width = Some(seconds),
                None => {}
            }

            let files = chordtrace::input::collect_inputs(&paths);
            if files.is_empty() {
                anyhow::bail!("No note files found (supported: .json, .mid, .midi)");
            }

            let workers = if jobs > 0 { jobs } else { config.resolve_workers() };
            let batch = chordtrace::analyzer::analyze_files(&files, &config.analysis, workers)
                .context("Analysis failed")?;

            if json {
                print_json(&batch).context("Failed to write JSON report")?;
            } else {
                print_report(&batch, segments);
            }

            if batch.analyzed == 0 {
                anyhow::bail!("All {} files failed to analyze", batch.failed);
            }
        }

        Commands::Config => {
            let text = toml::to_string_pretty(&config).context("Failed to serialize config")?;
            if let Some(path) = AppConfig::config_path() {
                println!("# {}", path.display());
            }
            print!("{}", text);
        }
    }

    Ok(())
}

fn print_json(batch: &BatchResult) -> Result<()> {
    let files: Vec<serde_json::Value> = batch
        .files
        .iter()
        .map(|file| match &file.outcome {
            Ok(t) => serde_json::json!({
                "path": file.path.display().to_string(),
                "transcription": t,
                "plays": t.play_summary()
                    .iter()
                    .map(|(chord, plays)| serde_json::json!({ "chord": chord, "plays": plays }))
                    .collect::<Vec<_>>(),
            }),
            Err(e) => serde_json::json!({
                "path": file.path.display().to_string(),
                "error": e.to_string(),
            }),
        })
        .collect();

    let out = serde_json::to_string_pretty(&files)?;
    println!("{}", out);
    Ok(())
}

fn print_report(batch: &BatchResult, show_segments: bool) {
    for file in &batch.files {
        println!("== {} ==", file.path.display());
        match &file.outcome {
            Ok(t) => print_transcription(t, show_segments),
            Err(e) => println!("  error: {}", e),
        }
        println!();
    }

    if batch.files.len() > 1 {
        println!(
            "Analysis complete: {} analyzed, {} failed",
            batch.analyzed, batch.failed
        );
    }
}

fn print_transcription(t: &Transcription, show_segments: bool) {
    let sizing = &t.sizing;
    match (sizing.pacing, sizing.mean_gap) {
        (Pacing::Manual, _) => println!("Windows: {:.2}s (fixed)", sizing.width),
        (pacing, Some(gap)) => println!(
            "Windows: {:.2}s ({:?}, {} strikes, mean gap {:.2}s)",
            sizing.width, pacing, sizing.strikes, gap
        ),
        (pacing, None) => println!(
            "Windows: {:.2}s ({:?}, {} strikes)",
            sizing.width, pacing, sizing.strikes
        ),
    }
    println!(
        "Notes: {} raw, {} after cleanup, {} after filtering; {} of {} windows active",
        t.stats.raw_notes,
        t.stats.normalized_notes,
        t.stats.filtered_notes,
        t.stats.active_windows,
        t.stats.windows
    );

    if show_segments {
        println!();
        println!("Segments:");
        for seg in &t.segments {
            println!(
                "  {} - {}  {:<7} ({} notes)",
                format_time(seg.start),
                format_time(seg.end),
                seg.chord,
                seg.note_count
            );
        }
    }

    println!();
    if t.events.is_empty() {
        println!("No chords detected");
    } else {
        println!("{:>4}  {:<15}  {:<7} {:>5}  {:>7}  {:>5}", "#", "Time", "Chord", "Play", "Length", "Notes");
        println!("{}", "-".repeat(52));
        for (i, event) in t.events.iter().enumerate() {
            println!(
                "{:>4}  {} - {}  {:<7} {:>5}  {:>6.1}s  {:>5}",
                i + 1,
                format_time(event.start),
                format_time(event.end),
                event.chord,
                format!("#{}", event.play_number),
                event.duration,
                event.total_notes
            );
        }

        let plays: Vec<String> = t
            .play_summary()
            .iter()
            .map(|(chord, plays)| format!("{} ×{}", chord, plays))
            .collect();
        println!();
        println!("Plays: {}", plays.join(", "));
    }

    println!("Key: {}", t.key);
}

/// Seconds as `MM:SS`, truncated to the whole second.
fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
