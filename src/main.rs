//! Gaze Prep CLI
//!
//! Gaze time-series windowing and class rebalancing for screening datasets.

use chrono::Utc;
use clap::{Parser, Subcommand};
use gaze_prep::{
    config::Config,
    core::compute_features,
    dataset::{self, ClassStatistics, ExportFormat},
    Pipeline, VERSION,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "gaze-prep")]
#[command(version = VERSION)]
#[command(about = "Gaze time-series windowing and class rebalancing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn recordings into dataset rows
    Process {
        /// Recordings CSV
        #[arg(long, short)]
        input: PathBuf,

        /// Output file (defaults to a timestamped file in the export path)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Output format (csv or jsonl)
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Longest tolerated gap of missing frames, in seconds
        #[arg(long)]
        gap_tolerance: Option<f64>,

        /// Minimum valid duration of an NT window, in seconds
        #[arg(long)]
        min_window: Option<f64>,

        /// Worker threads
        #[arg(long)]
        workers: Option<usize>,

        /// Upsample NT subjects after expansion
        #[arg(long)]
        rebalance: bool,

        /// Seed for rebalancing
        #[arg(long)]
        seed: Option<u64>,

        /// Skip malformed recordings instead of failing on the first one
        #[arg(long)]
        skip_malformed: bool,
    },

    /// Upsample NT subjects of an existing row table
    Rebalance {
        /// Rows CSV
        #[arg(long, short)]
        input: PathBuf,

        /// Output CSV
        #[arg(long, short)]
        output: PathBuf,

        /// Seed for sampling
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Split a row table by subject
    Split {
        /// Rows CSV
        #[arg(long, short)]
        input: PathBuf,

        /// Directory for the split tables
        #[arg(long)]
        output_dir: PathBuf,

        /// Seed for shuffling subjects
        #[arg(long)]
        seed: Option<u64>,

        /// Write k grouped folds instead of train/val/test
        #[arg(long)]
        folds: Option<usize>,
    },

    /// Show class statistics of a row table
    Stats {
        /// Rows CSV
        #[arg(long, short)]
        input: PathBuf,
    },

    /// Show windows and gaze features of each recording
    Inspect {
        /// Recordings CSV
        #[arg(long, short)]
        input: PathBuf,
    },

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "gaze_prep=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            format,
            gap_tolerance,
            min_window,
            workers,
            rebalance,
            seed,
            skip_malformed,
        } => {
            let mut config = load_config();
            if let Some(s) = gap_tolerance {
                config.gap_tolerance_secs = s;
            }
            if let Some(s) = min_window {
                config.min_window_secs = s;
            }
            if let Some(n) = workers {
                config.workers = n;
            }
            if let Some(seed) = seed {
                config.seed = seed;
            }
            cmd_process(&config, &input, output, format, rebalance, skip_malformed);
        }
        Commands::Rebalance {
            input,
            output,
            seed,
        } => {
            let config = load_config();
            cmd_rebalance(&input, &output, seed.unwrap_or(config.seed));
        }
        Commands::Split {
            input,
            output_dir,
            seed,
            folds,
        } => {
            let config = load_config();
            cmd_split(&config, &input, &output_dir, seed.unwrap_or(config.seed), folds);
        }
        Commands::Stats { input } => {
            cmd_stats(&input);
        }
        Commands::Inspect { input } => {
            cmd_inspect(&load_config(), &input);
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config, using defaults: {e}");
            Config::default()
        }
    }
}

fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("Error {context}: {error}");
    std::process::exit(1);
}

fn cmd_process(
    config: &Config,
    input: &Path,
    output: Option<PathBuf>,
    format: ExportFormat,
    rebalance: bool,
    skip_malformed: bool,
) {
    if let Err(e) = config.validate() {
        fail("in parameters", e);
    }

    println!("Gaze Prep v{VERSION}");
    println!();
    println!("  Frame rate: {} fps", config.frame_rate);
    println!("  Gap tolerance: {}s", config.gap_tolerance_secs);
    println!("  Minimum NT window: {}s", config.min_window_secs);
    println!("  Workers: {}", config.workers);
    println!(
        "  Rebalancing: {}",
        if rebalance {
            format!("enabled (seed {})", config.seed)
        } else {
            "disabled".to_string()
        }
    );
    println!();

    let pipeline = Pipeline::from_config(config).with_skip_malformed(skip_malformed);
    let recordings = dataset::read_recording_results(input)
        .and_then(|loaded| pipeline.admit(loaded))
        .unwrap_or_else(|e| fail("reading recordings", e));

    let rows = pipeline
        .process(&recordings)
        .unwrap_or_else(|e| fail("processing recordings", e));
    let rows = if rebalance {
        pipeline.rebalance(rows, config.seed)
    } else {
        rows
    };

    let output_path = output.unwrap_or_else(|| {
        config.export_path.join(format!(
            "dataset_{}.{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            format.extension()
        ))
    });

    let result = match format {
        ExportFormat::Csv => dataset::write_rows(&output_path, &rows),
        ExportFormat::Jsonl => dataset::write_rows_jsonl(&output_path, &rows),
    };
    if let Err(e) = result {
        fail("writing rows", e);
    }

    if let Err(e) = pipeline.report().save() {
        eprintln!("Warning: Could not save run report: {e}");
    }

    println!("Exported {} rows to {output_path:?}", rows.len());
    println!();
    println!("{}", pipeline.report().summary());
    println!();
    println!("{}", ClassStatistics::from_rows(&rows));
}

fn cmd_rebalance(input: &Path, output: &Path, seed: u64) {
    let rows = dataset::read_rows(input).unwrap_or_else(|e| fail("reading rows", e));
    let before = rows.len();

    let rows = Pipeline::default().rebalance(rows, seed);
    if let Err(e) = dataset::write_rows(output, &rows) {
        fail("writing rows", e);
    }

    println!(
        "Rebalanced {before} rows to {} rows (seed {seed}) in {output:?}",
        rows.len()
    );
    println!();
    println!("{}", ClassStatistics::from_rows(&rows));
}

fn cmd_split(config: &Config, input: &Path, output_dir: &Path, seed: u64, folds: Option<usize>) {
    let rows = dataset::read_rows(input).unwrap_or_else(|e| fail("reading rows", e));

    let tables: Vec<(String, Vec<gaze_prep::OutputRow>)> = match folds {
        Some(k) => dataset::k_folds(&rows, k, seed)
            .unwrap_or_else(|e| fail("splitting rows", e))
            .into_iter()
            .flat_map(|fold| {
                [
                    (format!("fold_{}_train.csv", fold.index), fold.train),
                    (format!("fold_{}_val.csv", fold.index), fold.validation),
                ]
            })
            .collect(),
        None => {
            let split = dataset::split_train_val_test(
                &rows,
                config.split.test_fraction,
                config.split.val_fraction,
                seed,
            )
            .unwrap_or_else(|e| fail("splitting rows", e));
            vec![
                ("train.csv".to_string(), split.train),
                ("val.csv".to_string(), split.validation),
                ("test.csv".to_string(), split.test),
            ]
        }
    };

    for (name, table) in &tables {
        let path = output_dir.join(name);
        if let Err(e) = dataset::write_rows(&path, table) {
            fail("writing split", e);
        }
        let stats = ClassStatistics::from_rows(table);
        println!(
            "{name}: {} rows ({} ASD children, {} NT children)",
            table.len(),
            stats.asd.children,
            stats.neurotypical.children
        );
    }
}

fn cmd_stats(input: &Path) {
    let rows = dataset::read_rows(input).unwrap_or_else(|e| fail("reading rows", e));
    println!("{} rows in {input:?}", rows.len());
    println!();
    println!("{}", ClassStatistics::from_rows(&rows));
}

fn cmd_inspect(config: &Config, input: &Path) {
    let recordings =
        dataset::read_recordings(input).unwrap_or_else(|e| fail("reading recordings", e));
    let pipeline = Pipeline::from_config(config);

    for recording in &recordings {
        let info = &recording.info;
        let windows = pipeline.windows(recording);
        println!(
            "{} [{}] child {}: {} frames, {} valid, {} window(s)",
            info.video_key,
            info.label,
            info.child_id,
            recording.len(),
            recording.valid_frame_count(),
            windows.len()
        );

        if let Some(best) = gaze_prep::best_window(&windows) {
            println!(
                "  Best window: frames {}..{} ({} valid, {:.1}s, mean confidence {:.3})",
                best.span.start,
                best.span.end,
                best.valid_frame_count,
                best.valid_duration_secs(config.frame_rate),
                best.mean_confidence
            );
        }

        match compute_features(recording.frames()) {
            Some(features) => println!(
                "  Yaw {:.2} ± {:.2}, pitch {:.2} ± {:.2}, face ratio {:.2}",
                features.yaw.mean,
                features.yaw.std_dev,
                features.pitch.mean,
                features.pitch.std_dev,
                features.face_ratio
            ),
            None => println!("  No face detected"),
        }
    }
}

fn cmd_config() {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
