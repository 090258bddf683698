//! Gaze Prep - gaze time-series preparation for video-based ASD screening.
//!
//! This library turns per-video gaze recordings (eye direction and face
//! detection confidence at a fixed frame rate) into a modelling dataset:
//! recordings are cut into gap-separated windows, windows are expanded into
//! rows depending on the class of the child, and the minority class is
//! upsampled at the subject level.
//!
//! # Data Handling
//!
//! - **Explicit gaps**: Missing frames are a distinct value, never a placeholder angle
//! - **Lossless windows**: Rows keep the trimmed per-frame columns of their window
//! - **Reproducible**: Rebalancing and splits are driven by a seed
//! - **Grouped**: Splits never place one child on both sides
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Gaze Prep                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Dataset   │──▶│  Windowing  │──▶│  Expansion  │       │
//! │  │ (CSV read)  │   │ (gap split) │   │ (per class) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         │                                    │              │
//! │         ▼                                    ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │    Run      │                     │  Rebalance  │       │
//! │  │   Report    │                     │  + Export   │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gaze_prep::{dataset, Config, Pipeline};
//! use std::path::Path;
//!
//! let config = Config::default();
//! let recordings = dataset::read_recordings(Path::new("recordings.csv")).unwrap();
//!
//! let pipeline = Pipeline::from_config(&config);
//! let rows = pipeline.process(&recordings).unwrap();
//! let rows = pipeline.rebalance(rows, config.seed);
//!
//! dataset::write_rows(Path::new("dataset.csv"), &rows).unwrap();
//! ```

pub mod config;
pub mod core;
pub mod dataset;
pub mod pipeline;
pub mod report;

// Re-export key types at crate root for convenience
pub use crate::config::{Config, ConfigError, SplitConfig};
pub use crate::core::{
    best_window, segment, Frame, Label, OutputRow, PrepError, Reading, Rebalancer, Recording,
    RecordingInfo, RowExpander, Segmenter, Window,
};
pub use dataset::{ClassStatistics, DatasetError, ExportFormat};
pub use pipeline::Pipeline;
pub use report::{RunReport, RunStats, SharedRunReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
