//! TubeGrab - Video Downloader Library
//!
//! This library provides the core functionality for probing and downloading
//! videos through yt-dlp, with ffmpeg doing the audio/video merge.

pub mod config;
pub mod error;
pub mod data_structures;
pub mod logging;
pub mod settings;
pub mod progress;
pub mod format_utils;
pub mod ytdlp_manager;
pub mod tasks;
pub mod orchestrator;
pub mod selection_dialog;
pub mod thumbnail;
pub mod app;
pub mod gui;
pub mod helper_functions;

// Re-export commonly used items
pub use app::PlaylistAnswer;
pub use data_structures::*;
pub use error::AppError;
pub use format_utils::FormatUtils;
pub use orchestrator::{transition, Command, Event, Orchestrator, OrchestratorState, Submission};
pub use progress::{normalize, ProgressGate, RawProgress, RawStatus};
pub use selection_dialog::{DialogOutcome, MuxerStatus, SelectionDialog};
pub use settings::Settings;
pub use tasks::{run_download, run_probe, DownloadTask, DownloadUpdate, ProbeTask};
pub use ytdlp_manager::{Extractor, FetchJob, Ffmpeg, Muxer, YtDlp};
