//! Data structures and types for the TubeGrab downloader
//!
//! This module contains the values that flow between the background tasks,
//! the orchestrator and the UI, plus the application state struct itself.

use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use eframe::egui;

use crate::orchestrator::Orchestrator;
use crate::selection_dialog::SelectionDialog;
use crate::tasks::{DownloadTask, ProbeTask};
use crate::ytdlp_manager::{Extractor, Muxer};

/// Result of a probe: one video, or a playlist of videos
///
/// Text fields are optional because playlist entries may omit them; the
/// `display_*` accessors supply the user-facing fallbacks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub duration_seconds: Option<u64>,
    pub uploader: Option<String>,
    pub entries: Vec<Metadata>,
    pub encodings: Vec<Encoding>,
}

impl Metadata {
    /// A playlist is exactly a result with entries
    pub fn is_playlist(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    pub fn display_uploader(&self) -> &str {
        self.uploader.as_deref().unwrap_or("Unknown")
    }

    /// `m:ss`, or `N/A` when the duration is unknown or zero
    pub fn display_duration(&self) -> String {
        match self.duration_seconds {
            Some(secs) if secs > 0 => format!("{}:{:02}", secs / 60, secs % 60),
            _ => "N/A".to_string(),
        }
    }

    /// View of one playlist entry for format selection
    ///
    /// Text the entry omits is taken from the playlist itself.
    pub fn entry_view(&self, entry: &Metadata) -> Metadata {
        Metadata {
            title: entry.title.clone().or_else(|| self.title.clone()),
            duration_seconds: entry.duration_seconds.or(self.duration_seconds),
            uploader: entry.uploader.clone().or_else(|| self.uploader.clone()),
            entries: Vec::new(),
            encodings: entry.encodings.clone(),
        }
    }

    /// First entry a quality can actually be picked for
    pub fn first_selectable_entry(&self) -> Option<&Metadata> {
        self.entries
            .iter()
            .find(|entry| !entry.is_playlist() && !entry.encodings.is_empty())
    }
}

/// One selectable quality tier
#[derive(Clone, Debug, PartialEq)]
pub struct Encoding {
    /// Opaque selector understood by yt-dlp
    pub id: String,
    /// 0 when unknown
    pub height_pixels: u32,
    /// 0 when unknown or not above 30
    pub frame_rate: f64,
    pub container: String,
    pub has_audio: bool,
}

impl Encoding {
    /// `"{height}p"`, with `" {fps}fps"` appended for high frame rates
    pub fn label(&self) -> String {
        if self.frame_rate > 0.0 {
            format!("{}p {}fps", self.height_pixels, self.frame_rate)
        } else {
            format!("{}p", self.height_pixels)
        }
    }

    /// Label as shown next to the radio button
    pub fn option_text(&self) -> String {
        let audio = if self.has_audio { " (with audio)" } else { " (video only)" };
        format!("{}{}", self.label(), audio)
    }
}

/// Output container handed to the merger
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    #[default]
    Mp4,
    Mkv,
    Webm,
}

impl ContainerFormat {
    pub const ALL: [ContainerFormat; 3] = [ContainerFormat::Mp4, ContainerFormat::Mkv, ContainerFormat::Webm];

    /// Extension understood by `--merge-output-format`
    pub fn extension(self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::Mkv => "mkv",
            ContainerFormat::Webm => "webm",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "MP4 (H.264 - Best compatibility)",
            ContainerFormat::Mkv => "MKV (Matroska - High quality)",
            ContainerFormat::Webm => "WEBM (VP9 - Web optimized)",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What the selection dialog returns on confirmation
#[derive(Clone, Debug, PartialEq)]
pub struct UserChoice {
    pub encoding_id: String,
    pub has_audio: bool,
    pub container_format: ContainerFormat,
}

/// A fully resolved download, consumed by exactly one download task
#[derive(Clone, Debug, PartialEq)]
pub struct DownloadRequest {
    pub source_url: String,
    pub encoding_id: String,
    pub has_audio: bool,
    pub container_format: ContainerFormat,
    pub destination_directory: PathBuf,
    pub is_playlist: bool,
}

/// Normalized progress for the visible indicator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressEvent {
    /// 0..=100
    pub percent: u8,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(percent: u8, message: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            message: message.into(),
        }
    }
}

/// Terminal outcome of a download task
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskResult {
    Success(String),
    Failure(String),
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskResult::Success(_))
    }
}

/// Pending "download the whole playlist?" question
#[derive(Clone, Debug, PartialEq)]
pub struct PlaylistPrompt {
    pub title: String,
    pub entry_count: usize,
}

/// How loud a notice is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Status-line text plus an optional acknowledgment dialog
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub severity: Severity,
    pub status: String,
    pub dialog: Option<NoticeDialog>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NoticeDialog {
    pub title: String,
    pub body: String,
}

impl Notice {
    /// Status line only
    pub fn status(severity: Severity, status: impl Into<String>) -> Self {
        Self {
            severity,
            status: status.into(),
            dialog: None,
        }
    }

    /// Status line plus a dialog the user has to acknowledge
    pub fn with_dialog(
        severity: Severity,
        status: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            status: status.into(),
            dialog: Some(NoticeDialog {
                title: title.into(),
                body: body.into(),
            }),
        }
    }
}

/// Main application state for the downloader window
pub struct TubeGrab {
    // Inputs
    pub url_input: String,
    pub download_folder: String,
    pub dark_mode: bool,

    // Collaborators
    pub extractor: Arc<dyn Extractor>,
    pub muxer: Arc<dyn Muxer>,

    // Orchestration
    pub orchestrator: Orchestrator,
    pub probe_task: Option<ProbeTask>,
    pub download_task: Option<DownloadTask>,

    // Modals
    pub playlist_prompt: Option<PlaylistPrompt>,
    pub selection_dialog: Option<SelectionDialog>,
    pub notice_dialog: Option<(Severity, NoticeDialog)>,

    // Preview
    pub previews_enabled: bool,
    pub thumbnail: Option<egui::TextureHandle>,
    pub thumbnail_receiver: Option<Receiver<egui::ColorImage>>,

    // Indicator
    pub progress_percent: u8,
    pub status: String,
    pub status_severity: Severity,
    pub last_completed_folder: Option<PathBuf>,
}
