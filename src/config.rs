//! Configuration constants for the TubeGrab downloader
//!
//! This module contains application-wide configuration values including
//! collaborator binary names, transfer tuning and UI settings.

use std::time::Duration;

/// The current application version (keep in sync with Cargo.toml)
pub const APP_VERSION: &str = "0.1.0";

/// Window title and log/settings directory name
pub const APP_NAME: &str = "TubeGrab";

/// Lowercase name used for on-disk directories
pub const APP_DIR_NAME: &str = "tubegrab";

/// Extraction collaborator executable
pub static YTDLP_BINARY: &str = if cfg!(windows) { "yt-dlp.exe" } else { "yt-dlp" };

/// Muxing collaborator executable
pub static FFMPEG_BINARY: &str = if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" };

/// Name matched (case-insensitive) in failure text to attribute errors to the muxer
pub static MUXER_NAME: &str = "ffmpeg";

/// Deadline for the advisory `ffmpeg -version` query
pub const MUXER_VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Whole-item and fragment retry count handed to yt-dlp
pub const TRANSFER_RETRIES: u32 = 10;

/// Fixed checkpoint reported once a stream finished and merging starts
pub const MERGE_CHECKPOINT_PERCENT: u8 = 95;

/// Byte-level progress never reaches the merge checkpoint
pub const MAX_TRANSFER_PERCENT: u8 = MERGE_CHECKPOINT_PERCENT - 1;

/// Prefix of the machine-readable progress lines we ask yt-dlp to print
pub static PROGRESS_LINE_PREFIX: &str = "tubegrab-progress";

/// Selector used when no merge is possible
pub static SELF_CONTAINED_SELECTOR: &str = "best";

/// Preview image endpoint, `{id}` is replaced by the video id
pub static THUMBNAIL_URL_TEMPLATE: &str = "https://img.youtube.com/vi/{id}/maxresdefault.jpg";

/// Lower resolution preview, present for every video
pub static THUMBNAIL_FALLBACK_URL_TEMPLATE: &str = "https://img.youtube.com/vi/{id}/hqdefault.jpg";

/// Give up on a preview after this long
pub const THUMBNAIL_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest size the preview is drawn at in the selection dialog
pub static THUMBNAIL_MAX_SIZE: [f32; 2] = [560.0, 315.0];

/// Appended to download failures caused by a missing or broken ffmpeg
pub static FFMPEG_INSTALL_HINT: &str = "FFmpeg is required for merging video/audio. Install FFmpeg:\n\
Windows: ffmpeg.org\n\
Linux: sudo apt install ffmpeg\n\
Mac: brew install ffmpeg";

/// Default window size
pub static WINDOW_SIZE: [f32; 2] = [720.0, 440.0];

/// Minimum window size
pub static MIN_WINDOW_SIZE: [f32; 2] = [600.0, 400.0];

/// Width of the quality/format selection window
pub static SELECTION_DIALOG_WIDTH: f32 = 600.0;
