//! Common utility functions and validation helpers
//!
//! This module provides utility functions for URL handling, string formatting,
//! folder access, and input validation used throughout the application.

use std::path::Path;

use log::debug;
use url::Url;

use crate::error::AppError;

/// Common utility functions used throughout the application
pub struct Utils;

impl Utils {
    /// Extract the YouTube video id from a watch, short or embed URL
    pub fn extract_video_id(raw: &str) -> Option<String> {
        let parsed = Url::parse(raw.trim()).ok()?;
        let host = parsed.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

        let candidate = match host {
            "youtu.be" => parsed.path_segments()?.next().map(str::to_string),
            "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
                let mut segments = parsed.path_segments()?;
                match segments.next() {
                    Some("watch") => parsed
                        .query_pairs()
                        .find(|(key, _)| key == "v")
                        .map(|(_, value)| value.into_owned()),
                    Some("shorts") | Some("embed") | Some("live") | Some("v") => {
                        segments.next().map(str::to_string)
                    }
                    _ => None,
                }
            }
            _ => None,
        }?;

        let valid = !candidate.is_empty()
            && candidate.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then_some(candidate)
    }

    /// Truncate a string to a maximum number of characters, adding ellipsis if needed
    pub fn truncate_string(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{}...", kept)
        }
    }

    /// Open a folder in the system's file explorer
    pub fn open_folder(path: &Path) -> Result<(), AppError> {
        let canonical = path.canonicalize()?;
        debug!("Opening folder {}", canonical.display());

        #[cfg(windows)]
        let program = "explorer.exe";
        #[cfg(target_os = "macos")]
        let program = "open";
        #[cfg(not(any(windows, target_os = "macos")))]
        let program = "xdg-open";

        // explorer.exe reports failure even when the window opens, so only spawn errors count
        std::process::Command::new(program).arg(&canonical).spawn()?;
        Ok(())
    }
}

/// Input validation utilities
pub struct Validation;

impl Validation {
    /// Validate that a folder path exists and is a directory
    pub fn is_valid_folder(path: &str) -> bool {
        if path.trim().is_empty() {
            return false;
        }

        let path = Path::new(path.trim());
        path.exists() && path.is_dir()
    }
}
