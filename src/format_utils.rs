//! Encoding ranking and yt-dlp argument builders
//!
//! Pure helpers shared by the probe and download tasks: ordering and
//! deduplicating quality tiers, building format selectors and output
//! templates, and wording download failures.

use std::collections::HashSet;
use std::path::Path;

use crate::config::{FFMPEG_INSTALL_HINT, MUXER_NAME, SELF_CONTAINED_SELECTOR};
use crate::data_structures::Encoding;

/// yt-dlp's best audio-only stream
const BEST_AUDIO: &str = "bestaudio";

/// Utilities for working with encodings and download arguments
pub struct FormatUtils;

impl FormatUtils {
    /// Order encodings tallest first and drop repeated tiers
    ///
    /// Input must be in discovery order. Ties keep that order (stable sort),
    /// and of several encodings with the same label and audio flag only the
    /// first one discovered survives.
    pub fn rank_encodings(discovered: Vec<Encoding>) -> Vec<Encoding> {
        let mut seen = HashSet::new();
        let mut ranked: Vec<Encoding> = discovered
            .into_iter()
            .filter(|encoding| seen.insert((encoding.label(), encoding.has_audio)))
            .collect();
        ranked.sort_by(|a, b| b.height_pixels.cmp(&a.height_pixels));
        ranked
    }

    /// Format selector for the chosen encoding
    ///
    /// Video-only encodings are paired with the best audio stream, falling
    /// back to yt-dlp's generic best when that pairing is unavailable.
    pub fn build_selector(encoding_id: &str, has_audio: bool) -> String {
        if has_audio {
            encoding_id.to_string()
        } else {
            format!("{}+{}/{}", encoding_id, BEST_AUDIO, SELF_CONTAINED_SELECTOR)
        }
    }

    /// Output path template rooted at the destination directory
    pub fn output_template(destination: &Path, is_playlist: bool) -> String {
        let file_name = if is_playlist {
            "%(playlist_index)s - %(title)s.%(ext)s"
        } else {
            "%(title)s.%(ext)s"
        };
        destination.join(file_name).to_string_lossy().into_owned()
    }

    /// Whether failure text points at the muxing tool
    pub fn mentions_muxer(text: &str) -> bool {
        text.to_lowercase().contains(MUXER_NAME)
    }

    /// User-facing failure text, with install guidance when ffmpeg is to blame
    pub fn describe_failure(text: &str) -> String {
        if Self::mentions_muxer(text) {
            format!("Error: {}\n\n{}", text, FFMPEG_INSTALL_HINT)
        } else {
            format!("Error: {}", text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn encoding(id: &str, height: u32, fps: f64, has_audio: bool) -> Encoding {
        Encoding {
            id: id.to_string(),
            height_pixels: height,
            frame_rate: fps,
            container: "mp4".to_string(),
            has_audio,
        }
    }

    #[test]
    fn ranks_tallest_first_keeping_discovery_order_on_ties() {
        let ranked = FormatUtils::rank_encodings(vec![
            encoding("18", 360, 0.0, true),
            encoding("137", 1080, 0.0, false),
            encoding("299", 1080, 60.0, false),
            encoding("22", 720, 0.0, true),
        ]);
        let ids: Vec<&str> = ranked.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["137", "299", "22", "18"]);
        assert!(ranked.windows(2).all(|w| w[0].height_pixels >= w[1].height_pixels));
    }

    #[test]
    fn keeps_first_of_duplicate_label_and_audio() {
        let ranked = FormatUtils::rank_encodings(vec![
            encoding("136", 720, 0.0, false),
            encoding("247", 720, 0.0, false),
            encoding("22", 720, 0.0, true),
        ]);
        let ids: Vec<&str> = ranked.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["136", "22"]);

        let mut pairs = HashSet::new();
        assert!(ranked.iter().all(|e| pairs.insert((e.label(), e.has_audio))));
    }

    #[test]
    fn labels_include_high_frame_rates_only() {
        assert_eq!(encoding("a", 1080, 60.0, false).label(), "1080p 60fps");
        assert_eq!(encoding("b", 720, 0.0, true).label(), "720p");
        assert_eq!(encoding("c", 720, 0.0, true).option_text(), "720p (with audio)");
    }

    #[test]
    fn selector_pairs_video_only_streams_with_audio() {
        assert_eq!(FormatUtils::build_selector("137", false), "137+bestaudio/best");
        assert_eq!(FormatUtils::build_selector("22", true), "22");
    }

    #[test]
    fn output_template_depends_on_playlist() {
        let dest = PathBuf::from("videos");
        assert_eq!(
            FormatUtils::output_template(&dest, false),
            dest.join("%(title)s.%(ext)s").to_string_lossy()
        );
        assert_eq!(
            FormatUtils::output_template(&dest, true),
            dest.join("%(playlist_index)s - %(title)s.%(ext)s").to_string_lossy()
        );
    }

    #[test]
    fn ffmpeg_failures_get_install_hint() {
        let described = FormatUtils::describe_failure("Postprocessing: FFmpeg not found");
        assert!(described.starts_with("Error: Postprocessing: FFmpeg not found"));
        assert!(described.contains("brew install ffmpeg"));

        let plain = FormatUtils::describe_failure("HTTP Error 403: Forbidden");
        assert_eq!(plain, "Error: HTTP Error 403: Forbidden");
    }
}
