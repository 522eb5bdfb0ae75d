//! Progress parsing and normalization
//!
//! yt-dlp is asked to print one machine-readable line per progress hook
//! call. Those lines become [`RawProgress`] records, which [`normalize`] maps
//! onto the [`ProgressEvent`]s the UI understands. [`ProgressGate`] keeps the
//! visible percentage from moving backwards.

use log::debug;

use crate::config::{MAX_TRANSFER_PERCENT, MERGE_CHECKPOINT_PERCENT, PROGRESS_LINE_PREFIX};
use crate::data_structures::ProgressEvent;

/// Field separator inside a progress line
const SEPARATOR: &str = "|";

/// What yt-dlp printed for a missing value
const NOT_AVAILABLE: &str = "NA";

/// Status reported by a progress hook call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawStatus {
    Downloading,
    Finished,
    Other(String),
}

/// One progress hook call, as the collaborator reported it
#[derive(Clone, Debug, PartialEq)]
pub struct RawProgress {
    pub status: RawStatus,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub total_bytes_estimate: Option<u64>,
    pub speed: Option<String>,
}

impl RawProgress {
    /// Template passed to `--progress-template download:<template>`
    pub fn template() -> String {
        [
            PROGRESS_LINE_PREFIX,
            "%(progress.status)s",
            "%(progress.downloaded_bytes)s",
            "%(progress.total_bytes)s",
            "%(progress.total_bytes_estimate)s",
            "%(progress._speed_str)s",
        ]
        .join(SEPARATOR)
    }

    /// Parse one stdout line; anything that is not a progress line yields `None`
    pub fn parse_line(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix(PROGRESS_LINE_PREFIX)?.strip_prefix(SEPARATOR)?;
        let mut fields = rest.splitn(5, SEPARATOR).map(str::trim);

        let status = match fields.next()? {
            "downloading" => RawStatus::Downloading,
            "finished" => RawStatus::Finished,
            other => RawStatus::Other(other.to_string()),
        };
        let downloaded_bytes = parse_bytes(fields.next()?);
        let total_bytes = parse_bytes(fields.next()?);
        let total_bytes_estimate = parse_bytes(fields.next()?);
        let speed = fields
            .next()
            .filter(|s| !s.is_empty() && *s != NOT_AVAILABLE)
            .map(str::to_string);

        Some(Self {
            status,
            downloaded_bytes,
            total_bytes,
            total_bytes_estimate,
            speed,
        })
    }

    /// Known positive total, preferring the exact size over the estimate
    fn known_total(&self) -> Option<u64> {
        self.total_bytes
            .filter(|total| *total > 0)
            .or(self.total_bytes_estimate.filter(|total| *total > 0))
    }
}

/// Byte counts may arrive as integers or floats (`12345.0`)
fn parse_bytes(field: &str) -> Option<u64> {
    if field == NOT_AVAILABLE {
        return None;
    }
    field
        .parse::<u64>()
        .ok()
        .or_else(|| field.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0).map(|v| v.round() as u64))
}

/// Map a raw record to a UI event
///
/// Transfers without a known total produce nothing, so the bar never sits
/// at a meaningless 0%. Byte progress stops short of the merge checkpoint,
/// and `finished` is always exactly that checkpoint.
pub fn normalize(raw: &RawProgress) -> Option<ProgressEvent> {
    match raw.status {
        RawStatus::Downloading => {
            let total = raw.known_total()?;
            let downloaded = raw.downloaded_bytes.unwrap_or(0).min(total);
            let percent = (downloaded.saturating_mul(100) / total) as u8;
            let speed = raw.speed.as_deref().unwrap_or("N/A");
            Some(ProgressEvent::new(
                percent.min(MAX_TRANSFER_PERCENT),
                format!("Downloading: {}", speed),
            ))
        }
        RawStatus::Finished => Some(ProgressEvent::new(MERGE_CHECKPOINT_PERCENT, "Processing and merging...")),
        RawStatus::Other(_) => None,
    }
}

/// High-water mark for the stream currently transferring
///
/// One task can transfer several streams (video then audio, or one item per
/// playlist entry). The mark is held within a stream and released once the
/// merge checkpoint was reported, so the next stream starts from its own
/// progress instead of sitting at the checkpoint.
#[derive(Debug, Default)]
pub struct ProgressGate {
    high_water: u8,
    stream_finished: bool,
}

impl ProgressGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pass an event through, holding the percentage at its highest value so far
    ///
    /// The message still updates, so a restarted fragment shows its speed
    /// without the bar jumping back.
    pub fn admit(&mut self, event: ProgressEvent) -> ProgressEvent {
        if self.stream_finished && event.percent < MERGE_CHECKPOINT_PERCENT {
            debug!("Next stream started at {}%", event.percent);
            self.high_water = 0;
        }
        self.stream_finished = event.percent == MERGE_CHECKPOINT_PERCENT;

        if event.percent < self.high_water {
            debug!("Holding progress at {}% (reported {}%)", self.high_water, event.percent);
            ProgressEvent::new(self.high_water, event.message)
        } else {
            self.high_water = event.percent;
            event
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(fields: &str) -> String {
        format!("{}|{}", PROGRESS_LINE_PREFIX, fields)
    }

    #[test]
    fn parses_downloading_line() {
        let raw = RawProgress::parse_line(&line("downloading|512|1024|NA|  1.50MiB/s")).unwrap();
        assert_eq!(raw.status, RawStatus::Downloading);
        assert_eq!(raw.downloaded_bytes, Some(512));
        assert_eq!(raw.total_bytes, Some(1024));
        assert_eq!(raw.total_bytes_estimate, None);
        assert_eq!(raw.speed.as_deref(), Some("1.50MiB/s"));
    }

    #[test]
    fn parses_float_estimates() {
        let raw = RawProgress::parse_line(&line("downloading|10|NA|2000.4|NA")).unwrap();
        assert_eq!(raw.total_bytes_estimate, Some(2000));
        assert_eq!(raw.speed, None);
    }

    #[test]
    fn ignores_other_output() {
        assert_eq!(RawProgress::parse_line("[youtube] abc123: Downloading webpage"), None);
        assert_eq!(RawProgress::parse_line(""), None);
        assert_eq!(RawProgress::parse_line(&line("downloading|1")), None);
    }

    #[test]
    fn template_matches_parser() {
        let template = RawProgress::template();
        assert!(template.starts_with(PROGRESS_LINE_PREFIX));
        assert_eq!(template.matches(SEPARATOR).count(), 5);
    }

    #[test]
    fn half_way_reports_fifty() {
        let raw = RawProgress::parse_line(&line("downloading|50|100|NA|2.0MiB/s")).unwrap();
        assert_eq!(normalize(&raw), Some(ProgressEvent::new(50, "Downloading: 2.0MiB/s")));
    }

    #[test]
    fn unknown_total_reports_nothing() {
        let raw = RawProgress::parse_line(&line("downloading|50|NA|NA|NA")).unwrap();
        assert_eq!(normalize(&raw), None);
        let zero = RawProgress::parse_line(&line("downloading|50|0|NA|NA")).unwrap();
        assert_eq!(normalize(&zero), None);
    }

    #[test]
    fn estimate_used_when_exact_total_missing() {
        let raw = RawProgress::parse_line(&line("downloading|25|NA|100|NA")).unwrap();
        assert_eq!(normalize(&raw), Some(ProgressEvent::new(25, "Downloading: N/A")));
    }

    #[test]
    fn finished_is_the_merge_checkpoint() {
        let raw = RawProgress::parse_line(&line("finished|100|100|NA|NA")).unwrap();
        assert_eq!(normalize(&raw), Some(ProgressEvent::new(95, "Processing and merging...")));
    }

    #[test]
    fn transfer_never_reaches_checkpoint() {
        let raw = RawProgress::parse_line(&line("downloading|100|100|NA|NA")).unwrap();
        assert_eq!(normalize(&raw).unwrap().percent, MAX_TRANSFER_PERCENT);
    }

    #[test]
    fn gate_holds_mark_within_a_stream() {
        let mut gate = ProgressGate::new();
        assert_eq!(gate.admit(ProgressEvent::new(40, "a")).percent, 40);
        let held = gate.admit(ProgressEvent::new(10, "restart"));
        assert_eq!(held.percent, 40);
        assert_eq!(held.message, "restart");
        assert_eq!(gate.admit(ProgressEvent::new(95, "merge")).percent, 95);
        assert_eq!(gate.admit(ProgressEvent::new(95, "merge")).percent, 95);
    }

    #[test]
    fn next_stream_after_checkpoint_starts_fresh() {
        let mut gate = ProgressGate::new();
        let percents: Vec<u8> = [50, 95, 10, 60, 30, 95]
            .into_iter()
            .map(|p| gate.admit(ProgressEvent::new(p, "x")).percent)
            .collect();
        assert_eq!(percents, vec![50, 95, 10, 60, 60, 95]);
    }
}
