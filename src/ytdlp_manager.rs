//! yt-dlp and ffmpeg bindings
//!
//! This module wraps the two external executables the application delegates
//! to: `yt-dlp` (metadata extraction and transfer) and `ffmpeg` (merging,
//! invoked by yt-dlp itself; we only detect it). Both sit behind traits so
//! the tasks can be exercised without either tool installed.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::config::{FFMPEG_BINARY, MUXER_VERSION_TIMEOUT, TRANSFER_RETRIES, YTDLP_BINARY};
use crate::data_structures::{ContainerFormat, Encoding, Metadata};
use crate::error::AppError;
use crate::format_utils::FormatUtils;
use crate::progress::RawProgress;

/// Frame rates at or below this are not shown in labels
const STANDARD_FRAME_RATE: f64 = 30.0;

/// Codec value yt-dlp uses for "no stream of this kind"
const NO_CODEC: &str = "none";

/// Interval between `try_wait` polls of the version query
const VERSION_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Resolved once; the extractor's location does not change while we run
static YTDLP_PATH: OnceCell<PathBuf> = OnceCell::new();

/// Metadata extraction and media retrieval
pub trait Extractor: Send + Sync {
    /// Read title, duration, uploader and encodings (or playlist entries) for a URL
    fn probe(&self, url: &str) -> Result<Metadata, AppError>;

    /// Download according to `job`, reporting every progress hook call
    fn fetch(&self, job: &FetchJob, on_progress: &mut dyn FnMut(RawProgress)) -> Result<(), AppError>;
}

/// Presence checks for the muxing tool
pub trait Muxer: Send + Sync {
    /// Executable can be located on the search path
    fn is_installed(&self) -> bool;

    /// Executable answers a version query in time (advisory, may block up to the timeout)
    fn responds_to_version_query(&self) -> bool;
}

/// Everything one transfer needs
#[derive(Clone, Debug, PartialEq)]
pub struct FetchJob {
    pub url: String,
    pub format_selector: String,
    pub output_template: String,
    pub merge_format: ContainerFormat,
    pub continue_partial: bool,
    pub retries: u32,
    pub fragment_retries: u32,
}

impl FetchJob {
    /// Resumable job with the standard retry budget
    pub fn new(url: &str, format_selector: String, output_template: String, merge_format: ContainerFormat) -> Self {
        Self {
            url: url.to_string(),
            format_selector,
            output_template,
            merge_format,
            continue_partial: true,
            retries: TRANSFER_RETRIES,
            fragment_retries: TRANSFER_RETRIES,
        }
    }

    /// Command line for yt-dlp
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            self.format_selector.clone(),
            "-o".to_string(),
            self.output_template.clone(),
            "--merge-output-format".to_string(),
            self.merge_format.extension().to_string(),
        ];
        args.push(if self.continue_partial { "--continue" } else { "--no-continue" }.to_string());
        args.extend([
            "--retries".to_string(),
            self.retries.to_string(),
            "--fragment-retries".to_string(),
            self.fragment_retries.to_string(),
            "--newline".to_string(),
            "--no-warnings".to_string(),
            "--progress-template".to_string(),
            format!("download:{}", RawProgress::template()),
            "--".to_string(),
            self.url.clone(),
        ]);
        args
    }
}

/// Build a command whose console window stays hidden on Windows
pub fn hidden_command(program: impl AsRef<std::ffi::OsStr>) -> Command {
    let mut command = Command::new(program);
    command.stdin(Stdio::null());

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        command.creation_flags(0x08000000); // CREATE_NO_WINDOW
    }

    command
}

/// Shape of the `-J` document we care about
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawInfo {
    #[serde(rename = "_type")]
    kind: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
    formats: Option<Vec<RawFormat>>,
    entries: Option<Vec<Option<RawInfo>>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFormat {
    format_id: Option<String>,
    height: Option<f64>,
    fps: Option<f64>,
    ext: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
}

impl RawFormat {
    /// Video formats with a known height become encodings; everything else is skipped
    fn to_encoding(&self) -> Option<Encoding> {
        let has_video = self.vcodec.as_deref().is_some_and(|codec| codec != NO_CODEC);
        let height = self.height.filter(|h| *h > 0.0)?;
        if !has_video {
            return None;
        }
        let frame_rate = self.fps.filter(|fps| *fps > STANDARD_FRAME_RATE).unwrap_or(0.0);
        Some(Encoding {
            id: self.format_id.clone().unwrap_or_else(|| "N/A".to_string()),
            height_pixels: height.round() as u32,
            frame_rate,
            container: self.ext.clone().unwrap_or_else(|| "unknown".to_string()),
            has_audio: self.acodec.as_deref().is_some_and(|codec| codec != NO_CODEC),
        })
    }
}

impl RawInfo {
    fn is_playlist(&self) -> bool {
        self.kind.as_deref() == Some("playlist") || self.entries.is_some()
    }

    fn into_metadata(self) -> Metadata {
        let is_playlist = self.is_playlist();
        let encodings = if is_playlist {
            Vec::new()
        } else {
            let discovered = self
                .formats
                .iter()
                .flatten()
                .filter_map(RawFormat::to_encoding)
                .collect();
            FormatUtils::rank_encodings(discovered)
        };
        let entries = self
            .entries
            .into_iter()
            .flatten()
            .flatten()
            .map(RawInfo::into_metadata)
            .collect();
        Metadata {
            title: self.title,
            duration_seconds: self.duration.filter(|d| d.is_finite() && *d >= 0.0).map(|d| d.round() as u64),
            uploader: self.uploader,
            entries,
            encodings,
        }
    }
}

/// The yt-dlp executable
#[derive(Clone, Debug)]
pub struct YtDlp {
    program: PathBuf,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlp {
    /// Use yt-dlp from the search path
    pub fn new() -> Self {
        let program = YTDLP_PATH
            .get_or_init(|| match which::which(YTDLP_BINARY) {
                Ok(path) => {
                    info!("Found yt-dlp at {}", path.display());
                    path
                }
                Err(e) => {
                    warn!("yt-dlp not found on PATH ({}), relying on the bare program name", e);
                    PathBuf::from(YTDLP_BINARY)
                }
            })
            .clone();
        Self { program }
    }

    /// Use a specific yt-dlp executable
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Turn a `-J` document into metadata
    pub fn parse_metadata(json: &str) -> Result<Metadata, AppError> {
        let raw: RawInfo = serde_json::from_str(json)?;
        let declared_playlist = raw.is_playlist();
        let metadata = raw.into_metadata();
        if declared_playlist && !metadata.is_playlist() {
            return Err(AppError::Probe("No valid videos found in this playlist.".to_string()));
        }
        Ok(metadata)
    }

    /// The message a failed run should surface
    ///
    /// Prefers yt-dlp's last `ERROR:` line, then whatever it wrote to stderr,
    /// then the exit status.
    pub fn failure_text(stderr: &str, status: ExitStatus) -> String {
        let error_line = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| line.starts_with("ERROR:"));
        match error_line {
            Some(line) => line.to_string(),
            None if !stderr.trim().is_empty() => stderr.trim().to_string(),
            None => format!("yt-dlp exited with {}", status),
        }
    }
}

impl Extractor for YtDlp {
    fn probe(&self, url: &str) -> Result<Metadata, AppError> {
        debug!("Running {} -J for {}", self.program.display(), url);
        let output = hidden_command(&self.program)
            .args(["-J", "--no-warnings", "--", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| AppError::Probe(format!("could not run yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Probe(Self::failure_text(&stderr, output.status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_metadata(&stdout).map_err(|e| match e {
            AppError::Probe(_) => e,
            other => AppError::Probe(other.to_string()),
        })
    }

    fn fetch(&self, job: &FetchJob, on_progress: &mut dyn FnMut(RawProgress)) -> Result<(), AppError> {
        let args = job.to_args();
        info!("Running {} {}", self.program.display(), args.join(" "));
        let mut child = hidden_command(&self.program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AppError::Download(format!("could not run yt-dlp: {}", e)))?;

        // Drain stderr concurrently so a chatty child never blocks on a full pipe
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buffer = Vec::new();
                let _ = stderr.read_to_end(&mut buffer);
                String::from_utf8_lossy(&buffer).into_owned()
            })
        });

        if let Some(stdout) = child.stdout.take() {
            for chunk in BufReader::new(stdout).split(b'\n') {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!("Lost yt-dlp output ({}), stopping the transfer", e);
                        let _ = child.kill();
                        let _ = child.wait();
                        if let Some(handle) = stderr_reader {
                            let _ = handle.join();
                        }
                        return Err(e.into());
                    }
                };
                let line = String::from_utf8_lossy(&chunk);
                match RawProgress::parse_line(&line) {
                    Some(raw) => on_progress(raw),
                    None => debug!("yt-dlp: {}", line.trim_end()),
                }
            }
        }

        let status = child.wait()?;
        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(AppError::Download(Self::failure_text(&stderr, status)))
        }
    }
}

/// The ffmpeg executable
#[derive(Clone, Debug)]
pub struct Ffmpeg {
    program: PathBuf,
    timeout: Duration,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self {
            program: PathBuf::from(FFMPEG_BINARY),
            timeout: MUXER_VERSION_TIMEOUT,
        }
    }
}

impl Ffmpeg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `ffmpeg -version`, killing it once the deadline passes
    fn run_version_query(&self) -> std::io::Result<bool> {
        let mut child = hidden_command(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status.success());
            }
            if Instant::now() >= deadline {
                warn!("ffmpeg -version timed out after {}ms, killing", self.timeout.as_millis());
                let _ = child.kill();
                let _ = child.wait();
                return Ok(false);
            }
            std::thread::sleep(VERSION_POLL_INTERVAL);
        }
    }
}

impl Muxer for Ffmpeg {
    fn is_installed(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    fn responds_to_version_query(&self) -> bool {
        match self.run_version_query() {
            Ok(ok) => {
                debug!("ffmpeg -version succeeded: {}", ok);
                ok
            }
            Err(e) => {
                debug!("ffmpeg -version could not run ({}), falling back to PATH lookup", e);
                self.is_installed()
            }
        }
    }
}
