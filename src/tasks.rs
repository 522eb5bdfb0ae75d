//! Background tasks: metadata probe, download, advisory muxer check
//!
//! Each task runs on its own thread and reports back over an mpsc channel;
//! the UI thread polls with `try_recv` and never blocks on a task. The
//! `run_*` functions hold the actual work and are callable synchronously.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use log::{error, info, warn};

use crate::config::SELF_CONTAINED_SELECTOR;
use crate::data_structures::{DownloadRequest, Metadata, ProgressEvent, TaskResult};
use crate::error::AppError;
use crate::format_utils::FormatUtils;
use crate::progress::{normalize, ProgressGate};
use crate::ytdlp_manager::{Extractor, FetchJob, Muxer};

/// Message shown before a transfer that cannot merge streams
pub const MUXER_MISSING_WARNING: &str = "Warning: FFmpeg not found, using best single-format...";

/// Confirmation carried by a successful download
pub const DOWNLOAD_SUCCESS_MESSAGE: &str = "Download completed successfully!";

/// Probe a URL, converting every failure into a probe error
pub fn run_probe(extractor: &dyn Extractor, url: &str) -> Result<Metadata, AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("Please enter a video or playlist URL!".to_string()));
    }
    match extractor.probe(url) {
        Ok(metadata) => {
            info!(
                "Probe finished for {}: {} encodings, {} entries",
                url,
                metadata.encodings.len(),
                metadata.entries.len()
            );
            Ok(metadata)
        }
        Err(AppError::Probe(reason)) => Err(AppError::Probe(reason)),
        Err(other) => Err(AppError::Probe(other.to_string())),
    }
}

/// Selector actually handed to yt-dlp for a request
///
/// Without a muxer nothing can be merged, so the user's choice is replaced
/// by the best self-contained format.
pub fn effective_selector(request: &DownloadRequest, muxer_installed: bool) -> String {
    if muxer_installed {
        FormatUtils::build_selector(&request.encoding_id, request.has_audio)
    } else {
        SELF_CONTAINED_SELECTOR.to_string()
    }
}

/// Perform one download, reporting normalized progress through `sink`
pub fn run_download(
    extractor: &dyn Extractor,
    muxer: &dyn Muxer,
    request: &DownloadRequest,
    sink: &mut dyn FnMut(ProgressEvent),
) -> TaskResult {
    let mut gate = ProgressGate::new();

    let muxer_installed = muxer.is_installed();
    if !muxer_installed {
        warn!("ffmpeg not found, downgrading selector to '{}'", SELF_CONTAINED_SELECTOR);
        sink(gate.admit(ProgressEvent::new(0, MUXER_MISSING_WARNING)));
    }

    let job = FetchJob::new(
        &request.source_url,
        effective_selector(request, muxer_installed),
        FormatUtils::output_template(&request.destination_directory, request.is_playlist),
        request.container_format,
    );

    let outcome = extractor.fetch(&job, &mut |raw| {
        if let Some(event) = normalize(&raw) {
            sink(gate.admit(event));
        }
    });

    match outcome {
        Ok(()) => {
            info!("Download finished: {}", request.source_url);
            TaskResult::Success(DOWNLOAD_SUCCESS_MESSAGE.to_string())
        }
        Err(e) => {
            let text = match e {
                AppError::Download(text) => text,
                other => other.to_string(),
            };
            error!("Download failed for {}: {}", request.source_url, text);
            TaskResult::Failure(FormatUtils::describe_failure(&text))
        }
    }
}

/// A metadata probe running in the background
pub struct ProbeTask {
    receiver: Receiver<Result<Metadata, AppError>>,
}

impl ProbeTask {
    /// Start probing; an empty URL is rejected before any thread is spawned
    pub fn submit(extractor: Arc<dyn Extractor>, url: &str) -> Result<Self, AppError> {
        let url = url.trim().to_string();
        if url.is_empty() {
            return Err(AppError::Validation("Please enter a video or playlist URL!".to_string()));
        }
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("probe".to_string())
            .spawn(move || {
                let _ = tx.send(run_probe(extractor.as_ref(), &url));
            })?;
        Ok(Self { receiver: rx })
    }

    /// Result if the probe has finished
    pub fn poll(&self) -> Option<Result<Metadata, AppError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err(AppError::Probe("metadata worker stopped unexpectedly".to_string())))
            }
        }
    }
}

/// Messages from a running download
#[derive(Clone, Debug, PartialEq)]
pub enum DownloadUpdate {
    Progress(ProgressEvent),
    Completed(TaskResult),
}

/// A download running in the background
pub struct DownloadTask {
    receiver: Receiver<DownloadUpdate>,
    completed: bool,
}

impl DownloadTask {
    pub fn submit(
        extractor: Arc<dyn Extractor>,
        muxer: Arc<dyn Muxer>,
        request: DownloadRequest,
    ) -> Result<Self, AppError> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("download".to_string())
            .spawn(move || {
                let progress_tx = tx.clone();
                let result = run_download(extractor.as_ref(), muxer.as_ref(), &request, &mut |event| {
                    let _ = progress_tx.send(DownloadUpdate::Progress(event));
                });
                let _ = tx.send(DownloadUpdate::Completed(result));
            })?;
        Ok(Self {
            receiver: rx,
            completed: false,
        })
    }

    /// Everything the worker sent since the last call, in order
    pub fn drain(&mut self) -> Vec<DownloadUpdate> {
        let mut updates = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(update) => {
                    if matches!(update, DownloadUpdate::Completed(_)) {
                        self.completed = true;
                    }
                    updates.push(update);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.completed {
                        self.completed = true;
                        updates.push(DownloadUpdate::Completed(TaskResult::Failure(
                            "Error: download worker stopped unexpectedly".to_string(),
                        )));
                    }
                    break;
                }
            }
        }
        updates
    }
}

/// Start the advisory muxer check; the answer arrives on the returned channel
pub fn spawn_muxer_check(muxer: Arc<dyn Muxer>) -> Receiver<bool> {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new().name("muxer-check".to_string()).spawn(move || {
        let _ = tx.send(muxer.responds_to_version_query());
    });
    if let Err(e) = spawned {
        // Receiver sees a disconnect and the dialog reports "not found"
        warn!("Could not start ffmpeg check: {}", e);
    }
    rx
}
