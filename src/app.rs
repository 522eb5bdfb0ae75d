//! Application logic for the TubeGrab downloader
//!
//! This module wires the orchestrator to the outside world: it turns
//! commands into background tasks and dialogs, and turns task results and
//! dialog answers back into orchestrator events.

use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui;
use log::{debug, info, warn};

use crate::data_structures::{DownloadRequest, Metadata, Notice, Severity, TaskResult, TubeGrab};
use crate::helper_functions::Utils;
use crate::orchestrator::{Command, Event, Orchestrator};
use crate::selection_dialog::{DialogOutcome, SelectionDialog};
use crate::settings::Settings;
use crate::tasks::{self, DownloadTask, DownloadUpdate, ProbeTask};
use crate::thumbnail;
use crate::ytdlp_manager::{Extractor, Ffmpeg, Muxer, YtDlp};

/// Button pressed in the playlist question
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaylistAnswer {
    Yes,
    No,
    Cancel,
}

impl Default for TubeGrab {
    fn default() -> Self {
        info!("Initializing TubeGrab");
        let settings = Settings::load();
        info!(
            "Loaded settings: dark_mode={}, download_folder={}",
            settings.dark_mode, settings.download_folder
        );
        Self::with_collaborators(settings, Arc::new(YtDlp::new()), Arc::new(Ffmpeg::new()))
    }
}

impl TubeGrab {
    /// Build the application around explicit collaborators
    pub fn with_collaborators(settings: Settings, extractor: Arc<dyn Extractor>, muxer: Arc<dyn Muxer>) -> Self {
        Self {
            url_input: String::new(),
            download_folder: settings.download_folder,
            dark_mode: settings.dark_mode,
            extractor,
            muxer,
            orchestrator: Orchestrator::new(),
            probe_task: None,
            download_task: None,
            playlist_prompt: None,
            selection_dialog: None,
            notice_dialog: None,
            previews_enabled: true,
            thumbnail: None,
            thumbnail_receiver: None,
            progress_percent: 0,
            status: "Ready".to_string(),
            status_severity: Severity::Info,
            last_completed_folder: None,
        }
    }

    /// Save the current user settings to disk
    pub fn save_current_settings(&self) {
        let settings = Settings {
            dark_mode: self.dark_mode,
            download_folder: self.download_folder.clone(),
        };

        if let Err(e) = settings.save() {
            warn!("Failed to save settings: {}", e);
        } else {
            debug!("Settings saved successfully");
        }
    }

    /// Whether a probe, dialog or download is in flight
    pub fn is_busy(&self) -> bool {
        !self.orchestrator.accepts_submission()
    }

    /// Submit the URL and folder currently in the input fields
    pub fn submit(&mut self) {
        let event = Event::Submit {
            url: self.url_input.clone(),
            destination: self.download_folder.clone(),
        };
        self.dispatch(event);
    }

    /// Feed an event to the orchestrator and carry out the resulting commands
    pub fn dispatch(&mut self, event: Event) {
        for command in self.orchestrator.handle(event) {
            self.execute(command);
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::StartProbe { url } => self.start_probe(url),
            Command::AskPlaylistConfirmation(prompt) => {
                info!("Playlist detected: {} ({} entries)", prompt.title, prompt.entry_count);
                self.playlist_prompt = Some(prompt);
            }
            Command::PresentSelection { metadata } => self.present_selection(metadata),
            Command::StartDownload(request) => self.start_download(request),
            Command::Notify(notice) => self.apply_notice(notice),
        }
    }

    fn start_probe(&mut self, url: String) {
        self.progress_percent = 0;
        self.last_completed_folder = None;
        self.thumbnail = None;
        self.thumbnail_receiver = if self.previews_enabled {
            Utils::extract_video_id(&url).map(thumbnail::spawn_fetch)
        } else {
            None
        };

        match ProbeTask::submit(Arc::clone(&self.extractor), &url) {
            Ok(task) => self.probe_task = Some(task),
            Err(e) => {
                warn!("Could not start probe: {}", e);
                self.dispatch(Event::ProbeFailed(e.to_string()));
            }
        }
    }

    fn present_selection(&mut self, metadata: Metadata) {
        let muxer_check = tasks::spawn_muxer_check(Arc::clone(&self.muxer));
        self.selection_dialog = Some(SelectionDialog::new(metadata, muxer_check));
    }

    fn start_download(&mut self, request: DownloadRequest) {
        self.progress_percent = 0;
        let folder = request.destination_directory.clone();
        match DownloadTask::submit(Arc::clone(&self.extractor), Arc::clone(&self.muxer), request) {
            Ok(task) => {
                self.download_task = Some(task);
                self.last_completed_folder = Some(folder);
            }
            Err(e) => {
                warn!("Could not start download: {}", e);
                self.dispatch(Event::TaskCompleted(TaskResult::Failure(e.to_string())));
            }
        }
    }

    fn apply_notice(&mut self, notice: Notice) {
        match notice.severity {
            Severity::Error => warn!("{}", notice.status),
            _ => debug!("Status: {}", notice.status),
        }
        self.status = notice.status;
        self.status_severity = notice.severity;
        if let Some(dialog) = notice.dialog {
            self.notice_dialog = Some((notice.severity, dialog));
        }
    }

    /// Answer the playlist question; anything but Yes cancels
    pub fn answer_playlist(&mut self, answer: PlaylistAnswer) {
        if self.playlist_prompt.take().is_none() {
            return;
        }
        let event = match answer {
            PlaylistAnswer::Yes => Event::PlaylistConfirmed,
            PlaylistAnswer::No | PlaylistAnswer::Cancel => Event::PlaylistDeclined,
        };
        self.dispatch(event);
    }

    /// Close the selection dialog with the user's decision
    pub fn finish_selection(&mut self, outcome: DialogOutcome) {
        self.selection_dialog = None;
        let event = match outcome {
            DialogOutcome::Confirmed(choice) => Event::SelectionConfirmed(choice),
            DialogOutcome::Cancelled => Event::SelectionCancelled,
        };
        self.dispatch(event);
    }

    pub fn dismiss_notice(&mut self) {
        self.notice_dialog = None;
    }

    /// Drain finished probe results and download updates
    pub fn poll_tasks(&mut self) {
        if let Some(result) = self.probe_task.as_ref().and_then(ProbeTask::poll) {
            self.probe_task = None;
            let event = match result {
                Ok(metadata) => Event::ProbeSucceeded(metadata),
                Err(e) => Event::ProbeFailed(e.to_string()),
            };
            self.dispatch(event);
        }

        let updates = match self.download_task.as_mut() {
            Some(task) => task.drain(),
            None => return,
        };
        for update in updates {
            match update {
                DownloadUpdate::Progress(event) => {
                    self.progress_percent = event.percent;
                    self.status = event.message;
                    self.status_severity = Severity::Info;
                }
                DownloadUpdate::Completed(result) => {
                    self.download_task = None;
                    if result.is_success() {
                        self.progress_percent = 100;
                    } else {
                        self.progress_percent = 0;
                        self.last_completed_folder = None;
                    }
                    self.dispatch(Event::TaskCompleted(result));
                }
            }
        }
    }

    /// Upload the preview image once the fetch thread delivers it
    pub fn poll_thumbnail(&mut self, ctx: &egui::Context) {
        let Some(receiver) = &self.thumbnail_receiver else {
            return;
        };
        match receiver.try_recv() {
            Ok(image) => {
                self.thumbnail = Some(ctx.load_texture("video-thumbnail", image, egui::TextureOptions::LINEAR));
                self.thumbnail_receiver = None;
            }
            Err(std::sync::mpsc::TryRecvError::Disconnected) => self.thumbnail_receiver = None,
            Err(std::sync::mpsc::TryRecvError::Empty) => {}
        }
    }

    /// Folder to offer in "Open Folder" after a successful download
    pub fn completed_folder(&self) -> Option<&PathBuf> {
        if self.is_busy() || self.status_severity != Severity::Success {
            return None;
        }
        self.last_completed_folder.as_ref()
    }

    pub fn toggle_theme(&mut self) {
        self.dark_mode = !self.dark_mode;
        info!("Theme switched to {}", if self.dark_mode { "dark" } else { "light" });
        self.save_current_settings();
    }
}
