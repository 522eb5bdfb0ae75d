//! Probe → confirm → select → download state machine
//!
//! [`transition`] is a pure function from a state and an event to the next
//! state plus the commands the shell has to carry out (start a task, open a
//! dialog, show a notice). [`Orchestrator`] just holds the current state.
//! At most one task is live per instance: a submission is accepted only in
//! [`OrchestratorState::Idle`] and rejected everywhere else.

use std::fmt;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::data_structures::{
    DownloadRequest, Metadata, Notice, PlaylistPrompt, Severity, TaskResult, UserChoice,
};

/// URL and destination the user submitted
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    pub url: String,
    pub destination: PathBuf,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum OrchestratorState {
    #[default]
    Idle,
    Probing {
        submission: Submission,
    },
    AwaitingPlaylistConfirmation {
        submission: Submission,
        playlist: Metadata,
    },
    AwaitingSelection {
        submission: Submission,
        is_playlist: bool,
    },
    Downloading {
        request: DownloadRequest,
    },
}

impl OrchestratorState {
    fn name(&self) -> &'static str {
        match self {
            OrchestratorState::Idle => "Idle",
            OrchestratorState::Probing { .. } => "Probing",
            OrchestratorState::AwaitingPlaylistConfirmation { .. } => "AwaitingPlaylistConfirmation",
            OrchestratorState::AwaitingSelection { .. } => "AwaitingSelection",
            OrchestratorState::Downloading { .. } => "Downloading",
        }
    }
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs from the user and from background tasks
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Submit { url: String, destination: String },
    ProbeSucceeded(Metadata),
    ProbeFailed(String),
    PlaylistConfirmed,
    PlaylistDeclined,
    SelectionConfirmed(UserChoice),
    SelectionCancelled,
    TaskCompleted(TaskResult),
}

/// Effects the shell performs after a transition
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    StartProbe { url: String },
    AskPlaylistConfirmation(PlaylistPrompt),
    PresentSelection { metadata: Metadata },
    StartDownload(DownloadRequest),
    Notify(Notice),
}

fn cancelled() -> Command {
    Command::Notify(Notice::status(Severity::Info, "Download cancelled"))
}

fn invalid(message: &str) -> Command {
    Command::Notify(Notice::with_dialog(Severity::Warning, message, "Error", message))
}

/// Compute the next state and the commands it requires
pub fn transition(state: OrchestratorState, event: Event) -> (OrchestratorState, Vec<Command>) {
    use OrchestratorState as S;

    match (state, event) {
        (S::Idle, Event::Submit { url, destination }) => {
            let url = url.trim().to_string();
            let destination = destination.trim().to_string();
            if url.is_empty() {
                return (S::Idle, vec![invalid("Please enter a video or playlist URL!")]);
            }
            if destination.is_empty() {
                return (S::Idle, vec![invalid("Please select a save folder!")]);
            }
            info!("Submitted {} -> {}", url, destination);
            let submission = Submission {
                url: url.clone(),
                destination: PathBuf::from(destination),
            };
            (
                S::Probing { submission },
                vec![
                    Command::Notify(Notice::status(Severity::Info, "Fetching video information...")),
                    Command::StartProbe { url },
                ],
            )
        }

        (busy, Event::Submit { url, .. }) => {
            warn!("Rejected submission of {} while {}", url, busy);
            (
                busy,
                vec![Command::Notify(Notice::status(
                    Severity::Warning,
                    "Please wait for the current operation to finish.",
                ))],
            )
        }

        (S::Probing { submission }, Event::ProbeSucceeded(metadata)) => {
            if metadata.is_playlist() {
                let prompt = PlaylistPrompt {
                    title: metadata.title.clone().unwrap_or_else(|| "Playlist".to_string()),
                    entry_count: metadata.entries.len(),
                };
                (
                    S::AwaitingPlaylistConfirmation {
                        submission,
                        playlist: metadata,
                    },
                    vec![Command::AskPlaylistConfirmation(prompt)],
                )
            } else {
                (
                    S::AwaitingSelection {
                        submission,
                        is_playlist: false,
                    },
                    vec![Command::PresentSelection { metadata }],
                )
            }
        }

        (S::Probing { .. }, Event::ProbeFailed(reason)) => (
            S::Idle,
            vec![Command::Notify(Notice::with_dialog(
                Severity::Error,
                "Error fetching video information",
                "Error",
                reason,
            ))],
        ),

        (S::AwaitingPlaylistConfirmation { .. }, Event::PlaylistDeclined) => {
            info!("Playlist declined");
            (S::Idle, vec![cancelled()])
        }

        (S::AwaitingPlaylistConfirmation { submission, playlist }, Event::PlaylistConfirmed) => {
            match playlist.first_selectable_entry() {
                Some(entry) => {
                    let metadata = playlist.entry_view(entry);
                    (
                        S::AwaitingSelection {
                            submission,
                            is_playlist: true,
                        },
                        vec![Command::PresentSelection { metadata }],
                    )
                }
                None => (
                    S::Idle,
                    vec![Command::Notify(Notice::with_dialog(
                        Severity::Error,
                        "Download cancelled",
                        "Error",
                        "No valid videos found in this playlist.",
                    ))],
                ),
            }
        }

        (S::AwaitingSelection { .. }, Event::SelectionCancelled) => {
            info!("Selection dialog cancelled");
            (S::Idle, vec![cancelled()])
        }

        (S::AwaitingSelection { submission, is_playlist }, Event::SelectionConfirmed(choice)) => {
            let request = DownloadRequest {
                source_url: submission.url,
                encoding_id: choice.encoding_id,
                has_audio: choice.has_audio,
                container_format: choice.container_format,
                destination_directory: submission.destination,
                is_playlist,
            };
            info!(
                "Starting download of {} (format {}, {})",
                request.source_url, request.encoding_id, request.container_format
            );
            (
                S::Downloading {
                    request: request.clone(),
                },
                vec![
                    Command::Notify(Notice::status(Severity::Info, "Starting download...")),
                    Command::StartDownload(request),
                ],
            )
        }

        (S::Downloading { .. }, Event::TaskCompleted(result)) => {
            let notice = match result {
                TaskResult::Success(message) => {
                    Notice::with_dialog(Severity::Success, format!("✓ {}", message), "Success", message)
                }
                TaskResult::Failure(reason) => {
                    Notice::with_dialog(Severity::Error, "✗ Download failed", "Error", reason)
                }
            };
            (S::Idle, vec![Command::Notify(notice)])
        }

        (state, event) => {
            debug!("Ignoring {:?} in state {}", event, state);
            (state, Vec::new())
        }
    }
}

/// Holder of the current state
#[derive(Debug, Default)]
pub struct Orchestrator {
    state: OrchestratorState,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    /// The submit control is usable only when nothing is in flight
    pub fn accepts_submission(&self) -> bool {
        matches!(self.state, OrchestratorState::Idle)
    }

    /// Feed an event, returning the commands to perform
    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        let current = std::mem::take(&mut self.state);
        let before = current.name();
        let (next, commands) = transition(current, event);
        if next.name() != before {
            debug!("Orchestrator {} -> {}", before, next);
        }
        self.state = next;
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{ContainerFormat, Encoding};

    fn encoding(id: &str, height: u32, has_audio: bool) -> Encoding {
        Encoding {
            id: id.to_string(),
            height_pixels: height,
            frame_rate: 0.0,
            container: "mp4".to_string(),
            has_audio,
        }
    }

    fn video(title: Option<&str>) -> Metadata {
        Metadata {
            title: title.map(str::to_string),
            duration_seconds: None,
            uploader: None,
            entries: Vec::new(),
            encodings: vec![encoding("22", 720, true)],
        }
    }

    fn playlist(entries: Vec<Metadata>) -> Metadata {
        Metadata {
            title: Some("Mix".to_string()),
            duration_seconds: Some(600),
            uploader: Some("Curator".to_string()),
            entries,
            encodings: Vec::new(),
        }
    }

    fn submit(orchestrator: &mut Orchestrator) -> Vec<Command> {
        orchestrator.handle(Event::Submit {
            url: " https://youtu.be/abc123 ".to_string(),
            destination: "/tmp/videos".to_string(),
        })
    }

    fn starts_download(commands: &[Command]) -> bool {
        commands.iter().any(|c| matches!(c, Command::StartDownload(_)))
    }

    #[test]
    fn empty_inputs_never_leave_idle() {
        let mut orchestrator = Orchestrator::new();
        for (url, destination) in [("", "/tmp"), ("https://youtu.be/x", "  ")] {
            let commands = orchestrator.handle(Event::Submit {
                url: url.to_string(),
                destination: destination.to_string(),
            });
            assert_eq!(orchestrator.state(), &OrchestratorState::Idle);
            assert!(!commands.iter().any(|c| matches!(c, Command::StartProbe { .. })));
        }
    }

    #[test]
    fn submission_starts_probe_with_trimmed_url() {
        let mut orchestrator = Orchestrator::new();
        let commands = submit(&mut orchestrator);
        assert!(commands.contains(&Command::StartProbe {
            url: "https://youtu.be/abc123".to_string()
        }));
        assert!(!orchestrator.accepts_submission());
    }

    #[test]
    fn second_submission_is_rejected() {
        let mut orchestrator = Orchestrator::new();
        submit(&mut orchestrator);
        let commands = submit(&mut orchestrator);
        assert!(matches!(orchestrator.state(), OrchestratorState::Probing { .. }));
        assert!(!commands.iter().any(|c| matches!(c, Command::StartProbe { .. })));
    }

    #[test]
    fn single_video_goes_straight_to_selection() {
        let mut orchestrator = Orchestrator::new();
        submit(&mut orchestrator);
        let commands = orchestrator.handle(Event::ProbeSucceeded(video(Some("Clip"))));
        assert_eq!(
            commands,
            vec![Command::PresentSelection {
                metadata: video(Some("Clip"))
            }]
        );
        assert!(matches!(
            orchestrator.state(),
            OrchestratorState::AwaitingSelection { is_playlist: false, .. }
        ));
    }

    #[test]
    fn probe_failure_returns_to_idle_with_dialog() {
        let mut orchestrator = Orchestrator::new();
        submit(&mut orchestrator);
        let commands = orchestrator.handle(Event::ProbeFailed("Video unavailable".to_string()));
        assert_eq!(orchestrator.state(), &OrchestratorState::Idle);
        match &commands[0] {
            Command::Notify(notice) => {
                assert_eq!(notice.severity, Severity::Error);
                assert_eq!(notice.dialog.as_ref().unwrap().body, "Video unavailable");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn declining_playlist_spawns_nothing() {
        let mut orchestrator = Orchestrator::new();
        submit(&mut orchestrator);
        let entries = (0..5).map(|i| video(Some(&format!("Part {}", i)))).collect();
        let commands = orchestrator.handle(Event::ProbeSucceeded(playlist(entries)));
        assert_eq!(
            commands,
            vec![Command::AskPlaylistConfirmation(PlaylistPrompt {
                title: "Mix".to_string(),
                entry_count: 5
            })]
        );
        let commands = orchestrator.handle(Event::PlaylistDeclined);
        assert_eq!(orchestrator.state(), &OrchestratorState::Idle);
        assert!(!starts_download(&commands));
    }

    #[test]
    fn confirmed_playlist_uses_first_entry_with_fallbacks() {
        let mut orchestrator = Orchestrator::new();
        submit(&mut orchestrator);
        orchestrator.handle(Event::ProbeSucceeded(playlist(vec![video(None), video(Some("Second"))])));
        let commands = orchestrator.handle(Event::PlaylistConfirmed);
        match &commands[0] {
            Command::PresentSelection { metadata } => {
                assert_eq!(metadata.display_title(), "Mix");
                assert_eq!(metadata.duration_seconds, Some(600));
                assert_eq!(metadata.display_uploader(), "Curator");
                assert!(!metadata.is_playlist());
                assert_eq!(metadata.encodings.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            orchestrator.state(),
            OrchestratorState::AwaitingSelection { is_playlist: true, .. }
        ));
    }

    #[test]
    fn playlist_without_selectable_entries_ends_in_error() {
        let mut orchestrator = Orchestrator::new();
        submit(&mut orchestrator);
        let empty_entry = Metadata {
            title: Some("Private video".to_string()),
            ..Metadata::default()
        };
        orchestrator.handle(Event::ProbeSucceeded(playlist(vec![empty_entry])));
        let commands = orchestrator.handle(Event::PlaylistConfirmed);
        assert_eq!(orchestrator.state(), &OrchestratorState::Idle);
        assert!(matches!(&commands[0], Command::Notify(n) if n.severity == Severity::Error));
    }

    #[test]
    fn cancelling_selection_spawns_nothing() {
        let mut orchestrator = Orchestrator::new();
        submit(&mut orchestrator);
        orchestrator.handle(Event::ProbeSucceeded(video(Some("Clip"))));
        let commands = orchestrator.handle(Event::SelectionCancelled);
        assert_eq!(orchestrator.state(), &OrchestratorState::Idle);
        assert!(!starts_download(&commands));
    }

    #[test]
    fn confirmed_selection_builds_request_then_completes() {
        let mut orchestrator = Orchestrator::new();
        submit(&mut orchestrator);
        orchestrator.handle(Event::ProbeSucceeded(playlist(vec![video(Some("A"))])));
        orchestrator.handle(Event::PlaylistConfirmed);
        let commands = orchestrator.handle(Event::SelectionConfirmed(UserChoice {
            encoding_id: "22".to_string(),
            has_audio: true,
            container_format: ContainerFormat::Webm,
        }));
        let expected = DownloadRequest {
            source_url: "https://youtu.be/abc123".to_string(),
            encoding_id: "22".to_string(),
            has_audio: true,
            container_format: ContainerFormat::Webm,
            destination_directory: PathBuf::from("/tmp/videos"),
            is_playlist: true,
        };
        assert!(commands.contains(&Command::StartDownload(expected)));
        assert!(!orchestrator.accepts_submission());

        let commands = orchestrator.handle(Event::TaskCompleted(TaskResult::Failure("Error: boom".to_string())));
        assert!(orchestrator.accepts_submission());
        assert!(matches!(&commands[0], Command::Notify(n) if n.status == "✗ Download failed"));
    }

    #[test]
    fn stale_events_are_ignored() {
        let mut orchestrator = Orchestrator::new();
        assert!(orchestrator.handle(Event::ProbeSucceeded(video(None))).is_empty());
        assert!(orchestrator.handle(Event::TaskCompleted(TaskResult::Success("ok".to_string()))).is_empty());
        assert_eq!(orchestrator.state(), &OrchestratorState::Idle);
    }
}
