//! Probe → select → download round trips through the application shell,
//! with yt-dlp and ffmpeg replaced by in-process fakes.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tubegrab::{
    AppError, ContainerFormat, DialogOutcome, Encoding, Extractor, FetchJob, Metadata, Muxer,
    OrchestratorState, PlaylistAnswer, RawProgress, RawStatus, Settings, Severity, TubeGrab,
};

struct FakeExtractor {
    metadata: Metadata,
    progress: Vec<RawProgress>,
    jobs: Mutex<Vec<FetchJob>>,
}

impl Extractor for FakeExtractor {
    fn probe(&self, _url: &str) -> Result<Metadata, AppError> {
        Ok(self.metadata.clone())
    }

    fn fetch(&self, job: &FetchJob, on_progress: &mut dyn FnMut(RawProgress)) -> Result<(), AppError> {
        self.jobs.lock().unwrap().push(job.clone());
        for raw in &self.progress {
            on_progress(raw.clone());
        }
        Ok(())
    }
}

struct FakeMuxer(bool);

impl Muxer for FakeMuxer {
    fn is_installed(&self) -> bool {
        self.0
    }

    fn responds_to_version_query(&self) -> bool {
        self.0
    }
}

fn encoding(id: &str, height: u32, has_audio: bool) -> Encoding {
    Encoding {
        id: id.to_string(),
        height_pixels: height,
        frame_rate: 0.0,
        container: "mp4".to_string(),
        has_audio,
    }
}

fn single_video() -> Metadata {
    Metadata {
        title: Some("Never Gonna".to_string()),
        duration_seconds: Some(213),
        uploader: Some("Rick".to_string()),
        entries: Vec::new(),
        encodings: vec![
            encoding("137", 1080, false),
            encoding("22", 720, true),
            encoding("18", 480, true),
        ],
    }
}

fn progress(status: RawStatus, downloaded: Option<u64>, total: Option<u64>) -> RawProgress {
    RawProgress {
        status,
        downloaded_bytes: downloaded,
        total_bytes: total,
        total_bytes_estimate: None,
        speed: Some("3.2MiB/s".to_string()),
    }
}

fn app(extractor: Arc<FakeExtractor>, muxer_installed: bool) -> TubeGrab {
    let settings = Settings {
        dark_mode: true,
        download_folder: "/tmp/tubegrab-test".to_string(),
    };
    let mut app = TubeGrab::with_collaborators(settings, extractor, Arc::new(FakeMuxer(muxer_installed)));
    app.url_input = "https://youtu.be/abc123".to_string();
    app.previews_enabled = false;
    app
}

/// Poll the shell until `done` holds
fn pump(app: &mut TubeGrab, done: impl Fn(&TubeGrab) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(app) {
        assert!(Instant::now() < deadline, "timed out in state {}", app.orchestrator.state());
        app.poll_tasks();
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn single_video_defaults_to_tallest_and_pairs_audio() {
    let extractor = Arc::new(FakeExtractor {
        metadata: single_video(),
        progress: vec![
            progress(RawStatus::Downloading, Some(50), Some(100)),
            progress(RawStatus::Finished, Some(100), Some(100)),
        ],
        jobs: Mutex::new(Vec::new()),
    });
    let mut app = app(Arc::clone(&extractor), true);

    app.submit();
    assert!(app.is_busy());
    pump(&mut app, |app| app.selection_dialog.is_some());

    let choice = app.selection_dialog.as_mut().unwrap().confirm().unwrap();
    assert_eq!(choice.encoding_id, "137");
    assert_eq!(choice.container_format, ContainerFormat::Mp4);
    app.finish_selection(DialogOutcome::Confirmed(choice));

    pump(&mut app, |app| !app.is_busy());

    let jobs = extractor.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].format_selector, "137+bestaudio/best");
    assert_eq!(jobs[0].merge_format, ContainerFormat::Mp4);
    assert_eq!(app.progress_percent, 100);
    assert_eq!(app.status_severity, Severity::Success);
    assert_eq!(app.status, "✓ Download completed successfully!");
    assert_eq!(app.completed_folder(), Some(&PathBuf::from("/tmp/tubegrab-test")));
}

#[test]
fn declined_playlist_never_downloads() {
    let entries = (1..=5)
        .map(|i| Metadata {
            title: Some(format!("Track {}", i)),
            encodings: vec![encoding("22", 720, true)],
            ..Metadata::default()
        })
        .collect();
    let extractor = Arc::new(FakeExtractor {
        metadata: Metadata {
            title: Some("Album".to_string()),
            entries,
            ..Metadata::default()
        },
        progress: Vec::new(),
        jobs: Mutex::new(Vec::new()),
    });
    let mut app = app(Arc::clone(&extractor), true);

    app.submit();
    pump(&mut app, |app| app.playlist_prompt.is_some());
    assert_eq!(app.playlist_prompt.as_ref().unwrap().entry_count, 5);

    app.answer_playlist(PlaylistAnswer::No);
    assert_eq!(app.orchestrator.state(), &OrchestratorState::Idle);
    assert!(app.download_task.is_none());
    assert!(app.selection_dialog.is_none());
    assert_eq!(app.status, "Download cancelled");
    assert!(extractor.jobs.lock().unwrap().is_empty());
}

#[test]
fn confirmed_playlist_downloads_with_index_prefix() {
    let extractor = Arc::new(FakeExtractor {
        metadata: Metadata {
            title: Some("Album".to_string()),
            entries: vec![Metadata {
                encodings: vec![encoding("22", 720, true)],
                ..Metadata::default()
            }],
            ..Metadata::default()
        },
        progress: vec![progress(RawStatus::Finished, None, None)],
        jobs: Mutex::new(Vec::new()),
    });
    let mut app = app(Arc::clone(&extractor), true);

    app.submit();
    pump(&mut app, |app| app.playlist_prompt.is_some());
    app.answer_playlist(PlaylistAnswer::Yes);

    let dialog = app.selection_dialog.as_mut().expect("selection dialog");
    assert_eq!(dialog.metadata().display_title(), "Album");
    dialog.set_container(ContainerFormat::Mkv);
    let choice = dialog.confirm().unwrap();
    app.finish_selection(DialogOutcome::Confirmed(choice));
    pump(&mut app, |app| !app.is_busy());

    let jobs = extractor.jobs.lock().unwrap();
    assert_eq!(jobs[0].format_selector, "22");
    assert!(jobs[0].output_template.ends_with("%(playlist_index)s - %(title)s.%(ext)s"));
    assert_eq!(jobs[0].merge_format, ContainerFormat::Mkv);
}

#[test]
fn cancelled_selection_returns_to_idle() {
    let extractor = Arc::new(FakeExtractor {
        metadata: single_video(),
        progress: Vec::new(),
        jobs: Mutex::new(Vec::new()),
    });
    let mut app = app(Arc::clone(&extractor), false);

    app.submit();
    pump(&mut app, |app| app.selection_dialog.is_some());
    app.finish_selection(DialogOutcome::Cancelled);

    assert!(!app.is_busy());
    assert!(app.download_task.is_none());
    assert!(extractor.jobs.lock().unwrap().is_empty());
}

#[test]
fn empty_url_is_reported_without_probing() {
    let extractor = Arc::new(FakeExtractor {
        metadata: single_video(),
        progress: Vec::new(),
        jobs: Mutex::new(Vec::new()),
    });
    let mut app = app(extractor, true);
    app.url_input = "   ".to_string();

    app.submit();
    assert!(!app.is_busy());
    assert!(app.probe_task.is_none());
    assert_eq!(app.status, "Please enter a video or playlist URL!");
    assert!(app.notice_dialog.is_some());
}
