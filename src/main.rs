//! TubeGrab - Video Downloader Tool
//!
//! A desktop application for downloading videos and playlists through yt-dlp.
//! Built with Rust and egui for cross-platform (Windows, Linux & macOS)

use eframe::egui;
use log::{error, info};

use tubegrab::config::{APP_NAME, APP_VERSION, MIN_WINDOW_SIZE, WINDOW_SIZE};
use tubegrab::gui::configure_visuals;
use tubegrab::logging::{setup_logging, shutdown_logging};
use tubegrab::TubeGrab;

/// Configure the application window
fn configure_window() -> eframe::NativeOptions {
    let viewport_builder = egui::ViewportBuilder::default()
        .with_title(format!("{} v{}", APP_NAME, APP_VERSION))
        .with_inner_size(WINDOW_SIZE)
        .with_decorations(true)
        .with_resizable(true)
        .with_min_inner_size(MIN_WINDOW_SIZE); // Minimum window size to prevent UI elements from disappearing

    eframe::NativeOptions {
        viewport: viewport_builder,
        centered: true,
        ..Default::default()
    }
}

fn main() {
    if let Err(e) = setup_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }
    info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let native_options = configure_window();
    info!("Initializing GUI with window size: {}x{}", WINDOW_SIZE[0], WINDOW_SIZE[1]);

    let result = eframe::run_native(
        APP_NAME,
        native_options,
        Box::new(|cc| {
            let app = TubeGrab::default();
            configure_visuals(&cc.egui_ctx, app.dark_mode);
            info!("GUI initialized successfully");
            Box::new(app)
        }),
    );

    if let Err(e) = result {
        error!("Failed to start eframe: {}", e);
        eprintln!("Failed to start {}: {}", APP_NAME, e);
    }

    // No-op if on_exit already shut the logger down
    shutdown_logging();
}
