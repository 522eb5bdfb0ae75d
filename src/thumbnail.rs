//! Video preview images fetched from YouTube's image host

use std::sync::mpsc::{self, Receiver};
use std::thread;

use eframe::egui::ColorImage;
use log::{debug, warn};

use crate::config::{THUMBNAIL_FALLBACK_URL_TEMPLATE, THUMBNAIL_TIMEOUT, THUMBNAIL_URL_TEMPLATE};
use crate::error::AppError;

fn thumbnail_url(template: &str, video_id: &str) -> String {
    template.replace("{id}", video_id)
}

fn download_image(client: &reqwest::blocking::Client, url: &str) -> Result<ColorImage, AppError> {
    let bytes = client.get(url).send()?.error_for_status()?.bytes()?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| AppError::Download(format!("Undecodable thumbnail: {}", e)))?
        .to_rgba8();
    let size = [img.width() as usize, img.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, &img))
}

/// Download and decode a thumbnail, trying the high resolution variant first
///
/// Returns `None` when neither image is available; the dialog then simply
/// shows no preview.
pub fn fetch_thumbnail(video_id: &str) -> Option<ColorImage> {
    let client = reqwest::blocking::Client::builder()
        .timeout(THUMBNAIL_TIMEOUT)
        .build()
        .map_err(|e| warn!("Failed to build HTTP client: {}", e))
        .ok()?;

    for template in [THUMBNAIL_URL_TEMPLATE, THUMBNAIL_FALLBACK_URL_TEMPLATE] {
        let url = thumbnail_url(template, video_id);
        match download_image(&client, &url) {
            Ok(image) => {
                debug!("Loaded thumbnail {}", url);
                return Some(image);
            }
            Err(e) => debug!("Thumbnail {} unavailable: {}", url, e),
        }
    }
    warn!("No thumbnail available for {}", video_id);
    None
}

/// Fetch a thumbnail on a worker thread
///
/// The receiver yields at most one image and disconnects if none was found.
pub fn spawn_fetch(video_id: String) -> Receiver<ColorImage> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        if let Some(image) = fetch_thumbnail(&video_id) {
            let _ = tx.send(image);
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_templates_substitute_video_id() {
        assert_eq!(
            thumbnail_url(THUMBNAIL_URL_TEMPLATE, "abc123"),
            "https://img.youtube.com/vi/abc123/maxresdefault.jpg"
        );
        assert_eq!(
            thumbnail_url(THUMBNAIL_FALLBACK_URL_TEMPLATE, "abc123"),
            "https://img.youtube.com/vi/abc123/hqdefault.jpg"
        );
    }
}
