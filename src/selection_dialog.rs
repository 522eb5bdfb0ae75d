//! Quality and container selection window
//!
//! The dialog is plain UI state: the ranked encodings of one video, the
//! chosen index and container, and the advisory ffmpeg status reported by a
//! background check. It never touches the orchestrator; [`SelectionDialog::show`]
//! hands back a [`DialogOutcome`] and the caller turns that into an event.

use std::sync::mpsc::{Receiver, TryRecvError};

use eframe::egui;
use log::{debug, info};

use crate::config::{SELECTION_DIALOG_WIDTH, THUMBNAIL_MAX_SIZE};
use crate::data_structures::{ContainerFormat, Encoding, Metadata, UserChoice};
use crate::error::AppError;

/// Shown in place when confirming without a selectable encoding
pub const NO_SELECTION_ERROR: &str = "Please select a quality option!";

/// Result of the background ffmpeg probe
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MuxerStatus {
    Checking,
    Available,
    Missing,
}

/// How the user left the dialog
#[derive(Clone, Debug, PartialEq)]
pub enum DialogOutcome {
    Confirmed(UserChoice),
    Cancelled,
}

pub struct SelectionDialog {
    metadata: Metadata,
    selected: Option<usize>,
    container: ContainerFormat,
    muxer_status: MuxerStatus,
    muxer_receiver: Option<Receiver<bool>>,
    error: Option<String>,
}

impl SelectionDialog {
    /// Open the dialog for one video; the first (tallest) encoding is preselected
    pub fn new(metadata: Metadata, muxer_receiver: Receiver<bool>) -> Self {
        let selected = if metadata.encodings.is_empty() { None } else { Some(0) };
        debug!(
            "Selection dialog for '{}' with {} encodings",
            metadata.display_title(),
            metadata.encodings.len()
        );
        Self {
            metadata,
            selected,
            container: ContainerFormat::default(),
            muxer_status: MuxerStatus::Checking,
            muxer_receiver: Some(muxer_receiver),
            error: None,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn selected_encoding(&self) -> Option<&Encoding> {
        self.selected.and_then(|index| self.metadata.encodings.get(index))
    }

    /// Out-of-range indices are ignored
    pub fn select_encoding(&mut self, index: usize) {
        if index < self.metadata.encodings.len() {
            self.selected = Some(index);
            self.error = None;
        }
    }

    pub fn container(&self) -> ContainerFormat {
        self.container
    }

    pub fn set_container(&mut self, container: ContainerFormat) {
        self.container = container;
    }

    pub fn muxer_status(&self) -> MuxerStatus {
        self.muxer_status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Pick up the ffmpeg check result once it arrives
    ///
    /// A check thread that died without answering counts as missing.
    pub fn poll_muxer(&mut self) {
        let Some(receiver) = &self.muxer_receiver else {
            return;
        };
        let status = match receiver.try_recv() {
            Ok(true) => MuxerStatus::Available,
            Ok(false) | Err(TryRecvError::Disconnected) => MuxerStatus::Missing,
            Err(TryRecvError::Empty) => return,
        };
        debug!("FFmpeg status: {:?}", status);
        self.muxer_status = status;
        self.muxer_receiver = None;
    }

    /// Resolve the current selection into a choice
    ///
    /// With nothing selectable the error is kept for display and the dialog
    /// stays open.
    pub fn confirm(&mut self) -> Result<UserChoice, AppError> {
        let Some(encoding) = self.selected_encoding() else {
            self.error = Some(NO_SELECTION_ERROR.to_string());
            return Err(AppError::Validation(NO_SELECTION_ERROR.to_string()));
        };
        let choice = UserChoice {
            encoding_id: encoding.id.clone(),
            has_audio: encoding.has_audio,
            container_format: self.container,
        };
        info!("Selected {} as {}", encoding.option_text(), choice.container_format);
        self.error = None;
        Ok(choice)
    }

    /// Draw the dialog and report how it was closed, if it was
    pub fn show(&mut self, ctx: &egui::Context, thumbnail: Option<&egui::TextureHandle>) -> Option<DialogOutcome> {
        self.poll_muxer();

        let mut open = true;
        let mut outcome = None;
        egui::Window::new("Select Quality and Format")
            .collapsible(false)
            .resizable(false)
            .default_width(SELECTION_DIALOG_WIDTH)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .open(&mut open)
            .show(ctx, |ui| {
                self.render_details(ui, thumbnail);
                ui.separator();
                self.render_encodings(ui);
                ui.separator();
                self.render_container(ui);
                self.render_muxer_status(ui);

                if let Some(error) = &self.error {
                    ui.colored_label(ui.visuals().error_fg_color, error);
                }

                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        outcome = Some(DialogOutcome::Cancelled);
                    }
                    if ui.button("Download").clicked() {
                        if let Ok(choice) = self.confirm() {
                            outcome = Some(DialogOutcome::Confirmed(choice));
                        }
                    }
                });
            });

        if !open && outcome.is_none() {
            outcome = Some(DialogOutcome::Cancelled);
        }
        outcome
    }

    fn render_details(&self, ui: &mut egui::Ui, thumbnail: Option<&egui::TextureHandle>) {
        if let Some(texture) = thumbnail {
            ui.vertical_centered(|ui| {
                ui.add(
                    egui::Image::from_texture(egui::load::SizedTexture::from_handle(texture))
                        .max_size(egui::vec2(THUMBNAIL_MAX_SIZE[0], THUMBNAIL_MAX_SIZE[1])),
                );
            });
            ui.add_space(4.0);
        }
        ui.label(egui::RichText::new(self.metadata.display_title()).strong().size(16.0));
        ui.label(format!("Duration: {}", self.metadata.display_duration()));
        ui.label(format!("Uploader: {}", self.metadata.display_uploader()));
    }

    fn render_encodings(&mut self, ui: &mut egui::Ui) {
        ui.label("Quality:");
        if self.metadata.encodings.is_empty() {
            ui.label("No downloadable formats were found.");
            return;
        }
        let mut clicked = None;
        egui::ScrollArea::vertical().max_height(180.0).show(ui, |ui| {
            for (index, encoding) in self.metadata.encodings.iter().enumerate() {
                if ui.radio(self.selected == Some(index), encoding.option_text()).clicked() {
                    clicked = Some(index);
                }
            }
        });
        if let Some(index) = clicked {
            self.select_encoding(index);
        }
    }

    fn render_container(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Container:");
            egui::ComboBox::from_id_source("container_format")
                .selected_text(self.container.description())
                .show_ui(ui, |ui| {
                    for format in ContainerFormat::ALL {
                        ui.selectable_value(&mut self.container, format, format.description());
                    }
                });
        });
    }

    fn render_muxer_status(&self, ui: &mut egui::Ui) {
        let (text, color) = match self.muxer_status {
            MuxerStatus::Checking => ("Checking for FFmpeg...", ui.visuals().weak_text_color()),
            MuxerStatus::Available => ("✓ FFmpeg detected", egui::Color32::from_rgb(80, 250, 123)),
            MuxerStatus::Missing => (
                "⚠ FFmpeg not found: video-only qualities fall back to the best single file",
                ui.visuals().warn_fg_color,
            ),
        };
        ui.colored_label(color, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn metadata(encodings: Vec<Encoding>) -> Metadata {
        Metadata {
            title: Some("Clip".to_string()),
            encodings,
            ..Metadata::default()
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

    fn dialog(encodings: Vec<Encoding>) -> (SelectionDialog, mpsc::Sender<bool>) {
        let (tx, rx) = mpsc::channel();
        (SelectionDialog::new(metadata(encodings), rx), tx)
    }

    #[test]
    fn defaults_to_first_encoding_and_mp4() {
        let (mut dialog, _tx) = dialog(vec![encoding("137", 1080, false), encoding("22", 720, true)]);
        assert_eq!(dialog.container(), ContainerFormat::Mp4);
        let choice = dialog.confirm().unwrap();
        assert_eq!(
            choice,
            UserChoice {
                encoding_id: "137".to_string(),
                has_audio: false,
                container_format: ContainerFormat::Mp4,
            }
        );
    }

    #[test]
    fn changing_selection_and_container() {
        let (mut dialog, _tx) = dialog(vec![encoding("137", 1080, false), encoding("22", 720, true)]);
        dialog.select_encoding(1);
        dialog.select_encoding(7);
        dialog.set_container(ContainerFormat::Mkv);
        let choice = dialog.confirm().unwrap();
        assert_eq!(choice.encoding_id, "22");
        assert!(choice.has_audio);
        assert_eq!(choice.container_format, ContainerFormat::Mkv);
    }

    #[test]
    fn confirming_without_encodings_is_rejected_in_place() {
        let (mut dialog, _tx) = dialog(Vec::new());
        let err = dialog.confirm().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(dialog.error(), Some(NO_SELECTION_ERROR));
    }

    #[test]
    fn muxer_status_follows_background_check() {
        let (mut dialog, tx) = dialog(vec![encoding("22", 720, true)]);
        dialog.poll_muxer();
        assert_eq!(dialog.muxer_status(), MuxerStatus::Checking);
        tx.send(true).unwrap();
        dialog.poll_muxer();
        assert_eq!(dialog.muxer_status(), MuxerStatus::Available);
    }

    #[test]
    fn dead_muxer_check_counts_as_missing() {
        let (mut dialog, tx) = dialog(vec![encoding("22", 720, true)]);
        drop(tx);
        dialog.poll_muxer();
        assert_eq!(dialog.muxer_status(), MuxerStatus::Missing);
    }
}
