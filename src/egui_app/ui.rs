//! egui renderer for the application UI.

pub mod style;

use std::path::{Path, PathBuf};
use std::time::Duration;

use eframe::egui::{
    self, FontId, RichText, TextureHandle, Ui,
    text::{LayoutJob, TextFormat},
};

use crate::classifier::Prediction;
use crate::config;
use crate::egui_app::controller::EguiController;
use crate::egui_app::state::RequestState;
use crate::explanation::{Block, Span};

/// Longest edge of the selected-image preview, in pixels.
const PREVIEW_MAX_EDGE: u32 = 320;

/// Renders the egui UI using the shared controller state.
pub struct EguiApp {
    controller: EguiController,
    visuals_set: bool,
    preview: Option<Preview>,
}

/// Cached preview for the current selection; `texture` stays `None` when the
/// file did not decode as an image.
struct Preview {
    path: PathBuf,
    texture: Option<TextureHandle>,
}

impl EguiApp {
    /// Create the app, loading persisted configuration.
    pub fn new() -> Result<Self, String> {
        let config =
            config::load_or_default().map_err(|err| format!("Failed to load config: {err}"))?;
        Ok(Self {
            controller: EguiController::new(config),
            visuals_set: false,
            preview: None,
        })
    }

    fn apply_visuals(&mut self, ctx: &egui::Context) {
        if self.visuals_set {
            return;
        }
        let mut visuals = egui::Visuals::dark();
        style::apply_visuals(&mut visuals);
        ctx.set_visuals(visuals);
        self.visuals_set = true;
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("MammoGuard").color(style::palette().text_strong));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Close").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });
    }

    fn render_upload_form(&mut self, ui: &mut Ui) {
        let palette = style::palette();
        ui.heading("Upload Mammograph");
        ui.label(
            RichText::new("Upload your mammograph to get a prediction.")
                .color(palette.text_muted),
        );
        ui.add_space(10.0);

        ui.horizontal(|ui| {
            if ui.button("Choose image…").clicked() {
                self.controller.select_image_via_dialog();
            }
            match &self.controller.ui.selected {
                Some(image) => {
                    ui.label(RichText::new(&image.file_name).color(palette.text_primary));
                }
                None => {
                    ui.label(RichText::new("No file selected").color(palette.text_muted));
                }
            }
        });

        if let Some(texture) = self
            .preview
            .as_ref()
            .and_then(|preview| preview.texture.as_ref())
        {
            ui.add_space(8.0);
            ui.add(
                egui::Image::new(texture)
                    .max_size(egui::vec2(PREVIEW_MAX_EDGE as f32, PREVIEW_MAX_EDGE as f32)),
            );
        }

        ui.add_space(10.0);
        let loading = self.controller.ui.request.is_loading();
        let label = if loading { "Processing..." } else { "Upload" };
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.controller.ui.can_submit(), egui::Button::new(label))
                .clicked()
            {
                self.controller.submit();
            }
            if loading {
                ui.add(egui::Spinner::new());
            }
        });
    }

    fn render_outcome(&mut self, ui: &mut Ui) {
        let palette = style::palette();
        match self.controller.ui.request.clone() {
            RequestState::Idle | RequestState::Loading => {}
            RequestState::Failed(message) => {
                ui.add_space(12.0);
                ui.label(RichText::new(message).color(palette.warning));
            }
            RequestState::Succeeded(prediction) => {
                ui.add_space(12.0);
                self.render_prediction(ui, &prediction);
            }
        }
    }

    fn render_prediction(&mut self, ui: &mut Ui, prediction: &Prediction) {
        let palette = style::palette();
        ui.heading("Prediction Result");
        ui.label(
            RichText::new(format!("Class: {}", prediction.class)).color(palette.text_strong),
        );
        ui.label(
            RichText::new(format!("Confidence: {}", prediction.confidence))
                .color(palette.text_primary),
        );
        ui.add_space(8.0);

        let toggle_label = if self.controller.ui.explanation_open {
            "Hide precautions and suggestions"
        } else {
            "Precautions and suggestions"
        };
        if ui.button(toggle_label).clicked() {
            self.controller.toggle_explanation_panel();
        }
        if self.controller.ui.explanation_open {
            ui.add_space(8.0);
            egui::ScrollArea::vertical().show(ui, |ui| {
                render_explanation(ui, &prediction.explanation);
            });
        }
    }

    /// Keep the preview texture in sync with the current selection.
    fn ensure_preview(&mut self, ctx: &egui::Context) {
        let Some(selected) = self.controller.ui.selected.clone() else {
            self.preview = None;
            return;
        };
        if self
            .preview
            .as_ref()
            .is_some_and(|preview| preview.path == selected.path)
        {
            return;
        }
        let texture = load_preview_image(&selected.path).map(|image| {
            ctx.load_texture("selected_image_preview", image, egui::TextureOptions::LINEAR)
        });
        self.preview = Some(Preview {
            path: selected.path,
            texture,
        });
    }
}

impl eframe::App for EguiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_visuals(ctx);
        self.controller.poll_background_jobs();
        if self.controller.request_pending() {
            ctx.request_repaint_after(Duration::from_millis(150));
        }
        self.ensure_preview(ctx);
        self.render_top_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_upload_form(ui);
            self.render_outcome(ui);
        });
    }
}

/// Render sanitized explanation blocks; never interprets the text as markup.
fn render_explanation(ui: &mut Ui, raw: &str) {
    let palette = style::palette();
    for block in crate::explanation::format_text(raw) {
        match block {
            Block::Heading(text) => {
                ui.add_space(4.0);
                ui.label(RichText::new(text).color(palette.text_strong).size(15.0));
            }
            Block::Bullet(spans) => {
                ui.label(spans_job(ui, "•  ", &spans));
            }
            Block::Paragraph(spans) => {
                ui.label(spans_job(ui, "", &spans));
            }
        }
    }
}

fn spans_job(ui: &Ui, prefix: &str, spans: &[Span]) -> LayoutJob {
    let palette = style::palette();
    let body = TextFormat {
        font_id: FontId::proportional(13.0),
        color: palette.text_primary,
        ..Default::default()
    };
    let strong = TextFormat {
        font_id: FontId::proportional(13.0),
        color: palette.text_strong,
        ..Default::default()
    };
    let mut job = LayoutJob::default();
    job.wrap.max_width = ui.available_width();
    if !prefix.is_empty() {
        job.append(prefix, 0.0, body.clone());
    }
    for span in spans {
        match span {
            Span::Text(text) => job.append(text, 0.0, body.clone()),
            Span::Strong(text) => job.append(text, 0.0, strong.clone()),
        }
    }
    job
}

/// Decode a downscaled preview of the selected file, if it is an image.
fn load_preview_image(path: &Path) -> Option<egui::ColorImage> {
    let decoded = match image::open(path) {
        Ok(decoded) => decoded,
        Err(err) => {
            tracing::debug!("No preview for {}: {err}", path.display());
            return None;
        }
    };
    let thumbnail = decoded.thumbnail(PREVIEW_MAX_EDGE, PREVIEW_MAX_EDGE).to_rgba8();
    let size = [thumbnail.width() as usize, thumbnail.height() as usize];
    Some(egui::ColorImage::from_rgba_unmultiplied(
        size,
        thumbnail.as_raw(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    #[test]
    fn preview_decodes_and_downscales_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        let pixel = Rgba([120u8, 20, 20, 255]);
        ImageBuffer::from_pixel(800, 400, pixel).save(&path).unwrap();

        let preview = load_preview_image(&path).unwrap();
        assert!(preview.size[0] <= PREVIEW_MAX_EDGE as usize);
        assert!(preview.size[1] <= PREVIEW_MAX_EDGE as usize);
    }

    #[test]
    fn preview_is_skipped_for_non_image_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(load_preview_image(&path).is_none());
    }
}
