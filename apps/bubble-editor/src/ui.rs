use bubble_common::{EntityId, Extent};
use bubble_editor::{EditorMode, EditorRequest, EditorRequests, EditorUi};
use bubble_render_wgpu::PickReader;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

const FRAME_WINDOW: usize = 120;

/// egui editor layer: a side panel with editor controls and the scene target
/// shown as an image. Clicking the image picks the entity under the cursor.
pub struct EguiEditorUi {
    ctx: egui::Context,
    scene_texture: egui::TextureId,
    viewport: Extent,
    picker: PickReader,
    requests: EditorRequests,
    mode: EditorMode,
    selected: Option<EntityId>,
    project: Option<PathBuf>,
    project_input: String,
    needs_refresh: bool,
    frame_times: VecDeque<f32>,
}

impl EguiEditorUi {
    pub fn new(
        ctx: egui::Context,
        scene_texture: egui::TextureId,
        viewport: Extent,
        picker: PickReader,
        requests: EditorRequests,
    ) -> Self {
        Self {
            ctx,
            scene_texture,
            viewport,
            picker,
            requests,
            mode: EditorMode::Editing,
            selected: None,
            project: None,
            project_input: String::new(),
            needs_refresh: false,
            frame_times: VecDeque::with_capacity(FRAME_WINDOW),
        }
    }

    fn fps(&self) -> f32 {
        let total: f32 = self.frame_times.iter().sum();
        if total > 0.0 {
            self.frame_times.len() as f32 / total
        } else {
            0.0
        }
    }

    fn pick_at(&mut self, rect: egui::Rect, pos: egui::Pos2) {
        let u = (pos.x - rect.min.x) / rect.width();
        let v = (pos.y - rect.min.y) / rect.height();
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return;
        }
        let x = (u * self.viewport.width as f32) as u32;
        let y = (v * self.viewport.height as f32) as u32;
        match self.picker.read(x, y) {
            Ok(id) => {
                self.selected = id.entity();
                tracing::info!(x, y, selected = ?self.selected, "picked");
            }
            Err(err) => tracing::warn!(error = %err, "pick read-back failed"),
        }
    }

    fn side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("editor_panel")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Bubble");
                ui.separator();
                ui.label(format!("Mode: {}", self.mode));
                ui.label(format!("FPS: {:.0}", self.fps()));
                if ui.button("Play (F5)").clicked() {
                    self.requests.push(EditorRequest::EnterPlayMode);
                }
                ui.small("Esc leaves play mode");

                ui.separator();
                ui.heading("Project");
                match &self.project {
                    Some(path) => ui.label(path.display().to_string()),
                    None => ui.label("No project"),
                };
                ui.horizontal(|ui| {
                    ui.text_edit_singleline(&mut self.project_input);
                    if ui.button("Open").clicked() && !self.project_input.trim().is_empty() {
                        let path = PathBuf::from(self.project_input.trim());
                        self.requests.push(EditorRequest::OpenProject(path));
                    }
                });

                ui.separator();
                ui.heading("Selection");
                match self.selected {
                    Some(entity) => ui.label(format!("Entity {entity}")),
                    None => ui.label("Nothing selected"),
                };

                ui.separator();
                ui.small("RMB: Look | WASD/QE: Move | Shift: Fast | Wheel: Dolly");
            });
    }

    fn viewport_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let size = egui::vec2(self.viewport.width as f32, self.viewport.height as f32)
                / ctx.pixels_per_point();
            let image = egui::Image::new(egui::load::SizedTexture::new(self.scene_texture, size))
                .sense(egui::Sense::click());
            let response = ui.add(image);
            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.pick_at(response.rect, pos);
                }
            }
        });
    }
}

impl EditorUi for EguiEditorUi {
    fn on_update(&mut self, dt: f32) {
        if self.frame_times.len() == FRAME_WINDOW {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(dt);
        if std::mem::take(&mut self.needs_refresh) {
            self.selected = None;
        }
    }

    fn on_draw(&mut self, _dt: f32) {
        let ctx = self.ctx.clone();
        self.side_panel(&ctx);
        self.viewport_panel(&ctx);
    }

    fn on_open_project(&mut self, path: &Path) {
        tracing::info!(path = %path.display(), "open project requested");
        self.project = Some(path.to_path_buf());
        self.needs_refresh = true;
    }

    fn on_mode_changed(&mut self, mode: EditorMode) {
        self.mode = mode;
        self.selected = None;
    }
}
