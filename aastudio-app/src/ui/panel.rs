//! "Control Panel" window. Widgets read a snapshot of the viewer state and
//! report edits as `PanelAction`s; the app applies them between frames.

use aastudio_gpu_shared::config::{
    AaConfiguration, ActiveModel, MsaaSamples, SmaaQuality, Technique, VIEWPOINTS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    SetEnabled(bool),
    SetChecked(Technique, bool),
    MsaaSamples(MsaaSamples),
    SmaaQuality(SmaaQuality),
    /// Index into `VIEWPOINTS`.
    Viewpoint(usize),
    Scene(ActiveModel),
    Exit,
}

// ─── Frame stats ─────────────────────────────────────────────────────

/// Frame time averaged over half-second windows.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    frames: u32,
    elapsed: f32,
    frame_ms: f32,
    fps: f32,
}

impl FrameStats {
    const WINDOW_SECS: f32 = 0.5;

    pub fn record(&mut self, dt: f32) {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed >= Self::WINDOW_SECS {
            self.frame_ms = self.elapsed * 1000.0 / self.frames as f32;
            self.fps = self.frames as f32 / self.elapsed;
            self.frames = 0;
            self.elapsed = 0.0;
        }
    }

    pub fn frame_ms(&self) -> f32 {
        self.frame_ms
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

// ─── Panel ───────────────────────────────────────────────────────────

/// What the panel displays this frame.
pub struct PanelView<'a> {
    pub config: &'a AaConfiguration,
    pub active_model: ActiveModel,
    pub stats: &'a FrameStats,
    /// Adapter name and backend, shown under the frame time.
    pub adapter: &'a str,
}

impl PanelView<'_> {
    pub fn show(&self, ctx: &egui::Context) -> Vec<PanelAction> {
        let mut actions = Vec::new();

        egui::Window::new("Control Panel")
            .default_pos([10.0, 10.0])
            .resizable(false)
            .movable(false)
            .show(ctx, |ui| {
                self.anti_aliasing(ui, &mut actions);

                ui.separator();
                ui.strong("Viewpoint");
                ui.horizontal(|ui| {
                    for i in 0..VIEWPOINTS.len() {
                        if ui.button(format!("{}", i + 1)).clicked() {
                            actions.push(PanelAction::Viewpoint(i));
                        }
                    }
                });

                ui.separator();
                ui.strong("Scene");
                let mut scene = self.active_model;
                egui::ComboBox::from_id_salt("scene")
                    .selected_text(scene.label())
                    .show_ui(ui, |ui| {
                        for model in ActiveModel::ALL {
                            ui.selectable_value(&mut scene, model, model.label());
                        }
                    });
                if scene != self.active_model {
                    actions.push(PanelAction::Scene(scene));
                }

                ui.separator();
                ui.label(format!(
                    "{:.2} ms/frame ({:.0} FPS)",
                    self.stats.frame_ms(),
                    self.stats.fps()
                ));
                ui.small(self.adapter);

                ui.add_space(8.0);
                if ui.button("Exit").clicked() {
                    actions.push(PanelAction::Exit);
                }
            });

        actions
    }

    fn anti_aliasing(&self, ui: &mut egui::Ui, actions: &mut Vec<PanelAction>) {
        let config = self.config;
        ui.strong("Anti Aliasing");

        let mut enabled = config.enabled();
        if ui.checkbox(&mut enabled, "AA On").changed() {
            actions.push(PanelAction::SetEnabled(enabled));
        }

        egui::Grid::new("techniques").num_columns(2).show(ui, |ui| {
            for (i, (technique, mut checked)) in Technique::SELECTABLE
                .into_iter()
                .zip(config.flags())
                .enumerate()
            {
                if ui.checkbox(&mut checked, technique.label()).changed() {
                    actions.push(PanelAction::SetChecked(technique, checked));
                }
                if i % 2 == 1 {
                    ui.end_row();
                }
            }
        });

        let mut samples = config.msaa_samples();
        egui::ComboBox::from_label("MSAA samples")
            .selected_text(format!("{}x", samples.count()))
            .show_ui(ui, |ui| {
                for option in MsaaSamples::ALL {
                    ui.selectable_value(&mut samples, option, format!("{}x", option.count()));
                }
            });
        if samples != config.msaa_samples() {
            actions.push(PanelAction::MsaaSamples(samples));
        }

        let mut quality = config.smaa_quality();
        egui::ComboBox::from_label("SMAA quality")
            .selected_text(quality.label())
            .show_ui(ui, |ui| {
                for option in SmaaQuality::ALL {
                    ui.selectable_value(&mut quality, option, option.label());
                }
            });
        if quality != config.smaa_quality() {
            actions.push(PanelAction::SmaaQuality(quality));
        }
    }
}
