use starscape_tools::{AssetState, SceneInspector};

use crate::state::AppState;

/// Controls window: the stock parameters, frame stats and scene summary.
pub fn draw_panel(ctx: &egui::Context, state: &mut AppState) {
    if !state.panel.is_open() {
        egui::Area::new(egui::Id::new("open_controls"))
            .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
            .show(ctx, |ui| {
                if ui.button("Open Controls").clicked() {
                    state.panel.set_open(true);
                }
            });
        return;
    }

    let mut open = true;
    egui::Window::new("Controls")
        .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
        .resizable(false)
        .open(&mut open)
        .show(ctx, |ui| {
            let params: Vec<_> = state
                .panel
                .params()
                .map(|(id, p)| (id, p.clone()))
                .collect();
            for (id, param) in params {
                let mut value = param.value;
                let (lo, hi) = param.bounds();
                let slider = egui::Slider::new(&mut value, lo..=hi)
                    .step_by(f64::from(param.step))
                    .text(param.name.as_str());
                if ui.add(slider).changed() {
                    state.panel.set(id, value);
                }
            }

            ui.separator();
            let timer = state.scheduler.timer();
            ui.label(format!(
                "{:.1} fps ({:.2} ms avg, {:.2} ms max)",
                timer.fps(),
                timer.average().as_secs_f64() * 1000.0,
                timer.max().as_secs_f64() * 1000.0
            ));

            ui.collapsing("Scene", |ui| {
                let statuses = state.asset_statuses();
                let summary = SceneInspector::summary(&state.scene, &statuses);
                ui.label(format!(
                    "{} nodes, {} lights",
                    summary.node_count, summary.light_count
                ));
                for (kind, count) in &summary.kinds {
                    ui.label(format!("{kind}: {count}"));
                }
                ui.separator();
                for status in &statuses {
                    let text = egui::RichText::new(status.to_string());
                    let text = match status.state {
                        AssetState::Failed(_) => text.color(egui::Color32::LIGHT_RED),
                        AssetState::Pending => text.weak(),
                        AssetState::Loaded => text,
                    };
                    ui.label(text);
                }
            });
        });
    if !open {
        state.panel.set_open(false);
    }
}
