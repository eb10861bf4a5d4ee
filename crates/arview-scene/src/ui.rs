//! Model selector overlay using bevy_egui

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use crate::models::{ModelSwap, SelectModel};
use crate::settings::ViewerSettings;
use crate::tracking::{MarkerVisible, TrackingMode};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        // Runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
        app.add_systems(EguiPrimaryContextPass, ui_system);
    }
}

/// Status shown under the selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapStatus {
    Loading(String),
    Failed(String),
}

impl SwapStatus {
    /// Loading wins over a stale error from an earlier selection
    pub fn from_swap(swap: &ModelSwap) -> Option<Self> {
        if let Some(identifier) = swap.loading_identifier() {
            return Some(Self::Loading(identifier.to_string()));
        }
        swap.last_error.clone().map(Self::Failed)
    }
}

fn ui_system(
    mut contexts: EguiContexts,
    swap: Res<ModelSwap>,
    settings: Res<ViewerSettings>,
    mode: Res<TrackingMode>,
    marker_visible: Option<Res<MarkerVisible>>,
    mut select: MessageWriter<SelectModel>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let Some(controller) = swap.controller() else {
        return;
    };

    let catalog = controller.catalog();
    let current = controller.selected_index();
    let mut requested = None;

    egui::Area::new(egui::Id::new("model_selector"))
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 10.0))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(settings.ui.panel_width);
                ui.horizontal(|ui| {
                    ui.label(&settings.ui.select_label);
                    egui::ComboBox::from_id_salt("model_select")
                        .selected_text(controller.selected_identifier())
                        .show_ui(ui, |ui| {
                            for (i, identifier) in catalog.iter().enumerate() {
                                if ui.selectable_label(i == current, identifier).clicked() {
                                    requested = Some(i);
                                }
                            }
                        });
                });

                match SwapStatus::from_swap(&swap) {
                    Some(SwapStatus::Loading(identifier)) => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(format!("Loading {}", identifier));
                        });
                    }
                    Some(SwapStatus::Failed(error)) => {
                        ui.colored_label(egui::Color32::from_rgb(230, 80, 80), error);
                    }
                    None => {}
                }

                if *mode == TrackingMode::Marker {
                    let seen = marker_visible.as_ref().is_some_and(|v| v.0);
                    let (color, text) = if seen {
                        (egui::Color32::GREEN, "Marker tracked")
                    } else {
                        (egui::Color32::GRAY, "Searching for marker")
                    };
                    ui.colored_label(color, text);
                }
            });
        });

    if let Some(index) = requested.filter(|&index| swap.wants_select(index)) {
        select.write(SelectModel(index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_without_controller_reports_error() {
        let mut swap = ModelSwap::default();
        swap.last_error = Some("catalog is empty".to_string());
        assert_eq!(
            SwapStatus::from_swap(&swap),
            Some(SwapStatus::Failed("catalog is empty".to_string()))
        );
        assert_eq!(SwapStatus::from_swap(&ModelSwap::default()), None);
    }

    #[test]
    fn test_no_selection_without_controller() {
        let swap = ModelSwap::default();
        assert!(!swap.wants_select(0));
        assert!(!swap.wants_select(1));
    }
}
