//! arview Scene - Bevy scene, model swapping and UI
//!
//! This crate wires the rendering-independent swap controller from
//! `arview-core` into a Bevy app: lights and camera, the marker group that
//! receives model pivots, the rotate gizmo, the model dropdown and the
//! optional marker tracker.

pub mod camera;
pub mod gizmo;
pub mod models;
pub mod scene;
pub mod settings;
pub mod tracking;
pub mod ui;

use bevy::prelude::*;

/// Plugin that sets up the viewer scene, model swapping and UI
///
/// Expects a [`ViewerSettings`] resource; tracking is installed separately
/// with [`tracking::install_tracking`] before the app runs.
pub struct ArviewScenePlugin;

impl Plugin for ArviewScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewerSettings>()
            .init_resource::<TrackingMode>()
            .add_plugins(scene::SceneSetupPlugin)
            .add_plugins(camera::CameraPlugin)
            .add_plugins(gizmo::GizmoPlugin)
            .add_plugins(models::ModelsPlugin)
            .add_plugins(ui::UiPlugin);
    }
}

// Re-export commonly used types
pub use camera::CameraSettings;
pub use models::{ModelSwap, SelectModel};
pub use settings::ViewerSettings;
pub use tracking::{MarkerTracker, TrackingMode};
