//! Bevy application setup

use arview_scene::tracking::install_tracking;
use arview_scene::{ArviewScenePlugin, MarkerTracker, ViewerSettings};
use bevy::prelude::*;
use bevy::winit::WinitSettings;
use bevy_egui::EguiPlugin;
use bevy_picking::{DefaultPickingPlugins, prelude::MeshPickingPlugin};

use crate::tracker::JsMarkerTracker;

/// Run the Bevy application with the fetched settings
pub fn run(settings: ViewerSettings) {
    let tracker: Result<Box<dyn MarkerTracker>, String> = if settings.tracking.enabled {
        JsMarkerTracker::connect(&settings.tracking.pattern_url)
            .map(|t| Box::new(t) as Box<dyn MarkerTracker>)
    } else {
        Err("disabled in configuration".to_string())
    };

    // In marker mode the camera feed shows through behind the canvas
    let see_through = tracker.is_ok();
    let clear_color = if see_through {
        Color::NONE
    } else {
        Color::srgb(0.1, 0.1, 0.15)
    };

    let mut app = App::new();
    app.insert_resource(ClearColor(clear_color))
        .insert_resource(WinitSettings::default())
        .insert_resource(settings)
        // Bevy 0.17+ has built-in https:// asset loading via the "https" feature
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "arview".to_string(),
                    canvas: Some("#arview-canvas".to_string()),
                    fit_canvas_to_parent: true,
                    transparent: see_through,
                    prevent_default_event_handling: false,
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                // Load assets from root (the server serves /models directly)
                file_path: "".to_string(),
                // Don't look for .meta files - server doesn't have them
                meta_check: bevy::asset::AssetMetaCheck::Never,
                ..default()
            })
        )
        // Picking plugins must be added BEFORE EguiPlugin so it can detect PickingPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(MeshPickingPlugin)
        .add_plugins(EguiPlugin::default())
        .add_plugins(ArviewScenePlugin);

    install_tracking(&mut app, tracker);
    app.run();
}
