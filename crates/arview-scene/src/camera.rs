//! Camera controls and orbit navigation

use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::gizmo::ModelGizmo;
use crate::tracking::TrackingMode;

/// Orbit camera settings (Y up)
///
/// `polar` is measured from +Y and clamped so the camera never dips under
/// the shadow plane or looks straight down.
#[derive(Debug, Clone, Resource)]
pub struct CameraSettings {
    pub distance: f32,
    pub target_distance: f32,
    pub azimuth: f32,
    pub target_azimuth: f32,
    pub polar: f32,
    pub target_polar: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    pub target: Vec3,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    /// Fraction of the remaining motion applied per 60 Hz frame
    pub damping: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        let polar = 60.0_f32.to_radians();
        Self {
            distance: 6.0,
            target_distance: 6.0,
            azimuth: 0.0,
            target_azimuth: 0.0,
            polar,
            target_polar: polar,
            min_polar: 45.0_f32.to_radians(),
            max_polar: 78.0_f32.to_radians(),
            target: Vec3::new(0.0, 1.0, 0.0),
            sensitivity: 0.005,
            zoom_speed: 0.1,
            damping: 0.05,
        }
    }
}

impl CameraSettings {
    /// Camera position for the current spherical coordinates
    pub fn eye(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.target + self.distance * Vec3::new(sin_p * sin_a, cos_p, sin_p * cos_a)
    }

    /// Feed a drag delta in pixels
    pub fn rotate(&mut self, delta: Vec2) {
        self.target_azimuth -= delta.x * self.sensitivity;
        self.target_polar =
            (self.target_polar - delta.y * self.sensitivity).clamp(self.min_polar, self.max_polar);
    }

    pub fn zoom(&mut self, scroll: f32) {
        let zoom_factor = 1.0 - scroll * self.zoom_speed;
        self.target_distance = (self.target_distance * zoom_factor).clamp(1.0, 30.0);
    }

    /// Ease current values toward their targets
    pub fn step(&mut self, dt: f32) {
        let lerp_factor = 1.0 - (1.0 - self.damping).powf(dt * 60.0);
        self.distance += (self.target_distance - self.distance) * lerp_factor;
        self.azimuth += (self.target_azimuth - self.azimuth) * lerp_factor;
        self.polar += (self.target_polar - self.polar) * lerp_factor;
    }
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Plugin for camera controls
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraSettings>().add_systems(
            Update,
            update_camera.run_if(resource_equals(TrackingMode::Orbit)),
        );
    }
}

fn update_camera(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    mut settings: ResMut<CameraSettings>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    gizmo: Res<ModelGizmo>,
    time: Res<Time>,
    mut contexts: EguiContexts,
) {
    // Leave the pointer to egui, and to the gizmo while it is being dragged
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);
    let blocked = egui_wants_pointer || gizmo.dragging;

    let total_motion: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    if mouse_button.pressed(MouseButton::Left) && !blocked {
        settings.rotate(total_motion);
    }

    // Drain scroll events even while blocked
    for scroll in mouse_wheel.read() {
        if !blocked {
            settings.zoom(scroll.y);
        }
    }

    // Touch support for mobile
    if touch_input.iter().count() == 1 && !blocked {
        for touch in touch_input.iter() {
            let delta = touch.delta();
            if delta != Vec2::ZERO {
                settings.rotate(delta);
            }
        }
    }

    // Pinch to zoom
    let touches: Vec<_> = touch_input.iter().collect();
    if let [t1, t2] = touches.as_slice() {
        let curr_dist = t1.position().distance(t2.position());
        let prev_dist = (t1.position() - t1.delta()).distance(t2.position() - t2.delta());
        let zoom_factor = prev_dist / curr_dist.max(1.0);
        settings.target_distance = (settings.target_distance * zoom_factor).clamp(1.0, 30.0);
    }

    settings.step(time.delta_secs());

    if let Ok(mut transform) = camera_query.single_mut() {
        transform.translation = settings.eye();
        transform.look_at(settings.target, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polar_is_clamped() {
        let mut settings = CameraSettings::default();
        settings.rotate(Vec2::new(0.0, 10_000.0));
        assert_eq!(settings.target_polar, settings.min_polar);
        settings.rotate(Vec2::new(0.0, -10_000.0));
        assert_eq!(settings.target_polar, settings.max_polar);
    }

    #[test]
    fn test_step_eases_toward_target() {
        let mut settings = CameraSettings::default();
        settings.target_azimuth = 1.0;
        settings.step(1.0 / 60.0);
        assert!((settings.azimuth - 0.05).abs() < 1e-5);

        for _ in 0..600 {
            settings.step(1.0 / 60.0);
        }
        assert!((settings.azimuth - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_eye_above_target() {
        let settings = CameraSettings::default();
        let eye = settings.eye();
        assert!((eye.distance(settings.target) - settings.distance).abs() < 1e-4);
        assert!(eye.y > settings.target.y);
    }
}
