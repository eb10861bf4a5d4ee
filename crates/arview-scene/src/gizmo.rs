//! Turntable gizmo around the active model pivot
//!
//! A ring drawn around the pivot's vertical axis. Dragging along the ring
//! spins the pivot about Y; camera orbiting pauses while a drag is active.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use arview_core::{GizmoMode, InteractiveHandle, TransformGizmo};
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::camera::MainCamera;

/// Ring radius at `size == 1.0`, in world units
const RING_RADIUS: f32 = 1.2;
/// How far from the ring a press still grabs it
const GRAB_TOLERANCE: f32 = 0.25;

/// The single gizmo instance, targeting a pivot entity
#[derive(Resource, Deref, DerefMut)]
pub struct ModelGizmo {
    #[deref]
    pub handle: TransformGizmo<Entity>,
    /// Ring angle under the pointer on the previous drag frame
    last_angle: Option<f32>,
}

impl Default for ModelGizmo {
    fn default() -> Self {
        Self {
            handle: TransformGizmo::turntable(),
            last_angle: None,
        }
    }
}

impl InteractiveHandle<Entity> for ModelGizmo {
    fn attach(&mut self, node: Entity) {
        self.last_angle = None;
        self.handle.attach(node);
    }

    fn detach(&mut self) {
        self.last_angle = None;
        self.handle.detach();
    }

    fn attached(&self) -> Option<Entity> {
        self.handle.attached()
    }
}

impl ModelGizmo {
    pub fn radius(&self) -> f32 {
        RING_RADIUS * self.size
    }
}

/// Plugin for the model gizmo
pub struct GizmoPlugin;

impl Plugin for GizmoPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModelGizmo>()
            .add_systems(Update, (drag_gizmo, draw_gizmo).chain());
    }
}

/// Angle of `point` around the vertical axis through `center`
///
/// `frame` is the rotation of the space the angle is measured in.
pub fn angle_about_y(center: Vec3, frame: Quat, point: Vec3) -> f32 {
    let local = frame.inverse() * (point - center);
    local.x.atan2(local.z)
}

/// Whether `point` lies on the ring of `radius` around `center`
pub fn ring_hit(center: Vec3, radius: f32, point: Vec3) -> bool {
    let d = Vec2::new(point.x - center.x, point.z - center.z).length();
    (d - radius).abs() <= GRAB_TOLERANCE
}

/// Shortest signed difference between two angles
pub fn wrap_angle(delta: f32) -> f32 {
    (delta + PI).rem_euclid(TAU) - PI
}

fn drag_gizmo(
    mut gizmo: ResMut<ModelGizmo>,
    mut pivots: Query<(&mut Transform, &GlobalTransform)>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    windows: Query<&Window>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut contexts: EguiContexts,
) {
    let Some(target) = gizmo.attached() else {
        return;
    };
    if gizmo.mode != GizmoMode::Rotate || !gizmo.show_y {
        return;
    }

    if !mouse_button.pressed(MouseButton::Left) {
        gizmo.dragging = false;
        gizmo.last_angle = None;
        return;
    }

    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);
    if egui_wants_pointer && !gizmo.dragging {
        return;
    }

    let Ok(window) = windows.single() else { return };
    let Some(cursor) = window.cursor_position() else { return };
    let Ok((camera, camera_transform)) = camera_query.single() else { return };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor) else { return };
    let Ok((mut transform, global)) = pivots.get_mut(target) else { return };

    // Intersect with the pivot's horizontal plane, measured in the parent frame
    let (_, global_rotation, center) = global.to_scale_rotation_translation();
    let frame = global_rotation * transform.rotation.inverse();
    let up = frame * Vec3::Y;
    let Some(distance) = ray.intersect_plane(center, InfinitePlane3d::new(up)) else {
        return;
    };
    let hit = ray.get_point(distance);
    let local_hit = center + frame.inverse() * (hit - center);

    if mouse_button.just_pressed(MouseButton::Left) {
        if !ring_hit(center, gizmo.radius(), local_hit) {
            return;
        }
        gizmo.dragging = true;
    }
    if !gizmo.dragging {
        return;
    }

    let angle = angle_about_y(center, frame, hit);
    if let Some(last) = gizmo.last_angle {
        transform.rotate_y(wrap_angle(angle - last));
    }
    gizmo.last_angle = Some(angle);
}

fn draw_gizmo(
    gizmo: Res<ModelGizmo>,
    pivots: Query<(&Transform, &GlobalTransform)>,
    mut gizmos: Gizmos,
) {
    let Some(target) = gizmo.attached() else {
        return;
    };
    if !gizmo.show_y {
        return;
    }
    let Ok((transform, global)) = pivots.get(target) else {
        return;
    };

    let (_, global_rotation, center) = global.to_scale_rotation_translation();
    let frame = global_rotation * transform.rotation.inverse();
    let color = if gizmo.dragging {
        Color::srgb(1.0, 1.0, 0.2)
    } else {
        Color::srgb(0.2, 0.9, 0.2)
    };

    // Circles are drawn in the XY plane; tip it onto XZ
    let ring = Isometry3d::new(center, frame * Quat::from_rotation_x(FRAC_PI_2));
    gizmos.circle(ring, gizmo.radius(), color);
}
