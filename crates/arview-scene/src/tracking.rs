//! Marker tracking
//!
//! The viewer runs in one of two modes, decided once at startup. With a
//! working [`MarkerTracker`] the marker group follows the tracked pattern and
//! the camera stays put. Without one the camera orbits a fixed marker group.

use bevy::prelude::*;

use crate::camera::MainCamera;
use crate::scene::MarkerGroup;

/// Source of marker poses
///
/// Implemented by whatever bridges the camera feed and pattern detector.
pub trait MarkerTracker: 'static {
    /// Current marker pose as a column-major 4x4 matrix, or `None` while the
    /// marker is not visible
    fn update(&mut self) -> Option<[f32; 16]>;

    /// Projection matching the camera feed, as a column-major OpenGL-style
    /// matrix, once the tracker knows it
    fn projection(&mut self) -> Option<[f32; 16]> {
        None
    }
}

/// How the marker group is positioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Resource)]
pub enum TrackingMode {
    /// Marker group follows the tracked pattern
    Marker,
    /// Marker group stays at the origin; the camera orbits it
    #[default]
    Orbit,
}

/// Tracker in use when running in [`TrackingMode::Marker`]
pub struct ActiveTracker(pub Box<dyn MarkerTracker>);

/// Whether the marker was seen on the last frame
#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct MarkerVisible(pub bool);

/// Pick the tracking mode from the result of starting a tracker
///
/// Call before `App::run`. A failed tracker is logged and the viewer falls
/// back to orbit mode; the mode never changes afterwards.
pub fn install_tracking(app: &mut App, tracker: Result<Box<dyn MarkerTracker>, String>) {
    match tracker {
        Ok(tracker) => {
            tracing::info!("Marker tracking enabled");
            app.insert_resource(TrackingMode::Marker)
                .insert_resource(MarkerVisible::default())
                .insert_non_send_resource(ActiveTracker(tracker))
                .add_systems(Update, (apply_marker_pose, apply_tracker_projection));
        }
        Err(e) => {
            tracing::warn!("Marker tracking unavailable, using orbit controls: {}", e);
            app.insert_resource(TrackingMode::Orbit);
        }
    }
}

/// Convert a column-major pose matrix into a transform
pub fn pose_to_transform(pose: &[f32; 16]) -> Transform {
    Transform::from_matrix(Mat4::from_cols_array(pose))
}

/// Perspective parameters of an OpenGL-style projection matrix
///
/// Returns `None` for matrices that are not a usable perspective projection.
pub fn perspective_from_matrix(matrix: &[f32; 16]) -> Option<PerspectiveProjection> {
    // Column-major: [5] = m11, [10] = m22, [14] = m23
    let (m11, m22, m23) = (matrix[5], matrix[10], matrix[14]);
    let fov = 2.0 * (1.0 / m11).atan();
    let near = m23 / (m22 - 1.0);
    let far = m23 / (m22 + 1.0);

    let usable = fov.is_finite() && fov > 0.0 && near.is_finite() && near > 0.0 && far > near;
    usable.then(|| PerspectiveProjection {
        fov,
        near,
        far,
        ..default()
    })
}

fn apply_tracker_projection(
    mut tracker: NonSendMut<ActiveTracker>,
    mut cameras: Query<&mut Projection, With<MainCamera>>,
) {
    let Some(perspective) = tracker.0.projection().as_ref().and_then(perspective_from_matrix) else {
        return;
    };

    for mut projection in cameras.iter_mut() {
        let unchanged = matches!(
            &*projection,
            Projection::Perspective(p)
                if p.fov == perspective.fov && p.near == perspective.near && p.far == perspective.far
        );
        if !unchanged {
            tracing::debug!(fov = perspective.fov.to_degrees(), "Camera projection from tracker");
            *projection = Projection::Perspective(perspective.clone());
        }
    }
}

fn apply_marker_pose(
    mut tracker: NonSendMut<ActiveTracker>,
    mut visible: ResMut<MarkerVisible>,
    mut groups: Query<(&mut Transform, &mut Visibility), With<MarkerGroup>>,
) {
    let pose = tracker.0.update();
    visible.0 = pose.is_some();

    for (mut transform, mut visibility) in groups.iter_mut() {
        match &pose {
            Some(pose) => {
                *transform = pose_to_transform(pose);
                *visibility = Visibility::Inherited;
            }
            None => *visibility = Visibility::Hidden,
        }
    }
}
