//! Scene setup - camera, lights, shadow plane and the marker group

use bevy::light::NotShadowCaster;
use bevy::prelude::*;
use rand::Rng;

use crate::camera::{CameraSettings, MainCamera};
use crate::settings::ViewerSettings;
use crate::tracking::TrackingMode;

/// Marker for the attachment point that receives model pivots
///
/// Follows the tracked marker in marker mode; stays at the origin otherwise.
#[derive(Component)]
pub struct MarkerGroup;

/// Marker for the shadow-casting key light
#[derive(Component)]
pub struct KeyLight;

/// Marker for the ground plane that only receives shadows
#[derive(Component)]
pub struct ShadowPlane;

/// Plugin for scene setup
pub struct SceneSetupPlugin;

impl Plugin for SceneSetupPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_scene)
            .add_systems(Update, wander_key_light);
    }
}

/// Position the key light starts from
const KEY_LIGHT_START: Vec3 = Vec3::new(-30.0, 50.0, -20.0);

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<ViewerSettings>,
    camera_settings: Res<CameraSettings>,
    mode: Res<TrackingMode>,
) {
    // The tracker reports marker poses relative to a camera at the origin
    let camera_transform = match *mode {
        TrackingMode::Marker => Transform::IDENTITY,
        TrackingMode::Orbit => Transform::from_translation(camera_settings.eye())
            .looking_at(camera_settings.target, Vec3::Y),
    };

    // Camera, with the soft ambient term attached as a per-camera override
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 45.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
            ..default()
        }),
        camera_transform,
        AmbientLight {
            color: Color::WHITE,
            brightness: 200.0,
            ..default()
        },
        MainCamera,
    ));

    // Attachment point for model pivots
    let marker_group = commands
        .spawn((
            Name::new(arview_core::session::MARKER_GROUP),
            Transform::default(),
            Visibility::default(),
            MarkerGroup,
        ))
        .id();

    // Key light - casts the model's shadow onto the plane
    let key_light = commands
        .spawn((
            DirectionalLight {
                illuminance: 4000.0,
                shadows_enabled: true,
                ..default()
            },
            Transform::from_translation(KEY_LIGHT_START).looking_at(Vec3::ZERO, Vec3::Y),
            KeyLight,
            KeyLightWander::new(KEY_LIGHT_START, settings.scene.animate_key_light),
        ))
        .id();

    // Fill light from below and in front
    let fill_light = commands
        .spawn((
            DirectionalLight {
                illuminance: 3000.0,
                shadows_enabled: false,
                ..default()
            },
            Transform::from_xyz(0.0, -30.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
        ))
        .id();

    // Ground plane that only shows shadows
    let plane = commands
        .spawn((
            Mesh3d(meshes.add(Plane3d::default().mesh().size(200.0, 200.0))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgba(0.0, 0.0, 0.0, 0.2),
                unlit: true,
                alpha_mode: AlphaMode::Blend,
                ..default()
            })),
            Transform::default(),
            NotShadowCaster,
            ShadowPlane,
        ))
        .id();

    commands
        .entity(marker_group)
        .add_children(&[key_light, fill_light, plane]);
}

/// Key light tween: glide to a random spot, rest, repeat
#[derive(Component, Debug, Clone)]
pub struct KeyLightWander {
    pub enabled: bool,
    from: Vec3,
    to: Vec3,
    duration: f32,
    elapsed: f32,
    rest: f32,
}

impl KeyLightWander {
    /// Seconds to rest between glides
    pub const REST_SECS: f32 = 2.0;

    pub fn new(start: Vec3, enabled: bool) -> Self {
        Self {
            enabled,
            from: start,
            to: start,
            duration: 0.0,
            elapsed: 0.0,
            rest: 0.0,
        }
    }

    /// Advance by `dt` seconds and return the light position
    pub fn advance(&mut self, dt: f32, rng: &mut impl Rng) -> Vec3 {
        if self.rest > 0.0 {
            self.rest -= dt;
            return self.to;
        }

        if self.elapsed >= self.duration {
            // Pick the next glide; height is kept
            self.from = self.to;
            self.to = Vec3::new(
                rng.gen_range(-30.0..30.0),
                self.from.y,
                rng.gen_range(-20.0..20.0),
            );
            self.duration = rng.gen_range(1.0..3.0);
            self.elapsed = 0.0;
        }

        self.elapsed += dt;
        let t = (self.elapsed / self.duration).min(1.0);
        let eased = t * t * (3.0 - 2.0 * t);
        if t >= 1.0 {
            self.rest = Self::REST_SECS;
        }
        self.from.lerp(self.to, eased)
    }
}

fn wander_key_light(time: Res<Time>, mut lights: Query<(&mut Transform, &mut KeyLightWander)>) {
    let mut rng = rand::thread_rng();
    for (mut transform, mut wander) in lights.iter_mut() {
        if !wander.enabled {
            continue;
        }
        let position = wander.advance(time.delta_secs(), &mut rng);
        *transform = Transform::from_translation(position).looking_at(Vec3::ZERO, Vec3::Y);
    }
}
