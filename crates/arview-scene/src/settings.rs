//! Viewer settings shared by the scene plugins

use arview_core::ViewerConfig;
use bevy::prelude::*;

/// Viewer configuration as a Bevy resource
#[derive(Debug, Clone, Resource, Default, Deref, DerefMut)]
pub struct ViewerSettings(pub ViewerConfig);

impl ViewerSettings {
    pub fn pivot_offset(&self) -> Vec3 {
        Vec3::from_array(self.scene.pivot_offset)
    }
}
