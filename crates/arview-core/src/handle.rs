//! Interactive transform handle (gizmo)

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A singleton handle that targets at most one node at a time
pub trait InteractiveHandle<N> {
    /// Target `node`, implicitly releasing any previous target
    fn attach(&mut self, node: N);
    /// Release the current target, if any
    fn detach(&mut self);
    /// Node currently targeted
    fn attached(&self) -> Option<N>;
}

/// Manipulation the gizmo performs while dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GizmoMode {
    #[default]
    Rotate,
    Translate,
    Scale,
}

/// Gizmo state, generic over the node handle of the scene it lives in
#[derive(Debug, Clone, PartialEq)]
pub struct TransformGizmo<N> {
    target: Option<N>,
    pub mode: GizmoMode,
    pub show_x: bool,
    pub show_y: bool,
    pub show_z: bool,
    pub size: f32,
    /// True while the user is dragging; camera controls pause meanwhile
    pub dragging: bool,
}

impl<N> Default for TransformGizmo<N> {
    fn default() -> Self {
        Self {
            target: None,
            mode: GizmoMode::Rotate,
            show_x: true,
            show_y: true,
            show_z: true,
            size: 1.0,
            dragging: false,
        }
    }
}

impl<N> TransformGizmo<N> {
    /// Rotate-only gizmo restricted to the vertical axis
    pub fn turntable() -> Self {
        Self {
            show_x: false,
            show_z: false,
            ..Self::default()
        }
    }

    /// Axes the gizmo currently exposes, as `[x, y, z]`
    pub fn visible_axes(&self) -> [bool; 3] {
        [self.show_x, self.show_y, self.show_z]
    }
}

impl<N: Copy + PartialEq + Debug> InteractiveHandle<N> for TransformGizmo<N> {
    fn attach(&mut self, node: N) {
        if self.target.is_some() {
            self.detach();
        }
        self.target = Some(node);
    }

    fn detach(&mut self) {
        self.target = None;
        self.dragging = false;
    }

    fn attached(&self) -> Option<N> {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_replaces_previous_target() {
        let mut gizmo = TransformGizmo::<u32>::default();
        gizmo.attach(1);
        gizmo.dragging = true;
        gizmo.attach(2);

        assert_eq!(gizmo.attached(), Some(2));
        assert!(!gizmo.dragging);
    }

    #[test]
    fn test_turntable_shows_only_y() {
        let gizmo = TransformGizmo::<u32>::turntable();
        assert_eq!(gizmo.mode, GizmoMode::Rotate);
        assert_eq!(gizmo.visible_axes(), [false, true, false]);
        assert_eq!(gizmo.attached(), None);
    }
}
