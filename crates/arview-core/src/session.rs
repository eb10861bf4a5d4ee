//! Viewer session - scene, handle and swap controller in one context
//!
//! Headless counterpart of the Bevy frontend: everything a swap touches is
//! owned here and passed to the controller explicitly.

use glam::Vec3;
use tracing::info;

use crate::catalog::AssetCatalog;
use crate::config::ViewerConfig;
use crate::error::SwapError;
use crate::graph::{AssetGraph, MemoryScene, NodeId};
use crate::handle::{InteractiveHandle, TransformGizmo};
use crate::loader::AssetLoader;
use crate::swap::{ModelSwapController, SwapOutcome};

/// Name of the attachment point node
pub const MARKER_GROUP: &str = "marker-group";

pub struct Session {
    scene: MemoryScene,
    gizmo: TransformGizmo<NodeId>,
    controller: ModelSwapController<NodeId>,
    marker_group: NodeId,
}

impl Session {
    /// Build the scene root, the marker group and a turntable gizmo
    pub fn new(config: &ViewerConfig) -> Result<Self, SwapError> {
        Self::with_catalog(
            config.catalog.models.clone(),
            config.catalog.initial,
            Vec3::from_array(config.scene.pivot_offset),
        )
    }

    pub fn with_catalog(
        catalog: AssetCatalog,
        initial: usize,
        pivot_offset: Vec3,
    ) -> Result<Self, SwapError> {
        let mut scene = MemoryScene::new().with_pivot_offset(pivot_offset);
        let marker_group = scene.add_group(scene.root(), MARKER_GROUP);
        let controller = ModelSwapController::new(catalog, marker_group, initial)?;

        Ok(Self {
            scene,
            gizmo: TransformGizmo::turntable(),
            controller,
            marker_group,
        })
    }

    pub fn scene(&self) -> &MemoryScene {
        &self.scene
    }

    pub fn gizmo(&self) -> &TransformGizmo<NodeId> {
        &self.gizmo
    }

    pub fn controller(&self) -> &ModelSwapController<NodeId> {
        &self.controller
    }

    pub fn marker_group(&self) -> NodeId {
        self.marker_group
    }

    /// Load the initially selected model
    pub async fn load_initial<L>(&mut self, loader: &L) -> Result<SwapOutcome<NodeId>, SwapError>
    where
        L: AssetLoader<Asset = AssetGraph>,
    {
        let index = self.controller.selected_index();
        self.select_model(index, loader).await
    }

    /// Swap the displayed model to catalog entry `index`
    pub async fn select_model<L>(
        &mut self,
        index: usize,
        loader: &L,
    ) -> Result<SwapOutcome<NodeId>, SwapError>
    where
        L: AssetLoader<Asset = AssetGraph>,
    {
        self.controller
            .select_model(index, loader, &mut self.scene, &mut self.gizmo)
            .await
    }

    /// Load every catalog entry once, returning the identifiers that failed
    ///
    /// Leaves the session showing the originally selected model when it
    /// loads.
    pub async fn check_catalog<L>(&mut self, loader: &L) -> Vec<(String, SwapError)>
    where
        L: AssetLoader<Asset = AssetGraph>,
    {
        let initial = self.controller.selected_index();
        let mut failures = Vec::new();

        for index in 0..self.controller.catalog().len() {
            if let Err(e) = self.select_model(index, loader).await {
                let identifier = self.controller.catalog().get(index).unwrap_or_default().to_string();
                failures.push((identifier, e));
            }
        }
        // Restore the initial selection; its failure is already recorded
        let _ = self.select_model(initial, loader).await;

        info!(
            models = self.controller.catalog().len(),
            failed = failures.len(),
            attached = ?self.gizmo.attached(),
            "Catalog check complete"
        );
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::graph::AssetNode;

    struct FakeLoader;

    impl AssetLoader for FakeLoader {
        type Asset = AssetGraph;

        async fn load(&self, identifier: &str) -> Result<AssetGraph, LoadError> {
            match identifier {
                "Missing.glb" => Err(LoadError::NotFound(identifier.to_string())),
                _ => Ok(AssetGraph::new(vec![AssetNode::mesh("Mesh", 1)])),
            }
        }
    }

    fn session() -> Session {
        let config = ViewerConfig::from_toml(
            r#"
            [catalog]
            models = ["A.glb", "B.glb", "C.glb"]
            initial = 1
            "#,
        )
        .unwrap();
        Session::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_initial_then_swap() {
        let mut session = session();
        session.load_initial(&FakeLoader).await.unwrap();

        let marker = session.marker_group();
        assert_eq!(session.scene().children_named(marker, "B.glb").len(), 1);

        let pivot = session.scene().children(marker)[0];
        assert_eq!(session.scene().get(pivot).unwrap().translation, Vec3::Y);

        session.select_model(2, &FakeLoader).await.unwrap();
        assert_eq!(session.scene().children_named(marker, "C.glb").len(), 1);
        assert!(session.scene().children_named(marker, "B.glb").is_empty());
        assert_eq!(session.controller().selected_index(), 2);
        assert_eq!(session.gizmo().attached(), session.controller().current_pivot());
    }

    #[tokio::test]
    async fn test_check_catalog_reports_missing() {
        let catalog = AssetCatalog::new(["A.glb", "Missing.glb"]).unwrap();
        let mut session = Session::with_catalog(catalog, 0, Vec3::ZERO).unwrap();

        let failures = session.check_catalog(&FakeLoader).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "Missing.glb");

        assert_eq!(session.controller().selected_identifier(), "A.glb");
        assert_eq!(session.scene().children(session.marker_group()).len(), 1);
    }
}
