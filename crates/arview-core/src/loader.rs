//! Asset loading
//!
//! The swap controller only needs something that turns a catalog identifier
//! into an asset, asynchronously and fallibly. [`parse_gltf`] converts glTF
//! or GLB bytes into an [`AssetGraph`]; [`GltfFileLoader`] serves identifiers
//! from a models directory on disk.

use std::future::Future;
use std::path::{Component, Path};

use glam::Vec3;

use crate::error::LoadError;
use crate::graph::{AssetGraph, AssetNode, NodeKind};

/// Fetches the asset behind a catalog identifier
pub trait AssetLoader {
    type Asset;

    fn load(&self, identifier: &str) -> impl Future<Output = Result<Self::Asset, LoadError>>;
}

/// Parse glTF JSON or GLB bytes into the node hierarchy of its scene
///
/// Uses the default scene, falling back to the first one. Buffers are not
/// resolved; only the hierarchy matters for grafting.
pub fn parse_gltf(bytes: &[u8]) -> Result<AssetGraph, LoadError> {
    let gltf = gltf::Gltf::from_slice(bytes)?;

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| LoadError::Other("glTF document has no scenes".to_string()))?;

    Ok(AssetGraph::new(scene.nodes().map(|n| convert_node(&n)).collect()))
}

fn convert_node(node: &gltf::Node<'_>) -> AssetNode {
    let kind = match node.mesh() {
        Some(mesh) => NodeKind::Mesh {
            primitives: mesh.primitives().count(),
        },
        None => NodeKind::Group,
    };
    let (translation, _, _) = node.transform().decomposed();

    AssetNode {
        name: node.name().map(str::to_string),
        kind,
        translation: Vec3::from_array(translation),
        cast_shadow: false,
        children: node.children().map(|c| convert_node(&c)).collect(),
    }
}

/// Whether `identifier` names a file below a root directory
///
/// Only plain path components are accepted, so `..`, absolute paths and
/// drive prefixes are rejected while names like `v1..2.glb` pass.
pub fn is_relative_file_path(identifier: &str) -> bool {
    let mut components = Path::new(identifier).components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

/// Loads glTF/GLB files from a directory
#[cfg(feature = "fs-loader")]
#[derive(Debug, Clone)]
pub struct GltfFileLoader {
    root: std::path::PathBuf,
}

#[cfg(feature = "fs-loader")]
impl GltfFileLoader {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[cfg(feature = "fs-loader")]
impl AssetLoader for GltfFileLoader {
    type Asset = AssetGraph;

    async fn load(&self, identifier: &str) -> Result<AssetGraph, LoadError> {
        if !is_relative_file_path(identifier) {
            return Err(LoadError::NotFound(identifier.to_string()));
        }

        let path = self.root.join(identifier);
        tracing::debug!(path = %path.display(), "Reading model");

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound(identifier.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        parse_gltf(&bytes)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal glTF: one mesh node and a group holding another mesh
    pub(crate) const SUZANNE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0, 1] } ],
        "nodes": [
            { "name": "Suzanne", "mesh": 0, "translation": [0.0, 0.5, 0.0] },
            { "name": "Rig", "children": [2] },
            { "name": "Eye", "mesh": 0 }
        ],
        "meshes": [ { "primitives": [ { "attributes": { "POSITION": 0 } } ] } ],
        "buffers": [ {
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
        } ],
        "bufferViews": [ { "buffer": 0, "byteLength": 36 } ],
        "accessors": [ {
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 1.0]
        } ]
    }"#;

    #[test]
    fn test_parse_gltf_hierarchy() {
        let graph = parse_gltf(SUZANNE_GLTF.as_bytes()).unwrap();

        assert_eq!(graph.children.len(), 2);
        assert_eq!(graph.node_count(), 3);

        let suzanne = &graph.children[0];
        assert_eq!(suzanne.name.as_deref(), Some("Suzanne"));
        assert_eq!(suzanne.kind, NodeKind::Mesh { primitives: 1 });
        assert_eq!(suzanne.translation, Vec3::new(0.0, 0.5, 0.0));

        let rig = &graph.children[1];
        assert_eq!(rig.kind, NodeKind::Group);
        assert_eq!(rig.children[0].name.as_deref(), Some("Eye"));
    }

    #[test]
    fn test_parse_gltf_rejects_garbage() {
        assert!(parse_gltf(b"not a model").is_err());
    }

    #[test]
    fn test_relative_file_paths() {
        assert!(is_relative_file_path("Suzanne.glb"));
        assert!(is_relative_file_path("v1..2.glb"));
        assert!(is_relative_file_path("robots/arm.gltf"));

        assert!(!is_relative_file_path(""));
        assert!(!is_relative_file_path(".."));
        assert!(!is_relative_file_path("../etc/passwd"));
        assert!(!is_relative_file_path("robots/../../secret.glb"));
        assert!(!is_relative_file_path("/etc/passwd"));
        assert!(!is_relative_file_path("./Suzanne.glb"));
    }

    #[cfg(windows)]
    #[test]
    fn test_relative_file_paths_windows() {
        assert!(!is_relative_file_path(r"C:\models\Suzanne.glb"));
        assert!(!is_relative_file_path(r"\\server\share\Suzanne.glb"));
        assert!(!is_relative_file_path(r"..\Suzanne.glb"));
    }

    #[cfg(feature = "fs-loader")]
    #[tokio::test]
    async fn test_file_loader() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("Suzanne.gltf"), SUZANNE_GLTF).unwrap();

        let loader = GltfFileLoader::new(temp_dir.path());
        let graph = loader.load("Suzanne.gltf").await.unwrap();
        assert_eq!(graph.children.len(), 2);

        std::fs::write(temp_dir.path().join("v1..2.gltf"), SUZANNE_GLTF).unwrap();
        assert!(loader.load("v1..2.gltf").await.is_ok());

        assert!(matches!(
            loader.load("Missing.glb").await,
            Err(LoadError::NotFound(id)) if id == "Missing.glb"
        ));
        assert!(matches!(
            loader.load("../etc/passwd").await,
            Err(LoadError::NotFound(_))
        ));
    }
}
