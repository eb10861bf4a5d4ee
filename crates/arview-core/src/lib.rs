//! arview Core - Asset catalog, scene graph and model swap state machine
//!
//! This crate provides the rendering-independent pieces of arview:
//! - Asset catalog and viewer configuration
//! - In-memory scene graph and interactive transform handle
//! - Asset loader seam with a glTF file loader
//! - The model swap controller that grafts freshly loaded assets into a
//!   live scene graph and retires the previous one

pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod handle;
pub mod loader;
pub mod session;
pub mod swap;

pub use catalog::AssetCatalog;
pub use config::{CatalogInfo, ViewerConfig};
pub use error::{CatalogError, LoadError, SwapError};
pub use graph::{AssetGraph, AssetNode, MemoryScene, NodeId, NodeKind};
pub use handle::{GizmoMode, InteractiveHandle, TransformGizmo};
pub use loader::AssetLoader;
pub use session::Session;
pub use swap::{LoadTicket, ModelSwapController, SceneGraph, Selection, SwapOutcome, SwapState};
