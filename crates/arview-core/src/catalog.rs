//! Asset catalog - the ordered list of selectable models
//!
//! Positions in the catalog are what the selection UI hands to the swap
//! controller. Identifiers double as pivot names and as keys into the
//! controller's live-node map, so they must be unique.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::CatalogError;

/// Ordered, non-empty list of model identifiers (file names)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct AssetCatalog {
    entries: Vec<String>,
}

impl AssetCatalog {
    /// Build a catalog, rejecting empty lists and duplicate identifiers
    pub fn new<I, S>(entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<String> = entries.into_iter().map(Into::into).collect();
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.as_str()) {
                return Err(CatalogError::Duplicate(entry.clone()));
            }
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifier at `index`, if the index is valid
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|s| s.as_str())
    }

    pub fn contains_index(&self, index: usize) -> bool {
        index < self.entries.len()
    }

    /// Position of an identifier in the catalog
    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.entries.iter().position(|e| e == identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.as_str())
    }

    /// URL (or asset path) of the model at `index` below `base`
    ///
    /// `model_url("/models", 0)` -> `/models/Suzanne.glb`. An empty base yields
    /// the bare identifier.
    pub fn model_url(&self, base: &str, index: usize) -> Option<String> {
        let identifier = self.get(index)?;
        let base = base.trim_end_matches('/');
        if base.is_empty() {
            Some(identifier.to_string())
        } else {
            Some(format!("{}/{}", base, identifier))
        }
    }

    /// Check that `index` is a usable initial selection
    pub fn validate_initial(&self, index: usize) -> Result<(), CatalogError> {
        if self.contains_index(index) {
            Ok(())
        } else {
            Err(CatalogError::InitialOutOfRange {
                index,
                len: self.len(),
            })
        }
    }
}

/// The demo models shipped with the viewer
impl Default for AssetCatalog {
    fn default() -> Self {
        Self {
            entries: vec![
                "Suzanne.glb".to_string(),
                "SuzannePisincipledBSDF.glb".to_string(),
                "SuzannePisincipledBSDFMultiMaterial.glb".to_string(),
                "SuzannePisincipledBSDFTextured.glb".to_string(),
            ],
        }
    }
}

impl TryFrom<Vec<String>> for AssetCatalog {
    type Error = CatalogError;

    fn try_from(entries: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<AssetCatalog> for Vec<String> {
    fn from(catalog: AssetCatalog) -> Self {
        catalog.entries
    }
}
