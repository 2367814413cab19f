//! On-disk shape of the resource registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::expose::MethodKind;

pub const MANIFEST_FILE: &str = ".vendor-expose.json";
pub const MANIFEST_VERSION: u32 = 1;

/// Persisted record of every exposure created under the resources root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryManifest {
    /// Manifest format version
    pub version: u32,

    /// When the manifest was last written
    pub generated_at: chrono::DateTime<chrono::Utc>,

    /// Target path (relative to the resources root, `/`-separated) to record
    #[serde(default)]
    pub exposures: BTreeMap<String, ExposureRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureRecord {
    /// Method that created the artifact, which decides how it is removed
    pub method: MethodKind,
    /// Module that owns the target
    pub module: String,
}

impl RegistryManifest {
    pub fn new() -> Self {
        Self {
            version: MANIFEST_VERSION,
            generated_at: chrono::Utc::now(),
            exposures: BTreeMap::new(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.version != MANIFEST_VERSION {
            anyhow::bail!("Unsupported registry version: {}", self.version);
        }
        Ok(())
    }
}

impl Default for RegistryManifest {
    fn default() -> Self {
        Self::new()
    }
}
