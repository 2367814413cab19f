//! The installed package list handed over by the dependency manager.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::module::Package;

/// Every package taking part in a run, the project itself included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageSet {
    pub root: Option<Package>,
    pub packages: Vec<Package>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PackageListFile {
    Bare(Vec<Package>),
    Document {
        #[serde(default)]
        root: Option<Package>,
        #[serde(default)]
        packages: Vec<Package>,
    },
}

impl PackageSet {
    pub fn new(root: Option<Package>, packages: Vec<Package>) -> Self {
        Self {
            root: root.map(Package::into_root),
            packages,
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read package list: {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse package list: {}", path.display()))
    }

    /// Parse either `{ "root": .., "packages": [..] }` or a bare array.
    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        let file: PackageListFile = serde_json::from_str(content)?;
        Ok(match file {
            PackageListFile::Document { root, packages } => Self::new(root, packages),
            PackageListFile::Bare(packages) => Self::new(None, packages),
        })
    }

    /// Root package first, then the rest in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.root.iter().chain(self.packages.iter())
    }

    pub fn find(&self, name: &str) -> Option<&Package> {
        self.iter().find(|package| package.name == name)
    }

    pub fn len(&self) -> usize {
        self.packages.len() + usize::from(self.root.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
