//! Modules and the paths derived from them.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ExposeConfig;
use crate::error::ExposeError;
use crate::expose::ExposeRequest;
use crate::validate::first_invalid;

/// An installed package as reported by the dependency manager.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Package {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    /// Where the package is installed. Relative paths resolve against the
    /// project root. Ignored for the root package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_path: Option<PathBuf>,

    #[serde(default)]
    pub extra: PackageExtra,

    /// Set for the project's own package.
    #[serde(skip)]
    pub is_root: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageExtra {
    /// Folders, relative to the package root, to publish.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expose: Vec<String>,
}

impl Package {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_install_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.install_path = Some(path.into());
        self
    }

    pub fn with_expose<I, S>(mut self, folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra.expose = folders.into_iter().map(Into::into).collect();
        self
    }

    pub fn into_root(mut self) -> Self {
        self.is_root = true;
        self
    }

    fn name_segments(&self) -> Vec<&str> {
        self.name.split('/').filter(|s| !s.is_empty()).collect()
    }
}

/// Resolves where a package lives and where its folders are published.
#[derive(Debug, Clone, Copy)]
pub struct ModuleDescriptor<'a> {
    package: &'a Package,
    config: &'a ExposeConfig,
}

impl<'a> ModuleDescriptor<'a> {
    pub fn new(package: &'a Package, config: &'a ExposeConfig) -> Self {
        Self { package, config }
    }

    pub fn name(&self) -> &str {
        &self.package.name
    }

    pub fn package(&self) -> &Package {
        self.package
    }

    pub fn is_exposable(&self) -> bool {
        self.package.kind == self.config.module_type()
    }

    /// Declared folders, validated. Empty when the package is not an
    /// exposable module or declares nothing. A single invalid entry rejects
    /// the whole list.
    pub fn exposed_folders(&self) -> Result<Vec<String>, ExposeError> {
        if !self.is_exposable() || self.package.extra.expose.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(bad) = first_invalid(&self.package.extra.expose) {
            return Err(ExposeError::InvalidExposurePath {
                module: self.package.name.clone(),
                path: bad.to_string(),
            });
        }
        Ok(self.package.extra.expose.clone())
    }

    /// Absolute source directory. The root package is the project itself.
    pub fn install_path(&self) -> PathBuf {
        let project_root = self.config.project_root();
        if self.package.is_root {
            return project_root.to_path_buf();
        }
        match &self.package.install_path {
            Some(path) => project_root.join(path),
            None => {
                let mut path = project_root.join(self.config.vendor_dir());
                for segment in self.package.name_segments() {
                    path.push(segment);
                }
                path
            }
        }
    }

    /// Directory under the resources root that mirrors this module.
    ///
    /// The trailing components of the install location are kept, one per
    /// segment of the package name, so `deps/acme/widgets` maps to
    /// `resources/acme/widgets` and same-named packages from different
    /// vendors do not collide. The root package uses its name segments.
    pub fn resource_path(&self) -> Result<PathBuf, ExposeError> {
        let segments = self.package.name_segments();
        let count = segments.len().max(1);

        let suffix: Option<Vec<PathBuf>> = if self.package.is_root {
            segments.iter().map(|s| single_normal(Path::new(s))).collect()
        } else {
            let install = self.install_path();
            let mut tail: Vec<PathBuf> = install
                .components()
                .rev()
                .take(count)
                .map(|c| single_normal(Path::new(c.as_os_str())))
                .collect::<Option<Vec<_>>>()
                .unwrap_or_default();
            tail.reverse();
            (tail.len() == count).then_some(tail)
        };

        match suffix {
            Some(parts) if !parts.is_empty() => {
                let mut path = self.config.resources_root();
                for part in parts {
                    path.push(part);
                }
                Ok(path)
            }
            _ => Err(ExposeError::InvalidModuleLocation {
                module: self.package.name.clone(),
                path: self.install_path(),
            }),
        }
    }

    /// One request per exposed folder. Fails before any filesystem work if a
    /// folder is invalid or the resource path cannot be derived.
    pub fn requests(&self) -> Result<Vec<ExposeRequest>, ExposeError> {
        let folders = self.exposed_folders()?;
        if folders.is_empty() {
            return Ok(Vec::new());
        }
        let source_root = self.install_path();
        let target_root = self.resource_path()?;
        Ok(folders
            .into_iter()
            .map(|folder| ExposeRequest {
                module: self.package.name.clone(),
                source: source_root.join(&folder),
                target: target_root.join(&folder),
                folder,
            })
            .collect())
    }
}

fn single_normal(path: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Some(PathBuf::from(name)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MODULE_TYPE;

    fn config() -> ExposeConfig {
        ExposeConfig::new("/proj")
    }

    fn widgets() -> Package {
        Package::new("acme/widgets", DEFAULT_MODULE_TYPE)
            .with_install_path("/proj/deps/acme/widgets")
            .with_expose(["client", "js/dist"])
    }

    #[test]
    fn folders_of_exposable_module() {
        let config = config();
        let package = widgets();
        let module = ModuleDescriptor::new(&package, &config);
        assert_eq!(
            module.exposed_folders().expect("folders should validate"),
            vec!["client".to_string(), "js/dist".to_string()]
        );
    }

    #[test]
    fn other_types_expose_nothing() {
        let config = config();
        let package = Package::new("acme/lib", "library").with_expose(["client"]);
        let module = ModuleDescriptor::new(&package, &config);
        assert!(module.exposed_folders().expect("no error").is_empty());
        assert!(module.requests().expect("no error").is_empty());
    }

    #[test]
    fn invalid_folder_rejects_module() {
        let config = config();
        let package = widgets().with_expose(["client", "../../etc"]);
        let module = ModuleDescriptor::new(&package, &config);
        match module.exposed_folders() {
            Err(ExposeError::InvalidExposurePath { module, path }) => {
                assert_eq!(module, "acme/widgets");
                assert_eq!(path, "../../etc");
            }
            other => panic!("expected InvalidExposurePath, got {other:?}"),
        }
        assert!(module.requests().is_err());
    }

    #[test]
    fn resource_path_keeps_install_tail() {
        let config = config();
        let package = widgets();
        let module = ModuleDescriptor::new(&package, &config);
        assert_eq!(
            module.resource_path().expect("resource path"),
            PathBuf::from("/proj/resources/acme/widgets")
        );
    }

    #[test]
    fn relative_install_path_resolves_against_project() {
        let config = config();
        let package = Package::new("acme/widgets", DEFAULT_MODULE_TYPE)
            .with_install_path("deps/acme/widgets");
        let module = ModuleDescriptor::new(&package, &config);
        assert_eq!(module.install_path(), PathBuf::from("/proj/deps/acme/widgets"));
    }

    #[test]
    fn missing_install_path_defaults_to_vendor_dir() {
        let config = config();
        let package = Package::new("acme/widgets", DEFAULT_MODULE_TYPE);
        let module = ModuleDescriptor::new(&package, &config);
        assert_eq!(module.install_path(), PathBuf::from("/proj/vendor/acme/widgets"));
    }

    #[test]
    fn root_package_is_project() {
        let config = config();
        let package = Package::new("acme/site", DEFAULT_MODULE_TYPE)
            .with_install_path("/elsewhere")
            .with_expose(["public"])
            .into_root();
        let module = ModuleDescriptor::new(&package, &config);
        assert_eq!(module.install_path(), PathBuf::from("/proj"));

        let requests = module.requests().expect("requests");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].source, PathBuf::from("/proj/public"));
        assert_eq!(
            requests[0].target,
            PathBuf::from("/proj/resources/acme/site/public")
        );
    }

    #[test]
    fn shallow_install_location_is_rejected() {
        let config = config();
        let package = Package::new("acme/widgets", DEFAULT_MODULE_TYPE)
            .with_install_path("/")
            .with_expose(["client"]);
        let module = ModuleDescriptor::new(&package, &config);
        assert!(matches!(
            module.resource_path(),
            Err(ExposeError::InvalidModuleLocation { .. })
        ));
    }

    #[test]
    fn traversal_in_root_name_is_rejected() {
        let config = config();
        let package = Package::new("../escape", DEFAULT_MODULE_TYPE)
            .with_expose(["client"])
            .into_root();
        let module = ModuleDescriptor::new(&package, &config);
        assert!(module.resource_path().is_err());
    }

    #[test]
    fn deserializes_dependency_manager_shape() {
        let json = r#"{
            "name": "acme/widgets",
            "type": "vendor-module",
            "install-path": "deps/acme/widgets",
            "extra": { "expose": ["client"] }
        }"#;
        let package: Package = serde_json::from_str(json).expect("package should parse");
        assert_eq!(package.kind, "vendor-module");
        assert_eq!(package.install_path, Some(PathBuf::from("deps/acme/widgets")));
        assert_eq!(package.extra.expose, vec!["client".to_string()]);
        assert!(!package.is_root);
    }
}
