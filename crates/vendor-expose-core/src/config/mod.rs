//! Run configuration.
//!
//! Values are layered, highest precedence first:
//! - explicit [`ConfigOverrides`] (CLI flags)
//! - the [`METHOD_ENV`](crate::expose::METHOD_ENV) environment variable (method only)
//! - `vendor-expose.toml` in the project root
//! - built-in defaults

pub mod file;

use std::path::{Path, PathBuf};

use crate::expose::MethodSelector;
use crate::validate::validate_folder;

pub use file::{CONFIG_FILE, ConfigFile, ExposeSection, parse_config_file, parse_config_str};

/// Package type that takes part in exposure.
pub const DEFAULT_MODULE_TYPE: &str = "vendor-module";
/// Directory under the web root holding exposed folders.
pub const DEFAULT_RESOURCES_DIR: &str = "resources";
/// Directory packages are installed into when no install path is given.
pub const DEFAULT_VENDOR_DIR: &str = "vendor";
/// Installed package list, relative to the project root.
pub const DEFAULT_PACKAGES_MANIFEST: &str = "vendor/installed.json";

/// A static file seeded into the resources root when missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportFile {
    pub name: String,
    pub contents: String,
}

impl SupportFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Guard that stops web servers from listing the resources tree.
    pub fn index_guard() -> Self {
        Self::new(".htaccess", "Options -Indexes\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposeConfig {
    project_root: PathBuf,
    web_root: PathBuf,
    resources_dir: String,
    vendor_dir: String,
    method: MethodSelector,
    module_type: String,
    packages_manifest: PathBuf,
    support_files: Vec<SupportFile>,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub method: Option<MethodSelector>,
    pub web_root: Option<PathBuf>,
    pub packages_manifest: Option<PathBuf>,
}

impl ExposeConfig {
    /// Defaults for a project; the web root is the project root.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            web_root: project_root.clone(),
            packages_manifest: project_root.join(DEFAULT_PACKAGES_MANIFEST),
            project_root,
            resources_dir: DEFAULT_RESOURCES_DIR.to_string(),
            vendor_dir: DEFAULT_VENDOR_DIR.to_string(),
            method: MethodSelector::default(),
            module_type: DEFAULT_MODULE_TYPE.to_string(),
            support_files: vec![SupportFile::index_guard()],
        }
    }

    /// Layer the project file, `env_method` (the raw value of
    /// [`METHOD_ENV`](crate::expose::METHOD_ENV), if set) and `overrides`
    /// over the defaults. Returns the config plus warnings for recoverable
    /// problems.
    pub fn load(
        project_root: &Path,
        env_method: Option<&str>,
        overrides: &ConfigOverrides,
    ) -> anyhow::Result<(Self, Vec<String>)> {
        let mut warnings = Vec::new();
        let mut config = Self::new(project_root);

        let file_path = project_root.join(CONFIG_FILE);
        if file_path.exists() {
            let file = parse_config_file(&file_path)?;
            config.apply_file(&file.expose);
        }

        let (env_selector, env_warning) = MethodSelector::from_env_value(env_method);
        if let Some(warning) = env_warning {
            warnings.push(warning);
        }
        if let Some(method) = env_selector {
            config.method = method;
        }

        if let Some(method) = overrides.method {
            config.method = method;
        }
        if let Some(web_root) = &overrides.web_root {
            config = config.with_web_root(web_root);
        }
        if let Some(manifest) = &overrides.packages_manifest {
            config.packages_manifest = config.project_root.join(manifest);
        }

        config.validate()?;
        Ok((config, warnings))
    }

    fn apply_file(&mut self, section: &ExposeSection) {
        if let Some(method) = section.method {
            self.method = method;
        }
        if let Some(web_root) = &section.web_root {
            self.web_root = self.project_root.join(web_root);
        }
        if let Some(dir) = &section.resources_dir {
            self.resources_dir = dir.clone();
        }
        if let Some(dir) = &section.vendor_dir {
            self.vendor_dir = dir.clone();
        }
        if let Some(kind) = &section.module_type {
            self.module_type = kind.clone();
        }
        if let Some(manifest) = &section.packages {
            self.packages_manifest = self.project_root.join(manifest);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !validate_folder(&self.resources_dir) {
            anyhow::bail!(
                "Invalid resources directory '{}': must be a relative path without '.'",
                self.resources_dir
            );
        }
        if self.module_type.trim().is_empty() {
            anyhow::bail!("Module type must not be empty");
        }
        Ok(())
    }

    pub fn with_web_root(mut self, web_root: impl AsRef<Path>) -> Self {
        self.web_root = self.project_root.join(web_root);
        self
    }

    pub fn with_method(mut self, method: MethodSelector) -> Self {
        self.method = method;
        self
    }

    pub fn with_resources_dir(mut self, dir: impl Into<String>) -> Self {
        self.resources_dir = dir.into();
        self
    }

    pub fn with_vendor_dir(mut self, dir: impl Into<String>) -> Self {
        self.vendor_dir = dir.into();
        self
    }

    pub fn with_module_type(mut self, kind: impl Into<String>) -> Self {
        self.module_type = kind.into();
        self
    }

    pub fn with_support_files(mut self, files: Vec<SupportFile>) -> Self {
        self.support_files = files;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn web_root(&self) -> &Path {
        &self.web_root
    }

    /// The managed directory all exposures live under.
    pub fn resources_root(&self) -> PathBuf {
        self.web_root.join(&self.resources_dir)
    }

    pub fn vendor_dir(&self) -> &str {
        &self.vendor_dir
    }

    pub fn method(&self) -> MethodSelector {
        self.method
    }

    pub fn module_type(&self) -> &str {
        &self.module_type
    }

    pub fn packages_manifest(&self) -> &Path {
        &self.packages_manifest
    }

    pub fn support_files(&self) -> &[SupportFile] {
        &self.support_files
    }
}
