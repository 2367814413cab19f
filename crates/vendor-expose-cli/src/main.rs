//! vendor-expose - publish vendor module folders under the web root
//!
//! Usage:
//!   vendor-expose sync              # Expose every module and reconcile
//!   vendor-expose remove <name>     # Tear down one removed module
//!   vendor-expose status            # Show recorded exposures
//!   vendor-expose check <folder>..  # Validate folder names

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vendor_expose_core::config::{ConfigOverrides, ExposeConfig};
use vendor_expose_core::expose::{METHOD_ENV, MethodSelector};
use vendor_expose_core::module::Package;
use vendor_expose_core::orchestration::{
    ExposureOrchestrator, Notifier, RemovalReport, SyncReport,
};
use vendor_expose_core::packages::PackageSet;
use vendor_expose_core::registry::ResourceRegistry;
use vendor_expose_core::validate::validate_folder;

#[derive(Parser)]
#[command(name = "vendor-expose")]
#[command(about = "Expose vendor module folders under the web root", long_about = None)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expose every installed module and remove anything no module claims
    Sync {
        /// Installed package list (defaults to vendor/installed.json)
        #[arg(long)]
        packages: Option<PathBuf>,

        /// Exposure method (none, copy, symlink, auto)
        #[arg(long)]
        method: Option<MethodSelector>,

        /// Web root, relative to the project root
        #[arg(long)]
        web_root: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Remove everything a single package exposed
    #[command(alias = "rm")]
    Remove {
        /// Package name, e.g. acme/widgets
        name: String,

        /// Where the package was installed, if not under the vendor directory
        #[arg(long)]
        install_path: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show recorded exposures
    Status {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Check folder names against the exposure rules
    Check {
        /// Folder names as they would appear in a module's expose list
        #[arg(required = true)]
        folders: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// Only show issues (non-zero exit if problems)
    Quiet,
}

/// Progress on stdout, warnings on stderr.
struct ConsoleNotifier {
    show_progress: bool,
}

impl Notifier for ConsoleNotifier {
    fn progress(&self, message: &str) {
        if self.show_progress {
            println!("{message}");
        }
    }

    fn warning(&self, message: &str) {
        eprintln!("{} {}", style("warning:").yellow().bold(), message);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vendor_expose=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let project = match cli.project {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let exit_code = run(&project, cli.command)?;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

fn run(project: &Path, command: Commands) -> Result<i32> {
    match command {
        Commands::Sync {
            packages,
            method,
            web_root,
            format,
        } => {
            let overrides = ConfigOverrides {
                method,
                web_root,
                packages_manifest: packages,
            };
            run_sync(project, &overrides, format)
        }
        Commands::Remove {
            name,
            install_path,
            format,
        } => run_remove(project, name, install_path, format),
        Commands::Status { format } => run_status(project, format),
        Commands::Check { folders } => Ok(run_check(&folders)),
    }
}

fn load_config(
    project: &Path,
    overrides: &ConfigOverrides,
    notifier: &dyn Notifier,
) -> Result<ExposeConfig> {
    let env_method = std::env::var(METHOD_ENV).ok();
    let (config, warnings) = ExposeConfig::load(project, env_method.as_deref(), overrides)?;
    for warning in &warnings {
        notifier.warning(warning);
    }
    tracing::debug!(
        resources = %config.resources_root().display(),
        method = %config.method(),
        "configuration loaded"
    );
    Ok(config)
}

fn run_sync(project: &Path, overrides: &ConfigOverrides, format: OutputFormat) -> Result<i32> {
    let notifier = Arc::new(ConsoleNotifier {
        show_progress: format == OutputFormat::Table,
    });
    let config = load_config(project, overrides, notifier.as_ref())?;
    let packages = PackageSet::load(config.packages_manifest())?;

    let orchestrator = ExposureOrchestrator::new(config, notifier);
    let report = orchestrator.sync(&packages)?;

    match format {
        OutputFormat::Table => print_sync_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Quiet => {}
    }
    Ok(if report.is_clean() { 0 } else { 1 })
}

fn print_sync_table(report: &SyncReport) {
    println!();
    println!("Method: {}", report.method);

    if !report.exposed.is_empty() {
        println!("Exposed ({}):", report.exposed.len());
        println!("  {:<25} {:<15} {:<8} Target", "Module", "Folder", "Method");
        println!("  {}", "-".repeat(70));
        for folder in &report.exposed {
            let marker = if folder.changed { "✓" } else { "•" };
            println!(
                "  {:<25} {:<15} {:<8} {} {}",
                truncate(&folder.module, 25),
                truncate(&folder.folder, 15),
                folder.method,
                marker,
                folder.target.display()
            );
        }
    }

    for path in report.pruned.iter().chain(&report.swept) {
        println!("  {} {}", style("✗ removed").red(), path.display());
    }

    println!();
    if report.is_clean() {
        println!(
            "Summary: {} folders exposed, {} updated, all OK",
            report.exposed.len(),
            report.changed()
        );
    } else {
        println!(
            "Summary: {} folders exposed, {} updated, {} issues",
            report.exposed.len(),
            report.changed(),
            report.warnings.len()
        );
    }
}

fn run_remove(
    project: &Path,
    name: String,
    install_path: Option<PathBuf>,
    format: OutputFormat,
) -> Result<i32> {
    let notifier = Arc::new(ConsoleNotifier {
        show_progress: format == OutputFormat::Table,
    });
    let config = load_config(project, &ConfigOverrides::default(), notifier.as_ref())?;

    let mut package = Package::new(name, config.module_type());
    if let Some(path) = install_path {
        package = package.with_install_path(path);
    }

    let orchestrator = ExposureOrchestrator::new(config, notifier);
    let report = orchestrator.remove(&package)?;

    match format {
        OutputFormat::Table => print_removal(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Quiet => {}
    }
    Ok(if report.warnings.is_empty() { 0 } else { 1 })
}

fn print_removal(report: &RemovalReport) {
    if report.removed.is_empty() {
        println!("• Nothing exposed by '{}'", report.module);
        return;
    }
    println!("✓ Removed exposures of '{}'", report.module);
    for path in &report.removed {
        println!("  {}", path.display());
    }
}

fn run_status(project: &Path, format: OutputFormat) -> Result<i32> {
    let notifier = ConsoleNotifier {
        show_progress: false,
    };
    let config = load_config(project, &ConfigOverrides::default(), &notifier)?;
    let root = config.resources_root();
    let registry = load_registry_or_empty(&root, &notifier);

    // (target, method, owner, present on disk)
    let rows: Vec<(PathBuf, String, String, bool)> = registry
        .records()
        .map(|(target, record)| {
            let present = std::fs::symlink_metadata(&target).is_ok();
            (
                target,
                record.method.to_string(),
                record.module.clone(),
                present,
            )
        })
        .collect();
    let missing = rows
        .iter()
        .filter(|(_, method, _, present)| !present && method != "none")
        .count();

    match format {
        OutputFormat::Table => {
            println!("Resources: {}", root.display());
            println!("Method: {}", config.method());
            println!();
            if rows.is_empty() {
                println!("No exposures recorded.");
                println!("Run 'vendor-expose sync' to expose installed modules.");
                return Ok(0);
            }
            println!("  {:<25} {:<8} {:<40} Status", "Module", "Method", "Target");
            println!("  {}", "-".repeat(85));
            for (target, method, owner, present) in &rows {
                let relative = target.strip_prefix(&root).unwrap_or(target);
                let status = if *present || method == "none" {
                    "✓"
                } else {
                    "✗ missing"
                };
                println!(
                    "  {:<25} {:<8} {:<40} {}",
                    truncate(owner, 25),
                    method,
                    truncate(&relative.display().to_string(), 40),
                    status
                );
            }
        }
        OutputFormat::Json => {
            let exposures: Vec<_> = rows
                .iter()
                .map(|(target, method, owner, present)| {
                    serde_json::json!({
                        "target": target,
                        "method": method,
                        "module": owner,
                        "present": present,
                    })
                })
                .collect();
            let output = serde_json::json!({
                "resources": root,
                "method": config.method().as_str(),
                "exposures": exposures,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Quiet => {
            for (target, method, _, present) in &rows {
                if !present && method != "none" {
                    println!("missing: {}", target.display());
                }
            }
        }
    }
    Ok(if missing == 0 { 0 } else { 1 })
}

/// An unreadable manifest is reported and shown as empty.
fn load_registry_or_empty(root: &Path, notifier: &dyn Notifier) -> ResourceRegistry {
    match ResourceRegistry::load(root) {
        Ok(registry) => registry,
        Err(err) => {
            notifier.warning(&format!("{err}; showing an empty registry"));
            ResourceRegistry::empty(root)
        }
    }
}

fn run_check(folders: &[String]) -> i32 {
    let mut rejected = 0;
    for folder in folders {
        if validate_folder(folder) {
            println!("{} {}", style("✓").green(), folder);
        } else {
            rejected += 1;
            println!("{} {}", style("✗").red(), folder);
        }
    }
    if rejected > 0 {
        eprintln!(
            "{} folder names must be relative and contain no '.'",
            style("error:").red().bold()
        );
        1
    } else {
        0
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_sync_flags() {
        let cli = Cli::try_parse_from([
            "vendor-expose",
            "--project",
            "/proj",
            "sync",
            "--method",
            "copy",
            "--format",
            "json",
        ])
        .expect("arguments should parse");
        assert_eq!(cli.project, Some(PathBuf::from("/proj")));
        match cli.command {
            Commands::Sync { method, format, .. } => {
                assert_eq!(method, Some(MethodSelector::Copy));
                assert!(format == OutputFormat::Json);
            }
            _ => panic!("expected sync"),
        }
    }

    #[test]
    fn cli_rejects_unknown_method() {
        assert!(
            Cli::try_parse_from(["vendor-expose", "sync", "--method", "hardlink"]).is_err()
        );
    }

    #[test]
    fn check_exit_code_follows_validation() {
        assert_eq!(run_check(&["client".into(), "js/dist".into()]), 0);
        assert_eq!(run_check(&["client".into(), "../etc".into()]), 1);
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("acme/widgets", 25), "acme/widgets");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }

    #[test]
    fn status_survives_corrupt_registry() {
        let tmp = tempfile::TempDir::new().expect("tempdir should succeed");
        let resources = tmp.path().join("resources");
        std::fs::create_dir_all(&resources).expect("create_dir_all should succeed");
        std::fs::write(
            resources.join(vendor_expose_core::registry::MANIFEST_FILE),
            "{ definitely not json",
        )
        .expect("write should succeed");

        let registry = load_registry_or_empty(
            &resources,
            &ConsoleNotifier {
                show_progress: false,
            },
        );
        assert!(registry.is_empty());
        assert_eq!(
            run_status(tmp.path(), OutputFormat::Quiet).expect("status should not fail"),
            0
        );
    }
}
