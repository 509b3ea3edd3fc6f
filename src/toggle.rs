//! Build integration toggles
//!
//! The build integration is controlled by `typediagram.toml` documents:
//! one repo-wide document at the repository root holding the package entry
//! and the repo default, plus optional per-unit documents
//! (`<unit>.typediagram.toml`, next to the unit descriptor) that override
//! the default.
//!
//! ```toml
//! [build]
//! typediagram-enabled = true
//!
//! [build.packages.typediagram-build]
//! version = "1.1.0"
//! private-assets = "all"
//! ```
//!
//! Edits go through `toml_edit` so comments, ordering and unrelated keys
//! survive, and every save is a write-if-changed.

use crate::provider::dump::{AGGREGATE_SUFFIX, solution_units, unit_name};
use crate::writer::{WriteOutcome, write_if_changed};
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item, Table};

/// File name of build configuration documents
pub const BUILD_CONFIG_FILE: &str = "typediagram.toml";

/// Package that runs the diagram generation during builds
pub const PACKAGE_NAME: &str = "typediagram-build";

/// Version installed when none is requested
pub const DEFAULT_PACKAGE_VERSION: &str = "1.1.0";

/// Key of the enablement switch inside `[build]`
pub const ENABLED_KEY: &str = "typediagram-enabled";

const BUILD_TABLE: &str = "build";
const PACKAGES_TABLE: &str = "packages";

/// Nearest ancestor of `start` (inclusive) that contains `.git`.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Where the repo-wide document lives: the repository root, or `start`
/// outside of a repository.
pub fn repo_config_path(start: &Path) -> PathBuf {
    find_repo_root(start)
        .unwrap_or_else(|| start.to_path_buf())
        .join(BUILD_CONFIG_FILE)
}

/// Nearest existing build document at or above `start`.
pub fn find_build_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(BUILD_CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

/// Build document that overrides the repo default for one unit:
/// `<unit>.typediagram.toml` next to the unit descriptor.
pub fn unit_config_path(unit: &Path) -> PathBuf {
    let file = format!("{}.{}", unit_name(unit), BUILD_CONFIG_FILE);
    match unit.parent() {
        Some(dir) => dir.join(file),
        None => PathBuf::from(file),
    }
}

/// First solution manifest in `dir`, by file name.
pub fn find_solution_in_dir(dir: &Path) -> Result<Option<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let mut solutions: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_ascii_lowercase().ends_with(AGGREGATE_SUFFIX))
                    .unwrap_or(false)
        })
        .collect();
    solutions.sort();
    Ok(solutions.into_iter().next())
}

/// A build configuration document open for editing.
#[derive(Debug, Clone)]
pub struct BuildDocument {
    path: PathBuf,
    doc: DocumentMut,
}

impl BuildDocument {
    /// Open a document; a missing file yields an empty one.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(Error::io(path, e)),
        };
        let doc = text
            .parse::<DocumentMut>()
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn build(&self) -> Option<&Table> {
        self.doc.get(BUILD_TABLE).and_then(Item::as_table)
    }

    fn build_mut(&mut self) -> Result<&mut Table> {
        child_table(self.doc.as_table_mut(), BUILD_TABLE, false)
    }

    fn package(&self, name: &str) -> Option<&Table> {
        self.build()?
            .get(PACKAGES_TABLE)
            .and_then(Item::as_table)?
            .get(name)
            .and_then(Item::as_table)
    }

    /// Add the package entry or update its version.
    pub fn upsert_package(&mut self, name: &str, version: &str) -> Result<()> {
        let packages = child_table(self.build_mut()?, PACKAGES_TABLE, true)?;
        let package = child_table(packages, name, false)?;
        package.insert("version", toml_edit::value(version));
        package.insert("private-assets", toml_edit::value("all"));
        Ok(())
    }

    /// Remove the package entry, returning whether it was present.
    pub fn remove_package(&mut self, name: &str) -> bool {
        let Some(packages) = self
            .doc
            .get_mut(BUILD_TABLE)
            .and_then(Item::as_table_mut)
            .and_then(|build| build.get_mut(PACKAGES_TABLE))
            .and_then(Item::as_table_mut)
        else {
            return false;
        };
        let removed = packages.remove(name).is_some();
        if packages.is_empty() {
            if let Some(build) = self.doc.get_mut(BUILD_TABLE).and_then(Item::as_table_mut) {
                build.remove(PACKAGES_TABLE);
            }
        }
        removed
    }

    pub fn has_package(&self, name: &str) -> bool {
        self.package(name).is_some()
    }

    pub fn package_version(&self, name: &str) -> Option<String> {
        self.package(name)?
            .get("version")
            .and_then(Item::as_str)
            .map(str::to_string)
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.build_mut()?.insert(ENABLED_KEY, toml_edit::value(enabled));
        Ok(())
    }

    /// The enablement switch, `None` when unset.
    pub fn enabled(&self) -> Option<bool> {
        let item = self.build()?.get(ENABLED_KEY)?;
        item.as_bool()
            .or_else(|| item.as_str().and_then(|s| s.trim().to_ascii_lowercase().parse().ok()))
    }

    /// Persist the document, touching the file only when its bytes change.
    pub fn save(&self) -> Result<WriteOutcome> {
        let outcome = write_if_changed(&self.path, &self.doc.to_string())?;
        tracing::debug!(path = %self.path.display(), outcome = outcome.as_str(), "build document saved");
        Ok(outcome)
    }
}

fn child_table<'a>(parent: &'a mut Table, key: &str, implicit: bool) -> Result<&'a mut Table> {
    parent
        .entry(key)
        .or_insert_with(|| {
            let mut table = Table::new();
            table.set_implicit(implicit);
            Item::Table(table)
        })
        .as_table_mut()
        .ok_or_else(|| Error::Config(format!("`{}` is not a table", key)))
}

/// Enablement of a single unit as seen by the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    /// The unit descriptor does not exist
    Missing,
    /// No local override; the repo default applies
    Inherits,
    Enabled,
    Disabled,
}

impl UnitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitState::Missing => "(missing)",
            UnitState::Inherits => "(inherits)",
            UnitState::Enabled => "true",
            UnitState::Disabled => "false",
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read the local override of a unit.
pub fn unit_state(unit: &Path) -> Result<UnitState> {
    if !unit.is_file() {
        return Ok(UnitState::Missing);
    }
    let doc = BuildDocument::load(&unit_config_path(unit))?;
    Ok(match doc.enabled() {
        Some(true) => UnitState::Enabled,
        Some(false) => UnitState::Disabled,
        None => UnitState::Inherits,
    })
}

/// Set the local override of a unit.
pub fn set_unit_enabled(unit: &Path, enabled: bool) -> Result<WriteOutcome> {
    if !unit.is_file() {
        return Err(Error::NotFound(unit.to_path_buf()));
    }
    let mut doc = BuildDocument::load(&unit_config_path(unit))?;
    doc.set_enabled(enabled)?;
    doc.save()
}

/// Install the package entry repo-wide and turn generation on.
pub fn install(start: &Path, version: &str) -> Result<BuildDocument> {
    let mut doc = BuildDocument::load(&repo_config_path(start))?;
    doc.upsert_package(PACKAGE_NAME, version)?;
    doc.set_enabled(true)?;
    let outcome = doc.save()?;
    tracing::info!(path = %doc.path().display(), version, outcome = outcome.as_str(), "package installed");
    Ok(doc)
}

/// Set the repo-wide default.
pub fn set_repo_default(start: &Path, enabled: bool) -> Result<BuildDocument> {
    let mut doc = BuildDocument::load(&repo_config_path(start))?;
    doc.set_enabled(enabled)?;
    doc.save()?;
    Ok(doc)
}

/// Remove the package entry from the nearest build document.
///
/// Returns `None` when there is no build document at all.
pub fn uninstall(start: &Path) -> Result<Option<BuildDocument>> {
    let Some(path) = find_build_config(start) else {
        return Ok(None);
    };
    let mut doc = BuildDocument::load(&path)?;
    if doc.remove_package(PACKAGE_NAME) {
        doc.save()?;
    }
    Ok(Some(doc))
}

/// One unit of the solution in the current directory
#[derive(Debug, Clone, Serialize)]
pub struct UnitStatus {
    pub path: PathBuf,
    pub state: UnitState,
}

/// Install and enablement state as reported by `status`
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub build_config: Option<PathBuf>,
    pub package_version: Option<String>,
    pub repo_default: Option<bool>,
    pub solution: Option<PathBuf>,
    pub units: Vec<UnitStatus>,
}

impl StatusReport {
    pub fn gather(start: &Path) -> Result<Self> {
        let (build_config, package_version, repo_default) = match find_build_config(start) {
            Some(path) => {
                let doc = BuildDocument::load(&path)?;
                (Some(path), doc.package_version(PACKAGE_NAME), doc.enabled())
            }
            None => (None, None, None),
        };

        let solution = find_solution_in_dir(start)?;
        let units = match &solution {
            Some(manifest) => solution_units(manifest)?
                .into_iter()
                .map(|path| {
                    let state = unit_state(&path)?;
                    Ok(UnitStatus { path, state })
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            build_config,
            package_version,
            repo_default,
            solution,
            units,
        })
    }
}
