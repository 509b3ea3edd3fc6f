//! `typediagram.toml` configuration
//!
//! The same document carries the `[emit]` defaults read here and the
//! `[build]` section edited by the toggle commands. Values resolve as
//! command-line flag, then config file, then built-in default.

use crate::builder::AccessFloor;
use crate::render::Direction;
use crate::toggle::find_build_config;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_DIRECTION: &str = "LR";
pub const DEFAULT_MIN_ACCESS: &str = "public";
pub const DIAGRAM_EXTENSION: &str = "mmd";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TypediagramConfig {
    #[serde(default)]
    pub emit: EmitConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct EmitConfig {
    pub direction: Option<String>,
    pub min_access: Option<String>,
    /// Directory for rendered diagrams, relative to the config file
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct BuildConfig {
    pub typediagram_enabled: Option<bool>,
    #[serde(default)]
    pub packages: BTreeMap<String, PackageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PackageConfig {
    pub version: Option<String>,
    pub private_assets: Option<String>,
}

/// A parsed config together with where it came from
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub path: Option<PathBuf>,
    pub config: TypediagramConfig,
}

impl LoadedConfig {
    fn base_dir(&self) -> PathBuf {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

/// Load the config file.
///
/// An explicit path must exist. Without one, the nearest `typediagram.toml`
/// at or above `start` is used, and no file at all means defaults.
pub fn load_config(explicit: Option<&Path>, start: &Path) -> Result<LoadedConfig> {
    let path = match explicit {
        Some(path) if !path.is_file() => {
            return Err(Error::Config(format!("config file {} does not exist", path.display())));
        }
        Some(path) => path.to_path_buf(),
        None => match find_build_config(start) {
            Some(path) => path,
            None => return Ok(LoadedConfig::default()),
        },
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
    let config: TypediagramConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(LoadedConfig {
        path: Some(path),
        config,
    })
}

/// Fully resolved settings for one `emit` run
#[derive(Debug, Clone, PartialEq)]
pub struct EmitSettings {
    pub direction: Option<Direction>,
    pub floor: AccessFloor,
    pub out: PathBuf,
}

/// Command-line overrides for `emit`
#[derive(Debug, Clone, Default)]
pub struct EmitOverrides {
    pub out: Option<PathBuf>,
    pub direction: Option<String>,
    pub min_access: Option<String>,
}

impl LoadedConfig {
    /// Merge flags over the `[emit]` section over the defaults.
    ///
    /// `stem` names the default output file `<stem>.mmd`, placed next to the
    /// descriptor unless `out-dir` is configured.
    pub fn emit_settings(&self, descriptor: &Path, stem: &str, overrides: EmitOverrides) -> EmitSettings {
        let emit = &self.config.emit;
        let direction = overrides
            .direction
            .or_else(|| emit.direction.clone())
            .unwrap_or_else(|| DEFAULT_DIRECTION.to_string());
        let min_access = overrides
            .min_access
            .or_else(|| emit.min_access.clone())
            .unwrap_or_else(|| DEFAULT_MIN_ACCESS.to_string());

        let file_name = format!("{}.{}", stem, DIAGRAM_EXTENSION);
        let out = match (overrides.out, &emit.out_dir) {
            (Some(out), _) => out,
            (None, Some(dir)) => self.base_dir().join(dir).join(file_name),
            (None, None) => default_output_path(descriptor, &file_name),
        };

        EmitSettings {
            direction: Direction::parse(&direction),
            floor: AccessFloor::parse(&min_access),
            out,
        }
    }
}

fn default_output_path(descriptor: &Path, file_name: &str) -> PathBuf {
    match descriptor.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}
