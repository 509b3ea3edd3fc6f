//! # typediagram - Deterministic class diagrams from a type graph
//!
//! Extracts the types of an object-oriented codebase and renders them as a
//! Mermaid `classDiagram` that stays byte-identical across runs.
//!
//! typediagram provides:
//! - A canonical intermediate representation (IR) of types and their
//!   inheritance / interface-realization relations
//! - Pluggable symbol providers that feed the IR builder
//! - A pure renderer plus a write-if-changed writer using atomic replace
//! - An exact byte comparison for drift detection between two diagrams

pub mod model;
pub mod provider;
pub mod builder;
pub mod render;
pub mod writer;
pub mod drift;
pub mod toggle;
pub mod config;
pub mod ui;
pub mod output;

use std::path::PathBuf;

// Re-exports for convenient access
pub use model::{Accessibility, ProjectIr, RelationIr, RelationKind, SolutionIr, TypeIr, TypeKind};
pub use builder::{AccessFloor, build_project, build_solution};
pub use render::{Direction, render};
pub use writer::{WriteOutcome, write_if_changed};
pub use drift::{DriftReport, files_equal};
pub use provider::{BuildUnit, DescriptorKind, SymbolProvider};

/// Result type alias for typediagram operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for typediagram operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No compilation for {unit}: {reason}")]
    Extraction { unit: String, reason: String },

    #[error("Input error: {0}")]
    Input(String),

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
