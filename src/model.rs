//! Type graph IR - the canonical intermediate representation
//!
//! An extraction run produces four kinds of immutable values:
//! - `TypeIr`: one declared type
//! - `RelationIr`: a directed structural edge between two type identifiers
//! - `ProjectIr`: the types and relations owned by one build unit
//! - `SolutionIr`: every project processed in a run, in processing order
//!
//! Identifiers are the only link between types and relations. A relation
//! target may name a type that was never extracted (an external reference).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Structural kind of a type. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
    /// Reference-type record
    #[serde(alias = "record")]
    RecordClass,
    /// Value-type record
    #[serde(alias = "record struct")]
    RecordStruct,
}

impl TypeKind {
    /// Get the string representation of the type kind
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Delegate => "delegate",
            TypeKind::RecordClass => "record_class",
            TypeKind::RecordStruct => "record_struct",
        }
    }

    /// Get all type kinds
    pub fn all() -> &'static [TypeKind] {
        &[
            TypeKind::Class,
            TypeKind::Struct,
            TypeKind::Interface,
            TypeKind::Enum,
            TypeKind::Delegate,
            TypeKind::RecordClass,
            TypeKind::RecordStruct,
        ]
    }
}

impl FromStr for TypeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "class" => Ok(TypeKind::Class),
            "struct" => Ok(TypeKind::Struct),
            "interface" => Ok(TypeKind::Interface),
            "enum" | "enumeration" => Ok(TypeKind::Enum),
            "delegate" => Ok(TypeKind::Delegate),
            "record_class" | "record" | "record class" => Ok(TypeKind::RecordClass),
            "record_struct" | "record struct" => Ok(TypeKind::RecordStruct),
            _ => Err(Error::Input(format!("Unknown type kind: {}", s))),
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared accessibility of a type.
///
/// The two compound levels are carried through from the provider so nothing
/// is lost, but they rank alongside their broader (`ProtectedInternal`) or
/// narrower (`PrivateProtected`) simple counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accessibility {
    #[serde(rename = "public")]
    Public,
    #[serde(rename = "internal")]
    Internal,
    #[serde(rename = "protected internal", alias = "protected_internal", alias = "protectedorinternal")]
    ProtectedInternal,
    #[serde(rename = "protected")]
    Protected,
    #[serde(rename = "private protected", alias = "private_protected", alias = "protectedandinternal")]
    PrivateProtected,
    #[serde(rename = "private")]
    Private,
}

impl Accessibility {
    /// Lower-cased declared label
    pub fn as_str(&self) -> &'static str {
        match self {
            Accessibility::Public => "public",
            Accessibility::Internal => "internal",
            Accessibility::ProtectedInternal => "protected internal",
            Accessibility::Protected => "protected",
            Accessibility::PrivateProtected => "private protected",
            Accessibility::Private => "private",
        }
    }

    /// Visibility rank: public 4, internal 3, protected 2, private 1.
    ///
    /// `protected internal` shares the internal rank.
    pub fn rank(&self) -> u8 {
        match self {
            Accessibility::Public => 4,
            Accessibility::Internal | Accessibility::ProtectedInternal => 3,
            Accessibility::Protected => 2,
            Accessibility::PrivateProtected | Accessibility::Private => 1,
        }
    }
}

impl FromStr for Accessibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(Accessibility::Public),
            "internal" => Ok(Accessibility::Internal),
            "protected internal" | "protected_internal" | "protectedorinternal" => {
                Ok(Accessibility::ProtectedInternal)
            }
            "protected" => Ok(Accessibility::Protected),
            "private protected" | "private_protected" | "protectedandinternal" => {
                Ok(Accessibility::PrivateProtected)
            }
            "private" => Ok(Accessibility::Private),
            _ => Err(Error::Input(format!("Unknown accessibility: {}", s))),
        }
    }
}

impl std::fmt::Display for Accessibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One extracted type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeIr {
    /// Stable identifier, unique within a project
    pub id: String,
    /// Simple (unqualified) name
    pub name: String,
    /// Dot-delimited namespace; empty means global
    pub namespace: String,
    pub kind: TypeKind,
    pub accessibility: Accessibility,
    pub is_abstract: bool,
    pub is_sealed: bool,
    pub is_static: bool,
}

impl TypeIr {
    /// Create a public type with no modifiers
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
        kind: TypeKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            namespace: namespace.into(),
            kind,
            accessibility: Accessibility::Public,
            is_abstract: false,
            is_sealed: false,
            is_static: false,
        }
    }

    /// Set the accessibility
    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    /// Set the abstract/sealed/static modifiers
    pub fn with_modifiers(mut self, is_abstract: bool, is_sealed: bool, is_static: bool) -> Self {
        self.is_abstract = is_abstract;
        self.is_sealed = is_sealed;
        self.is_static = is_static;
        self
    }

    /// Fold a repeated declaration of the same identifier into this one.
    ///
    /// The later declaration supplies the descriptive fields; modifier flags
    /// are OR-ed so the outcome does not depend on declaration order.
    pub fn merge(&mut self, later: TypeIr) {
        debug_assert_eq!(self.id, later.id);
        let is_abstract = self.is_abstract || later.is_abstract;
        let is_sealed = self.is_sealed || later.is_sealed;
        let is_static = self.is_static || later.is_static;
        *self = later;
        self.is_abstract = is_abstract;
        self.is_sealed = is_sealed;
        self.is_static = is_static;
    }
}

/// Relation kinds rendered in the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// Direct base type (never the universal root type)
    Inheritance,
    /// Interface implementation, one per interface in the transitive set
    Realization,
}

impl RelationKind {
    /// Get the string representation of the relation kind
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Inheritance => "inheritance",
            RelationKind::Realization => "realization",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed structural edge.
///
/// Equality and ordering cover the whole `(from, to, kind)` triple, which
/// makes the value its own deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationIr {
    pub from: String,
    pub to: String,
    pub kind: RelationKind,
}

impl RelationIr {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
        }
    }
}

/// Types and relations extracted from one build unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectIr {
    pub name: String,
    /// Deduplicated by id, in discovery order
    pub types: Vec<TypeIr>,
    /// Deduplicated and sorted by `(from, to, kind)`
    pub relations: Vec<RelationIr>,
}

impl ProjectIr {
    pub fn new(name: impl Into<String>, types: Vec<TypeIr>, relations: Vec<RelationIr>) -> Self {
        Self {
            name: name.into(),
            types,
            relations,
        }
    }
}

/// Every project processed in one run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionIr {
    pub projects: Vec<ProjectIr>,
}

impl SolutionIr {
    pub fn new(projects: Vec<ProjectIr>) -> Self {
        Self { projects }
    }

    /// All types across all projects
    pub fn all_types(&self) -> impl Iterator<Item = &TypeIr> {
        self.projects.iter().flat_map(|p| p.types.iter())
    }

    /// Total number of relations across all projects
    pub fn relation_count(&self) -> usize {
        self.projects.iter().map(|p| p.relations.len()).sum()
    }
}
