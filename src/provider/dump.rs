//! Symbol dump provider
//!
//! Loads build units from JSON symbol dumps (`*.symbols.json`, one per
//! project) and solutions from TOML manifests (`*.solution.toml`) that list
//! unit dumps relative to the manifest, glob patterns allowed.
//!
//! A dump declares each type with its *direct* base type and interfaces.
//! The provider assigns documentation-style identifiers to declared types
//! and closes every interface set transitively (through inherited
//! interfaces and the base type chain), using a `references` section for
//! types that live in referenced binaries.

use crate::model::{Accessibility, TypeKind};
use crate::provider::symbols::{BuildUnit, Compilation, NamespaceSymbol, TypeRef, TypeSymbol};
use crate::provider::{DescriptorKind, SymbolProvider};
use crate::{Error, Result};
use indexmap::IndexSet;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// File suffix of a single build unit dump
pub const UNIT_SUFFIX: &str = ".symbols.json";
/// File suffix of a solution manifest
pub const AGGREGATE_SUFFIX: &str = ".solution.toml";
/// Identifier of the universal root type
pub const ROOT_TYPE_ID: &str = "T:System.Object";

#[derive(Debug, Deserialize)]
struct UnitDump {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    types: Vec<TypeDecl>,
    /// Types from referenced binaries, used only to close interface sets
    #[serde(default)]
    references: Vec<TypeDecl>,
}

#[derive(Debug, Deserialize)]
struct TypeDecl {
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    arity: u32,
    #[serde(default = "default_kind")]
    kind: TypeKind,
    #[serde(default)]
    accessibility: Option<Accessibility>,
    #[serde(default, rename = "abstract")]
    is_abstract: bool,
    #[serde(default, rename = "sealed")]
    is_sealed: bool,
    #[serde(default, rename = "static")]
    is_static: bool,
    #[serde(default = "default_in_source")]
    in_source: bool,
    #[serde(default)]
    base: Option<RefDecl>,
    /// Direct interfaces; `null` entries are unresolvable references
    #[serde(default)]
    interfaces: Vec<Option<RefDecl>>,
    #[serde(default)]
    nested: Vec<TypeDecl>,
}

fn default_kind() -> TypeKind {
    TypeKind::Class
}

fn default_in_source() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RefDecl {
    Id(String),
    Detailed {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        root: bool,
    },
}

impl RefDecl {
    fn to_type_ref(&self) -> TypeRef {
        match self {
            RefDecl::Id(id) => TypeRef {
                is_root: id == ROOT_TYPE_ID,
                id: Some(id.clone()),
            },
            RefDecl::Detailed { id, root } => TypeRef {
                is_root: *root || id.as_deref() == Some(ROOT_TYPE_ID),
                id: id.clone(),
            },
        }
    }
}

fn to_type_ref(decl: &Option<RefDecl>) -> TypeRef {
    decl.as_ref().map(RefDecl::to_type_ref).unwrap_or_default()
}

/// Documentation-style identifier: `T:` + namespace + containing types +
/// name, with a `` `N`` suffix for generic arity.
pub fn doc_id(namespace: &str, containing: &[&str], name: &str, arity: u32) -> String {
    let mut id = String::from("T:");
    for part in std::iter::once(namespace).chain(containing.iter().copied()) {
        if !part.is_empty() {
            id.push_str(part);
            id.push('.');
        }
    }
    id.push_str(name);
    if arity > 0 {
        id.push('`');
        id.push_str(&arity.to_string());
    }
    id
}

/// Direct relations of one known type, keyed by identifier in `TypeIndex`
#[derive(Debug)]
struct IndexEntry {
    base: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
}

/// Every type a dump knows about, declared or referenced
#[derive(Debug, Default)]
struct TypeIndex {
    entries: HashMap<String, IndexEntry>,
}

impl TypeIndex {
    fn from_dump(dump: &UnitDump) -> Self {
        let mut index = Self::default();
        for decl in dump.types.iter().chain(dump.references.iter()) {
            index.insert(decl, &decl.namespace, &mut Vec::new());
        }
        index
    }

    fn insert<'a>(&mut self, decl: &'a TypeDecl, namespace: &str, containing: &mut Vec<&'a str>) {
        let id = decl
            .id
            .clone()
            .unwrap_or_else(|| doc_id(namespace, containing, &decl.name, decl.arity));
        self.entries.entry(id).or_insert_with(|| IndexEntry {
            base: decl.base.as_ref().map(RefDecl::to_type_ref),
            interfaces: decl.interfaces.iter().map(to_type_ref).collect(),
        });

        containing.push(&decl.name);
        for nested in &decl.nested {
            self.insert(nested, namespace, containing);
        }
        containing.pop();
    }

    /// Transitive interface set: own interfaces (recursively), then those
    /// of each type along the base chain. First-seen order, no repeats of
    /// resolvable identifiers.
    fn all_interfaces(&self, base: Option<&TypeRef>, direct: &[TypeRef]) -> Vec<TypeRef> {
        let mut seen = IndexSet::new();
        let mut unresolved = 0usize;
        self.collect_interfaces(direct, &mut seen, &mut unresolved);

        let mut visited_bases = HashSet::new();
        let mut current = base.cloned();
        while let Some(base_ref) = current {
            if base_ref.is_root {
                break;
            }
            let Some(id) = base_ref.id else {
                break;
            };
            if !visited_bases.insert(id.clone()) {
                break;
            }
            let Some(entry) = self.entries.get(&id) else {
                break;
            };
            self.collect_interfaces(&entry.interfaces, &mut seen, &mut unresolved);
            current = entry.base.clone();
        }

        seen.into_iter()
            .map(TypeRef::to)
            .chain(std::iter::repeat_with(TypeRef::unresolved).take(unresolved))
            .collect()
    }

    fn collect_interfaces(&self, refs: &[TypeRef], seen: &mut IndexSet<String>, unresolved: &mut usize) {
        for r in refs {
            match &r.id {
                None => *unresolved += 1,
                Some(id) => {
                    if seen.insert(id.clone()) {
                        if let Some(entry) = self.entries.get(id) {
                            self.collect_interfaces(&entry.interfaces, seen, unresolved);
                        }
                    }
                }
            }
        }
    }
}

/// Provider for JSON symbol dumps and TOML solution manifests
#[derive(Debug, Default)]
pub struct DumpProvider;

impl DumpProvider {
    pub fn new() -> Self {
        Self
    }

    /// Load one unit dump. Read and parse failures yield a unit without a
    /// compilation rather than an error.
    pub fn load_unit(&self, path: &Path) -> BuildUnit {
        let fallback_name = unit_name(path);
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read symbol dump");
                return BuildUnit::failed(fallback_name, path, format!("cannot read {}: {}", path.display(), e));
            }
        };
        let dump: UnitDump = match serde_json::from_str(&text) {
            Ok(dump) => dump,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "malformed symbol dump");
                return BuildUnit::failed(fallback_name, path, format!("malformed symbol dump: {}", e));
            }
        };

        let name = dump.name.clone().unwrap_or(fallback_name);
        let index = TypeIndex::from_dump(&dump);
        let mut global = NamespaceSymbol::default();
        for decl in &dump.types {
            let symbol = to_symbol(decl, &decl.namespace, &mut Vec::new(), &index);
            global.descend_mut(&decl.namespace).types.push(symbol);
        }

        tracing::debug!(unit = %name, types = dump.types.len(), "symbol dump loaded");
        BuildUnit::compiled(name, path, Compilation { global })
    }

    fn load_aggregate(&self, path: &Path) -> Result<Vec<BuildUnit>> {
        let unit_paths = solution_units(path)?;
        Ok(unit_paths.iter().map(|p| self.load_unit(p)).collect())
    }
}

/// Unit descriptor paths listed by a solution manifest, in manifest order
/// with glob matches sorted and duplicates removed.
pub fn solution_units(path: &Path) -> Result<Vec<PathBuf>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let manifest: SolutionManifest = toml::from_str(&text)
        .map_err(|e| Error::Input(format!("malformed solution manifest {}: {}", path.display(), e)))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

    let mut unit_paths: IndexSet<PathBuf> = IndexSet::new();
    for entry in &manifest.units {
        if is_glob(entry) {
            let pattern = base_dir.join(entry);
            let pattern = pattern.to_string_lossy();
            let mut matched: Vec<PathBuf> = glob::glob(&pattern)
                .map_err(|e| Error::Input(format!("invalid unit pattern '{}': {}", entry, e)))?
                .filter_map(|p| p.ok())
                .collect();
            matched.sort();
            if matched.is_empty() {
                tracing::warn!(pattern = %entry, "unit pattern matched nothing");
            }
            unit_paths.extend(matched);
        } else {
            unit_paths.insert(base_dir.join(entry));
        }
    }

    tracing::debug!(
        solution = manifest.name.as_deref().unwrap_or(""),
        units = unit_paths.len(),
        "solution manifest parsed"
    );
    Ok(unit_paths.into_iter().collect())
}

impl SymbolProvider for DumpProvider {
    fn name(&self) -> &str {
        "symbol-dump"
    }

    fn descriptor_kind(&self, path: &Path) -> Option<DescriptorKind> {
        let file_name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if file_name.ends_with(UNIT_SUFFIX) {
            Some(DescriptorKind::Unit)
        } else if file_name.ends_with(AGGREGATE_SUFFIX) {
            Some(DescriptorKind::Aggregate)
        } else {
            None
        }
    }

    fn descriptor_stem(&self, path: &Path) -> String {
        unit_name(path)
    }

    fn load(&self, path: &Path) -> Result<Vec<BuildUnit>> {
        match self.descriptor_kind(path) {
            Some(DescriptorKind::Unit) => Ok(vec![self.load_unit(path)]),
            Some(DescriptorKind::Aggregate) => self.load_aggregate(path),
            None => Err(Error::Input(format!(
                "{} is not a symbol dump or solution manifest",
                path.display()
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SolutionManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    units: Vec<String>,
}

fn is_glob(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

/// File name with the descriptor suffix removed (`Shop.Core.symbols.json`
/// becomes `Shop.Core`).
pub fn unit_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let lower = file_name.to_ascii_lowercase();
    for suffix in [UNIT_SUFFIX, AGGREGATE_SUFFIX] {
        if lower.ends_with(suffix) {
            return file_name[..file_name.len() - suffix.len()].to_string();
        }
    }
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or(file_name)
}

fn to_symbol<'a>(
    decl: &'a TypeDecl,
    namespace: &str,
    containing: &mut Vec<&'a str>,
    index: &TypeIndex,
) -> TypeSymbol {
    let id = decl
        .id
        .clone()
        .unwrap_or_else(|| doc_id(namespace, containing, &decl.name, decl.arity));
    let accessibility = decl.accessibility.unwrap_or(if containing.is_empty() {
        Accessibility::Internal
    } else {
        Accessibility::Private
    });
    let base = decl.base.as_ref().map(RefDecl::to_type_ref);
    let direct: Vec<TypeRef> = decl.interfaces.iter().map(to_type_ref).collect();
    let all_interfaces = index.all_interfaces(base.as_ref(), &direct);

    containing.push(&decl.name);
    let nested = decl
        .nested
        .iter()
        .map(|n| to_symbol(n, namespace, containing, index))
        .collect();
    containing.pop();

    TypeSymbol {
        name: decl.name.clone(),
        namespace: namespace.to_string(),
        doc_id: Some(id),
        kind: decl.kind,
        accessibility,
        is_abstract: decl.is_abstract,
        is_sealed: decl.is_sealed,
        is_static: decl.is_static,
        in_source: decl.in_source,
        base,
        all_interfaces,
        nested,
    }
}
