//! Symbol boundary types
//!
//! What a symbol provider hands to the IR builder: per build unit, an
//! optional compilation whose global namespace roots a tree of namespaces
//! and (possibly nested) type symbols.

use crate::model::{Accessibility, TypeKind};
use std::path::PathBuf;

/// A reference from one type to another (base type or interface).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeRef {
    /// Stable identifier, `None` when the target cannot be resolved
    pub id: Option<String>,
    /// The universal root type every class implicitly derives from
    pub is_root: bool,
}

impl TypeRef {
    /// A resolvable reference
    pub fn to(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            is_root: false,
        }
    }

    /// A reference to the universal root type
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            is_root: true,
        }
    }

    /// A reference with no computable identifier
    pub fn unresolved() -> Self {
        Self::default()
    }
}

/// A type symbol as seen by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSymbol {
    pub name: String,
    /// Containing namespace, dot-delimited; empty for global
    pub namespace: String,
    /// Documentation-style identifier, if the provider can compute one
    pub doc_id: Option<String>,
    pub kind: TypeKind,
    pub accessibility: Accessibility,
    pub is_abstract: bool,
    pub is_sealed: bool,
    pub is_static: bool,
    /// False for types only visible through referenced binaries
    pub in_source: bool,
    /// Direct base type, if any
    pub base: Option<TypeRef>,
    /// Full transitive set of realized interfaces
    pub all_interfaces: Vec<TypeRef>,
    /// Types declared inside this one
    pub nested: Vec<TypeSymbol>,
}

impl TypeSymbol {
    /// Create a public, source-declared type with no relations
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            doc_id: None,
            kind,
            accessibility: Accessibility::Public,
            is_abstract: false,
            is_sealed: false,
            is_static: false,
            in_source: true,
            base: None,
            all_interfaces: Vec::new(),
            nested: Vec::new(),
        }
    }

    pub fn with_doc_id(mut self, id: impl Into<String>) -> Self {
        self.doc_id = Some(id.into());
        self
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn with_base(mut self, base: TypeRef) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_interface(mut self, interface: TypeRef) -> Self {
        self.all_interfaces.push(interface);
        self
    }

    pub fn with_nested(mut self, nested: TypeSymbol) -> Self {
        self.nested.push(nested);
        self
    }
}

/// A namespace node in the symbol tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamespaceSymbol {
    /// Last segment of the namespace path; empty for the global namespace
    pub name: String,
    pub types: Vec<TypeSymbol>,
    pub namespaces: Vec<NamespaceSymbol>,
}

impl NamespaceSymbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Get or create the child namespace with the given segment name
    pub fn child_mut(&mut self, name: &str) -> &mut NamespaceSymbol {
        let index = match self.namespaces.iter().position(|ns| ns.name == name) {
            Some(index) => index,
            None => {
                self.namespaces.push(NamespaceSymbol::new(name));
                self.namespaces.len() - 1
            }
        };
        &mut self.namespaces[index]
    }

    /// Get or create the namespace at a dotted path below this one
    pub fn descend_mut(&mut self, path: &str) -> &mut NamespaceSymbol {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .fold(self, |ns, segment| ns.child_mut(segment))
    }
}

/// The semantic model of one build unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Compilation {
    pub global: NamespaceSymbol,
}

/// One build unit as loaded by a provider.
#[derive(Debug, Clone)]
pub struct BuildUnit {
    pub name: String,
    /// Descriptor the unit was loaded from
    pub path: PathBuf,
    /// `None` when no semantic model could be obtained
    pub compilation: Option<Compilation>,
    /// Load problems reported by the provider
    pub diagnostics: Vec<String>,
}

impl BuildUnit {
    /// A successfully loaded unit
    pub fn compiled(name: impl Into<String>, path: impl Into<PathBuf>, compilation: Compilation) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            compilation: Some(compilation),
            diagnostics: Vec::new(),
        }
    }

    /// A unit whose semantic model could not be obtained
    pub fn failed(name: impl Into<String>, path: impl Into<PathBuf>, diagnostic: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            compilation: None,
            diagnostics: vec![diagnostic.into()],
        }
    }
}
