//! IR Builder
//!
//! Walks the namespace tree of each build unit and produces the canonical
//! IR:
//! - source-declared types at or above the accessibility floor, nested
//!   types included
//! - one inheritance relation per type (never to the root type)
//! - one realization relation per interface in the transitive set
//!
//! Types are deduplicated by identifier in discovery order; relations are
//! deduplicated by `(from, to, kind)` in an ordered set, so the emitted
//! lists never depend on hash iteration order.

use crate::model::{Accessibility, ProjectIr, RelationIr, RelationKind, SolutionIr, TypeIr};
use crate::provider::{BuildUnit, NamespaceSymbol, TypeSymbol};
use crate::{Error, Result};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Minimum accessibility a type needs to be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessFloor(u8);

impl AccessFloor {
    pub const PUBLIC: AccessFloor = AccessFloor(4);
    pub const INTERNAL: AccessFloor = AccessFloor(3);
    pub const PROTECTED: AccessFloor = AccessFloor(2);
    pub const PRIVATE: AccessFloor = AccessFloor(1);

    /// Parse `public|internal|protected|private` (any case).
    ///
    /// Anything else means public only.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "internal" => Self::INTERNAL,
            "protected" => Self::PROTECTED,
            "private" => Self::PRIVATE,
            _ => Self::PUBLIC,
        }
    }

    /// Check whether a declared accessibility clears the floor
    pub fn admits(&self, accessibility: Accessibility) -> bool {
        accessibility.rank() >= self.0
    }
}

impl Default for AccessFloor {
    fn default() -> Self {
        Self::PUBLIC
    }
}

/// Build the IR of every unit, in order.
///
/// A unit without a compilation aborts the whole run: a diagram missing
/// part of a solution would be silently wrong.
pub fn build_solution(units: &[BuildUnit], floor: AccessFloor) -> Result<SolutionIr> {
    let projects = units
        .iter()
        .map(|unit| build_project(unit, floor))
        .collect::<Result<Vec<_>>>()?;
    Ok(SolutionIr::new(projects))
}

/// Build the IR of a single unit.
pub fn build_project(unit: &BuildUnit, floor: AccessFloor) -> Result<ProjectIr> {
    let compilation = unit.compilation.as_ref().ok_or_else(|| Error::Extraction {
        unit: unit.name.clone(),
        reason: if unit.diagnostics.is_empty() {
            "no semantic model available".to_string()
        } else {
            unit.diagnostics.join("; ")
        },
    })?;

    let mut collector = Collector::new(floor);
    collector.walk_namespace(&compilation.global);

    let project = collector.finish(&unit.name);
    tracing::debug!(
        unit = %unit.name,
        types = project.types.len(),
        relations = project.relations.len(),
        "project extracted"
    );
    Ok(project)
}

struct Collector {
    floor: AccessFloor,
    types: IndexMap<String, TypeIr>,
    relations: BTreeSet<RelationIr>,
}

impl Collector {
    fn new(floor: AccessFloor) -> Self {
        Self {
            floor,
            types: IndexMap::new(),
            relations: BTreeSet::new(),
        }
    }

    fn walk_namespace(&mut self, ns: &NamespaceSymbol) {
        for t in &ns.types {
            self.process_type(t);
        }
        for child in &ns.namespaces {
            self.walk_namespace(child);
        }
    }

    fn process_type(&mut self, t: &TypeSymbol) {
        // Only visible through referenced binaries: not owned by this unit
        if !t.in_source {
            return;
        }
        if !self.floor.admits(t.accessibility) {
            return;
        }

        let id = type_id(t);
        let ir = TypeIr {
            id: id.clone(),
            name: t.name.clone(),
            namespace: t.namespace.clone(),
            kind: t.kind,
            accessibility: t.accessibility,
            is_abstract: t.is_abstract,
            is_sealed: t.is_sealed,
            is_static: t.is_static,
        };
        match self.types.get_mut(&id) {
            Some(existing) => existing.merge(ir),
            None => {
                self.types.insert(id.clone(), ir);
            }
        }

        if let Some(base) = &t.base {
            match (&base.id, base.is_root) {
                (Some(to), false) => {
                    self.relations.insert(RelationIr::new(&id, to, RelationKind::Inheritance));
                }
                (None, _) => {
                    tracing::debug!(from = %id, "dropping inheritance edge to unresolvable base");
                }
                (Some(_), true) => {}
            }
        }

        for interface in &t.all_interfaces {
            match &interface.id {
                Some(to) => {
                    self.relations.insert(RelationIr::new(&id, to, RelationKind::Realization));
                }
                None => {
                    tracing::debug!(from = %id, "dropping realization edge to unresolvable interface");
                }
            }
        }

        for nested in &t.nested {
            self.process_type(nested);
        }
    }

    fn finish(self, name: &str) -> ProjectIr {
        ProjectIr::new(
            name,
            self.types.into_values().collect(),
            self.relations.into_iter().collect(),
        )
    }
}

/// Provider identifier, or `namespace.name` when there is none.
fn type_id(t: &TypeSymbol) -> String {
    match &t.doc_id {
        Some(id) => id.clone(),
        None if t.namespace.is_empty() => t.name.clone(),
        None => format!("{}.{}", t.namespace, t.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeKind;
    use crate::provider::{Compilation, TypeRef};

    fn unit(global: NamespaceSymbol) -> BuildUnit {
        BuildUnit::compiled("Test", "Test.symbols.json", Compilation { global })
    }

    fn namespace(path: &str, types: Vec<TypeSymbol>) -> NamespaceSymbol {
        let mut global = NamespaceSymbol::default();
        global.descend_mut(path).types = types;
        global
    }

    fn class(name: &str) -> TypeSymbol {
        TypeSymbol::new(name, "App", TypeKind::Class).with_doc_id(format!("T:App.{}", name))
    }

    #[test]
    fn test_access_floor_parse() {
        assert_eq!(AccessFloor::parse("Internal"), AccessFloor::INTERNAL);
        assert_eq!(AccessFloor::parse("private"), AccessFloor::PRIVATE);
        assert_eq!(AccessFloor::parse("protected"), AccessFloor::PROTECTED);
        assert_eq!(AccessFloor::parse("everything"), AccessFloor::PUBLIC);
        assert_eq!(AccessFloor::parse(""), AccessFloor::PUBLIC);
    }

    #[test]
    fn test_internal_floor_keeps_public_and_internal_at_any_depth() {
        let outer = class("Outer")
            .with_nested(
                class("PubInner").with_nested(
                    class("DeepInternal")
                        .with_accessibility(Accessibility::Internal)
                        .with_nested(class("DeepProtected").with_accessibility(Accessibility::Protected)),
                ),
            )
            .with_nested(class("PrivInner").with_accessibility(Accessibility::Private))
            .with_nested(class("ProtInternal").with_accessibility(Accessibility::ProtectedInternal));
        let global = namespace("App", vec![outer, class("Hidden").with_accessibility(Accessibility::Protected)]);

        let project = build_project(&unit(global), AccessFloor::parse("internal")).unwrap();
        let names: Vec<_> = project.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Outer", "PubInner", "DeepInternal", "ProtInternal"]);
    }

    #[test]
    fn test_nested_of_filtered_type_is_skipped() {
        let outer = class("Outer")
            .with_accessibility(Accessibility::Internal)
            .with_nested(class("Inner"));
        let project = build_project(&unit(namespace("App", vec![outer])), AccessFloor::PUBLIC).unwrap();
        assert!(project.types.is_empty());
    }

    #[test]
    fn test_metadata_only_types_are_skipped() {
        let mut external = class("External");
        external.in_source = false;
        let project = build_project(&unit(namespace("App", vec![external, class("Local")])), AccessFloor::PUBLIC).unwrap();
        assert_eq!(project.types.len(), 1);
        assert_eq!(project.types[0].name, "Local");
    }

    #[test]
    fn test_root_base_produces_no_inheritance() {
        let t = class("Plain").with_base(TypeRef::root("T:System.Object"));
        let project = build_project(&unit(namespace("App", vec![t])), AccessFloor::PUBLIC).unwrap();
        assert!(project.relations.is_empty());
    }

    #[test]
    fn test_unresolvable_targets_are_dropped() {
        let t = class("Broken")
            .with_base(TypeRef::unresolved())
            .with_interface(TypeRef::unresolved())
            .with_interface(TypeRef::to("T:App.IOk"));
        let project = build_project(&unit(namespace("App", vec![t])), AccessFloor::PUBLIC).unwrap();
        assert_eq!(project.relations, vec![RelationIr::new("T:App.Broken", "T:App.IOk", RelationKind::Realization)]);
    }

    #[test]
    fn test_relations_deduplicated_and_sorted() {
        let t = class("Svc")
            .with_base(TypeRef::to("T:App.BaseSvc"))
            .with_interface(TypeRef::to("T:App.IDerived"))
            .with_interface(TypeRef::to("T:App.IBase"))
            .with_interface(TypeRef::to("T:App.IBase"));
        let project = build_project(&unit(namespace("App", vec![t])), AccessFloor::PUBLIC).unwrap();
        assert_eq!(
            project.relations,
            vec![
                RelationIr::new("T:App.Svc", "T:App.BaseSvc", RelationKind::Inheritance),
                RelationIr::new("T:App.Svc", "T:App.IBase", RelationKind::Realization),
                RelationIr::new("T:App.Svc", "T:App.IDerived", RelationKind::Realization),
            ]
        );
    }

    #[test]
    fn test_repeated_declarations_collapse_with_or_merge() {
        let mut sealed_part = class("Part");
        sealed_part.is_sealed = true;
        let global = namespace("App", vec![class("Part"), sealed_part, class("Other")]);

        let project = build_project(&unit(global), AccessFloor::PUBLIC).unwrap();
        assert_eq!(project.types.len(), 2);
        assert_eq!(project.types[0].name, "Part");
        assert!(project.types[0].is_sealed);
    }

    #[test]
    fn test_missing_doc_id_is_synthesized() {
        let global = {
            let mut g = namespace("App.Core", vec![TypeSymbol::new("Order", "App.Core", TypeKind::Class)]);
            g.types.push(TypeSymbol::new("Program", "", TypeKind::Class));
            g
        };
        let project = build_project(&unit(global), AccessFloor::PUBLIC).unwrap();
        let ids: Vec<_> = project.types.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["Program", "App.Core.Order"]);
    }

    #[test]
    fn test_unit_without_compilation_aborts_solution() {
        let good = unit(namespace("App", vec![class("A")]));
        let bad = BuildUnit::failed("Broken", "Broken.symbols.json", "malformed symbol dump");
        let err = build_solution(&[good, bad], AccessFloor::PUBLIC).unwrap_err();
        match err {
            Error::Extraction { unit, reason } => {
                assert_eq!(unit, "Broken");
                assert!(reason.contains("malformed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_solution_preserves_unit_order() {
        let a = BuildUnit::compiled("Zeta", "z", Compilation::default());
        let b = BuildUnit::compiled("Alpha", "a", Compilation::default());
        let solution = build_solution(&[a, b], AccessFloor::PUBLIC).unwrap();
        let names: Vec<_> = solution.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Zeta", "Alpha"]);
    }
}
