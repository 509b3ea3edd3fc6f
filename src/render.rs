//! Mermaid class diagram renderer
//!
//! Pure function from a `SolutionIr` to diagram text. Output is canonical:
//! namespaces and type names are sorted by ordinal comparison, relations by
//! source identifier, and lines always end in `\n`, so the same IR renders
//! to the same bytes on every platform.

use crate::model::{RelationKind, SolutionIr, TypeIr, TypeKind};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// First line of every rendered diagram
pub const HEADER: &str = "classDiagram";

/// Group name used for types in the global namespace
pub const GLOBAL_NAMESPACE: &str = "Global";

/// Layout direction directive.
///
/// Unrecognized values are kept verbatim; checking them is the diagram
/// consumer's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Direction {
    LeftRight,
    TopBottom,
    BottomTop,
    RightLeft,
    Other(String),
}

impl Direction {
    /// Parse a direction; blank input means "no directive".
    pub fn parse(s: &str) -> Option<Direction> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.to_uppercase().as_str() {
            "LR" => Direction::LeftRight,
            "TB" => Direction::TopBottom,
            "BT" => Direction::BottomTop,
            "RL" => Direction::RightLeft,
            _ => Direction::Other(trimmed.to_string()),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Direction::LeftRight => "LR",
            Direction::TopBottom => "TB",
            Direction::BottomTop => "BT",
            Direction::RightLeft => "RL",
            Direction::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two edge tokens of the diagram grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeGlyph {
    Inheritance,
    Realization,
}

impl EdgeGlyph {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeGlyph::Inheritance => "<|--",
            EdgeGlyph::Realization => "..|>",
        }
    }
}

impl From<RelationKind> for EdgeGlyph {
    fn from(kind: RelationKind) -> Self {
        match kind {
            RelationKind::Inheritance => EdgeGlyph::Inheritance,
            RelationKind::Realization => EdgeGlyph::Realization,
        }
    }
}

/// Stereotype annotation for a type, if any.
///
/// Kind-specific stereotypes win; plain classes fall back to their
/// modifiers (static, then abstract, then sealed).
pub fn stereotype(t: &TypeIr) -> Option<&'static str> {
    match t.kind {
        TypeKind::Interface => Some("Interface"),
        TypeKind::Struct => Some("struct"),
        TypeKind::Enum => Some("Enumeration"),
        TypeKind::Delegate => Some("delegate"),
        TypeKind::RecordClass => Some("record"),
        TypeKind::RecordStruct => Some("record,struct"),
        TypeKind::Class if t.is_static => Some("static"),
        TypeKind::Class if t.is_abstract => Some("Abstract"),
        TypeKind::Class if t.is_sealed => Some("sealed"),
        TypeKind::Class => None,
    }
}

/// Strip the quoting character and map `:` to the scope separator.
pub fn escape(s: &str) -> String {
    s.replace('`', "").replace(':', "::")
}

/// Best-effort label for a type outside the extracted set: the part of
/// the identifier after its last `:`, with `.` turned into `::`.
pub fn external_label(id: &str) -> String {
    let tail = id.rsplit_once(':').map_or(id, |(_, tail)| tail);
    escape(&tail.replace('.', ":"))
}

fn display_namespace(namespace: &str) -> String {
    if namespace.trim().is_empty() {
        GLOBAL_NAMESPACE.to_string()
    } else {
        escape(namespace)
    }
}

fn qualified(t: &TypeIr) -> String {
    format!("{}::{}", display_namespace(&t.namespace), t.name)
}

/// Render a solution as a Mermaid `classDiagram`.
pub fn render(solution: &SolutionIr, direction: Option<&Direction>) -> String {
    let mut lines = vec![HEADER.to_string()];
    if let Some(direction) = direction {
        lines.push(format!("direction {}", direction));
    }

    // First declaration of an identifier wins across projects
    let mut seen = HashSet::new();
    let mut by_id: HashMap<&str, &TypeIr> = HashMap::new();
    let mut groups: BTreeMap<&str, Vec<&TypeIr>> = BTreeMap::new();
    for t in solution.all_types() {
        if seen.insert(t.id.as_str()) {
            by_id.insert(t.id.as_str(), t);
            groups.entry(t.namespace.as_str()).or_default().push(t);
        }
    }

    for (namespace, mut types) in groups {
        types.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        lines.push(format!("namespace {} {{", display_namespace(namespace)));
        for t in types {
            match stereotype(t) {
                Some(tag) => lines.push(format!("  class {} <<{}>>", qualified(t), tag)),
                None => lines.push(format!("  class {}", qualified(t))),
            }
        }
        lines.push("}".to_string());
    }

    for project in &solution.projects {
        let mut relations: Vec<_> = project.relations.iter().collect();
        relations.sort_by(|a, b| a.from.cmp(&b.from));
        for r in relations {
            let Some(from) = by_id.get(r.from.as_str()) else {
                continue;
            };
            let to = match by_id.get(r.to.as_str()) {
                Some(to) => qualified(to),
                None => external_label(&r.to),
            };
            lines.push(format!("{} {} {}", qualified(from), EdgeGlyph::from(r.kind).as_str(), to));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProjectIr, RelationIr};

    fn shop() -> SolutionIr {
        let types = vec![
            TypeIr::new("T:Shop.Core.Order", "Order", "Shop.Core", TypeKind::Class).with_modifiers(false, true, false),
            TypeIr::new("T:Shop.Core.IEntity", "IEntity", "Shop.Core", TypeKind::Interface),
            TypeIr::new("T:Shop.Core.Entity", "Entity", "Shop.Core", TypeKind::Class).with_modifiers(true, false, false),
            TypeIr::new("T:Program", "Program", "", TypeKind::Class).with_modifiers(true, true, true),
            TypeIr::new("T:Shop.Core.Money", "Money", "Shop.Core", TypeKind::RecordStruct),
        ];
        let relations = vec![
            RelationIr::new("T:Shop.Core.Entity", "T:Shop.Core.IEntity", RelationKind::Realization),
            RelationIr::new("T:Shop.Core.Order", "T:Shop.Core.Entity", RelationKind::Inheritance),
            RelationIr::new("T:Shop.Core.Order", "T:Shop.Core.IEntity", RelationKind::Realization),
            RelationIr::new("T:Shop.Core.Order", "T:System.IDisposable", RelationKind::Realization),
        ];
        SolutionIr::new(vec![ProjectIr::new("Shop.Core", types, relations)])
    }

    #[test]
    fn test_render_shop_diagram() {
        let expected = "\
classDiagram
direction LR
namespace Global {
  class Global::Program <<static>>
}
namespace Shop.Core {
  class Shop.Core::Entity <<Abstract>>
  class Shop.Core::IEntity <<Interface>>
  class Shop.Core::Money <<record,struct>>
  class Shop.Core::Order <<sealed>>
}
Shop.Core::Entity ..|> Shop.Core::IEntity
Shop.Core::Order <|-- Shop.Core::Entity
Shop.Core::Order ..|> Shop.Core::IEntity
Shop.Core::Order ..|> System::IDisposable
";
        assert_eq!(render(&shop(), Direction::parse("LR").as_ref()), expected);
    }

    #[test]
    fn test_render_is_deterministic() {
        let solution = shop();
        let first = render(&solution, Some(&Direction::TopBottom));
        let second = render(&solution, Some(&Direction::TopBottom));
        assert_eq!(first.as_bytes(), second.as_bytes());

        let mut shuffled = solution.clone();
        shuffled.projects[0].types.reverse();
        assert_eq!(render(&shuffled, Some(&Direction::TopBottom)), first);
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!(Direction::parse("tb"), Some(Direction::TopBottom));
        assert_eq!(Direction::parse("  "), None);
        assert_eq!(Direction::parse("diagonal"), Some(Direction::Other("diagonal".into())));

        let text = render(&SolutionIr::default(), Direction::parse("diagonal").as_ref());
        assert_eq!(text, "classDiagram\ndirection diagonal\n");
        assert_eq!(render(&SolutionIr::default(), None), "classDiagram\n");
    }

    #[test]
    fn test_stereotype_mapping() {
        let t = |kind| TypeIr::new("T:X", "X", "", kind);
        assert_eq!(stereotype(&t(TypeKind::Interface)), Some("Interface"));
        assert_eq!(stereotype(&t(TypeKind::Struct)), Some("struct"));
        assert_eq!(stereotype(&t(TypeKind::Enum)), Some("Enumeration"));
        assert_eq!(stereotype(&t(TypeKind::Delegate)), Some("delegate"));
        assert_eq!(stereotype(&t(TypeKind::RecordClass)), Some("record"));
        assert_eq!(stereotype(&t(TypeKind::RecordStruct).with_modifiers(false, true, false)), Some("record,struct"));
        assert_eq!(stereotype(&t(TypeKind::Class)), None);
        assert_eq!(stereotype(&t(TypeKind::Class).with_modifiers(true, true, false)), Some("Abstract"));
        assert_eq!(stereotype(&t(TypeKind::Class).with_modifiers(false, true, false)), Some("sealed"));
    }

    #[test]
    fn test_unknown_target_uses_external_label() {
        assert_eq!(
            external_label("T:System.Collections.Generic.IEnumerable`1"),
            "System::Collections::Generic::IEnumerable1"
        );
        assert_eq!(external_label("Loose.Name"), "Loose::Name");
        assert!(shop_text().contains("Shop.Core::Order ..|> System::IDisposable\n"));
    }

    fn shop_text() -> String {
        render(&shop(), None)
    }

    #[test]
    fn test_edge_from_unknown_type_is_skipped() {
        let mut solution = shop();
        solution.projects[0]
            .relations
            .push(RelationIr::new("T:Gone", "T:Shop.Core.IEntity", RelationKind::Realization));
        assert!(!render(&solution, None).contains("Gone"));
    }

    #[test]
    fn test_namespaces_sorted_ordinally_and_flattened_across_projects() {
        let a = ProjectIr::new("A", vec![TypeIr::new("T:alpha.X", "X", "alpha", TypeKind::Class)], vec![]);
        let b = ProjectIr::new(
            "B",
            vec![
                TypeIr::new("T:Zeta.b", "b", "Zeta", TypeKind::Class),
                TypeIr::new("T:Zeta.C", "C", "Zeta", TypeKind::Class),
            ],
            vec![RelationIr::new("T:Zeta.b", "T:alpha.X", RelationKind::Inheritance)],
        );
        let text = render(&SolutionIr::new(vec![a, b]), None);
        let zeta = text.find("namespace Zeta").unwrap();
        let alpha = text.find("namespace alpha").unwrap();
        assert!(zeta < alpha);
        assert!(text.find("Zeta::C").unwrap() < text.find("  class Zeta::b").unwrap());
        assert!(text.ends_with("Zeta::b <|-- alpha::X\n"));
    }

    #[test]
    fn test_empty_and_literal_global_namespaces_stay_separate() {
        let types = vec![
            TypeIr::new("T:Global.Named", "Named", "Global", TypeKind::Class),
            TypeIr::new("T:Loose", "Loose", "", TypeKind::Class),
        ];
        let text = render(&SolutionIr::new(vec![ProjectIr::new("P", types, vec![])]), None);
        assert_eq!(
            text,
            "classDiagram\n\
             namespace Global {\n  class Global::Loose\n}\n\
             namespace Global {\n  class Global::Named\n}\n"
        );
    }

    #[test]
    fn test_escape_namespace() {
        assert_eq!(escape("Odd`Name:Space"), "OddName::Space");
    }
}
