//! Object-model indexing and cross-entity validators (Section 4.5).
//!
//! Builds typed id-keyed maps over a single parsed document, supporting both
//! the inline-`DataObjects` layout and the nested `CompositeFrame/frames/*`
//! layout, then runs validators over those maps. Grounded on the pack's
//! rule-violation shape (`RuleViolation`: category/severity/location fields)
//! from the hybrid rule engine reference, adapted to this engine's
//! `ValidationIssue`/`ValidationRule` types.

pub mod validators;

use std::collections::HashMap;

use xot::{Value, Xot};

use crate::model::{DataLocation, Severity, ValidationIssue};

/// One indexed NetEX element: its node, `@id` (if any), and attribute map
/// kept small and ad hoc rather than a full typed struct per element kind,
/// since validators only ever read a handful of children/attributes.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub node: xot::Node,
}

/// Typed maps over a single parsed document, keyed by element local name
/// then by `@id`. Built once per file and handed to every object validator.
#[derive(Debug, Default)]
pub struct ObjectContext {
    by_kind: HashMap<&'static str, HashMap<String, Entry>>,
    has_resource_frame: bool,
    collisions: Vec<(String, &'static str)>,
}

/// Element kinds the context indexes. Anything with `@id` matching one of
/// these local names is registered; everything else is ignored.
const INDEXED_KINDS: &[&str] = &[
    "Line",
    "FlexibleLine",
    "Route",
    "JourneyPattern",
    "ServiceJourney",
    "DatedServiceJourney",
    "Operator",
    "Authority",
    "Network",
    "StopPlace",
    "ScheduledStopPoint",
    "DayType",
    "OperatingDay",
];

impl ObjectContext {
    /// Walks `root` once, indexing every element whose local name is in
    /// [`INDEXED_KINDS`] and detecting the presence of a `ResourceFrame`,
    /// regardless of whether frames are inline or nested under
    /// `CompositeFrame/frames`.
    pub fn build(xot: &Xot, root: xot::Node) -> Self {
        let mut ctx = ObjectContext::default();
        ctx.walk(xot, root);
        ctx
    }

    fn walk(&mut self, xot: &Xot, node: xot::Node) {
        if let Value::Element(element) = xot.value(node) {
            let local_name = xot.local_name_str(element.name());
            if local_name == "ResourceFrame" {
                self.has_resource_frame = true;
            }
            if let Some(kind) = INDEXED_KINDS.iter().find(|k| **k == local_name) {
                if let Some(id) = attr(xot, node, "id") {
                    let bucket = self.by_kind.entry(kind).or_default();
                    if bucket.contains_key(&id) {
                        self.collisions.push((id.clone(), kind));
                    } else {
                        bucket.insert(id, Entry { node });
                    }
                }
            }
        }
        for child in xot.children(node) {
            self.walk(xot, child);
        }
    }

    pub fn get(&self, kind: &str, id: &str) -> Option<Entry> {
        self.by_kind.get(kind).and_then(|m| m.get(id)).copied()
    }

    pub fn all(&self, kind: &str) -> impl Iterator<Item = (&String, &Entry)> {
        self.by_kind
            .get(kind)
            .into_iter()
            .flat_map(|m| m.iter())
    }

    pub fn has_resource_frame(&self) -> bool {
        self.has_resource_frame
    }

    /// Same id, same kind, indexed more than once within this document.
    /// Never silently picks one: surfaced as a `FRAME_COLLISION` warning by
    /// the caller, since the object model can't tell which definition is
    /// authoritative.
    pub fn frame_collisions(&self, file_name: &str) -> Vec<ValidationIssue> {
        self.collisions
            .iter()
            .map(|(id, kind)| {
                ValidationIssue::new(
                    "FRAME_COLLISION",
                    Severity::Warning,
                    DataLocation::new(file_name.to_string()).with_element_id(id.clone()),
                    format!("'{id}' ({kind}) is defined more than once in this document"),
                )
            })
            .collect()
    }
}

pub(crate) fn attr(xot: &Xot, node: xot::Node, name: &str) -> Option<String> {
    if !matches!(xot.value(node), Value::Element(_)) {
        return None;
    }
    xot.attributes(node)
        .iter()
        .find(|(name_id, _)| xot.local_name_str(*name_id) == name)
        .map(|(_, value)| value.to_string())
}

/// The trimmed text of the first direct child named `name`, if any.
pub(crate) fn child_text(xot: &Xot, node: xot::Node, name: &str) -> Option<String> {
    xot.children(node).find_map(|child| {
        if let Value::Element(element) = xot.value(child) {
            if xot.local_name_str(element.name()) == name {
                let text = xot.string_value(child);
                let trimmed = text.trim();
                return Some(trimmed.to_string());
            }
        }
        None
    })
}

/// All direct children named `name`.
pub(crate) fn children_named<'a>(
    xot: &'a Xot,
    node: xot::Node,
    name: &'a str,
) -> impl Iterator<Item = xot::Node> + 'a {
    xot.children(node).filter(move |child| {
        matches!(xot.value(*child), Value::Element(element) if xot.local_name_str(element.name()) == name)
    })
}

/// The `ref` attribute of the first direct child named `name`, if any.
pub(crate) fn child_ref(xot: &Xot, node: xot::Node, name: &str) -> Option<String> {
    xot.children(node).find_map(|child| {
        if let Value::Element(element) = xot.value(child) {
            if xot.local_name_str(element.name()) == name {
                return attr(xot, child, "ref");
            }
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> (Xot, xot::Node) {
        let mut xot = Xot::new();
        let root = xot.parse(xml).expect("xml must parse");
        (xot, root)
    }

    #[test]
    fn test_indexes_inline_line() {
        let (xot, root) = parse(r#"<Frame><Line id="L1"><Name>A</Name></Line></Frame>"#);
        let ctx = ObjectContext::build(&xot, root);
        assert!(ctx.get("Line", "L1").is_some());
    }

    #[test]
    fn test_indexes_nested_composite_frame() {
        let xml = r#"<CompositeFrame><frames><ServiceFrame><lines>
            <Line id="L1"><Name>A</Name></Line>
        </lines></ServiceFrame></frames></CompositeFrame>"#;
        let (xot, root) = parse(xml);
        let ctx = ObjectContext::build(&xot, root);
        assert!(ctx.get("Line", "L1").is_some());
    }

    #[test]
    fn test_detects_resource_frame_presence() {
        let xml = r#"<CompositeFrame><frames><ResourceFrame/></frames></CompositeFrame>"#;
        let (xot, root) = parse(xml);
        let ctx = ObjectContext::build(&xot, root);
        assert!(ctx.has_resource_frame());
    }

    #[test]
    fn test_detects_duplicate_id_within_document() {
        let xml = r#"<Frame><Line id="L1"/><Line id="L1"/></Frame>"#;
        let (xot, root) = parse(xml);
        let ctx = ObjectContext::build(&xot, root);
        let collisions = ctx.frame_collisions("f.xml");
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].rule_code, "FRAME_COLLISION");
    }
}
