//! Identifier extraction (Section 4.4): walks the shared parsed tree once,
//! producing the file-local identifier map and reference list consumed by
//! both the dataset-wide [`super::store::IdentifierStore`] and the XPath
//! evaluation context.

use xot::{Value, Xot};

use crate::model::IdVersion;

/// Reference-typed element names whose trimmed text content is itself an
/// identifier reference, independent of any `@ref` attribute.
const REFERENCE_ELEMENT_NAMES: &[&str] = &[
    "LineRef",
    "RouteRef",
    "JourneyPatternRef",
    "ServiceJourneyRef",
    "OperatorRef",
    "AuthorityRef",
    "NetworkRef",
    "ScheduledStopPointRef",
    "StopPlaceRef",
];

#[derive(Debug, Clone, Default)]
pub struct ExtractedIdentifiers {
    pub definitions: Vec<IdVersion>,
    pub references: Vec<IdVersion>,
}

/// Walks every element in document order starting from `root`, collecting
/// `@id` definitions and `@ref`/text-content references for `file_name`.
pub fn extract_identifiers(xot: &Xot, root: xot::Node, file_name: &str) -> ExtractedIdentifiers {
    let mut result = ExtractedIdentifiers::default();
    walk(xot, root, file_name, &mut result);
    result
}

fn walk(xot: &Xot, node: xot::Node, file_name: &str, out: &mut ExtractedIdentifiers) {
    if let Value::Element(element) = xot.value(node) {
        let local_name = xot.local_name_str(element.name()).to_string();

        let mut id_attr = None;
        let mut ref_attr = None;
        let mut version_attr = String::new();
        for (name_id, value) in xot.attributes(node).iter() {
            match xot.local_name_str(name_id) {
                "id" => id_attr = Some(value.to_string()),
                "ref" => ref_attr = Some(value.to_string()),
                "version" => version_attr = value.to_string(),
                _ => {}
            }
        }

        if let Some(id) = id_attr {
            out.definitions
                .push(IdVersion::new(id, version_attr.clone(), file_name));
        }
        if let Some(reference) = ref_attr {
            out.references
                .push(IdVersion::new(reference, version_attr, file_name));
        } else if REFERENCE_ELEMENT_NAMES.contains(&local_name.as_str()) {
            let text = xot.string_value(node);
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.references
                    .push(IdVersion::new(trimmed.to_string(), "", file_name));
            }
        }
    }

    for child in xot.children(node) {
        walk(xot, child, file_name, out);
    }
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
    fn test_extracts_id_definitions() {
        let (xot, root) = parse(r#"<Line id="FLB:Line:1" version="1"><Name>A</Name></Line>"#);
        let extracted = extract_identifiers(&xot, root, "f.xml");
        assert_eq!(extracted.definitions.len(), 1);
        assert_eq!(extracted.definitions[0].id, "FLB:Line:1");
        assert_eq!(extracted.definitions[0].version, "1");
    }

    #[test]
    fn test_extracts_ref_attribute_references() {
        let xml = r#"<Route><LineRef ref="FLB:Line:1" version="1"/></Route>"#;
        let (xot, root) = parse(xml);
        let extracted = extract_identifiers(&xot, root, "f.xml");
        assert_eq!(extracted.references.len(), 1);
        assert_eq!(extracted.references[0].id, "FLB:Line:1");
    }

    #[test]
    fn test_extracts_reference_element_text_content() {
        let xml = r#"<Route><LineRef>FLB:Line:1</LineRef></Route>"#;
        let (xot, root) = parse(xml);
        let extracted = extract_identifiers(&xot, root, "f.xml");
        assert_eq!(extracted.references.len(), 1);
        assert_eq!(extracted.references[0].id, "FLB:Line:1");
    }

    #[test]
    fn test_blank_reference_text_is_ignored() {
        let xml = r#"<Route><LineRef>   </LineRef></Route>"#;
        let (xot, root) = parse(xml);
        let extracted = extract_identifiers(&xot, root, "f.xml");
        assert!(extracted.references.is_empty());
    }

    #[test]
    fn test_preserves_insertion_order() {
        let xml = r#"<Frame>
            <Line id="A"/>
            <Line id="B"/>
            <Line id="C"/>
        </Frame>"#;
        let (xot, root) = parse(xml);
        let extracted = extract_identifiers(&xot, root, "f.xml");
        let ids: Vec<_> = extracted.definitions.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }
}
