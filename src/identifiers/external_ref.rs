//! The external-reference validator plug-point (Section 4.3 / 9): a pure
//! function deciding which otherwise-unresolved references are accepted
//! because they point outside this dataset (into a national stop registry,
//! for instance).

use std::collections::HashSet;

/// `validate(refs) -> accepted_refs`. Implementations must be pure: no
/// shared mutable state, no I/O.
pub trait ExternalReferenceValidator: Send + Sync {
    fn validate(&self, refs: &[String]) -> HashSet<String>;
}

/// The conservative default: accepts the `{NSR:, RUT:, ENT:, FR:}` prefix
/// set from the design.
#[derive(Debug, Clone, Default)]
pub struct DefaultExternalReferenceValidator;

impl ExternalReferenceValidator for DefaultExternalReferenceValidator {
    fn validate(&self, refs: &[String]) -> HashSet<String> {
        accept_by_prefix(refs, &["NSR:", "RUT:", "ENT:", "FR:"])
    }
}

/// French variant: additionally accepts `{FR:, MOBIITI:, BISCARROSSE:, GTFS:}`.
#[derive(Debug, Clone, Default)]
pub struct FrenchExternalReferenceValidator;

impl ExternalReferenceValidator for FrenchExternalReferenceValidator {
    fn validate(&self, refs: &[String]) -> HashSet<String> {
        accept_by_prefix(
            refs,
            &["NSR:", "RUT:", "ENT:", "FR:", "MOBIITI:", "BISCARROSSE:", "GTFS:"],
        )
    }
}

fn accept_by_prefix(refs: &[String], prefixes: &[&str]) -> HashSet<String> {
    refs.iter()
        .filter(|r| prefixes.iter().any(|p| r.starts_with(p)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_accepts_known_prefixes() {
        let validator = DefaultExternalReferenceValidator;
        let refs = vec![
            "NSR:Quay:123".to_string(),
            "RUT:Line:1".to_string(),
            "UNKNOWN:Thing:1".to_string(),
        ];
        let accepted = validator.validate(&refs);
        assert!(accepted.contains("NSR:Quay:123"));
        assert!(accepted.contains("RUT:Line:1"));
        assert!(!accepted.contains("UNKNOWN:Thing:1"));
    }

    #[test]
    fn test_french_variant_accepts_additional_prefixes() {
        let validator = FrenchExternalReferenceValidator;
        let refs = vec!["MOBIITI:Stop:1".to_string(), "GTFS:Trip:9".to_string()];
        let accepted = validator.validate(&refs);
        assert_eq!(accepted.len(), 2);
    }
}
