//! The default built-in rule catalogue (Section 2, ambient stack): the
//! small set of NetEX rules named in Section 4.5/4.5.1 and exercised by the
//! scenarios in Section 8, shipped so the engine is exercisable without an
//! external rule-catalogue builder. Rule-catalogue construction from YAML
//! remains an out-of-core collaborator (Section 1); this is only the
//! built-in default passed to `Validator::new` when no catalogue override is
//! supplied.
//!
//! Entries with `expression: None` are implemented directly against the
//! parsed tree by [`crate::object_model::validators`] rather than compiled
//! as XPath, since they need typed cross-references the XPath evaluator
//! doesn't build. They're still listed here so their severity can be looked
//! up and overridden through [`crate::options::Options::effective_severity`].

use crate::model::{Severity, ValidationRule};

pub fn default_rule_catalogue() -> Vec<ValidationRule> {
    vec![
        ValidationRule::new("LINE_2", "Line missing name", "a Line or FlexibleLine must have a non-empty Name", Severity::Error),
        ValidationRule::new("LINE_4", "Line missing transport mode", "a Line or FlexibleLine should declare a TransportMode", Severity::Warning),
        ValidationRule::new(
            "LINE_INVALID_TRANSPORT_MODE",
            "invalid transport mode",
            "TransportMode must be one of the accepted NetEX values",
            Severity::Error,
        ),
        ValidationRule::new("NET_OBJ_1", "unresolved route/journey-pattern topology", "Route.LineRef and JourneyPattern.RouteRef must resolve", Severity::Error),
        ValidationRule::new("NET_OBJ_2", "unresolved line operator", "Line.OperatorRef must resolve", Severity::Error),
        ValidationRule::new("NET_OBJ_5", "service journey without resolvable operator", "a ServiceJourney needs a resolvable operator when no ResourceFrame is present", Severity::Warning),
        ValidationRule::new("NET_OBJ_6", "unresolved dated service journey references", "DatedServiceJourney.ServiceJourneyRef and OperatingDayRef must resolve", Severity::Error),
        ValidationRule::new("SJ_OBJ_1", "passing time / stop point mismatch", "passing times must align 1:1 with the journey pattern's stop points", Severity::Error),
        ValidationRule::new("SJ_OBJ_2", "passing times not monotone", "passing times must be strictly increasing and consistent within a stop", Severity::Error),
        ValidationRule::new("SJ_OBJ_3", "transport mode mismatch", "ServiceJourney.TransportMode must match its Line's TransportMode when both are set", Severity::Error),
        ValidationRule::new("SJ_OBJ_4", "unresolved service journey operator", "a ServiceJourney needs a resolvable operator, directly or via its Line", Severity::Error),
        ValidationRule::new("SJ_OBJ_5", "unresolved or missing day type", "a ServiceJourney needs DayTypeRef(s) or a referencing DatedServiceJourney, and every DayTypeRef must resolve", Severity::Error),
        ValidationRule::new("SJ_OBJ_6", "implausible service journey timing", "total duration or per-stop dwell time is implausible", Severity::Warning),
        ValidationRule::xpath(
            "STOP_PLACE_NO_NAME",
            "stop place missing name",
            "a StopPlace should have a non-empty Name",
            Severity::Warning,
            "//StopPlace[not(Name/text()[normalize-space()])]",
        ),
    ]
}
