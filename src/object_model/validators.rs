//! Cross-entity object validators (Section 4.5 / 4.5.1). Each function reads
//! an [`ObjectContext`] and returns issues; none of them mutate the context.

use xot::Xot;

use super::{attr, child_ref, child_text, children_named, ObjectContext};
use crate::model::{DataLocation, Severity, ValidationIssue};

const ACCEPTED_TRANSPORT_MODES: &[&str] = &[
    "air",
    "bus",
    "cableway",
    "coach",
    "ferry",
    "metro",
    "rail",
    "taxi",
    "tram",
    "water",
    "funicular",
    "trolleyBus",
    "unknown",
];

fn issue(code: &str, severity: Severity, file_name: &str, id: Option<&str>, message: String) -> ValidationIssue {
    let mut location = DataLocation::new(file_name.to_string());
    if let Some(id) = id {
        location = location.with_element_id(id.to_string());
    }
    ValidationIssue::new(code, severity, location, message)
}

/// Parses a NetEX `HH:MM:SS` time into seconds-since-midnight, accepting the
/// extended-hour convention (`25:00:00` meaning 1am the following service
/// day) up to 47 hours. Returns `None` on any other malformed input; callers
/// must treat that as "skip this check", never as a validation failure.
pub fn parse_netex_time(value: &str) -> Option<u32> {
    let mut parts = value.trim().splitn(3, ':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    let seconds: u32 = parts.next()?.parse().ok()?;
    if hours > 47 || minutes > 59 || seconds > 59 {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// `NET_OBJ_1`, `NET_OBJ_2`, `NET_OBJ_5`, `NET_OBJ_6`.
pub fn validate_network_consistency(xot: &Xot, ctx: &ObjectContext, file_name: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (id, entry) in ctx.all("Route") {
        match child_ref(xot, entry.node, "LineRef") {
            Some(line_id) if ctx.get("Line", &line_id).is_some() || ctx.get("FlexibleLine", &line_id).is_some() => {}
            Some(line_id) => issues.push(issue(
                "NET_OBJ_1",
                Severity::Error,
                file_name,
                Some(id),
                format!("Route '{id}' references unresolved Line '{line_id}'"),
            )),
            None => issues.push(issue(
                "NET_OBJ_1",
                Severity::Error,
                file_name,
                Some(id),
                format!("Route '{id}' has no LineRef"),
            )),
        }
    }

    for (id, entry) in ctx.all("JourneyPattern") {
        match child_ref(xot, entry.node, "RouteRef") {
            Some(route_id) if ctx.get("Route", &route_id).is_some() => {}
            Some(route_id) => issues.push(issue(
                "NET_OBJ_1",
                Severity::Error,
                file_name,
                Some(id),
                format!("JourneyPattern '{id}' references unresolved Route '{route_id}'"),
            )),
            None => issues.push(issue(
                "NET_OBJ_1",
                Severity::Error,
                file_name,
                Some(id),
                format!("JourneyPattern '{id}' has no RouteRef"),
            )),
        }
    }

    for (id, entry) in ctx.all("Line") {
        if let Some(operator_id) = child_ref(xot, entry.node, "OperatorRef") {
            if ctx.get("Operator", &operator_id).is_none() {
                issues.push(issue(
                    "NET_OBJ_2",
                    Severity::Error,
                    file_name,
                    Some(id),
                    format!("Line '{id}' references unresolved Operator '{operator_id}'"),
                ));
            }
        }
    }

    for (id, entry) in ctx.all("DatedServiceJourney") {
        match child_ref(xot, entry.node, "ServiceJourneyRef") {
            Some(sj_id) if ctx.get("ServiceJourney", &sj_id).is_some() => {}
            other => issues.push(issue(
                "NET_OBJ_6",
                Severity::Error,
                file_name,
                Some(id),
                format!(
                    "DatedServiceJourney '{id}' has an unresolved ServiceJourneyRef {:?}",
                    other
                ),
            )),
        }
        match child_ref(xot, entry.node, "OperatingDayRef") {
            Some(od_id) if ctx.get("OperatingDay", &od_id).is_some() => {}
            other => issues.push(issue(
                "NET_OBJ_6",
                Severity::Error,
                file_name,
                Some(id),
                format!(
                    "DatedServiceJourney '{id}' has an unresolved OperatingDayRef {:?}",
                    other
                ),
            )),
        }
    }

    if !ctx.has_resource_frame() {
        for (id, _) in ctx.all("ServiceJourney") {
            if resolve_service_journey_operator(xot, ctx, id).is_none() {
                issues.push(issue(
                    "NET_OBJ_5",
                    Severity::Warning,
                    file_name,
                    Some(id),
                    format!(
                        "ServiceJourney '{id}' has no resolvable operator and no ResourceFrame is present"
                    ),
                ));
            }
        }
    }

    issues
}

fn resolve_service_journey_operator(xot: &Xot, ctx: &ObjectContext, sj_id: &str) -> Option<String> {
    let entry = ctx.get("ServiceJourney", sj_id)?;
    if let Some(operator_id) = child_ref(xot, entry.node, "OperatorRef") {
        return Some(operator_id);
    }
    let line_id = child_ref(xot, entry.node, "LineRef")?;
    let line = ctx.get("Line", &line_id).or_else(|| ctx.get("FlexibleLine", &line_id))?;
    child_ref(xot, line.node, "OperatorRef")
}

/// `SJ_OBJ_1` through `SJ_OBJ_6`.
pub fn validate_service_journeys(xot: &Xot, ctx: &ObjectContext, file_name: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (id, entry) in ctx.all("ServiceJourney") {
        let node = entry.node;

        let passing_times: Vec<xot::Node> = children_named(xot, node, "passingTimes")
            .flat_map(|container| children_named(xot, container, "TimetabledPassingTime"))
            .collect();

        let journey_pattern = child_ref(xot, node, "JourneyPatternRef")
            .and_then(|jp_id| ctx.get("JourneyPattern", &jp_id));

        if let Some(jp) = journey_pattern {
            let stop_points: Vec<xot::Node> = children_named(xot, jp.node, "pointsInSequence")
                .flat_map(|container| children_named(xot, container, "StopPointInJourneyPattern"))
                .collect();

            if passing_times.len() != stop_points.len() {
                issues.push(issue(
                    "SJ_OBJ_1",
                    Severity::Error,
                    file_name,
                    Some(id),
                    format!(
                        "ServiceJourney '{id}' has {} passing times but its JourneyPattern has {} stop points",
                        passing_times.len(),
                        stop_points.len()
                    ),
                ));
            } else {
                for (i, (passing_time, stop_point)) in passing_times.iter().zip(stop_points.iter()).enumerate() {
                    let expected_id = attr(xot, *stop_point, "id");
                    let actual_ref = child_ref(xot, *passing_time, "StopPointInJourneyPatternRef");
                    if let (Some(expected), Some(actual)) = (expected_id, actual_ref) {
                        if expected != actual {
                            issues.push(issue(
                                "SJ_OBJ_1",
                                Severity::Error,
                                file_name,
                                Some(id),
                                format!(
                                    "ServiceJourney '{id}' passing time #{} references stop point '{actual}', expected '{expected}'",
                                    i + 1
                                ),
                            ));
                        }
                    }
                }
            }
        }

        issues.extend(validate_passing_time_monotonicity(xot, &passing_times, id, file_name));

        if let Some(sj_mode) = child_text(xot, node, "TransportMode") {
            if let Some(line_id) = child_ref(xot, node, "LineRef") {
                if let Some(line) = ctx.get("Line", &line_id).or_else(|| ctx.get("FlexibleLine", &line_id)) {
                    if let Some(line_mode) = child_text(xot, line.node, "TransportMode") {
                        if sj_mode != line_mode {
                            issues.push(issue(
                                "SJ_OBJ_3",
                                Severity::Error,
                                file_name,
                                Some(id),
                                format!(
                                    "ServiceJourney '{id}' TransportMode '{sj_mode}' differs from Line TransportMode '{line_mode}'"
                                ),
                            ));
                        }
                    }
                }
            }
        }

        if resolve_service_journey_operator(xot, ctx, id).is_none() {
            issues.push(issue(
                "SJ_OBJ_4",
                Severity::Error,
                file_name,
                Some(id),
                format!("ServiceJourney '{id}' has no resolvable operator"),
            ));
        }

        let day_type_refs: Vec<String> = children_named(xot, node, "dayTypes")
            .flat_map(|container| children_named(xot, container, "DayTypeRef"))
            .filter_map(|dtr| attr(xot, dtr, "ref"))
            .collect();
        let referenced_by_dated_sj = ctx
            .all("DatedServiceJourney")
            .any(|(_, dsj)| child_ref(xot, dsj.node, "ServiceJourneyRef").as_deref() == Some(id.as_str()));

        if day_type_refs.is_empty() && !referenced_by_dated_sj {
            issues.push(issue(
                "SJ_OBJ_5",
                Severity::Error,
                file_name,
                Some(id),
                format!("ServiceJourney '{id}' has no DayTypeRef and is not referenced by any DatedServiceJourney"),
            ));
        }
        for day_type_id in &day_type_refs {
            if ctx.get("DayType", day_type_id).is_none() {
                issues.push(issue(
                    "SJ_OBJ_5",
                    Severity::Error,
                    file_name,
                    Some(id),
                    format!("ServiceJourney '{id}' references unresolved DayType '{day_type_id}'"),
                ));
            }
        }

        issues.extend(validate_duration_and_dwell(xot, &passing_times, id, file_name));
    }

    issues
}

fn passing_time_bounds(xot: &Xot, passing_time: xot::Node) -> (Option<u32>, Option<u32>) {
    let arrival = child_text(xot, passing_time, "ArrivalTime").and_then(|t| parse_netex_time(&t));
    let departure = child_text(xot, passing_time, "DepartureTime").and_then(|t| parse_netex_time(&t));
    (arrival, departure)
}

fn validate_passing_time_monotonicity(
    xot: &Xot,
    passing_times: &[xot::Node],
    sj_id: &str,
    file_name: &str,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut previous: Option<u32> = None;

    for passing_time in passing_times {
        let (arrival, departure) = passing_time_bounds(xot, *passing_time);

        if let (Some(arrival), Some(departure)) = (arrival, departure) {
            if arrival > departure {
                issues.push(issue(
                    "SJ_OBJ_2",
                    Severity::Error,
                    file_name,
                    Some(sj_id),
                    format!("ServiceJourney '{sj_id}' has ArrivalTime after DepartureTime at a stop"),
                ));
            }
        }

        let effective = departure.or(arrival);
        if let (Some(prev), Some(current)) = (previous, effective) {
            if current <= prev {
                issues.push(issue(
                    "SJ_OBJ_2",
                    Severity::Error,
                    file_name,
                    Some(sj_id),
                    format!("ServiceJourney '{sj_id}' passing times are not strictly monotone"),
                ));
            }
        }
        if effective.is_some() {
            previous = effective;
        }
    }
    issues
}

fn validate_duration_and_dwell(
    xot: &Xot,
    passing_times: &[xot::Node],
    sj_id: &str,
    file_name: &str,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let bounds: Vec<(Option<u32>, Option<u32>)> = passing_times
        .iter()
        .map(|pt| passing_time_bounds(xot, *pt))
        .collect();

    let first = bounds.iter().find_map(|(a, d)| d.or(*a));
    let last = bounds.iter().rev().find_map(|(a, d)| d.or(*a));
    if let (Some(first), Some(last)) = (first, last) {
        let duration = last.saturating_sub(first);
        if duration > 12 * 3600 {
            issues.push(issue(
                "SJ_OBJ_6",
                Severity::Warning,
                file_name,
                Some(sj_id),
                format!("ServiceJourney '{sj_id}' total duration exceeds 12 hours"),
            ));
        } else if duration < 60 && passing_times.len() > 2 {
            issues.push(issue(
                "SJ_OBJ_6",
                Severity::Warning,
                file_name,
                Some(sj_id),
                format!("ServiceJourney '{sj_id}' total duration is under a minute across more than 2 stops"),
            ));
        }
    }

    for (arrival, departure) in &bounds {
        if let (Some(arrival), Some(departure)) = (arrival, departure) {
            let dwell = departure.saturating_sub(*arrival);
            if dwell > 30 * 60 {
                issues.push(issue(
                    "SJ_OBJ_6",
                    Severity::Warning,
                    file_name,
                    Some(sj_id),
                    format!("ServiceJourney '{sj_id}' has a stop dwell time over 30 minutes"),
                ));
            }
        }
    }
    issues
}

/// `LINE_2`, `LINE_4`, `LINE_INVALID_TRANSPORT_MODE`.
pub fn validate_lines(xot: &Xot, ctx: &ObjectContext, file_name: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let lines = ctx.all("Line").chain(ctx.all("FlexibleLine"));
    for (id, entry) in lines {
        match child_text(xot, entry.node, "Name") {
            Some(name) if !name.is_empty() => {}
            _ => issues.push(issue(
                "LINE_2",
                Severity::Error,
                file_name,
                Some(id),
                format!("Line '{id}' has no non-empty Name"),
            )),
        }

        match child_text(xot, entry.node, "TransportMode") {
            None => issues.push(issue(
                "LINE_4",
                Severity::Warning,
                file_name,
                Some(id),
                format!("Line '{id}' has no TransportMode"),
            )),
            Some(mode) if !ACCEPTED_TRANSPORT_MODES.contains(&mode.as_str()) => {
                issues.push(issue(
                    "LINE_INVALID_TRANSPORT_MODE",
                    Severity::Error,
                    file_name,
                    Some(id),
                    format!("Line '{id}' has invalid_mode='{mode}'"),
                ));
            }
            Some(_) => {}
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_model::ObjectContext;

    fn parse(xml: &str) -> (Xot, xot::Node) {
        let mut xot = Xot::new();
        let root = xot.parse(xml).expect("xml must parse");
        (xot, root)
    }

    #[test]
    fn test_parse_netex_time_accepts_extended_hours() {
        assert_eq!(parse_netex_time("25:00:00"), Some(25 * 3600));
        assert_eq!(parse_netex_time("47:59:59"), Some(47 * 3600 + 59 * 60 + 59));
        assert_eq!(parse_netex_time("48:00:00"), None);
        assert_eq!(parse_netex_time("garbage"), None);
    }

    #[test]
    fn test_line_2_flags_missing_name() {
        let xml = r#"<Frame><Line id="L1"><TransportMode>bus</TransportMode></Line></Frame>"#;
        let (xot, root) = parse(xml);
        let ctx = ObjectContext::build(&xot, root);
        let issues = validate_lines(&xot, &ctx, "f.xml");
        assert!(issues.iter().any(|i| i.rule_code == "LINE_2"));
    }

    #[test]
    fn test_line_4_flags_missing_transport_mode() {
        let xml = r#"<Frame><Line id="L1"><Name>A</Name></Line></Frame>"#;
        let (xot, root) = parse(xml);
        let ctx = ObjectContext::build(&xot, root);
        let issues = validate_lines(&xot, &ctx, "f.xml");
        assert!(issues.iter().any(|i| i.rule_code == "LINE_4"));
    }

    #[test]
    fn test_invalid_transport_mode_is_flagged() {
        let xml = r#"<Frame><Line id="L1"><Name>A</Name><TransportMode>spaceship</TransportMode></Line></Frame>"#;
        let (xot, root) = parse(xml);
        let ctx = ObjectContext::build(&xot, root);
        let issues = validate_lines(&xot, &ctx, "f.xml");
        assert!(issues.iter().any(|i| i.rule_code == "LINE_INVALID_TRANSPORT_MODE"));
        assert!(issues[0].message.contains("spaceship") || issues.iter().any(|i| i.message.contains("spaceship")));
    }

    #[test]
    fn test_valid_line_produces_no_issues() {
        let xml = r#"<Frame><Line id="L1"><Name>A</Name><TransportMode>bus</TransportMode></Line></Frame>"#;
        let (xot, root) = parse(xml);
        let ctx = ObjectContext::build(&xot, root);
        let issues = validate_lines(&xot, &ctx, "f.xml");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_net_obj_1_flags_unresolved_line_ref() {
        let xml = r#"<Frame><Route id="R1"><LineRef ref="MISSING"/></Route></Frame>"#;
        let (xot, root) = parse(xml);
        let ctx = ObjectContext::build(&xot, root);
        let issues = validate_network_consistency(&xot, &ctx, "f.xml");
        assert!(issues.iter().any(|i| i.rule_code == "NET_OBJ_1"));
    }
}
