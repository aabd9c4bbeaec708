//! The dataset-level identifier graph (Section 4.3): definitions, references,
//! common-file visibility, and the checks run over them once extraction is
//! complete.
//!
//! The store is written concurrently while files are being processed and is
//! read-mostly afterwards (Section 5), so it is guarded by a single
//! `RwLock` rather than a lock per map.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, RwLock};

use regex::Regex;

use crate::identifiers::external_ref::ExternalReferenceValidator;
use crate::model::{DataLocation, IdVersion, Severity, ValidationIssue};

#[derive(Debug, thiserror::Error)]
#[error("id '{id}' already defined in file '{file}' with a different version")]
pub struct DuplicateInFile {
    pub id: String,
    pub file: String,
}

#[derive(Debug, Default)]
struct StoreInner {
    /// All registered definitions, insertion order preserved.
    definitions: Vec<IdVersion>,
    /// All registered references (id/version = the reference target,
    /// file = the file the reference was found in), insertion order preserved.
    references: Vec<IdVersion>,
    common_files: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct IdentifierStore {
    inner: RwLock<StoreInner>,
}

impl IdentifierStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_id(&self, id: &str, version: &str, file: &str) -> Result<(), DuplicateInFile> {
        let mut inner = self.inner.write().unwrap();
        if let Some(existing) = inner
            .definitions
            .iter()
            .find(|d| d.id == id && d.file == file)
        {
            if existing.version == version {
                return Ok(()); // idempotent
            }
            return Err(DuplicateInFile {
                id: id.to_string(),
                file: file.to_string(),
            });
        }
        inner
            .definitions
            .push(IdVersion::new(id, version, file));
        Ok(())
    }

    pub fn add_reference(&self, id: &str, version: &str, file: &str) {
        self.inner
            .write()
            .unwrap()
            .references
            .push(IdVersion::new(id, version, file));
    }

    pub fn mark_as_common_file(&self, file: &str) {
        self.inner.write().unwrap().common_files.insert(file.to_string());
    }

    pub fn is_common_file(&self, file: &str) -> bool {
        self.inner.read().unwrap().common_files.contains(file)
    }

    /// Resolves every recorded reference, emitting `NETEX_ID_5` for those
    /// that resolve nowhere (after the external-reference plug-point gets a
    /// chance) and version-mismatch warnings for resolved-but-differing
    /// versions.
    pub fn validate_references(
        &self,
        external: &dyn ExternalReferenceValidator,
    ) -> Vec<ValidationIssue> {
        let inner = self.inner.read().unwrap();

        // (file, id) -> version, for same-file resolution. AddId rejects a
        // second distinct version for the same (id, file), so this is safe
        // as a single-valued map for a store built only through add_id.
        let mut by_file_id: HashMap<(&str, &str), &str> = HashMap::new();
        // id -> version, the first common-file definition encountered.
        let mut common_def: HashMap<&str, &str> = HashMap::new();
        for def in &inner.definitions {
            by_file_id.insert((def.file.as_str(), def.id.as_str()), def.version.as_str());
            if inner.common_files.contains(&def.file) {
                common_def.entry(def.id.as_str()).or_insert(def.version.as_str());
            }
        }

        let mut unresolved_ids = Vec::new();
        let mut unresolved_positions = Vec::new();
        let mut issues = Vec::new();

        for (idx, reference) in inner.references.iter().enumerate() {
            let resolved_version = by_file_id
                .get(&(reference.file.as_str(), reference.id.as_str()))
                .copied()
                .or_else(|| common_def.get(reference.id.as_str()).copied());

            match resolved_version {
                Some(def_version) => {
                    if def_version != reference.version && !reference.is_unconstrained_version() {
                        issues.push(ValidationIssue::new(
                            "VERSION_MISMATCH",
                            Severity::Warning,
                            DataLocation::new(reference.file.clone())
                                .with_element_id(reference.id.clone()),
                            format!(
                                "reference to '{}' requests version '{}' but the definition has version '{}'",
                                reference.id, reference.version, def_version
                            ),
                        ));
                    }
                }
                None => {
                    unresolved_ids.push(reference.id.clone());
                    unresolved_positions.push(idx);
                }
            }
        }

        if !unresolved_ids.is_empty() {
            let accepted = external.validate(&unresolved_ids);
            for idx in unresolved_positions {
                let reference = &inner.references[idx];
                if accepted.contains(&reference.id) {
                    continue;
                }
                issues.push(ValidationIssue::new(
                    "NETEX_ID_5",
                    Severity::Error,
                    DataLocation::new(reference.file.clone())
                        .with_element_id(reference.id.clone()),
                    format!("unresolved reference to '{}'", reference.id),
                ));
            }
        }

        issues
    }

    pub fn validate_id_format(&self) -> Vec<ValidationIssue> {
        let inner = self.inner.read().unwrap();
        inner
            .definitions
            .iter()
            .filter(|def| !is_accepted_id_format(&def.id))
            .map(|def| {
                ValidationIssue::new(
                    "INVALID_ID_FORMAT",
                    Severity::Warning,
                    DataLocation::new(def.file.clone()).with_element_id(def.id.clone()),
                    format!("id '{}' does not match the accepted id format", def.id),
                )
            })
            .collect()
    }

    pub fn validate_versions(&self) -> Vec<ValidationIssue> {
        let inner = self.inner.read().unwrap();
        inner
            .definitions
            .iter()
            .filter_map(|def| {
                if def.version.is_empty() {
                    Some(ValidationIssue::new(
                        "ID_VERSION_EMPTY",
                        Severity::Info,
                        DataLocation::new(def.file.clone()).with_element_id(def.id.clone()),
                        format!("id '{}' has no version", def.id),
                    ))
                } else if def.version != "any" && def.version.parse::<u64>().is_err() {
                    Some(ValidationIssue::new(
                        "ID_VERSION_NON_NUMERIC",
                        Severity::Warning,
                        DataLocation::new(def.file.clone()).with_element_id(def.id.clone()),
                        format!("id '{}' has non-numeric version '{}'", def.id, def.version),
                    ))
                } else {
                    None
                }
            })
            .collect()
    }

    /// `DUPLICATE_ID` for any id defined in more than one file **not flagged
    /// common**. Emits exactly one issue per offending id.
    pub fn get_duplicate_ids(&self) -> Vec<ValidationIssue> {
        let inner = self.inner.read().unwrap();
        let mut files_by_id: HashMap<&str, HashSet<&str>> = HashMap::new();
        for def in &inner.definitions {
            if inner.common_files.contains(&def.file) {
                continue;
            }
            files_by_id.entry(&def.id).or_default().insert(&def.file);
        }

        let mut issues: Vec<ValidationIssue> = files_by_id
            .iter()
            .filter(|(_, files)| files.len() > 1)
            .map(|(id, files)| {
                let mut sorted_files: Vec<&&str> = files.iter().collect();
                sorted_files.sort();
                ValidationIssue::new(
                    "DUPLICATE_ID",
                    Severity::Error,
                    DataLocation::new((**sorted_files[0]).to_string()).with_element_id(id.to_string()),
                    format!(
                        "id '{}' is defined in multiple non-common files: {}",
                        id,
                        sorted_files
                            .iter()
                            .map(|f| f.to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                )
            })
            .collect();
        issues.sort_by(|a, b| a.location.element_id.cmp(&b.location.element_id));
        issues
    }

    /// For any id defined in multiple files (common or not), one Warning
    /// per version beyond the first distinct version observed.
    pub fn validate_version_consistency_across_files(&self) -> Vec<ValidationIssue> {
        let inner = self.inner.read().unwrap();
        let mut versions_by_id: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
        for def in &inner.definitions {
            versions_by_id
                .entry(&def.id)
                .or_default()
                .push((def.version.as_str(), def.file.as_str()));
        }

        let mut issues = Vec::new();
        for (id, entries) in versions_by_id {
            let mut seen_versions: Vec<&str> = Vec::new();
            for (version, file) in entries {
                if seen_versions.contains(&version) {
                    continue;
                }
                if seen_versions.is_empty() {
                    seen_versions.push(version);
                    continue;
                }
                seen_versions.push(version);
                issues.push(ValidationIssue::new(
                    "VERSION_INCONSISTENT",
                    Severity::Warning,
                    DataLocation::new(file.to_string()).with_element_id(id.to_string()),
                    format!(
                        "id '{}' has inconsistent versions across files: additional version '{}' in '{}'",
                        id, version, file
                    ),
                ));
            }
        }
        issues
    }
}

fn kind_allowlist_pattern() -> &'static str {
    concat!(
        "Line|Route|Operator|Authority|Network|Quay|StopPlace|ScheduledStopPoint|",
        "JourneyPattern|ServiceJourney|DatedServiceJourney|RoutePoint|RouteLink|",
        "DayType|DayTypeAssignment|OperatingDay|AccessibilityLimitation|Block|",
        "FlexibleLine|ResourceFrame|ServiceFrame|TimetableFrame|SiteFrame|",
        "ServiceCalendarFrame|VehicleScheduleFrame|CompositeFrame"
    )
}

fn id_format_regexes() -> &'static (Regex, Regex, Regex) {
    static REGEXES: OnceLock<(Regex, Regex, Regex)> = OnceLock::new();
    REGEXES.get_or_init(|| {
        let structured = Regex::new(&format!(
            r"^[A-Z_][A-Z0-9_]*:(?:{})(?::[A-Za-z0-9_.-]+)+$",
            kind_allowlist_pattern()
        ))
        .expect("structured id regex must compile");
        let opaque = Regex::new(r"^[0-9]+$").expect("opaque id regex must compile");
        let frame = Regex::new(r"^[A-Z_][A-Z0-9_]*:NETEX_[A-Z_]+-[0-9]+(?::.*)?$")
            .expect("frame-pattern id regex must compile");
        (structured, opaque, frame)
    })
}

fn is_accepted_id_format(id: &str) -> bool {
    let (structured, opaque, frame) = id_format_regexes();
    structured.is_match(id) || opaque.is_match(id) || frame.is_match(id)
}

pub fn shared() -> Arc<IdentifierStore> {
    Arc::new(IdentifierStore::new())
}
