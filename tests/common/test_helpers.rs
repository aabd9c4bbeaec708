//! Fixture builders for the scenarios in SPEC_FULL.md Section 8.

use std::io::Write;

use zip::write::{FileOptions, ZipWriter};

pub const VALID_LINE: &str = r#"<Line id="TEST:Line:1" version="1">
    <Name>L</Name>
    <TransportMode>bus</TransportMode>
</Line>"#;

pub const LINE_MISSING_NAME: &str = r#"<Line id="TEST:Line:1" version="1">
    <TransportMode>bus</TransportMode>
</Line>"#;

pub const LINE_INVALID_TRANSPORT_MODE: &str = r#"<Line id="TEST:Line:1" version="1">
    <Name>L</Name>
    <TransportMode>automobile</TransportMode>
</Line>"#;

pub const ROUTE_UNRESOLVED_REFERENCE: &str = r#"<Route id="TEST:Route:1" version="1">
    <LineRef ref="MISSING"/>
</Route>"#;

/// Builds an in-memory, uncompressed ZIP archive from `(entry_name, contents)`
/// pairs, the shape [`netex_validator::dataset::run_archive`] consumes.
pub fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut writer = ZipWriter::new(std::io::Cursor::new(&mut buffer));
        let file_options: FileOptions<()> = FileOptions::default();
        for (name, contents) in entries {
            writer.start_file(*name, file_options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }
    buffer
}

/// `count` distinct `Line` documents, each missing its `Name`, for the
/// cap-enforcement scenario (S6).
pub fn many_missing_name_lines(count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|i| {
            let name = format!("line{i}.xml");
            let xml = format!(
                r#"<Line id="TEST:Line:{i}" version="1"><TransportMode>bus</TransportMode></Line>"#
            );
            (name, xml)
        })
        .collect()
}
