//! Read-only views of a loaded file for the command-line tool.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::InspectError;
use crate::parser::{DefaultParser, SectionEntries};
use crate::registry::ConfigHandle;
use crate::store::{normalize_section, RawSections};

/// Largest edit distance for which a section name is suggested.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Raw line count of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub name: String,
    pub lines: usize,
}

/// Every section of a file as parsed by [`DefaultParser`].
#[derive(Debug, Clone, Serialize)]
pub struct FileDump {
    pub identity: String,
    pub file_type: Option<String>,
    pub source: Option<PathBuf>,
    pub sections: IndexMap<String, SectionEntries<String>>,
}

/// Lists the sections of a file in the order they first appear.
pub fn summarize(handle: &ConfigHandle) -> Vec<SectionSummary> {
    handle
        .raw_sections()
        .iter()
        .map(|(name, lines)| SectionSummary {
            name: name.to_string(),
            lines: lines.len(),
        })
        .collect()
}

/// Attaches a [`DefaultParser`] to every section that has none yet and
/// collects their entries. Sections held by other parser types are skipped.
pub fn dump(handle: &ConfigHandle) -> FileDump {
    let raw = handle.raw_sections();
    let mut sections = IndexMap::new();

    for name in raw.names() {
        handle.attach(name, DefaultParser::new());
        if let Some(entries) = handle.with_section(name, |p: &mut DefaultParser| p.entries().clone()) {
            sections.insert(name.to_string(), entries);
        }
    }

    FileDump {
        identity: handle.identity().to_string(),
        file_type: handle.file_type(),
        source: handle.source(),
        sections,
    }
}

/// Looks up one value, falling back to `default` when the key is missing.
pub fn lookup(
    handle: &ConfigHandle,
    section: &str,
    key: &str,
    default: Option<&str>,
) -> Result<String, InspectError> {
    let raw = handle.raw_sections();
    if raw.get(section).is_none() && !handle.has_section(section) {
        return Err(InspectError::SectionNotFound {
            section: normalize_section(section),
            suggestion: suggest_section(&raw, section),
        });
    }

    handle.attach(section, DefaultParser::new());
    let value = handle
        .with_section(section, |p: &mut DefaultParser| p.entries().get(key).cloned())
        .flatten();

    value
        .or_else(|| default.map(str::to_string))
        .ok_or_else(|| InspectError::KeyNotFound {
            section: normalize_section(section),
            key: key.to_string(),
        })
}

/// Returns the loaded section name closest to `input`, if any is close.
pub fn suggest_section(raw: &RawSections, input: &str) -> Option<String> {
    let input = normalize_section(input);
    raw.names()
        .map(|name| (name, strsim::levenshtein(&input, name)))
        .filter(|(_, distance)| *distance <= MAX_SUGGESTION_DISTANCE)
        .min_by_key(|(_, distance)| *distance)
        .map(|(name, _)| name.to_string())
}

/// Drains every queued diagnostic of the file.
pub fn drain_messages(handle: &ConfigHandle) -> Vec<String> {
    std::iter::from_fn(|| Some(handle.poll_messages()).filter(|m| !m.is_empty())).collect()
}
