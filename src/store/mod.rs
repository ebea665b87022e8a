//! Raw INI file loading.
//!
//! Files are split into sections of unparsed lines. Interpretation of the
//! lines is deferred until a parser is attached to the section.

pub mod paths;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::LoadError;

/// Name of the section that collects lines before the first header.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Normalizes a section name for storage and lookup.
pub fn normalize_section(name: &str) -> String {
    name.to_uppercase()
}

/// Unparsed lines of a file, grouped by normalized section name in the order
/// the sections first appear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSections {
    sections: IndexMap<String, Vec<String>>,
}

impl RawSections {
    /// Creates an empty set of sections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits file content into sections.
    ///
    /// Empty lines and lines starting with `;` are skipped. A line starting
    /// with `[` opens the section named up to the first `]`. Everything else
    /// is kept verbatim under the current section.
    pub fn parse(content: &str, default_section: &str) -> Self {
        let mut sections: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut current = normalize_section(default_section);
        sections.entry(current.clone()).or_default();

        for line in content.lines() {
            if line.trim().is_empty() || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header.split(']').next().unwrap_or(header);
                current = normalize_section(name);
                sections.entry(current.clone()).or_default();
                continue;
            }

            sections
                .entry(current.clone())
                .or_default()
                .push(line.to_string());
        }

        Self { sections }
    }

    /// Returns the raw lines of a section, looked up case-insensitively.
    pub fn get(&self, section: &str) -> Option<&[String]> {
        self.sections
            .get(&normalize_section(section))
            .map(Vec::as_slice)
    }

    /// Returns the normalized section names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Returns sections with their raw lines in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.sections
            .iter()
            .map(|(name, lines)| (name.as_str(), lines.as_slice()))
    }

    /// Returns the number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns true if no sections were loaded.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Reads a file from disk into raw sections.
///
/// Returns the sections along with the path that was actually read.
pub fn load(
    path: &Path,
    fallback_dir: Option<&Path>,
    default_section: &str,
) -> Result<(RawSections, PathBuf), LoadError> {
    let resolved = paths::resolve(path, fallback_dir).ok_or_else(|| LoadError::FileNotFound {
        path: path.to_path_buf(),
    })?;

    let bytes = std::fs::read(&resolved).map_err(|e| LoadError::ReadFailed {
        path: resolved.clone(),
        source: e,
    })?;
    let content = String::from_utf8_lossy(&bytes);

    let sections = RawSections::parse(&content, default_section);
    for (name, lines) in sections.iter() {
        debug!(path = %resolved.display(), section = %name, lines = lines.len(), "Loaded section");
    }
    info!(path = %resolved.display(), sections = sections.len(), "Config file loaded");

    Ok((sections, resolved))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
; leading comment
top=1
[Server]
host = example.org
port=8080

[client]
standalone
;port=1
";

    #[test]
    fn test_lines_before_header_go_to_default() {
        let sections = RawSections::parse(SAMPLE, DEFAULT_SECTION);
        assert_eq!(sections.get("DEFAULT"), Some(&["top=1".to_string()][..]));
        assert_eq!(
            sections.names().collect::<Vec<_>>(),
            vec!["DEFAULT", "SERVER", "CLIENT"]
        );
    }

    #[test]
    fn test_lines_kept_verbatim() {
        let sections = RawSections::parse(SAMPLE, DEFAULT_SECTION);
        let server = sections.get("server").unwrap();
        assert_eq!(server, &["host = example.org", "port=8080"]);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let sections = RawSections::parse(SAMPLE, DEFAULT_SECTION);
        assert_eq!(sections.get("CLIENT").unwrap(), &["standalone"]);
    }

    #[test]
    fn test_comment_only_checked_on_first_character() {
        let sections = RawSections::parse("  ; not a comment\n", DEFAULT_SECTION);
        assert_eq!(sections.get("DEFAULT").unwrap(), &["  ; not a comment"]);
    }

    #[test]
    fn test_header_without_closing_bracket() {
        let sections = RawSections::parse("[Open\nk=v\n", DEFAULT_SECTION);
        assert_eq!(sections.get("OPEN").unwrap(), &["k=v"]);
    }

    #[test]
    fn test_repeated_header_appends() {
        let sections = RawSections::parse("[a]\nx=1\n[b]\ny=2\n[A]\nz=3\n", DEFAULT_SECTION);
        assert_eq!(sections.get("a").unwrap(), &["x=1", "z=3"]);
        assert_eq!(sections.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Path::new("nope.ini"), Some(dir.path()), DEFAULT_SECTION).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_from_fallback_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.ini"), SAMPLE).unwrap();

        let (sections, resolved) =
            load(Path::new("app.ini"), Some(dir.path()), DEFAULT_SECTION).unwrap();
        assert_eq!(resolved, dir.path().join("app.ini"));
        assert_eq!(sections.len(), 3);
    }
}
