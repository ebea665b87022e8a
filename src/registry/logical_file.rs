//! A loaded configuration file and the parsers attached to its sections.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{debug, info, warn};

use super::diagnostics::DiagnosticQueue;
use super::RegistryOptions;
use crate::parser::SectionParser;
use crate::store::{self, normalize_section, paths, RawSections};

/// A parser attached to a section.
///
/// Each parser has its own lock, so using it never holds the file it belongs
/// to. Reentering the same parser from inside [`SectionSlot::with`] on one
/// thread yields `None` instead of blocking.
#[derive(Clone)]
pub struct SectionSlot {
    parser: Arc<ReentrantMutex<RefCell<Box<dyn SectionParser>>>>,
}

impl SectionSlot {
    fn new(parser: Box<dyn SectionParser>) -> Self {
        Self {
            parser: Arc::new(ReentrantMutex::new(RefCell::new(parser))),
        }
    }

    /// Runs `f` against the parser.
    pub fn with<R>(&self, f: impl FnOnce(&mut (dyn SectionParser + 'static)) -> R) -> Option<R> {
        let guard = self.parser.lock();
        let mut parser = guard.try_borrow_mut().ok()?;
        Some(f(&mut **parser))
    }

    /// Runs `f` against the parser if it is a `P`.
    pub fn with_typed<P, R>(&self, f: impl FnOnce(&mut P) -> R) -> Option<R>
    where
        P: SectionParser,
    {
        self.with(|parser| parser.downcast_mut::<P>().map(f)).flatten()
    }
}

/// In-memory state of one configuration file.
///
/// Raw lines are loaded once and never modified. Attaching a parser replays
/// the matching section's lines into it.
pub struct LogicalFile {
    identity: String,
    file_type: String,
    source: Option<PathBuf>,
    raw: RawSections,
    parsers: HashMap<String, SectionSlot>,
    diagnostics: DiagnosticQueue,
}

impl LogicalFile {
    /// Loads a file from disk. A file that cannot be read still yields a
    /// `LogicalFile`, with no sections and a queued diagnostic.
    pub fn load(file_name: &Path, dir: Option<&Path>, options: &RegistryOptions) -> Self {
        let path = match dir {
            Some(dir) => dir.join(file_name),
            None => file_name.to_path_buf(),
        };

        match store::load(
            &path,
            options.fallback_dir.as_deref(),
            &options.default_section,
        ) {
            Ok((raw, resolved)) => {
                let mut file = Self::from_sections(file_name, raw, options);
                file.source = Some(resolved);
                file
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Config file not loaded");
                let mut file = Self::from_sections(file_name, RawSections::new(), options);
                file.diagnostics.push(e.to_string());
                file
            }
        }
    }

    /// Builds a file from sections that are already in memory.
    pub fn from_sections(file_name: &Path, raw: RawSections, options: &RegistryOptions) -> Self {
        Self {
            identity: paths::identity(file_name),
            file_type: paths::file_type(file_name),
            source: None,
            raw,
            parsers: HashMap::new(),
            diagnostics: DiagnosticQueue::with_capacity(options.max_messages),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Extension of the file name this instance was first opened with.
    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    /// Path the raw lines were read from, if the load succeeded.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn raw_sections(&self) -> &RawSections {
        &self.raw
    }

    /// Attaches a parser to a section and replays the section's raw lines
    /// into it.
    ///
    /// Returns false without touching the existing parser if one is already
    /// attached. Lines without `=` are ingested under generated keys `1`,
    /// `2`, ... in line order. Ingest rejections become diagnostics. The
    /// file is held while lines are replayed, so `ingest` must not reach
    /// back into the same file.
    pub fn attach(&mut self, section: &str, mut parser: Box<dyn SectionParser>) -> bool {
        let name = normalize_section(section);
        if self.parsers.contains_key(&name) {
            debug!(file = %self.identity, section = %name, "Section already has a parser");
            return false;
        }

        let mut auto_keys: i64 = 0;
        if let Some(lines) = self.raw.get(&name) {
            for line in lines {
                let (key, value) = match line.split_once('=') {
                    Some((key, value)) => (key.trim().to_string(), value.trim()),
                    None => {
                        auto_keys += 1;
                        (auto_keys.to_string(), line.trim())
                    }
                };

                if let Err(e) = parser.ingest(&key, value) {
                    self.diagnostics.push(e.to_string());
                }
            }
        }

        if auto_keys > 0 {
            self.diagnostics.push(format!(
                "AutoKeys Generated for section {section}: {auto_keys}"
            ));
        }

        debug!(file = %self.identity, section = %name, auto_keys, "Parser attached");
        self.parsers.insert(name, SectionSlot::new(parser));
        true
    }

    /// Returns the parser attached to a section, looked up case-insensitively.
    pub fn section(&self, section: &str) -> Option<SectionSlot> {
        self.parsers.get(&normalize_section(section)).cloned()
    }

    /// Returns true if a parser is attached to the section.
    pub fn has_section(&self, section: &str) -> bool {
        self.parsers.contains_key(&normalize_section(section))
    }

    /// Detaching parsers is not supported; attached parsers live as long as
    /// the file.
    pub fn detach(&mut self, section: &str) {
        debug!(file = %self.identity, section, "Detach requested, ignoring");
    }

    /// Removes and returns the oldest diagnostic, or an empty string.
    pub fn poll_message(&mut self) -> String {
        self.diagnostics.poll()
    }

    pub(crate) fn release_sections(&mut self) {
        info!(file = %self.identity, parsers = self.parsers.len(), "Releasing config file");
        self.parsers.clear();
        self.raw = RawSections::new();
        self.diagnostics.clear();
    }
}

#[cfg(test)]
mod tests {
    use mockall::mock;
    use mockall::predicate::eq;
    use mockall::Sequence;

    use super::*;
    use crate::error::IngestError;
    use crate::parser::DefaultParser;
    use crate::store::DEFAULT_SECTION;

    mock! {
        Parser {}
        impl SectionParser for Parser {
            fn ingest(&mut self, key: &str, value: &str) -> Result<(), IngestError>;
            fn check_message(&mut self) -> String;
        }
    }

    fn file_from(content: &str) -> LogicalFile {
        let options = RegistryOptions::default();
        LogicalFile::from_sections(
            Path::new("test.ini"),
            RawSections::parse(content, DEFAULT_SECTION),
            &options,
        )
    }

    fn drain(file: &mut LogicalFile) -> Vec<String> {
        std::iter::from_fn(|| Some(file.poll_message()).filter(|m| !m.is_empty())).collect()
    }

    // ==================== Replay Tests ====================

    #[test]
    fn test_replay_order_and_trimming() {
        let mut file = file_from("[s]\n  host =  example.org \nport=80\nlisted\n");

        let mut parser = MockParser::new();
        let mut seq = Sequence::new();
        parser
            .expect_ingest()
            .with(eq("host"), eq("example.org"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        parser
            .expect_ingest()
            .with(eq("port"), eq("80"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        parser
            .expect_ingest()
            .with(eq("1"), eq("listed"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        assert!(file.attach("S", Box::new(parser)));
        let checked = file
            .section("s")
            .and_then(|slot| slot.with_typed(|p: &mut MockParser| p.checkpoint()));
        assert!(checked.is_some());

        assert_eq!(drain(&mut file), vec!["AutoKeys Generated for section S: 1"]);
    }

    #[test]
    fn test_value_split_on_first_equals() {
        let mut file = file_from("[s]\nurl = a=b=c\n");
        assert!(file.attach("s", Box::new(DefaultParser::new())));

        let url = file
            .section("s")
            .and_then(|slot| slot.with_typed(|p: &mut DefaultParser| p.get_string("url", "")));
        assert_eq!(url.as_deref(), Some("a=b=c"));
    }

    #[test]
    fn test_ingest_rejection_becomes_diagnostic() {
        let mut file = file_from("[s]\na=1\na=2\n");
        assert!(file.attach("s", Box::new(DefaultParser::new())));

        let value = file
            .section("s")
            .and_then(|slot| slot.with_typed(|p: &mut DefaultParser| p.get_string("a", "")));
        assert_eq!(value.as_deref(), Some("1"));
        assert_eq!(drain(&mut file), vec!["Duplicate Configuration Key: a"]);
        assert_eq!(file.poll_message(), "");
    }

    #[test]
    fn test_auto_keys_keep_line_order_past_nine() {
        let content: String = std::iter::once("[list]\n".to_string())
            .chain((1..=12).map(|i| format!("item{i}\n")))
            .collect();
        let mut file = file_from(&content);
        assert!(file.attach("list", Box::new(DefaultParser::new())));

        let slot = file.section("LIST").unwrap();
        slot.with_typed(|parser: &mut DefaultParser| {
            for i in 0..12 {
                let key = parser.get_at(i);
                assert_eq!(key, (i + 1).to_string());
                assert_eq!(parser.get_string(&key, ""), format!("item{}", i + 1));
            }
        })
        .unwrap();
        assert_eq!(drain(&mut file), vec!["AutoKeys Generated for section list: 12"]);
    }

    // ==================== Registration Tests ====================

    #[test]
    fn test_second_attach_fails_and_keeps_first() {
        let mut file = file_from("[s]\na=1\n");
        assert!(file.attach("s", Box::new(DefaultParser::new())));

        let mut intruder = MockParser::new();
        intruder.expect_ingest().never();
        assert!(!file.attach("S", Box::new(intruder)));

        let slot = file.section("s").unwrap();
        assert_eq!(
            slot.with_typed(|p: &mut DefaultParser| p.get_string("a", "")),
            Some("1".to_string())
        );
        assert!(slot.with_typed(|_: &mut MockParser| ()).is_none());
    }

    #[test]
    fn test_attach_without_raw_lines_succeeds() {
        let mut file = file_from("");
        assert!(file.attach("later", Box::new(DefaultParser::new())));
        assert!(file.has_section("LATER"));
        let empty = file
            .section("later")
            .and_then(|slot| slot.with_typed(|p: &mut DefaultParser| p.is_empty()));
        assert_eq!(empty, Some(true));
    }

    #[test]
    fn test_section_slot_is_not_reentrant() {
        let mut file = file_from("[s]
a=1
");
        file.attach("s", Box::new(DefaultParser::new()));
        let slot = file.section("s").unwrap();

        let nested = slot.with(|_| slot.with_typed(|p: &mut DefaultParser| p.len()));
        assert_eq!(nested, Some(None));
        assert_eq!(slot.with_typed(|p: &mut DefaultParser| p.len()), Some(1));
    }

    #[test]
    fn test_section_slot_outlives_release() {
        let mut file = file_from("[s]
a=1
");
        file.attach("s", Box::new(DefaultParser::new()));
        let slot = file.section("s").unwrap();

        file.release_sections();
        assert!(file.section("s").is_none());
        assert_eq!(
            slot.with_typed(|p: &mut DefaultParser| p.get_string("a", "")),
            Some("1".to_string())
        );
    }

    #[test]
    fn test_section_absent_until_attached() {
        let mut file = file_from("[s]\na=1\n");
        assert!(file.section("s").is_none());
        assert!(file.raw_sections().get("s").is_some());

        file.detach("s");
        assert!(file.section("s").is_none());
    }

    #[test]
    fn test_release_sections_drops_parsers() {
        let mut file = file_from("[s]\na=1\n");
        file.attach("s", Box::new(DefaultParser::new()));
        file.release_sections();

        assert!(!file.has_section("s"));
        assert!(file.raw_sections().is_empty());
    }

    #[test]
    fn test_missing_file_is_soft_failure() {
        let dir = tempfile::tempdir().unwrap();
        let options = RegistryOptions {
            fallback_dir: Some(dir.path().to_path_buf()),
            ..RegistryOptions::default()
        };
        let mut file = LogicalFile::load(Path::new("absent.cfg"), None, &options);

        assert_eq!(file.identity(), "absent");
        assert_eq!(file.file_type(), ".cfg");
        assert!(file.source().is_none());
        assert!(file.raw_sections().is_empty());
        assert_eq!(
            file.poll_message(),
            "Failed to open config file: absent.cfg"
        );
    }
}
