//! Scoped references to shared configuration files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::MutexGuard;

use super::logical_file::{LogicalFile, SectionSlot};
use super::{ConfigRegistry, SharedFile};
use crate::parser::SectionParser;
use crate::store::RawSections;

/// One caller's reference to an open configuration file.
///
/// Dropping the handle releases the reference exactly once. After the file
/// has been closed (by the last reference or a forced close) the handle
/// reports no sections and accepts no parsers.
pub struct ConfigHandle {
    registry: ConfigRegistry,
    identity: String,
    shared: Arc<SharedFile>,
    released: bool,
}

impl ConfigHandle {
    pub(crate) fn new(registry: ConfigRegistry, identity: String, shared: Arc<SharedFile>) -> Self {
        Self {
            registry,
            identity,
            shared,
            released: false,
        }
    }

    /// Returns the identity (name without extension) of the file.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Returns true while the file is still resident in the registry.
    pub fn is_open(&self) -> bool {
        !self.shared.is_closed()
    }

    /// Extension the file was first opened with.
    pub fn file_type(&self) -> Option<String> {
        self.lock().map(|file| file.file_type().to_string())
    }

    /// Path the file was read from, if it loaded.
    pub fn source(&self) -> Option<PathBuf> {
        self.lock()
            .and_then(|file| file.source().map(Path::to_path_buf))
    }

    /// Attaches a parser to a section, replaying any loaded lines into it.
    ///
    /// Returns false if the section already has a parser or the file is
    /// closed. The parser is dropped in that case.
    pub fn attach<P: SectionParser>(&self, section: &str, parser: P) -> bool {
        self.attach_boxed(section, Box::new(parser))
    }

    pub fn attach_boxed(&self, section: &str, parser: Box<dyn SectionParser>) -> bool {
        self.lock()
            .is_some_and(|mut file| file.attach(section, parser))
    }

    /// Runs `f` against the parser of type `P` attached to a section.
    ///
    /// Only the parser is locked while `f` runs, so `f` may use this or any
    /// other handle to the same file. Returns `None` if the section has no
    /// parser, the parser is not a `P`, or `f` is already running against
    /// this parser further up the stack.
    pub fn with_section<P, R>(&self, section: &str, f: impl FnOnce(&mut P) -> R) -> Option<R>
    where
        P: SectionParser,
    {
        self.slot(section)?.with_typed(f)
    }

    /// Runs `f` against the parser attached to a section without naming its
    /// type.
    pub fn with_section_dyn<R>(
        &self,
        section: &str,
        f: impl FnOnce(&mut (dyn SectionParser + 'static)) -> R,
    ) -> Option<R> {
        self.slot(section)?.with(f)
    }

    /// Returns true if a parser is attached to the section.
    pub fn has_section(&self, section: &str) -> bool {
        self.lock().is_some_and(|file| file.has_section(section))
    }

    /// Detaching is not supported and does nothing.
    pub fn detach(&self, section: &str) {
        if let Some(mut file) = self.lock() {
            file.detach(section);
        }
    }

    /// Removes and returns the oldest diagnostic of the file. An empty string
    /// means no messages are left.
    pub fn poll_messages(&self) -> String {
        self.lock()
            .map(|mut file| file.poll_message())
            .unwrap_or_default()
    }

    /// Returns a copy of the raw sections as loaded.
    pub fn raw_sections(&self) -> RawSections {
        self.lock()
            .map(|file| file.raw_sections().clone())
            .unwrap_or_default()
    }

    /// Releases this reference now.
    pub fn close(self) {}

    /// Closes the file for every holder, regardless of outstanding references.
    pub fn force_close(mut self) {
        self.release(true);
    }

    fn slot(&self, section: &str) -> Option<SectionSlot> {
        self.lock()?.section(section)
    }

    fn lock(&self) -> Option<MutexGuard<'_, LogicalFile>> {
        if self.shared.is_closed() {
            return None;
        }
        Some(self.shared.state().lock())
    }

    fn release(&mut self, force: bool) {
        if self.released {
            return;
        }
        self.released = true;
        self.registry.release(&self.identity, &self.shared, force);
    }
}

impl Drop for ConfigHandle {
    fn drop(&mut self) {
        self.release(false);
    }
}

impl fmt::Debug for ConfigHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigHandle")
            .field("identity", &self.identity)
            .field("open", &self.is_open())
            .finish()
    }
}
