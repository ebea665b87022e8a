//! Shared, reference-counted configuration files.
//!
//! A [`ConfigRegistry`] maps file identities to loaded files. Every
//! [`ConfigRegistry::open`] of the same identity shares one [`LogicalFile`]
//! and bumps its reference count; each returned [`ConfigHandle`] gives the
//! reference back when dropped. The file is released once the count reaches
//! zero or a forced close is issued.

pub mod diagnostics;
pub mod handle;
pub mod logical_file;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::parser::SectionParser;
use crate::store::{paths, DEFAULT_SECTION};

pub use diagnostics::DiagnosticQueue;
pub use handle::ConfigHandle;
pub use logical_file::{LogicalFile, SectionSlot};

/// Registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryOptions {
    /// Diagnostics kept per file before truncation.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Directory tried for relative file names that do not resolve as given.
    #[serde(default = "default_fallback_dir")]
    pub fallback_dir: Option<PathBuf>,

    /// Section receiving lines that precede the first header.
    #[serde(default = "default_section")]
    pub default_section: String,
}

fn default_max_messages() -> usize {
    diagnostics::DEFAULT_MAX_MESSAGES
}

fn default_fallback_dir() -> Option<PathBuf> {
    paths::executable_dir()
}

fn default_section() -> String {
    DEFAULT_SECTION.to_string()
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            fallback_dir: default_fallback_dir(),
            default_section: default_section(),
        }
    }
}

/// A loaded file shared between handles.
///
/// Once removed from the registry the file is marked closed and handles
/// still pointing at it behave as if it had no sections.
pub(crate) struct SharedFile {
    closed: AtomicBool,
    state: Mutex<LogicalFile>,
}

impl SharedFile {
    fn new(file: LogicalFile) -> Self {
        Self {
            closed: AtomicBool::new(false),
            state: Mutex::new(file),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn state(&self) -> &Mutex<LogicalFile> {
        &self.state
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        // The file is busy while a parser replays its lines; in that case the
        // parsers are freed with the last handle instead.
        if let Some(mut file) = self.state.try_lock() {
            file.release_sections();
        }
    }
}

struct Entry {
    shared: Arc<SharedFile>,
    references: usize,
}

struct RegistryInner {
    options: RegistryOptions,
    files: Mutex<HashMap<String, Entry>>,
}

/// Process-wide table of open configuration files.
///
/// Cloning the registry is cheap; clones share the same table.
#[derive(Clone)]
pub struct ConfigRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRegistry {
    /// Creates a registry with default options.
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                options,
                files: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.inner.options
    }

    /// Opens a configuration file, or takes another reference to it if a file
    /// with the same identity is already resident.
    pub fn open(&self, file_name: impl AsRef<Path>) -> ConfigHandle {
        self.open_with(file_name.as_ref(), None)
    }

    /// Like [`open`](Self::open), but reads the file from `dir`. The identity
    /// is still derived from `file_name` alone.
    pub fn open_in(&self, dir: impl AsRef<Path>, file_name: impl AsRef<Path>) -> ConfigHandle {
        self.open_with(file_name.as_ref(), Some(dir.as_ref()))
    }

    fn open_with(&self, file_name: &Path, dir: Option<&Path>) -> ConfigHandle {
        let identity = paths::identity(file_name);
        let mut files = self.inner.files.lock();

        if let Some(entry) = files.get_mut(&identity) {
            entry.references += 1;
            debug!(file = %identity, references = entry.references, "Config file already open");
            return ConfigHandle::new(self.clone(), identity, Arc::clone(&entry.shared));
        }

        let file = LogicalFile::load(file_name, dir, &self.inner.options);
        let shared = Arc::new(SharedFile::new(file));
        files.insert(
            identity.clone(),
            Entry {
                shared: Arc::clone(&shared),
                references: 1,
            },
        );
        info!(file = %identity, "Config file opened");

        ConfigHandle::new(self.clone(), identity, shared)
    }

    /// Gives back one reference to a file, or all of them when `force` is set.
    pub fn close(&self, file_name: impl AsRef<Path>, force: bool) {
        let identity = paths::identity(file_name.as_ref());
        self.close_identity(&identity, force);
    }

    /// Closes every resident file.
    pub fn close_all(&self, force: bool) {
        let identities: Vec<String> = self.inner.files.lock().keys().cloned().collect();
        for identity in identities {
            self.close_identity(&identity, force);
        }
    }

    /// Runs `f` against the parser of type `P` attached to `section` of a
    /// resident file, without taking a reference to the file. Only the
    /// parser is locked while `f` runs.
    pub fn with_file_section<P, R>(
        &self,
        file_name: impl AsRef<Path>,
        section: &str,
        f: impl FnOnce(&mut P) -> R,
    ) -> Option<R>
    where
        P: SectionParser,
    {
        let identity = paths::identity(file_name.as_ref());
        let shared = self
            .inner
            .files
            .lock()
            .get(&identity)
            .map(|entry| Arc::clone(&entry.shared))?;

        if shared.is_closed() {
            return None;
        }
        let slot = shared.state.lock().section(section)?;
        slot.with_typed(f)
    }

    /// Returns true if a file with this identity is resident.
    pub fn is_open(&self, file_name: impl AsRef<Path>) -> bool {
        let identity = paths::identity(file_name.as_ref());
        self.inner.files.lock().contains_key(&identity)
    }

    /// Returns the reference count of a file, zero if it is not resident.
    pub fn references(&self, file_name: impl AsRef<Path>) -> usize {
        let identity = paths::identity(file_name.as_ref());
        self.inner
            .files
            .lock()
            .get(&identity)
            .map_or(0, |entry| entry.references)
    }

    /// Returns the identities of all resident files.
    pub fn identities(&self) -> Vec<String> {
        let mut identities: Vec<String> = self.inner.files.lock().keys().cloned().collect();
        identities.sort();
        identities
    }

    pub fn len(&self) -> usize {
        self.inner.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.files.lock().is_empty()
    }

    fn close_identity(&self, identity: &str, force: bool) {
        let files = self.inner.files.lock();
        Self::release_entry(files, identity, force);
    }

    /// Releases a reference held by a handle. A handle whose file has since
    /// been closed (and possibly reopened) releases nothing.
    pub(crate) fn release(&self, identity: &str, shared: &Arc<SharedFile>, force: bool) {
        let files = self.inner.files.lock();
        let is_current = files
            .get(identity)
            .is_some_and(|entry| Arc::ptr_eq(&entry.shared, shared));

        if !is_current {
            trace!(file = %identity, "Handle outlived its config file");
            return;
        }

        Self::release_entry(files, identity, force);
    }

    fn release_entry(
        mut files: MutexGuard<'_, HashMap<String, Entry>>,
        identity: &str,
        force: bool,
    ) {
        let Some(entry) = files.get_mut(identity) else {
            trace!(file = %identity, "Close requested for file that is not open");
            return;
        };

        entry.references = if force {
            0
        } else {
            entry.references.saturating_sub(1)
        };
        debug!(file = %identity, references = entry.references, force, "Config reference released");

        if entry.references > 0 {
            return;
        }

        let removed = files.remove(identity);
        drop(files);
        if let Some(entry) = removed {
            entry.shared.close();
            info!(file = %identity, "Config file closed");
        }
    }
}
