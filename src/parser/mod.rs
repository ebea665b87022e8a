//! Typed section parsers.
//!
//! A parser is attached to one section of a loaded file and receives that
//! section's lines as key/value pairs. Each component defines the parser it
//! needs; [`DefaultParser`] covers plain string-keyed sections.

pub mod convert;
pub mod default;
pub mod entries;

use std::any::Any;

use crate::error::IngestError;

pub use default::DefaultParser;
pub use entries::SectionEntries;

/// Interface implemented by typed section views.
pub trait SectionParser: Any + Send {
    /// Ingests one key/value pair from the section.
    ///
    /// Rejections are reported as diagnostics by the registry; the remaining
    /// lines are still ingested.
    fn ingest(&mut self, key: &str, value: &str) -> Result<(), IngestError>;

    /// Takes the most recent diagnostic recorded by this parser, or returns
    /// an empty string.
    fn check_message(&mut self) -> String {
        String::new()
    }
}

impl dyn SectionParser {
    /// Returns the parser as a concrete type.
    pub fn downcast_ref<P: SectionParser>(&self) -> Option<&P> {
        (self as &dyn Any).downcast_ref::<P>()
    }

    /// Returns the parser as a mutable concrete type.
    pub fn downcast_mut<P: SectionParser>(&mut self) -> Option<&mut P> {
        (self as &mut dyn Any).downcast_mut::<P>()
    }
}
