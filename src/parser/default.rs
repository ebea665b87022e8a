//! String-keyed default parser.

use serde::Serialize;
use tracing::debug;

use super::convert::{from_hex, parse_double, parse_integer};
use super::entries::SectionEntries;
use super::SectionParser;
use crate::error::IngestError;

/// Stores a section's values as strings and converts them on lookup.
///
/// Typed getters return the caller's default when a key is missing or its
/// value is empty. Otherwise they read the value's leading number, yielding
/// zero when there is none. The 16 and 32 bit getters wrap values that do
/// not fit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DefaultParser {
    entries: SectionEntries<String>,
    #[serde(skip)]
    message: Option<String>,
}

impl DefaultParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored entries in section order.
    pub fn entries(&self) -> &SectionEntries<String> {
        &self.entries
    }

    /// Returns the value of a key, or `default` if the key is absent.
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_int16(&self, key: &str, default: i16) -> i16 {
        self.get_int16_radix(key, default, 10)
    }

    pub fn get_int16_radix(&self, key: &str, default: i16, radix: u32) -> i16 {
        self.non_empty(key)
            .map(|v| parse_integer(v, radix) as i16)
            .unwrap_or(default)
    }

    pub fn get_int32(&self, key: &str, default: i32) -> i32 {
        self.get_int32_radix(key, default, 10)
    }

    pub fn get_int32_radix(&self, key: &str, default: i32, radix: u32) -> i32 {
        self.non_empty(key)
            .map(|v| parse_integer(v, radix) as i32)
            .unwrap_or(default)
    }

    pub fn get_int64(&self, key: &str, default: i64) -> i64 {
        self.get_int64_radix(key, default, 10)
    }

    pub fn get_int64_radix(&self, key: &str, default: i64, radix: u32) -> i64 {
        self.non_empty(key)
            .map(|v| parse_integer(v, radix))
            .unwrap_or(default)
    }

    pub fn get_double(&self, key: &str, default: f64) -> f64 {
        self.non_empty(key).map(parse_double).unwrap_or(default)
    }

    /// Decodes a hex-encoded value. Malformed hex yields an empty vector.
    pub fn get_hex(&self, key: &str, default: &[u8]) -> Vec<u8> {
        self.non_empty(key)
            .map(from_hex)
            .unwrap_or_else(|| default.to_vec())
    }

    /// Returns the key at an ordinal position, or an empty string when out of
    /// range. Auto-keyed lines keep their original order.
    pub fn get_at(&self, index: usize) -> String {
        self.entries
            .key_at(index)
            .map(str::to_string)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn non_empty(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl SectionParser for DefaultParser {
    fn ingest(&mut self, key: &str, value: &str) -> Result<(), IngestError> {
        self.entries
            .insert(key, value.to_string())
            .inspect_err(|e| {
                debug!(key, "Duplicate configuration key rejected");
                self.message = Some(e.to_string());
            })
    }

    fn check_message(&mut self) -> String {
        self.message.take().unwrap_or_default()
    }
}
