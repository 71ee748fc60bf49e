//! Game format definitions.

use compact_str::CompactString;
use thiserror::Error;

/// Errors raised while building the format table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("format key must not be empty")]
    EmptyKey,

    #[error("format {key} needs at least 2 seats, got {seat_count}")]
    TooFewSeats { key: CompactString, seat_count: u32 },

    #[error("format key {0} is configured more than once")]
    DuplicateKey(CompactString),

    #[error("at least one format must be configured")]
    NoFormats,
}

/// One game format players can ask for.
///
/// The poll threshold is derived from the seat count: the requester holds
/// one seat without voting, so `poll_threshold == seat_count - 1` always.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDefinition {
    key: CompactString,
    label: String,
    external_category: u64,
    seat_count: u32,
    poll_threshold: u32,
    external_game_format: String,
}

impl FormatDefinition {
    /// Create a format. The key is trimmed and lowercased, since triggers
    /// are matched case-insensitively.
    pub fn new(
        key: &str,
        label: impl Into<String>,
        external_category: u64,
        seat_count: u32,
        external_game_format: impl Into<String>,
    ) -> Result<Self, FormatError> {
        let key = CompactString::from(key.trim().to_lowercase());
        if key.is_empty() {
            return Err(FormatError::EmptyKey);
        }
        if seat_count < 2 {
            return Err(FormatError::TooFewSeats { key, seat_count });
        }
        Ok(Self {
            key,
            label: label.into(),
            external_category,
            seat_count,
            poll_threshold: seat_count - 1,
            external_game_format: external_game_format.into(),
        })
    }

    /// Trigger keyword, lowercase.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Human-readable name used in titles and messages.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Forum category the LFG topics for this format live in.
    pub fn external_category(&self) -> u64 {
        self.external_category
    }

    /// Total players needed for a game, requester included.
    pub fn seat_count(&self) -> u32 {
        self.seat_count
    }

    /// Votes needed on top of the requester.
    pub fn poll_threshold(&self) -> u32 {
        self.poll_threshold
    }

    /// Format identifier sent to the game-room platform.
    pub fn external_game_format(&self) -> &str {
        &self.external_game_format
    }
}

/// The configured formats.
///
/// Stored as a `Vec` because only a handful of formats are ever
/// configured, making linear scans faster than hash lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatTable {
    formats: Vec<FormatDefinition>,
}

impl FormatTable {
    /// Build the table, rejecting an empty list and duplicate keys.
    pub fn new(formats: Vec<FormatDefinition>) -> Result<Self, FormatError> {
        if formats.is_empty() {
            return Err(FormatError::NoFormats);
        }
        for (i, format) in formats.iter().enumerate() {
            if formats[..i].iter().any(|f| f.key == format.key) {
                return Err(FormatError::DuplicateKey(format.key.clone()));
            }
        }
        Ok(Self { formats })
    }

    /// Look up a format by its (already normalized) key.
    pub fn get(&self, key: &str) -> Option<&FormatDefinition> {
        self.formats.iter().find(|f| f.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormatDefinition> {
        self.formats.iter()
    }

    /// Formats whose topics live in `category`.
    pub fn in_category(&self, category: u64) -> impl Iterator<Item = &FormatDefinition> {
        self.formats
            .iter()
            .filter(move |f| f.external_category == category)
    }

    /// Distinct categories, in configuration order.
    pub fn categories(&self) -> Vec<u64> {
        let mut categories: Vec<u64> = Vec::with_capacity(self.formats.len());
        for format in &self.formats {
            if !categories.contains(&format.external_category) {
                categories.push(format.external_category);
            }
        }
        categories
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
