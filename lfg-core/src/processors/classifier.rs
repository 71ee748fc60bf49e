//! Maps inbound message text to a configured format or to the help reply.

use crate::config::{FormatDefinition, FormatTable};

/// Result of classifying one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger<'a> {
    /// The text is exactly one of the configured keys.
    Format(&'a FormatDefinition),
    /// Anything else gets the capability listing.
    Help,
}

/// Classify `text` against the configured trigger vocabulary.
///
/// The text is trimmed and lowercased and must then equal a format key;
/// `"lfg 1v1 please"` is help, not a 1v1 request.
pub fn classify<'a>(text: &str, formats: &'a FormatTable) -> Trigger<'a> {
    let normalized = text.trim().to_lowercase();
    match formats.get(&normalized) {
        Some(format) => Trigger::Format(format),
        None => Trigger::Help,
    }
}
