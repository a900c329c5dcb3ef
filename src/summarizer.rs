//! First-sentence extraction for verbose tool and parameter descriptions.
//!
//! Tool descriptions get folded into the system prompt, where a paragraph
//! per tool is wasted context. The summarizer keeps the first sentence,
//! taking care not to split on the periods inside common abbreviations.

use std::sync::LazyLock;

use regex::Regex;

/// Abbreviations whose periods must not end a sentence
const ABBREVIATIONS: &[&str] = &["e.g.", "i.e.", "etc.", "E.g.", "I.e."];

/// Longest description returned without a sentence boundary
const MAX_BARE_LEN: usize = 100;

static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s").expect("valid sentence boundary pattern"));

/// Extract the first sentence of a description.
///
/// Returns the text up to and including the first `.`, `?`, or `!` that is
/// followed by whitespace, treating abbreviation periods as part of their
/// word. Without such a boundary the description comes back unchanged, or
/// cut to 100 characters plus `"..."` when longer.
pub fn extract_first_sentence(description: &str) -> String {
    if description.is_empty() {
        return String::new();
    }

    // Masking swaps abbreviation periods for a sentinel of the same byte
    // length, so a boundary found in the masked copy indexes straight into
    // the original.
    let masked = mask_abbreviations(description);
    if let Some(boundary) = SENTENCE_BOUNDARY.find(&masked) {
        return description[..=boundary.start()].to_string();
    }

    if description.chars().count() > MAX_BARE_LEN {
        let head: String = description.chars().take(MAX_BARE_LEN).collect();
        format!("{head}...")
    } else {
        description.to_string()
    }
}

fn mask_abbreviations(text: &str) -> String {
    let mut masked = text.to_string();
    for abbreviation in ABBREVIATIONS {
        if masked.contains(abbreviation) {
            let sentinel = abbreviation.replace('.', "\u{1}");
            masked = masked.replace(abbreviation, &sentinel);
        }
    }
    masked
}
