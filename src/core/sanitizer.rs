//! Defensive repair and validation of model output.
//!
//! The completion service is asked for `{"flashcards": [{"front", "back"}, ...]}`
//! but nothing guarantees it. Everything that goes wrong in here degrades to
//! fewer (or zero) flashcards; no error ever leaves this module.

use crate::domain::model::Flashcard;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;

/// A dangling `, {"front": "<unterminated>` at the very end of the text.
static TRUNCATED_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#",\s*\{\s*"front":\s*"[^"]*$"#).expect("truncated entry pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repair<'a> {
    pub text: Cow<'a, str>,
    pub repaired: bool,
}

/// Strips a trailing flashcard entry that was cut off inside its `front` string.
///
/// This handles exactly one truncation shape. When the fragment is removed the
/// arrays and objects left open by the cut are closed again so the remaining
/// prefix parses; any other malformation is returned untouched.
pub fn repair_truncated_entry(raw: &str) -> Repair<'_> {
    let Some(fragment) = TRUNCATED_ENTRY.find(raw) else {
        return Repair {
            text: Cow::Borrowed(raw),
            repaired: false,
        };
    };

    let mut text = raw[..fragment.start()].to_string();
    let closers = closing_delimiters(&text);
    text.push_str(&closers);

    Repair {
        text: Cow::Owned(text),
        repaired: true,
    }
}

/// Closers for every `[` / `{` still open at the end of `prefix`, innermost first.
fn closing_delimiters(prefix: &str) -> String {
    let mut open = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in prefix.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' => open.push(']'),
            '{' => open.push('}'),
            ']' | '}' => {
                open.pop();
            }
            _ => {}
        }
    }

    open.iter().rev().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
    /// The (repaired) text is not JSON.
    Unparseable,
    /// JSON without a `flashcards` field, or with `flashcards: null`.
    MissingFlashcards,
    /// `flashcards` is present but is not an array.
    NotAList,
}

/// Whether the model's answer came through intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultQuality {
    Complete,
    PartialOrEmpty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub flashcards: Vec<Flashcard>,
    pub repaired: bool,
    pub dropped: usize,
    pub failure: Option<ParseFailure>,
}

impl SanitizeReport {
    fn failed(failure: ParseFailure, repaired: bool) -> Self {
        Self {
            flashcards: Vec::new(),
            repaired,
            dropped: 0,
            failure: Some(failure),
        }
    }

    pub fn quality(&self) -> ResultQuality {
        if self.failure.is_some() || self.repaired || self.dropped > 0 || self.flashcards.is_empty()
        {
            ResultQuality::PartialOrEmpty
        } else {
            ResultQuality::Complete
        }
    }
}

/// Repair, parse, extract and validate. Never fails.
pub fn sanitize(raw: &str) -> SanitizeReport {
    let repair = repair_truncated_entry(raw);
    if repair.repaired {
        tracing::debug!("Stripped a truncated trailing flashcard entry");
    }

    let parsed: Value = match serde_json::from_str(&repair.text) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("⚠️ Completion is not valid JSON, returning no flashcards: {}", e);
            return SanitizeReport::failed(ParseFailure::Unparseable, repair.repaired);
        }
    };

    let candidates = match parsed.get("flashcards") {
        None | Some(Value::Null) => {
            tracing::warn!("⚠️ Completion has no 'flashcards' field");
            return SanitizeReport::failed(ParseFailure::MissingFlashcards, repair.repaired);
        }
        Some(Value::Array(items)) => items,
        Some(other) => {
            tracing::warn!("⚠️ 'flashcards' is not a list: {}", other);
            return SanitizeReport::failed(ParseFailure::NotAList, repair.repaired);
        }
    };

    let flashcards: Vec<Flashcard> = candidates.iter().filter_map(validate_candidate).collect();
    let dropped = candidates.len() - flashcards.len();
    if dropped > 0 {
        tracing::debug!("Dropped {} malformed flashcard entries", dropped);
    }

    SanitizeReport {
        flashcards,
        repaired: repair.repaired,
        dropped,
        failure: None,
    }
}

/// The ordered, validated flashcards in `raw`; empty on any unrecoverable malformation.
pub fn sanitize_and_validate(raw: &str) -> Vec<Flashcard> {
    sanitize(raw).flashcards
}

fn validate_candidate(candidate: &Value) -> Option<Flashcard> {
    let entry = candidate.as_object()?;
    let front = non_empty_str(entry.get("front"))?;
    let back = non_empty_str(entry.get("back"))?;
    Some(Flashcard::new(front, back))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
