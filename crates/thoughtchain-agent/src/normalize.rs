//! Normalization of free-form classifier output into a [`Verdict`].
//!
//! Models are prompted to answer with a two-key JSON object but routinely
//! deviate: booleans instead of strings, synonym keys, prose around the
//! answer, or no JSON at all. The rules here accept all spellings seen in
//! practice and always produce a usable verdict.

use crate::collaborator::Verdict;
use serde_json::Value;

/// Maximum characters of message content used for a derived node title.
pub const TITLE_FALLBACK_CHARS: usize = 20;

/// Normalizes a raw classifier response into a [`Verdict`].
///
/// JSON objects are inspected for a create flag under `createNode`,
/// `create`, `create_node`, or `shouldCreate` — boolean, or a string that
/// counts as yes iff it starts with `y` (case-insensitive). When the flag
/// still reads "no", free text under `message`/`text`/`reply` is scanned:
/// "create" together with "yes" flips to yes, a bare "no" confirms no.
/// The title is taken from `title`, `name`, or `nodeTitle`, trimmed.
///
/// Non-JSON responses fall back to a substring scan: "yes" means create,
/// otherwise "no" (or anything else) means keep. A "no" verdict always
/// drops the title.
pub fn normalize_verdict(raw: &str) -> Verdict {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(obj)) => from_object(&obj),
        _ => from_text(raw),
    }
}

fn from_object(obj: &serde_json::Map<String, Value>) -> Verdict {
    let raw_create = obj
        .get("createNode")
        .or_else(|| obj.get("create"))
        .or_else(|| obj.get("create_node"))
        .or_else(|| obj.get("shouldCreate"));

    let mut create = match raw_create {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().to_lowercase().starts_with('y'),
        _ => false,
    };

    if !create {
        let free = obj
            .get("message")
            .or_else(|| obj.get("text"))
            .or_else(|| obj.get("reply"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase();
        if free.contains("create") && free.contains("yes") {
            create = true;
        }
    }

    if !create {
        return Verdict::Keep;
    }

    let title = obj
        .get("title")
        .or_else(|| obj.get("name"))
        .or_else(|| obj.get("nodeTitle"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned);

    Verdict::Create { title }
}

fn from_text(raw: &str) -> Verdict {
    let lower = raw.to_lowercase();
    if lower.contains("yes") {
        Verdict::Create { title: None }
    } else {
        Verdict::Keep
    }
}

/// The heuristic used when the classifier call itself fails: the literal
/// content `"0"` means keep, anything else opens a node (titled from the
/// message content by the mutator).
pub fn fallback_verdict(content: &str) -> Verdict {
    if content == "0" {
        Verdict::Keep
    } else {
        Verdict::Create { title: None }
    }
}

/// Derives a node title from message content: the first
/// [`TITLE_FALLBACK_CHARS`] characters, char-boundary safe.
pub fn truncate_title(content: &str) -> String {
    content.chars().take(TITLE_FALLBACK_CHARS).collect()
}
