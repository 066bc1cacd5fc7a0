//! Text transformation for detected entities (§4.3 Modes).

use std::sync::Mutex;

use rustc_hash::FxHashMap;

use crate::config::RedactionMode;
use crate::entities::EntityMatch;

/// Applies `redact`/`pseudonymize`/`mask` transformations to text given a
/// set of already-detected, non-overlapping entity matches.
///
/// The pseudonym mapping is per-process, in-memory state, matching the
/// resource-model note that pseudonymization state "must not be shared
/// across workers unless explicitly externalized."
pub struct Redactor {
    pseudonyms: Mutex<FxHashMap<String, String>>,
    counters: Mutex<FxHashMap<String, u32>>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Redactor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pseudonyms: Mutex::new(FxHashMap::default()),
            counters: Mutex::new(FxHashMap::default()),
        }
    }

    /// Transform `text` in place of every match, per `mode`. Matches must
    /// already be sorted by `start` and non-overlapping.
    pub fn apply(&self, text: &str, matches: &[EntityMatch], mode: RedactionMode) -> String {
        if matches.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0usize;
        for m in matches {
            if m.start < cursor {
                continue; // defensive: skip overlaps that slipped through
            }
            out.push_str(&text[cursor..m.start]);
            out.push_str(&self.transform(m, mode));
            cursor = m.end;
        }
        out.push_str(&text[cursor..]);
        out
    }

    fn transform(&self, m: &EntityMatch, mode: RedactionMode) -> String {
        match mode {
            RedactionMode::Redact => format!("[{}_REDACTED]", m.entity_type),
            RedactionMode::Pseudonymize => self.pseudonymize(m),
            RedactionMode::Mask => mask_value(&m.span),
        }
    }

    fn pseudonymize(&self, m: &EntityMatch) -> String {
        let type_name = m.entity_type.to_string();
        let key = format!("{type_name}:{}", m.span);

        let mut pseudonyms = self.pseudonyms.lock().expect("pseudonym map poisoned");
        if let Some(existing) = pseudonyms.get(&key) {
            return existing.clone();
        }

        let mut counters = self.counters.lock().expect("counter map poisoned");
        let next = counters.entry(type_name.clone()).or_insert(0);
        *next += 1;
        let token = format!("{type_name}_{:04}", *next);
        pseudonyms.insert(key, token.clone());
        token
    }

    /// Clear the in-process pseudonym mapping, starting a new session.
    pub fn clear_pseudonym_mappings(&self) {
        self.pseudonyms.lock().expect("pseudonym map poisoned").clear();
        self.counters.lock().expect("counter map poisoned").clear();
    }

    /// Snapshot the current pseudonym mapping (original-keyed → token).
    #[must_use]
    pub fn get_pseudonym_mappings(&self) -> FxHashMap<String, String> {
        self.pseudonyms.lock().expect("pseudonym map poisoned").clone()
    }
}

/// Keeps the first two and last two characters, replacing the middle with
/// `*`. Spans of four characters or fewer are masked entirely to avoid the
/// first/last windows overlapping.
fn mask_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    let middle = "*".repeat(chars.len() - 4);
    format!("{head}{middle}{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityType;

    fn email_match(start: usize, span: &str) -> EntityMatch {
        EntityMatch {
            entity_type: EntityType::Email,
            start,
            end: start + span.len(),
            confidence: 0.95,
            span: span.to_string(),
        }
    }

    #[test]
    fn redact_replaces_with_type_tag() {
        let redactor = Redactor::new();
        let text = "email jane@example.com now";
        let m = email_match(6, "jane@example.com");
        let out = redactor.apply(text, &[m], RedactionMode::Redact);
        assert_eq!(out, "email [EMAIL_REDACTED] now");
    }

    #[test]
    fn pseudonymize_is_stable_within_session() {
        let redactor = Redactor::new();
        let text = "email jane@example.com now";
        let m = email_match(6, "jane@example.com");
        let first = redactor.apply(text, &[m.clone()], RedactionMode::Pseudonymize);
        let second = redactor.apply(text, &[m], RedactionMode::Pseudonymize);
        assert_eq!(first, second);
        assert!(first.contains("EMAIL_0001"));
    }

    #[test]
    fn pseudonymize_resets_after_clear() {
        let redactor = Redactor::new();
        let m = email_match(0, "jane@example.com");
        let first = redactor.apply("jane@example.com", &[m.clone()], RedactionMode::Pseudonymize);
        redactor.clear_pseudonym_mappings();
        let second = redactor.apply("jane@example.com", &[m], RedactionMode::Pseudonymize);
        assert_eq!(first, second); // same original -> same structure after reset
        assert!(redactor.get_pseudonym_mappings().len() == 1);
    }

    #[test]
    fn mask_keeps_head_and_tail() {
        assert_eq!(mask_value("4111111111111111"), "41************11");
        assert_eq!(mask_value("ab"), "**");
    }
}
