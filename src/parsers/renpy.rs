use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;

use crate::model::entry::{ExtractedString, LineClass, ScriptLine};
use crate::services::translation_memory::TranslationMemory;

// Optional indent + one bare word (`new`, a speaker tag, ...) + a quoted span.
// The span is greedy: it runs to the last quote on the line.
static DIALOGUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\s*(?:new|[A-Za-z0-9_]+)?\s*)"(.*)""#).expect("dialogue pattern")
});

// `# "source text"` lines that precede blank `new ""` / `""` placeholders in tl files.
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"#\s*"(.*)""#).expect("comment pattern"));

/// Classifies one line. `previous` is the line right above it, used for the
/// comment fallback when the quoted span is blank.
///
/// Extraction and rewriting both go through this function so they always agree
/// on which spans are translatable.
pub fn classify(line: &str, previous: Option<&str>, line_index: usize) -> LineClass {
    let caps = match DIALOGUE_RE.captures(line) {
        Some(c) => c,
        None => return LineClass::NoMatch,
    };

    let logical = line.trim();
    if logical.starts_with("old") || logical.starts_with('#') {
        return LineClass::Excluded;
    }

    let prefix = caps.get(1).map_or("", |m| m.as_str()).to_string();
    let mut literal = caps.get(2).map_or("", |m| m.as_str()).to_string();

    if literal.trim().is_empty() {
        if let Some(comment) = previous.filter(|p| p.trim().starts_with('#')) {
            if let Some(c) = COMMENT_RE.captures(comment) {
                literal = c.get(1).map_or("", |m| m.as_str()).to_string();
            }
        }
    }

    LineClass::Translatable(ExtractedString {
        literal,
        prefix,
        line_index,
    })
}

pub fn classify_all(lines: &[ScriptLine]) -> Vec<LineClass> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let previous = i.checked_sub(1).map(|p| lines[p].text.as_str());
            classify(&line.text, previous, line.index)
        })
        .collect()
}

/// Literals of `lines` that still need a translation, first-seen order, no duplicates.
pub fn collect_pending(lines: &[ScriptLine], memory: &TranslationMemory) -> Vec<String> {
    let mut pending: IndexSet<String> = IndexSet::new();

    for class in classify_all(lines) {
        if let Some(e) = class.literal() {
            if !memory.contains(&e.literal) {
                pending.insert(e.literal.clone());
            }
        }
    }

    pending.into_iter().collect()
}
