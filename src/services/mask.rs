//! Placeholder masking.
//!
//! Ren'Py text carries interpolations (`[player_name]`) and text tags
//! (`{b}`, `{w=0.5}`) that translation services tend to translate, reorder or
//! break. Before a string is sent out every such span is swapped for an index
//! token `__0__`, `__1__`, ... and swapped back in afterwards.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]|\{.*?\}").expect("placeholder pattern"));

// Services like to pad the digits with spaces: `__ 0 __`.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__\s*(\d+)\s*__").expect("token pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskedString {
    pub masked: String,
    pub variables: Vec<String>,
}

pub fn token(index: usize) -> String {
    format!("__{index}__")
}

pub fn mask(text: &str) -> MaskedString {
    let mut variables: Vec<String> = Vec::new();

    let masked = PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures| {
            variables.push(caps[0].to_string());
            token(variables.len() - 1)
        })
        .into_owned();

    MaskedString { masked, variables }
}

/// Restores the variables into a translated string. Tokens without a matching
/// variable are left as they are.
pub fn unmask(translated: Option<&str>, variables: &[String]) -> String {
    let translated = match translated {
        Some(t) if !t.is_empty() => t,
        _ => return String::new(),
    };

    TOKEN_RE
        .replace_all(translated, |caps: &Captures| {
            token_index(&caps[1])
                .and_then(|i| variables.get(i))
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Only canonical indices count: `00` or `007` never name a variable.
fn token_index(digits: &str) -> Option<usize> {
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// Finds the index tokens still present in a string.
pub fn leftover_tokens(text: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_brackets_and_braces_in_order() {
        let m = mask("Hi [name], {b}welcome{/b}!");
        assert_eq!(m.masked, "Hi __0__, __1__welcome__2__!");
        assert_eq!(m.variables, vec!["[name]", "{b}", "{/b}"]);
    }

    #[test]
    fn test_mask_is_lazy_not_nested() {
        let m = mask("[a][b] {w=0.5}{c}");
        assert_eq!(m.masked, "__0____1__ __2____3__");
        assert_eq!(m.variables, vec!["[a]", "[b]", "{w=0.5}", "{c}"]);
    }

    #[test]
    fn test_plain_text_untouched() {
        let m = mask("Nothing to hide.");
        assert_eq!(m.masked, "Nothing to hide.");
        assert!(m.variables.is_empty());
    }

    #[test]
    fn test_round_trip() {
        for s in [
            "Hello [player]!",
            "{i}Whisper{/i} [name] and [other]",
            "[x]",
            "no variables here",
            "",
        ] {
            let m = mask(s);
            assert_eq!(unmask(Some(&m.masked), &m.variables), s, "round trip of {s:?}");
        }
    }

    #[test]
    fn test_unmask_tolerates_padded_tokens() {
        let vars = vec!["[name]".to_string(), "{b}".to_string()];
        assert_eq!(unmask(Some("สวัสดี __ 0 __ __1 __!"), &vars), "สวัสดี [name] {b}!");
    }

    #[test]
    fn test_unmask_follows_reordering() {
        let vars = vec!["[a]".to_string(), "[b]".to_string()];
        assert_eq!(unmask(Some("__1__ then __0__"), &vars), "[b] then [a]");
    }

    #[test]
    fn test_unmask_out_of_range_keeps_token() {
        let vars = vec!["[a]".to_string()];
        assert_eq!(unmask(Some("__0__ __7__"), &vars), "[a] __7__");
    }

    #[test]
    fn test_unmask_keeps_zero_padded_tokens() {
        let vars = vec!["[a]".to_string(), "[b]".to_string()];
        assert_eq!(unmask(Some("x __00__ __01__ __0__"), &vars), "x __00__ __01__ [a]");
    }

    #[test]
    fn test_unmask_empty_input() {
        assert_eq!(unmask(None, &[]), "");
        assert_eq!(unmask(Some(""), &["[a]".to_string()]), "");
    }

    #[test]
    fn test_leftover_tokens() {
        assert_eq!(leftover_tokens("a __3__ b __ 4 __"), vec!["__3__", "__ 4 __"]);
        assert!(leftover_tokens("clean").is_empty());
    }
}
