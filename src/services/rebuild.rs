use crate::model::entry::{LineClass, ScriptLine};
use crate::parsers::renpy;
use crate::services::translation_memory::TranslationMemory;

/// Rewrites every translatable line whose literal has a translation in `memory`.
/// All other lines are emitted as they were. Lines are joined with LF.
pub fn rebuild(lines: &[ScriptLine], memory: &TranslationMemory) -> String {
    let classes = renpy::classify_all(lines);
    let mut out: Vec<String> = Vec::with_capacity(lines.len());

    for (line, class) in lines.iter().zip(classes.iter()) {
        let replaced = class
            .literal()
            .and_then(|e| memory.get(&e.literal).map(|t| format!("{}\"{}\"", e.prefix, t)));

        match replaced {
            Some(l) => out.push(l),
            None => out.push(line.text.clone()),
        }
    }

    out.join("\n")
}

/// Counts the lines `rebuild` would change.
pub fn count_replaced(lines: &[ScriptLine], memory: &TranslationMemory) -> usize {
    renpy::classify_all(lines)
        .iter()
        .filter_map(LineClass::literal)
        .filter(|e| memory.contains(&e.literal))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(pairs: &[(&str, &str)]) -> TranslationMemory {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_prefix_is_kept() {
        let lines = ScriptLine::split("label start:\n    e \"Hello\"\n    return");
        let tm = memory(&[("Hello", "สวัสดี")]);
        assert_eq!(
            rebuild(&lines, &tm),
            "label start:\n    e \"สวัสดี\"\n    return"
        );
        assert_eq!(count_replaced(&lines, &tm), 1);
    }

    #[test]
    fn test_comment_fallback_fills_blank_line() {
        let lines = ScriptLine::split("    # \"Hi\"\n    e \"\"");
        let tm = memory(&[("Hi", "Hola")]);
        assert_eq!(rebuild(&lines, &tm), "    # \"Hi\"\n    e \"Hola\"");
    }

    #[test]
    fn test_comment_with_speaker_does_not_resolve() {
        let text = "    # e \"Hi\"\n    e \"\"";
        let lines = ScriptLine::split(text);
        let tm = memory(&[("Hi", "Hola")]);
        assert_eq!(rebuild(&lines, &tm), text);
    }

    #[test]
    fn test_untranslated_lines_pass_through() {
        let text = "    old \"Hello\"\n    new \"Missing\"\n    \"\"\n$ x = 1";
        let lines = ScriptLine::split(text);
        let tm = memory(&[("Hello", "X")]);
        assert_eq!(rebuild(&lines, &tm), text);
        assert_eq!(count_replaced(&lines, &tm), 0);
    }

    #[test]
    fn test_crlf_is_normalized_and_trailing_newline_kept() {
        let lines = ScriptLine::split("e \"A\"\r\ne \"B\"\r\n");
        let tm = memory(&[("A", "a")]);
        assert_eq!(rebuild(&lines, &tm), "e \"a\"\ne \"B\"\n");
    }

    #[test]
    fn test_empty_translation_is_not_applied() {
        let lines = ScriptLine::split("e \"A\"");
        let tm = memory(&[("A", "")]);
        assert_eq!(rebuild(&lines, &tm), "e \"A\"");
    }

    #[test]
    fn test_text_after_closing_quote_is_dropped() {
        let lines = ScriptLine::split("e \"Wait.\" with dissolve");
        let tm = memory(&[("Wait.", "Attends.")]);
        assert_eq!(rebuild(&lines, &tm), "e \"Attends.\"");
    }
}
