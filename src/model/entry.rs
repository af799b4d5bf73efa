use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub index: usize,
    pub text: String,
}

impl ScriptLine {
    /// Splits file content on `\r?\n`. A trailing newline yields a final empty line,
    /// so joining the lines back with `\n` reproduces the content with LF endings.
    pub fn split(content: &str) -> Vec<ScriptLine> {
        content
            .split('\n')
            .enumerate()
            .map(|(index, raw)| ScriptLine {
                index,
                text: raw.strip_suffix('\r').unwrap_or(raw).to_string(),
            })
            .collect()
    }
}

/// A quoted literal found on a translatable line.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ExtractedString {
    /// Kept untrimmed: it is the translation memory key.
    pub literal: String,

    /// Everything before the opening quote (indent + statement keyword).
    pub prefix: String,

    pub line_index: usize,
}

impl ExtractedString {
    pub fn is_blank(&self) -> bool {
        self.literal.trim().is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineClass {
    NoMatch,
    /// Matched the quote pattern but is an `old` source line or a comment.
    Excluded,
    Translatable(ExtractedString),
}

impl LineClass {
    /// The literal of a translatable line, if it is not blank.
    pub fn literal(&self) -> Option<&ExtractedString> {
        match self {
            LineClass::Translatable(e) if !e.is_blank() => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_normalizes_crlf() {
        let lines = ScriptLine::split("a\r\nb\nc\r\n");
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c", ""]);
        assert_eq!(lines[2].index, 2);
    }

    #[test]
    fn test_blank_literal_has_no_literal() {
        let class = LineClass::Translatable(ExtractedString {
            literal: "   ".to_string(),
            prefix: "    ".to_string(),
            line_index: 0,
        });
        assert!(class.literal().is_none());
        assert!(LineClass::Excluded.literal().is_none());
    }
}
