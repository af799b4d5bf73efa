use std::fs;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use serde::Serialize;

use crate::error::{CoreError, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Serialize)]
pub struct EncodingCandidate {
    pub name: String,
    pub confidence: f32,
}

#[derive(Debug, Serialize)]
pub struct EncodingDetectionResult {
    pub best: String,
    pub confidence: f32,
    pub candidates: Vec<EncodingCandidate>,
}

/// Decoded script text. `bom` records a UTF-8 byte order mark that was
/// stripped from the front so it can be written back.
#[derive(Debug)]
pub struct ScriptText {
    pub text: String,
    pub bom: bool,
}

fn guess(bytes: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

/// Reads a script as text. UTF-8 (with or without BOM) is taken as is; anything
/// else is decoded with the detected legacy encoding.
pub fn read_script(path: &Path) -> Result<ScriptText> {
    let bytes = fs::read(path).map_err(|e| CoreError::io(path, e))?;
    Ok(decode_script(&bytes, path))
}

fn decode_script(bytes: &[u8], path: &Path) -> ScriptText {
    let (bytes, bom) = match bytes.strip_prefix(UTF8_BOM) {
        Some(rest) => (rest, true),
        None => (bytes, false),
    };

    if let Ok(text) = std::str::from_utf8(bytes) {
        return ScriptText {
            text: text.to_string(),
            bom,
        };
    }

    let encoding = guess(bytes);
    tracing::warn!(
        "{} is not UTF-8, decoding as {}",
        path.display(),
        encoding.name()
    );

    let (text, _, _) = encoding.decode(bytes);
    ScriptText {
        text: text.into_owned(),
        bom,
    }
}

pub fn detect_from_file(path: &Path) -> Result<EncodingDetectionResult> {
    let bytes = fs::read(path).map_err(|e| CoreError::io(path, e))?;

    if bytes.starts_with(UTF8_BOM) {
        return Ok(EncodingDetectionResult {
            best: "utf-8-sig".into(),
            confidence: 0.99,
            candidates: vec![
                candidate("utf-8-sig", 0.99),
                candidate("utf-8", 0.90),
            ],
        });
    }

    let encoding = guess(&bytes);
    let best = encoding.name().to_lowercase();
    let confidence = estimate_confidence(&bytes, encoding);

    let mut candidates = vec![candidate(&best, confidence)];

    // Labels the shell may offer for the same bytes
    let aliases: &[(&str, f32)] = match best.as_str() {
        "shift_jis" => &[("windows-31j", 0.03), ("cp932", 0.05)],
        "utf-8" => &[("utf-8-sig", 0.20)],
        _ => &[],
    };
    for (name, penalty) in aliases {
        candidates.push(candidate(name, (confidence - penalty).max(0.0)));
    }

    Ok(EncodingDetectionResult {
        best,
        confidence,
        candidates,
    })
}

fn candidate(name: &str, confidence: f32) -> EncodingCandidate {
    EncodingCandidate {
        name: name.to_string(),
        confidence,
    }
}

fn estimate_confidence(bytes: &[u8], encoding: &'static Encoding) -> f32 {
    let (text, _, had_errors) = encoding.decode(bytes);

    if had_errors {
        return 0.35;
    }

    match text.len() {
        0..=63 => 0.55,
        64..=511 => 0.70,
        512..=4095 => 0.82,
        _ => 0.90,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bom_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.rpy");
        fs::write(&path, b"\xEF\xBB\xBFe \"Hi\"").unwrap();
        let script = read_script(&path).unwrap();
        assert_eq!(script.text, "e \"Hi\"");
        assert!(script.bom);
        assert_eq!(detect_from_file(&path).unwrap().best, "utf-8-sig");
    }

    #[test]
    fn test_plain_utf8_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.rpy");
        fs::write(&path, "e \"สวัสดี\"").unwrap();
        let result = detect_from_file(&path).unwrap();
        assert_eq!(result.best, "utf-8");
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.candidates[1].name, "utf-8-sig");
    }

    #[test]
    fn test_legacy_bytes_are_decoded() {
        let (bytes, _, _) =
            encoding_rs::SHIFT_JIS.encode("e \"こんにちは、世界。今日はいい天気ですね。\"");
        let script = decode_script(&bytes, Path::new("legacy.rpy"));
        assert!(!script.bom);
        let text = script.text;
        assert!(text.starts_with("e \""));
        assert!(!text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_script(Path::new("/definitely/not/here.rpy")).unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
    }
}
