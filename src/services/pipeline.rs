use crate::error::TranslateError;
use crate::services::{
    events::{EventSink, LogLevel},
    mask::{self, MaskedString},
    qa::{self, QaIssue},
    translation_memory::TranslationMemory,
    translator::Translator,
};

pub struct PipelineConfig<'a> {
    pub target_lang: &'a str,
    pub batch_size: usize,
    /// Only used to give log lines some context.
    pub file_name: &'a str,
}

#[derive(Debug, Default, serde::Serialize)]
pub struct PipelineReport {
    pub chunks: usize,
    pub failed_chunks: usize,
    pub translated: usize,
    pub qa_issues: Vec<QaIssue>,
}

/// Translates `pending` chunk by chunk and stores every result in `memory`.
///
/// A failed chunk is logged and skipped: its strings stay out of the memory and
/// the next chunk is tried.
pub fn run(
    pending: &[String],
    memory: &mut TranslationMemory,
    translator: &dyn Translator,
    cfg: &PipelineConfig,
    events: &dyn EventSink,
) -> PipelineReport {
    let mut report = PipelineReport::default();

    for chunk in pending.chunks(cfg.batch_size.max(1)) {
        report.chunks += 1;

        let masked: Vec<MaskedString> = chunk.iter().map(|t| mask::mask(t)).collect();
        let texts: Vec<String> = masked.iter().map(|m| m.masked.clone()).collect();

        tracing::debug!(
            "[{}] sending chunk {} ({} strings) to {}",
            cfg.file_name,
            report.chunks,
            texts.len(),
            translator.provider_name()
        );

        let results = match translator
            .translate_batch(&texts, cfg.target_lang)
            .and_then(|r| check_len(r, chunk.len()))
        {
            Ok(r) => r,
            Err(e) => {
                report.failed_chunks += 1;
                events.log(
                    LogLevel::Error,
                    &format!("⚠️ translation failed in {}: {e}", cfg.file_name),
                );
                continue;
            }
        };

        for ((original, m), result) in chunk.iter().zip(masked.iter()).zip(results.iter()) {
            let restored = mask::unmask(Some(result), &m.variables);

            for issue in qa::check_tokens(original, &restored, &m.variables) {
                events.log(
                    LogLevel::Warning,
                    &format!("{}: {} ({:?})", cfg.file_name, issue.message, issue.original),
                );
                report.qa_issues.push(issue);
            }

            if !restored.is_empty() {
                report.translated += 1;
            }
            memory.insert(original.clone(), restored);
        }
    }

    report
}

fn check_len(results: Vec<String>, expected: usize) -> Result<Vec<String>, TranslateError> {
    if results.len() != expected {
        return Err(TranslateError::LengthMismatch {
            expected,
            got: results.len(),
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::events::NoopSink;
    use std::cell::RefCell;

    /// Uppercases everything and remembers each chunk it was given.
    struct Upper {
        calls: RefCell<Vec<Vec<String>>>,
        fail_on_call: Option<usize>,
    }

    impl Upper {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_on_call: None,
            }
        }
    }

    impl Translator for Upper {
        fn translate_batch(
            &self,
            texts: &[String],
            _target_lang: &str,
        ) -> Result<Vec<String>, TranslateError> {
            let mut calls = self.calls.borrow_mut();
            calls.push(texts.to_vec());
            if self.fail_on_call == Some(calls.len()) {
                return Err(TranslateError::InvalidResponse("stub failure".into()));
            }
            Ok(texts.iter().map(|t| t.to_uppercase()).collect())
        }

        fn provider_name(&self) -> &str {
            "upper"
        }
    }

    struct Short;

    impl Translator for Short {
        fn translate_batch(
            &self,
            _texts: &[String],
            _target_lang: &str,
        ) -> Result<Vec<String>, TranslateError> {
            Ok(vec!["only one".to_string()])
        }

        fn provider_name(&self) -> &str {
            "short"
        }
    }

    fn cfg(batch_size: usize) -> PipelineConfig<'static> {
        PipelineConfig {
            target_lang: "th",
            batch_size,
            file_name: "script.rpy",
        }
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_chunks_of_two_two_one() {
        let stub = Upper::new();
        let mut memory = TranslationMemory::new();
        let pending = strings(&["a", "b", "c", "d", "e"]);

        let report = run(&pending, &mut memory, &stub, &cfg(2), &NoopSink);

        let sizes: Vec<usize> = stub.calls.borrow().iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(stub.calls.borrow()[2], strings(&["e"]));
        assert_eq!(report.chunks, 3);
        assert_eq!(report.translated, 5);
        assert_eq!(memory.get("c"), Some("C"));
    }

    #[test]
    fn test_variables_never_reach_the_service() {
        let stub = Upper::new();
        let mut memory = TranslationMemory::new();
        let pending = strings(&["hello [name], {b}go{/b}"]);

        run(&pending, &mut memory, &stub, &cfg(10), &NoopSink);

        assert_eq!(stub.calls.borrow()[0], strings(&["hello __0__, __1__go__2__"]));
        assert_eq!(
            memory.get("hello [name], {b}go{/b}"),
            Some("HELLO [name], {b}GO{/b}")
        );
    }

    #[test]
    fn test_failed_chunk_is_skipped() {
        let stub = Upper {
            calls: RefCell::new(Vec::new()),
            fail_on_call: Some(2),
        };
        let mut memory = TranslationMemory::new();
        let pending = strings(&["a", "b", "c", "d", "e"]);

        let report = run(&pending, &mut memory, &stub, &cfg(2), &NoopSink);

        assert_eq!(report.failed_chunks, 1);
        assert_eq!(stub.calls.borrow().len(), 3);
        assert!(memory.contains("a") && memory.contains("b") && memory.contains("e"));
        assert!(!memory.contains("c"));
        assert!(!memory.contains("d"));
    }

    #[test]
    fn test_length_mismatch_fails_whole_chunk() {
        let mut memory = TranslationMemory::new();
        let pending = strings(&["a", "b"]);

        let report = run(&pending, &mut memory, &Short, &cfg(10), &NoopSink);

        assert_eq!(report.failed_chunks, 1);
        assert!(memory.is_empty());
    }

    #[test]
    fn test_nothing_pending_makes_no_calls() {
        let stub = Upper::new();
        let mut memory = TranslationMemory::new();

        let report = run(&[], &mut memory, &stub, &cfg(3), &NoopSink);

        assert!(stub.calls.borrow().is_empty());
        assert_eq!(report.chunks, 0);
    }
}
