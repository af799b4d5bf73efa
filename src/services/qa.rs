use crate::services::mask;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct QaIssue {
    pub original: String,
    pub code: String,
    pub message: String,
}

/// Checks a restored translation against the variables that were masked out of it.
pub fn check_tokens(original: &str, translated: &str, variables: &[String]) -> Vec<QaIssue> {
    let mut issues: Vec<QaIssue> = Vec::new();

    if translated.trim().is_empty() && !original.trim().is_empty() {
        issues.push(QaIssue {
            original: original.to_string(),
            code: "EMPTY_TRANSLATION".to_string(),
            message: "service returned an empty translation".to_string(),
        });
        return issues;
    }

    // Token the service mangled into an index we never handed out
    let leftovers = mask::leftover_tokens(translated);
    if !leftovers.is_empty() {
        issues.push(QaIssue {
            original: original.to_string(),
            code: "LEFTOVER_TOKEN".to_string(),
            message: format!("unresolved tokens: {}", leftovers.join(", ")),
        });
    }

    for var in variables {
        if !translated.contains(var.as_str()) {
            issues.push(QaIssue {
                original: original.to_string(),
                code: "MISSING_VARIABLE".to_string(),
                message: format!("{var} was dropped by the translation"),
            });
        }
    }

    issues
}
