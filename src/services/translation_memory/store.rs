use super::TranslationMemory;
use crate::error::{CoreError, Result};
use indexmap::IndexMap;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Loads the memory file. A missing, unreadable or malformed file gives an empty memory.
pub fn load(path: &Path) -> TranslationMemory {
    if !path.exists() {
        return TranslationMemory::new();
    }

    let data = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("[TM] failed to read {}: {e}", path.display());
            return TranslationMemory::new();
        }
    };

    let object: IndexMap<String, serde_json::Value> = match serde_json::from_str(&data) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("[TM] failed to parse {}: {e}", path.display());
            return TranslationMemory::new();
        }
    };

    let mut skipped = 0usize;
    let memory: TranslationMemory = object
        .into_iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::String(s) => Some((k, s)),
            _ => {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        tracing::warn!("[TM] skipped {skipped} non-string entries in {}", path.display());
    }

    memory
}

/// Writes the memory as a pretty-printed JSON object (two-space indent).
pub fn save(memory: &TranslationMemory, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(memory)?;
    write_atomic(path, json.as_bytes())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);

    if let Some(parent) = tmp.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
    }

    fs::write(&tmp, bytes).map_err(|e| CoreError::io(&tmp, e))?;

    if path.exists() {
        fs::remove_file(path).map_err(|e| CoreError::io(path, e))?;
    }

    fs::rename(&tmp, path).map_err(|e| CoreError::io(path, e))?;

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(n) => n.to_string(),
        None => "tm".to_string(),
    };
    p.set_file_name(format!("{file_name}.tmp"));
    p
}
