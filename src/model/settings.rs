use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "rpy-translator.json";
pub const API_KEY_ENV: &str = "RPY_TRANSLATOR_API_KEY";

fn default_output_root() -> PathBuf {
    PathBuf::from("MyTranslations")
}

fn default_memory_file() -> PathBuf {
    PathBuf::from("translation_memory.json")
}

fn default_script_extension() -> String {
    "rpy".to_string()
}

fn default_provider() -> String {
    "google".to_string()
}

fn default_batch_size() -> usize {
    10
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    #[serde(default = "default_memory_file")]
    pub memory_file: PathBuf,

    #[serde(default = "default_script_extension")]
    pub script_extension: String,

    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub model: String,

    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            memory_file: default_memory_file(),
            script_extension: default_script_extension(),
            provider: default_provider(),
            api_key: String::new(),
            model: String::new(),
            default_batch_size: default_batch_size(),
        }
    }
}

impl Settings {
    /// Reads the settings file if present. A missing or broken file falls back to defaults.
    pub fn load(path: &Path) -> Settings {
        let mut settings = if path.exists() {
            match fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str::<Settings>(&s).map_err(|e| e.to_string()))
            {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("[settings] ignoring {}: {e}", path.display());
                    Settings::default()
                }
            }
        } else {
            Settings::default()
        };

        if settings.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                settings.api_key = key;
            }
        }

        if settings.default_batch_size == 0 {
            settings.default_batch_size = default_batch_size();
        }

        settings
    }

    pub fn load_default() -> Settings {
        Settings::load(Path::new(SETTINGS_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let s: Settings = serde_json::from_str(r#"{ "provider": "openai", "model": "gpt-4o-mini" }"#).unwrap();
        assert_eq!(s.provider, "openai");
        assert_eq!(s.output_root, PathBuf::from("MyTranslations"));
        assert_eq!(s.memory_file, PathBuf::from("translation_memory.json"));
        assert_eq!(s.script_extension, "rpy");
        assert_eq!(s.default_batch_size, 10);
    }

    #[test]
    fn test_broken_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "{ not json").unwrap();

        let s = Settings::load(&path);
        assert_eq!(s.script_extension, "rpy");
        assert_eq!(s.provider, "google");
    }
}
