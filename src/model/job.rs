use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_batch_size() -> usize {
    10
}

/// What the shell hands over when a translation run is started.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobConfig {
    #[serde(default, alias = "folderPath")]
    pub folder_path: PathBuf,

    #[serde(default, alias = "targetLang")]
    pub target_lang: String,

    #[serde(default = "default_batch_size", alias = "batchSize")]
    pub batch_size: usize,
}

impl JobConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.folder_path.as_os_str().is_empty() {
            return Err("folder_path is required".into());
        }
        if self.target_lang.trim().is_empty() {
            return Err("target_lang is required".into());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub source_folder: PathBuf,
    pub target_lang: String,
    pub batch_size: usize,
    pub original_dir: PathBuf,
    pub translated_dir: PathBuf,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct JobReport {
    pub job_id: String,
    pub files_total: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub strings_translated: usize,
    pub chunks_failed: usize,
    pub translated_dir: String,
}
