use std::fs;
use std::path::{Path, PathBuf};

use rand::{thread_rng, Rng};

use crate::error::{CoreError, Result};
use crate::model::entry::ScriptLine;
use crate::model::job::{Job, JobConfig, JobReport};
use crate::model::settings::Settings;
use crate::parsers::renpy;
use crate::services::{
    encoding,
    events::{EventSink, LogLevel},
    pipeline::{self, PipelineConfig},
    rebuild,
    translation_memory::{store, TranslationMemory},
    translator::Translator,
};

const ORIGINAL_DIR: &str = "Original";
const TRANSLATED_DIR: &str = "Translated";
const ID_ATTEMPTS: usize = 16;

/// Random five-digit job id (10000..=99999).
pub fn generate_id() -> String {
    thread_rng().gen_range(10000..=99999u32).to_string()
}

fn dirs_for(root: &Path, id: &str) -> (PathBuf, PathBuf) {
    (
        root.join(ORIGINAL_DIR).join(id),
        root.join(TRANSLATED_DIR).join(id),
    )
}

/// First candidate whose `Original/<id>` and `Translated/<id>` are both unused.
fn pick_id(root: &Path, candidates: impl IntoIterator<Item = String>) -> Option<String> {
    candidates.into_iter().find(|id| {
        let (o, t) = dirs_for(root, id);
        let free = !o.exists() && !t.exists();
        if !free {
            tracing::debug!("job id {id} already used, rolling again");
        }
        free
    })
}

/// Picks an id whose output directories are still free and creates them.
fn allocate(cfg: &JobConfig, settings: &Settings) -> Result<Job> {
    let root = &settings.output_root;
    let candidates = std::iter::repeat_with(generate_id).take(ID_ATTEMPTS);
    let id = pick_id(root, candidates).ok_or_else(|| {
        CoreError::InvalidConfig(format!(
            "no free job id under {} after {ID_ATTEMPTS} attempts",
            root.display()
        ))
    })?;

    let (original_dir, translated_dir) = dirs_for(root, &id);
    fs::create_dir_all(&original_dir).map_err(|e| CoreError::io(&original_dir, e))?;
    fs::create_dir_all(&translated_dir).map_err(|e| CoreError::io(&translated_dir, e))?;

    Ok(Job {
        id,
        source_folder: cfg.folder_path.clone(),
        target_lang: cfg.target_lang.clone(),
        batch_size: cfg.batch_size.max(1),
        original_dir,
        translated_dir,
    })
}

/// Every `*.<extension>` file under `folder`, recursively.
pub fn find_scripts(folder: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let base = glob::Pattern::escape(&folder.to_string_lossy());
    let pattern = format!("{}/**/*.{}", base.trim_end_matches(['/', '\\']), extension);

    // Hidden folders such as .git are not walked
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..glob::MatchOptions::new()
    };

    let mut files = Vec::new();
    for entry in glob::glob_with(&pattern, options)? {
        match entry {
            Ok(p) if p.is_file() => files.push(p),
            Ok(_) => {}
            Err(e) => tracing::warn!("skipping unreadable path: {e}"),
        }
    }

    Ok(files)
}

/// Runs one translation job over a folder. Always ends with a `done` event.
pub fn run(
    cfg: &JobConfig,
    settings: &Settings,
    translator: &dyn Translator,
    events: &dyn EventSink,
) -> Result<JobReport> {
    let result = run_inner(cfg, settings, translator, events);
    events.done();
    result
}

fn run_inner(
    cfg: &JobConfig,
    settings: &Settings,
    translator: &dyn Translator,
    events: &dyn EventSink,
) -> Result<JobReport> {
    if let Err(e) = cfg.validate() {
        events.log(LogLevel::Error, &e);
        return Err(CoreError::InvalidConfig(e));
    }

    let job = match allocate(cfg, settings) {
        Ok(j) => j,
        Err(e) => {
            events.log(LogLevel::Error, &format!("could not create output folders: {e}"));
            return Err(e);
        }
    };

    let mut memory = store::load(&settings.memory_file);
    if !memory.is_empty() {
        events.log(
            LogLevel::Success,
            &format!("loaded translation memory: {} entries", memory.len()),
        );
    }

    let files = find_scripts(&job.source_folder, &settings.script_extension)?;
    if files.is_empty() {
        let err = CoreError::NoScripts {
            folder: job.source_folder.clone(),
            extension: settings.script_extension.clone(),
        };
        events.log(LogLevel::Error, &format!("{err}!"));
        return Err(err);
    }

    events.log(LogLevel::Info, &format!("📦 job id: {}", job.id));
    events.log(
        LogLevel::Info,
        &format!("📁 originals backed up to: {}/{}", ORIGINAL_DIR, job.id),
    );

    let mut report = JobReport {
        job_id: job.id.clone(),
        files_total: files.len(),
        translated_dir: job.translated_dir.to_string_lossy().to_string(),
        ..JobReport::default()
    };

    for (i, file) in files.iter().enumerate() {
        let relative = file
            .strip_prefix(&job.source_folder)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(file.file_name().unwrap_or_default()));

        match process_file(&job, file, &relative, &mut memory, translator, events) {
            Ok(outcome) => {
                report.files_processed += 1;
                report.strings_translated += outcome.translated;
                report.chunks_failed += outcome.failed_chunks;
            }
            Err(e) => {
                report.files_failed += 1;
                events.log(
                    LogLevel::Error,
                    &format!("skipped {}: {e}", relative.display()),
                );
            }
        }

        events.progress((i + 1) as f64 / files.len() as f64 * 100.0);
    }

    if let Err(e) = store::save(&memory, &settings.memory_file) {
        events.log(
            LogLevel::Error,
            &format!("could not save translation memory: {e}"),
        );
        return Err(e);
    }

    events.log(
        LogLevel::Success,
        &format!(
            "✅ translation finished! files are in: {}/{}",
            TRANSLATED_DIR, job.id
        ),
    );

    Ok(report)
}

struct FileOutcome {
    translated: usize,
    failed_chunks: usize,
}

fn process_file(
    job: &Job,
    file: &Path,
    relative: &Path,
    memory: &mut TranslationMemory,
    translator: &dyn Translator,
    events: &dyn EventSink,
) -> Result<FileOutcome> {
    let backup_path = job.original_dir.join(relative);
    let output_path = job.translated_dir.join(relative);

    ensure_parent(&backup_path)?;
    fs::copy(file, &backup_path).map_err(|e| CoreError::io(&backup_path, e))?;

    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    events.log(LogLevel::Info, &format!("processing: {file_name}"));

    let script = encoding::read_script(file)?;
    let lines = ScriptLine::split(&script.text);

    let pending = renpy::collect_pending(&lines, memory);
    tracing::debug!("{file_name}: {} strings need translation", pending.len());

    let mut outcome = FileOutcome {
        translated: 0,
        failed_chunks: 0,
    };

    if !pending.is_empty() {
        let cfg = PipelineConfig {
            target_lang: &job.target_lang,
            batch_size: job.batch_size,
            file_name: &file_name,
        };
        let r = pipeline::run(&pending, memory, translator, &cfg, events);
        outcome.translated = r.translated;
        outcome.failed_chunks = r.failed_chunks;
    }

    let mut output = rebuild::rebuild(&lines, memory);
    if script.bom {
        output.insert(0, '\u{FEFF}');
    }

    ensure_parent(&output_path)?;
    fs::write(&output_path, output).map_err(|e| CoreError::io(&output_path, e))?;

    Ok(outcome)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
    }
    Ok(())
}
