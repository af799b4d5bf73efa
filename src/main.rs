use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rpy_translator::model::job::JobConfig;
use rpy_translator::model::settings::Settings;
use rpy_translator::protocol;
use rpy_translator::services::{events::TracingSink, job, translator};

#[derive(Parser)]
#[command(name = "rpy-translator", version, about = "Batch translator for Ren'Py scripts")]
struct Cli {
    /// Settings file (defaults to ./rpy-translator.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Speak the JSON-line protocol on stdin/stdout (default)
    Serve,

    /// Translate every script under a folder
    Translate {
        folder: PathBuf,

        /// Target language code, e.g. th, ja, pt-BR
        #[arg(short, long)]
        lang: String,

        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Override the provider from the settings file (google, openai, deepseek)
        #[arg(short, long)]
        provider: Option<String>,
    },
}

fn main() -> ExitCode {
    // stdout belongs to the protocol; diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = match &cli.settings {
        Some(p) => Settings::load(p),
        None => Settings::load_default(),
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&settings),
        Commands::Translate {
            folder,
            lang,
            batch_size,
            provider,
        } => {
            if let Some(p) = provider {
                settings.provider = p;
            }
            let cfg = JobConfig {
                folder_path: folder,
                target_lang: lang,
                batch_size: batch_size.unwrap_or(settings.default_batch_size),
            };
            translate(&cfg, &settings)
        }
    }
}

fn serve(settings: &Settings) -> ExitCode {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };

        if line.trim().is_empty() {
            continue;
        }

        let result = std::panic::catch_unwind(|| protocol::handle(&line, settings));

        let response = match result {
            Ok(resp) => resp,
            Err(_) => serde_json::json!({
                "status": "error",
                "message": "internal core error"
            })
            .to_string(),
        };

        if writeln!(stdout, "{response}").is_err() {
            break;
        }

        let _ = stdout.flush();
    }

    ExitCode::SUCCESS
}

fn translate(cfg: &JobConfig, settings: &Settings) -> ExitCode {
    let provider = match translator::from_settings(settings) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match job::run(cfg, settings, provider.as_ref(), &TracingSink) {
        Ok(report) => {
            tracing::info!(
                "{} of {} files written to {} ({} new strings, {} failed chunks)",
                report.files_processed,
                report.files_total,
                report.translated_dir,
                report.strings_translated,
                report.chunks_failed
            );
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}
