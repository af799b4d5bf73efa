//! Line-based JSON protocol spoken with the desktop shell over stdin/stdout.
//!
//! Request: `{"id": .., "cmd": "..", "payload": {..}}`
//! Response: `{"id": .., "status": "ok", "payload": {..}}` or
//! `{"id": .., "status": "error", "message": ".."}`.
//! `start_translation` additionally streams `{"id", "event", "payload"}` lines
//! (log / progress / done) before its response.

use serde_json::{json, Value};

use crate::model::entry::ScriptLine;
use crate::model::job::JobConfig;
use crate::model::settings::Settings;
use crate::parsers::renpy;
use crate::services::translation_memory::TranslationMemory;
use crate::services::{encoding, events::ProtocolSink, job, mask, rebuild, translator};

mod command;
use command::Command;

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

fn get_text(payload: &Value) -> &str {
    payload.get("text").and_then(|v| v.as_str()).unwrap_or("")
}

fn memory_from_payload(payload: &Value) -> Result<TranslationMemory, String> {
    match payload.get("memory") {
        None | Some(Value::Null) => Ok(TranslationMemory::new()),
        Some(v) => serde_json::from_value::<TranslationMemory>(v.clone())
            .map_err(|e| format!("payload.memory must map strings to strings: {e}")),
    }
}

fn job_config_from_payload(payload: &Value, settings: &Settings) -> Result<JobConfig, String> {
    let mut cfg: JobConfig = serde_json::from_value(payload.clone())
        .map_err(|e| format!("invalid payload: {e}"))?;

    if payload.get("batch_size").is_none() && payload.get("batchSize").is_none() {
        cfg.batch_size = settings.default_batch_size;
    }

    cfg.validate()?;
    Ok(cfg)
}

pub fn handle(input: &str, settings: &Settings) -> String {
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => {
            return json!({
                "status": "error",
                "message": "invalid json"
            })
            .to_string();
        }
    };

    let id = get_id(&req);
    let payload = get_payload(&req);

    match Command::from(get_cmd(&req)) {
        Command::Ping => ok(id, json!({ "message": "rpy-translator alive" })),

        Command::ParseText => {
            let memory = match memory_from_payload(payload) {
                Ok(m) => m,
                Err(e) => return err(id, e),
            };
            let lines = ScriptLine::split(get_text(payload));
            let classes = renpy::classify_all(&lines);
            let pending = renpy::collect_pending(&lines, &memory);
            ok(id, json!({ "lines": classes, "pending": pending }))
        }

        Command::RebuildText => {
            let memory = match memory_from_payload(payload) {
                Ok(m) => m,
                Err(e) => return err(id, e),
            };
            let lines = ScriptLine::split(get_text(payload));
            let replaced = rebuild::count_replaced(&lines, &memory);
            let output = rebuild::rebuild(&lines, &memory);
            ok(id, json!({ "text": output, "replaced": replaced }))
        }

        Command::MaskText => ok(id, json!(mask::mask(get_text(payload)))),

        Command::UnmaskText => {
            let variables: Vec<String> = match payload.get("variables") {
                None | Some(Value::Null) => Vec::new(),
                Some(v) => match serde_json::from_value(v.clone()) {
                    Ok(vars) => vars,
                    Err(e) => return err(id, format!("payload.variables: {e}")),
                },
            };
            let text = payload.get("text").and_then(|v| v.as_str());
            ok(id, json!({ "text": mask::unmask(text, &variables) }))
        }

        Command::DetectEncoding => {
            let path_str = payload.get("path").and_then(|v| v.as_str()).unwrap_or("");
            if path_str.is_empty() {
                return err(id, "payload.path is required");
            }
            let path = std::path::PathBuf::from(path_str);
            match encoding::detect_from_file(&path) {
                Ok(result) => ok(id, serde_json::to_value(result).unwrap_or(json!({}))),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::StartTranslation => {
            let cfg = match job_config_from_payload(payload, settings) {
                Ok(c) => c,
                Err(e) => return err(id, e),
            };
            let provider = match translator::from_settings(settings) {
                Ok(p) => p,
                Err(e) => return err(id, e.to_string()),
            };

            let sink = ProtocolSink::stdout(id.clone());
            match job::run(&cfg, settings, provider.as_ref(), &sink) {
                Ok(report) => ok(id, json!({ "report": report })),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::Unknown => err(id, "unknown command"),
    }
}
