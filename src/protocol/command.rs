#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    ParseText,
    RebuildText,
    MaskText,
    UnmaskText,
    DetectEncoding,
    StartTranslation,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "parse_text" => Command::ParseText,
            "rebuild_text" => Command::RebuildText,
            "mask_text" => Command::MaskText,
            "unmask_text" => Command::UnmaskText,
            "detect_encoding" | "encoding.detect" => Command::DetectEncoding,
            "start_translation" | "start-translation" => Command::StartTranslation,
            _ => Command::Unknown,
        }
    }
}
