use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;

use finagent::models::message::{Message, Transcript};

/// Default directory for recorded transcripts.
pub fn ensure_transcript_dir() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let dir = home_dir.join(".config").join("finagent").join("transcripts");

    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }

    Ok(dir)
}

/// Persist a transcript as JSONL, one message per line.
pub fn persist_transcript(path: &Path, transcript: &Transcript) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for message in &transcript.messages {
        serde_json::to_writer(&mut writer, message)?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn load_transcript(path: &Path) -> Result<Transcript> {
    let reader = BufReader::new(File::open(path)?);
    let mut messages = Vec::new();

    for line in reader.lines() {
        messages.push(serde_json::from_str::<Message>(&line?)?);
    }

    Ok(Transcript::new(messages))
}

/// Load a transcript recorded either as JSONL or as a single JSON
/// object with a `messages` key (the shape external runtimes produce).
pub fn load_any(path: &Path) -> Result<Transcript> {
    let raw = fs::read_to_string(path)?;
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) {
        if value.get("messages").is_some() {
            return Ok(Transcript::from_value(value)?);
        }
    }
    load_transcript(path)
}
