pub mod json;
pub mod midi;

use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::SUPPORTED_EXTENSIONS;
use crate::models::NoteEvent;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("MIDI decode error: {0}")]
    Midi(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Load a note stream, choosing the decoder by file extension.
pub fn load_notes(path: &Path) -> Result<Vec<NoteEvent>, InputError> {
    let ext = extension_of(path);
    let notes = match ext.as_str() {
        "json" => json::load(path)?,
        "mid" | "midi" => midi::load(path)?,
        _ => return Err(InputError::UnsupportedFormat(path.display().to_string())),
    };

    log::debug!("Loaded {} notes from {}", notes.len(), path.display());
    Ok(notes)
}

/// Expand the given paths into note files: files are taken as-is, directories
/// are walked recursively for supported extensions. The result is sorted and
/// free of duplicates.
pub fn collect_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.exists() {
            log::warn!("Input path does not exist: {}", path.display());
            continue;
        }
        for entry in WalkDir::new(path).follow_links(true).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let ext = extension_of(entry.path());
            if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    files
}
