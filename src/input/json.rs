use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::InputError;
use crate::models::NoteEvent;

/// Accepted layouts: a bare array of notes, or an object with a `notes` array
/// (extra fields such as detector metadata are ignored).
#[derive(Deserialize)]
#[serde(untagged)]
enum NoteFile {
    Bare(Vec<NoteEvent>),
    Wrapped { notes: Vec<NoteEvent> },
}

pub fn load(path: &Path) -> Result<Vec<NoteEvent>, InputError> {
    let contents = fs::read_to_string(path)?;
    parse(&contents)
}

pub fn parse(contents: &str) -> Result<Vec<NoteEvent>, InputError> {
    let file: NoteFile = serde_json::from_str(contents)?;
    Ok(match file {
        NoteFile::Bare(notes) | NoteFile::Wrapped { notes } => notes,
    })
}
