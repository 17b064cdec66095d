use crate::config::DedupConfig;
use crate::models::NoteEvent;

/// Clean a raw detector note stream: drop malformed notes, sort by onset,
/// remove near-duplicate detections, then join same-pitch notes separated
/// by a tiny gap.
///
/// The input is never modified; the result is a fresh, time-sorted list.
pub fn normalize(notes: &[NoteEvent], config: &DedupConfig) -> Vec<NoteEvent> {
    let mut sorted: Vec<NoteEvent> = notes
        .iter()
        .filter(|n| n.is_well_formed())
        .cloned()
        .collect();

    let malformed = notes.len() - sorted.len();
    if malformed > 0 {
        log::debug!("Dropped {} malformed notes", malformed);
    }

    // Stable: equal onsets keep detector order
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let deduped = remove_duplicates(sorted, config);
    let merged = merge_same_pitch(deduped, config.merge_gap);

    log::debug!("Normalized {} notes → {}", notes.len(), merged.len());
    merged
}

fn is_duplicate(a: &NoteEvent, b: &NoteEvent, config: &DedupConfig) -> bool {
    (a.start - b.start).abs() < config.start_tolerance
        && (a.pitch as i16 - b.pitch as i16).abs() < config.pitch_tolerance as i16
}

fn confidence(note: &NoteEvent) -> f64 {
    note.confidence.unwrap_or(0.0)
}

/// The first kept note within tolerance decides: a strictly more confident
/// newcomer replaces it, otherwise the newcomer is dropped.
fn remove_duplicates(sorted: Vec<NoteEvent>, config: &DedupConfig) -> Vec<NoteEvent> {
    let mut kept: Vec<NoteEvent> = Vec::with_capacity(sorted.len());

    for note in sorted {
        match kept.iter().position(|existing| is_duplicate(existing, &note, config)) {
            Some(idx) if confidence(&note) > confidence(&kept[idx]) => {
                kept.remove(idx);
                kept.push(note);
            }
            Some(_) => {}
            None => kept.push(note),
        }
    }

    kept
}

/// Join runs of adjacent same-pitch notes whose gap is below `max_gap`.
fn merge_same_pitch(notes: Vec<NoteEvent>, max_gap: f64) -> Vec<NoteEvent> {
    let mut merged: Vec<NoteEvent> = Vec::with_capacity(notes.len());

    for note in notes {
        if let Some(current) = merged.last_mut() {
            if current.pitch == note.pitch && note.start - current.end < max_gap {
                current.end = current.end.max(note.end);
                current.velocity = current.velocity.max(note.velocity);
                continue;
            }
        }
        merged.push(note);
    }

    merged
}
