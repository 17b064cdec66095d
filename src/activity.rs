use crate::config::{ActivityConfig, NoteFilterConfig};
use crate::models::NoteEvent;

/// Drop quiet or very short notes: detector noise and pick/fret artifacts.
pub fn filter_notes(notes: &[NoteEvent], config: &NoteFilterConfig) -> Vec<NoteEvent> {
    let kept: Vec<NoteEvent> = notes
        .iter()
        .filter(|n| n.velocity >= config.min_velocity && n.duration() >= config.min_duration)
        .cloned()
        .collect();

    if kept.len() < notes.len() {
        log::debug!(
            "Filtered out {} noise/artifact notes, {} remain",
            notes.len() - kept.len(),
            kept.len()
        );
    }
    kept
}

/// Does a window's note set look like a played chord rather than silence or noise?
///
/// Tiered: the first failing check rejects (note count → loudness → pitch
/// variety → pitch span).
pub fn is_musical(notes: &[NoteEvent], config: &ActivityConfig) -> bool {
    if notes.len() < config.min_notes {
        return false;
    }

    let total_velocity: u32 = notes.iter().map(|n| n.velocity as u32).sum();
    if total_velocity < config.min_total_velocity {
        return false;
    }

    let mut pitches: Vec<u8> = notes.iter().map(|n| n.pitch).collect();
    pitches.sort_unstable();
    pitches.dedup();
    if pitches.len() < config.min_distinct_pitches {
        return false;
    }

    // A chord voicing never spans more than a few octaves
    let span = match (pitches.first(), pitches.last()) {
        (Some(lo), Some(hi)) => hi - lo,
        _ => 0,
    };
    span <= config.max_pitch_span
}
