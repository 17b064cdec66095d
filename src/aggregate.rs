use std::collections::HashMap;

use crate::config::AggregationConfig;
use crate::models::{ChordEvent, ChordSegment};

/// Turn per-window chord segments into chord events ("plays").
///
/// Consecutive same-chord segments are grouped into one event, short
/// fragments that repeat the previous event's chord are folded back into
/// it, and every event is numbered by how many times its chord has been
/// played so far.
pub fn aggregate(segments: &[ChordSegment], config: &AggregationConfig) -> Vec<ChordEvent> {
    let grouped = group_segments(segments, config);
    let grouped_len = grouped.len();
    let mut events = merge_short_events(grouped, config);
    number_plays(&mut events);

    log::debug!(
        "{} segments → {} groups → {} chord events",
        segments.len(),
        grouped_len,
        events.len()
    );
    events
}

fn is_weak(segment: &ChordSegment, config: &AggregationConfig) -> bool {
    segment.chord.is_silence() || segment.note_count < config.min_segment_notes
}

fn close_group(start: &ChordSegment, end: f64, total_notes: usize) -> ChordEvent {
    ChordEvent {
        start: start.start,
        end,
        chord: start.chord.clone(),
        play_number: 0,
        duration: end - start.start,
        total_notes,
    }
}

/// Greedy left-to-right grouping. A group keeps growing while the next
/// segment has the same chord, enough notes, and starts no more than
/// `max_group_gap` after the group's end. Silence and weak segments never
/// start a group.
fn group_segments(segments: &[ChordSegment], config: &AggregationConfig) -> Vec<ChordEvent> {
    let mut events = Vec::new();
    let mut i = 0;

    while i < segments.len() {
        let first = &segments[i];
        if is_weak(first, config) {
            i += 1;
            continue;
        }

        let mut end = first.end;
        let mut total_notes = first.note_count;
        let mut j = i + 1;

        while let Some(next) = segments.get(j) {
            if next.chord != first.chord || next.note_count < config.min_segment_notes {
                break;
            }
            if next.start - end > config.max_group_gap {
                break;
            }
            end = next.end;
            total_notes += next.note_count;
            j += 1;
        }

        events.push(close_group(first, end, total_notes));
        i = j;
    }

    events
}

/// Fold a short event into the previous one when it repeats the same chord
/// shortly after it ended.
fn merge_short_events(events: Vec<ChordEvent>, config: &AggregationConfig) -> Vec<ChordEvent> {
    let mut merged: Vec<ChordEvent> = Vec::with_capacity(events.len());

    for event in events {
        if let Some(last) = merged.last_mut() {
            if event.chord == last.chord
                && event.duration < config.short_event_duration
                && event.start - last.end < config.short_event_gap
            {
                last.end = event.end;
                last.duration = last.end - last.start;
                last.total_notes += event.total_notes;
                log::debug!("Merged short {} fragment at {:.2}s into previous play", event.chord, event.start);
                continue;
            }
        }
        merged.push(event);
    }

    merged
}

/// Running 1-based occurrence count per chord label, in time order.
fn number_plays(events: &mut [ChordEvent]) {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for event in events.iter_mut() {
        let count = counts.entry(event.chord.as_str().to_string()).or_insert(0);
        *count += 1;
        event.play_number = *count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChordLabel;

    fn seg(start: f64, end: f64, chord: &str, note_count: usize) -> ChordSegment {
        ChordSegment {
            start,
            end,
            chord: ChordLabel::new(chord),
            note_count,
        }
    }

    fn run(segments: &[ChordSegment]) -> Vec<ChordEvent> {
        aggregate(segments, &AggregationConfig::default())
    }

    #[test]
    fn empty_input() {
        assert!(run(&[]).is_empty());
    }

    #[test]
    fn contiguous_same_chord_becomes_one_event() {
        let events = run(&[seg(0.0, 1.0, "G", 3), seg(1.0, 2.0, "G", 4), seg(2.0, 3.0, "G", 3)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start, 0.0);
        assert_eq!(events[0].end, 3.0);
        assert_eq!(events[0].duration, 3.0);
        assert_eq!(events[0].total_notes, 10);
        assert_eq!(events[0].play_number, 1);
    }

    #[test]
    fn group_gap_boundary() {
        // Exactly 1.0s gap still groups
        let events = run(&[seg(0.0, 1.0, "G", 3), seg(2.0, 3.0, "G", 3)]);
        assert_eq!(events.len(), 1);

        // 1.01s splits; the second group is long enough to stay separate
        let events = run(&[seg(0.0, 1.0, "G", 3), seg(2.01, 3.01, "G", 3)]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].play_number, 2);
    }

    #[test]
    fn am_held_then_restruck() {
        let events = run(&[seg(0.0, 2.0, "Am", 4), seg(2.0, 3.5, "Am", 4), seg(5.0, 6.0, "Am", 3)]);
        assert_eq!(events.len(), 2);
        assert_eq!((events[0].start, events[0].end), (0.0, 3.5));
        assert_eq!(events[0].play_number, 1);
        assert_eq!((events[1].start, events[1].end), (5.0, 6.0));
        assert_eq!(events[1].play_number, 2);
    }

    #[test]
    fn short_tail_after_small_gap_joins_the_play() {
        let events = run(&[seg(0.0, 2.0, "G", 4), seg(2.3, 2.7, "G", 2)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].end, 2.7);
        assert_eq!(events[0].play_number, 1);
        assert_eq!(events[0].total_notes, 6);
    }

    #[test]
    fn silence_and_weak_segments_are_skipped() {
        let events = run(&[
            seg(0.0, 1.0, "Silence", 0),
            seg(1.0, 2.0, "C", 1),
            seg(2.0, 3.0, "C", 3),
            seg(3.0, 4.0, "Silence", 0),
        ]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start, 2.0);
        assert_eq!(events[0].end, 3.0);
    }

    #[test]
    fn weak_segment_breaks_a_group() {
        let events = run(&[seg(0.0, 1.0, "C", 3), seg(1.0, 2.0, "C", 1), seg(2.0, 3.0, "C", 3)]);
        // Two groups, each 1.0s long, so no short-event repair
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].end, 1.0);
        assert_eq!(events[1].start, 2.0);
        assert_eq!(events[1].play_number, 2);
    }

    #[test]
    fn short_fragment_folds_into_previous_play() {
        let events = run(&[
            seg(0.0, 2.0, "Am", 4),
            seg(2.0, 3.0, "E", 3),
            seg(3.0, 3.5, "E", 2),
        ]);
        // The two E segments group directly; nothing to repair
        assert_eq!(events.len(), 2);

        let events = run(&[seg(0.0, 2.0, "Am", 4), seg(3.2, 3.7, "Am", 3)]);
        // 1.2s gap splits the group, then the 0.5s fragment merges back
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].end, 3.7);
        assert!((events[0].duration - 3.7).abs() < 1e-9);
        assert_eq!(events[0].total_notes, 7);
    }

    #[test]
    fn short_fragment_needs_close_gap() {
        // 1.5s gap is not < 1.5
        let events = run(&[seg(0.0, 2.0, "Am", 4), seg(3.5, 4.0, "Am", 3)]);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn long_repeat_is_a_new_play() {
        let events = run(&[seg(0.0, 2.0, "D", 4), seg(3.2, 4.2, "D", 4)]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].play_number, 1);
        assert_eq!(events[1].play_number, 2);
    }

    #[test]
    fn play_numbers_count_per_chord() {
        let events = run(&[
            seg(0.0, 1.0, "G", 3),
            seg(1.0, 2.0, "C", 3),
            seg(2.0, 3.0, "G", 3),
            seg(3.0, 4.0, "D", 3),
            seg(4.0, 5.0, "G", 3),
        ]);
        let plays: Vec<(&str, u32)> = events.iter().map(|e| (e.chord.as_str(), e.play_number)).collect();
        assert_eq!(plays, vec![("G", 1), ("C", 1), ("G", 2), ("D", 1), ("G", 3)]);
    }

    #[test]
    fn renumbering_after_merge_has_no_gaps() {
        let events = run(&[
            seg(0.0, 2.0, "A", 4),
            seg(3.1, 3.5, "A", 2),
            seg(3.5, 5.0, "E", 4),
            seg(5.0, 7.0, "A", 4),
        ]);
        let plays: Vec<(&str, u32)> = events.iter().map(|e| (e.chord.as_str(), e.play_number)).collect();
        assert_eq!(plays, vec![("A", 1), ("E", 1), ("A", 2)]);
    }

    #[test]
    fn events_do_not_overlap() {
        let events = run(&[
            seg(0.0, 1.0, "G", 3),
            seg(1.0, 2.0, "Em", 3),
            seg(2.0, 3.0, "C", 3),
            seg(3.0, 4.0, "D", 3),
        ]);
        for pair in events.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }
}
