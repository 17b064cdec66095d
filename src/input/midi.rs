use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use super::InputError;
use crate::models::NoteEvent;

/// 120 bpm, the Standard MIDI File default until a tempo event says otherwise.
const DEFAULT_TEMPO_US: u32 = 500_000;

pub fn load(path: &Path) -> Result<Vec<NoteEvent>, InputError> {
    let bytes = fs::read(path)?;
    parse(&bytes)
}

enum Clock {
    /// Ticks per quarter note; seconds per tick follows the tempo map
    Metrical { ppq: f64 },
    /// Fixed seconds per tick
    Timecode { seconds_per_tick: f64 },
}

enum NoteChange {
    On { channel: u8, key: u8, velocity: u8 },
    Off { channel: u8, key: u8 },
    Tempo(u32),
}

/// Decode every note of every track into one time-ordered stream.
///
/// Tracks are merged by absolute tick (ties keep track order). Note On
/// with velocity 0 counts as Note Off; repeated Note Ons of a key on one
/// channel are closed first-in first-out; notes still sounding at the end
/// of the file are closed there.
pub fn parse(bytes: &[u8]) -> Result<Vec<NoteEvent>, InputError> {
    let smf = Smf::parse(bytes).map_err(|e| InputError::Midi(e.to_string()))?;

    let clock = match smf.header.timing {
        Timing::Metrical(ppq) if ppq.as_int() > 0 => Clock::Metrical {
            ppq: ppq.as_int() as f64,
        },
        Timing::Metrical(_) => return Err(InputError::Midi("zero ticks per quarter note".into())),
        Timing::Timecode(fps, subframes) => Clock::Timecode {
            seconds_per_tick: 1.0 / (fps.as_f32() as f64 * subframes.max(1) as f64),
        },
    };

    let mut changes: Vec<(u64, NoteChange)> = Vec::new();
    for track in &smf.tracks {
        let mut tick: u64 = 0;
        for event in track {
            tick += event.delta.as_int() as u64;
            let change = match event.kind {
                TrackEventKind::Midi { channel, message } => match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => NoteChange::On {
                        channel: channel.as_int(),
                        key: key.as_int(),
                        velocity: vel.as_int(),
                    },
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => NoteChange::Off {
                        channel: channel.as_int(),
                        key: key.as_int(),
                    },
                    _ => continue,
                },
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => NoteChange::Tempo(tempo.as_int()),
                _ => continue,
            };
            changes.push((tick, change));
        }
    }
    // Stable: same-tick events keep track order
    changes.sort_by_key(|(tick, _)| *tick);

    let mut tempo = DEFAULT_TEMPO_US;
    let mut last_tick: u64 = 0;
    let mut now = 0.0_f64;
    let mut sounding: HashMap<(u8, u8), VecDeque<(f64, u8)>> = HashMap::new();
    let mut notes: Vec<NoteEvent> = Vec::new();

    for (tick, change) in changes {
        let elapsed = (tick - last_tick) as f64;
        now += match clock {
            Clock::Metrical { ppq } => elapsed * tempo as f64 / (1_000_000.0 * ppq),
            Clock::Timecode { seconds_per_tick } => elapsed * seconds_per_tick,
        };
        last_tick = tick;

        match change {
            NoteChange::Tempo(us) if us > 0 => tempo = us,
            NoteChange::Tempo(_) => {}
            NoteChange::On { channel, key, velocity } => {
                sounding.entry((channel, key)).or_default().push_back((now, velocity));
            }
            NoteChange::Off { channel, key } => {
                if let Some((start, velocity)) = sounding.get_mut(&(channel, key)).and_then(|q| q.pop_front()) {
                    notes.push(NoteEvent::new(key, start, now, velocity));
                }
            }
        }
    }

    let mut unterminated = 0;
    for ((_, key), queue) in sounding {
        for (start, velocity) in queue {
            notes.push(NoteEvent::new(key, start, now, velocity));
            unterminated += 1;
        }
    }
    if unterminated > 0 {
        log::debug!("Closed {} unterminated MIDI notes at {:.2}s", unterminated, now);
    }

    notes.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.pitch.cmp(&b.pitch)));
    Ok(notes)
}
