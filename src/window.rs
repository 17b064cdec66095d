use serde::Serialize;

use crate::models::{NoteEvent, Window};

/// Width used when there is nothing to measure strike spacing from.
pub const DEFAULT_WIDTH: f64 = 2.0;
/// An onset this far (seconds) after the previous onset starts a new strike.
pub const STRIKE_GAP: f64 = 0.3;
/// Auto width = this fraction of the mean strike spacing.
const SPACING_RATIO: f64 = 0.8;
const MIN_AUTO_WIDTH: f64 = 0.5;
const MAX_AUTO_WIDTH: f64 = 3.0;

/// How the window width was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pacing {
    /// Caller supplied the width
    Manual,
    /// Too few strikes to measure; default width
    Default,
    /// Auto width below 1s
    Fast,
    /// Auto width 1–2s
    Medium,
    /// Auto width above 2s
    Slow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSizing {
    pub width: f64,
    /// Chord strikes detected (0 for manual widths)
    pub strikes: usize,
    /// Mean spacing between strikes, when there were at least two
    pub mean_gap: Option<f64>,
    pub pacing: Pacing,
}

/// Use `requested` when it is a usable width, otherwise size windows automatically.
pub fn resolve_width(requested: Option<f64>, notes: &[NoteEvent]) -> WindowSizing {
    match requested {
        Some(width) if width.is_finite() && width > 0.0 => WindowSizing {
            width,
            strikes: 0,
            mean_gap: None,
            pacing: Pacing::Manual,
        },
        Some(width) => {
            log::warn!("Ignoring unusable window width {}, auto-sizing instead", width);
            detect_window_width(notes)
        }
        None => detect_window_width(notes),
    }
}

/// Onset times that begin a new chord strike: the first onset, and any
/// onset more than [`STRIKE_GAP`] after the onset before it.
pub fn chord_strikes(notes: &[NoteEvent]) -> Vec<f64> {
    let mut onsets: Vec<f64> = notes.iter().map(|n| n.start).collect();
    onsets.sort_by(f64::total_cmp);

    let mut strikes = Vec::new();
    let mut last = 0.0;
    for (i, &t) in onsets.iter().enumerate() {
        if i == 0 || t - last > STRIKE_GAP {
            strikes.push(t);
        }
        last = t;
    }
    strikes
}

/// Size windows to catch individual strikes: 80% of the mean strike
/// spacing, clamped to 0.5–3.0s.
pub fn detect_window_width(notes: &[NoteEvent]) -> WindowSizing {
    let strikes = chord_strikes(notes);

    if strikes.len() <= 1 {
        log::info!(
            "Detected {} chord strikes → {}s windows",
            strikes.len(),
            DEFAULT_WIDTH
        );
        return WindowSizing {
            width: DEFAULT_WIDTH,
            strikes: strikes.len(),
            mean_gap: None,
            pacing: Pacing::Default,
        };
    }

    let gaps: Vec<f64> = strikes.windows(2).map(|w| w[1] - w[0]).collect();
    let mean_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;
    let width = (mean_gap * SPACING_RATIO).clamp(MIN_AUTO_WIDTH, MAX_AUTO_WIDTH);

    let pacing = if width < 1.0 {
        Pacing::Fast
    } else if width > 2.0 {
        Pacing::Slow
    } else {
        Pacing::Medium
    };

    log::info!(
        "Detected {} chord strikes, mean gap {:.2}s → {:.2}s windows ({:?})",
        strikes.len(),
        mean_gap,
        width,
        pacing
    );

    WindowSizing {
        width,
        strikes: strikes.len(),
        mean_gap: Some(mean_gap),
        pacing,
    }
}

/// Upper bound on windows per stream. A stream that would need more is
/// treated as corrupt timing and produces no windows.
pub const MAX_WINDOWS: usize = 1_000_000;

/// Partition `[0, max note end]` into contiguous windows of `width` seconds
/// (the last one truncated) and attach every overlapping note to each
/// window it touches.
pub fn segment(notes: &[NoteEvent], width: f64) -> Vec<Window> {
    if notes.is_empty() || !(width.is_finite() && width > 0.0) {
        return Vec::new();
    }

    let mut ordered: Vec<&NoteEvent> = notes.iter().collect();
    ordered.sort_by(|a, b| a.start.total_cmp(&b.start));

    let total_duration = ordered
        .iter()
        .map(|n| n.end)
        .fold(f64::NEG_INFINITY, f64::max);
    if !(total_duration.is_finite() && total_duration > 0.0) {
        return Vec::new();
    }

    let count = (total_duration / width).ceil();
    if count > MAX_WINDOWS as f64 {
        log::warn!(
            "Notes run to {:.0}s; {:.0} windows of {:.2}s exceeds the limit of {}, skipping",
            total_duration,
            count,
            width,
            MAX_WINDOWS
        );
        return Vec::new();
    }

    let mut windows = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        let start = i as f64 * width;
        if start >= total_duration {
            break;
        }
        // Next window's start, so neighbours share their boundary exactly
        let end = ((i + 1) as f64 * width).min(total_duration);
        let window_notes: Vec<NoteEvent> = ordered
            .iter()
            .filter(|n| n.overlaps(start, end))
            .map(|&n| n.clone())
            .collect();

        windows.push(Window {
            start,
            end,
            notes: window_notes,
        });
    }

    windows
}
