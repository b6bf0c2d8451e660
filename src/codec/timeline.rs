// Note Extractor - Buckets notes by onset tick
// Turns second-based notes into an ascending tick -> notes timeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A note with start and end in seconds
///
/// This is what the MIDI reader hands to the encoder and what the decoder
/// hands to the MIDI writer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// MIDI key number
    pub pitch: i32,

    /// MIDI velocity
    pub velocity: i32,

    /// Onset in seconds
    pub start: f64,

    /// Release in seconds (may precede `start` for malformed input)
    pub end: f64,
}

impl Note {
    pub fn new(pitch: i32, velocity: i32, start: f64, end: f64) -> Self {
        Note {
            pitch,
            velocity,
            start,
            end,
        }
    }
}

/// A note placed on the tick grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch: i32,
    pub velocity: i32,
    pub start_tick: i64,
    pub end_tick: i64,
}

impl NoteEvent {
    /// Length in ticks; negative when the note ends before it starts
    pub fn duration_ticks(&self) -> i64 {
        self.end_tick - self.start_tick
    }
}

/// Notes grouped by onset tick, iterated in ascending tick order
///
/// Every bucket holds at least one note, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    buckets: BTreeMap<i64, Vec<NoteEvent>>,
}

impl Timeline {
    pub fn new() -> Self {
        Timeline::default()
    }

    /// Discretize `notes` at `fs` ticks per second and bucket them by onset
    pub fn from_notes(notes: &[Note], fs: f64) -> Self {
        let mut timeline = Timeline::new();

        for note in notes {
            timeline.insert(NoteEvent {
                pitch: note.pitch,
                velocity: note.velocity,
                start_tick: to_tick(note.start, fs),
                end_tick: to_tick(note.end, fs),
            });
        }

        timeline
    }

    /// Append a note to the bucket at its start tick
    pub fn insert(&mut self, event: NoteEvent) {
        self.buckets.entry(event.start_tick).or_default().push(event);
    }

    /// (tick, notes) pairs in ascending tick order
    pub fn iter(&self) -> impl Iterator<Item = (i64, &[NoteEvent])> {
        self.buckets
            .iter()
            .map(|(tick, events)| (*tick, events.as_slice()))
    }

    /// Number of distinct onset ticks
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn note_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

fn to_tick(seconds: f64, fs: f64) -> i64 {
    (fs * seconds).floor() as i64
}
