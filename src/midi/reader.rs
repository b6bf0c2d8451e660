// MIDI Import - Standard MIDI File to second-based notes
// Builds a tempo map, pairs note on/off events and flattens every track

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::HashMap;
use std::path::Path;

use super::MidiError;
use crate::codec::Note;

/// Microseconds per quarter note until the first tempo event
const DEFAULT_US_PER_QUARTER: u32 = 500_000;

/// Parse a Standard MIDI File and return its notes
///
/// Notes from all tracks and channels are returned in one list, grouped by
/// track and ordered by release within a track. Notes that are never
/// released are dropped.
pub fn parse_notes(bytes: &[u8]) -> Result<Vec<Note>, MidiError> {
    let smf = Smf::parse(bytes)?;
    let clock = TickClock::new(&smf)?;

    let mut notes = Vec::new();
    for track in &smf.tracks {
        collect_track_notes(track, &clock, &mut notes);
    }

    log::debug!(
        "Parsed {} notes from {} tracks",
        notes.len(),
        smf.tracks.len()
    );

    Ok(notes)
}

/// Read and parse a MIDI file from disk
pub fn read_midi_file(path: &Path) -> Result<Vec<Note>, MidiError> {
    let bytes = std::fs::read(path)?;
    parse_notes(&bytes)
}

fn collect_track_notes(track: &[midly::TrackEvent], clock: &TickClock, notes: &mut Vec<Note>) {
    // (channel, key) -> [(start tick, velocity)] still sounding
    let mut open: HashMap<(u8, u8), Vec<(u64, u8)>> = HashMap::new();
    let mut tick: u64 = 0;

    for event in track {
        tick += event.delta.as_int() as u64;

        let TrackEventKind::Midi { channel, message } = event.kind else {
            continue;
        };
        let channel = channel.as_int();

        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                open.entry((channel, key.as_int()))
                    .or_default()
                    .push((tick, vel.as_int()));
            }
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                let slot = (channel, key.as_int());
                let Some(sounding) = open.remove(&slot) else {
                    continue;
                };

                // Notes that began on this very tick survive the release,
                // unless nothing else was released with it
                let (keep, close): (Vec<_>, Vec<_>) =
                    sounding.into_iter().partition(|(start, _)| *start == tick);

                for (start, velocity) in &close {
                    notes.push(Note {
                        pitch: key.as_int() as i32,
                        velocity: *velocity as i32,
                        start: clock.seconds(*start),
                        end: clock.seconds(tick),
                    });
                }

                if !close.is_empty() && !keep.is_empty() {
                    open.insert(slot, keep);
                }
            }
            _ => {}
        }
    }
}

/// Converts absolute ticks to seconds
enum TickClock {
    /// Tempo segments in ascending tick order
    Metrical { segments: Vec<TempoSegment> },
    Timecode {
        seconds_per_tick: f64,
    },
}

struct TempoSegment {
    start_tick: u64,
    start_seconds: f64,
    seconds_per_tick: f64,
}

impl TickClock {
    fn new(smf: &Smf) -> Result<Self, MidiError> {
        match smf.header.timing {
            Timing::Metrical(ticks_per_beat) => {
                let ticks_per_beat = ticks_per_beat.as_int() as f64;
                if ticks_per_beat <= 0.0 {
                    return Err(MidiError::UnsupportedTiming(
                        "zero ticks per beat".to_string(),
                    ));
                }
                Ok(TickClock::Metrical {
                    segments: build_tempo_map(smf, ticks_per_beat),
                })
            }
            Timing::Timecode(fps, subframes) => {
                let ticks_per_second = fps.as_f32() as f64 * subframes as f64;
                if ticks_per_second <= 0.0 {
                    return Err(MidiError::UnsupportedTiming(format!(
                        "timecode {} fps x {} subframes",
                        fps.as_f32(),
                        subframes
                    )));
                }
                Ok(TickClock::Timecode {
                    seconds_per_tick: 1.0 / ticks_per_second,
                })
            }
        }
    }

    fn seconds(&self, tick: u64) -> f64 {
        match self {
            TickClock::Metrical { segments } => {
                // Never empty: the first segment starts at tick 0
                let index = segments
                    .partition_point(|segment| segment.start_tick <= tick)
                    .saturating_sub(1);
                let segment = &segments[index];
                segment.start_seconds + (tick - segment.start_tick) as f64 * segment.seconds_per_tick
            }
            TickClock::Timecode { seconds_per_tick } => tick as f64 * seconds_per_tick,
        }
    }
}

/// Gather tempo changes from every track into cumulative segments
fn build_tempo_map(smf: &Smf, ticks_per_beat: f64) -> Vec<TempoSegment> {
    let mut changes: Vec<(u64, u32)> = Vec::new();
    for track in &smf.tracks {
        let mut tick: u64 = 0;
        for event in track {
            tick += event.delta.as_int() as u64;
            if let TrackEventKind::Meta(MetaMessage::Tempo(us_per_quarter)) = event.kind {
                changes.push((tick, us_per_quarter.as_int()));
            }
        }
    }
    // Stable: same-tick changes keep track order, the last one wins
    changes.sort_by_key(|(tick, _)| *tick);

    let mut segments = vec![TempoSegment {
        start_tick: 0,
        start_seconds: 0.0,
        seconds_per_tick: seconds_per_tick(DEFAULT_US_PER_QUARTER, ticks_per_beat),
    }];

    for (tick, us_per_quarter) in changes {
        let current = &segments[segments.len() - 1];
        let start_seconds =
            current.start_seconds + (tick - current.start_tick) as f64 * current.seconds_per_tick;
        let segment = TempoSegment {
            start_tick: tick,
            start_seconds,
            seconds_per_tick: seconds_per_tick(us_per_quarter, ticks_per_beat),
        };

        if current.start_tick == tick {
            let last = segments.len() - 1;
            segments[last] = segment;
        } else {
            segments.push(segment);
        }
    }

    segments
}

fn seconds_per_tick(us_per_quarter: u32, ticks_per_beat: f64) -> f64 {
    us_per_quarter as f64 / 1_000_000.0 / ticks_per_beat
}
