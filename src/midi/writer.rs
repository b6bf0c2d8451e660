// MIDI Export - Decoded notes to a Standard MIDI File using midly
// One meta track plus a single piano track holding every note

use midly::{Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::MidiError;
use crate::codec::Note;

/// General MIDI program for Acoustic Grand Piano
const PIANO_PROGRAM: u8 = 0;

/// MIDI export options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MidiExportOptions {
    /// Pulses per quarter note (PPQ) - typically 480 or 960
    pub ppq: u16,

    /// Include tempo metadata
    pub include_tempo: bool,

    /// Include a 4/4 time signature
    pub include_time_signature: bool,

    /// Include track names
    pub track_names: bool,
}

impl Default for MidiExportOptions {
    fn default() -> Self {
        MidiExportOptions {
            ppq: 480,
            include_tempo: true,
            include_time_signature: true,
            track_names: true,
        }
    }
}

/// Export notes to MIDI file bytes
///
/// Note times are seconds at `tempo` BPM. Onsets before zero are moved to
/// zero, notes shorter than one tick (including releases before the onset)
/// are held for one tick, and pitch and
/// velocity are clamped to the MIDI range.
pub fn export_midi(notes: &[Note], tempo: f64, options: &MidiExportOptions) -> Result<Vec<u8>, MidiError> {
    crate::codec::config::validate_tempo(tempo)?;

    let header = Header {
        format: midly::Format::Parallel,
        timing: Timing::Metrical(options.ppq.into()),
    };

    let ticks_per_second = options.ppq as f64 * tempo / 60.0;

    // Track 0: tempo and time signature metadata
    let mut meta_track = Track::new();
    if options.track_names {
        add_track_name(&mut meta_track, "META");
    }
    if options.include_tempo {
        add_tempo(&mut meta_track, tempo);
    }
    if options.include_time_signature {
        add_time_signature(&mut meta_track);
    }
    add_end_of_track(&mut meta_track, 0);

    let piano_track = create_piano_track(notes, ticks_per_second, options);

    let smf = Smf {
        header,
        tracks: vec![meta_track, piano_track],
    };

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;

    log::debug!("Exported {} notes as {} MIDI bytes", notes.len(), bytes.len());

    Ok(bytes)
}

/// Export notes and write them to `path`
pub fn write_midi_file(
    path: &Path,
    notes: &[Note],
    tempo: f64,
    options: &MidiExportOptions,
) -> Result<(), MidiError> {
    let bytes = export_midi(notes, tempo, options)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn create_piano_track(notes: &[Note], ticks_per_second: f64, options: &MidiExportOptions) -> Track<'static> {
    let mut track = Track::new();

    if options.track_names {
        add_track_name(&mut track, "Piano");
    }
    track.push(TrackEvent {
        delta: 0u32.into(),
        kind: TrackEventKind::Midi {
            channel: 0.into(),
            message: MidiMessage::ProgramChange {
                program: PIANO_PROGRAM.into(),
            },
        },
    });

    // (tick, is_note_on, event); offs sort ahead of ons on the same tick
    let mut events: Vec<(u32, bool, TrackEventKind<'static>)> = Vec::with_capacity(notes.len() * 2);

    for note in notes {
        let key = note.pitch.clamp(0, 127) as u8;
        let vel = note.velocity.clamp(1, 127) as u8;
        let tick_on = seconds_to_tick(note.start, ticks_per_second);
        // A note always sounds for at least one tick, so its own off never
        // shares a tick with its on
        let tick_off = seconds_to_tick(note.end, ticks_per_second).max(tick_on.saturating_add(1));

        events.push((
            tick_on,
            true,
            TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOn {
                    key: key.into(),
                    vel: vel.into(),
                },
            },
        ));
        events.push((
            tick_off,
            false,
            TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOff {
                    key: key.into(),
                    vel: 0.into(),
                },
            },
        ));
    }

    events.sort_by_key(|(tick, is_on, _)| (*tick, *is_on));

    // Convert to delta times
    let mut last_tick = 0;
    for (tick, _, kind) in events {
        let delta = tick.saturating_sub(last_tick);
        track.push(TrackEvent {
            delta: delta.into(),
            kind,
        });
        last_tick = tick;
    }

    add_end_of_track(&mut track, 0);
    track
}

fn seconds_to_tick(seconds: f64, ticks_per_second: f64) -> u32 {
    let tick = (seconds * ticks_per_second).round();
    if tick <= 0.0 {
        0
    } else {
        tick.min(u32::MAX as f64) as u32
    }
}

fn add_track_name(track: &mut Track<'static>, name: &'static str) {
    track.push(TrackEvent {
        delta: 0u32.into(),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
    });
}

/// Add tempo meta message
fn add_tempo(track: &mut Track<'_>, bpm: f64) {
    // Microseconds per quarter note, limited to 24 bits
    let us_per_quarter = ((60_000_000.0 / bpm) as u32).min(0xFF_FFFF);

    track.push(TrackEvent {
        delta: 0u32.into(),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(us_per_quarter.into())),
    });
}

/// Add a 4/4 time signature meta message
fn add_time_signature(track: &mut Track<'_>) {
    // 4 beats, 2^2 = quarter note, 24 clocks per click, 8 32nds per quarter
    track.push(TrackEvent {
        delta: 0u32.into(),
        kind: TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8)),
    });
}

fn add_end_of_track(track: &mut Track<'_>, delta: u32) {
    track.push(TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
}
