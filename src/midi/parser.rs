use std::collections::HashMap;

use log::debug;

use crate::progress::{NoProgress, ProgressSink};

use super::{ByteReader, MidiError, NoteEvent, TempoChange};

/// File header chunk tag, `MThd`.
const HEADER_TAG: u32 = 0x4d54_6864;
/// Track chunk tag, `MTrk`.
const TRACK_TAG: u32 = 0x4d54_726b;
/// Set-tempo meta event type.
const META_SET_TEMPO: u8 = 0x51;
/// Tempo assumed until the first set-tempo event is seen.
const DEFAULT_BPM: f64 = 120.0;

/// Decoded contents of one Standard MIDI File.
#[derive(Debug, Clone, PartialEq)]
pub struct MidiFile {
    /// Ticks per quarter note, from the header.
    pub ppq: u16,
    /// BPM of the first set-tempo event in the file, or 120 if none.
    pub base_bpm: f64,
    /// Per-track note lists. Tracks that produced no notes are dropped.
    pub tracks: Vec<Vec<NoteEvent>>,
    /// Every set-tempo event in the file, in encounter order.
    pub tempo_changes: Vec<TempoChange>,
}

impl MidiFile {
    /// Parse a MIDI byte buffer.
    ///
    /// With `sustain_notes`, note-on/note-off pairs produce notes carrying
    /// a tick duration; otherwise every note-on at or above `min_velocity`
    /// produces a zero-duration note immediately.
    pub fn parse(data: &[u8], sustain_notes: bool, min_velocity: u8) -> Result<Self, MidiError> {
        Self::parse_with_progress(data, sustain_notes, min_velocity, &mut NoProgress)
    }

    /// Like [`MidiFile::parse`], reporting one fraction per track slot.
    pub fn parse_with_progress(
        data: &[u8],
        sustain_notes: bool,
        min_velocity: u8,
        progress: &mut dyn ProgressSink,
    ) -> Result<Self, MidiError> {
        let mut reader = ByteReader::new(data);

        if reader.read_u32()? != HEADER_TAG {
            return Err(MidiError::MalformedHeader {
                reason: "missing MThd tag",
            });
        }
        if reader.read_u32()? != 6 {
            return Err(MidiError::MalformedHeader {
                reason: "header chunk length is not 6",
            });
        }
        // The format word is accepted but not interpreted.
        let _format = reader.read_u16()?;
        let track_count = reader.read_u16()?;
        let ppq = reader.read_u16()?;

        let mut file = MidiFile {
            ppq,
            base_bpm: DEFAULT_BPM,
            tracks: Vec::new(),
            tempo_changes: Vec::new(),
        };

        for track_index in 0..track_count {
            if reader.remaining() == 0 {
                break;
            }
            progress.report(track_index as f64 / track_count as f64);

            // A chunk without the MTrk tag only costs its four tag bytes;
            // the slot loop moves on to whatever follows.
            if reader.read_u32()? != TRACK_TAG {
                debug!("track slot {track_index}: unrecognized chunk tag, skipping");
                continue;
            }
            let track_len = reader.read_u32()?;
            let track_end = reader.pos() + track_len as usize;

            let notes = file.scan_track(&mut reader, track_end, sustain_notes, min_velocity)?;
            debug!("track slot {track_index}: {} note(s)", notes.len());
            if !notes.is_empty() {
                file.tracks.push(notes);
            }
        }

        Ok(file)
    }

    /// Walk one track's event stream, collecting notes and tempo events.
    fn scan_track(
        &mut self,
        reader: &mut ByteReader,
        track_end: usize,
        sustain_notes: bool,
        min_velocity: u8,
    ) -> Result<Vec<NoteEvent>, MidiError> {
        let mut notes = Vec::new();
        let mut time: u32 = 0;
        let mut running_status: u8 = 0;
        // Unmatched note-ons per pitch, for sustain pairing. Scoped to
        // this track; pairs never cross track boundaries.
        let mut active_notes: HashMap<u8, (u32, u8)> = HashMap::new();

        while reader.pos() < track_end && reader.remaining() > 0 {
            let delta = reader.read_varlen()?;
            time = time.wrapping_add(delta);

            // Running status: a data byte in status position reuses the
            // previous status byte instead of consuming a new one.
            let mut status = reader.peek_byte()?;
            if status < 0x80 {
                status = running_status;
            } else {
                reader.read_byte()?;
            }
            running_status = status;

            match status & 0xf0 {
                0x90 | 0x80 => {
                    let pitch = reader.read_byte()?;
                    let velocity = reader.read_byte()?;

                    if status & 0xf0 == 0x90 && velocity > 0 {
                        if sustain_notes {
                            // Last write wins when a pitch re-triggers
                            // before its note-off arrives.
                            active_notes.insert(pitch, (time, velocity));
                        } else if velocity >= min_velocity {
                            notes.push(NoteEvent {
                                tick: time,
                                pitch,
                                velocity,
                                duration_ticks: 0,
                            });
                        }
                    } else if sustain_notes {
                        // Note-off, or the note-on-with-velocity-0 alias.
                        // An orphan note-off matches nothing and is fine.
                        if let Some((start_tick, start_velocity)) = active_notes.remove(&pitch) {
                            if start_velocity >= min_velocity {
                                notes.push(NoteEvent {
                                    tick: start_tick,
                                    pitch,
                                    velocity: start_velocity,
                                    duration_ticks: time - start_tick,
                                });
                            }
                        }
                    }
                }
                // Control change, pitch bend, polyphonic pressure.
                0xb0 | 0xe0 | 0xa0 => reader.skip(2)?,
                // Program change, channel pressure.
                0xc0 | 0xd0 => reader.skip(1)?,
                _ => match status {
                    0xff => {
                        let meta_type = reader.read_byte()?;
                        let payload_len = reader.read_varlen()?;
                        if meta_type == META_SET_TEMPO && payload_len == 3 {
                            let uspq = (reader.read_byte()? as u32) << 16
                                | (reader.read_byte()? as u32) << 8
                                | reader.read_byte()? as u32;
                            // Zero microseconds per quarter cannot encode
                            // a tempo; drop it with the other anomalies.
                            if uspq > 0 {
                                let bpm = 60_000_000.0 / uspq as f64;
                                if self.tempo_changes.is_empty() {
                                    self.base_bpm = bpm;
                                }
                                self.tempo_changes.push(TempoChange { tick: time, bpm });
                            }
                        } else {
                            reader.skip(payload_len as usize)?;
                        }
                    }
                    // System exclusive: length-prefixed payload.
                    0xf0 | 0xf7 => {
                        let payload_len = reader.read_varlen()?;
                        reader.skip(payload_len as usize)?;
                    }
                    // Anything else carries no data bytes we track.
                    _ => {}
                },
            }
        }

        Ok(notes)
    }
}
