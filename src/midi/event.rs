/// A note reconstructed from a track's event stream.
///
/// `tick` is the cumulative delta time since track start, non-decreasing
/// within a track but not unique. `duration_ticks` stays 0 unless sustain
/// pairing matched this note-on with a later note-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub tick: u32,
    pub pitch: u8,
    pub velocity: u8,
    pub duration_ticks: u32,
}

/// A set-tempo event, delivered in ascending tick order by the track scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoChange {
    pub tick: u32,
    pub bpm: f64,
}
