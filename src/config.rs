use serde::{Deserialize, Serialize};

/// Settings for one conversion.
///
/// Read once before the conversion starts and never mutated while it
/// runs. Hosts that want to persist a configuration can round-trip it
/// through JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Song name written into the chart metadata.
    pub song_name: String,
    /// Player 1 character id.
    pub p1_char: String,
    /// Player 2 (opponent) character id.
    pub p2_char: String,
    /// Girlfriend character id.
    pub gf_char: String,
    /// Stage id.
    pub stage: String,
    /// Scroll speed written into the chart.
    pub speed: f64,
    /// Multiplier applied to every tempo before time conversion.
    pub bpm_multiplier: f64,
    /// Offset added to every note time, in milliseconds.
    pub note_offset_ms: f64,
    /// Note-ons below this velocity are dropped (0-127).
    pub min_velocity: u8,
    /// Decimal digits kept on note times when `high_precision` is set.
    pub decimal_places: u32,
    /// Keep fractional milliseconds instead of rounding to whole ones.
    pub high_precision: bool,
    /// Pair note-on/note-off events into held notes.
    pub sustain_notes: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            song_name: "Converted".to_string(),
            p1_char: "bf".to_string(),
            p2_char: "dad".to_string(),
            gf_char: "gf".to_string(),
            stage: "stage".to_string(),
            speed: 2.5,
            bpm_multiplier: 1.0,
            note_offset_ms: 0.0,
            min_velocity: 0,
            decimal_places: 6,
            high_precision: true,
            sustain_notes: false,
        }
    }
}
