use serde::Serialize;

use crate::config::ConvertConfig;

use super::{Chart, Section};

/// Steps per four-beat section (sixteenth-note grid).
const SECTION_STEPS: u32 = 16;

/// Top-level chart document; the engine expects the song object wrapped
/// in a `song` key.
#[derive(Debug, Serialize)]
pub struct SongFile {
    pub song: Song,
}

/// Song metadata plus the section list, in the engine's field spelling.
#[derive(Debug, Serialize)]
pub struct Song {
    pub song: String,
    pub notes: Vec<SectionData>,
    pub bpm: f64,
    #[serde(rename = "needsVoices")]
    pub needs_voices: bool,
    pub speed: f64,
    pub player1: String,
    pub player2: String,
    #[serde(rename = "gfVersion")]
    pub gf_version: String,
    pub stage: String,
    #[serde(rename = "validScore")]
    pub valid_score: bool,
}

#[derive(Debug, Serialize)]
pub struct SectionData {
    #[serde(rename = "sectionNotes")]
    pub section_notes: Vec<NoteQuad>,
    #[serde(rename = "lengthInSteps")]
    pub length_in_steps: u32,
    #[serde(rename = "mustHitSection")]
    pub must_hit_section: bool,
    #[serde(rename = "changeBPM")]
    pub change_bpm: bool,
    pub bpm: f64,
}

/// `[time_ms, lane, 0, duration_ms]`; the third slot is a note-type
/// field the converter leaves at zero.
#[derive(Debug, Serialize)]
pub struct NoteQuad(pub f64, pub i32, pub i32, pub f64);

impl SongFile {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Render a built chart into the engine's document model, applying the
/// configured precision to note times and durations.
pub fn encode(chart: &Chart, config: &ConvertConfig) -> SongFile {
    let notes = chart
        .sections
        .iter()
        .map(|section| encode_section(section, config))
        .collect();

    SongFile {
        song: Song {
            song: config.song_name.clone(),
            notes,
            bpm: chart.bpm,
            needs_voices: true,
            speed: config.speed,
            player1: config.p1_char.clone(),
            player2: config.p2_char.clone(),
            gf_version: config.gf_char.clone(),
            stage: config.stage.clone(),
            valid_score: true,
        },
    }
}

fn encode_section(section: &Section, config: &ConvertConfig) -> SectionData {
    let section_notes = section
        .notes
        .iter()
        .map(|note| {
            NoteQuad(
                quantize(note.time_ms, config),
                note.lane,
                0,
                quantize(note.duration_ms, config),
            )
        })
        .collect();

    SectionData {
        section_notes,
        length_in_steps: SECTION_STEPS,
        must_hit_section: section.must_hit,
        change_bpm: section.changes_tempo,
        bpm: section.bpm,
    }
}

/// Times round to whole milliseconds unless high precision is on, in
/// which case they are cut to the configured digit count.
fn quantize(value: f64, config: &ConvertConfig) -> f64 {
    if config.high_precision {
        let scale = 10f64.powi(config.decimal_places as i32);
        (value * scale).trunc() / scale
    } else {
        value.round()
    }
}
