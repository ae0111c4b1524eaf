use std::sync::Mutex;

use log::{debug, info};
use thiserror::Error;

use crate::chart::{Chart, ChartBuilder, ChartError};
use crate::config::ConvertConfig;
use crate::midi::{MidiError, MidiFile, TempoChange};
use crate::progress::{NoProgress, ProgressFn, ProgressSink};
use crate::timing::TempoMap;

/// Errors from a whole conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to parse player {player} MIDI")]
    Parse {
        player: u8,
        #[source]
        source: MidiError,
    },

    #[error(transparent)]
    Chart(#[from] ChartError),
}

/// Everything produced by one conversion.
#[derive(Debug)]
pub struct Conversion {
    pub chart: Chart,
    /// Tick resolution of the player 1 file.
    pub ppq: u16,
    /// Player 1's base tempo before the multiplier.
    pub base_bpm: f64,
    /// The tempo map that governed time conversion.
    pub tempo_map: TempoMap,
}

/// Convert two players' MIDI buffers into a chart.
pub fn convert(
    player1: &[u8],
    player2: &[u8],
    config: &ConvertConfig,
) -> Result<Conversion, ConvertError> {
    convert_with_progress(player1, player2, config, &mut NoProgress)
}

/// Like [`convert`], reporting coarse progress: the two parses cover the
/// first half of the range, section building the second.
pub fn convert_with_progress(
    player1: &[u8],
    player2: &[u8],
    config: &ConvertConfig,
    progress: &mut dyn ProgressSink,
) -> Result<Conversion, ConvertError> {
    // The parses are independent; share the sink behind a lock so both
    // can report while running side by side.
    let shared = Mutex::new(progress);
    let (parsed1, parsed2) = rayon::join(
        || {
            MidiFile::parse_with_progress(
                player1,
                config.sustain_notes,
                config.min_velocity,
                &mut ProgressFn(|f: f64| shared.lock().unwrap().report(f * 0.25)),
            )
        },
        || {
            MidiFile::parse_with_progress(
                player2,
                config.sustain_notes,
                config.min_velocity,
                &mut ProgressFn(|f: f64| shared.lock().unwrap().report(0.25 + f * 0.25)),
            )
        },
    );
    let progress = shared.into_inner().unwrap();

    let parsed1 = parsed1.map_err(|source| ConvertError::Parse { player: 1, source })?;
    let parsed2 = parsed2.map_err(|source| ConvertError::Parse { player: 2, source })?;
    progress.report(0.5);

    debug!(
        "parsed player 1 ({} track(s)) and player 2 ({} track(s))",
        parsed1.tracks.len(),
        parsed2.tracks.len()
    );

    // Tick resolution and base tempo always come from player 1; so does
    // the tempo change list, unless player 1 has none.
    let changes = select_tempo_changes(&parsed1, &parsed2).to_vec();
    let tempo = TempoMap::new(parsed1.base_bpm, parsed1.ppq, config.bpm_multiplier, changes);

    let chart = ChartBuilder::new(config).build_with_progress(
        &parsed1,
        &parsed2,
        &tempo,
        &mut ProgressFn(|f: f64| progress.report(0.5 + f * 0.5)),
    )?;

    info!(
        "built {} note(s) ({} P1, {} P2) across {} section(s)",
        chart.note_count(),
        chart.p1_note_count,
        chart.p2_note_count,
        chart.sections.len()
    );

    Ok(Conversion {
        chart,
        ppq: parsed1.ppq,
        base_bpm: parsed1.base_bpm,
        tempo_map: tempo,
    })
}

/// Tempo source policy: player 1's tempo events govern whenever any
/// exist; player 2's list is consulted only as a fallback, and divergent
/// player 2 tempo data is otherwise ignored.
fn select_tempo_changes<'a>(player1: &'a MidiFile, player2: &'a MidiFile) -> &'a [TempoChange] {
    if player1.tempo_changes.is_empty() {
        &player2.tempo_changes
    } else {
        &player1.tempo_changes
    }
}
