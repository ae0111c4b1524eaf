use log::debug;
use thiserror::Error;

use crate::config::ConvertConfig;
use crate::midi::MidiFile;
use crate::progress::{NoProgress, ProgressSink};
use crate::timing::TempoMap;

use super::{Chart, ChartNote, LANES_PER_SIDE, OPPONENT_LANE_OFFSET, Section};

/// Sections built between progress reports.
const PROGRESS_BATCH: usize = 10;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChartError {
    /// Neither player's MIDI produced a usable note. The inputs were
    /// well-formed; there is just nothing to chart.
    #[error("no usable notes in either MIDI input")]
    EmptyChart,
}

/// Assembles two players' parsed MIDI files into chart sections.
pub struct ChartBuilder<'a> {
    config: &'a ConvertConfig,
}

impl<'a> ChartBuilder<'a> {
    pub fn new(config: &'a ConvertConfig) -> Self {
        Self { config }
    }

    pub fn build(
        &self,
        player1: &MidiFile,
        player2: &MidiFile,
        tempo: &TempoMap,
    ) -> Result<Chart, ChartError> {
        self.build_with_progress(player1, player2, tempo, &mut NoProgress)
    }

    /// Merge both players' notes onto one timeline, then carve it into
    /// four-beat sections whose lengths follow the tempo in effect.
    pub fn build_with_progress(
        &self,
        player1: &MidiFile,
        player2: &MidiFile,
        tempo: &TempoMap,
        progress: &mut dyn ProgressSink,
    ) -> Result<Chart, ChartError> {
        let (mut all_notes, p1_max_tick) = self.convert_notes(player1, 0, tempo);
        let (p2_notes, p2_max_tick) = self.convert_notes(player2, OPPONENT_LANE_OFFSET, tempo);

        let p1_note_count = all_notes.len();
        let p2_note_count = p2_notes.len();
        all_notes.extend(p2_notes);
        if all_notes.is_empty() {
            return Err(ChartError::EmptyChart);
        }

        // Lane breaks ties so simultaneous notes order deterministically.
        all_notes.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms).then(a.lane.cmp(&b.lane)));

        let timeline = tempo.timeline();
        let final_bpm = tempo.final_bpm();
        let max_time = tempo.tick_to_ms(p1_max_tick.max(p2_max_tick));
        let estimate = (max_time / Section::length_ms(final_bpm)) as usize + 1;

        let mut sections: Vec<Section> = Vec::with_capacity(estimate);
        let mut current_time = 0.0;
        let mut current_bpm = final_bpm;
        let mut cursor = 0;

        // One extra section past the last note so a note landing exactly
        // on the final boundary still has a home.
        while current_time < max_time + Section::length_ms(current_bpm) {
            current_bpm = timeline.bpm_at(current_time);
            let section_length = Section::length_ms(current_bpm);
            let section_end = current_time + section_length;

            // The last breakpoint strictly inside the interval names the
            // section's tempo.
            let mut section_bpm = current_bpm;
            let mut changes_tempo = false;
            for &(time, bpm) in timeline.points() {
                if time > current_time && time < section_end {
                    changes_tempo = true;
                    section_bpm = bpm;
                }
            }

            while cursor < all_notes.len() && all_notes[cursor].time_ms < current_time {
                cursor += 1;
            }
            let start = cursor;
            while cursor < all_notes.len() && all_notes[cursor].time_ms < section_end {
                cursor += 1;
            }
            let in_section = &all_notes[start..cursor];

            let p1_in_section = in_section
                .iter()
                .filter(|note| note.lane < OPPONENT_LANE_OFFSET)
                .count();
            let p2_in_section = in_section.len() - p1_in_section;
            // Ties go to player 1.
            let must_hit = p1_in_section >= p2_in_section;

            let notes = in_section
                .iter()
                .map(|note| {
                    let is_p1 = note.lane < OPPONENT_LANE_OFFSET;
                    let base_lane = note.lane % OPPONENT_LANE_OFFSET;
                    // Lanes 0-3 always belong to the primary side, 4-7 to
                    // the other, whichever player that is this section.
                    let lane = if must_hit == is_p1 {
                        base_lane
                    } else {
                        base_lane + LANES_PER_SIDE
                    };
                    ChartNote {
                        time_ms: note.time_ms,
                        lane,
                        duration_ms: note.duration_ms,
                    }
                })
                .collect();

            sections.push(Section {
                notes,
                must_hit,
                changes_tempo,
                bpm: section_bpm,
            });

            current_time += section_length;
            if sections.len() % PROGRESS_BATCH == 0 {
                progress.report((sections.len() as f64 / estimate as f64).min(0.99));
            }
        }
        progress.report(1.0);

        debug!(
            "built {} section(s) covering {:.1} ms",
            sections.len(),
            current_time
        );

        Ok(Chart {
            sections,
            bpm: final_bpm,
            p1_note_count,
            p2_note_count,
        })
    }

    /// Convert one player's note events to timeline notes, returning them
    /// with the largest start tick seen.
    fn convert_notes(
        &self,
        file: &MidiFile,
        lane_offset: i32,
        tempo: &TempoMap,
    ) -> (Vec<ChartNote>, u32) {
        let config = self.config;
        let mut notes = Vec::new();
        let mut max_tick = 0u32;

        for track in &file.tracks {
            for event in track {
                let start_ms = tempo.tick_to_ms(event.tick);
                // Held lengths integrate the tempo curve between the two
                // endpoints rather than scaling the tick count linearly.
                let duration_ms = if config.sustain_notes && event.duration_ticks > 0 {
                    tempo.tick_to_ms(event.tick.saturating_add(event.duration_ticks)) - start_ms
                } else {
                    0.0
                };

                notes.push(ChartNote {
                    time_ms: start_ms + config.note_offset_ms,
                    lane: (event.pitch % 4) as i32 + lane_offset,
                    duration_ms,
                });
                max_tick = max_tick.max(event.tick);
            }
        }

        (notes, max_tick)
    }
}
