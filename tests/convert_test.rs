use midi2psych::chart::encode;
use midi2psych::config::ConvertConfig;
use midi2psych::convert::{ConvertError, convert};
use midi2psych::midi::MidiError;

/// Start of a MIDI byte stream: header chunk with the given track count.
fn header(track_count: u16, ppq: u16) -> Vec<u8> {
    let mut bytes = b"MThd".to_vec();
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&0u16.to_be_bytes());
    bytes.extend_from_slice(&track_count.to_be_bytes());
    bytes.extend_from_slice(&ppq.to_be_bytes());
    bytes
}

fn push_track(bytes: &mut Vec<u8>, events: &[u8]) {
    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&(events.len() as u32).to_be_bytes());
    bytes.extend_from_slice(events);
}

/// One track, one note: on at tick 0, off a beat later.
fn single_note_file() -> Vec<u8> {
    let mut bytes = header(1, 480);
    push_track(&mut bytes, &[0x00, 0x90, 60, 100, 0x83, 0x60, 0x80, 60, 0]);
    bytes
}

fn empty_file() -> Vec<u8> {
    header(0, 480)
}

#[test]
fn minimal_song_produces_one_section() {
    let config = ConvertConfig::default();
    let conversion = convert(&single_note_file(), &empty_file(), &config).unwrap();

    let chart = &conversion.chart;
    assert_eq!(chart.sections.len(), 1);
    assert_eq!(chart.p1_note_count, 1);
    assert_eq!(chart.p2_note_count, 0);
    assert!((chart.bpm - 120.0).abs() < 0.001);

    let section = &chart.sections[0];
    assert!(section.must_hit);
    assert_eq!(section.notes.len(), 1);
    assert_eq!(section.notes[0].time_ms, 0.0);
    assert_eq!(section.notes[0].lane, 0);
    assert_eq!(section.notes[0].duration_ms, 0.0);
}

#[test]
fn sustain_mode_keeps_held_length() {
    let config = ConvertConfig {
        sustain_notes: true,
        ..ConvertConfig::default()
    };
    let conversion = convert(&single_note_file(), &empty_file(), &config).unwrap();

    // One beat at 120 BPM.
    let note = &conversion.chart.sections[0].notes[0];
    assert!((note.duration_ms - 500.0).abs() < 0.001);
}

#[test]
fn both_empty_inputs_fail_distinctly() {
    let config = ConvertConfig::default();
    let err = convert(&empty_file(), &empty_file(), &config).unwrap_err();
    assert!(matches!(err, ConvertError::Chart(_)));
}

#[test]
fn malformed_player_one_header_aborts() {
    let config = ConvertConfig::default();
    let err = convert(b"not a midi file", &empty_file(), &config).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Parse {
            player: 1,
            source: MidiError::MalformedHeader { .. },
        }
    ));
}

#[test]
fn truncated_player_two_track_aborts() {
    let mut bytes = header(1, 480);
    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&32u32.to_be_bytes());
    bytes.extend_from_slice(&[0x00, 0x90]);

    let config = ConvertConfig::default();
    let err = convert(&single_note_file(), &bytes, &config).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Parse {
            player: 2,
            source: MidiError::TruncatedStream { .. },
        }
    ));
}

#[test]
fn player_one_tempo_list_wins() {
    // Player 1 declares 120 BPM, player 2 a divergent 240 BPM.
    let mut p1 = header(1, 480);
    push_track(
        &mut p1,
        &[0x00, 0xff, 0x51, 0x03, 0x07, 0xa1, 0x20, 0x00, 0x90, 60, 100],
    );
    let mut p2 = header(1, 480);
    push_track(
        &mut p2,
        &[0x00, 0xff, 0x51, 0x03, 0x03, 0xd0, 0x90, 0x00, 0x90, 61, 100],
    );

    let config = ConvertConfig::default();
    let conversion = convert(&p1, &p2, &config).unwrap();

    let changes = conversion.tempo_map.changes();
    assert_eq!(changes.len(), 1);
    assert!((changes[0].bpm - 120.0).abs() < 0.001);
}

#[test]
fn player_two_tempo_list_is_the_fallback() {
    let mut p2 = header(1, 480);
    push_track(
        &mut p2,
        &[0x00, 0xff, 0x51, 0x03, 0x03, 0xd0, 0x90, 0x00, 0x90, 61, 100],
    );

    let config = ConvertConfig::default();
    let conversion = convert(&single_note_file(), &p2, &config).unwrap();

    let changes = conversion.tempo_map.changes();
    assert_eq!(changes.len(), 1);
    assert!((changes[0].bpm - 240.0).abs() < 0.001);
}

#[test]
fn encoded_document_matches_engine_shape() {
    let config = ConvertConfig {
        song_name: "Test Song".to_string(),
        ..ConvertConfig::default()
    };
    let conversion = convert(&single_note_file(), &empty_file(), &config).unwrap();

    let json = encode(&conversion.chart, &config).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let song = &value["song"];
    assert_eq!(song["song"], "Test Song");
    assert_eq!(song["needsVoices"], true);
    assert_eq!(song["validScore"], true);
    assert_eq!(song["notes"].as_array().unwrap().len(), 1);

    let section = &song["notes"][0];
    assert_eq!(section["lengthInSteps"], 16);
    assert_eq!(section["mustHitSection"], true);
    assert_eq!(section["changeBPM"], false);

    let quad = &section["sectionNotes"][0];
    assert_eq!(quad.as_array().unwrap().len(), 4);
    assert_eq!(quad[0].as_f64(), Some(0.0));
    assert_eq!(quad[1].as_i64(), Some(0));
    assert_eq!(quad[2].as_i64(), Some(0));
    assert_eq!(quad[3].as_f64(), Some(0.0));
}

#[test]
fn chart_survives_a_disk_round_trip() {
    let config = ConvertConfig::default();
    let conversion = convert(&single_note_file(), &empty_file(), &config).unwrap();
    let json = encode(&conversion.chart, &config).to_json().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chart.json");
    std::fs::write(&path, &json).unwrap();

    let reread = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&reread).unwrap();
    assert_eq!(value["song"]["song"], "Converted");
    assert_eq!(value["song"]["player1"], "bf");
}

#[test]
fn progress_reports_cover_the_full_range() {
    use midi2psych::convert::convert_with_progress;
    use midi2psych::progress::ProgressFn;

    let config = ConvertConfig::default();
    let fractions = std::sync::Mutex::new(Vec::new());
    convert_with_progress(
        &single_note_file(),
        &empty_file(),
        &config,
        &mut ProgressFn(|f: f64| fractions.lock().unwrap().push(f)),
    )
    .unwrap();

    let fractions = fractions.into_inner().unwrap();
    assert!(!fractions.is_empty());
    assert!(fractions.iter().all(|f| (0.0..=1.0).contains(f)));
    assert_eq!(*fractions.last().unwrap(), 1.0);
}
