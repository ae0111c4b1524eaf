use criterion::{Criterion, black_box, criterion_group, criterion_main};
use midi2psych::config::ConvertConfig;
use midi2psych::convert::convert;
use midi2psych::midi::MidiFile;

/// Synthesize a player file: `note_count` eighth notes walking up a
/// scale, with a tempo change every 64 notes.
fn synth_midi(note_count: u32) -> Vec<u8> {
    let mut events = Vec::new();
    for i in 0..note_count {
        if i % 64 == 0 {
            let uspq: u32 = if (i / 64) % 2 == 0 { 500_000 } else { 400_000 };
            events.extend_from_slice(&[0x00, 0xff, 0x51, 0x03]);
            events.extend_from_slice(&uspq.to_be_bytes()[1..]);
        }
        let pitch = 48 + (i % 24) as u8;
        events.extend_from_slice(&[0x00, 0x90, pitch, 100]);
        // 240 ticks to the note-off, running status.
        events.extend_from_slice(&[0x81, 0x70, pitch, 0]);
    }

    let mut bytes = b"MThd".to_vec();
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&0u16.to_be_bytes());
    bytes.extend_from_slice(&1u16.to_be_bytes());
    bytes.extend_from_slice(&480u16.to_be_bytes());
    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&(events.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&events);
    bytes
}

fn parse_benchmark(c: &mut Criterion) {
    let data = synth_midi(2000);

    c.bench_function("parse_2k_notes", |b| {
        b.iter(|| MidiFile::parse(black_box(&data), true, 0).unwrap());
    });
}

fn convert_benchmark(c: &mut Criterion) {
    let player1 = synth_midi(2000);
    let player2 = synth_midi(1500);
    let config = ConvertConfig {
        sustain_notes: true,
        ..ConvertConfig::default()
    };

    c.bench_function("convert_two_players", |b| {
        b.iter(|| convert(black_box(&player1), black_box(&player2), &config).unwrap());
    });
}

criterion_group!(benches, parse_benchmark, convert_benchmark);
criterion_main!(benches);
