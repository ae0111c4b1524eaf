use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use midi2psych::chart::encode;
use midi2psych::config::ConvertConfig;
use midi2psych::convert::{Conversion, convert};
use midi2psych::midi::read_midi_file;

#[derive(Parser)]
#[command(
    name = "midi2psych",
    about = "Convert paired MIDI performance recordings into a Psych Engine chart",
    version
)]
struct Args {
    /// Player 1 MIDI file
    player1: PathBuf,

    /// Player 2 MIDI file
    player2: PathBuf,

    /// Output chart path
    #[arg(default_value = "chart.json")]
    output: PathBuf,

    /// Song name written into the chart
    #[arg(short = 's', long, default_value = "Converted")]
    song: String,

    /// Multiplier applied to every tempo
    #[arg(short = 'b', long = "bpm-mult", default_value_t = 1.0)]
    bpm_mult: f64,

    /// Offset added to every note time, in milliseconds
    #[arg(short = 'o', long, default_value_t = 0.0)]
    offset: f64,

    /// Minimum note-on velocity to keep (0-127)
    #[arg(short = 'v', long, default_value_t = 0)]
    velocity: u8,

    /// Decimal digits kept on note times
    #[arg(short = 'p', long, default_value_t = 6)]
    precision: u32,

    /// Round note times to whole milliseconds
    #[arg(long)]
    no_precision: bool,

    /// Pair note-on/note-off events into held notes
    #[arg(long)]
    sustain: bool,

    /// Scroll speed written into the chart
    #[arg(long, default_value_t = 2.5)]
    speed: f64,

    /// Player 1 character id
    #[arg(long, default_value = "bf")]
    p1: String,

    /// Player 2 character id
    #[arg(long, default_value = "dad")]
    p2: String,

    /// Girlfriend character id
    #[arg(long, default_value = "gf")]
    gf: String,

    /// Stage id
    #[arg(long, default_value = "stage")]
    stage: String,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

impl Args {
    fn to_config(&self) -> ConvertConfig {
        ConvertConfig {
            song_name: self.song.clone(),
            p1_char: self.p1.clone(),
            p2_char: self.p2.clone(),
            gf_char: self.gf.clone(),
            stage: self.stage.clone(),
            speed: self.speed,
            bpm_multiplier: self.bpm_mult,
            note_offset_ms: self.offset,
            min_velocity: self.velocity,
            decimal_places: self.precision,
            high_precision: !self.no_precision,
            sustain_notes: self.sustain,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = args.to_config();

    let player1 = read_midi_file(&args.player1)?;
    let player2 = read_midi_file(&args.player2)?;

    let conversion = convert(&player1, &player2, &config)?;
    report_summary(&conversion, &config);

    let chart_json = encode(&conversion.chart, &config).to_json()?;
    fs::write(&args.output, &chart_json)
        .with_context(|| format!("failed to write chart to {}", args.output.display()))?;

    info!(
        "wrote {} ({:.1} KiB)",
        args.output.display(),
        chart_json.len() as f64 / 1024.0
    );
    Ok(())
}

fn report_summary(conversion: &Conversion, config: &ConvertConfig) {
    info!(
        "PPQ {}, base BPM {:.2}, final BPM {:.2}",
        conversion.ppq,
        conversion.base_bpm,
        conversion.tempo_map.final_bpm()
    );

    let changes = conversion.tempo_map.changes();
    if changes.len() > 1 {
        info!("{} tempo change(s):", changes.len() - 1);
        for change in changes.iter().skip(1).take(5) {
            let time_s = conversion.tempo_map.tick_to_ms(change.tick) / 1000.0;
            info!(
                "  @ {:7.2}s -> {:6.2} BPM",
                time_s,
                change.bpm * config.bpm_multiplier
            );
        }
        if changes.len() > 6 {
            info!("  ... and {} more", changes.len() - 6);
        }
    }
}
