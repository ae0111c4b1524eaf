mod error;
mod event;
mod parser;
mod reader;

use std::path::Path;

use anyhow::{Context, Result};

pub use error::*;
pub use event::*;
pub use parser::*;
pub use reader::*;

/// Read a MIDI file into memory for parsing.
pub fn read_midi_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).with_context(|| format!("failed to read MIDI file: {}", path.display()))
}
