use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MidiError {
    /// The file header is missing, mistagged, or declares the wrong
    /// chunk length. Nothing can be salvaged from such a file.
    #[error("malformed MIDI header: {reason}")]
    MalformedHeader { reason: &'static str },

    /// A read ran past the end of the buffer mid-stream. The file is
    /// rejected whole; no partial note lists are returned.
    #[error("truncated MIDI stream at byte {offset}")]
    TruncatedStream { offset: usize },
}
