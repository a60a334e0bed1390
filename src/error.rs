// error.rs - Error taxonomy for the chunked Life engine

use thiserror::Error;

/// Everything that can go wrong on the public board surface.
///
/// `InvalidGeometry` is fatal to creation; the recoverable variants leave
/// the board untouched, except `FormatError`, which clears the board as a
/// defined recovery step before surfacing.
#[derive(Error, Debug)]
pub enum LifeError {
    #[error("a {width}x{height} field cannot be split into {chunks} chunks")]
    InvalidGeometry {
        width: u32,
        height: u32,
        chunks: u32,
    },

    #[error("coordinates out of range")]
    OutOfRange,

    #[error("scanline is {got} characters long, expected {expected}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("malformed snapshot at line {line}")]
    FormatError { line: u32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
