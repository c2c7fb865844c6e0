use std::collections::TryReserveError;
use std::fmt;
pub use Error::*;

/// Error codes
#[non_exhaustive]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// Function called with invalid arguments
    ValueOutOfRange = 100,
    /// Either the system/process really hit a limit, or some data like image size was ridiculously wrong. Could be a bug too
    OutOfMemory,
    /// A cancellation token stopped the run
    Aborted,
    /// Slice needs to be bigger, or width/height needs to be smaller
    BufferTooSmall,
    /// Congratulations, you've discovered an edge case
    Unsupported,
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    #[cold]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::ValueOutOfRange => "VALUE_OUT_OF_RANGE",
            Self::OutOfMemory => "OUT_OF_MEMORY",
            Self::Aborted => "ABORTED",
            Self::BufferTooSmall => "BUFFER_TOO_SMALL",
            Self::Unsupported => "UNSUPPORTED",
        })
    }
}

impl From<TryReserveError> for Error {
    #[cold]
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}
