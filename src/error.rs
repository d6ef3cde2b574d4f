use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Why a counter could not be opened.
#[derive(Debug, Error)]
pub enum Error {
    /// The kernel refused the counter: missing permission, no free
    /// hardware counter or an event it does not know.
    #[error("failed to open counter: {0}")]
    Open(#[source] io::Error),

    /// The metadata page could not be mapped. The descriptor has already
    /// been released when this is returned.
    #[error("failed to map metadata page: {0}")]
    Map(#[source] io::Error),

    /// The event encoder failed to initialize. This is permanent for the
    /// lifetime of the process.
    #[error("event encoder is not initialized")]
    Uninitialized,

    /// The event name has no valid encoding.
    #[error("no valid encoding for event `{0}`")]
    Encode(String),
}
