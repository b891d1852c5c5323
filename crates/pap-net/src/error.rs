use std::time::Duration;

use thiserror::Error;

/// Communication failures. Any of these means the outcome of the request
/// is unknown and nothing may be applied locally.
#[derive(Error, Debug)]
pub enum NetError {
    #[error("Not connected to the server")]
    NotConnected,

    #[error("Connection closed by the server")]
    Closed,

    #[error("No response within {0:?}")]
    Timeout(Duration),

    #[error("Response exceeds {0} bytes")]
    TooLarge(usize),

    #[error("Response is not valid UTF-8")]
    InvalidUtf8,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
