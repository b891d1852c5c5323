use chrono::NaiveDate;
use thiserror::Error;

use pap_net::NetError;
use pap_shared::protocol::{Status, Verb};
use pap_shared::types::EventLabel;
use pap_shared::ValidationError;
use pap_store::StoreError;

use crate::config::ConfigError;

/// Everything a session operation can fail with.
///
/// Whatever the variant, the local caches are left exactly as they were
/// before the call.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Input rejected before any request was sent.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The server answered with a rejection sentinel.
    #[error("{verb} rejected: {}", .status.describe())]
    Rejected { verb: Verb, status: Status },

    /// The request may or may not have reached the server.
    #[error("Communication error: {0}")]
    Communication(#[from] NetError),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("No event '{label}' on {date}")]
    NoSuchEvent { date: NaiveDate, label: EventLabel },

    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The background session task is gone.
    #[error("Session task has stopped")]
    SessionClosed,
}

impl ClientError {
    /// Text for the modal shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Communication(_) | Self::SessionClosed => {
                "Could not reach the server, please try again later".to_string()
            }
            Self::Rejected { status, .. } => status.describe().to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_communication(&self) -> bool {
        matches!(self, Self::Communication(_))
    }
}
