use thiserror::Error;

/// Errors produced by the local caches.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No contact at the given position.
    #[error("No contact at index {index} (store holds {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// The phone number is already used by another contact.
    #[error("Phone number {0} is already used by another contact")]
    DuplicatePhone(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
