use thiserror::Error;

use crate::validate::Field;

/// Rejection of user input before anything is sent to the remote store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(Field),

    #[error("{field} is too long (max {max} characters)")]
    TooLong { field: Field, max: usize },

    #[error("{field} contains forbidden characters (allowed: {allowed})")]
    ForbiddenCharacters { field: Field, allowed: &'static str },

    #[error("Phone number must consist of exactly 11 digits")]
    InvalidPhone,

    #[error("{0} is not a valid yyyy-MM-dd date")]
    InvalidDate(Field),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("The new password must differ from the old one")]
    SamePassword,

    #[error("No changes were made")]
    Unchanged,

    #[error("A contact with phone number {0} already exists")]
    DuplicatePhone(String),

    #[error("An event named '{0}' already exists on this date")]
    DuplicateLabel(String),
}

impl ValidationError {
    /// The field the error refers to, if it is about a single field.
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::Empty(field) | Self::InvalidDate(field) => Some(*field),
            Self::TooLong { field, .. } | Self::ForbiddenCharacters { field, .. } => Some(*field),
            Self::InvalidPhone | Self::DuplicatePhone(_) => Some(Field::Phone),
            Self::DuplicateLabel(_) => Some(Field::EventLabel),
            Self::PasswordMismatch => Some(Field::PasswordConfirmation),
            Self::SamePassword => Some(Field::NewPassword),
            Self::Unchanged => None,
        }
    }
}

/// A bulk-list record that could not be decoded.
///
/// The codec never surfaces these to callers; they are logged and the
/// record is skipped.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("record has {found} fields, expected {expected}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid field: {0}")]
    Field(#[from] ValidationError),

    #[error("invalid date '{0}'")]
    Date(String),
}
