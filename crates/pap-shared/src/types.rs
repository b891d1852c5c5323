//! Field types that can only be built from validated text.
//!
//! Every value that ends up in a request is one of these, so the encoder
//! never has to re-check characters: a `Contact` made of them is always
//! safe to put on the wire.

use std::fmt;

use crate::constants::{
    MAX_CONTACT_FIELD_LEN, MAX_CREDENTIAL_LEN, MAX_EVENT_LABEL_LEN, PHONE_DIGITS,
};
use crate::error::ValidationError;
use crate::validate::{check, Field, FieldKind};

/// Account identifier (login).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountName(String);

impl AccountName {
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        check(text, FieldKind::Login, Field::Login, MAX_CREDENTIAL_LEN, true)?;
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account password. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Validate `text` as the password field `field` (login, new password,
    /// confirmation...).
    pub fn new(text: &str, field: Field) -> Result<Self, ValidationError> {
        check(text, FieldKind::Password, field, MAX_CREDENTIAL_LEN, true)?;
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// A single alphabetic word: surname, name, patronymic, city or street.
/// May be empty for optional fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Word(String);

impl Word {
    pub fn new(text: &str, field: Field) -> Result<Self, ValidationError> {
        check(text, FieldKind::Word, field, MAX_CONTACT_FIELD_LEN, false)?;
        Ok(Self(text.to_string()))
    }

    pub fn required(text: &str, field: Field) -> Result<Self, ValidationError> {
        check(text, FieldKind::Word, field, MAX_CONTACT_FIELD_LEN, true)?;
        Ok(Self(text.to_string()))
    }

    /// First letter upper-case, the rest lower-case.
    pub fn capitalized(&self) -> Self {
        let mut chars = self.0.chars();
        let capitalized = match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(char::to_lowercase))
                .collect(),
            None => String::new(),
        };
        Self(capitalized)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// House number such as `5a`. May be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HouseNumber(String);

impl HouseNumber {
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        check(
            text,
            FieldKind::NumberWord,
            Field::HouseNumber,
            MAX_CONTACT_FIELD_LEN,
            false,
        )?;
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Apartment number, digits only. May be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ApartmentNumber(String);

impl ApartmentNumber {
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        check(
            text,
            FieldKind::Number,
            Field::ApartmentNumber,
            MAX_CONTACT_FIELD_LEN,
            false,
        )?;
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Phone number: exactly [`PHONE_DIGITS`] ASCII digits, the first being the
/// country digit. The `+` of the input mask is accepted and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Phone(String);

impl Phone {
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        if text.is_empty() {
            return Err(ValidationError::Empty(Field::Phone));
        }
        let digits = text.strip_prefix('+').unwrap_or(text);
        if digits.len() != PHONE_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidPhone);
        }
        Ok(Self(digits.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Event label in its local (space separated) form.
///
/// Leading and trailing whitespace is trimmed and internal runs of spaces
/// collapse to one, so the label equals what the server hands back after
/// the `_` round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventLabel(String);

impl EventLabel {
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        check(
            text,
            FieldKind::Label,
            Field::EventLabel,
            MAX_EVENT_LABEL_LEN,
            false,
        )?;
        let normalized = text
            .split(|c: char| c == ' ' || c == '_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if normalized.is_empty() {
            return Err(ValidationError::Empty(Field::EventLabel));
        }
        Ok(Self(normalized))
    }

    /// Decode a wire token, where `_` stands in for spaces.
    pub fn from_wire(token: &str) -> Result<Self, ValidationError> {
        Self::new(&token.replace('_', " "))
    }

    /// Wire form: spaces replaced by `_`.
    pub fn to_wire(&self) -> String {
        self.0.replace(' ', "_")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
