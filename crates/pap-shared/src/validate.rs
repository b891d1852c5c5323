//! Character-class acceptance checks.
//!
//! The wire protocol has no escaping, so every field kind admits a
//! character set that is disjoint from the request delimiter (space) and
//! the bulk-list delimiters (`,` and `;`). Event labels are the one kind
//! that admits a space; it is rewritten to `_` before it reaches the wire.

use std::fmt;

use crate::constants::{LABEL_PUNCTUATION, PASSWORD_PUNCTUATION};
use crate::error::ValidationError;

/// The character classes a user-supplied field can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Letters, digits and `_`.
    Login,
    /// Letters, digits and [`PASSWORD_PUNCTUATION`].
    Password,
    /// Letters only.
    Word,
    /// ASCII digits only.
    Number,
    /// Letters and digits.
    NumberWord,
    /// Letters, digits, space, `:`, `-` and `_`.
    Label,
}

impl FieldKind {
    /// Whether a single character belongs to this class.
    pub fn admits(self, c: char) -> bool {
        match self {
            Self::Login => c.is_alphanumeric() || c == '_',
            Self::Password => c.is_alphanumeric() || PASSWORD_PUNCTUATION.contains(c),
            Self::Word => c.is_alphabetic(),
            Self::Number => c.is_ascii_digit(),
            Self::NumberWord => c.is_alphanumeric(),
            Self::Label => c.is_alphanumeric() || LABEL_PUNCTUATION.contains(c),
        }
    }

    /// Human-readable description of the class, for error messages.
    pub fn allowed(self) -> &'static str {
        match self {
            Self::Login => "letters, digits and _",
            Self::Password => "letters, digits and !#$%&()*+-:;<=>?@[]^_{|}~",
            Self::Word => "letters only",
            Self::Number => "digits only",
            Self::NumberWord => "letters and digits",
            Self::Label => "letters, digits, spaces and :-_",
        }
    }
}

/// Returns `true` when every character of `text` belongs to `kind`.
///
/// The empty string is accepted; emptiness and length are checked by the
/// field-specific rules in [`check`].
pub fn accepts(text: &str, kind: FieldKind) -> bool {
    text.chars().all(|c| kind.admits(c))
}

/// Named input fields, used to tell the user which one was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Login,
    Password,
    PasswordConfirmation,
    OldPassword,
    NewPassword,
    Surname,
    Name,
    Patronymic,
    BirthDate,
    City,
    Street,
    HouseNumber,
    ApartmentNumber,
    Phone,
    EventLabel,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Login => "Login",
            Self::Password => "Password",
            Self::PasswordConfirmation => "Password confirmation",
            Self::OldPassword => "Old password",
            Self::NewPassword => "New password",
            Self::Surname => "Surname",
            Self::Name => "Name",
            Self::Patronymic => "Patronymic",
            Self::BirthDate => "Birth date",
            Self::City => "City",
            Self::Street => "Street",
            Self::HouseNumber => "House number",
            Self::ApartmentNumber => "Apartment number",
            Self::Phone => "Phone",
            Self::EventLabel => "Event",
        };
        f.write_str(name)
    }
}

/// Full field check: presence, length bound (in characters), then
/// character class.
pub fn check(
    text: &str,
    kind: FieldKind,
    field: Field,
    max_len: usize,
    required: bool,
) -> Result<(), ValidationError> {
    if required && text.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    if text.chars().count() > max_len {
        return Err(ValidationError::TooLong { field, max: max_len });
    }
    if !accepts(text, kind) {
        return Err(ValidationError::ForbiddenCharacters {
            field,
            allowed: kind.allowed(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [FieldKind; 6] = [
        FieldKind::Login,
        FieldKind::Password,
        FieldKind::Word,
        FieldKind::Number,
        FieldKind::NumberWord,
        FieldKind::Label,
    ];

    #[test]
    fn test_empty_string_is_accepted_by_every_kind() {
        for kind in ALL_KINDS {
            assert!(accepts("", kind), "{kind:?}");
        }
    }

    #[test]
    fn test_login_class() {
        assert!(accepts("ivan_99", FieldKind::Login));
        assert!(accepts("Иван", FieldKind::Login));
        assert!(!accepts("ivan-99", FieldKind::Login));
        assert!(!accepts("ivan 99", FieldKind::Login));
    }

    #[test]
    fn test_password_class_admits_whole_punctuation_set() {
        assert!(accepts(PASSWORD_PUNCTUATION, FieldKind::Password));
        assert!(accepts("Secr3t!", FieldKind::Password));
        assert!(!accepts("no,comma", FieldKind::Password));
        assert!(!accepts("no space", FieldKind::Password));
        assert!(!accepts("quote\"", FieldKind::Password));
    }

    #[test]
    fn test_word_number_classes() {
        assert!(accepts("Moscow", FieldKind::Word));
        assert!(!accepts("Moscow1", FieldKind::Word));
        assert!(!accepts("Nizhny-Novgorod", FieldKind::Word));
        assert!(accepts("12", FieldKind::Number));
        assert!(!accepts("12a", FieldKind::Number));
        assert!(accepts("5a", FieldKind::NumberWord));
        assert!(!accepts("5/a", FieldKind::NumberWord));
    }

    #[test]
    fn test_label_class() {
        assert!(accepts("Meeting with team: 10-00_room", FieldKind::Label));
        assert!(!accepts("lunch, then nap", FieldKind::Label));
        assert!(!accepts("a;b", FieldKind::Label));
        assert!(!accepts("tab\there", FieldKind::Label));
    }

    #[test]
    fn test_no_kind_admits_bulk_list_delimiters() {
        for kind in ALL_KINDS {
            assert!(!kind.admits(','), "{kind:?} admits ','");
            if kind != FieldKind::Password {
                assert!(!kind.admits(';'), "{kind:?} admits ';'");
            }
            if kind != FieldKind::Label {
                assert!(!kind.admits(' '), "{kind:?} admits ' '");
            }
        }
    }

    #[test]
    fn test_single_foreign_character_rejects_whole_string() {
        let samples = [
            (FieldKind::Login, "abc_def", '.'),
            (FieldKind::Password, "abc#def", '"'),
            (FieldKind::Word, "abcdef", '1'),
            (FieldKind::Number, "12345", 'x'),
            (FieldKind::NumberWord, "12ab", '_'),
            (FieldKind::Label, "ab cd", ','),
        ];
        for (kind, base, foreign) in samples {
            assert!(accepts(base, kind));
            for pos in 0..=base.len() {
                let mut s = base.to_string();
                s.insert(pos, foreign);
                assert!(!accepts(&s, kind), "{kind:?} accepted {s:?}");
            }
        }
    }

    #[test]
    fn test_check_order_and_bounds() {
        assert_eq!(
            check("", FieldKind::Login, Field::Login, 32, true),
            Err(ValidationError::Empty(Field::Login))
        );
        assert!(check("", FieldKind::Word, Field::Patronymic, 64, false).is_ok());
        assert_eq!(
            check(&"a".repeat(33), FieldKind::Login, Field::Login, 32, true),
            Err(ValidationError::TooLong { field: Field::Login, max: 32 })
        );
        assert!(check(&"я".repeat(32), FieldKind::Login, Field::Login, 32, true).is_ok());
        assert!(matches!(
            check("a b", FieldKind::Login, Field::Login, 32, true),
            Err(ValidationError::ForbiddenCharacters { field: Field::Login, .. })
        ));
    }
}
