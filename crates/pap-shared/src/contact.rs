//! Contact records and the raw form they are built from.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::{ApartmentNumber, HouseNumber, Phone, Word};
use crate::validate::Field;

/// A contact as held in the local cache and sent to the remote store.
///
/// `phone` is the identity used to address updates and deletions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub surname: Word,
    pub name: Word,
    pub patronymic: Word,
    pub birth_date: Option<NaiveDate>,
    pub city: Word,
    pub street: Word,
    pub house_number: HouseNumber,
    pub apartment_number: ApartmentNumber,
    pub phone: Phone,
}

impl Contact {
    /// One-line rendering used by list views: `surname name phone`.
    pub fn summary(&self) -> String {
        format!("{} {} {}", self.surname, self.name, self.phone)
    }

    /// Surname, name and patronymic with their first letter upper-cased.
    pub fn capitalized(mut self) -> Self {
        self.surname = self.surname.capitalized();
        self.name = self.name.capitalized();
        self.patronymic = self.patronymic.capitalized();
        self
    }
}

/// Unvalidated contact fields as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    pub birth_date: Option<NaiveDate>,
    pub city: String,
    pub street: String,
    pub house_number: String,
    pub apartment_number: String,
    pub phone: String,
}

impl ContactForm {
    /// Validate every field and build a [`Contact`].
    ///
    /// Required fields are checked first, then character classes and
    /// lengths field by field, then the phone.
    pub fn validate(&self) -> Result<Contact, ValidationError> {
        for (value, field) in [
            (&self.surname, Field::Surname),
            (&self.name, Field::Name),
            (&self.phone, Field::Phone),
        ] {
            if value.is_empty() {
                return Err(ValidationError::Empty(field));
            }
        }

        Ok(Contact {
            surname: Word::required(&self.surname, Field::Surname)?,
            name: Word::required(&self.name, Field::Name)?,
            patronymic: Word::new(&self.patronymic, Field::Patronymic)?,
            birth_date: self.birth_date,
            city: Word::new(&self.city, Field::City)?,
            street: Word::new(&self.street, Field::Street)?,
            house_number: HouseNumber::new(&self.house_number)?,
            apartment_number: ApartmentNumber::new(&self.apartment_number)?,
            phone: Phone::new(&self.phone)?,
        })
    }
}

impl From<&Contact> for ContactForm {
    fn from(contact: &Contact) -> Self {
        Self {
            surname: contact.surname.as_str().to_string(),
            name: contact.name.as_str().to_string(),
            patronymic: contact.patronymic.as_str().to_string(),
            birth_date: contact.birth_date,
            city: contact.city.as_str().to_string(),
            street: contact.street.as_str().to_string(),
            house_number: contact.house_number.as_str().to_string(),
            apartment_number: contact.apartment_number.as_str().to_string(),
            phone: contact.phone.as_str().to_string(),
        }
    }
}
