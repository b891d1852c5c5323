//! Record encoding and bulk-list decoding.
//!
//! Bulk lists (`get_contacts`, `get_events`) are `;`-terminated records of
//! `,`-separated fields. Decoding is lenient: a record that cannot be
//! parsed is logged and dropped, the rest of the list still loads.

use chrono::NaiveDate;
use tracing::warn;

use crate::constants::{DATE_FORMAT, FIELD_SEPARATOR, RECORD_SEPARATOR};
use crate::contact::Contact;
use crate::error::ProtocolError;
use crate::types::{ApartmentNumber, EventLabel, HouseNumber, Phone, Word};
use crate::validate::Field;

/// Number of fields in a contact record.
pub const CONTACT_FIELDS: usize = 9;

/// Contact fields in wire order: surname, name, patronymic, birth date,
/// city, street, house, apartment, phone. An absent birth date is an
/// empty field.
pub fn contact_fields(contact: &Contact) -> [String; CONTACT_FIELDS] {
    [
        contact.surname.as_str().to_string(),
        contact.name.as_str().to_string(),
        contact.patronymic.as_str().to_string(),
        contact
            .birth_date
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default(),
        contact.city.as_str().to_string(),
        contact.street.as_str().to_string(),
        contact.house_number.as_str().to_string(),
        contact.apartment_number.as_str().to_string(),
        contact.phone.as_str().to_string(),
    ]
}

/// Encode contacts the way `get_contacts` returns them.
pub fn encode_contact_list(contacts: &[Contact]) -> String {
    let mut out = String::new();
    for contact in contacts {
        out.push_str(&contact_fields(contact).join(","));
        out.push(RECORD_SEPARATOR);
    }
    out
}

/// Parse one contact record.
pub fn decode_contact(record: &str) -> Result<Contact, ProtocolError> {
    let mut fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
    // tolerate a trailing separator
    if fields.len() == CONTACT_FIELDS + 1 && fields.last() == Some(&"") {
        fields.pop();
    }
    if fields.len() != CONTACT_FIELDS {
        return Err(ProtocolError::FieldCount {
            expected: CONTACT_FIELDS,
            found: fields.len(),
        });
    }

    let birth_date = match fields[3] {
        "" => None,
        raw => Some(
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map_err(|_| ProtocolError::Date(raw.to_string()))?,
        ),
    };

    Ok(Contact {
        surname: Word::new(fields[0], Field::Surname)?,
        name: Word::new(fields[1], Field::Name)?,
        patronymic: Word::new(fields[2], Field::Patronymic)?,
        birth_date,
        city: Word::new(fields[4], Field::City)?,
        street: Word::new(fields[5], Field::Street)?,
        house_number: HouseNumber::new(fields[6])?,
        apartment_number: ApartmentNumber::new(fields[7])?,
        phone: Phone::new(fields[8])?,
    })
}

/// Parse a `get_contacts` payload. The `no contacts` sentinel must be
/// handled by the caller before getting here.
pub fn decode_contacts(payload: &str) -> Vec<Contact> {
    payload
        .split(RECORD_SEPARATOR)
        .filter(|record| !record.is_empty())
        .filter_map(|record| match decode_contact(record) {
            Ok(contact) => Some(contact),
            Err(e) => {
                warn!(record = %record, error = %e, "Skipping malformed contact record");
                None
            }
        })
        .collect()
}

/// Events of one calendar day as carried by a `get_events` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEvents {
    pub date: NaiveDate,
    pub labels: Vec<EventLabel>,
}

/// Parse one `date,label,label,...` record.
pub fn decode_day(record: &str) -> Result<DayEvents, ProtocolError> {
    let fields: Vec<&str> = record
        .split(FIELD_SEPARATOR)
        .filter(|field| !field.is_empty())
        .collect();
    if fields.len() < 2 {
        return Err(ProtocolError::FieldCount {
            expected: 2,
            found: fields.len(),
        });
    }

    let date = NaiveDate::parse_from_str(fields[0], DATE_FORMAT)
        .map_err(|_| ProtocolError::Date(fields[0].to_string()))?;

    let labels = fields[1..]
        .iter()
        .filter_map(|token| match EventLabel::from_wire(token) {
            Ok(label) => Some(label),
            Err(e) => {
                warn!(%date, token = %token, error = %e, "Skipping malformed event label");
                None
            }
        })
        .collect();

    Ok(DayEvents { date, labels })
}

/// Parse a `get_events` payload. The `no events` sentinel must be handled
/// by the caller.
pub fn decode_events(payload: &str) -> Vec<DayEvents> {
    payload
        .split(RECORD_SEPARATOR)
        .filter(|record| !record.is_empty())
        .filter_map(|record| match decode_day(record) {
            Ok(day) if !day.labels.is_empty() => Some(day),
            Ok(_) => None,
            Err(e) => {
                warn!(record = %record, error = %e, "Skipping malformed event record");
                None
            }
        })
        .collect()
}

/// Encode days the way `get_events` returns them.
pub fn encode_event_list(days: &[DayEvents]) -> String {
    let mut out = String::new();
    for day in days {
        out.push_str(&day.date.format(DATE_FORMAT).to_string());
        for label in &day.labels {
            out.push(FIELD_SEPARATOR);
            out.push_str(&label.to_wire());
        }
        out.push(RECORD_SEPARATOR);
    }
    out
}
