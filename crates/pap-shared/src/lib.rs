//! # pap-shared
//!
//! Types and wire format shared by every PeopleAndPlaces crate: field
//! validation, the constrained field types, contact/event records, the
//! request/response protocol and the bulk-list codec.

pub mod codec;
pub mod constants;
pub mod contact;
pub mod error;
pub mod protocol;
pub mod types;
pub mod validate;

pub use codec::DayEvents;
pub use contact::{Contact, ContactForm};
pub use error::{ProtocolError, ValidationError};
pub use protocol::{Reply, Request, Status, Verb};
pub use types::{AccountName, ApartmentNumber, EventLabel, HouseNumber, Password, Phone, Word};
pub use validate::{accepts, Field, FieldKind};
