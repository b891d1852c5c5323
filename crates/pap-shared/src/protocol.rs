//! Line protocol spoken with the remote store.
//!
//! A request is `<verb> <account> <arg>...`, tokens separated by single
//! spaces with no quoting. A response is plain text; outcomes are told
//! apart by exact comparison with a handful of sentinel strings. [`Reply`]
//! turns that text into a closed [`Status`] so callers never compare
//! string literals themselves.

use std::fmt;

use chrono::NaiveDate;

use crate::codec;
use crate::constants::{DATE_FORMAT, TOKEN_SEPARATOR};
use crate::contact::Contact;
use crate::types::{AccountName, EventLabel, Password, Phone};

/// Legacy sentinel strings, compared by exact equality.
pub const WRONG_LOGIN: &str = "wrong login";
pub const WRONG_PASSWORD: &str = "wrong password";
pub const LOGIN_EXISTS: &str = "login already exists";
pub const DUPLICATE_PHONE: &str = "contact with this phone number is already exists";
pub const NO_CONTACTS: &str = "no contacts";
pub const NO_EVENTS: &str = "no events";
pub const ADD_EVENT_OK: &str = "successful add_event";
pub const REMOVE_EVENT_OK: &str = "successful remove_event";
pub const CHANGE_EVENT_OK: &str = "successful change_event";

/// First token of a request, selecting the server operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Login,
    Register,
    ChangePassword,
    GetContacts,
    AddContact,
    RemoveContact,
    ChangeContact,
    GetEvents,
    AddEvent,
    RemoveEvent,
    ChangeEvent,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::ChangePassword => "change_password",
            Self::GetContacts => "get_contacts",
            Self::AddContact => "add_contact",
            Self::RemoveContact => "remove_contact",
            Self::ChangeContact => "change_contact",
            Self::GetEvents => "get_events",
            Self::AddEvent => "add_event",
            Self::RemoveEvent => "remove_event",
            Self::ChangeEvent => "change_event",
        }
    }

    /// Verbs whose arguments carry a password and must not be logged.
    pub fn carries_secret(self) -> bool {
        matches!(self, Self::Login | Self::Register | Self::ChangePassword)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request, ready to be written to the connection.
#[derive(Clone, PartialEq, Eq)]
pub struct Request {
    verb: Verb,
    args: Vec<String>,
}

impl Request {
    fn new(verb: Verb, account: &AccountName, args: Vec<String>) -> Self {
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(account.as_str().to_string());
        all.extend(args);
        Self { verb, args: all }
    }

    pub fn login(account: &AccountName, password: &Password) -> Self {
        Self::new(Verb::Login, account, vec![password.as_str().to_string()])
    }

    pub fn register(account: &AccountName, password: &Password, confirm: &Password) -> Self {
        Self::new(
            Verb::Register,
            account,
            vec![password.as_str().to_string(), confirm.as_str().to_string()],
        )
    }

    pub fn change_password(account: &AccountName, new_password: &Password) -> Self {
        Self::new(
            Verb::ChangePassword,
            account,
            vec![new_password.as_str().to_string()],
        )
    }

    pub fn get_contacts(account: &AccountName) -> Self {
        Self::new(Verb::GetContacts, account, Vec::new())
    }

    pub fn add_contact(account: &AccountName, contact: &Contact) -> Self {
        Self::new(
            Verb::AddContact,
            account,
            codec::contact_fields(contact).to_vec(),
        )
    }

    pub fn remove_contact(account: &AccountName, phone: &Phone) -> Self {
        Self::new(Verb::RemoveContact, account, vec![phone.as_str().to_string()])
    }

    pub fn change_contact(account: &AccountName, old_phone: &Phone, contact: &Contact) -> Self {
        let mut args = vec![old_phone.as_str().to_string()];
        args.extend(codec::contact_fields(contact));
        Self::new(Verb::ChangeContact, account, args)
    }

    pub fn get_events(account: &AccountName) -> Self {
        Self::new(Verb::GetEvents, account, Vec::new())
    }

    pub fn add_event(account: &AccountName, date: NaiveDate, label: &EventLabel) -> Self {
        Self::new(
            Verb::AddEvent,
            account,
            vec![date.format(DATE_FORMAT).to_string(), label.to_wire()],
        )
    }

    pub fn remove_event(account: &AccountName, date: NaiveDate, label: &EventLabel) -> Self {
        Self::new(
            Verb::RemoveEvent,
            account,
            vec![date.format(DATE_FORMAT).to_string(), label.to_wire()],
        )
    }

    pub fn change_event(
        account: &AccountName,
        date: NaiveDate,
        old: &EventLabel,
        new: &EventLabel,
    ) -> Self {
        Self::new(
            Verb::ChangeEvent,
            account,
            vec![
                date.format(DATE_FORMAT).to_string(),
                old.to_wire(),
                new.to_wire(),
            ],
        )
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Wire text without any framing terminator.
    pub fn encode(&self) -> String {
        let mut line = self.verb.as_str().to_string();
        for arg in &self.args {
            line.push(TOKEN_SEPARATOR);
            line.push_str(arg);
        }
        line
    }
}

/// Redacts everything after the account for password-carrying verbs.
impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.verb.carries_secret() {
            let account = self.args.first().map(String::as_str).unwrap_or("");
            write!(f, "Request({} {} ***)", self.verb, account)
        } else {
            write!(f, "Request({})", self.encode())
        }
    }
}

/// Outcome of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The server confirmed the operation; any payload is in [`Reply::payload`].
    Ok,
    /// `no contacts` / `no events`: an explicitly empty collection.
    Empty,
    WrongLogin,
    WrongPassword,
    LoginExists,
    DuplicatePhone,
    /// Anything other than the exact success sentinel of an event verb.
    Unrecognized,
    /// Blank response: the outcome is unknown.
    NoResponse,
}

impl Status {
    /// Whether the server turned the request down.
    pub fn is_rejection(self) -> bool {
        !matches!(self, Self::Ok | Self::Empty)
    }

    /// User-facing explanation of a rejection.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Ok => "Done",
            Self::Empty => "Nothing stored yet",
            Self::WrongLogin => "No account with this login exists",
            Self::WrongPassword => "Wrong password",
            Self::LoginExists => "An account with this login already exists",
            Self::DuplicatePhone => "A contact with this phone number already exists",
            Self::Unrecognized => "The server did not confirm the operation",
            Self::NoResponse => "The server sent an empty response",
        }
    }
}

/// Structured view of a raw response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub verb: Verb,
    pub status: Status,
    pub payload: String,
}

impl Reply {
    /// Classify `raw` against the sentinel table of `verb`.
    ///
    /// Trailing CR/LF is ignored; everything else must match exactly. A
    /// blank response is never taken as success.
    pub fn parse(verb: Verb, raw: &str) -> Self {
        let text = raw.trim_end_matches(|c: char| c == '\r' || c == '\n');
        let status = match verb {
            _ if text.is_empty() => Status::NoResponse,
            Verb::Login => match text {
                WRONG_LOGIN => Status::WrongLogin,
                WRONG_PASSWORD => Status::WrongPassword,
                _ => Status::Ok,
            },
            Verb::Register => match text {
                LOGIN_EXISTS => Status::LoginExists,
                _ => Status::Ok,
            },
            Verb::AddContact => match text {
                DUPLICATE_PHONE => Status::DuplicatePhone,
                _ => Status::Ok,
            },
            Verb::GetContacts => match text {
                NO_CONTACTS => Status::Empty,
                _ => Status::Ok,
            },
            Verb::GetEvents => match text {
                NO_EVENTS => Status::Empty,
                _ => Status::Ok,
            },
            Verb::AddEvent => confirmed(text, ADD_EVENT_OK),
            Verb::RemoveEvent => confirmed(text, REMOVE_EVENT_OK),
            Verb::ChangeEvent => confirmed(text, CHANGE_EVENT_OK),
            Verb::ChangePassword | Verb::RemoveContact | Verb::ChangeContact => Status::Ok,
        };
        Self {
            verb,
            status,
            payload: text.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

fn confirmed(text: &str, success: &str) -> Status {
    if text == success {
        Status::Ok
    } else {
        Status::Unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::ContactForm;
    use crate::validate::Field;

    fn account() -> AccountName {
        AccountName::new("ivan").unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_login_encoding_and_redaction() {
        let password = Password::new("Secr3t!", Field::Password).unwrap();
        let request = Request::login(&account(), &password);
        assert_eq!(request.encode(), "login ivan Secr3t!");
        assert_eq!(format!("{request:?}"), "Request(login ivan ***)");
    }

    #[test]
    fn test_add_contact_field_order() {
        let contact = ContactForm {
            surname: "Ivanov".into(),
            name: "Ivan".into(),
            patronymic: "Ivanovich".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1),
            city: "Moscow".into(),
            street: "Lenina".into(),
            house_number: "5a".into(),
            apartment_number: "12".into(),
            phone: "79991234567".into(),
        }
        .validate()
        .unwrap();

        assert_eq!(
            Request::add_contact(&account(), &contact).encode(),
            "add_contact ivan Ivanov Ivan Ivanovich 1990-01-01 Moscow Lenina 5a 12 79991234567"
        );

        let old = Phone::new("79990000000").unwrap();
        assert_eq!(
            Request::change_contact(&account(), &old, &contact).encode(),
            "change_contact ivan 79990000000 Ivanov Ivan Ivanovich 1990-01-01 Moscow Lenina 5a 12 79991234567"
        );
    }

    #[test]
    fn test_event_requests_use_underscores() {
        let old = EventLabel::new("Meeting with team").unwrap();
        let new = EventLabel::new("Team lunch").unwrap();
        assert_eq!(
            Request::add_event(&account(), date(), &old).encode(),
            "add_event ivan 2024-05-01 Meeting_with_team"
        );
        assert_eq!(
            Request::change_event(&account(), date(), &old, &new).encode(),
            "change_event ivan 2024-05-01 Meeting_with_team Team_lunch"
        );
        assert_eq!(Request::get_events(&account()).encode(), "get_events ivan");
    }

    #[test]
    fn test_login_sentinels() {
        assert_eq!(Reply::parse(Verb::Login, "wrong login").status, Status::WrongLogin);
        assert_eq!(
            Reply::parse(Verb::Login, "wrong password\n").status,
            Status::WrongPassword
        );
        assert_eq!(Reply::parse(Verb::Login, "welcome").status, Status::Ok);
    }

    #[test]
    fn test_sentinels_are_scoped_to_their_verb() {
        assert_eq!(Reply::parse(Verb::Register, "wrong login").status, Status::Ok);
        assert_eq!(
            Reply::parse(Verb::AddContact, DUPLICATE_PHONE).status,
            Status::DuplicatePhone
        );
        assert_eq!(Reply::parse(Verb::GetContacts, "no contacts").status, Status::Empty);
        assert_eq!(Reply::parse(Verb::GetEvents, "no events").status, Status::Empty);
        assert_eq!(Reply::parse(Verb::GetEvents, "no contacts").status, Status::Ok);
    }

    #[test]
    fn test_event_verbs_require_exact_success() {
        assert!(Reply::parse(Verb::AddEvent, "successful add_event").is_ok());
        assert_eq!(
            Reply::parse(Verb::AddEvent, "successful remove_event").status,
            Status::Unrecognized
        );
        assert_eq!(
            Reply::parse(Verb::RemoveEvent, "error").status,
            Status::Unrecognized
        );
        assert_eq!(
            Reply::parse(Verb::ChangeEvent, " successful change_event").status,
            Status::Unrecognized
        );
        assert!(Status::Unrecognized.is_rejection());
        assert!(!Status::Empty.is_rejection());
    }

    #[test]
    fn test_blank_response_is_never_success() {
        for verb in [
            Verb::Login,
            Verb::Register,
            Verb::ChangePassword,
            Verb::GetContacts,
            Verb::AddContact,
            Verb::RemoveContact,
            Verb::ChangeContact,
            Verb::GetEvents,
            Verb::AddEvent,
        ] {
            for raw in ["", "\n", "\r\n"] {
                let reply = Reply::parse(verb, raw);
                assert_eq!(reply.status, Status::NoResponse, "{verb} {raw:?}");
                assert!(reply.status.is_rejection());
            }
        }
    }
}
