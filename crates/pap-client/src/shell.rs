//! Line-oriented console front-end.
//!
//! Each input line is tokenized into a [`ShellCommand`] and executed
//! against a [`SessionHandle`]. Contacts are addressed by their 1-based
//! position in the last listing.

use std::fmt::Write as _;

use chrono::NaiveDate;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use pap_shared::constants::DATE_FORMAT;
use pap_shared::contact::ContactForm;
use pap_shared::types::EventLabel;
use pap_store::StoreError;

use crate::error::ClientError;
use crate::worker::{SessionHandle, SessionSnapshot};

const PROMPT: &str = "> ";

/// Separates the old and new label in `rename-event`.
const RENAME_ARROW: &str = "=>";

pub const HELP: &str = "\
Commands:
  login <login> <password>
  register <login> <password> <confirmation>
  passwd <old> <new> <confirmation>
  logout
  contacts
  add-contact key=value...      keys: surname name patronymic birth city street house apt phone
  edit-contact <n> key=value...
  rm-contact <n>
  events [yyyy-mm-dd]
  add-event <yyyy-mm-dd> <label>
  rm-event <yyyy-mm-dd> <label>
  rename-event <yyyy-mm-dd> <old label> => <new label>
  help
  quit";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown contact field '{0}'")]
    UnknownField(String),

    #[error("Invalid date '{0}', expected yyyy-mm-dd")]
    InvalidDate(String),

    #[error("Invalid contact number '{0}'")]
    InvalidNumber(String),
}

/// Failure of an executed command.
#[derive(Error, Debug)]
pub enum ShellError {
    /// Contact numbers are 1-based, as printed by `contacts`.
    #[error("No contact number {0}")]
    NoSuchContact(usize),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ShellError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(e) => e.user_message(),
            other => other.to_string(),
        }
    }

    /// Restate a store index error in terms of the listed number.
    fn for_contact(error: ClientError, number: usize) -> Self {
        match error {
            ClientError::Store(StoreError::IndexOutOfRange { .. }) => Self::NoSuchContact(number),
            other => Self::Client(other),
        }
    }
}

/// Contact field addressed by `key=value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKey {
    Surname,
    Name,
    Patronymic,
    Birth,
    City,
    Street,
    House,
    Apartment,
    Phone,
}

impl ContactKey {
    fn parse(key: &str) -> Result<Self, ParseError> {
        Ok(match key {
            "surname" => Self::Surname,
            "name" => Self::Name,
            "patronymic" => Self::Patronymic,
            "birth" => Self::Birth,
            "city" => Self::City,
            "street" => Self::Street,
            "house" => Self::House,
            "apt" => Self::Apartment,
            "phone" => Self::Phone,
            other => return Err(ParseError::UnknownField(other.to_string())),
        })
    }
}

/// One `key=value` assignment. An empty value clears the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Text(ContactKey, String),
    Birth(Option<NaiveDate>),
}

impl Assignment {
    fn parse(token: &str) -> Result<Self, ParseError> {
        let (key, value) = token
            .split_once('=')
            .ok_or(ParseError::Usage("contact fields are written key=value"))?;
        match ContactKey::parse(key)? {
            ContactKey::Birth if value.is_empty() => Ok(Self::Birth(None)),
            ContactKey::Birth => Ok(Self::Birth(Some(parse_date(value)?))),
            key => Ok(Self::Text(key, value.to_string())),
        }
    }

    fn apply(&self, form: &mut ContactForm) {
        let (key, value) = match self {
            Self::Birth(date) => {
                form.birth_date = *date;
                return;
            }
            Self::Text(key, value) => (key, value.clone()),
        };
        let slot = match key {
            ContactKey::Surname => &mut form.surname,
            ContactKey::Name => &mut form.name,
            ContactKey::Patronymic => &mut form.patronymic,
            ContactKey::City => &mut form.city,
            ContactKey::Street => &mut form.street,
            ContactKey::House => &mut form.house_number,
            ContactKey::Apartment => &mut form.apartment_number,
            ContactKey::Phone => &mut form.phone,
            ContactKey::Birth => return,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Login {
        login: String,
        password: String,
    },
    Register {
        login: String,
        password: String,
        confirm: String,
    },
    ChangePassword {
        old: String,
        new: String,
        confirm: String,
    },
    Logout,
    Contacts,
    AddContact(Vec<Assignment>),
    /// `number` is 1-based.
    EditContact {
        number: usize,
        changes: Vec<Assignment>,
    },
    RemoveContact(usize),
    Events(Option<NaiveDate>),
    AddEvent {
        date: NaiveDate,
        label: String,
    },
    RemoveEvent {
        date: NaiveDate,
        label: String,
    },
    RenameEvent {
        date: NaiveDate,
        old: String,
        new: String,
    },
    Help,
    Quit,
}

impl ShellCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        if name.is_empty() {
            return Ok(None);
        }
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match name {
            "login" => match args[..] {
                [login, password] => Self::Login {
                    login: login.to_string(),
                    password: password.to_string(),
                },
                _ => return Err(ParseError::Usage("login <login> <password>")),
            },
            "register" => match args[..] {
                [login, password, confirm] => Self::Register {
                    login: login.to_string(),
                    password: password.to_string(),
                    confirm: confirm.to_string(),
                },
                _ => {
                    return Err(ParseError::Usage(
                        "register <login> <password> <confirmation>",
                    ))
                }
            },
            "passwd" => match args[..] {
                [old, new, confirm] => Self::ChangePassword {
                    old: old.to_string(),
                    new: new.to_string(),
                    confirm: confirm.to_string(),
                },
                _ => return Err(ParseError::Usage("passwd <old> <new> <confirmation>")),
            },
            "logout" => Self::Logout,
            "contacts" => Self::Contacts,
            "add-contact" => Self::AddContact(parse_assignments(&args)?),
            "edit-contact" => match args.split_first() {
                Some((number, changes)) if !changes.is_empty() => Self::EditContact {
                    number: parse_number(number)?,
                    changes: parse_assignments(changes)?,
                },
                _ => return Err(ParseError::Usage("edit-contact <n> key=value...")),
            },
            "rm-contact" => match args[..] {
                [number] => Self::RemoveContact(parse_number(number)?),
                _ => return Err(ParseError::Usage("rm-contact <n>")),
            },
            "events" => match args[..] {
                [] => Self::Events(None),
                [date] => Self::Events(Some(parse_date(date)?)),
                _ => return Err(ParseError::Usage("events [yyyy-mm-dd]")),
            },
            "add-event" => {
                let (date, label) = date_and_label(rest, "add-event <yyyy-mm-dd> <label>")?;
                Self::AddEvent { date, label }
            }
            "rm-event" => {
                let (date, label) = date_and_label(rest, "rm-event <yyyy-mm-dd> <label>")?;
                Self::RemoveEvent { date, label }
            }
            "rename-event" => {
                const USAGE: &str = "rename-event <yyyy-mm-dd> <old label> => <new label>";
                let (date, labels) = date_and_label(rest, USAGE)?;
                let (old, new) = labels
                    .split_once(RENAME_ARROW)
                    .ok_or(ParseError::Usage(USAGE))?;
                Self::RenameEvent {
                    date,
                    old: old.trim().to_string(),
                    new: new.trim().to_string(),
                }
            }
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(ParseError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| ParseError::InvalidDate(text.to_string()))
}

fn parse_number(text: &str) -> Result<usize, ParseError> {
    match text.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::InvalidNumber(text.to_string())),
    }
}

fn parse_assignments(tokens: &[&str]) -> Result<Vec<Assignment>, ParseError> {
    tokens.iter().map(|t| Assignment::parse(t)).collect()
}

/// Split `<date> <rest of line>`; the label may contain spaces.
fn date_and_label(rest: &str, usage: &'static str) -> Result<(NaiveDate, String), ParseError> {
    let (date, label) = rest
        .split_once(char::is_whitespace)
        .ok_or(ParseError::Usage(usage))?;
    Ok((parse_date(date)?, label.trim().to_string()))
}

/// Console bound to a running session task.
pub struct Shell {
    handle: SessionHandle,
}

impl Shell {
    pub fn new(handle: SessionHandle) -> Self {
        Self { handle }
    }

    /// Read commands from `input` until `quit` or end of input.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        while let Some(line) = lines.next_line().await? {
            let text = match ShellCommand::parse(&line) {
                Ok(None) => String::new(),
                Ok(Some(ShellCommand::Quit)) => break,
                Ok(Some(command)) => match self.execute(command).await {
                    Ok(text) => text,
                    Err(e) => {
                        debug!(error = %e, "Command failed");
                        format!("Error: {}", e.user_message())
                    }
                },
                Err(e) => format!("{e} (type 'help' for the command list)"),
            };
            if !text.is_empty() {
                output.write_all(text.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;
        }
        Ok(())
    }

    /// Run one command and render its result.
    pub async fn execute(&self, command: ShellCommand) -> Result<String, ShellError> {
        let handle = &self.handle;
        match command {
            ShellCommand::Login { login, password } => {
                handle.login(&login, &password).await?;
                self.load_all().await?;
                Ok(format!("Logged in as {login}"))
            }
            ShellCommand::Register {
                login,
                password,
                confirm,
            } => {
                handle.register(&login, &password, &confirm).await?;
                self.load_all().await?;
                Ok(format!("Registered and logged in as {login}"))
            }
            ShellCommand::ChangePassword { old, new, confirm } => {
                handle.change_password(&old, &new, &confirm).await?;
                Ok("Password changed".to_string())
            }
            ShellCommand::Logout => {
                handle.logout().await?;
                Ok("Logged out".to_string())
            }
            ShellCommand::Contacts => {
                handle.refresh_contacts().await?;
                Ok(render_contacts(&handle.snapshot().await?))
            }
            ShellCommand::AddContact(changes) => {
                let mut form = ContactForm::default();
                for change in &changes {
                    change.apply(&mut form);
                }
                let index = handle.add_contact(form).await?;
                Ok(format!("Contact {} added", index + 1))
            }
            ShellCommand::EditContact { number, changes } => {
                let snapshot = handle.snapshot().await?;
                let index = number - 1;
                let mut form = snapshot
                    .contacts
                    .get(index)
                    .map(ContactForm::from)
                    .unwrap_or_default();
                for change in &changes {
                    change.apply(&mut form);
                }
                handle
                    .edit_contact(index, form)
                    .await
                    .map_err(|e| ShellError::for_contact(e, number))?;
                Ok(format!("Contact {number} changed"))
            }
            ShellCommand::RemoveContact(number) => {
                let removed = handle
                    .remove_contact(number - 1)
                    .await
                    .map_err(|e| ShellError::for_contact(e, number))?;
                Ok(format!("Removed {}", removed.summary()))
            }
            ShellCommand::Events(date) => {
                handle.refresh_events().await?;
                Ok(render_events(&handle.snapshot().await?, date))
            }
            ShellCommand::AddEvent { date, label } => {
                let label = handle.add_event(date, &label).await?;
                Ok(format!("Added '{label}' on {date}"))
            }
            ShellCommand::RemoveEvent { date, label } => {
                let label = EventLabel::new(&label).map_err(ClientError::from)?;
                handle.remove_event(date, label.clone()).await?;
                Ok(format!("Removed '{label}' from {date}"))
            }
            ShellCommand::RenameEvent { date, old, new } => {
                let old = EventLabel::new(&old).map_err(ClientError::from)?;
                let new = handle.rename_event(date, old.clone(), &new).await?;
                Ok(format!("Renamed '{old}' to '{new}' on {date}"))
            }
            ShellCommand::Help => Ok(HELP.to_string()),
            ShellCommand::Quit => Ok(String::new()),
        }
    }

    async fn load_all(&self) -> Result<(), ClientError> {
        self.handle.refresh_contacts().await?;
        self.handle.refresh_events().await?;
        Ok(())
    }
}

fn render_contacts(snapshot: &SessionSnapshot) -> String {
    if snapshot.contacts.is_empty() {
        return "No contacts".to_string();
    }
    let mut out = String::new();
    for (i, contact) in snapshot.contacts.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {}", i + 1, contact.summary());
    }
    out.truncate(out.trim_end().len());
    out
}

fn render_events(snapshot: &SessionSnapshot, date: Option<NaiveDate>) -> String {
    let events = &snapshot.events;
    let dates: Vec<NaiveDate> = match date {
        Some(date) => vec![date],
        None => events.dates().collect(),
    };
    let mut out = String::new();
    for date in dates {
        let labels = events.list_for(date);
        if labels.is_empty() {
            continue;
        }
        let labels: Vec<&str> = labels.iter().map(EventLabel::as_str).collect();
        let _ = writeln!(out, "{date}: {}", labels.join(", "));
    }
    if out.is_empty() {
        return "No events".to_string();
    }
    out.truncate(out.trim_end().len());
    out
}
