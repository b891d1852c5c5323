//! Background task owning the [`Session`].
//!
//! The UI side talks to it through a cloneable [`SessionHandle`]; every
//! command carries a oneshot for its result, and state changes are
//! announced on a separate notification channel. Commands run one at a
//! time, in arrival order.

use chrono::NaiveDate;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use pap_net::Transport;
use pap_shared::contact::{Contact, ContactForm};
use pap_shared::types::{AccountName, EventLabel};
use pap_store::EventIndex;

use crate::error::ClientError;
use crate::session::Session;

const COMMAND_CAPACITY: usize = 16;
const NOTIFICATION_CAPACITY: usize = 64;

type Reply<R> = oneshot::Sender<Result<R, ClientError>>;

/// Commands sent into the session task.
enum Command {
    Login {
        login: String,
        password: String,
        reply: Reply<()>,
    },
    Register {
        login: String,
        password: String,
        confirm: String,
        reply: Reply<()>,
    },
    ChangePassword {
        old: String,
        new: String,
        confirm: String,
        reply: Reply<()>,
    },
    Logout(oneshot::Sender<()>),
    RefreshContacts(Reply<usize>),
    AddContact {
        form: ContactForm,
        reply: Reply<usize>,
    },
    EditContact {
        index: usize,
        form: ContactForm,
        reply: Reply<()>,
    },
    RemoveContact {
        index: usize,
        reply: Reply<Contact>,
    },
    RefreshEvents(Reply<usize>),
    AddEvent {
        date: NaiveDate,
        label: String,
        reply: Reply<EventLabel>,
    },
    RemoveEvent {
        date: NaiveDate,
        label: EventLabel,
        reply: Reply<()>,
    },
    RenameEvent {
        date: NaiveDate,
        old: EventLabel,
        new: String,
        reply: Reply<EventLabel>,
    },
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// Notifications sent from the session task after a confirmed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotification {
    /// Logged in, registered or logged out.
    AccountChanged(Option<AccountName>),
    ContactsChanged,
    EventsChanged,
}

/// Copy of the session state for rendering.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub account: Option<AccountName>,
    pub contacts: Vec<Contact>,
    pub events: EventIndex,
}

/// Cloneable handle to the session task.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    pub async fn login(&self, login: &str, password: &str) -> Result<(), ClientError> {
        let (login, password) = (login.to_string(), password.to_string());
        self.call(|reply| Command::Login {
            login,
            password,
            reply,
        })
        .await?
    }

    pub async fn register(
        &self,
        login: &str,
        password: &str,
        confirm: &str,
    ) -> Result<(), ClientError> {
        let (login, password, confirm) =
            (login.to_string(), password.to_string(), confirm.to_string());
        self.call(|reply| Command::Register {
            login,
            password,
            confirm,
            reply,
        })
        .await?
    }

    pub async fn change_password(
        &self,
        old: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), ClientError> {
        let (old, new, confirm) = (old.to_string(), new.to_string(), confirm.to_string());
        self.call(|reply| Command::ChangePassword {
            old,
            new,
            confirm,
            reply,
        })
        .await?
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.call(Command::Logout).await
    }

    pub async fn refresh_contacts(&self) -> Result<usize, ClientError> {
        self.call(Command::RefreshContacts).await?
    }

    pub async fn add_contact(&self, form: ContactForm) -> Result<usize, ClientError> {
        self.call(|reply| Command::AddContact { form, reply }).await?
    }

    pub async fn edit_contact(&self, index: usize, form: ContactForm) -> Result<(), ClientError> {
        self.call(|reply| Command::EditContact { index, form, reply })
            .await?
    }

    pub async fn remove_contact(&self, index: usize) -> Result<Contact, ClientError> {
        self.call(|reply| Command::RemoveContact { index, reply })
            .await?
    }

    pub async fn refresh_events(&self) -> Result<usize, ClientError> {
        self.call(Command::RefreshEvents).await?
    }

    pub async fn add_event(&self, date: NaiveDate, label: &str) -> Result<EventLabel, ClientError> {
        let label = label.to_string();
        self.call(|reply| Command::AddEvent { date, label, reply })
            .await?
    }

    pub async fn remove_event(&self, date: NaiveDate, label: EventLabel) -> Result<(), ClientError> {
        self.call(|reply| Command::RemoveEvent { date, label, reply })
            .await?
    }

    pub async fn rename_event(
        &self,
        date: NaiveDate,
        old: EventLabel,
        new: &str,
    ) -> Result<EventLabel, ClientError> {
        let new = new.to_string();
        self.call(|reply| Command::RenameEvent {
            date,
            old,
            new,
            reply,
        })
        .await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, ClientError> {
        self.call(Command::Snapshot).await
    }

    /// Ask the task to stop. Later calls fail with
    /// [`ClientError::SessionClosed`].
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    async fn call<R>(
        &self,
        command: impl FnOnce(oneshot::Sender<R>) -> Command,
    ) -> Result<R, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| ClientError::SessionClosed)?;
        rx.await.map_err(|_| ClientError::SessionClosed)
    }
}

/// Spawn the session task.
///
/// Returns the handle for issuing commands and the receiver of
/// notifications. The task stops on [`SessionHandle::shutdown`] or once
/// every handle is dropped.
pub fn spawn_session<T>(
    mut session: Session<T>,
) -> (SessionHandle, mpsc::Receiver<SessionNotification>)
where
    T: Transport + 'static,
{
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(COMMAND_CAPACITY);
    let (notif_tx, notif_rx) = mpsc::channel::<SessionNotification>(NOTIFICATION_CAPACITY);

    tokio::spawn(async move {
        while let Some(command) = cmd_rx.recv().await {
            match command {
                Command::Login {
                    login,
                    password,
                    reply,
                } => {
                    let result = session.login(&login, &password).await;
                    let changed = SessionNotification::AccountChanged(session.account().cloned());
                    respond(reply, result, &notif_tx, changed);
                }
                Command::Register {
                    login,
                    password,
                    confirm,
                    reply,
                } => {
                    let result = session.register(&login, &password, &confirm).await;
                    let changed = SessionNotification::AccountChanged(session.account().cloned());
                    respond(reply, result, &notif_tx, changed);
                }
                Command::ChangePassword {
                    old,
                    new,
                    confirm,
                    reply,
                } => {
                    let _ = reply.send(session.change_password(&old, &new, &confirm).await);
                }
                Command::Logout(reply) => {
                    session.logout();
                    notify(&notif_tx, SessionNotification::AccountChanged(None));
                    let _ = reply.send(());
                }
                Command::RefreshContacts(reply) => {
                    let result = session.refresh_contacts().await;
                    respond(reply, result, &notif_tx, SessionNotification::ContactsChanged);
                }
                Command::AddContact { form, reply } => {
                    let result = session.add_contact(&form).await;
                    respond(reply, result, &notif_tx, SessionNotification::ContactsChanged);
                }
                Command::EditContact { index, form, reply } => {
                    let result = session.edit_contact(index, &form).await;
                    respond(reply, result, &notif_tx, SessionNotification::ContactsChanged);
                }
                Command::RemoveContact { index, reply } => {
                    let result = session.remove_contact(index).await;
                    respond(reply, result, &notif_tx, SessionNotification::ContactsChanged);
                }
                Command::RefreshEvents(reply) => {
                    let result = session.refresh_events().await;
                    respond(reply, result, &notif_tx, SessionNotification::EventsChanged);
                }
                Command::AddEvent { date, label, reply } => {
                    let result = session.add_event(date, &label).await;
                    respond(reply, result, &notif_tx, SessionNotification::EventsChanged);
                }
                Command::RemoveEvent { date, label, reply } => {
                    let result = session.remove_event(date, &label).await;
                    respond(reply, result, &notif_tx, SessionNotification::EventsChanged);
                }
                Command::RenameEvent {
                    date,
                    old,
                    new,
                    reply,
                } => {
                    let result = session.rename_event(date, &old, &new).await;
                    respond(reply, result, &notif_tx, SessionNotification::EventsChanged);
                }
                Command::Snapshot(reply) => {
                    let _ = reply.send(SessionSnapshot {
                        account: session.account().cloned(),
                        contacts: session.contacts().as_slice().to_vec(),
                        events: session.events().clone(),
                    });
                }
                Command::Shutdown => {
                    info!("Session shutdown requested");
                    break;
                }
            }
        }
        debug!("Session task stopped");
    });

    (SessionHandle { commands: cmd_tx }, notif_rx)
}

fn respond<R>(
    reply: Reply<R>,
    result: Result<R, ClientError>,
    notifications: &mpsc::Sender<SessionNotification>,
    changed: SessionNotification,
) {
    if result.is_ok() {
        notify(notifications, changed);
    }
    let _ = reply.send(result);
}

// A slow or absent listener must not stall the session.
fn notify(notifications: &mpsc::Sender<SessionNotification>, notification: SessionNotification) {
    if let Err(e) = notifications.try_send(notification) {
        debug!(error = %e, "Notification dropped");
    }
}
