//! The signed-in session and every operation the user can trigger.
//!
//! [`Session`] owns the active account and both caches. Each operation
//! validates its input, sends exactly one request (two for a password
//! change), and touches the caches only once the server has confirmed.
//! Any error leaves the session exactly as it was.

use chrono::NaiveDate;
use tracing::{info, warn};

use pap_net::Transport;
use pap_shared::codec;
use pap_shared::contact::{Contact, ContactForm};
use pap_shared::protocol::{Reply, Request, Status};
use pap_shared::types::{AccountName, EventLabel, Password};
use pap_shared::{Field, ValidationError};
use pap_store::{ContactStore, EventIndex, StoreError};

use crate::error::ClientError;

/// Active account plus the caches that belong to it.
///
/// Invariant: no account means both caches are empty.
pub struct Session<T> {
    transport: T,
    account: Option<AccountName>,
    contacts: ContactStore,
    events: EventIndex,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            account: None,
            contacts: ContactStore::new(),
            events: EventIndex::new(),
        }
    }

    pub fn account(&self) -> Option<&AccountName> {
        self.account.as_ref()
    }

    pub fn contacts(&self) -> &ContactStore {
        &self.contacts
    }

    pub fn events(&self) -> &EventIndex {
        &self.events
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -- account ------------------------------------------------------------

    pub async fn login(&mut self, login: &str, password: &str) -> Result<(), ClientError> {
        let account = AccountName::new(login)?;
        let password = Password::new(password, Field::Password)?;

        let reply = self.request(Request::login(&account, &password)).await?;
        reject_unless_ok(&reply)?;

        self.start(account);
        Ok(())
    }

    pub async fn register(
        &mut self,
        login: &str,
        password: &str,
        confirm: &str,
    ) -> Result<(), ClientError> {
        let account = AccountName::new(login)?;
        require(password, Field::Password)?;
        require(confirm, Field::PasswordConfirmation)?;
        if password != confirm {
            return Err(ValidationError::PasswordMismatch.into());
        }
        let password = Password::new(password, Field::Password)?;
        let confirm = Password::new(confirm, Field::PasswordConfirmation)?;

        let reply = self
            .request(Request::register(&account, &password, &confirm))
            .await?;
        reject_unless_ok(&reply)?;

        info!(account = %account, "Account registered");
        self.start(account);
        Ok(())
    }

    /// Re-checks `old` with a `login` request before sending the change.
    pub async fn change_password(
        &mut self,
        old: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), ClientError> {
        let account = self.active_account()?;
        require(old, Field::OldPassword)?;
        require(new, Field::NewPassword)?;
        require(confirm, Field::PasswordConfirmation)?;
        let new_password = Password::new(new, Field::NewPassword)?;
        if new != confirm {
            return Err(ValidationError::PasswordMismatch.into());
        }
        if old == new {
            return Err(ValidationError::SamePassword.into());
        }
        let old_password = Password::new(old, Field::OldPassword)?;

        let check = self.request(Request::login(&account, &old_password)).await?;
        reject_unless_ok(&check)?;

        let reply = self
            .request(Request::change_password(&account, &new_password))
            .await?;
        reject_unless_ok(&reply)?;

        info!(account = %account, "Password changed");
        Ok(())
    }

    /// Drop the account and both caches together.
    pub fn logout(&mut self) {
        if let Some(account) = self.account.take() {
            info!(account = %account, "Logged out");
        }
        self.contacts.clear();
        self.events.clear();
    }

    // -- contacts -----------------------------------------------------------

    /// Reload the contact cache. Returns the number of contacts.
    pub async fn refresh_contacts(&mut self) -> Result<usize, ClientError> {
        let account = self.active_account()?;
        let reply = self.request(Request::get_contacts(&account)).await?;
        match reply.status {
            Status::Empty => self.contacts.clear(),
            Status::Ok => self.contacts.load(codec::decode_contacts(&reply.payload)),
            _ => return Err(rejection(&reply)),
        }
        Ok(self.contacts.len())
    }

    /// Add a contact; surname, name and patronymic are capitalized first.
    /// Returns its index.
    pub async fn add_contact(&mut self, form: &ContactForm) -> Result<usize, ClientError> {
        let account = self.active_account()?;
        let contact = form.validate()?.capitalized();
        if self.contacts.find_index_by_phone(&contact.phone).is_some() {
            return Err(ValidationError::DuplicatePhone(contact.phone.to_string()).into());
        }

        let reply = self.request(Request::add_contact(&account, &contact)).await?;
        reject_unless_ok(&reply)?;

        info!(phone = %contact.phone, "Contact added");
        self.contacts.append(contact)?;
        Ok(self.contacts.len() - 1)
    }

    /// Replace every field of the contact at `index`, addressed on the
    /// server by its current phone.
    pub async fn edit_contact(
        &mut self,
        index: usize,
        form: &ContactForm,
    ) -> Result<(), ClientError> {
        let account = self.active_account()?;
        let current = self.contact_at(index)?.clone();
        let updated = form.validate()?;
        if updated == current {
            return Err(ValidationError::Unchanged.into());
        }
        if let Some(other) = self.contacts.find_index_by_phone(&updated.phone) {
            if other != index {
                return Err(ValidationError::DuplicatePhone(updated.phone.to_string()).into());
            }
        }

        let reply = self
            .request(Request::change_contact(&account, &current.phone, &updated))
            .await?;
        reject_unless_ok(&reply)?;

        info!(old_phone = %current.phone, phone = %updated.phone, "Contact changed");
        self.contacts.replace_at(index, updated)?;
        Ok(())
    }

    pub async fn remove_contact(&mut self, index: usize) -> Result<Contact, ClientError> {
        let account = self.active_account()?;
        let phone = self.contact_at(index)?.phone.clone();

        let reply = self.request(Request::remove_contact(&account, &phone)).await?;
        reject_unless_ok(&reply)?;

        info!(phone = %phone, "Contact removed");
        Ok(self.contacts.remove_at(index)?)
    }

    // -- events -------------------------------------------------------------

    /// Reload the event index. Returns the number of events.
    pub async fn refresh_events(&mut self) -> Result<usize, ClientError> {
        let account = self.active_account()?;
        let reply = self.request(Request::get_events(&account)).await?;
        match reply.status {
            Status::Empty => self.events.clear(),
            Status::Ok => self.events.load(codec::decode_events(&reply.payload)),
            _ => return Err(rejection(&reply)),
        }
        Ok(self.events.len())
    }

    pub async fn add_event(
        &mut self,
        date: NaiveDate,
        label: &str,
    ) -> Result<EventLabel, ClientError> {
        let account = self.active_account()?;
        let label = EventLabel::new(label)?;
        if self.events.contains(date, &label) {
            return Err(ValidationError::DuplicateLabel(label.to_string()).into());
        }

        let reply = self
            .request(Request::add_event(&account, date, &label))
            .await?;
        reject_unless_ok(&reply)?;

        info!(%date, label = %label, "Event added");
        self.events.insert(date, label.clone());
        Ok(label)
    }

    pub async fn remove_event(
        &mut self,
        date: NaiveDate,
        label: &EventLabel,
    ) -> Result<(), ClientError> {
        let account = self.active_account()?;
        self.require_event(date, label)?;

        let reply = self
            .request(Request::remove_event(&account, date, label))
            .await?;
        reject_unless_ok(&reply)?;

        info!(%date, label = %label, "Event removed");
        self.events.remove(date, label);
        Ok(())
    }

    pub async fn rename_event(
        &mut self,
        date: NaiveDate,
        old: &EventLabel,
        new: &str,
    ) -> Result<EventLabel, ClientError> {
        let account = self.active_account()?;
        let new = EventLabel::new(new)?;
        self.require_event(date, old)?;
        if &new == old {
            return Err(ValidationError::Unchanged.into());
        }
        if self.events.contains(date, &new) {
            return Err(ValidationError::DuplicateLabel(new.to_string()).into());
        }

        let reply = self
            .request(Request::change_event(&account, date, old, &new))
            .await?;
        reject_unless_ok(&reply)?;

        info!(%date, old = %old, new = %new, "Event renamed");
        self.events.rename(date, old, new.clone());
        Ok(new)
    }

    // -- helpers ------------------------------------------------------------

    async fn request(&self, request: Request) -> Result<Reply, ClientError> {
        let raw = self.transport.send(&request).await?;
        Ok(Reply::parse(request.verb(), &raw))
    }

    fn start(&mut self, account: AccountName) {
        info!(account = %account, "Logged in");
        self.account = Some(account);
        self.contacts.clear();
        self.events.clear();
    }

    fn active_account(&self) -> Result<AccountName, ClientError> {
        self.account.clone().ok_or(ClientError::NotLoggedIn)
    }

    fn contact_at(&self, index: usize) -> Result<&Contact, ClientError> {
        self.contacts.get(index).ok_or_else(|| {
            StoreError::IndexOutOfRange {
                index,
                len: self.contacts.len(),
            }
            .into()
        })
    }

    fn require_event(&self, date: NaiveDate, label: &EventLabel) -> Result<(), ClientError> {
        if self.events.contains(date, label) {
            Ok(())
        } else {
            Err(ClientError::NoSuchEvent {
                date,
                label: label.clone(),
            })
        }
    }
}

fn require(text: &str, field: Field) -> Result<(), ValidationError> {
    if text.is_empty() {
        Err(ValidationError::Empty(field))
    } else {
        Ok(())
    }
}

fn rejection(reply: &Reply) -> ClientError {
    warn!(verb = %reply.verb, status = ?reply.status, response = %reply.payload, "Server rejected request");
    ClientError::Rejected {
        verb: reply.verb,
        status: reply.status,
    }
}

fn reject_unless_ok(reply: &Reply) -> Result<(), ClientError> {
    if reply.is_ok() {
        Ok(())
    } else {
        Err(rejection(reply))
    }
}

#[cfg(test)]
mod tests {
    use pap_net::NetError;
    use pap_shared::protocol::{DUPLICATE_PHONE, NO_CONTACTS, NO_EVENTS};

    use super::*;
    use crate::testing::ScriptedTransport;

    const IVANOV: &str = "Ivanov,Ivan,Ivanovich,1990-01-01,Moscow,Lenina,5a,12,79991234567;";

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn label(s: &str) -> EventLabel {
        EventLabel::new(s).unwrap()
    }

    fn form(surname: &str, phone: &str) -> ContactForm {
        ContactForm {
            surname: surname.into(),
            name: "ivan".into(),
            phone: phone.into(),
            ..Default::default()
        }
    }

    /// Transport whose first reply accepts the login.
    fn after_login() -> ScriptedTransport {
        ScriptedTransport::new().reply("ok")
    }

    async fn logged_in(transport: ScriptedTransport) -> Session<ScriptedTransport> {
        let mut session = Session::new(transport);
        session.login("ivan", "Secr3t!").await.unwrap();
        session
    }

    fn assert_empty<T: Transport>(session: &Session<T>) {
        assert!(session.account().is_none());
        assert!(session.contacts().is_empty());
        assert!(session.events().is_empty());
    }

    #[tokio::test]
    async fn test_login_sets_account() {
        let session = logged_in(after_login()).await;
        assert_eq!(session.account().unwrap().as_str(), "ivan");
        assert_eq!(session.transport().sent(), ["login ivan Secr3t!"]);
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_session_logged_out() {
        let mut session = Session::new(ScriptedTransport::new().reply("wrong password"));
        let err = session.login("ivan", "nope").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Rejected {
                status: Status::WrongPassword,
                ..
            }
        ));
        assert_empty(&session);
    }

    #[tokio::test]
    async fn test_login_validation_sends_nothing() {
        let mut session = Session::new(ScriptedTransport::new());
        assert!(matches!(
            session.login("bad login", "x").await,
            Err(ClientError::Validation(ValidationError::ForbiddenCharacters {
                field: Field::Login,
                ..
            }))
        ));
        assert!(session.login("ivan", &"p".repeat(33)).await.is_err());
        assert!(session.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn test_communication_failure_on_login() {
        let mut session = Session::new(ScriptedTransport::new().fail(NetError::Closed));
        let err = session.login("ivan", "Secr3t!").await.unwrap_err();
        assert!(err.is_communication());
        assert_empty(&session);
    }

    #[tokio::test]
    async fn test_blank_login_reply_is_not_success() {
        let mut session = Session::new(ScriptedTransport::new().reply(""));
        let err = session.login("ivan", "Secr3t!").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Rejected {
                status: Status::NoResponse,
                ..
            }
        ));
        assert_empty(&session);
    }

    #[tokio::test]
    async fn test_register() {
        let mut session = Session::new(ScriptedTransport::new().reply("login already exists"));
        assert!(matches!(
            session.register("ivan", "a", "b").await,
            Err(ClientError::Validation(ValidationError::PasswordMismatch))
        ));
        assert!(session.transport().sent().is_empty());

        let err = session.register("ivan", "pw", "pw").await.unwrap_err();
        assert_eq!(err.user_message(), "An account with this login already exists");
        assert_empty(&session);

        session.transport().push_reply("registered");
        session.register("ivan", "pw", "pw").await.unwrap();
        assert_eq!(session.account().unwrap().as_str(), "ivan");
        assert_eq!(session.transport().sent()[1], "register ivan pw pw");
    }

    #[tokio::test]
    async fn test_change_password_flow() {
        let session_transport = after_login()
            .reply("wrong password")
            .reply("ok")
            .reply("password changed");
        let mut session = logged_in(session_transport).await;

        assert!(matches!(
            session.change_password("old", "old", "old").await,
            Err(ClientError::Validation(ValidationError::SamePassword))
        ));
        assert!(matches!(
            session.change_password("old", "new1", "new2").await,
            Err(ClientError::Validation(ValidationError::PasswordMismatch))
        ));
        assert_eq!(session.transport().sent().len(), 1);

        let err = session.change_password("bad", "new", "new").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Rejected {
                status: Status::WrongPassword,
                ..
            }
        ));

        session.change_password("Secr3t!", "n3w!", "n3w!").await.unwrap();
        let sent = session.transport().sent();
        assert_eq!(&sent[sent.len() - 2..], ["login ivan Secr3t!", "change_password ivan n3w!"]);
    }

    #[tokio::test]
    async fn test_change_password_requires_login() {
        let mut session = Session::new(ScriptedTransport::new());
        assert!(matches!(
            session.change_password("a", "b", "b").await,
            Err(ClientError::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn test_refresh_contacts_single_record() {
        let mut session = logged_in(after_login().reply(IVANOV)).await;
        assert_eq!(session.refresh_contacts().await.unwrap(), 1);
        let phone = pap_shared::Phone::new("79991234567").unwrap();
        assert_eq!(session.contacts().find_index_by_phone(&phone), Some(0));
        assert_eq!(session.transport().sent()[1], "get_contacts ivan");
    }

    #[tokio::test]
    async fn test_refresh_contacts_empty_sentinel() {
        let mut session = logged_in(after_login().reply(NO_CONTACTS)).await;
        assert_eq!(session.refresh_contacts().await.unwrap(), 0);
        assert!(session.contacts().is_empty());
    }

    #[tokio::test]
    async fn test_add_contact_applied_after_confirmation() {
        let transport = after_login()
            .reply("contact added")
            .reply(DUPLICATE_PHONE);
        let mut session = logged_in(transport).await;

        let index = session
            .add_contact(&form("ivanov", "+79991234567"))
            .await
            .unwrap();
        assert_eq!(index, 0);
        assert_eq!(session.contacts().get(0).unwrap().surname.as_str(), "Ivanov");
        assert_eq!(
            session.transport().sent()[1],
            "add_contact ivan Ivanov Ivan       79991234567"
        );

        let err = session
            .add_contact(&form("petrov", "79990000002"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Rejected {
                status: Status::DuplicatePhone,
                ..
            }
        ));
        assert_eq!(session.contacts().len(), 1);
    }

    #[tokio::test]
    async fn test_add_contact_blank_reply_keeps_cache() {
        let mut session = logged_in(after_login().reply("\r\n")).await;
        let err = session
            .add_contact(&form("Ivanov", "79991234567"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Rejected {
                status: Status::NoResponse,
                ..
            }
        ));
        assert!(session.contacts().is_empty());
    }

    #[tokio::test]
    async fn test_add_contact_local_duplicate_sends_nothing() {
        let mut session = logged_in(after_login().reply(IVANOV)).await;
        session.refresh_contacts().await.unwrap();

        let err = session
            .add_contact(&form("Petrov", "79991234567"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::DuplicatePhone(_))
        ));
        assert_eq!(session.transport().sent().len(), 2);
    }

    #[tokio::test]
    async fn test_add_contact_communication_failure_keeps_cache() {
        let mut session = logged_in(after_login().fail(NetError::Closed)).await;
        assert!(session
            .add_contact(&form("Ivanov", "79991234567"))
            .await
            .unwrap_err()
            .is_communication());
        assert!(session.contacts().is_empty());
    }

    #[tokio::test]
    async fn test_edit_contact() {
        let transport = after_login().reply(IVANOV).reply("contact changed");
        let mut session = logged_in(transport).await;
        session.refresh_contacts().await.unwrap();

        let current = ContactForm::from(session.contacts().get(0).unwrap());
        assert!(matches!(
            session.edit_contact(0, &current).await,
            Err(ClientError::Validation(ValidationError::Unchanged))
        ));

        let mut changed = current.clone();
        changed.city = "Kazan".into();
        changed.phone = "79990000000".into();
        session.edit_contact(0, &changed).await.unwrap();

        let contact = session.contacts().get(0).unwrap();
        assert_eq!(contact.city.as_str(), "Kazan");
        assert_eq!(
            session.transport().sent()[2],
            "change_contact ivan 79991234567 Ivanov Ivan Ivanovich 1990-01-01 Kazan Lenina 5a 12 79990000000"
        );
    }

    #[tokio::test]
    async fn test_edit_contact_out_of_range() {
        let mut session = logged_in(after_login()).await;
        assert!(matches!(
            session.edit_contact(0, &form("A", "79990000000")).await,
            Err(ClientError::Store(StoreError::IndexOutOfRange { .. }))
        ));
    }

    #[tokio::test]
    async fn test_remove_contact() {
        let transport = after_login()
            .reply(IVANOV)
            .fail(NetError::Closed);
        let mut session = logged_in(transport).await;
        session.refresh_contacts().await.unwrap();

        assert!(session.remove_contact(0).await.is_err());
        assert_eq!(session.contacts().len(), 1);

        session.transport().push_reply("removed");
        let removed = session.remove_contact(0).await.unwrap();
        assert_eq!(removed.phone.as_str(), "79991234567");
        assert!(session.contacts().is_empty());
        assert_eq!(
            session.transport().sent().last().unwrap(),
            "remove_contact ivan 79991234567"
        );
    }

    #[tokio::test]
    async fn test_refresh_events_restores_labels() {
        let transport = after_login().reply("2024-05-01,Meeting_with_team,Dentist;");
        let mut session = logged_in(transport).await;
        assert_eq!(session.refresh_events().await.unwrap(), 2);
        assert_eq!(
            session.events().list_for(date(1)),
            [label("Meeting with team"), label("Dentist")]
        );
    }

    #[tokio::test]
    async fn test_refresh_events_empty_sentinel() {
        let mut session = logged_in(after_login().reply(NO_EVENTS)).await;
        assert_eq!(session.refresh_events().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_oversized_label_rejected_before_sending() {
        let mut session = logged_in(after_login()).await;
        let err = session.add_event(date(1), &"a".repeat(257)).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::TooLong {
                field: Field::EventLabel,
                max: 256
            })
        ));
        assert_eq!(session.transport().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_add_event_requires_exact_success() {
        let transport = after_login()
            .reply("ok")
            .reply("successful add_event");
        let mut session = logged_in(transport).await;

        let err = session.add_event(date(1), "Gym").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Rejected {
                status: Status::Unrecognized,
                ..
            }
        ));
        assert!(!session.events().has_events(date(1)));

        let added = session.add_event(date(1), "Meeting  with team").await.unwrap();
        assert_eq!(added, label("Meeting with team"));
        assert_eq!(
            session.transport().sent().last().unwrap(),
            "add_event ivan 2024-05-01 Meeting_with_team"
        );
        assert!(session.events().has_events(date(1)));
    }

    #[tokio::test]
    async fn test_remove_event_unconfirmed_keeps_label() {
        let transport = after_login()
            .reply("2024-05-01,Dentist;")
            .reply("something else");
        let mut session = logged_in(transport).await;
        session.refresh_events().await.unwrap();

        assert!(session.remove_event(date(1), &label("Dentist")).await.is_err());
        assert!(session.events().contains(date(1), &label("Dentist")));

        session.transport().push_reply("successful remove_event");
        session.remove_event(date(1), &label("Dentist")).await.unwrap();
        assert!(!session.events().has_events(date(1)));
    }

    #[tokio::test]
    async fn test_remove_unknown_event_sends_nothing() {
        let mut session = logged_in(after_login()).await;
        assert!(matches!(
            session.remove_event(date(1), &label("Gym")).await,
            Err(ClientError::NoSuchEvent { .. })
        ));
        assert_eq!(session.transport().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_rename_event() {
        let transport = after_login()
            .reply("2024-05-01,Gym,Dentist;")
            .fail(NetError::Closed)
            .reply("successful change_event");
        let mut session = logged_in(transport).await;
        session.refresh_events().await.unwrap();

        assert!(matches!(
            session.rename_event(date(1), &label("Gym"), "Dentist").await,
            Err(ClientError::Validation(ValidationError::DuplicateLabel(_)))
        ));

        assert!(session
            .rename_event(date(1), &label("Gym"), "Swim")
            .await
            .is_err());
        assert_eq!(session.events().list_for(date(1)), [label("Gym"), label("Dentist")]);

        session
            .rename_event(date(1), &label("Gym"), "Morning swim")
            .await
            .unwrap();
        assert_eq!(
            session.events().list_for(date(1)),
            [label("Dentist"), label("Morning swim")]
        );
        assert_eq!(
            session.transport().sent().last().unwrap(),
            "change_event ivan 2024-05-01 Gym Morning_swim"
        );
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let transport = after_login()
            .reply(IVANOV)
            .reply("2024-05-01,Gym;");
        let mut session = logged_in(transport).await;
        session.refresh_contacts().await.unwrap();
        session.refresh_events().await.unwrap();

        session.logout();
        assert_empty(&session);
        assert!(matches!(
            session.refresh_contacts().await,
            Err(ClientError::NotLoggedIn)
        ));
    }
}
