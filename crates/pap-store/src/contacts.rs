//! Ordered contact cache. Insertion order is display order.

use tracing::{debug, warn};

use pap_shared::contact::Contact;
use pap_shared::types::Phone;

use crate::error::{Result, StoreError};

/// Contacts of the active account, unique by phone.
#[derive(Debug, Clone, Default)]
pub struct ContactStore {
    contacts: Vec<Contact>,
}

impl ContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole content with a bulk load. Later records whose
    /// phone is already present are dropped.
    pub fn load(&mut self, contacts: Vec<Contact>) {
        self.contacts.clear();
        for contact in contacts {
            if let Err(e) = self.append(contact) {
                warn!(error = %e, "Dropping duplicate contact from bulk load");
            }
        }
        debug!(count = self.contacts.len(), "Contacts loaded");
    }

    pub fn append(&mut self, contact: Contact) -> Result<()> {
        if self.find_index_by_phone(&contact.phone).is_some() {
            return Err(StoreError::DuplicatePhone(contact.phone.to_string()));
        }
        self.contacts.push(contact);
        Ok(())
    }

    /// Replace the record at `index`. The new phone may equal the old one
    /// but must not belong to any other record.
    pub fn replace_at(&mut self, index: usize, contact: Contact) -> Result<Contact> {
        self.check_index(index)?;
        if let Some(other) = self.find_index_by_phone(&contact.phone) {
            if other != index {
                return Err(StoreError::DuplicatePhone(contact.phone.to_string()));
            }
        }
        Ok(std::mem::replace(&mut self.contacts[index], contact))
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Contact> {
        self.check_index(index)?;
        Ok(self.contacts.remove(index))
    }

    pub fn find_index_by_phone(&self, phone: &Phone) -> Option<usize> {
        self.contacts.iter().position(|c| &c.phone == phone)
    }

    pub fn get(&self, index: usize) -> Option<&Contact> {
        self.contacts.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.iter()
    }

    pub fn as_slice(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.contacts.len() {
            Ok(())
        } else {
            Err(StoreError::IndexOutOfRange {
                index,
                len: self.contacts.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pap_shared::contact::ContactForm;

    use super::*;

    fn contact(surname: &str, phone: &str) -> Contact {
        ContactForm {
            surname: surname.into(),
            name: "Ivan".into(),
            phone: phone.into(),
            ..Default::default()
        }
        .validate()
        .unwrap()
    }

    fn phone(p: &str) -> Phone {
        Phone::new(p).unwrap()
    }

    #[test]
    fn test_append_keeps_order() {
        let mut store = ContactStore::new();
        store.append(contact("Ivanov", "79990000001")).unwrap();
        store.append(contact("Petrov", "79990000002")).unwrap();

        let surnames: Vec<&str> = store.iter().map(|c| c.surname.as_str()).collect();
        assert_eq!(surnames, ["Ivanov", "Petrov"]);
        assert_eq!(store.find_index_by_phone(&phone("79990000002")), Some(1));
        assert_eq!(store.find_index_by_phone(&phone("79990000003")), None);
    }

    #[test]
    fn test_append_rejects_duplicate_phone() {
        let mut store = ContactStore::new();
        store.append(contact("Ivanov", "79990000001")).unwrap();
        assert_eq!(
            store.append(contact("Petrov", "79990000001")),
            Err(StoreError::DuplicatePhone("79990000001".into()))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_replace_at_allows_same_phone_but_not_anothers() {
        let mut store = ContactStore::new();
        store.append(contact("Ivanov", "79990000001")).unwrap();
        store.append(contact("Petrov", "79990000002")).unwrap();

        let old = store.replace_at(0, contact("Sidorov", "79990000001")).unwrap();
        assert_eq!(old.surname.as_str(), "Ivanov");
        assert_eq!(store.get(0).unwrap().surname.as_str(), "Sidorov");

        assert!(store.replace_at(0, contact("Sidorov", "79990000002")).is_err());
        assert_eq!(store.get(0).unwrap().phone.as_str(), "79990000001");

        store.replace_at(1, contact("Petrov", "79990000003")).unwrap();
        assert_eq!(store.find_index_by_phone(&phone("79990000003")), Some(1));
    }

    #[test]
    fn test_out_of_range() {
        let mut store = ContactStore::new();
        assert_eq!(
            store.remove_at(0),
            Err(StoreError::IndexOutOfRange { index: 0, len: 0 })
        );
        assert!(store.replace_at(3, contact("Ivanov", "79990000001")).is_err());
    }

    #[test]
    fn test_load_drops_duplicates_and_replaces_content() {
        let mut store = ContactStore::new();
        store.append(contact("Old", "79990000009")).unwrap();
        store.load(vec![
            contact("Ivanov", "79990000001"),
            contact("Again", "79990000001"),
            contact("Petrov", "79990000002"),
        ]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().surname.as_str(), "Ivanov");
        assert!(store.find_index_by_phone(&phone("79990000009")).is_none());
    }

    #[test]
    fn test_phones_stay_unique_across_mutations() {
        let mut store = ContactStore::new();
        let ops: [(&str, &str); 6] = [
            ("add", "79990000001"),
            ("add", "79990000002"),
            ("add", "79990000001"),
            ("edit0", "79990000002"),
            ("edit0", "79990000003"),
            ("add", "79990000001"),
        ];
        for (op, p) in ops {
            let _ = match op {
                "add" => store.append(contact("X", p)),
                _ => store.replace_at(0, contact("Y", p)).map(|_| ()),
            };
            let phones: HashSet<&str> = store.iter().map(|c| c.phone.as_str()).collect();
            assert_eq!(phones.len(), store.len());
        }
        assert_eq!(store.len(), 3);
    }
}
