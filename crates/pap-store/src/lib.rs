//! # pap-store
//!
//! Local caches of the remote store for the signed-in account.
//!
//! Both collections are mirrors: they are filled from a bulk load and then
//! mutated only after the server has confirmed the corresponding request,
//! so their contents always equal what the server would return right now.

pub mod contacts;
pub mod events;

mod error;

pub use contacts::ContactStore;
pub use error::StoreError;
pub use events::EventIndex;
