//! Summit core: conference entities, storage and the two pieces of domain
//! logic that carry real invariants.
//!
//! - **Filter Compiler** ([`filter`]): turns client filters into a validated
//!   conference query, enforcing the single-inequality-field rule
//! - **Registration Ledger** ([`ledger`]): atomic seat accounting and
//!   wishlists on top of [`store::Store`] transactions
//!
//! Everything here is synchronous and runtime-free. Time comes from an
//! [`env::Environment`], side effects leave through a
//! [`task::TaskDispatcher`], and cached texts go through an
//! [`announcement::Cache`]; the server crate supplies all three.
//!
//! ## Layout
//!
//! ```text
//! summit-core
//!   ├─ key           (UserId, ConferenceKey, SessionKey, SpeakerKey)
//!   ├─ entity        (Profile, Conference, Session, Speaker, Record)
//!   ├─ query         (Query, Operator, Value)
//!   ├─ store         (Store, Transaction, MemoryStore)
//!   ├─ filter        (compile)
//!   ├─ ledger        (Ledger)
//!   ├─ announcement  (Cache, MemoryCache, refresh_*)
//!   ├─ task          (Task, TaskDispatcher)
//!   ├─ caller        (Caller)
//!   └─ env           (Environment)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod announcement;
pub mod caller;
pub mod entity;
pub mod env;
pub mod filter;
pub mod key;
pub mod ledger;
pub mod query;
pub mod store;
pub mod task;

pub use announcement::{Cache, MemoryCache};
pub use caller::Caller;
pub use entity::{AnyKey, AnyRecord, Conference, Kind, Profile, Record, Session, Speaker};
pub use env::Environment;
pub use filter::FilterError;
pub use key::{ConferenceKey, KeyError, SessionKey, SpeakerKey, UserId};
pub use ledger::{Ledger, LedgerError};
pub use query::{Operator, Query, Value};
pub use store::{MemoryStore, Store, StoreError, Transaction};
pub use task::{Task, TaskDispatcher};
