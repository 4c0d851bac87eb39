//! SQLx/SQLite persistence for the Warden policy model.
//!
//! [`SqlxPolicyStore`] implements the read contract the decision
//! engine consumes; [`PolicyAdmin`] carries the transactional
//! administrative writes; [`sync`] reconciles the persisted endpoint
//! catalog with the application's route catalog.

pub mod admin;
pub mod schema;
pub mod store;
pub mod sync;

pub use admin::PolicyAdmin;
pub use schema::ensure_schema;
pub use store::SqlxPolicyStore;
pub use sync::{sync_catalog, SyncChange, SyncOptions, SyncReport};
