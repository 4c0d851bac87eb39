//! Command implementations for the Warden CLI.
//!
//! Each submodule corresponds to a top-level CLI command.

/// Route listing — `warden routes`.
///
/// Renders the registered route catalog as a table: method, path,
/// handler, and owning module/submodule.
pub mod routes;

/// Policy seeding — `warden seed`.
///
/// Inserts the base action vocabulary and the sentinel module;
/// idempotent.
pub mod seed;

/// Catalog synchronization — `warden sync`.
///
/// Runs the endpoint-catalog synchronizer and prints the change
/// report. `--dry-run` rolls the transaction back.
pub mod sync;
