//! Session storage and management.
//!
//! Sessions live in memory behind per-session locks and are optionally
//! written through to a JSON file or a SQLite table.

pub mod file;
pub mod memory;
pub mod session;
pub mod sqlite;
pub mod store;

pub use {
    file::JsonFileBackend,
    memory::MemorySessionStore,
    session::Session,
    sqlite::SqliteSessionBackend,
    store::{Mutator, SessionBackend, SessionStore},
};
