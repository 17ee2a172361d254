//! Shared domain types used across the decoy crates.
//!
//! Everything here is plain data: messages exchanged with a correspondent and
//! the intelligence record accumulated over a session. Behaviour lives in the
//! crates that consume these types.

pub mod intelligence;
pub mod message;

pub use {
    intelligence::{Category, IntelligenceRecord},
    message::{Message, Sender, Timestamp},
};
