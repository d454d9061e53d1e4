// src/error.rs
//! Errors surfaced to callers of the receptionist handle.
//!
//! Protocol operations themselves never fail: duplicates, unknown keys and
//! stale addresses all degrade to no-ops or empty listings. What can fail is
//! the caller's side of the conversation.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("receptionist is not running")]
    ReceptionistStopped,
    #[error("receptionist mailbox is full")]
    MailboxFull,
    #[error("no listing received within {0:?}")]
    Timeout(Duration),
    #[error("listing is for key {found}, not {expected}")]
    KeyMismatch { expected: String, found: String },
    #[error("failed to read config: {0}")]
    ConfigIo(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
