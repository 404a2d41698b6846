/*
 * error.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Tagliacarte, a cross-platform email client.
 *
 * Tagliacarte is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Tagliacarte is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Tagliacarte.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Error kinds shared by the row store, message database, folder registry
//! and live-view engine.

use std::fmt;

/// Errors surfaced by `panorama`. Open-time errors (the `Summary*` and
/// `AlreadyOpen` variants) are meant to be handled by the caller, who
/// decides whether to rebuild or fail; everything else is either a
/// programmer error surfaced for a `?` or a genuine I/O failure.
#[derive(Debug)]
pub enum DbError {
    FileNotFound,
    SummaryMissing,
    SummaryOutOfDate,
    SummaryCorrupt,
    AlreadyOpen,
    NotInitialized,
    MessageNotFound,
    FolderMissing,
    KeySpaceExhausted,
    InvalidOrMissingServer,
    UrlAborted,
    Offline,
    CrossPostingForbidden,
    OutOfMemory,
    StorageFailure(String),
    NotImplemented,
    AlreadyExists,
    Failure,
    /// Opaque lower-level failure that does not map to a named kind above.
    Other(String),
}

impl DbError {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::FileNotFound => write!(f, "file not found"),
            DbError::SummaryMissing => write!(f, "summary database missing"),
            DbError::SummaryOutOfDate => write!(f, "summary database out of date"),
            DbError::SummaryCorrupt => write!(f, "summary database corrupt"),
            DbError::AlreadyOpen => write!(f, "database already open"),
            DbError::NotInitialized => write!(f, "not initialized"),
            DbError::MessageNotFound => write!(f, "message not found"),
            DbError::FolderMissing => write!(f, "folder missing"),
            DbError::KeySpaceExhausted => write!(f, "message key space exhausted"),
            DbError::InvalidOrMissingServer => write!(f, "invalid or missing server"),
            DbError::UrlAborted => write!(f, "url aborted"),
            DbError::Offline => write!(f, "offline"),
            DbError::CrossPostingForbidden => write!(f, "cross-posting forbidden"),
            DbError::OutOfMemory => write!(f, "out of memory"),
            DbError::StorageFailure(m) => write!(f, "storage failure: {}", m),
            DbError::NotImplemented => write!(f, "not implemented"),
            DbError::AlreadyExists => write!(f, "already exists"),
            DbError::Failure => write!(f, "failure"),
            DbError::Other(m) => write!(f, "{}", m),
        }
    }
}

impl std::error::Error for DbError {}

impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            DbError::FileNotFound
        } else {
            DbError::StorageFailure(e.to_string())
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        DbError::StorageFailure(e.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
