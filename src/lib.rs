/*
 * lib.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Tagliacarte.
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

//! Per-folder message summary storage, a folder-tree registry, and a
//! cross-folder live-view query engine for a mail and news client.
//!
//! This crate owns the data that survives between sessions once a
//! message has been fetched: headers, threads, folder structure, and the
//! retention/offline policy that decides what stays on disk. It does not
//! speak IMAP, NNTP, SMTP or POP, parse MIME bodies, or render anything —
//! those live in other parts of the client.

pub mod config;
pub mod error;
pub mod filename_hash;
pub mod liveview;
pub mod msgdb;
pub mod policy;
pub mod registry;
pub mod rowstore;

pub use error::{DbError, DbResult};
