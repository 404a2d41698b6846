/*
 * mod.rs
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

//! Embedded, table-oriented KV store (spec §4.1): scoped rows with
//! token-keyed cells, ordered tables, commit/compress lifecycle.
//!
//! The on-disk format here is a simple self-describing layout (hex-ASCII
//! numbers, length-prefixed raw string bytes with a preserved form tag).
//! Spec §9's design note explicitly leaves the byte format to the
//! implementer; this is not required to be Mork-compatible.

mod hexnum;
pub mod row;
pub mod table;
pub mod token;

use crate::error::{DbError, DbResult};
use hexnum::{decode_hex, encode_hex16, encode_hex8};
use row::{CellValue, Row};
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use table::Table;
use token::{Token, TokenTable};

const MAGIC: &[u8; 8] = b"PANR1DB\0";
const FORMAT_VERSION: u32 = 1;

/// Commit granularity (spec §4.2.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    Small,
    Large,
    Compress,
    Session,
}

#[derive(Debug)]
pub struct RowStore {
    path: PathBuf,
    tokens: TokenTable,
    tables: HashMap<String, Table>,
    dirty: bool,
}

impl RowStore {
    /// Open (or create) the row-store file at `path`.
    pub fn open(path: impl AsRef<Path>, create: bool) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            if !create {
                return Err(DbError::SummaryMissing);
            }
            let store = Self {
                path,
                tokens: TokenTable::new(),
                tables: HashMap::new(),
                dirty: true,
            };
            return Ok(store);
        }
        let meta = fs::metadata(&path)?;
        if meta.len() == 0 {
            if !create {
                return Err(DbError::SummaryMissing);
            }
            return Ok(Self {
                path,
                tokens: TokenTable::new(),
                tables: HashMap::new(),
                dirty: true,
            });
        }
        let mut file = fs::File::open(&path)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        let (tokens, tables) = Self::deserialize(&buf)?;
        Ok(Self {
            path,
            tokens,
            tables,
            dirty: false,
        })
    }

    pub fn intern(&mut self, name: &str) -> Token {
        self.dirty = true;
        self.tokens.intern(name)
    }

    pub fn lookup_token(&self, name: &str) -> Option<Token> {
        self.tokens.lookup(name)
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_mut(&mut self, name: &str) -> &mut Table {
        self.dirty = true;
        self.tables
            .entry(name.to_string())
            .or_insert_with(|| Table::new(name))
    }

    pub fn remove_table(&mut self, name: &str) -> Option<Table> {
        self.dirty = true;
        self.tables.remove(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|s| s.as_str())
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Aggregate waste fraction across all tables; drives the automatic
    /// choice of `Compress` over `Large` (spec §4.2.4, ≥30% waste).
    pub fn waste_fraction(&self) -> f64 {
        let mut removed = 0usize;
        let mut total = 0usize;
        for t in self.tables.values() {
            let w = t.waste_fraction();
            let rows = t.len() as f64;
            // waste_fraction = removed / (removed + rows); recover removed.
            if w > 0.0 {
                let removed_here = (w * rows) / (1.0 - w);
                removed += removed_here.round() as usize;
            }
            total += t.len();
        }
        if total + removed == 0 {
            0.0
        } else {
            removed as f64 / (total + removed) as f64
        }
    }

    /// Commit at the requested level. `Compress` is upgraded to from
    /// `Large` automatically by callers checking `waste_fraction()`.
    pub fn commit(&mut self, kind: CommitKind) -> DbResult<()> {
        if !self.dirty && kind != CommitKind::Compress {
            return Ok(());
        }
        let bytes = self.serialize();
        let tmp = self.path.with_extension("tmp");
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(&bytes)?;
            f.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        if kind == CommitKind::Compress {
            for t in self.tables.values_mut() {
                t.mark_compressed();
            }
        }
        self.dirty = false;
        tracing::debug!(commit_kind = ?kind, path = %self.path.display(), "row store committed");
        Ok(())
    }

    /// Remove the underlying file (used when a summary is rebuilt).
    pub fn delete_file(&self) -> DbResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&encode_hex8(FORMAT_VERSION));
        let token_list: Vec<(Token, &str)> = self.tokens.iter().collect();
        out.extend_from_slice(&encode_hex8(token_list.len() as u32));
        for (_, name) in &token_list {
            let nb = name.as_bytes();
            out.extend_from_slice(&encode_hex8(nb.len() as u32));
            out.extend_from_slice(nb);
        }
        let mut table_names: Vec<&String> = self.tables.keys().collect();
        table_names.sort();
        out.extend_from_slice(&encode_hex8(table_names.len() as u32));
        for name in table_names {
            let table = &self.tables[name];
            let kb = name.as_bytes();
            out.extend_from_slice(&encode_hex8(kb.len() as u32));
            out.extend_from_slice(kb);
            out.extend_from_slice(&encode_hex8(table.len() as u32));
            out.extend_from_slice(&encode_hex8(table.next_oid()));
            for row in table.iter_insertion_order() {
                out.extend_from_slice(&encode_hex8(row.oid));
                let cells: Vec<_> = row.iter().collect();
                out.extend_from_slice(&encode_hex8(cells.len() as u32));
                for (token, value) in cells {
                    out.extend_from_slice(&encode_hex8(token.0));
                    match value {
                        CellValue::Num(n) => {
                            out.push(b'N');
                            out.extend_from_slice(&encode_hex16(*n));
                        }
                        CellValue::Str { bytes, form } => {
                            out.push(b'S');
                            out.push(*form);
                            out.extend_from_slice(&encode_hex8(bytes.len() as u32));
                            out.extend_from_slice(bytes);
                        }
                    }
                }
            }
        }
        out
    }

    fn deserialize(buf: &[u8]) -> DbResult<(TokenTable, HashMap<String, Table>)> {
        let mut cursor = Cursor::new(buf);
        if cursor.take(8)? != MAGIC.as_slice() {
            return Err(DbError::SummaryCorrupt);
        }
        let version = decode_hex(cursor.take(8)?)? as u32;
        if version != FORMAT_VERSION {
            return Err(DbError::SummaryOutOfDate);
        }
        let mut tokens = TokenTable::new();
        let token_count = decode_hex(cursor.take(8)?)?;
        for _ in 0..token_count {
            let len = decode_hex(cursor.take(8)?)? as usize;
            let name = std::str::from_utf8(cursor.take(len)?)
                .map_err(|_| DbError::SummaryCorrupt)?
                .to_string();
            tokens.intern(&name);
        }
        let mut tables = HashMap::new();
        let table_count = decode_hex(cursor.take(8)?)?;
        for _ in 0..table_count {
            let klen = decode_hex(cursor.take(8)?)? as usize;
            let kind = std::str::from_utf8(cursor.take(klen)?)
                .map_err(|_| DbError::SummaryCorrupt)?
                .to_string();
            let row_count = decode_hex(cursor.take(8)?)?;
            let next_oid = decode_hex(cursor.take(8)?)? as u32;
            let mut table = Table::new(&kind);
            table.reserve_oid(next_oid.saturating_sub(1));
            for _ in 0..row_count {
                let oid = decode_hex(cursor.take(8)?)? as u32;
                let mut row = Row::new(oid);
                let cell_count = decode_hex(cursor.take(8)?)?;
                for _ in 0..cell_count {
                    let token = Token(decode_hex(cursor.take(8)?)? as u32);
                    let tag = cursor.take(1)?[0];
                    match tag {
                        b'N' => {
                            let n = decode_hex(cursor.take(16)?)?;
                            row.set(token, CellValue::Num(n));
                        }
                        b'S' => {
                            let form = cursor.take(1)?[0];
                            let len = decode_hex(cursor.take(8)?)? as usize;
                            let bytes = cursor.take(len)?.to_vec();
                            row.set(token, CellValue::Str { bytes, form });
                        }
                        _ => return Err(DbError::SummaryCorrupt),
                    }
                }
                table.insert(row);
            }
            tables.insert(kind, table);
        }
        Ok((tokens, tables))
    }
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> DbResult<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(DbError::SummaryCorrupt);
        }
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }
}
