/*
 * row.rs
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

//! A row is a set of (token -> cell) pairs (spec §4.1). Cells are either
//! a number or a string with a form/charset tag.

use crate::rowstore::token::Token;
use std::collections::BTreeMap;

/// Row-store object id. Assigned by the owning table on insert; stable
/// for the row's lifetime.
pub type Oid = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Num(u64),
    /// Raw bytes with a preserved form/charset tag (spec §4.1).
    Str { bytes: Vec<u8>, form: u8 },
}

impl CellValue {
    pub fn str(s: impl Into<String>) -> Self {
        CellValue::Str {
            bytes: s.into().into_bytes(),
            form: 0,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Str { bytes, .. } => std::str::from_utf8(bytes).ok(),
            CellValue::Num(_) => None,
        }
    }

    pub fn as_num(&self) -> Option<u64> {
        match self {
            CellValue::Num(n) => Some(*n),
            CellValue::Str { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Row {
    pub oid: Oid,
    cells: BTreeMap<Token, CellValue>,
}

impl Row {
    pub fn new(oid: Oid) -> Self {
        Self {
            oid,
            cells: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, token: Token, value: CellValue) {
        self.cells.insert(token, value);
    }

    pub fn get(&self, token: Token) -> Option<&CellValue> {
        self.cells.get(&token)
    }

    pub fn remove(&mut self, token: Token) -> Option<CellValue> {
        self.cells.remove(&token)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Token, &CellValue)> {
        self.cells.iter().map(|(t, v)| (*t, v))
    }
}
