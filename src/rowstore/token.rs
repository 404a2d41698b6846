/*
 * token.rs
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

//! Per-store string-to-token interning (spec §4.1). Tokens are 32-bit ids;
//! re-interning an already-known string returns the same token.

use std::collections::HashMap;

/// A 32-bit cell/table-kind token, unique within the owning store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(pub u32);

#[derive(Debug, Default, Clone)]
pub struct TokenTable {
    names: Vec<String>,
    by_name: HashMap<String, Token>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `name`, returning its existing token if already known.
    pub fn intern(&mut self, name: &str) -> Token {
        if let Some(t) = self.by_name.get(name) {
            return *t;
        }
        let id = Token(self.names.len() as u32 + 1); // 0 reserved
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<Token> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, token: Token) -> Option<&str> {
        if token.0 == 0 {
            return None;
        }
        self.names.get(token.0 as usize - 1).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Token, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, s)| (Token(i as u32 + 1), s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reinterning_returns_same_token() {
        let mut t = TokenTable::new();
        let a = t.intern("subject");
        let b = t.intern("sender");
        let a2 = t.intern("subject");
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(t.name_of(a), Some("subject"));
    }
}
