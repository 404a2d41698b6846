/*
 * filter.rs
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

//! Declarative filter terms, compiled to a parameterized SQL fragment
//! against the folder registry's per-folder-summary shadow table (spec
//! §4.5). Live views run against registry-level metadata (subject,
//! sender, flags, tags, date) rather than the row store directly, since
//! the row store holds per-folder summaries and a live view spans
//! folders.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Subject,
    Sender,
    Recipients,
    Date,
    Flags,
    Tags,
    FolderId,
}

impl Attribute {
    fn column(self) -> &'static str {
        match self {
            Attribute::Subject => "subject",
            Attribute::Sender => "sender",
            Attribute::Recipients => "recipients",
            Attribute::Date => "date",
            Attribute::Flags => "flags",
            Attribute::Tags => "tags",
            Attribute::FolderId => "folder_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Contains,
    DoesNotContain,
    BeginsWith,
    EndsWith,
    Is,
    IsNot,
    IsEmpty,
    IsntEmpty,
    GreaterThan,
    LessThan,
    IsBefore,
    IsAfter,
    TagsInclude,
    TagsExclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    And,
    Or,
}

#[derive(Debug, Clone)]
pub struct FilterTerm {
    pub join: Join,
    pub attribute: Attribute,
    pub operator: Operator,
    pub value: String,
}

/// Escape `%`, `_` and the escape character itself for a `LIKE` pattern
/// using `/` as the escape character (spec §4.5).
pub fn like_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '%' || c == '_' || c == '/' {
            out.push('/');
        }
        out.push(c);
    }
    out
}

/// Compiled SQL fragment (without the leading `WHERE`) plus its bound
/// parameters, in order.
pub struct CompiledFilter {
    pub sql: String,
    pub params: Vec<String>,
}

/// Compile filter terms into a single SQL boolean expression, joining
/// terms left to right with each term's own join operator (spec §4.5:
/// "AND/OR joined left-to-right per term" — no operator precedence or
/// parenthesization across terms).
pub fn compile(terms: &[FilterTerm]) -> CompiledFilter {
    let mut sql = String::new();
    let mut params = Vec::new();
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            sql.push_str(match term.join {
                Join::And => " AND ",
                Join::Or => " OR ",
            });
        }
        let column = term.attribute.column();
        match term.operator {
            Operator::Contains => {
                sql.push_str(&format!("{} LIKE ?{} ESCAPE '/'", column, params.len() + 1));
                params.push(format!("%{}%", like_escape(&term.value)));
            }
            Operator::DoesNotContain => {
                sql.push_str(&format!("{} NOT LIKE ?{} ESCAPE '/'", column, params.len() + 1));
                params.push(format!("%{}%", like_escape(&term.value)));
            }
            Operator::BeginsWith => {
                sql.push_str(&format!("{} LIKE ?{} ESCAPE '/'", column, params.len() + 1));
                params.push(format!("{}%", like_escape(&term.value)));
            }
            Operator::EndsWith => {
                sql.push_str(&format!("{} LIKE ?{} ESCAPE '/'", column, params.len() + 1));
                params.push(format!("%{}", like_escape(&term.value)));
            }
            Operator::Is => {
                sql.push_str(&format!("{} = ?{}", column, params.len() + 1));
                params.push(term.value.clone());
            }
            Operator::IsNot => {
                sql.push_str(&format!("{} != ?{}", column, params.len() + 1));
                params.push(term.value.clone());
            }
            Operator::IsEmpty => {
                sql.push_str(&format!("{} = ''", column));
            }
            Operator::IsntEmpty => {
                sql.push_str(&format!("{} != ''", column));
            }
            Operator::GreaterThan => {
                sql.push_str(&format!("{} > ?{}", column, params.len() + 1));
                params.push(term.value.clone());
            }
            Operator::LessThan => {
                sql.push_str(&format!("{} < ?{}", column, params.len() + 1));
                params.push(term.value.clone());
            }
            Operator::IsBefore => {
                sql.push_str(&format!("{} < ?{}", column, params.len() + 1));
                params.push(term.value.clone());
            }
            Operator::IsAfter => {
                sql.push_str(&format!("{} > ?{}", column, params.len() + 1));
                params.push(term.value.clone());
            }
            Operator::TagsInclude => {
                sql.push_str(&format!("TAGS_INCLUDE(tags, ?{})", params.len() + 1));
                params.push(term.value.clone());
            }
            Operator::TagsExclude => {
                sql.push_str(&format!("TAGS_EXCLUDE(tags, ?{})", params.len() + 1));
                params.push(term.value.clone());
            }
        }
    }
    CompiledFilter { sql, params }
}
