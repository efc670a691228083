//! Text-level rewriting of legacy queries.
//!
//! These functions work on raw text before parsing: they must not look into
//! comments or quoted literals.

use crate::error::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};

/// Settings keywords moved to the end of a query.
pub const RELOCATED_KEYWORDS: &[&str] = &[
    "SKIP",
    "TOP",
    "SORT",
    "REVERSESORT",
    "AUTOFILTERS",
    "LIFESPAN",
    "COUNTONLY",
];

/// How [`add_clause`] joins two queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    /// Both must match.
    And,
    /// Either may match.
    Or,
}

/// What the end of a text is inside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tail {
    Code,
    LineComment,
    BlockComment,
    Literal,
}

fn tail_of(text: &str) -> Tail {
    let chars: Vec<char> = text.chars().collect();
    let mut tail = Tail::Code;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match (c, next) {
            ('/', Some('/')) => {
                i += 2;
                tail = Tail::LineComment;
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                if i < chars.len() {
                    tail = Tail::Code;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                tail = Tail::BlockComment;
                while i < chars.len() {
                    if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                        i += 2;
                        tail = Tail::Code;
                        break;
                    }
                    i += 1;
                }
            }
            ('"' | '\'', _) => {
                i = skip_literal(&chars, i);
                tail = if i > chars.len() { Tail::Literal } else { Tail::Code };
            }
            _ => {
                if !c.is_whitespace() {
                    tail = Tail::Code;
                }
                i += 1;
            }
        }
    }
    tail
}

/// Returns the index after a quoted literal starting at `start`, or
/// `chars.len() + 1` if the literal is unterminated.
fn skip_literal(chars: &[char], start: usize) -> usize {
    let delimiter = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == delimiter => return i + 1,
            _ => i += 1,
        }
    }
    chars.len() + 1
}

/// Closes a block comment left open at the end of the text.
#[must_use]
pub fn fix_multiline_comment(text: &str) -> String {
    if tail_of(text) == Tail::BlockComment {
        format!("{text}*/")
    } else {
        text.to_string()
    }
}

/// Moves settings keywords to the end of the query, in first-seen order.
///
/// Only `.KEYWORD` tokens from [`RELOCATED_KEYWORDS`] that start at a token
/// boundary move; anything else, including keywords inside comments or
/// quoted literals, stays where it is. The result is trimmed.
#[must_use]
pub fn move_settings_to_the_end(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut body = String::with_capacity(text.len());
    let mut moved: Vec<String> = Vec::new();
    let mut ends_in_line_comment = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match (c, next) {
            ('/', Some('/')) => {
                let start = i;
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                body.extend(&chars[start..i]);
                ends_in_line_comment = true;
            }
            ('/', Some('*')) => {
                let start = i;
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                if i < chars.len() {
                    i += 2;
                    body.extend(&chars[start..i]);
                } else {
                    body.extend(&chars[start..]);
                    body.push_str("*/");
                }
                ends_in_line_comment = false;
            }
            ('"' | '\'', _) => {
                let end = skip_literal(&chars, i).min(chars.len());
                body.extend(&chars[i..end]);
                i = end;
                ends_in_line_comment = false;
            }
            ('.', Some(n)) if n.is_ascii_uppercase() && at_boundary(&chars, i) => {
                match relocatable_keyword(&chars, i) {
                    Some(end) => {
                        let trimmed = body.trim_end_matches([' ', '\t']).len();
                        body.truncate(trimmed);
                        moved.push(chars[i..end].iter().collect());
                        i = end;
                    }
                    None => {
                        body.push(c);
                        i += 1;
                        ends_in_line_comment = false;
                    }
                }
            }
            _ => {
                body.push(c);
                i += 1;
                if !c.is_whitespace() {
                    ends_in_line_comment = false;
                }
            }
        }
    }

    let mut out = body.trim().to_string();
    if !moved.is_empty() && ends_in_line_comment {
        out.push('\n');
    }
    for keyword in moved {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push(' ');
        }
        out.push_str(&keyword);
    }
    out.trim().to_string()
}

fn at_boundary(chars: &[char], i: usize) -> bool {
    i == 0 || chars[i - 1].is_whitespace() || matches!(chars[i - 1], '(' | ')')
}

/// Returns the end of a relocatable keyword token starting at the `.` at `i`.
fn relocatable_keyword(chars: &[char], i: usize) -> Option<usize> {
    let mut j = i + 1;
    while j < chars.len() && chars[j].is_ascii_uppercase() {
        j += 1;
    }
    let name: String = chars[i + 1..j].iter().collect();
    if !RELOCATED_KEYWORDS.contains(&name.as_str()) {
        return None;
    }
    match chars.get(j) {
        None => Some(j),
        Some(c) if c.is_whitespace() || *c == ')' => Some(j),
        Some(':') => {
            let mut end = j + 1;
            while end < chars.len() && !chars[end].is_whitespace() && chars[end] != ')' {
                end += 1;
            }
            Some(end)
        }
        Some(_) => None,
    }
}

/// Merges two query texts.
///
/// `And` yields `+(A) +(B)`, `Or` yields `(A) (B)`. Settings keywords of
/// either side are moved to the end of the result.
///
/// # Errors
///
/// Returns [`QueryError::InvalidOperation`] if either text is empty.
pub fn add_clause(text: &str, clause: &str, operator: LogicalOperator) -> QueryResult<String> {
    let (text, clause) = (text.trim(), clause.trim());
    if text.is_empty() || clause.is_empty() {
        return Err(QueryError::invalid_operation("cannot add an empty clause"));
    }
    let group = |part: &str| {
        if tail_of(part) == Tail::LineComment {
            format!("({part}\n)")
        } else {
            format!("({part})")
        }
    };
    let merged = match operator {
        LogicalOperator::And => format!("+{} +{}", group(text), group(clause)),
        LogicalOperator::Or => format!("{} {}", group(text), group(clause)),
    };
    Ok(move_settings_to_the_end(&merged))
}
