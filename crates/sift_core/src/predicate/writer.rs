//! Rendering predicate trees back to query text.
//!
//! The output is canonical rather than a copy of the input: parsing it again
//! yields an equivalent tree.

use super::ast::{LogicalClause, LogicalPredicate, Predicate, RangePredicate, TextPredicate};
use super::visitor::PredicateVisitor;
use crate::document::names;
use sift_codec::IndexValue;
use std::fmt::Write as _;

/// Characters with a meaning in query syntax.
pub const SPECIAL_CHARS: &[char] = &[
    '\'', '"', '\\', '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '~', '*', '?',
    ':', '/', '.',
];

/// Returns true if a literal needs quotes to survive parsing.
///
/// Wildcards are left bare when `keep_wildcards` is set, so that `Name:rep*`
/// keeps its meaning.
#[must_use]
pub fn needs_quotes(text: &str, keep_wildcards: bool) -> bool {
    text.is_empty()
        || text.chars().any(|c| {
            c.is_whitespace()
                || (SPECIAL_CHARS.contains(&c) && !(keep_wildcards && matches!(c, '*' | '?')))
        })
}

/// Wraps text in double quotes, escaping backslashes and quotes.
#[must_use]
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if matches!(c, '\\' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn render_value(value: &IndexValue) -> String {
    let text = value.value_as_string();
    let reads_as_syntax =
        matches!(text, "AND" | "OR" | "NOT" | "TO") || text.starts_with(['<', '>']);
    if reads_as_syntax || needs_quotes(text, true) {
        quote(text)
    } else {
        text.to_string()
    }
}

/// Renders a predicate tree as query text.
#[must_use]
pub fn to_text(predicate: &Predicate) -> String {
    let mut writer = PredicateWriter::default();
    writer.visit_predicate(predicate);
    writer.out
}

#[derive(Default)]
struct PredicateWriter {
    out: String,
    depth: usize,
}

impl PredicateWriter {
    fn write_field(&mut self, field: &str) {
        if field != names::ALL_TEXT {
            self.out.push_str(field);
            self.out.push(':');
        }
    }

    fn write_boost(&mut self, boost: Option<f64>) {
        if let Some(boost) = boost {
            let _ = write!(self.out, "^{boost}");
        }
    }
}

impl PredicateVisitor for PredicateWriter {
    fn visit_text(&mut self, p: &TextPredicate) {
        self.write_field(&p.field);
        self.out.push_str(&render_value(&p.value));
        if let Some(fuzzy) = p.fuzzy {
            let _ = write!(self.out, "~{fuzzy}");
        }
        self.write_boost(p.boost);
    }

    fn visit_range(&mut self, p: &RangePredicate) {
        // Ranges always name their field; `_Text` ranges are otherwise unaddressable.
        self.out.push_str(p.field());
        self.out.push(':');
        match (p.min(), p.max()) {
            (None, None) => self.out.push_str("[* TO *]"),
            (Some(min), None) => {
                self.out.push_str(if p.min_exclusive() { ">" } else { ">=" });
                self.out.push_str(&render_value(min));
            }
            (None, Some(max)) => {
                self.out.push_str(if p.max_exclusive() { "<" } else { "<=" });
                self.out.push_str(&render_value(max));
            }
            (Some(min), Some(max)) => {
                let open = if p.min_exclusive() { '{' } else { '[' };
                let close = if p.max_exclusive() { '}' } else { ']' };
                let _ = write!(
                    self.out,
                    "{open}{} TO {}{close}",
                    render_value(min),
                    render_value(max)
                );
            }
        }
        self.write_boost(p.boost());
    }

    fn visit_logical(&mut self, p: &LogicalPredicate) {
        let nested = self.depth > 0;
        if nested {
            self.out.push('(');
        }
        self.depth += 1;
        for (i, clause) in p.clauses().iter().enumerate() {
            if i > 0 {
                self.out.push(' ');
            }
            self.visit_clause(clause);
        }
        self.depth -= 1;
        if nested {
            self.out.push(')');
        }
    }

    fn visit_clause(&mut self, clause: &LogicalClause) {
        self.out.push_str(clause.occurrence.prefix());
        self.visit_predicate(&clause.predicate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Occurrence;
    use chrono::{TimeZone, Utc};

    #[test]
    fn quoting_rules() {
        assert!(needs_quotes("", true));
        assert!(needs_quotes("My Doc", true));
        assert!(needs_quotes("report.docx", true));
        assert!(!needs_quotes("rep*", true));
        assert!(needs_quotes("rep*", false));
        assert!(!needs_quotes("Folder", false));
        assert_eq!(quote(r#"a "b" \c"#), r#""a \"b\" \\c""#);
    }

    #[test]
    fn renders_terms() {
        assert_eq!(to_text(&Predicate::text("Type", "Folder")), "Type:Folder");
        assert_eq!(to_text(&Predicate::text("_Text", "hello")), "hello");
        assert_eq!(to_text(&Predicate::text("Name", "My Doc")), r#"Name:"My Doc""#);
        assert_eq!(to_text(&Predicate::text("IsSystem", false)), "IsSystem:no");
        assert_eq!(
            to_text(&TextPredicate::new("Title", "repot").with_fuzzy(0.7).with_boost(2.0).into()),
            "Title:repot~0.7^2"
        );
    }

    #[test]
    fn renders_ranges() {
        let closed =
            RangePredicate::new("Id", Some(1.into()), Some(9.into()), false, true).unwrap();
        assert_eq!(to_text(&closed.into()), "Id:[1 TO 9}");
        assert_eq!(to_text(&RangePredicate::at_least("Id", 5, false).into()), "Id:>=5");
        assert_eq!(to_text(&RangePredicate::at_most("Id", 5, true).into()), "Id:<5");
        assert_eq!(to_text(&RangePredicate::match_all("Id").into()), "Id:[* TO *]");

        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            to_text(&RangePredicate::at_most("ValidFrom", date, false).into()),
            r#"ValidFrom:<="2024-03-01 12:00:00.0000""#
        );
    }

    #[test]
    fn parenthesizes_nested_groups_only() {
        let tree = Predicate::Logical(LogicalPredicate::new(vec![
            LogicalClause::new(Predicate::text("Type", "Folder"), Occurrence::Must),
            LogicalClause::new(
                Predicate::pair(
                    Predicate::text("A", "1"),
                    Predicate::text("B", "2"),
                    Occurrence::Should,
                ),
                Occurrence::MustNot,
            ),
        ]));
        assert_eq!(to_text(&tree), "+Type:Folder -(A:1 B:2)");
    }
}
