//! Text query parser.
//!
//! Recursive descent over the characters of the query with a single cursor.
//! The grammar:
//!
//! ```text
//! query    := (clause | setting)*
//! clause   := [conj] [modifier] (group | field ':' value | literal)
//! conj     := AND | && | OR | ||
//! modifier := '+' | '-' | '!' | NOT
//! group    := '(' clause* ')'
//! value    := '(' clause* ')' | range | ('>=' | '<=' | '>' | '<') literal | literal
//! range    := ('[' | '{') bound TO bound (']' | '}')
//! literal  := (word | quoted) ['~' [number]] ['^' number]
//! setting  := '.' KEYWORD [':' word]
//! ```
//!
//! Settings keywords are only accepted at the top level. Terms without a
//! field address [`names::ALL_TEXT`]. A group holding a single optional
//! clause collapses to that clause.

use crate::document::names;
use crate::error::{QueryError, QueryResult};
use crate::field_info::FieldInfoProvider;
use crate::predicate::{
    LogicalClause, LogicalPredicate, Occurrence, Predicate, PredicateRewriter, RangePredicate,
    StructuralValueNormalizer, TextPredicate, DEFAULT_FUZZY, EMPTY_INNER_QUERY,
};
use crate::query::Query;
use crate::types::{FilterStatus, QueryExecutionMode, SortInfo};
use sift_codec::{IndexValue, IndexValueType};

/// Deepest parenthesized group the parser accepts.
pub const MAX_GROUP_DEPTH: usize = 128;

/// Parses query text into a [`Query`].
///
/// # Errors
///
/// Returns [`QueryError::InvalidQuery`] carrying `text` for any syntax error
/// or for a value that does not convert to its field's type.
pub fn parse(text: &str, fields: &dyn FieldInfoProvider) -> QueryResult<Query> {
    let mut parser = Parser::new(text, fields);
    let predicate = parser
        .parse_clauses(None)?
        .ok_or_else(|| QueryError::invalid_query(text, "empty query"))?;
    let predicate = StructuralValueNormalizer.rewrite(predicate);

    let settings = parser.settings;
    let mut query = Query::new(predicate);
    query.set_query_text(text);
    query.top = settings.top;
    query.skip = settings.skip;
    query.sort = settings.sort;
    query.projection = settings.projection;
    query.enable_autofilters = settings.autofilters;
    query.enable_lifespan_filter = settings.lifespan;
    query.count_only = settings.count_only;
    query.all_versions = settings.all_versions;
    query.execution_mode = settings.execution_mode;
    Ok(query)
}

/// Settings keywords collected while parsing.
#[derive(Debug, Default)]
struct ParsedSettings {
    top: usize,
    skip: usize,
    sort: Vec<SortInfo>,
    projection: Option<String>,
    autofilters: FilterStatus,
    lifespan: FilterStatus,
    count_only: bool,
    all_versions: bool,
    execution_mode: QueryExecutionMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conjunction {
    None,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    None,
    Required,
    Prohibited,
}

struct Parser<'a> {
    text: &'a str,
    chars: Vec<char>,
    pos: usize,
    depth: usize,
    fields: &'a dyn FieldInfoProvider,
    settings: ParsedSettings,
}

/// Characters that end a bare word.
fn is_word_terminator(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '(' | ')' | '[' | ']' | '{' | '}' | '^' | '~' | ':' | '"' | '\''
        )
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, fields: &'a dyn FieldInfoProvider) -> Self {
        Self {
            text,
            chars: text.chars().collect(),
            pos: 0,
            depth: 0,
            fields,
            settings: ParsedSettings::default(),
        }
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::invalid_query(self.text, format!("{} at position {}", message.into(), self.pos))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn expect(&mut self, c: char) -> QueryResult<()> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Skips whitespace, `//` line comments and `/* */` block comments.
    ///
    /// An unterminated block comment runs to the end of the text.
    fn skip_trivia(&mut self) {
        loop {
            self.skip_whitespace();
            if self.starts_with("//") {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.pos += 1;
                }
            } else if self.starts_with("/*") {
                self.pos += 2;
                while !self.at_end() && !self.starts_with("*/") {
                    self.pos += 1;
                }
                self.pos = (self.pos + 2).min(self.chars.len());
            } else {
                return;
            }
        }
    }

    /// Consumes an operator word if it stands alone at the cursor.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let len = keyword.chars().count();
        let bounded = self
            .peek_at(len)
            .map_or(true, |c| c.is_whitespace() || c == '(');
        if self.starts_with(keyword) && bounded {
            self.pos += len;
            true
        } else {
            false
        }
    }

    fn at_setting(&self) -> bool {
        self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_uppercase())
    }

    /// Parses clauses until the end of the text or a closing parenthesis.
    fn parse_clauses(&mut self, default_field: Option<&str>) -> QueryResult<Option<Predicate>> {
        let mut clauses: Vec<LogicalClause> = Vec::new();
        let mut conj = Conjunction::None;
        let mut modifier = Modifier::None;

        loop {
            self.skip_trivia();
            match self.peek() {
                None => {
                    if self.depth > 0 {
                        return Err(self.error("missing ')'"));
                    }
                    break;
                }
                Some(')') => {
                    if self.depth == 0 {
                        return Err(self.error("unexpected ')'"));
                    }
                    break;
                }
                _ => {}
            }

            if self.at_setting() {
                if self.depth > 0 {
                    return Err(self.error("settings keywords are only allowed at the top level"));
                }
                self.parse_setting()?;
                continue;
            }
            if self.eat_keyword("AND") || self.eat_keyword("&&") {
                conj = Conjunction::And;
                continue;
            }
            if self.eat_keyword("OR") || self.eat_keyword("||") {
                conj = Conjunction::Or;
                continue;
            }
            if self.eat_keyword("NOT") {
                modifier = Modifier::Prohibited;
                continue;
            }
            match self.peek() {
                Some('+') => {
                    self.pos += 1;
                    modifier = Modifier::Required;
                }
                Some('-' | '!') => {
                    self.pos += 1;
                    modifier = Modifier::Prohibited;
                }
                _ => {}
            }

            let predicate = self.parse_primary(default_field)?;
            add_clause(&mut clauses, conj, modifier, predicate);
            conj = Conjunction::None;
            modifier = Modifier::None;
        }

        if conj != Conjunction::None || modifier != Modifier::None {
            return Err(self.error("operator without operand"));
        }
        Ok(collapse(clauses))
    }

    fn parse_group(&mut self, default_field: Option<&str>) -> QueryResult<Predicate> {
        self.expect('(')?;
        if self.depth >= MAX_GROUP_DEPTH {
            return Err(self.error(format!("groups nested deeper than {MAX_GROUP_DEPTH}")));
        }
        self.depth += 1;
        let inner = self.parse_clauses(default_field)?;
        self.depth -= 1;
        self.expect(')')?;
        inner.ok_or_else(|| self.error("empty group"))
    }

    fn parse_primary(&mut self, default_field: Option<&str>) -> QueryResult<Predicate> {
        match self.peek() {
            Some('(') => self.parse_group(default_field),
            Some('"' | '\'') => {
                let raw = self.read_quoted()?;
                let field = default_field.unwrap_or(names::ALL_TEXT).to_string();
                self.parse_text_suffixes(field, &raw)
            }
            _ => {
                let word = self.read_word();
                if word.is_empty() {
                    return Err(self.error("unexpected character"));
                }
                if self.peek() == Some(':') {
                    if default_field.is_some() {
                        return Err(self.error("field name inside a field group"));
                    }
                    self.pos += 1;
                    self.skip_whitespace();
                    return self.parse_field_value(&word);
                }
                let field = default_field.unwrap_or(names::ALL_TEXT).to_string();
                self.parse_text_suffixes(field, &word)
            }
        }
    }

    fn parse_field_value(&mut self, field: &str) -> QueryResult<Predicate> {
        match self.peek() {
            Some('(') => self.parse_group(Some(field)),
            Some('[' | '{') => self.parse_range(field),
            Some('>' | '<') => self.parse_comparison(field),
            Some('"' | '\'') => {
                let raw = self.read_quoted()?;
                self.parse_text_suffixes(field.to_string(), &raw)
            }
            _ => {
                let word = self.read_word();
                if word.is_empty() {
                    return Err(self.error(format!("missing value for field {field}")));
                }
                self.parse_text_suffixes(field.to_string(), &word)
            }
        }
    }

    fn parse_text_suffixes(&mut self, field: String, raw: &str) -> QueryResult<Predicate> {
        let value = self.typed_value(&field, raw)?;
        let mut predicate = TextPredicate::new(field, value);
        loop {
            match self.peek() {
                Some('~') if predicate.fuzzy.is_none() => {
                    self.pos += 1;
                    let number = self.read_number();
                    let fuzzy = if number.is_empty() {
                        DEFAULT_FUZZY
                    } else {
                        self.parse_number(&number)?
                    };
                    predicate.fuzzy = Some(fuzzy);
                }
                Some('^') if predicate.boost.is_none() => {
                    self.pos += 1;
                    predicate.boost = Some(self.parse_boost()?);
                }
                _ => return Ok(Predicate::Text(predicate)),
            }
        }
    }

    fn parse_range(&mut self, field: &str) -> QueryResult<Predicate> {
        let min_exclusive = self.peek() == Some('{');
        self.pos += 1;
        self.skip_whitespace();
        let min = self.read_bound(field)?;
        self.skip_whitespace();
        if self.read_word() != "TO" {
            return Err(self.error("expected TO in range"));
        }
        self.skip_whitespace();
        let max = self.read_bound(field)?;
        self.skip_whitespace();
        let max_exclusive = match self.peek() {
            Some(']') => false,
            Some('}') => true,
            _ => return Err(self.error("unterminated range")),
        };
        self.pos += 1;

        // An open bound carries no exclusivity.
        let min_exclusive = min_exclusive && min.is_some();
        let max_exclusive = max_exclusive && max.is_some();
        let mut range = if min.is_none() && max.is_none() {
            RangePredicate::match_all(field)
        } else {
            RangePredicate::new(field, min, max, min_exclusive, max_exclusive)?
        };
        if self.peek() == Some('^') {
            self.pos += 1;
            range = range.with_boost(self.parse_boost()?);
        }
        Ok(Predicate::Range(range))
    }

    fn parse_comparison(&mut self, field: &str) -> QueryResult<Predicate> {
        let greater = self.peek() == Some('>');
        self.pos += 1;
        let inclusive = self.peek() == Some('=');
        if inclusive {
            self.pos += 1;
        }
        let raw = match self.peek() {
            Some('"' | '\'') => self.read_quoted()?,
            _ => self.read_word(),
        };
        if raw.is_empty() || raw == "*" {
            return Err(self.error(format!("missing value for field {field}")));
        }
        let value = self.typed_value(field, &raw)?;
        let mut range = if greater {
            RangePredicate::at_least(field, value, !inclusive)
        } else {
            RangePredicate::at_most(field, value, !inclusive)
        };
        if self.peek() == Some('^') {
            self.pos += 1;
            range = range.with_boost(self.parse_boost()?);
        }
        Ok(Predicate::Range(range))
    }

    fn parse_setting(&mut self) -> QueryResult<()> {
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_uppercase()) {
            self.pos += 1;
        }
        let keyword: String = self.chars[start..self.pos].iter().collect();
        let value = if self.peek() == Some(':') {
            self.pos += 1;
            let value = self.read_word();
            if value.is_empty() {
                return Err(self.error(format!("missing value for .{keyword}")));
            }
            Some(value)
        } else {
            None
        };

        let text = self.text;
        match (keyword.as_str(), value) {
            ("TOP", Some(v)) => self.settings.top = parse_count(text, &keyword, &v)?,
            ("SKIP", Some(v)) => self.settings.skip = parse_count(text, &keyword, &v)?,
            ("SORT", Some(v)) => self.settings.sort.push(SortInfo::ascending(v)),
            ("REVERSESORT", Some(v)) => self.settings.sort.push(SortInfo::descending(v)),
            ("SELECT", Some(v)) => self.settings.projection = Some(v),
            ("AUTOFILTERS", Some(v)) => {
                self.settings.autofilters = parse_switch(text, &keyword, &v)?;
            }
            ("LIFESPAN", Some(v)) => self.settings.lifespan = parse_switch(text, &keyword, &v)?,
            ("COUNTONLY", None) => self.settings.count_only = true,
            ("ALLVERSIONS", None) => self.settings.all_versions = true,
            ("QUICK", None) => self.settings.execution_mode = QueryExecutionMode::Quick,
            (
                "TOP" | "SKIP" | "SORT" | "REVERSESORT" | "SELECT" | "AUTOFILTERS" | "LIFESPAN",
                None,
            ) => {
                return Err(self.error(format!("missing value for .{keyword}")));
            }
            ("COUNTONLY" | "ALLVERSIONS" | "QUICK", Some(_)) => {
                return Err(self.error(format!(".{keyword} takes no value")));
            }
            _ => return Err(self.error(format!("unknown keyword .{keyword}"))),
        }
        Ok(())
    }

    /// Reads a bare word, resolving backslash escapes.
    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                if let Some(next) = self.peek_at(1) {
                    word.push(next);
                    self.pos += 2;
                    continue;
                }
            }
            if is_word_terminator(c) {
                break;
            }
            word.push(c);
            self.pos += 1;
        }
        word
    }

    /// Reads a `'` or `"` delimited literal, resolving backslash escapes.
    fn read_quoted(&mut self) -> QueryResult<String> {
        let Some(delimiter) = self.peek() else {
            return Err(self.error("expected quoted literal"));
        };
        self.pos += 1;
        let mut literal = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated quoted literal")),
                Some('\\') => {
                    let Some(next) = self.peek_at(1) else {
                        return Err(self.error("unterminated quoted literal"));
                    };
                    literal.push(next);
                    self.pos += 2;
                }
                Some(c) if c == delimiter => {
                    self.pos += 1;
                    return Ok(literal);
                }
                Some(c) => {
                    literal.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn read_bound(&mut self, field: &str) -> QueryResult<Option<IndexValue>> {
        let raw = match self.peek() {
            Some('"' | '\'') => self.read_quoted()?,
            _ => {
                let word = self.read_word();
                if word == "*" {
                    return Ok(None);
                }
                word
            }
        };
        if raw.is_empty() {
            return Err(self.error("missing range bound"));
        }
        self.typed_value(field, &raw).map(Some)
    }

    fn read_number(&mut self) -> String {
        let mut number = String::new();
        while let Some(c) = self.peek().filter(|c| c.is_ascii_digit() || *c == '.') {
            number.push(c);
            self.pos += 1;
        }
        number
    }

    fn parse_number(&self, number: &str) -> QueryResult<f64> {
        number
            .parse::<f64>()
            .map_err(|_| self.error(format!("invalid number {number:?}")))
    }

    fn parse_boost(&mut self) -> QueryResult<f64> {
        let number = self.read_number();
        if number.is_empty() {
            return Err(self.error("missing boost value"));
        }
        self.parse_number(&number)
    }

    /// Converts literal text to the value type of its field.
    ///
    /// The empty nested query sentinel stays text for every field.
    fn typed_value(&self, field: &str, raw: &str) -> QueryResult<IndexValue> {
        if raw == EMPTY_INNER_QUERY {
            return Ok(IndexValue::from(raw));
        }
        match self.fields.value_type(field) {
            IndexValueType::Text | IndexValueType::TextArray => Ok(IndexValue::from(raw)),
            value_type => IndexValue::parse_as(value_type, raw).map_err(|e| {
                QueryError::invalid_query(self.text, format!("field {field}: {e}"))
            }),
        }
    }
}

/// Adds a clause with Lucene's default-OR conjunction rules.
///
/// `AND` upgrades the previous clause to `Must` unless it is prohibited.
fn add_clause(
    clauses: &mut Vec<LogicalClause>,
    conj: Conjunction,
    modifier: Modifier,
    predicate: Predicate,
) {
    if conj == Conjunction::And {
        if let Some(last) = clauses.last_mut() {
            if last.occurrence != Occurrence::MustNot {
                last.occurrence = Occurrence::Must;
            }
        }
    }
    let occurrence = match modifier {
        Modifier::Prohibited => Occurrence::MustNot,
        Modifier::Required => Occurrence::Must,
        Modifier::None if conj == Conjunction::And => Occurrence::Must,
        Modifier::None => Occurrence::Should,
    };
    clauses.push(LogicalClause::new(predicate, occurrence));
}

fn collapse(mut clauses: Vec<LogicalClause>) -> Option<Predicate> {
    match clauses.len() {
        0 => None,
        1 if clauses[0].occurrence == Occurrence::Should => clauses.pop().map(|c| c.predicate),
        _ => Some(Predicate::Logical(LogicalPredicate::new(clauses))),
    }
}

fn parse_count(text: &str, keyword: &str, value: &str) -> QueryResult<usize> {
    value.parse().map_err(|_| {
        QueryError::invalid_query(text, format!(".{keyword} expects a number, got {value:?}"))
    })
}

fn parse_switch(text: &str, keyword: &str, value: &str) -> QueryResult<FilterStatus> {
    match value.to_ascii_uppercase().as_str() {
        "ON" => Ok(FilterStatus::Enabled),
        "OFF" => Ok(FilterStatus::Disabled),
        _ => Err(QueryError::invalid_query(
            text,
            format!(".{keyword} expects ON or OFF, got {value:?}"),
        )),
    }
}
