//! Predicate evaluation against a single document.
//!
//! Follows the inverted-index semantics the query language assumes: text
//! terms compare case-insensitively, array fields match on any element, and
//! a field that is absent never matches.

use sift_core::document::names;
use sift_core::predicate::{LogicalPredicate, Occurrence, Predicate, RangePredicate, TextPredicate};
use sift_core::{IndexDocument, IndexValue};
use sift_codec::ValueData;

/// Returns true if the document satisfies the predicate.
#[must_use]
pub fn matches(predicate: &Predicate, document: &IndexDocument) -> bool {
    match predicate {
        Predicate::Text(p) => text_matches(p, document),
        Predicate::Range(p) => range_matches(p, document),
        Predicate::Logical(p) => logical_matches(p, document),
    }
}

/// `Must` clauses all match, `MustNot` clauses none. Without any `Must`
/// clause at least one `Should` clause has to match.
fn logical_matches(predicate: &LogicalPredicate, document: &IndexDocument) -> bool {
    let mut has_must = false;
    let mut has_should = false;
    let mut any_should = false;

    for clause in predicate.clauses() {
        let hit = matches(&clause.predicate, document);
        match clause.occurrence {
            Occurrence::Must => {
                has_must = true;
                if !hit {
                    return false;
                }
            }
            Occurrence::MustNot => {
                if hit {
                    return false;
                }
            }
            Occurrence::Should => {
                has_should = true;
                any_should |= hit;
            }
        }
    }

    if has_must {
        true
    } else {
        has_should && any_should
    }
}

fn text_matches(predicate: &TextPredicate, document: &IndexDocument) -> bool {
    if predicate.is_empty_inner_query() {
        return false;
    }
    let Some(field) = document.get(&predicate.field) else {
        return false;
    };
    let query = &predicate.value;
    let pattern = query.value_as_string().to_lowercase();
    let wildcards = query.as_text().is_some();

    if predicate.field == names::ALL_TEXT {
        return tokens(field.value().value_as_string())
            .any(|token| term_matches(&token, &pattern, predicate.fuzzy, wildcards));
    }
    scalars(field.value()).iter().any(|value| {
        value == query
            || term_matches(
                &value.value_as_string().to_lowercase(),
                &pattern,
                predicate.fuzzy,
                wildcards,
            )
    })
}

fn range_matches(predicate: &RangePredicate, document: &IndexDocument) -> bool {
    let Some(field) = document.get(predicate.field()) else {
        return false;
    };
    if predicate.is_match_all() {
        return true;
    }
    let bound_type = predicate
        .min()
        .or(predicate.max())
        .map(IndexValue::value_type);
    scalars(field.value())
        .iter()
        .filter(|value| Some(value.value_type()) == bound_type)
        .any(|value| predicate.contains(value))
}

/// Splits array values into their elements.
fn scalars(value: &IndexValue) -> Vec<IndexValue> {
    match value.data() {
        ValueData::TextArray(items) => items.iter().map(|s| IndexValue::from(s.as_str())).collect(),
        ValueData::Int32Array(items) => items.iter().map(|n| IndexValue::from(*n)).collect(),
        _ => vec![value.clone()],
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn term_matches(term: &str, pattern: &str, fuzzy: Option<f64>, wildcards: bool) -> bool {
    if let Some(min_similarity) = fuzzy {
        return similarity(term, pattern) >= min_similarity;
    }
    if wildcards && pattern.contains(['*', '?']) {
        return glob_matches(term, pattern);
    }
    term == pattern
}

/// Edit-distance similarity relative to the shorter of the two terms.
fn similarity(a: &str, b: &str) -> f64 {
    let shorter = a.chars().count().min(b.chars().count());
    if shorter == 0 {
        return if a == b { 1.0 } else { 0.0 };
    }
    1.0 - levenshtein(a, b) as f64 / shorter as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// `*` matches any run, `?` exactly one character.
fn glob_matches(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some('?') => {
                t += 1;
                p += 1;
            }
            Some(c) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::{BuiltinFieldInfo, Query};

    fn document() -> IndexDocument {
        let mut doc = IndexDocument::new();
        doc.add_value("Id", 4);
        doc.add_value("Type", "File");
        doc.add_value("TypeIs", vec!["file".to_string(), "genericcontent".to_string()]);
        doc.add_value("Index", 7);
        doc.add_value("_Text", "Quarterly report, final draft");
        doc.add_value("IsSystem", false);
        doc
    }

    fn check(text: &str) -> bool {
        let query = Query::parse(text, &BuiltinFieldInfo::new()).unwrap();
        matches(query.predicate(), &document())
    }

    #[test]
    fn terms() {
        assert!(check("Type:file"));
        assert!(check("TypeIs:GenericContent"));
        assert!(check("Index:7"));
        assert!(check("IsSystem:no"));
        assert!(!check("IsSystem:yes"));
        assert!(!check("Missing:x"));
    }

    #[test]
    fn full_text_tokens() {
        assert!(check("report"));
        assert!(check("quart*"));
        assert!(check("repot~"));
        assert!(!check("quarterly-report"));
    }

    #[test]
    fn boolean_semantics() {
        assert!(check("+Type:File -IsSystem:yes"));
        assert!(!check("+Type:File +Id:5"));
        assert!(check("Id:5 Id:4"));
        assert!(!check("-Id:5"));
    }

    #[test]
    fn ranges() {
        assert!(check("Id:[1 TO 4]"));
        assert!(!check("Id:[1 TO 4}"));
        assert!(check("Id:>3"));
        assert!(check("Id:[* TO *]"));
        assert!(!check("Missing:[* TO *]"));
    }

    #[test]
    fn empty_inner_query_never_matches() {
        assert!(!check("Id:$##$EMPTYINNERQUERY$##$"));
        assert!(!check("Type:$##$EMPTYINNERQUERY$##$"));
    }

    #[test]
    fn globs() {
        assert!(glob_matches("report", "re*t"));
        assert!(glob_matches("report", "rep?rt"));
        assert!(glob_matches("report", "*"));
        assert!(!glob_matches("report", "re?t"));
        assert!(!glob_matches("rep", "report*"));
    }

    #[test]
    fn edit_distance() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert!(similarity("report", "repot") > 0.75);
    }
}
