//! Implicit filters injected during preparation.
//!
//! Both are parsed once from canonical text and shared by every query.

use crate::document::names;
use crate::error::QueryResult;
use crate::field_info::BuiltinFieldInfo;
use crate::parser::parse;
use crate::predicate::Predicate;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use sift_codec::{format_date, IndexValue};

static AUTOFILTER: OnceCell<Predicate> = OnceCell::new();
static LIFESPAN_FILTER: OnceCell<Predicate> = OnceCell::new();

/// Text of the filter excluding system content.
#[must_use]
pub fn autofilter_text() -> String {
    format!("{}:no", names::IS_SYSTEM)
}

/// Text of the filter keeping content whose lifespan is off or covers `now`.
///
/// `ValidTill` at the minimum date means the window never closes.
#[must_use]
pub fn lifespan_filter_text(now: DateTime<Utc>) -> String {
    let now = format_date(&now);
    let never = format_date(&IndexValue::min_date());
    format!(
        "{enable}:no (+{from}:<='{now}' +({till}:>'{now}' {till}:'{never}'))",
        enable = names::ENABLE_LIFESPAN,
        from = names::VALID_FROM,
        till = names::VALID_TILL,
    )
}

fn parse_fragment(text: &str) -> QueryResult<Predicate> {
    parse(text, &BuiltinFieldInfo::new()).map(|query| query.into_predicate())
}

pub(crate) fn autofilter() -> QueryResult<&'static Predicate> {
    AUTOFILTER.get_or_try_init(|| parse_fragment(&autofilter_text()))
}

/// The lifespan filter.
///
/// `now` is fixed when the filter is first built and reused by every later
/// query in the process.
// TODO: decide whether the window should follow the clock, e.g. by caching per minute.
pub(crate) fn lifespan_filter() -> QueryResult<&'static Predicate> {
    LIFESPAN_FILTER.get_or_try_init(|| parse_fragment(&lifespan_filter_text(Utc::now())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{to_text, Occurrence};
    use chrono::TimeZone;

    #[test]
    fn autofilter_excludes_system_content() {
        assert_eq!(autofilter().unwrap(), &Predicate::text("IsSystem", false));
    }

    #[test]
    fn lifespan_filter_shape() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let predicate = parse_fragment(&lifespan_filter_text(now)).unwrap();
        assert_eq!(
            to_text(&predicate),
            concat!(
                r#"EnableLifespan:no (+ValidFrom:<="2024-06-01 10:00:00.0000" "#,
                r#"+(ValidTill:>"2024-06-01 10:00:00.0000" ValidTill:"0001-01-01 00:00:00.0000"))"#,
            )
        );
        let Predicate::Logical(logical) = predicate else {
            panic!("expected logical predicate");
        };
        assert!(logical
            .clauses()
            .iter()
            .all(|c| c.occurrence == Occurrence::Should));
    }

    #[test]
    fn lifespan_filter_is_cached() {
        let first = lifespan_filter().unwrap();
        let second = lifespan_filter().unwrap();
        assert!(std::ptr::eq(first, second));
    }
}
