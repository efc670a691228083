//! `@N` parameter substitution.

use crate::error::{QueryError, QueryResult};
use crate::predicate::{needs_quotes, quote};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sift_codec::{format_date, NO, YES};

/// A query template parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    /// Text, quoted when needed.
    Text(String),
    /// Integer.
    Integer(i64),
    /// Float.
    Float(f64),
    /// Boolean, rendered `yes`/`no`.
    Bool(bool),
    /// Date-time, rendered like index terms.
    DateTime(DateTime<Utc>),
    /// Several values, rendered as an implicit OR group.
    List(Vec<QueryParam>),
}

impl QueryParam {
    /// Renders the parameter for insertion into query text.
    ///
    /// Scalars are quoted when empty or containing whitespace or a query
    /// syntax character. Lists escape each element, join them with a space
    /// and get parentheses only when more than one element results.
    #[must_use]
    pub fn escape(&self) -> String {
        let scalar = match self {
            Self::List(items) => {
                let mut parts: Vec<String> = items.iter().map(Self::escape).collect();
                return if parts.len() > 1 {
                    format!("({})", parts.join(" "))
                } else {
                    parts.pop().unwrap_or_default()
                };
            }
            Self::Text(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Bool(b) => if *b { YES } else { NO }.to_string(),
            Self::DateTime(dt) => format_date(dt),
        };
        escape_value(&scalar)
    }
}

/// Quotes a literal if it is empty or contains whitespace or a syntax character.
#[must_use]
pub fn escape_value(text: &str) -> String {
    if needs_quotes(text, false) {
        quote(text)
    } else {
        text.to_string()
    }
}

macro_rules! impl_from_param {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(impl From<$ty> for QueryParam {
            fn from(value: $ty) -> Self {
                Self::$variant(value.into())
            }
        })+
    };
}

impl_from_param!(
    String => Text,
    &str => Text,
    i32 => Integer,
    i64 => Integer,
    f64 => Float,
    bool => Bool,
    DateTime<Utc> => DateTime,
);

impl<T: Into<QueryParam>> From<Vec<T>> for QueryParam {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Replaces every `@N` with the escaped N-th parameter.
///
/// # Errors
///
/// Returns [`QueryError::ParameterCountMismatch`] if an index is not below
/// the number of parameters.
pub fn substitute_parameters(text: &str, params: &[QueryParam]) -> QueryResult<String> {
    if params.is_empty() && !text.contains('@') {
        return Ok(text.to_string());
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find('@') {
        out.push_str(&rest[..at]);
        let after = &rest[at + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            out.push('@');
            rest = after;
            continue;
        }
        let index: usize = after[..digits].parse().unwrap_or(usize::MAX);
        let param = params.get(index).ok_or(QueryError::ParameterCountMismatch {
            index,
            count: params.len(),
        })?;
        out.push_str(&param.escape());
        rest = &after[digits..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn substitutes_and_quotes() {
        let text = substitute_parameters(
            "+TypeIs:@0 +Name:@1",
            &["Folder".into(), "My Doc".into()],
        )
        .unwrap();
        assert_eq!(text, "+TypeIs:Folder +Name:\"My Doc\"");
    }

    #[test]
    fn index_out_of_range() {
        let err = substitute_parameters("+Id:@2", &[1.into()]).unwrap_err();
        assert_eq!(err, QueryError::ParameterCountMismatch { index: 2, count: 1 });
    }

    #[test]
    fn multi_digit_and_repeated_indices() {
        let params: Vec<QueryParam> = (0..11i64).map(QueryParam::from).collect();
        let text = substitute_parameters("Id:@10 Id:@1 Id:@1", &params).unwrap();
        assert_eq!(text, "Id:10 Id:1 Id:1");
    }

    #[test]
    fn lone_at_sign_is_kept() {
        let text = substitute_parameters("Email:'a@b' Id:@0", &[7.into()]).unwrap();
        assert_eq!(text, "Email:'a@b' Id:7");
    }

    #[test]
    fn scalar_escaping() {
        assert_eq!(QueryParam::from("").escape(), "\"\"");
        assert_eq!(QueryParam::from("a\"b").escape(), r#""a\"b""#);
        assert_eq!(QueryParam::from("/Root/Sites").escape(), "\"/Root/Sites\"");
        assert_eq!(QueryParam::from(-5).escape(), "\"-5\"");
        assert_eq!(QueryParam::from(true).escape(), "yes");
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(QueryParam::from(date).escape(), "\"2024-03-01 12:00:00.0000\"");
    }

    #[test]
    fn list_escaping() {
        assert_eq!(QueryParam::from(vec![1, 2, 3]).escape(), "(1 2 3)");
        assert_eq!(QueryParam::from(vec!["a b"]).escape(), "\"a b\"");
        assert_eq!(QueryParam::from(Vec::<i32>::new()).escape(), "");
    }
}
