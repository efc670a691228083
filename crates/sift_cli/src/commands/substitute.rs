//! Substitute command implementation.

use super::{emit, CliError, Format};
use serde::Serialize;
use sift_core::legacy::{safe_queries, substitute_parameters};
use sift_core::QueryParam;
use tracing::debug;

/// Substitution output.
#[derive(Debug, Serialize)]
pub struct SubstituteResult {
    /// The template as given.
    pub template: String,
    /// Parameters as interpreted.
    pub params: Vec<QueryParam>,
    /// The filled-in text.
    pub text: String,
    /// Whether the template may run as the system user.
    pub safe: bool,
}

/// Reads a parameter as JSON when it is valid JSON, as text otherwise.
///
/// `5` is an integer, `true` a boolean, `[1,2]` a list, `"5"` and `Folder`
/// are text.
#[must_use]
pub fn read_param(raw: &str) -> QueryParam {
    serde_json::from_str(raw).unwrap_or_else(|_| QueryParam::Text(raw.to_string()))
}

/// Fills the template's placeholders.
pub fn substitute(template: &str, raw_params: &[String]) -> Result<SubstituteResult, CliError> {
    let params: Vec<QueryParam> = raw_params.iter().map(|raw| read_param(raw)).collect();
    let text = substitute_parameters(template, &params)?;
    Ok(SubstituteResult {
        template: template.to_string(),
        safe: safe_queries().contains(template),
        params,
        text,
    })
}

/// Runs the substitute command.
pub fn run(
    template: &str,
    raw_params: &[String],
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    debug!(params = raw_params.len(), "Substituting {:?}", template);
    let result = substitute(template, raw_params)?;
    emit(&result, format, |result| println!("{}", result.text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::legacy::CoreSafeQueries;

    #[test]
    fn params_are_typed_when_they_read_as_json() {
        assert_eq!(read_param("5"), QueryParam::Integer(5));
        assert_eq!(read_param("true"), QueryParam::Bool(true));
        assert_eq!(read_param("\"5\""), QueryParam::Text("5".to_string()));
        assert_eq!(read_param("My Doc"), QueryParam::Text("My Doc".to_string()));
        assert_eq!(
            read_param("[1,2]"),
            QueryParam::List(vec![QueryParam::Integer(1), QueryParam::Integer(2)])
        );
    }

    #[test]
    fn fills_and_checks_safety() {
        let result = substitute(
            CoreSafeQueries::TYPE_IN_TREE,
            &["Folder".to_string(), "/Root/My Docs".to_string()],
        )
        .unwrap();
        assert_eq!(result.text, "+TypeIs:Folder +InTree:\"/Root/My Docs\"");
        assert!(result.safe);

        assert!(matches!(
            substitute("Id:@1", &["1".to_string()]),
            Err(CliError::Query(_))
        ));
    }
}
