//! Classify command implementation.

use super::{emit, CliError, Format};
use sift_core::{BuiltinFieldInfo, Query, QueryInfo};
use tracing::debug;

/// Runs the classify command.
pub fn run(text: &str, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    debug!("Classifying {:?}", text);
    let info = classify(text)?;
    emit(&info, format, print_text_output)?;
    Ok(())
}

/// Parses `text` and classifies its predicate tree and sort keys.
pub fn classify(text: &str) -> Result<QueryInfo, CliError> {
    Ok(Query::parse(text, &BuiltinFieldInfo::new())?.info())
}

fn join(fields: &std::collections::BTreeSet<String>) -> String {
    if fields.is_empty() {
        "-".to_string()
    } else {
        fields.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

fn print_text_output(info: &QueryInfo) {
    println!("Clauses");
    println!("  must:      {}", info.must_count);
    println!("  should:    {}", info.should_count);
    println!("  must not:  {}", info.must_not_count);
    println!("Predicates");
    println!("  term:      {}", info.term_count);
    println!("  prefix:    {}", info.prefix_count);
    println!("  wildcard:  {}", info.wildcard_count);
    println!("  fuzzy:     {}", info.fuzzy_count);
    println!("  range:     {}", info.range_count);
    println!("  boolean:   {}", info.boolean_count);
    println!("Fields:      {}", join(&info.query_fields));
    println!("Sort:        {}", join(&info.sort_fields));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_fields() {
        let info = classify("+Type:Folder -Name:tmp* Id:[1 TO 5] .SORT:Name").unwrap();
        assert_eq!(info.must_count, 1);
        assert_eq!(info.must_not_count, 1);
        assert_eq!(info.should_count, 1);
        assert_eq!(info.prefix_count, 1);
        assert_eq!(info.range_count, 1);
        assert!(info.sort_fields.contains("Name"));
        assert_eq!(info.query_fields.len(), 3);
    }
}
