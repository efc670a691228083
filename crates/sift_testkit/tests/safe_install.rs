//! Installing the process-wide safe query set.
//!
//! Lives in its own test binary: the set can be installed once per process.

use sift_core::legacy::{safe_queries, CoreSafeQueries, SafeQueriesBuilder, SafeQuerySet};
use sift_core::{ContentQuery, QueryError};
use sift_testkit::prelude::*;

struct Reports;

impl Reports {
    const BY_INDEX: &'static str = "+TypeIs:File +Index:@0";
}

impl SafeQuerySet for Reports {
    fn name(&self) -> &'static str {
        "reports"
    }

    fn queries(&self) -> Vec<&'static str> {
        vec![Self::BY_INDEX]
    }
}

#[test]
fn installed_set_governs_the_system_user() {
    let installed = SafeQueriesBuilder::new()
        .register(&Reports)
        .add("+TypeIs:Folder .SORT:Id")
        .install()
        .unwrap();
    assert!(installed.contains(Reports::BY_INDEX));
    assert!(installed.contains(CoreSafeQueries::BY_PATH));
    assert!(safe_queries().contains("+TypeIs:Folder .SORT:Id"));

    let again = SafeQueriesBuilder::new().install().unwrap_err();
    assert!(matches!(again, QueryError::InvalidOperation { .. }));

    let (_, context) = sample_context();
    let system = context.with_user(-1);

    let result = ContentQuery::new(Reports::BY_INDEX)
        .with_params(vec![2.into()])
        .execute(&system)
        .unwrap();
    assert_eq!(result.hits, vec![4]);

    let result = ContentQuery::new("+TypeIs:Folder .SORT:Id").execute(&system).unwrap();
    assert_eq!(result.hits, vec![1, 3, 6, 8]);

    let err = ContentQuery::new("+TypeIs:Folder .SORT:Name")
        .execute(&system)
        .unwrap_err();
    assert!(matches!(err, QueryError::SecurityViolation { .. }));
}
