use super::*;
use crate::engine::{PermissionFilterFactory, QueryEngine};
use crate::field_info::BuiltinFieldInfo;
use crate::predicate::LogicalClause;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn parse(text: &str) -> Query {
    Query::parse(text, &BuiltinFieldInfo::new()).unwrap()
}

/// Full engine that returns fixed ids and records what it saw.
#[derive(Default)]
struct FixedEngine {
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
    fail: bool,
}

impl QueryEngine for FixedEngine {
    fn execute_query(
        &self,
        query: &Query,
        _filter: &dyn PermissionFilter,
        _context: &QueryContext,
    ) -> QueryResult<QueryHits<ContentId>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(to_text(query.predicate()));
        if self.fail {
            return Err(QueryError::engine("index unavailable"));
        }
        Ok(QueryHits::new(vec![1, 2], 2))
    }

    fn execute_query_and_project(
        &self,
        _query: &Query,
        _filter: &dyn PermissionFilter,
        _context: &QueryContext,
    ) -> QueryResult<QueryHits<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(QueryHits::new(vec!["full".to_string()], 1))
    }
}

enum MetaBehavior {
    Answer,
    Decline,
    Fail,
}

struct ScriptedMeta {
    behavior: MetaBehavior,
    calls: AtomicUsize,
}

impl ScriptedMeta {
    fn new(behavior: MetaBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    fn answer<T>(&self, hits: Vec<T>) -> QueryResult<MetaAnswer<T>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MetaBehavior::Answer => {
                let count = hits.len();
                Ok(MetaAnswer::Answered(QueryHits::new(hits, count)))
            }
            MetaBehavior::Decline => Ok(MetaAnswer::NotHandled),
            MetaBehavior::Fail => Err(QueryError::invalid_query("x", "meta parser choked")),
        }
    }
}

impl MetaQueryEngine for ScriptedMeta {
    fn try_execute_query(
        &self,
        _query: &Query,
        _filter: &dyn PermissionFilter,
        _context: &QueryContext,
    ) -> QueryResult<MetaAnswer<ContentId>> {
        self.answer(vec![99])
    }

    fn try_execute_query_and_project(
        &self,
        _query: &Query,
        _filter: &dyn PermissionFilter,
        _context: &QueryContext,
    ) -> QueryResult<MetaAnswer<String>> {
        self.answer(vec!["meta".to_string()])
    }
}

#[derive(Default)]
struct CountingFactory {
    created: AtomicUsize,
}

impl PermissionFilterFactory for CountingFactory {
    fn create(&self, _query: &Query, _context: &QueryContext) -> Box<dyn PermissionFilter> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Box::new(crate::engine::PermitAll)
    }
}

#[test]
fn and_clause_wraps_both_under_must() {
    let mut query = parse("A:1");
    query.add_and_clause(Predicate::text("B", "2"));
    assert_eq!(to_text(query.predicate()), "+A:1 +B:2");

    let mut query = parse("A:1 A:3");
    query.add_and_clause(Predicate::text("B", "2"));
    assert_eq!(to_text(query.predicate()), "+(A:1 A:3) +B:2");
}

#[test]
fn or_clause_wraps_both_under_should() {
    let mut query = parse("+A:1 +A:3");
    query.add_or_clause(Predicate::text("B", "2"));
    assert_eq!(to_text(query.predicate()), "(+A:1 +A:3) B:2");
}

#[test]
fn prepare_injects_autofilter_by_default() {
    let mut query = parse("Type:Folder");
    query.prepare(&QueryConfig::default()).unwrap();
    assert_eq!(to_text(query.predicate()), "+Type:Folder +IsSystem:no");
    assert!(query.is_prepared());
}

#[test]
fn prepare_is_idempotent() {
    let config = QueryConfig::default().lifespan_by_default(true);
    let mut once = parse("Type:Folder");
    once.prepare(&config).unwrap();

    let mut twice = parse("Type:Folder");
    twice.prepare(&config).unwrap();
    twice.prepare(&config).unwrap();

    assert_eq!(once.predicate(), twice.predicate());
}

#[test]
fn prepare_respects_switches() {
    let mut query = parse("Type:Folder .AUTOFILTERS:OFF");
    query.prepare(&QueryConfig::default()).unwrap();
    assert_eq!(query.predicate(), &Predicate::text("Type", "Folder"));

    let mut query = parse("Type:Folder .AUTOFILTERS:OFF .LIFESPAN:ON");
    query.prepare(&QueryConfig::default()).unwrap();
    let Predicate::Logical(logical) = query.predicate() else {
        panic!("expected logical predicate");
    };
    assert_eq!(logical.clauses().len(), 2);
    assert!(to_text(&logical.clauses()[1].predicate).starts_with("EnableLifespan:no"));
}

#[test]
fn prepare_with_both_filters_adds_one_conjunction() {
    let mut query = parse("Type:Folder .LIFESPAN:ON");
    query.prepare(&QueryConfig::default()).unwrap();
    let Predicate::Logical(logical) = query.predicate() else {
        panic!("expected logical predicate");
    };
    let occurrences: Vec<_> = logical
        .clauses()
        .iter()
        .map(|c: &LogicalClause| c.occurrence)
        .collect();
    assert_eq!(occurrences, vec![Occurrence::Must; 3]);
}

#[test]
fn meta_answer_short_circuits() {
    let engine = Arc::new(FixedEngine::default());
    let meta = Arc::new(ScriptedMeta::new(MetaBehavior::Answer));
    let context = QueryContext::new(engine.clone()).with_meta_engine(meta.clone());

    let hits = parse("Type:Folder").execute(&context).unwrap();
    assert_eq!(hits.hits, vec![99]);
    assert_eq!(meta.calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn meta_decline_falls_back() {
    let engine = Arc::new(FixedEngine::default());
    let meta = Arc::new(ScriptedMeta::new(MetaBehavior::Decline));
    let context = QueryContext::new(engine.clone()).with_meta_engine(meta);

    let hits = parse("Type:Folder").execute(&context).unwrap();
    assert_eq!(hits.hits, vec![1, 2]);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn meta_failure_is_swallowed() {
    let engine = Arc::new(FixedEngine::default());
    let meta = Arc::new(ScriptedMeta::new(MetaBehavior::Fail));
    let context = QueryContext::new(engine.clone()).with_meta_engine(meta);

    let mut query = parse("Name:x .SELECT:Name");
    assert_eq!(query.execute(&context).unwrap().hits, vec![1, 2]);
    assert_eq!(query.execute_and_project(&context).unwrap().hits, vec!["full"]);
}

#[test]
fn full_engine_errors_propagate() {
    let engine = Arc::new(FixedEngine {
        fail: true,
        ..FixedEngine::default()
    });
    let context = QueryContext::new(engine);
    let err = parse("Type:Folder").execute(&context).unwrap_err();
    assert_eq!(err, QueryError::engine("index unavailable"));
}

#[test]
fn filter_is_built_per_execute() {
    let engine = Arc::new(FixedEngine::default());
    let factory = Arc::new(CountingFactory::default());
    let context = QueryContext::new(engine.clone()).with_filter_factory(factory.clone());

    let mut query = parse("Type:Folder");
    query.execute(&context).unwrap();
    query.execute(&context).unwrap();
    assert_eq!(factory.created.load(Ordering::SeqCst), 2);

    // The second execution reuses the prepared tree.
    let seen = engine.seen.lock();
    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[0], "+Type:Folder +IsSystem:no");
}

#[test]
fn projection_requires_a_field() {
    let context = QueryContext::new(Arc::new(FixedEngine::default()));
    let err = parse("Type:Folder").execute_and_project(&context).unwrap_err();
    assert!(matches!(err, QueryError::InvalidOperation { .. }));
}

#[test]
fn to_text_reparses_to_same_query() {
    let text = "+Type:Folder -Name:tmp .SELECT:Name .TOP:5 .SKIP:10 .SORT:Name \
                .REVERSESORT:Index .AUTOFILTERS:OFF .LIFESPAN:ON .COUNTONLY .ALLVERSIONS .QUICK";
    let query = parse(text);
    let rendered = query.to_text();
    let reparsed = parse(&rendered);

    assert_eq!(query.predicate(), reparsed.predicate());
    assert_eq!(query.projection, reparsed.projection);
    assert_eq!(query.top, reparsed.top);
    assert_eq!(query.skip, reparsed.skip);
    assert_eq!(query.sort, reparsed.sort);
    assert_eq!(query.enable_autofilters, reparsed.enable_autofilters);
    assert_eq!(query.enable_lifespan_filter, reparsed.enable_lifespan_filter);
    assert_eq!(query.count_only, reparsed.count_only);
    assert_eq!(query.all_versions, reparsed.all_versions);
    assert_eq!(query.execution_mode, reparsed.execution_mode);
}
