use test_case::test_case;

use super::*;
use crate::query_model::{BooleanExpression, OrderBySpec};

#[test_case(None, Some(10), " ORDER BY t0.entity_identity ASC LIMIT 10" ; "limit only")]
#[test_case(Some(20), Some(10), " ORDER BY t0.entity_identity ASC LIMIT 10 OFFSET 20" ; "limit and offset")]
#[test_case(Some(5), None, " ORDER BY t0.entity_identity ASC OFFSET 5" ; "offset only")]
#[test_case(Some(0), None, "WHERE t0.entity_type_id IN (11, 12)" ; "zero offset is no pagination")]
#[test_case(None, None, "WHERE t0.entity_type_id IN (11, 12)" ; "unpaginated")]
fn test_pagination_suffix(first: Option<u64>, max: Option<u64>, suffix: &str) {
    let mut request = QueryRequest::new("Person");
    request.first_result = first;
    request.max_results = max;
    let sql = compile(&request).unwrap().sql;
    assert!(sql.ends_with(suffix), "{}", sql);
}

#[test]
fn test_order_by_joins_follow_predicate_aliases() {
    let request = QueryRequest::new("Person")
        .with_predicate(BooleanExpression::eq(person("name"), "Alice"))
        .order_by(OrderBySpec::descending(person("age")))
        .order_by(OrderBySpec::ascending(person("age")))
        .max_results(5);
    let compiled = compile(&request).unwrap();
    assert!(compiled.sql.starts_with(
        "SELECT DISTINCT t0.entity_pk, t0.entity_identity, t3.qname_value FROM entities t0 \
         LEFT JOIN person_age t3 ON t3.entity_pk = t0.entity_pk \
         WHERE t0.entity_type_id IN (11, 12) AND (t0.entity_pk, t0.entity_identity) IN (\
         SELECT DISTINCT t1.entity_pk"
    ));
    assert!(compiled.sql.ends_with(" ORDER BY t3.qname_value DESC LIMIT 5"));
}

#[test]
fn test_explicit_order_replaces_identity_default() {
    let request = QueryRequest::new("Person")
        .order_by(OrderBySpec::ascending(person("name")))
        .max_results(10);
    let sql = compile(&request).unwrap().sql;
    assert!(sql.ends_with(" ORDER BY t1.qname_value ASC LIMIT 10"));
    assert!(!sql.contains("t0.entity_identity ASC"));
}
