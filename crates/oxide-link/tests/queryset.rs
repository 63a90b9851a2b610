//! Tests for QuerySet execution: buffering, invalidation, the cursor
//! protocol, and exactly-one lookups.

mod common;
use common::*;

use oxide_link::{Model, OrmError, Q, SqlValue};

#[test]
fn fetch_compiles_filter_order_and_limit() {
    let mock = MockGateway::new();
    mock.push_rows(vec![user_row(2, "Bob"), user_row(3, "Carol")]);
    let gateway = mock.shared();

    let mut users = User::objects(&gateway)
        .unwrap()
        .filter(Q::gt("name", "B"))
        .order("name", true)
        .limit(2, 0)
        .unwrap();

    assert_eq!(users.count().unwrap(), 2);
    assert_eq!(
        mock.last(),
        (
            "SELECT * FROM user WHERE name > ? ORDER BY name ASC LIMIT 0,2".to_string(),
            vec![text("B")]
        )
    );
}

#[test]
fn results_are_buffered_until_invalidated() {
    let mock = MockGateway::new();
    mock.push_rows(vec![user_row(1, "Alice"), user_row(2, "Bob")]);
    let gateway = mock.shared();

    let mut users = User::objects(&gateway).unwrap();
    assert_eq!(users.count().unwrap(), 2);
    assert_eq!(users.count().unwrap(), 2);
    users.rewind().unwrap();
    users.instances().unwrap();
    assert_eq!(mock.calls(), 1);

    mock.push_rows(vec![user_row(2, "Bob")]);
    let mut users = users.filter(Q::eq("name", "Bob"));
    assert!(!users.is_cached());
    assert_eq!(users.count().unwrap(), 1);
    assert_eq!(mock.calls(), 2);

    mock.push_rows(vec![]);
    let mut users = users.order("id", false);
    assert_eq!(users.count().unwrap(), 0);
    assert_eq!(mock.calls(), 3);

    mock.push_rows(vec![]);
    let mut users = users.limit(1, 1).unwrap();
    assert!(!users.exists().unwrap());
    assert_eq!(mock.calls(), 4);
    assert_eq!(
        mock.last().0,
        "SELECT * FROM user WHERE name = ? ORDER BY id DESC LIMIT 1,1"
    );
}

#[test]
fn exclude_wraps_filter_in_not() {
    let mock = MockGateway::new();
    let gateway = mock.shared();

    let mut users = User::objects(&gateway)
        .unwrap()
        .filter(Q::gt("id", 1))
        .exclude(Q::in_list("name", ["Bob", "Eve"]).unwrap());
    users.count().unwrap();

    assert_eq!(
        mock.last(),
        (
            "SELECT * FROM user WHERE id > ? AND NOT (name IN (?, ?))".to_string(),
            vec![SqlValue::Int(1), text("Bob"), text("Eve")]
        )
    );
}

#[test]
fn cursor_walks_buffered_rows_in_fetch_order() {
    let mock = MockGateway::new();
    mock.push_rows(vec![user_row(1, "Alice"), user_row(2, "Bob")]);
    let gateway = mock.shared();

    let mut users = User::objects(&gateway).unwrap();
    let mut names = Vec::new();
    users.rewind().unwrap();
    while users.valid().unwrap() {
        names.push(users.current().unwrap().get("name").unwrap().clone());
        users.next().unwrap();
    }
    assert_eq!(names, vec![text("Alice"), text("Bob")]);
    assert_eq!(users.key().unwrap(), None);
    assert!(matches!(
        users.current(),
        Err(OrmError::InvalidCursor { index: 2, len: 2 })
    ));

    users.rewind().unwrap();
    assert_eq!(users.key().unwrap(), Some(0));
    assert_eq!(mock.calls(), 1);
}

#[test]
fn fetched_instances_are_persisted_with_pk_snapshot() {
    let mock = MockGateway::new();
    mock.push_rows(vec![user_row(7, "Grace")]);
    let gateway = mock.shared();

    let mut users = User::objects(&gateway).unwrap();
    let grace = users.first().unwrap().unwrap();
    assert!(grace.exists());
    assert_eq!(grace.pk_cache(), [("id".to_string(), SqlValue::Int(7))]);
    assert_eq!(grace.to_string(), "user instance (existing, id=7)");
}

#[test]
fn modifying_current_row_and_saving_updates_it() {
    let mock = MockGateway::new();
    mock.push_rows(vec![user_row(1, "Alice")]);
    let gateway = mock.shared();

    let mut users = User::objects(&gateway).unwrap();
    users.rewind().unwrap();
    let alice = users.current_mut().unwrap();
    alice.set("name", "Alicia").unwrap();
    alice.save().unwrap();

    assert_eq!(
        mock.last(),
        (
            "UPDATE user SET id = ?, name = ? WHERE id = ?".to_string(),
            vec![SqlValue::Int(1), text("Alicia"), SqlValue::Int(1)]
        )
    );
}

#[test]
fn get_requires_exactly_one_row() {
    let mock = MockGateway::new();
    let gateway = mock.shared();

    mock.push_rows(vec![]);
    let err = User::objects(&gateway).unwrap().get().unwrap_err();
    assert!(matches!(err, OrmError::ObjectDoesNotExist { ref model } if model == "user"));

    mock.push_rows(vec![user_row(1, "A"), user_row(2, "B"), user_row(3, "C")]);
    let err = User::objects(&gateway).unwrap().get().unwrap_err();
    assert!(matches!(err, OrmError::MultipleObjectsReturned { count: 3, .. }));

    mock.push_rows(vec![user_row(2, "B")]);
    let b = User::objects(&gateway)
        .unwrap()
        .filter(Q::eq("id", 2))
        .get()
        .unwrap();
    assert_eq!(b.get("name").unwrap(), &text("B"));

    // The full result set is counted, never truncated with a LIMIT.
    assert!(mock.executed().iter().all(|(sql, _)| !sql.contains("LIMIT")));
}

#[test]
fn unknown_result_column_is_reported() {
    let mock = MockGateway::new();
    mock.push_rows(vec![user_row(1, "Alice").with("email", text("a@x.io"))]);
    let gateway = mock.shared();

    let err = User::objects(&gateway).unwrap().count().unwrap_err();
    assert!(matches!(err, OrmError::FieldNotFound { ref field, .. } if field == "email"));
}

#[test]
fn gateway_failure_propagates_and_is_retried_on_next_access() {
    let mock = MockGateway::new();
    mock.push_failure("no such table: user");
    let gateway = mock.shared();

    let mut users = User::objects(&gateway).unwrap();
    let err = users.count().unwrap_err();
    assert_eq!(err.to_string(), "execution error: no such table: user");
    assert!(!users.is_cached());

    mock.push_rows(vec![user_row(1, "Alice")]);
    assert_eq!(users.count().unwrap(), 1);
    assert_eq!(mock.calls(), 2);
}

#[test]
fn into_instances_hands_over_results() {
    let mock = MockGateway::new();
    mock.push_rows(vec![user_row(1, "Alice"), user_row(2, "Bob")]);
    let gateway = mock.shared();

    let users = User::objects(&gateway).unwrap().into_instances().unwrap();
    let ids: Vec<&SqlValue> = users.iter().map(|u| u.get("id").unwrap()).collect();
    assert_eq!(ids, vec![&SqlValue::Int(1), &SqlValue::Int(2)]);
}
