//! E2E tests for the vector-set store against a live Redis server
//!
//! Point `VSET_REDIS_URL` at a server with vector-set support and run with
//! `--features redis -- --ignored`.

mod integration;

use integration::{asserts, fixtures};
use vset_store::{FilterExpr, Metadata, SearchRequest, Vector, VectorSetStore};

fn connect() -> VectorSetStore {
    fixtures::init();
    VectorSetStore::connect(&fixtures::isolated_config()).expect("connect to redis")
}

fn metadata(name: &str, age: u32) -> Metadata {
    Metadata::new(serde_json::json!({ "name": name, "age": age }).to_string())
}

#[test]
#[ignore = "requires a Redis server with vector sets"]
fn redis_add_search_and_remove() {
    let store = connect();

    let ids = store
        .add_batch(
            &[
                Vector::new(vec![1.0, 0.0, 0.0]),
                Vector::new(vec![0.8, 0.2, 0.0]),
                Vector::new(vec![0.0, 0.0, 1.0]),
            ],
            &[metadata("alice", 30), metadata("bob", 42), metadata("carol", 25)],
        )
        .expect("add batch");
    assert_eq!(ids.len(), 3);

    let matches = store
        .search(Some(&SearchRequest::new(Vector::new(vec![1.0, 0.0, 0.0]))))
        .expect("search");
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[0].id, ids[0]);
    assert_eq!(matches[0].metadata, Some(metadata("alice", 30)));
    assert_eq!(matches[0].vector.len(), 3);
    asserts::assert_scores_descending(&matches);

    store.remove(&ids[0]).expect("remove");
    let matches = store
        .search(Some(&SearchRequest::new(Vector::new(vec![1.0, 0.0, 0.0]))))
        .expect("search after remove");
    assert!(matches.iter().all(|m| m.id != ids[0]));

    store.remove_all().expect("remove all");
}

#[test]
#[ignore = "requires a Redis server with vector sets"]
fn redis_filtered_search() {
    let store = connect();

    store
        .add_batch(
            &[
                Vector::new(vec![1.0, 0.0]),
                Vector::new(vec![0.9, 0.1]),
                Vector::new(vec![0.1, 0.9]),
            ],
            &[metadata("alice", 30), metadata("bob", 42), metadata("carol", 25)],
        )
        .expect("add batch");

    let request = SearchRequest::new(Vector::new(vec![1.0, 0.0])).with_filter(FilterExpr::and(
        FilterExpr::gte("age", 26),
        FilterExpr::is_in("name", vec!["alice", "bob"]),
    ));
    let matches = store.search(Some(&request)).expect("filtered search");

    assert_eq!(matches.len(), 2);
    asserts::assert_scores_descending(&matches);
    assert!(matches
        .iter()
        .all(|m| m.metadata != Some(metadata("carol", 25))));

    store.remove_all().expect("remove all");
}

#[test]
#[ignore = "requires a Redis server with vector sets"]
fn redis_min_score_limits_results() {
    let store = connect();

    store
        .add_with_id("same", &Vector::new(vec![1.0, 0.0]))
        .expect("add same");
    store
        .add_with_id("opposite", &Vector::new(vec![-1.0, 0.0]))
        .expect("add opposite");

    let request = SearchRequest::new(Vector::new(vec![1.0, 0.0])).with_min_score(0.9);
    let matches = store.search(Some(&request)).expect("search");

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, "same");

    store.remove_all().expect("remove all");
}

#[test]
#[ignore = "requires a Redis server with vector sets"]
fn redis_remove_all_clears_the_set() {
    let store = connect();

    store.add(&Vector::new(vec![0.5, 0.5])).expect("add");
    store.remove_all().expect("remove all");

    let matches = store
        .search(Some(&SearchRequest::new(Vector::new(vec![0.5, 0.5]))))
        .expect("search after remove all");
    assert!(matches.is_empty());
}
