mod common;

use common::{body_json, RecordingDao};
use crudrouter::controllers::ControllerKind;
use crudrouter::dao::Outcome;
use crudrouter::error::DispatchError;
use crudrouter::node::{normalize, Node};
use crudrouter::{CrudRequest, Flags, Response, UrlParams};
use serde_json::json;
use std::sync::Arc;

fn articles() -> (Node, Arc<RecordingDao>) {
    let dao = RecordingDao::new();
    (Node::new("articles", dao.as_dao()), dao)
}

fn params(pairs: &[(&str, &str)]) -> UrlParams {
    pairs.iter().copied().collect()
}

const BULK: Flags = Flags { bulk: true };

#[test]
fn test_parent_ids_do_not_make_an_instance() {
    let (node, _) = articles();
    let parent_only = params(&[("authors", "5")]);
    assert_eq!(
        node.select(&parent_only, Flags::default()).unwrap().kind(),
        ControllerKind::Resource
    );
    assert_eq!(node.select(&parent_only, BULK).unwrap().kind(), ControllerKind::Bulk);

    let both = params(&[("authors", "5"), ("articles", "1")]);
    assert_eq!(
        node.select(&both, Flags::default()).unwrap().kind(),
        ControllerKind::Instance
    );
}

#[test]
fn test_bulk_instance_fails_before_dao() {
    let (node, dao) = articles();
    let req = CrudRequest::post("/articles/1/_bulk").with_json(&json!([]));
    let err = node.call(&req, &params(&[("articles", "1")]), BULK).unwrap_err();
    assert!(matches!(err, DispatchError::RoutingNotFound { .. }));
    assert_eq!(dao.call_count(), 0);
}

#[test]
fn test_call_forwards_url_params() {
    let (node, dao) = articles();
    let url_params = params(&[("authors", "5"), ("articles", "1")]);
    let res = node
        .call(&CrudRequest::get("/authors/5/articles/1"), &url_params, Flags::default())
        .unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(
        body_json(&res),
        json!({ "url_params": { "authors": "5", "articles": "1" } })
    );
    assert_eq!(dao.calls(), vec!["get"]);
}

#[test]
fn test_normalize_passes_responses_through() {
    let req = CrudRequest::get("/articles").with_header("Accept", "text/html");
    let res = normalize(&req, Outcome::Response(Response::empty(202))).unwrap();
    assert_eq!(res.status, 202);
    assert!(res.headers.is_empty());
}

#[test]
fn test_normalize_tags_text_with_negotiated_type() {
    let req = CrudRequest::get("/articles").with_header("Accept", "application/x-yaml");
    let res = normalize(&req, Outcome::Text("plain".into())).unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.get_header("content-type"), Some("application/x-yaml; charset=utf-8"));
    assert_eq!(res.body_str(), Some("plain"));
}

#[test]
fn test_normalize_serializes_data() {
    let req = CrudRequest::get("/articles");
    let res = normalize(&req, Outcome::Data(json!([1, 2]))).unwrap();
    assert_eq!(res.get_header("content-type"), Some("application/json; charset=utf-8"));
    assert_eq!(res.body_str(), Some("[1,2]"));

    let picky = CrudRequest::get("/articles").with_header("Accept", "text/html");
    let err = normalize(&picky, Outcome::Data(json!([]))).unwrap_err();
    assert_eq!(err.status(), 406);
}
