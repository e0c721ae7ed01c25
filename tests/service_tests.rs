mod common;

use common::{body_json, Blog};
use crudrouter::router::Navigation;
use crudrouter::{CrudRequest, Response};
use http::Method;
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_collection_get_queries_dao() {
    let blog = Blog::new();
    let service = blog.service(Navigation::Flat);

    let res = service.handle(CrudRequest::get("/articles"));
    assert_eq!(res.status, 200);
    assert_eq!(res.get_header("content-type"), Some("application/json; charset=utf-8"));
    assert_eq!(body_json(&res), json!({ "url_params": {} }));
    assert_eq!(blog.articles.calls(), vec!["query"]);
}

#[test]
fn test_nested_instance_get_passes_url_params() {
    let blog = Blog::new();
    let service = blog.service(Navigation::Tree);

    let res = service.handle(CrudRequest::get("/authors/5/articles/9"));
    assert_eq!(res.status, 200);
    assert_eq!(
        body_json(&res),
        json!({ "url_params": { "authors": "5", "articles": "9" } })
    );
    assert_eq!(blog.articles.calls(), vec!["get"]);
    assert!(blog.authors.calls().is_empty());
}

#[test]
fn test_create_sets_location_from_primary_key() {
    let blog = Blog::new();
    let service = blog.service(Navigation::Flat);

    let req = CrudRequest::post("/articles").with_json(&json!({ "title": "Hello" }));
    let res = service.handle(req);
    assert_eq!(res.status, 201);
    assert_eq!(res.get_header("location"), Some("/articles/7"));
    assert_eq!(body_json(&res), json!({ "id": 7, "title": "Hello" }));
    assert_eq!(blog.articles.calls(), vec!["create"]);
}

#[test]
fn test_instance_verbs_map_to_dao_operations() {
    let blog = Blog::new();
    let service = blog.service(Navigation::Flat);

    let put = service.handle(CrudRequest::put("/articles/1").with_json(&json!({ "a": 1 })));
    assert_eq!(put.status, 200);
    assert_eq!(body_json(&put), json!({ "a": 1 }));

    let patch = service.handle(CrudRequest::patch("/articles/1").with_json(&json!({ "b": 2 })));
    assert_eq!(patch.status, 200);

    let delete = service.handle(CrudRequest::delete("/articles/1"));
    assert_eq!(delete.status, 204);
    assert!(delete.body.is_empty());

    assert_eq!(blog.articles.calls(), vec!["update", "patch", "delete"]);
}

#[test]
fn test_bulk_verbs_map_to_dao_operations() {
    let blog = Blog::new();
    let service = blog.service(Navigation::Flat);
    let items = json!([{ "id": 1 }, { "id": 2 }]);

    for method in [Method::POST, Method::PUT, Method::PATCH] {
        let res = service.handle(CrudRequest::new(method, "/articles/_bulk").with_json(&items));
        assert_eq!(res.status, 200);
        assert_eq!(body_json(&res), items);
    }

    let res = service.handle(CrudRequest::delete("/articles/_bulk").with_json(&items));
    assert_eq!(res.status, 200);
    assert_eq!(res.body_str(), Some("deleted 2"));
    assert_eq!(res.get_header("content-type"), Some("application/json; charset=utf-8"));

    assert_eq!(
        blog.articles.calls(),
        vec!["bulk_create", "bulk_update", "bulk_patch", "bulk_delete"]
    );
}

#[test]
fn test_bulk_body_must_be_an_array() {
    let blog = Blog::new();
    let service = blog.service(Navigation::Flat);

    let res = service.handle(CrudRequest::post("/articles/_bulk").with_json(&json!({ "id": 1 })));
    assert_eq!(res.status, 400);

    let empty = service.handle(
        CrudRequest::post("/articles/_bulk").with_header("Content-Type", "application/json"),
    );
    assert_eq!(empty.status, 400);
    assert_eq!(blog.articles.call_count(), 0);
}

#[test]
fn test_bulk_on_instance_is_not_found_without_dao_call() {
    let blog = Blog::new();
    let service = blog.service(Navigation::Flat);
    for method in [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS] {
        let res = service.handle(CrudRequest::new(method, "/articles/42/_bulk"));
        assert_eq!(res.status, 404);
        assert_eq!(body_json(&res)["error"], "routing_not_found");
    }
    assert_eq!(blog.total_calls(), 0);
}

#[test]
fn test_unknown_resource_is_not_found_without_dao_call() {
    let blog = Blog::new();
    let service = blog.service(Navigation::Tree);
    assert_eq!(service.handle(CrudRequest::get("/ghosts")).status, 404);
    assert_eq!(service.handle(CrudRequest::get("/tags/1/articles")).status, 404);
    assert_eq!(blog.total_calls(), 0);
}

#[test]
fn test_options_lists_sorted_verbs_without_dao_call() {
    let blog = Blog::new();
    let service = blog.service(Navigation::Flat);
    let cases = [
        ("/articles", "GET, OPTIONS, POST"),
        ("/articles/1", "DELETE, GET, OPTIONS, PATCH, PUT"),
        ("/articles/_bulk", "DELETE, OPTIONS, PATCH, POST, PUT"),
    ];
    for (path, allow) in cases {
        let res = service.handle(CrudRequest::new(Method::OPTIONS, path));
        assert_eq!(res.status, 200, "{path}");
        assert_eq!(res.get_header("allow"), Some(allow), "{path}");
        assert!(res.body.is_empty());
    }
    assert_eq!(blog.total_calls(), 0);
}

#[test]
fn test_unsupported_verb_is_method_not_allowed() {
    let blog = Blog::new();
    let service = blog.service(Navigation::Flat);

    let res = service.handle(CrudRequest::put("/articles").with_json(&json!({})));
    assert_eq!(res.status, 405);
    assert_eq!(res.get_header("allow"), Some("GET, OPTIONS, POST"));

    let res = service.handle(CrudRequest::get("/articles/_bulk"));
    assert_eq!(res.status, 405);
    assert_eq!(blog.total_calls(), 0);
}

#[test]
fn test_unknown_verb_is_not_implemented() {
    let blog = Blog::new();
    let service = blog.service(Navigation::Flat);
    for method in [Method::HEAD, Method::TRACE, Method::CONNECT] {
        let res = service.handle(CrudRequest::new(method, "/articles"));
        assert_eq!(res.status, 501);
    }
    assert_eq!(blog.total_calls(), 0);
}

#[test]
fn test_accept_negotiation() {
    let blog = Blog::new();
    let service = blog.service(Navigation::Flat);

    let yaml = service.handle(CrudRequest::get("/articles/3").with_header("Accept", "application/x-yaml"));
    assert_eq!(yaml.status, 200);
    assert_eq!(yaml.get_header("content-type"), Some("application/x-yaml; charset=utf-8"));
    let decoded: serde_json::Value = serde_yaml::from_slice(&yaml.body).unwrap();
    assert_eq!(decoded, json!({ "url_params": { "articles": "3" } }));

    let res = service.handle(CrudRequest::get("/articles/3").with_header("Accept", "text/html"));
    assert_eq!(res.status, 406);
}

#[test]
fn test_unregistered_content_type_is_unsupported_media_type() {
    let blog = Blog::new();
    let service = blog.service(Navigation::Flat);
    let req = CrudRequest::post("/articles")
        .with_header("Content-Type", "text/plain")
        .with_body("title=hello");
    assert_eq!(service.handle(req).status, 415);
    assert_eq!(blog.articles.call_count(), 0);
}

#[test]
fn test_malformed_body_is_bad_request() {
    let blog = Blog::new();
    let service = blog.service(Navigation::Flat);
    let req = CrudRequest::post("/articles")
        .with_header("Content-Type", "application/json")
        .with_body("{not json");
    assert_eq!(service.handle(req).status, 400);
    assert_eq!(blog.articles.call_count(), 0);
}

#[test]
fn test_root_handler_answers_empty_path() {
    let blog = Blog::new();
    let service = crudrouter::AppService::new(
        blog.router(Navigation::Flat)
            .with_root(|req| Response::empty(200).with_header("X-Path", req.path.clone())),
    );
    let res = service.handle(CrudRequest::get("/"));
    assert_eq!(res.status, 200);
    assert_eq!(res.get_header("x-path"), Some("/"));

    let bare = blog.service(Navigation::Flat);
    assert_eq!(bare.handle(CrudRequest::get("/")).status, 404);
}

#[test]
fn test_concurrent_dispatch_in_coroutines() {
    may::config().set_stack_size(0x10000);
    let blog = Blog::new();
    let service = Arc::new(blog.service(Navigation::Tree));

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let service = Arc::clone(&service);
            // SAFETY: the coroutine only touches values it owns.
            unsafe {
                may::coroutine::Builder::new()
                    .spawn(move || {
                        let path = format!("/authors/{i}/articles/{i}");
                        let res = service.handle(CrudRequest::get(&path));
                        (i, res)
                    })
                    .unwrap()
            }
        })
        .collect();

    for handle in handles {
        let (i, res) = handle.join().unwrap();
        assert_eq!(res.status, 200);
        let id = i.to_string();
        assert_eq!(
            body_json(&res),
            json!({ "url_params": { "authors": id, "articles": id } })
        );
    }
    assert_eq!(blog.articles.call_count(), 32);
}
