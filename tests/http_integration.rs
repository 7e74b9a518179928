//! Integration tests for the JSON:API client using wiremock
//!
//! These tests run the real reqwest transport against mocked endpoints,
//! checking status classification, header merging and store syncing.

use jsonapi_store::network::Headers;
use jsonapi_store::{Config, JsonApiClient, RecordKey, RequestOptions, Store, TransportError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> JsonApiClient {
    let config = Config {
        base_url: server.uri(),
        ..Config::default()
    };
    JsonApiClient::new(config).expect("client should build")
}

/// Test module for client integration tests
mod client_tests {
    use super::*;

    /// Article with its author side-loaded
    #[tokio::test]
    async fn test_read_syncs_primary_and_included() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/articles/1"))
            .and(header("content-type", "application/vnd.api+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "id": "1",
                    "type": "article",
                    "attributes": { "title": "T" },
                    "relationships": { "author": { "data": { "id": "5", "type": "person" } } }
                },
                "included": [{ "id": "5", "type": "person", "attributes": { "name": "N" } }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let store = Store::new().shared();

        let response = client.read(&store, "/articles/1", None, None).await;
        assert!(response.error.is_none());
        assert_eq!(response.status, Some(200));

        let store = store.lock().await;
        let article = response.record(&store).expect("article should be synced");
        assert_eq!(article.attribute("title"), Some(&json!("T")));

        let author = store
            .related(&article.key(), "author")
            .and_then(|a| a.as_one().copied().flatten())
            .expect("author should be linked");
        assert_eq!(author.attribute("name"), Some(&json!("N")));
    }

    /// Reading the same document twice keeps one record per identity
    #[tokio::test]
    async fn test_repeated_read_does_not_duplicate() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/articles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": "1",
                    "type": "article",
                    "relationships": { "author": { "data": { "id": "5", "type": "person" } } }
                }],
                "included": [{ "id": "5", "type": "person" }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let store = Store::new().shared();

        client.read(&store, "articles", None, None).await;
        let response = client.read(&store, "articles", None, None).await;

        assert!(response.data.as_ref().unwrap().is_many());
        let store = store.lock().await;
        assert_eq!(store.len(), 2);
        assert_eq!(store.find_all("article").len(), 1);
        assert_eq!(store.find_all("person").len(), 1);
    }

    /// 404 with an errors document
    #[tokio::test]
    async fn test_404_sets_error_without_data() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/articles/404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "errors": [{ "status": "404", "title": "Not Found" }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let store = Store::new().shared();

        let response = client.read(&store, "/articles/404", None, None).await;
        assert_eq!(response.status, Some(404));
        assert_eq!(response.error, Some(TransportError::status(404)));
        assert!(response.data.is_none());
        assert_eq!(response.errors[0].title.as_deref(), Some("Not Found"));
        assert!(response.body.is_some());
        assert!(store.lock().await.is_empty());
    }

    /// 500 with a non-JSON body still reports the status
    #[tokio::test]
    async fn test_500_with_html_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let store = Store::new().shared();

        let response = client.read(&store, "/broken", None, None).await;
        assert_eq!(response.status, Some(500));
        assert_eq!(response.error.as_ref().and_then(|e| e.status_code()), Some(500));
        assert!(response.body.is_none());
    }

    /// Connection failure surfaces as a network error, not a panic
    #[tokio::test]
    async fn test_network_failure() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let config = Config {
            base_url: uri,
            ..Config::default()
        };
        let client = JsonApiClient::new(config).unwrap();
        let store = Store::new().shared();

        let response = client.read(&store, "/articles", None, None).await;
        assert!(matches!(response.error, Some(TransportError::Network(_))));
        assert!(response.status.is_none());
        assert!(response.data.is_none());
    }

    /// POST sends the document and syncs the created record
    #[tokio::test]
    async fn test_create_posts_body() {
        let server = MockServer::start().await;

        let body = json!({
            "data": { "id": "new", "type": "article", "attributes": { "title": "Draft" } }
        });

        Mock::given(method("POST"))
            .and(path("/articles"))
            .and(body_json(&body))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": { "id": "10", "type": "article", "attributes": { "title": "Draft" } }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let store = Store::new().shared();

        let response = client.create(&store, "articles", Some(&body), None, None).await;
        assert_eq!(response.status, Some(201));
        assert!(store.lock().await.find("article", "10").is_some());
    }

    /// PATCH updates the existing record in place
    #[tokio::test]
    async fn test_update_patches_in_place() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/articles/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": "1", "type": "article", "attributes": { "title": "New" } }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let store = Store::new().shared();
        store
            .lock()
            .await
            .sync_json(&json!({
                "data": { "id": "1", "type": "article", "attributes": { "title": "Old", "body": "B" } }
            }))
            .unwrap();

        let record = store.lock().await.find("article", "1").unwrap().to_resource();
        let body = jsonapi_store::Document::from_resource(record).to_value().unwrap();
        let response = client.update(&store, "/articles/1", Some(&body), None, None).await;
        assert!(response.is_ok());

        let store = store.lock().await;
        let article = store.find("article", "1").unwrap();
        assert_eq!(article.attribute("title"), Some(&json!("New")));
        assert_eq!(article.attribute("body"), Some(&json!("B")));
        assert_eq!(store.len(), 1);
    }

    /// DELETE with an empty 204 response
    #[tokio::test]
    async fn test_remove_with_empty_response() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/articles/1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let store = Store::new().shared();

        let response = client.remove(&store, "/articles/1", None, None).await;
        assert_eq!(response.status, Some(204));
        assert!(response.is_ok());
        assert!(response.data.is_none());
    }

    /// Per-call headers override defaults
    #[tokio::test]
    async fn test_request_headers_are_merged() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let store = Store::new().shared();

        let headers = Headers::from([
            ("Authorization".to_string(), "Bearer test-token".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ]);
        let response = client.read(&store, "/me", Some(&headers), None).await;

        assert_eq!(response.status, Some(200));
        assert_eq!(response.request_headers["authorization"], "Bearer test-token");
    }

    /// Query options reach the server
    #[tokio::test]
    async fn test_include_and_filter_options() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/articles"))
            .and(query_param("include", "author,comments"))
            .and(query_param("filter[status]", "published"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let store = Store::new().shared();

        let options = RequestOptions::new()
            .include("author")
            .include("comments")
            .filter("status", "published");
        let response = client.read(&store, "/articles", None, Some(&options)).await;

        assert_eq!(response.status, Some(200));
        assert_eq!(response.data.unwrap().len(), 0);
    }

    /// Relationship links stored on a record can be followed later
    #[tokio::test]
    async fn test_fetch_relationship_link() {
        let server = MockServer::start().await;
        let related = format!("{}/articles/1/comments", server.uri());

        Mock::given(method("GET"))
            .and(path("/articles/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "id": "1",
                    "type": "article",
                    "relationships": { "comments": { "links": { "related": related } } }
                }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/articles/1/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "id": "1", "type": "comment", "attributes": { "text": "a" } },
                    { "id": "2", "type": "comment", "attributes": { "text": "b" } }
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let store = Store::new().shared();

        client.read(&store, "/articles/1", None, None).await;
        let response = client
            .fetch_relationship_link(
                &store,
                &RecordKey::new("article", "1"),
                "comments",
                "related",
                None,
                None,
            )
            .await;

        assert_eq!(response.data.unwrap().len(), 2);
        assert_eq!(store.lock().await.find_all("comment").len(), 2);
    }

    /// Following a top-level `next` link
    #[tokio::test]
    async fn test_follow_next_link() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/articles"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "2", "type": "article" }]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/articles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "1", "type": "article" }],
                "links": { "next": format!("{}/articles?page=2", server.uri()), "prev": null }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let store = Store::new().shared();

        let first = client.read(&store, "/articles", None, None).await;
        let second = client.follow(&first, "next", &store).await;
        assert_eq!(second.status, Some(200));

        // null link: no request, empty envelope
        let none = client.follow(&first, "prev", &store).await;
        assert!(none.status.is_none());

        assert_eq!(store.lock().await.find_all("article").len(), 2);
    }
}
