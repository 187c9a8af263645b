use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use base64::Engine as _;
use serde_json::{json, Value};
use shared::document::Document;
use shared::resource::{Database, PartitionKey};

use super::*;

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

impl Captured {
    fn push(&self, headers: HeaderMap, body: Value) {
        self.requests
            .lock()
            .expect("capture lock")
            .push((headers, body));
    }

    fn take(&self) -> Vec<(HeaderMap, Value)> {
        std::mem::take(&mut self.requests.lock().expect("capture lock"))
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}

fn test_client(endpoint: &str) -> DocumentClient {
    let key = base64::engine::general_purpose::STANDARD.encode(b"test key material");
    DocumentClient::with_master_key(endpoint, &key).expect("valid test key")
}

#[tokio::test]
async fn create_database_sends_signed_headers_and_body() {
    let captured = Captured::default();
    let app = Router::new()
        .route(
            "/dbs",
            post(
                |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    captured.push(headers, body);
                    Json(json!({ "id": "mydb", "_rid": "rid1", "_self": "dbs/rid1/" }))
                },
            ),
        )
        .with_state(captured.clone());
    let endpoint = serve(app).await;

    let client = test_client(&endpoint);
    let created = client
        .create_database(Database::definition("mydb"))
        .await
        .expect("create database");

    assert_eq!(created.id, "mydb");
    let requests = captured.take();
    assert_eq!(requests.len(), 1);
    let (headers, body) = &requests[0];
    assert_eq!(body, &json!({ "id": "mydb" }));
    assert_eq!(headers["x-ms-version"], "2018-12-31");
    assert!(headers["x-ms-date"]
        .to_str()
        .expect("ascii date")
        .ends_with(" GMT"));
    assert!(headers["authorization"]
        .to_str()
        .expect("ascii token")
        .starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
}

#[tokio::test]
async fn list_databases_unwraps_the_feed_envelope() {
    let app = Router::new().route(
        "/dbs",
        get(|| async {
            Json(json!({
                "_rid": "",
                "Databases": [
                    { "id": "mydb" },
                    { "id": "otherdb" }
                ],
                "_count": 2
            }))
        }),
    );
    let endpoint = serve(app).await;

    let databases = test_client(&endpoint)
        .list_databases()
        .await
        .expect("list databases");

    let ids: Vec<&str> = databases.iter().map(|db| db.id.as_str()).collect();
    assert_eq!(ids, ["mydb", "otherdb"]);
}

#[tokio::test]
async fn create_collection_sends_the_offer_throughput_header() {
    let captured = Captured::default();
    let app = Router::new()
        .route(
            "/dbs/mydb/colls",
            post(
                |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    captured.push(headers, body.clone());
                    Json(body)
                },
            ),
        )
        .with_state(captured.clone());
    let endpoint = serve(app).await;

    let options = RequestOptions {
        offer_throughput: Some(25000),
        ..RequestOptions::default()
    };
    test_client(&endpoint)
        .create_collection(
            "dbs/mydb",
            shared::resource::Collection::definition("MyCollection2", "/partitionKey"),
            &options,
        )
        .await
        .expect("create collection");

    let requests = captured.take();
    let (headers, body) = &requests[0];
    assert_eq!(headers["x-ms-offer-throughput"], "25000");
    assert_eq!(body["id"], "MyCollection2");
    assert_eq!(body["partitionKey"]["paths"][0], "/partitionKey");
}

#[tokio::test]
async fn missing_feed_envelope_is_an_error() {
    let app = Router::new().route("/dbs", get(|| async { Json(json!({ "_count": 0 })) }));
    let endpoint = serve(app).await;

    let err = test_client(&endpoint)
        .list_databases()
        .await
        .expect_err("envelope is missing");
    assert!(matches!(err, ClientError::MissingFeed("Databases")));
}

#[tokio::test]
async fn query_iterator_follows_continuation_tokens() {
    let captured = Captured::default();
    let app = Router::new()
        .route(
            "/dbs/mydb/colls/mystore/docs",
            post(
                |State(captured): State<Captured>, headers: HeaderMap, body: String| async move {
                    let query: Value = serde_json::from_str(&body).expect("query body");
                    let continued = headers.contains_key("x-ms-continuation");
                    captured.push(headers, query);
                    if continued {
                        Json(json!({ "Documents": [{ "id": "doc2" }], "_count": 1 }))
                            .into_response()
                    } else {
                        (
                            [("x-ms-continuation", "page-2")],
                            Json(json!({ "Documents": [{ "id": "doc1" }], "_count": 1 })),
                        )
                            .into_response()
                    }
                },
            ),
        )
        .with_state(captured.clone());
    let endpoint = serve(app).await;

    let client = test_client(&endpoint);
    let mut iterator: QueryIterator<Value> = client.query_documents(
        "dbs/mydb/colls/mystore",
        "SELECT * FROM c",
        FeedOptions::cross_partition(),
    );

    assert!(iterator.has_more_results());
    let first = iterator.execute_next().await.expect("first page");
    assert_eq!(first[0]["id"], "doc1");
    assert!(iterator.has_more_results());

    let second = iterator.execute_next().await.expect("second page");
    assert_eq!(second[0]["id"], "doc2");
    assert!(!iterator.has_more_results());

    let err = iterator.execute_next().await.expect_err("feed is drained");
    assert!(matches!(err, ClientError::IteratorExhausted));

    let requests = captured.take();
    assert_eq!(requests.len(), 2);
    let (headers, query) = &requests[0];
    assert_eq!(headers["x-ms-documentdb-isquery"], "true");
    assert_eq!(headers["x-ms-documentdb-query-enablecrosspartition"], "true");
    assert_eq!(headers["content-type"], "application/query+json");
    assert_eq!(query["query"], "SELECT * FROM c");
    assert_eq!(requests[1].0["x-ms-continuation"], "page-2");
}

#[tokio::test]
async fn query_users_drains_the_feed_in_one_call() {
    let captured = Captured::default();
    let app = Router::new()
        .route(
            "/dbs/mydb/users",
            post(
                |State(captured): State<Captured>, headers: HeaderMap, body: String| async move {
                    let query: Value = serde_json::from_str(&body).expect("query body");
                    captured.push(headers, query);
                    Json(json!({
                        "Users": [{ "id": "Alice" }, { "id": "Tom" }],
                        "_count": 2
                    }))
                },
            ),
        )
        .with_state(captured.clone());
    let endpoint = serve(app).await;

    let users = test_client(&endpoint)
        .query_users("dbs/mydb", "SELECT * FROM c WHERE c.id = 'Alice' OR c.id = 'Tom'")
        .await
        .expect("query users");

    let ids: Vec<&str> = users.iter().map(|user| user.id.as_str()).collect();
    assert_eq!(ids, ["Alice", "Tom"]);

    let requests = captured.take();
    assert_eq!(requests.len(), 1, "no continuation header means one page");
    let (headers, query) = &requests[0];
    assert_eq!(headers["x-ms-documentdb-isquery"], "true");
    assert_eq!(
        query["query"],
        "SELECT * FROM c WHERE c.id = 'Alice' OR c.id = 'Tom'"
    );
}

#[tokio::test]
async fn service_errors_carry_status_and_cause() {
    let app = Router::new().route(
        "/dbs",
        post(|| async {
            (
                StatusCode::CONFLICT,
                Json(json!({ "code": "Conflict", "message": "Resource already exists" })),
            )
        }),
    );
    let endpoint = serve(app).await;

    let err = test_client(&endpoint)
        .create_database(Database::definition("mydb"))
        .await
        .expect_err("conflict response");

    assert_eq!(err.status(), Some(reqwest::StatusCode::CONFLICT));
    assert_eq!(err.service_message(), Some("Resource already exists"));
    let source = std::error::Error::source(&err).expect("service cause");
    assert_eq!(source.to_string(), "Conflict: Resource already exists");
}

#[tokio::test]
async fn stored_procedure_execution_routes_by_partition_key() {
    let captured = Captured::default();
    let app = Router::new()
        .route(
            "/dbs/mydb/colls/mystore/sprocs/spHelloWorld",
            post(
                |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    captured.push(headers, body);
                    Json(json!("Hello World!"))
                },
            ),
        )
        .with_state(captured.clone());
    let endpoint = serve(app).await;

    let options = RequestOptions::with_partition_key(PartitionKey::string("11229"));
    let reply: String = test_client(&endpoint)
        .execute_stored_procedure(
            "dbs/mydb/colls/mystore/sprocs/spHelloWorld",
            &options,
            &json!(["greeting"]),
        )
        .await
        .expect("execute sproc");

    assert_eq!(reply, "Hello World!");
    let requests = captured.take();
    let (headers, body) = &requests[0];
    assert_eq!(headers["x-ms-documentdb-partitionkey"], r#"["11229"]"#);
    assert_eq!(body, &json!(["greeting"]));
}

#[tokio::test]
async fn create_document_assigns_an_id_when_missing() {
    let captured = Captured::default();
    let app = Router::new()
        .route(
            "/dbs/mydb/colls/mystore/docs",
            post(
                |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    captured.push(headers, body.clone());
                    Json(body)
                },
            ),
        )
        .with_state(captured.clone());
    let endpoint = serve(app).await;

    let document = Document::from_value(json!({ "name": "no id here" })).expect("object body");
    let options = RequestOptions::with_partition_key(PartitionKey::string("11229"));
    let created = test_client(&endpoint)
        .create_document("dbs/mydb/colls/mystore", document, &options)
        .await
        .expect("create document");

    let id = created.id().expect("assigned id").to_string();
    assert!(!id.is_empty());
    let requests = captured.take();
    assert_eq!(requests[0].1["id"], Value::String(id));
    assert_eq!(requests[0].1["name"], "no id here");
}

#[tokio::test]
async fn resource_tokens_are_sent_url_encoded() {
    let captured = Captured::default();
    let app = Router::new()
        .route(
            "/dbs/mydb/colls/mystore/docs",
            post(
                |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    captured.push(headers, body.clone());
                    Json(body)
                },
            ),
        )
        .with_state(captured.clone());
    let endpoint = serve(app).await;

    let client = DocumentClient::with_resource_token(&endpoint, "type=resource&ver=1.0&sig=tok");
    let document = Document::from_value(json!({ "id": "doc1" })).expect("object body");
    client
        .create_document(
            "dbs/mydb/colls/mystore",
            document,
            &RequestOptions::with_partition_key(PartitionKey::string("11229")),
        )
        .await
        .expect("create with resource token");

    let requests = captured.take();
    assert_eq!(
        requests[0].0["authorization"],
        "type%3Dresource%26ver%3D1.0%26sig%3Dtok"
    );
}

#[tokio::test]
async fn delete_returns_unit_on_success() {
    let app = Router::new().route(
        "/dbs/mydb",
        axum::routing::delete(|| async { StatusCode::NO_CONTENT }),
    );
    let endpoint = serve(app).await;

    test_client(&endpoint)
        .delete_database("dbs/mydb")
        .await
        .expect("delete database");
}
