use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use graphql_scraper::core::client::TransportOptions;
use graphql_scraper::core::errors::{RecordError, SchemaFetchError, ScraperError};
use graphql_scraper::{ScraperConfig, scrape, validate_url};

#[derive(Clone, Default)]
struct FakeServer {
    introspection_disabled: bool,
    requests: Arc<Mutex<Vec<Value>>>,
}

fn named(kind: &str, name: &str) -> Value {
    json!({ "kind": kind, "name": name, "ofType": null })
}

fn non_null(inner: Value) -> Value {
    json!({ "kind": "NON_NULL", "name": null, "ofType": inner })
}

fn list(inner: Value) -> Value {
    json!({ "kind": "LIST", "name": null, "ofType": inner })
}

fn field(name: &str, args: Value, type_ref: Value) -> Value {
    json!({
        "name": name,
        "description": null,
        "args": args,
        "type": type_ref,
        "isDeprecated": false,
        "deprecationReason": null
    })
}

fn id_arg() -> Value {
    json!([{
        "name": "id",
        "description": null,
        "type": non_null(named("SCALAR", "ID")),
        "defaultValue": null
    }])
}

fn schema() -> Value {
    json!({
        "queryType": { "name": "Query" },
        "mutationType": { "name": "Mutation" },
        "subscriptionType": null,
        "types": [
            {
                "kind": "OBJECT",
                "name": "Query",
                "fields": [
                    field("users", json!([]), non_null(list(non_null(named("OBJECT", "User"))))),
                    field("user", id_arg(), named("OBJECT", "User")),
                    field("version", json!([]), named("SCALAR", "String")),
                    field("outage", json!([]), named("SCALAR", "String"))
                ],
                "inputFields": null,
                "interfaces": [],
                "enumValues": null,
                "possibleTypes": null
            },
            {
                "kind": "OBJECT",
                "name": "Mutation",
                "fields": [
                    field("deleteUser", id_arg(), named("SCALAR", "Boolean"))
                ],
                "inputFields": null,
                "interfaces": [],
                "enumValues": null,
                "possibleTypes": null
            },
            {
                "kind": "OBJECT",
                "name": "User",
                "fields": [
                    field("id", json!([]), non_null(named("SCALAR", "ID"))),
                    field("name", json!([]), named("SCALAR", "String"))
                ],
                "inputFields": null,
                "interfaces": [],
                "enumValues": null,
                "possibleTypes": null
            },
            { "kind": "SCALAR", "name": "ID" },
            { "kind": "SCALAR", "name": "String" },
            { "kind": "SCALAR", "name": "Boolean" }
        ],
        "directives": []
    })
}

/// First field selected by an operation document
fn root_field(query: &str) -> &str {
    let body = query.split_once('{').map(|(_, rest)| rest).unwrap_or_default();
    body.trim_start()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or_default()
}

async fn graphql(State(server): State<FakeServer>, Json(body): Json<Value>) -> impl IntoResponse {
    server.requests.lock().unwrap().push(body.clone());

    if body["operationName"] == "IntrospectionQuery" {
        return match server.introspection_disabled {
            true => (
                StatusCode::OK,
                Json(json!({ "errors": [{ "message": "introspection is disabled" }] })),
            ),
            false => (StatusCode::OK, Json(json!({ "data": { "__schema": schema() } }))),
        };
    }

    let query = body["query"].as_str().unwrap_or_default();
    match root_field(query) {
        "users" => (
            StatusCode::OK,
            Json(json!({ "data": { "users": [{ "id": "42", "name": "ada" }] } })),
        ),
        "version" => (StatusCode::OK, Json(json!({ "data": { "version": "1.0" } }))),
        "user" => match body["variables"]["id"].as_str() {
            Some("42") => (
                StatusCode::OK,
                Json(json!({ "data": { "user": { "id": "42", "name": "ada" } } })),
            ),
            _ => (
                StatusCode::OK,
                Json(json!({ "data": null, "errors": [{ "message": "user not found" }] })),
            ),
        },
        "outage" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "upstream down" })),
        ),
        other => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "errors": [{ "message": format!("unexpected field {other}") }] })),
        ),
    }
}

async fn spawn_server(server: FakeServer) -> String {
    let app = Router::new()
        .route("/graphql", post(graphql))
        .with_state(server);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/graphql")
}

fn config(endpoint: &str, output_dir: &Path) -> ScraperConfig {
    ScraperConfig {
        endpoint: validate_url(endpoint).unwrap(),
        output_dir: output_dir.to_path_buf(),
        delay: Duration::ZERO,
        transport: TransportOptions {
            timeout: Duration::from_secs(5),
            ..TransportOptions::default()
        },
        save: true,
    }
}

#[tokio::test]
async fn test_full_run_against_fake_server() {
    let server = FakeServer::default();
    let endpoint = spawn_server(server.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("result");

    let report = scrape(&config(&endpoint, &out)).await.unwrap();

    let fields: Vec<&str> = report
        .records
        .iter()
        .map(|record| record.field_name.as_str())
        .collect();
    assert_eq!(fields, vec!["users", "version", "outage", "user", "deleteUser"]);

    assert_eq!(report.summary.total, 5);
    assert_eq!(report.summary.successful, 3);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.skipped, 1);
    assert!((report.summary.coverage - 60.0).abs() < 1e-9);

    let user = &report.records[3];
    assert!(user.succeeded);
    assert_eq!(user.variables_used["id"], json!("42"));
    assert_eq!(
        user.operation.text,
        "query($id: ID!) { user(id: $id) { id name } }"
    );

    let outage = &report.records[2];
    assert!(!outage.succeeded);
    assert!(matches!(
        outage.error_detail,
        Some(RecordError::Transport(ref message)) if message.contains("500")
    ));
    assert!(outage.raw_result["error"].is_string());

    assert_eq!(report.records[4].error_detail, Some(RecordError::MutationSkipped));

    // introspection, users, version, outage, user
    let requests = server.requests.lock().unwrap();
    assert_eq!(requests.len(), 5);
    assert!(
        requests
            .iter()
            .all(|request| !request["query"].as_str().unwrap().starts_with("mutation"))
    );

    assert!(out.join("schema.json").is_file());
    assert_eq!(
        fs::read_to_string(out.join("queries/users.graphql")).unwrap(),
        "query { users { id name } }"
    );
    assert_eq!(
        fs::read_to_string(out.join("queries/user.graphql")).unwrap(),
        "query { user(id: \"42\") { id name } }"
    );
    assert_eq!(
        fs::read_to_string(out.join("mutations/deleteUser.graphql")).unwrap(),
        "mutation { deleteUser(id: \"1\") }"
    );
    assert!(!out.join("query_responses/deleteUser.json").exists());

    let response: Value =
        serde_json::from_str(&fs::read_to_string(out.join("query_responses/user.json")).unwrap())
            .unwrap();
    assert_eq!(response["data"]["user"]["name"], "ada");

    let results: Value =
        serde_json::from_str(&fs::read_to_string(out.join("results.json")).unwrap()).unwrap();
    assert_eq!(results["summary"]["successful"], 3);
    assert_eq!(results["records"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_disabled_introspection_aborts_without_output() {
    let server = FakeServer {
        introspection_disabled: true,
        ..FakeServer::default()
    };
    let endpoint = spawn_server(server.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("result");

    let result = scrape(&config(&endpoint, &out)).await;

    assert!(matches!(
        result,
        Err(ScraperError::SchemaFetch(SchemaFetchError::GraphQL(_)))
    ));
    assert!(!out.exists());
    assert_eq!(server.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_no_save_writes_nothing() {
    let endpoint = spawn_server(FakeServer::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("result");

    let mut config = config(&endpoint, &out);
    config.save = false;
    let report = scrape(&config).await.unwrap();

    assert_eq!(report.summary.total, 5);
    assert!(!out.exists());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let result = scrape(&config(&format!("http://{addr}/graphql"), dir.path())).await;

    assert!(matches!(
        result,
        Err(ScraperError::SchemaFetch(SchemaFetchError::Transport(_)))
    ));
}
