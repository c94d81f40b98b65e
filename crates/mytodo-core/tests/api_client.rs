//! Integration tests for the HTTP client: headers, bodies, error shapes.


use fixtures::{auth_json, can_bind_localhost, todo_json};
use mytodo_core::api::{ApiClient, ApiErrorKind, BearerToken, TodoFilter, UpdateTodoRequest};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token() -> BearerToken {
    BearerToken::new("tok-123").unwrap()
}

#[tokio::test]
async fn test_authenticated_calls_send_bearer_and_json_headers() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/todos"))
        .and(header("authorization", "Bearer tok-123"))
        .and(header("content-type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([todo_json("t1", "Buy milk", false)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri());
    let todos = client.list_todos(&token(), TodoFilter::All).await.unwrap();

    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "Buy milk");
}

#[tokio::test]
async fn test_login_sends_credentials_without_authorization() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "alice@example.com", "password": "hunter22"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(auth_json("alice@example.com", "tok-1")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri());
    let response = client.login("alice@example.com", "hunter22").await.unwrap();
    assert_eq!(response.token, "tok-1");
    assert_eq!(response.user.email, "alice@example.com");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_completed_filter_uses_query() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/todos"))
        .and(query_param("completed", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([todo_json("t9", "Done", true)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri());
    let todos = client
        .list_todos(&token(), TodoFilter::Completed)
        .await
        .unwrap();
    assert!(todos.iter().all(|t| t.completed));
}

#[tokio::test]
async fn test_update_sends_only_given_fields() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/todos/t1"))
        .and(body_json(json!({"description": "2 litres"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(todo_json("t1", "Buy milk", false)))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri());
    let update = UpdateTodoRequest {
        title: None,
        description: Some("2 litres".to_string()),
    };
    client.update_todo(&token(), "t1", &update).await.unwrap();
}

#[tokio::test]
async fn test_delete_returns_server_message() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/todos/t1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "todo deleted successfully"})),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri());
    let message = client.delete_todo(&token(), "t1").await.unwrap();
    assert_eq!(message, "todo deleted successfully");
}

#[tokio::test]
async fn test_todo_id_is_sent_as_single_escaped_segment() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/todos/t1/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "wrong route"})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "todo not found"})))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri());
    let err = client.delete_todo(&token(), "t1/complete").await.unwrap_err();
    assert_eq!(err.to_string(), "todo not found");
    let err = client.delete_todo(&token(), "t1?force=true").await.unwrap_err();
    assert_eq!(err.status, Some(404));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url.path(), "/todos/t1%2Fcomplete");
    assert_eq!(requests[1].url.path(), "/todos/t1%3Fforce=true");
    assert_eq!(requests[1].url.query(), None);

    let err = client.get_todo(&token(), "..").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_error_body_message_is_surfaced() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid credentials"})))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri());
    let err = client.login("a@b.c", "wrong-pw").await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Unauthorized);
    assert_eq!(err.status, Some(401));
    assert_eq!(err.to_string(), "invalid credentials");
}

#[tokio::test]
async fn test_non_json_error_falls_back_to_status_message() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/todos/t1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri());
    let err = client.get_todo(&token(), "t1").await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::HttpStatus);
    assert_eq!(err.to_string(), "HTTP error! status: 500");
}

#[tokio::test]
async fn test_unexpected_success_body_is_parse_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri());
    let err = client
        .list_todos(&token(), TodoFilter::All)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Parse);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let Ok(listener) = std::net::TcpListener::bind("127.0.0.1:0") else {
            eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
            return;
        };
        listener.local_addr().unwrap().port()
    };

    let client = ApiClient::new(&format!("http://127.0.0.1:{port}"));
    let err = client
        .list_todos(&token(), TodoFilter::All)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Transport);
}
