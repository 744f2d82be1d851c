//! Whole exchanges against a real HTTP server standing in for the backend.

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tenant_chat_core::{ChatMessage, HttpBackend, Session, SessionStatus, APOLOGY};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn answered_question() {
    let router = Router::new().route(
        "/chat",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body, json!({ "message": "What are my rights if my unit is unsafe?" }));
            Json(json!({ "response": "You have the right to a habitable dwelling..." }))
        }),
    );
    let backend = HttpBackend::new(&serve(router).await);
    let mut session = Session::new();

    session.update_draft("What are my rights if my unit is unsafe?");
    assert!(session.submit(&backend).await);

    assert_eq!(
        session.messages(),
        &[
            ChatMessage::user("What are my rights if my unit is unsafe?"),
            ChatMessage::assistant("You have the right to a habitable dwelling..."),
        ]
    );
    assert_eq!(session.status(), SessionStatus::Idle);
    assert_eq!(session.draft(), "");
}

#[tokio::test]
async fn connection_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let backend = HttpBackend::new(&format!("http://127.0.0.1:{}", port));
    let mut session = Session::new();

    session.update_draft("How much notice does a landlord need to give before eviction?");
    assert!(session.submit(&backend).await);

    assert_eq!(
        session.messages(),
        &[
            ChatMessage::user("How much notice does a landlord need to give before eviction?"),
            ChatMessage::assistant(APOLOGY),
        ]
    );
    assert_eq!(session.status(), SessionStatus::Idle);
}

#[tokio::test]
async fn server_error_reads_as_apology() {
    let router = Router::new().route(
        "/chat",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": "boom" }))) }),
    );
    let backend = HttpBackend::new(&serve(router).await);
    let mut session = Session::new();

    session.update_draft("Can my landlord enter my apartment without permission?");
    assert!(session.submit(&backend).await);

    assert_eq!(session.messages()[1], ChatMessage::assistant(APOLOGY));
    assert_eq!(session.status(), SessionStatus::Idle);
}

#[tokio::test]
async fn session_recovers_after_failure() {
    let router = Router::new().route(
        "/chat",
        post(|Json(body): Json<Value>| async move {
            if body["message"] == "fail" {
                Err(StatusCode::BAD_GATEWAY)
            } else {
                Ok(Json(json!({ "response": "fine" })))
            }
        }),
    );
    let backend = HttpBackend::new(&serve(router).await);
    let mut session = Session::new();

    session.update_draft("fail");
    assert!(session.submit(&backend).await);
    session.update_draft("retry by hand");
    assert!(session.submit(&backend).await);

    let contents: Vec<&str> = session.messages().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["fail", APOLOGY, "retry by hand", "fine"]);
}
