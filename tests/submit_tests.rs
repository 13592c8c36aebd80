// tests/submit_tests.rs

use std::io::Read;
use std::thread::JoinHandle;
use std::time::Duration;

use tacqubo::{default_document, Compiler, Settings, SolverClient, SolverSettings, SubmitError, TacError};

/// What the stub server saw.
struct Recorded {
    method: String,
    content_type: Option<String>,
    body: String,
}

/// Serves exactly one request on a random port with the given status and body.
fn stub_server(status: u16, reply: &'static str) -> (String, JoinHandle<Recorded>) {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind stub server");
    let port = server.server_addr().to_ip().map(|a| a.port()).expect("stub port");
    let handle = std::thread::spawn(move || {
        let mut request = server
            .recv_timeout(Duration::from_secs(10))
            .expect("recv")
            .expect("a request within the timeout");
        let mut body = String::new();
        request.as_reader().read_to_string(&mut body).expect("read body");
        let recorded = Recorded {
            method: request.method().to_string(),
            content_type: request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string()),
            body,
        };
        let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
            .expect("static header");
        let response = tiny_http::Response::from_string(reply).with_status_code(status).with_header(header);
        request.respond(response).expect("respond");
        recorded
    });
    (format!("http://127.0.0.1:{port}/quantum"), handle)
}

fn client(endpoint: &str) -> SolverClient {
    SolverClient::new(&SolverSettings { endpoint: endpoint.to_string(), timeout_secs: 5 }).expect("client")
}

#[tokio::test]
async fn test_success_returns_body_verbatim() -> Result<(), Box<dyn std::error::Error>> {
    let (endpoint, server) = stub_server(200, r#"{"qubo": {"('x4', 'x4')": -3}, "offset": 0, "extra": [1, 2]}"#);

    let reply = client(&endpoint).submit(default_document()).await?;
    let recorded = server.join().expect("stub thread");

    assert_eq!(reply, serde_json::json!({"qubo": {"('x4', 'x4')": -3}, "offset": 0, "extra": [1, 2]}));
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.content_type.as_deref(), Some("application/json"));
    assert_eq!(recorded.body, default_document().to_json()?);
    Ok(())
}

#[tokio::test]
async fn test_rejection_carries_remote_error() -> Result<(), Box<dyn std::error::Error>> {
    let (endpoint, server) = stub_server(400, r#"{"error": "Missing or empty 'variables' field"}"#);

    let err = client(&endpoint).submit(default_document()).await.unwrap_err();
    server.join().expect("stub thread");

    assert!(!err.is_transport());
    match err {
        SubmitError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Missing or empty 'variables' field");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_non_json_success_is_a_transport_failure() -> Result<(), Box<dyn std::error::Error>> {
    let (endpoint, server) = stub_server(200, "definitely not json");

    let err = client(&endpoint).submit(default_document()).await.unwrap_err();
    server.join().expect("stub thread");

    assert!(matches!(err, SubmitError::MalformedResponse { .. }));
    assert!(err.is_transport());
    Ok(())
}

#[tokio::test]
async fn test_connection_refused_is_a_transport_failure() {
    // Port 1 is reserved and never listens on loopback in test environments.
    let err = client("http://127.0.0.1:1/quantum").submit(default_document()).await.unwrap_err();

    let SubmitError::Transport { message } = &err else {
        panic!("expected a transport failure, got {err:?}");
    };
    // The underlying connect failure is carried, not just reqwest's summary.
    assert!(message.contains(": "), "got {message}");
    assert!(err.is_transport());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_compile_and_submit_sends_compiled_document() -> Result<(), Box<dyn std::error::Error>> {
    let (endpoint, server) = stub_server(200, r#"{"ok": true}"#);
    let mut settings = Settings::default();
    settings.solver.endpoint = endpoint;

    let source = "function createQuboForSingleMove(board) { return { linear: { 4: -3 }, quadratic: {} }; }";
    let (compilation, reply) = Compiler::new(settings).compile_and_submit(source).await?;
    let recorded = server.join().expect("stub thread");

    assert!(!compilation.is_fallback());
    assert_eq!(reply, serde_json::json!({"ok": true}));
    assert_eq!(
        recorded.body,
        r#"{"variables":{"x4":{"type":"Binary"}},"Constraints":[{"lhs":"x4","comparison":"=","rhs":1}],"Objective":"-3 * x4"}"#
    );
    Ok(())
}

#[tokio::test]
async fn test_compile_and_submit_surfaces_transport_errors() {
    let mut settings = Settings::default();
    settings.solver.endpoint = "http://127.0.0.1:1/quantum".to_string();

    let result = Compiler::new(settings).compile_and_submit("not a program").await;
    match result {
        Err(TacError::Submit(err)) => assert!(err.is_transport()),
        other => panic!("expected a submit error, got {other:?}"),
    }
}
