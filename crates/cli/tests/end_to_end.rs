//! Drives the real `calc-server` binary through the session driver.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use mcp::{Client, ServerConfig, codes};
use serde_json::json;

fn server_config() -> ServerConfig {
    ServerConfig::new("calc-server", env!("CARGO_BIN_EXE_calc-server"))
}

async fn connect() -> runtime::Session {
    runtime::Session::connect(server_config()).await.unwrap()
}

#[tokio::test]
async fn demo_sequence() {
    let mut out = Vec::new();
    let transcript = runtime::run_demo(server_config(), &mut out).await.unwrap();

    assert!(transcript.resources.is_empty());
    assert_eq!(transcript.templates.len(), 1);
    assert_eq!(transcript.templates[0].uri_template, "greeting://{name}");

    let tools: Vec<&str> = transcript.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tools, ["add", "subtract", "multiply", "divide"]);

    assert_eq!(transcript.greeting.content, "Hello, hello!");
    assert_eq!(transcript.greeting.mime_type.as_deref(), Some("text/plain"));

    assert_eq!(transcript.sum.text_content(), "8");
    assert_eq!(transcript.sum.structured_content, Some(json!({ "result": 8 })));

    let printed = String::from_utf8(out).unwrap();
    let expected = "\
LISTING RESOURCES
LISTING RESOURCE TEMPLATES
Template: greeting://{name} (get_greeting)
LISTING TOOLS
Tool: add
Tool: subtract
Tool: multiply
Tool: divide
READING RESOURCE
Content: Hello, hello!, MIME Type: text/plain
CALL TOOL
8
";
    assert_eq!(printed, expected);
}

#[tokio::test]
async fn handshake_reports_server_identity() {
    let session = connect().await;
    let server = session.server();
    assert_eq!(server.server_info.name, registry::SERVER_NAME);
    assert_eq!(server.protocol_version, mcp::LATEST_PROTOCOL_VERSION);
    assert!(server.capabilities.tools.is_some());
    assert!(server.capabilities.resources.is_some());
    session.close().await.unwrap();
}

#[tokio::test]
async fn list_tools_is_idempotent() {
    let session = connect().await;
    let first = session.list_tools().await.unwrap();
    let second = session.list_tools().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
    session.close().await.unwrap();
}

#[tokio::test]
async fn arithmetic_over_the_wire() {
    let session = connect().await;
    for (tool, a, b, expected) in [
        ("add", 2, 3, "5"),
        ("subtract", 2, 3, "-1"),
        ("multiply", -4, 3, "-12"),
        ("divide", 7, 2, "3.5"),
        ("divide", 8, 2, "4.0"),
    ] {
        let result = session
            .call_tool(tool, json!({ "a": a, "b": b }))
            .await
            .unwrap();
        assert_eq!(result.text_content(), expected, "{tool}({a}, {b})");
    }
    session.close().await.unwrap();
}

#[tokio::test]
async fn divide_by_zero_is_infinity_not_an_error() {
    let session = connect().await;
    let result = session
        .call_tool("divide", json!({ "a": 5, "b": 0 }))
        .await
        .unwrap();
    assert!(!result.is_error);
    assert_eq!(result.text_content(), "inf");
    assert_eq!(result.structured_content, Some(json!({ "result": "inf" })));
    session.close().await.unwrap();
}

#[tokio::test]
async fn unknown_tool_is_an_invocation_error() {
    let session = connect().await;
    let err = session
        .call_tool("modulo", json!({ "a": 1, "b": 2 }))
        .await
        .unwrap_err();
    match err {
        runtime::Error::Invocation {
            operation,
            source: mcp::Error::JsonRpc(e),
        } => {
            assert_eq!(operation, "call_tool modulo");
            assert_eq!(e.code, codes::INVALID_PARAMS);
            assert_eq!(e.message, "Unknown tool: modulo");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // The session is still usable after a failed call.
    assert_eq!(session.list_tools().await.unwrap().len(), 4);
    session.close().await.unwrap();
}

#[tokio::test]
async fn bad_arguments_are_reported_not_coerced() {
    let session = connect().await;

    let err = session.call_tool("add", json!({ "a": 1 })).await.unwrap_err();
    assert!(
        matches!(&err, runtime::Error::Invocation { source: mcp::Error::ToolCallFailed(msg), .. }
            if msg.contains("missing required argument 'b'")),
        "{err:?}"
    );

    let err = session
        .call_tool("add", json!({ "a": 1, "b": "seven" }))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, runtime::Error::Invocation { source: mcp::Error::ToolCallFailed(msg), .. }
            if msg.contains("argument 'b' is not a valid integer")),
        "{err:?}"
    );

    session.close().await.unwrap();
}

#[tokio::test]
async fn unknown_resource_is_not_found() {
    let session = connect().await;
    let err = session.read_resource("farewell://hello").await.unwrap_err();
    assert!(
        matches!(&err, runtime::Error::Invocation { source: mcp::Error::JsonRpc(e), .. }
            if e.code == codes::RESOURCE_NOT_FOUND),
        "{err:?}"
    );
    session.close().await.unwrap();
}

#[tokio::test]
async fn greeting_binds_any_single_segment() {
    let session = connect().await;
    let greeting = session.read_resource("greeting://Ada").await.unwrap();
    assert_eq!(greeting.content, "Hello, Ada!");
    session.close().await.unwrap();
}

#[tokio::test]
async fn shutdown_reaps_server_promptly() {
    let client = Client::spawn(server_config()).await.unwrap();
    client.initialize().await.unwrap();
    assert!(client.is_running().await);
    tokio::time::timeout(Duration::from_secs(5), client.shutdown())
        .await
        .expect("shutdown should not hang")
        .unwrap();
}

#[test]
fn server_exits_when_channel_closes_mid_session() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_calc-server"))
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let mut stdin = child.stdin.take().unwrap();
    writeln!(
        stdin,
        r#"{{"jsonrpc":"2.0","id":1,"method":"initialize","params":{{"protocolVersion":"2025-06-18","capabilities":{{}},"clientInfo":{{"name":"t","version":"0"}}}}}}"#
    )
    .unwrap();
    writeln!(stdin, r#"{{"jsonrpc":"2.0","method":"notifications/initialized"}}"#).unwrap();
    writeln!(stdin, r#"{{"jsonrpc":"2.0","id":2,"method":"tools/list"}}"#).unwrap();
    drop(stdin);

    let status = child.wait().unwrap();
    assert!(status.success());
}

#[test]
fn client_binary_prints_the_demo() {
    let output = Command::new(env!("CARGO_BIN_EXE_calc-client"))
        .arg("--server")
        .arg(env!("CARGO_BIN_EXE_calc-server"))
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("Using server at: "));
    assert!(stdout.contains("Tool: divide\n"));
    assert!(stdout.contains("Content: Hello, hello!, MIME Type: text/plain\n"));
    assert!(stdout.ends_with("CALL TOOL\n8\n"));
}

#[test]
fn client_binary_fails_loudly_without_server() {
    let output = Command::new(env!("CARGO_BIN_EXE_calc-client"))
        .arg("--server")
        .arg("/nonexistent/calc-server")
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Error running calc client: failed to connect to server"));
    assert!(stderr.contains("caused by: failed to spawn server"));
}
