//! End-to-end tests: two peers (or a peer and a scripted raw side) joined by
//! an in-memory duplex transport.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};

use twinmcp::{
    prompt, tool, CallToolParams, CallToolResult, ClientCapabilities, ClientInfo, Content,
    LineReader, LineSink, LineSource, LineWriter, ListPromptsParams, ListPromptsResult,
    McpErrorCode, McpResult, NotificationHandler, Peer, PeerBuilder, PeerError, ProgressParams,
    Prompt, PromptMessage, RequestHandler, StreamTransport, TransportError,
};

type TestTransport = StreamTransport<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;
type RawSide = (LineReader<ReadHalf<DuplexStream>>, LineWriter<WriteHalf<DuplexStream>>);

/// A connected transport pair.
fn transport_pair() -> (TestTransport, TestTransport) {
    let (near, far) = tokio::io::duplex(64 * 1024);
    let (near_read, near_write) = tokio::io::split(near);
    let (far_read, far_write) = tokio::io::split(far);
    (
        StreamTransport::new(near_read, near_write),
        StreamTransport::new(far_read, far_write),
    )
}

/// A transport plus a scripted raw line reader/writer on the far side.
fn transport_with_raw_side() -> (TestTransport, RawSide) {
    let (near, far) = tokio::io::duplex(64 * 1024);
    let (near_read, near_write) = tokio::io::split(near);
    let (far_read, far_write) = tokio::io::split(far);
    (
        StreamTransport::new(near_read, near_write),
        (LineReader::new(far_read), LineWriter::new(far_write)),
    )
}

fn client_info() -> ClientInfo {
    ClientInfo {
        name: "C".to_owned(),
        version: "1".to_owned(),
    }
}

#[prompt(description = "Greet someone")]
fn greet(name: String, style: Option<String>) -> Vec<PromptMessage> {
    let style = style.unwrap_or_else(|| "plain".to_string());
    vec![PromptMessage::user(format!("{style}:{name}"))]
}

#[prompt(default(b = "X"))]
fn defaulted(a: String, b: String) -> Vec<PromptMessage> {
    vec![PromptMessage::user(format!("{a}/{b}"))]
}

#[tool(description = "Add two numbers")]
fn add(a: f64, b: f64) -> String {
    format!("{}", a + b)
}

async fn serve_default(transport: TestTransport) -> Peer {
    PeerBuilder::server("S", "1.0.0")
        .prompt(Greet)
        .prompt(Defaulted)
        .tool(Add)
        .connect(transport)
        .await
        .expect("server connect")
}

async fn connect_client(transport: TestTransport) -> Peer {
    PeerBuilder::client()
        .connect(transport)
        .await
        .expect("client connect")
}

// ============================================================================
// Scenario 1: handshake
// ============================================================================

#[tokio::test]
async fn handshake_over_the_wire() {
    let (near, (mut far_read, mut far_write)) = transport_with_raw_side();
    let client = connect_client(near).await;

    let script = tokio::spawn(async move {
        // First frame: the initialize request with the first monotonic id.
        let line = far_read.read_line().await.unwrap().unwrap();
        let frame: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(frame["jsonrpc"], "2.0");
        assert_eq!(frame["id"], "1");
        assert_eq!(frame["method"], "initialize");
        assert_eq!(frame["params"]["protocolVersion"], "2024-11-05");
        assert_eq!(frame["params"]["clientInfo"]["name"], "C");

        let response = json!({
            "jsonrpc": "2.0",
            "id": "1",
            "result": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "serverInfo": {"name": "S", "version": "1"}
            }
        });
        far_write.write_line(&response.to_string()).await.unwrap();

        // Second frame: the initialized notification, with no id.
        let line = far_read.read_line().await.unwrap().unwrap();
        let frame: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(frame["method"], "notifications/initialized");
        assert!(frame.get("id").is_none());
    });

    let result = client
        .handshake(client_info(), ClientCapabilities::default())
        .await
        .unwrap();
    assert_eq!(result.server_info.name, "S");
    script.await.unwrap();
}

// ============================================================================
// Scenario 2: unknown method
// ============================================================================

#[tokio::test]
async fn unknown_method_answers_32601() {
    let (near, (mut far_read, mut far_write)) = transport_with_raw_side();
    let _server = serve_default(near).await;

    far_write
        .write_line(r#"{"jsonrpc":"2.0","id":"7","method":"foo/bar"}"#)
        .await
        .unwrap();

    let line = far_read.read_line().await.unwrap().unwrap();
    let frame: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(frame["id"], "7");
    assert_eq!(frame["error"]["code"], -32601);
    assert!(frame["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Method not found"));
}

// ============================================================================
// Scenarios 3-5: generated prompt validation over the wire
// ============================================================================

async fn peer_pair() -> (Peer, Peer) {
    let (near, far) = transport_pair();
    let server = serve_default(near).await;
    let client = connect_client(far).await;
    (server, client)
}

#[tokio::test]
async fn missing_required_prompt_argument() {
    let (_server, client) = peer_pair().await;

    let err = client
        .get_prompt("greet", Some(serde_json::Map::new()))
        .await
        .unwrap_err();
    match err {
        PeerError::Rpc(e) => {
            assert_eq!(e.code, McpErrorCode::InvalidParams);
            assert!(e.message.contains("name"));
        }
        other => panic!("expected rpc error, got {other}"),
    }
}

#[tokio::test]
async fn unknown_prompt_argument() {
    let (_server, client) = peer_pair().await;

    let args = match json!({"name": "A", "extra": 1}) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };
    let err = client.get_prompt("greet", Some(args)).await.unwrap_err();
    match err {
        PeerError::Rpc(e) => {
            assert_eq!(e.code, McpErrorCode::InvalidParams);
            assert!(e.message.contains("extra"));
        }
        other => panic!("expected rpc error, got {other}"),
    }
}

#[tokio::test]
async fn optional_dispatch_preserves_defaults() {
    let (_server, client) = peer_pair().await;

    let args = match json!({"a": "Q"}) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };
    let result = client.get_prompt("defaulted", Some(args)).await.unwrap();
    assert_eq!(
        result.messages[0].content,
        Content::text("Q/X"),
        "absent optional takes the declared default"
    );

    let args = match json!({"a": "Q", "b": "Y"}) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };
    let result = client.get_prompt("defaulted", Some(args)).await.unwrap();
    assert_eq!(result.messages[0].content, Content::text("Q/Y"));
}

// ============================================================================
// Tool calls
// ============================================================================

#[tokio::test]
async fn tool_call_roundtrip() {
    let (_server, client) = peer_pair().await;

    let args = match json!({"a": 1, "b": 2}) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };
    let result = client.call_tool("add", Some(args)).await.unwrap();
    assert_eq!(result.content, vec![Content::text("3")]);
    assert!(!result.is_error);
}

#[tokio::test]
async fn listing_reflects_registrations() {
    let (_server, client) = peer_pair().await;

    let tools = client.list_tools(None).await.unwrap();
    assert_eq!(tools.tools.len(), 1);
    assert_eq!(tools.tools[0].name, "add");

    let prompts = client.list_prompts(None).await.unwrap();
    let names: Vec<&str> = prompts.prompts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["defaulted", "greet"]);
}

// ============================================================================
// Scenario 6: pagination
// ============================================================================

struct PagedPrompts;

fn page_prompt(name: &str) -> Prompt {
    Prompt {
        name: name.to_owned(),
        description: None,
        arguments: Vec::new(),
    }
}

#[async_trait]
impl RequestHandler for PagedPrompts {
    async fn list_prompts(&self, params: ListPromptsParams) -> McpResult<ListPromptsResult> {
        let (prompts, next_cursor) = match params.cursor.as_deref() {
            None => (vec![page_prompt("p1")], Some("c1".to_owned())),
            Some("c1") => (vec![page_prompt("p2")], Some("c2".to_owned())),
            Some("c2") => (vec![page_prompt("p3")], None),
            Some(other) => {
                return Err(twinmcp::McpError::invalid_params(format!(
                    "unknown cursor: {other}"
                )))
            }
        };
        Ok(ListPromptsResult {
            prompts,
            next_cursor,
        })
    }
}

#[tokio::test]
async fn pagination_yields_each_page_then_terminates() {
    let (near, far) = transport_pair();
    let _server = PeerBuilder::server("S", "1.0.0")
        .request_handler(PagedPrompts)
        .connect(near)
        .await
        .unwrap();
    let client = connect_client(far).await;

    let mut pages = client.prompt_pages();
    let mut seen = Vec::new();
    while let Some(page) = pages.next().await {
        let page = page.unwrap();
        seen.push(
            page.iter()
                .map(|p| p.name.clone())
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    assert_eq!(seen, ["p1", "p2", "p3"]);
    assert!(pages.next().await.is_none(), "terminated sequences stay done");
}

#[tokio::test]
async fn pagination_collects_across_pages() {
    let (near, far) = transport_pair();
    let _server = PeerBuilder::server("S", "1.0.0")
        .request_handler(PagedPrompts)
        .connect(near)
        .await
        .unwrap();
    let client = connect_client(far).await;

    let all = client.prompt_pages().collect_all().await.unwrap();
    assert_eq!(all.len(), 3);
}

// ============================================================================
// Correlation and lifecycle
// ============================================================================

#[tokio::test]
async fn request_ids_are_monotonic_decimal_strings() {
    let (near, (mut far_read, mut far_write)) = transport_with_raw_side();
    let client = connect_client(near).await;

    let script = tokio::spawn(async move {
        for expected in ["1", "2", "3"] {
            let line = far_read.read_line().await.unwrap().unwrap();
            let frame: serde_json::Value = serde_json::from_str(&line).unwrap();
            assert_eq!(frame["id"], expected);
            assert_eq!(frame["method"], "ping");
            let response = json!({"jsonrpc": "2.0", "id": expected, "result": {}});
            far_write.write_line(&response.to_string()).await.unwrap();
        }
    });

    for _ in 0..3 {
        client.ping().await.unwrap();
    }
    script.await.unwrap();
}

#[tokio::test]
async fn transport_close_fails_pending_requests() {
    let (near, raw) = transport_with_raw_side();
    let client = connect_client(near).await;

    let pending = tokio::spawn({
        let client = client.clone();
        async move { client.ping().await }
    });

    // Give the request time to get registered, then sever the transport.
    tokio::task::yield_now().await;
    drop(raw);

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, PeerError::Transport(_)));

    client.closed().await;
    assert!(client.is_closed());
}

#[tokio::test]
async fn closed_peer_rejects_new_requests() {
    let (near, _far) = transport_pair();
    let client = connect_client(near).await;
    client.close().await;

    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, PeerError::Transport(TransportError::Closed)));
}

#[tokio::test]
async fn stray_response_is_dropped_without_disrupting_the_peer() {
    let (near, (mut far_read, mut far_write)) = transport_with_raw_side();
    let client = connect_client(near).await;

    // A response nobody asked for.
    far_write
        .write_line(r#"{"jsonrpc":"2.0","id":"999","result":{}}"#)
        .await
        .unwrap();

    let script = tokio::spawn(async move {
        let line = far_read.read_line().await.unwrap().unwrap();
        let frame: serde_json::Value = serde_json::from_str(&line).unwrap();
        let response = json!({"jsonrpc": "2.0", "id": frame["id"], "result": {}});
        far_write.write_line(&response.to_string()).await.unwrap();
    });

    client.ping().await.unwrap();
    script.await.unwrap();
}

#[tokio::test]
async fn unknown_notification_is_ignored() {
    let (near, (mut far_read, mut far_write)) = transport_with_raw_side();
    let _server = serve_default(near).await;

    far_write
        .write_line(r#"{"jsonrpc":"2.0","method":"notifications/unheard_of"}"#)
        .await
        .unwrap();
    far_write
        .write_line(r#"{"jsonrpc":"2.0","id":"1","method":"ping"}"#)
        .await
        .unwrap();

    // The only reply is to the ping: notifications never answer.
    let line = far_read.read_line().await.unwrap().unwrap();
    let frame: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(frame["id"], "1");
    assert!(frame.get("error").is_none());
}

#[tokio::test]
async fn parse_error_with_recoverable_id_answers_32700() {
    let (near, (mut far_read, mut far_write)) = transport_with_raw_side();
    let _server = serve_default(near).await;

    // Valid JSON, invalid field types, id recoverable.
    far_write
        .write_line(r#"{"jsonrpc":"2.0","id":"9","method":5}"#)
        .await
        .unwrap();

    let line = far_read.read_line().await.unwrap().unwrap();
    let frame: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(frame["id"], "9");
    assert_eq!(frame["error"]["code"], -32700);
}

#[tokio::test]
async fn frame_with_result_and_error_is_dropped() {
    let (near, (mut far_read, mut far_write)) = transport_with_raw_side();
    let _server = serve_default(near).await;

    far_write
        .write_line(r#"{"jsonrpc":"2.0","id":"3","result":{},"error":{"code":1,"message":"?"}}"#)
        .await
        .unwrap();
    far_write
        .write_line(r#"{"jsonrpc":"2.0","id":"4","method":"ping"}"#)
        .await
        .unwrap();

    // The dropped frame gets no reply; the ping does.
    let line = far_read.read_line().await.unwrap().unwrap();
    let frame: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(frame["id"], "4");
}

// ============================================================================
// Direction enforcement and server-initiated calls
// ============================================================================

#[tokio::test]
async fn wrong_direction_request_is_method_not_found() {
    let (near, (mut far_read, mut far_write)) = transport_with_raw_side();
    let _server = serve_default(near).await;

    // roots/list is served by the client, not the server.
    far_write
        .write_line(r#"{"jsonrpc":"2.0","id":"2","method":"roots/list"}"#)
        .await
        .unwrap();

    let line = far_read.read_line().await.unwrap().unwrap();
    let frame: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(frame["error"]["code"], -32601);
}

struct RootsClient;

#[async_trait]
impl RequestHandler for RootsClient {
    async fn list_roots(&self) -> McpResult<twinmcp::ListRootsResult> {
        Ok(twinmcp::ListRootsResult {
            roots: vec![twinmcp::Root {
                uri: "file:///workspace".to_owned(),
                name: Some("workspace".to_owned()),
            }],
        })
    }
}

#[tokio::test]
async fn server_lists_roots_from_client() {
    let (near, far) = transport_pair();
    let server = serve_default(near).await;
    let _client = PeerBuilder::client()
        .request_handler(RootsClient)
        .connect(far)
        .await
        .unwrap();

    let roots = server.list_roots().await.unwrap();
    assert_eq!(roots.roots.len(), 1);
    assert_eq!(roots.roots[0].uri, "file:///workspace");
}

// ============================================================================
// Notifications and handler failures
// ============================================================================

#[derive(Clone, Default)]
struct RecordingHandlers {
    progress: Arc<Mutex<Vec<f64>>>,
}

#[async_trait]
impl NotificationHandler for RecordingHandlers {
    async fn on_progress(&self, params: ProgressParams) -> McpResult<()> {
        self.progress
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(params.progress);
        Ok(())
    }
}

#[tokio::test]
async fn notifications_reach_the_handler_in_order() {
    let recorder = RecordingHandlers::default();
    let (near, far) = transport_pair();
    let _server = PeerBuilder::server("S", "1.0.0")
        .notification_handler(recorder.clone())
        .connect(near)
        .await
        .unwrap();
    let client = connect_client(far).await;

    for progress in [0.25, 0.5, 1.0] {
        client
            .notify_progress(ProgressParams {
                progress_token: "t".into(),
                progress,
                total: Some(1.0),
            })
            .await
            .unwrap();
    }
    // A request after the notifications: its response proves they were
    // processed first (incoming frames are handled serially).
    client.ping().await.unwrap();

    let seen = recorder
        .progress
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone();
    assert_eq!(seen, vec![0.25, 0.5, 1.0]);
}

struct PanickingTools;

#[async_trait]
impl RequestHandler for PanickingTools {
    async fn call_tool(&self, _params: CallToolParams) -> McpResult<CallToolResult> {
        panic!("handler exploded");
    }
}

#[tokio::test]
async fn handler_panic_becomes_internal_error() {
    let (near, far) = transport_pair();
    let _server = PeerBuilder::server("S", "1.0.0")
        .request_handler(PanickingTools)
        .connect(near)
        .await
        .unwrap();
    let client = connect_client(far).await;

    let err = client.call_tool("anything", None).await.unwrap_err();
    match err {
        PeerError::Rpc(e) => {
            assert_eq!(e.code, McpErrorCode::InternalError);
            assert!(e.message.contains("handler exploded"));
        }
        other => panic!("expected rpc error, got {other}"),
    }

    // The peer survives the panic.
    client.ping().await.unwrap();
}
