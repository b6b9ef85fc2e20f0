//! MCP transport tests: JSON-RPC lines in, JSON-RPC lines out.

mod common;

use common::*;
use qr_code_reader::server::serve;
use qr_code_reader::{McpServer, ToolGateway};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

/// Feed `requests` to a server over an in-memory pipe and collect the
/// responses by id.
async fn exchange(requests: &[Value]) -> HashMap<i64, Value> {
    let (mut client, server_io) = duplex(1024 * 1024);
    let (read_half, write_half) = tokio::io::split(server_io);
    let server = tokio::spawn(serve(McpServer::default(), read_half, write_half));

    let mut input = String::new();
    for req in requests {
        input.push_str(&req.to_string());
        input.push('\n');
    }
    client.write_all(input.as_bytes()).await.unwrap();
    client.shutdown().await.unwrap();

    let mut output = String::new();
    client.read_to_string(&mut output).await.unwrap();
    server.await.unwrap().unwrap();

    output
        .lines()
        .map(|line| {
            let v: Value = serde_json::from_str(line).unwrap();
            (v["id"].as_i64().unwrap(), v)
        })
        .collect()
}

fn call(id: i64, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": "qr_code_read", "arguments": arguments }
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn full_session_over_the_wire() {
    let dir = tempfile::tempdir().unwrap();
    let path = save(dir.path(), "qr.png", &qr_image("https://example.com/test"));
    let raw = file_base64(&path);

    let responses = exchange(&[
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
               "params": {"protocolVersion": "2024-11-05", "capabilities": {}}}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        call(3, json!({"image_path": path.to_str().unwrap()})),
        call(4, json!({"image_data": format!("data:image/png;base64,{raw}")})),
        call(5, json!({"image_path": "/nonexistent/path.png"})),
        call(6, json!({})),
        json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call",
               "params": {"name": "unknown_tool", "arguments": {}}}),
    ])
    .await;

    assert_eq!(responses.len(), 7);
    assert_eq!(responses[&1]["result"]["serverInfo"]["name"], "qr-code-reader");
    assert_eq!(responses[&2]["result"]["tools"][0]["name"], "qr_code_read");

    let text = |id: i64| responses[&id]["result"]["content"][0]["text"].as_str().unwrap().to_string();
    assert_eq!(text(3), "QR Code decoded successfully: https://example.com/test");
    assert_eq!(text(4), "QR Code decoded successfully: https://example.com/test");
    assert!(text(5).starts_with("Error reading QR code:"));
    assert!(text(5).contains("/nonexistent/path.png"));
    assert_eq!(text(6), "Error: Either image_path or image_data must be provided");
    assert_eq!(responses[&5]["result"]["isError"], true);

    assert_eq!(responses[&7]["error"]["message"], "Unknown tool: unknown_tool");
}

#[tokio::test]
async fn gateway_reports_not_found_as_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.png");
    noise_image().save(&path).unwrap();

    let result = ToolGateway::default()
        .call_tool("qr_code_read", &json!({"image_path": path.to_str().unwrap()}))
        .await
        .unwrap();
    assert!(result.is_error);
    assert_eq!(
        result.text(),
        "Error reading QR code: No QR code found in the image"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_calls_in_one_session() {
    let dir = tempfile::tempdir().unwrap();
    let requests: Vec<Value> = (0..6)
        .map(|i| {
            let path = save(dir.path(), &format!("qr{i}.png"), &qr_image(&format!("ticket-{i}")));
            call(i, json!({"image_path": path.to_str().unwrap()}))
        })
        .collect();

    let responses = exchange(&requests).await;
    for i in 0..6 {
        assert_eq!(
            responses[&i]["result"]["content"][0]["text"],
            format!("QR Code decoded successfully: ticket-{i}")
        );
    }
}
