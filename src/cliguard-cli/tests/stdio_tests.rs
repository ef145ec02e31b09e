//! Drives the assembled server through its newline-delimited transport.
#![cfg(unix)]

use std::sync::Arc;

use cliguard_cli::{SERVER_NAME, build_server};
use cliguard_exec::{CommandExecutor, ShellInvocation};
use cliguard_execpolicy::{AllowList, PolicySettings};
use cliguard_mcp_types::{CallToolResult, JsonRpcResponse, ListToolsResult, RequestId};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::io::BufReader;

fn server(dir: &TempDir) -> Arc<cliguard_mcp_server::McpServer> {
    std::fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();
    let policy = PolicySettings {
        allowed_commands: AllowList::only(["cat", "ls", "sleep"]),
        command_timeout: 1,
        ..PolicySettings::for_root(dir.path())
    }
    .into_config()
    .unwrap();
    let executor = CommandExecutor::with_shell(
        Arc::new(policy),
        ShellInvocation::new("/bin/sh", false),
    );
    build_server(Arc::new(executor)).unwrap()
}

async fn exchange(dir: &TempDir, requests: &[Value]) -> Vec<JsonRpcResponse> {
    let input: String = requests.iter().map(|r| format!("{r}\n")).collect();
    let mut output = Vec::new();
    server(dir)
        .serve(BufReader::new(input.as_bytes()), &mut output)
        .await
        .unwrap();

    let mut responses: Vec<JsonRpcResponse> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    responses.sort_by_key(|r| match &r.id {
        Some(RequestId::Number(n)) => *n,
        _ => i64::MAX,
    });
    responses
}

fn call(id: i64, tool: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": tool, "arguments": arguments},
    })
}

fn tool_result(response: &JsonRpcResponse) -> CallToolResult {
    serde_json::from_value(response.result.clone().expect("result")).unwrap()
}

#[tokio::test]
async fn test_handshake_and_listing() {
    let dir = TempDir::new().unwrap();
    let responses = exchange(
        &dir,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "0"},
            }}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        ],
    )
    .await;

    assert_eq!(responses.len(), 2);
    let init = responses[0].result.as_ref().unwrap();
    assert_eq!(init["serverInfo"]["name"], SERVER_NAME);
    let instructions = init["instructions"].as_str().unwrap();
    assert!(instructions.contains(&dir.path().canonicalize().unwrap().display().to_string()));
    assert!(instructions.contains("show_security_rules"));

    let listing: ListToolsResult =
        serde_json::from_value(responses[1].result.clone().unwrap()).unwrap();
    let names: Vec<_> = listing.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["run_command", "show_security_rules"]);
}

#[tokio::test]
async fn test_run_command_calls() {
    let dir = TempDir::new().unwrap();
    let responses = exchange(
        &dir,
        &[
            call(1, "run_command", json!({"command": "cat notes.txt"})),
            call(2, "run_command", json!({"command": "cat ../outside.txt"})),
            call(3, "run_command", json!({"command": "cat missing.txt"})),
            call(4, "run_command", json!({})),
            call(5, "run_command", json!({"command": "sleep 5"})),
            call(6, "run_command", json!({"command": "cat notes.txt", "pty": true})),
        ],
    )
    .await;
    assert_eq!(responses.len(), 6);

    let ok = tool_result(&responses[0]);
    assert!(!ok.is_error());
    assert_eq!(
        ok.texts(),
        vec!["hello\n", "\nCommand completed with return code: 0"]
    );

    let escape = tool_result(&responses[1]);
    assert!(escape.is_error());
    assert!(escape.texts()[0].starts_with("Security violation: Path '../outside.txt'"));

    let failed = tool_result(&responses[2]);
    assert!(!failed.is_error());
    let texts = failed.texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("missing.txt"));
    assert!(texts[1].starts_with("\nCommand completed with return code: "));
    assert!(!texts[1].ends_with(": 0"));

    let missing = tool_result(&responses[3]);
    assert_eq!(missing.texts(), vec!["No command provided"]);

    let timed_out = tool_result(&responses[4]);
    assert!(timed_out.is_error());
    assert_eq!(timed_out.texts()[0], "Command timed out after 1 seconds");

    let pty = tool_result(&responses[5]);
    assert!(!pty.is_error());
    assert!(pty.texts()[0].contains("hello"));
}

#[tokio::test]
async fn test_show_security_rules_call() {
    let dir = TempDir::new().unwrap();
    let responses = exchange(&dir, &[call(1, "show_security_rules", json!({}))]).await;

    let rules = tool_result(&responses[0]);
    let text = rules.texts()[0];
    assert!(text.contains("Allowed Commands:\n----------------\ncat, ls, sleep\n"));
    assert!(text.contains("Command Timeout: 1 seconds\n"));
    assert!(text.ends_with(": not supported"));
}
