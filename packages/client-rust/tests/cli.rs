//! Runs the `remotefields` binary against a mocked companion service.

use std::io::Write;
use std::process::Command;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

async fn spawn_remote() -> String {
    let app = Router::new().route(
        "/things/",
        get(|| async {
            Json(json!([
                {"id": 2002, "name": "Name of the thing"},
                {"id": 2003, "name": "Name of another thing"}
            ]))
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

fn json_file(value: &serde_json::Value) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{value}").unwrap();
    file
}

#[tokio::test]
async fn enriches_a_collection_document() {
    let base_url = spawn_remote().await;
    let definition = json_file(&json!({
        "fields": [
            {"name": "id", "kind": "local"},
            {"name": "thing", "kind": "remote", "source": "thing_id",
             "remote_sources": ["name"], "flatten": true,
             "endpoints": {"list": "things__list", "detail": "things__detail"}}
        ]
    }));
    let input = json_file(&json!([{"id": 1, "thing_id": 2003}, {"id": 2, "thing_id": null}]));

    let mut command = Command::new(env!("CARGO_BIN_EXE_remotefields"));
    command
        .arg("--definition")
        .arg(definition.path())
        .arg("--input")
        .arg(input.path())
        .arg("--base-url")
        .arg(&base_url)
        .args(["--endpoint", "things__list=things/"])
        .args(["--endpoint", "things__detail=things/detail/"])
        .env("RUST_LOG", "warn");

    let output = tokio::task::spawn_blocking(move || command.output())
        .await
        .unwrap()
        .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        printed,
        json!([
            {"id": 1, "thing": "Name of another thing"},
            {"id": 2, "thing": null}
        ])
    );
}

#[tokio::test]
async fn unknown_endpoint_exits_with_error() {
    let definition = json_file(&json!({
        "fields": [
            {"name": "thing", "kind": "remote", "source": "thing_id",
             "remote_sources": ["name"],
             "endpoints": {"list": "nope", "detail": "nope"}}
        ]
    }));
    let input = json_file(&json!({"thing_id": 1}));

    let output = Command::new(env!("CARGO_BIN_EXE_remotefields"))
        .arg("--definition")
        .arg(definition.path())
        .arg("--input")
        .arg(input.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown endpoint: nope"));
}
