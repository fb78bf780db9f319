//! Common test utilities and helpers

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use std::collections::VecDeque;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const PATCHSET_REWORK: &str = r#"{"type":"patchset-created","project":"p","changeKey":{"id":"c1"},"patchSet":{"kind":"REWORK"}}"#;
pub const PATCHSET_NO_CHANGE: &str = r#"{"type":"patchset-created","project":"p","changeKey":{"id":"c2"},"patchSet":{"kind":"NO_CHANGE"}}"#;
pub const COMMENT_RECHECK: &str = r#"{"type":"comment-added","project":"p","changeKey":{"id":"c3"},"comment":"Patch Set 1:\n\nrecheck"}"#;
pub const COMMENT_RECHECKING: &str = r#"{"type":"comment-added","project":"p","changeKey":{"id":"c4"},"comment":"Patch Set 1:\n\nrechecking tests"}"#;

/// One request as seen by the webhook stand-in
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub namespace: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct WebhookState {
    received: Mutex<Vec<ReceivedRequest>>,
    statuses: Mutex<VecDeque<u16>>,
}

/// In-process Argo webhook answering `POST /api/v1/events/{namespace}/gerrit`.
pub struct WebhookServer {
    addr: SocketAddr,
    state: Arc<WebhookState>,
}

impl WebhookServer {
    pub async fn start() -> Self {
        Self::start_with(Vec::new()).await
    }

    /// Answer the first requests with `statuses`, then with 200
    pub async fn start_with(statuses: Vec<u16>) -> Self {
        let state = Arc::new(WebhookState {
            received: Mutex::new(Vec::new()),
            statuses: Mutex::new(statuses.into()),
        });

        let app = Router::new()
            .route("/api/v1/events/{namespace}/gerrit", post(receive))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self, namespace: &str) -> String {
        format!("http://{}/api/v1/events/{}/gerrit", self.addr, namespace)
    }

    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.state.received.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.received().into_iter().map(|r| r.body).collect()
    }
}

async fn receive(
    State(state): State<Arc<WebhookState>>,
    Path(namespace): Path<String>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, &'static str) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(String::from)
    };
    state.received.lock().unwrap().push(ReceivedRequest {
        namespace,
        authorization: header("authorization"),
        content_type: header("content-type"),
        body,
    });

    let status = state.statuses.lock().unwrap().pop_front().unwrap_or(200);
    let status = StatusCode::from_u16(status).unwrap();
    let reply = if status.is_success() { "ok" } else { "rejected" };
    (status, reply)
}

/// Shell script standing in for the ssh client (unix only).
///
/// It records its arguments, prints the given lines and then either exits
/// with `exit_code` or, when `hold_open` is set, waits to be signalled.
pub struct FakeSsh {
    dir: TempDir,
    script_path: PathBuf,
}

impl FakeSsh {
    pub fn new(lines: &[&str], exit_code: i32, hold_open: bool) -> Self {
        let tail = if hold_open {
            "exec sleep 30".to_string()
        } else {
            format!("exit {exit_code}")
        };
        Self::with_tail(lines, &tail)
    }

    /// Client that closes its output after the lines but keeps running
    /// until signalled, like a stalled connection.
    pub fn closing_output(lines: &[&str]) -> Self {
        Self::with_tail(lines, "exec 1>&-\nexec sleep 30")
    }

    fn with_tail(lines: &[&str], tail: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("events.jsonl");
        let mut content = lines.join("\n");
        if !lines.is_empty() {
            content.push('\n');
        }
        fs::write(&data, content).unwrap();

        let args = dir.path().join("args");
        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\necho 'fake ssh: connected' >&2\ncat '{}'\n{}\n",
            args.display(),
            data.display(),
            tail
        );

        let script_path = dir.path().join("ssh.sh");
        fs::write(&script_path, script).unwrap();

        Self { dir, script_path }
    }

    pub fn script_path(&self) -> &FsPath {
        &self.script_path
    }

    /// Command line for `GERRIT_SSH_COMMAND`; the script is run through
    /// `/bin/sh` so it never has to be executable.
    pub fn command(&self) -> String {
        format!(
            "/bin/sh {}",
            shell_words::quote(&self.script_path.to_string_lossy())
        )
    }

    /// Arguments of the last invocation, one per entry
    pub fn recorded_args(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("args"))
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }
}
