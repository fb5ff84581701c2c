// tests/server_routes.rs

mod common;
use crate::common::builders::{sh_terminal_config, step, CatalogBuilder};
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use turtorial::exec::{ShellCommandExecutor, StepRunner};
use turtorial::server::socket::ControlMessage;
use turtorial::server::{serve, AppState};
use turtorial::terminal::SessionRegistry;

type TestResult = Result<(), Box<dyn Error>>;

struct TestServer {
    addr: SocketAddr,
    registry: SessionRegistry,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    async fn start(shell: &str) -> Result<Self, Box<dyn Error>> {
        let mut passing = step("passing");
        passing.test_command = Some("true".to_string());
        passing.before_command = Some("exit 4".to_string());
        let mut failing = step("failing");
        failing.test_command = Some("false".to_string());

        let catalog = CatalogBuilder::new()
            .step("basics", passing)
            .step("basics", failing)
            .build();
        let steps = StepRunner::new(
            Arc::new(catalog),
            Arc::new(ShellCommandExecutor::default()),
            true,
        );

        let mut terminal = sh_terminal_config();
        terminal.shell = shell.to_string();
        let registry = SessionRegistry::new(terminal);
        let state = AppState::new(registry.clone(), steps);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve(listener, state, async move {
            let _ = rx.await;
        }));

        Ok(Self {
            addr,
            registry,
            shutdown: Some(tx),
            handle,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(mut self) -> TestResult {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        with_timeout(self.handle).await??;
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn step_routes_report_command_outcomes() -> TestResult {
    init_tracing();
    let server = TestServer::start("/bin/sh").await?;
    let client = reqwest::Client::new();

    let post = |path: &str| client.post(server.url(path)).send();

    let ok: bool = post("/api/lessons/basics/steps/passing/verify").await?.json().await?;
    assert!(ok);
    let ok: bool = post("/api/lessons/basics/steps/failing/verify").await?.json().await?;
    assert!(!ok);
    let ok: bool = post("/api/lessons/basics/steps/passing/runBefore").await?.json().await?;
    assert!(!ok);
    let ok: bool = post("/api/lessons/basics/steps/passing/runAfter").await?.json().await?;
    assert!(ok);
    let ok: bool = post("/api/lessons/basics/steps/unknown/verify").await?.json().await?;
    assert!(ok);

    server.stop().await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lesson_routes_list_and_look_up() -> TestResult {
    init_tracing();
    let server = TestServer::start("/bin/sh").await?;

    let lessons: Value = reqwest::get(server.url("/api/lessons")).await?.json().await?;
    assert_eq!(lessons[0]["id"], "basics");
    assert_eq!(lessons[0]["steps"][0]["id"], "failing");
    assert_eq!(lessons[0]["steps"][1]["testCommand"], "true");

    let lesson: Value = reqwest::get(server.url("/api/lessons/basics")).await?.json().await?;
    assert_eq!(lesson["steps"].as_array().map(Vec::len), Some(2));

    let missing = reqwest::get(server.url("/api/lessons/nope")).await?;
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    server.stop().await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn terminal_socket_relays_a_shell() -> TestResult {
    init_tracing();
    let server = TestServer::start("/bin/sh").await?;
    let (mut ws, _) =
        tokio_tungstenite::connect_async(format!("ws://{}/term", server.addr)).await?;

    let resize = ControlMessage::Resize { cols: 90, rows: 30 };
    ws.send(Message::Text(resize.encode())).await?;
    // Unmarked JSON is ordinary input and must not resize anything.
    ws.send(Message::Text(
        r#"echo '{"type":"resize","cols":11,"rows":11}'"#.to_string() + "\n",
    ))
    .await?;
    ws.send(Message::Text("stty size; echo do''ne\n".to_string()))
        .await?;

    let (output, text_frames) = with_timeout(async {
        let mut seen = String::new();
        let mut text_frames = 0;
        while let Some(Ok(msg)) = ws.next().await {
            match msg {
                Message::Text(text) => {
                    text_frames += 1;
                    seen.push_str(&text);
                }
                Message::Binary(bytes) => seen.push_str(&String::from_utf8_lossy(&bytes)),
                _ => continue,
            }
            if seen.contains("done") {
                break;
            }
        }
        (seen, text_frames)
    })
    .await;
    assert!(output.contains("30 90"), "output was {output:?}");
    assert!(output.contains(r#"{"type":"resize","cols":11,"rows":11}"#));
    assert!(text_frames > 0, "plain shell output should arrive as text frames");
    assert_eq!(server.registry.len(), 1);

    ws.close(None).await?;
    with_timeout(async {
        while !server.registry.is_empty() {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    })
    .await;

    server.stop().await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn terminal_socket_closes_with_error_when_the_shell_cannot_start() -> TestResult {
    init_tracing();
    let server = TestServer::start("/nonexistent/turtorial-shell").await?;
    let (mut ws, _) =
        tokio_tungstenite::connect_async(format!("ws://{}/term", server.addr)).await?;

    let frame = with_timeout(async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(frame))) => return frame,
                Some(Ok(_)) => continue,
                _ => return None,
            }
        }
    })
    .await;

    let code = frame.map(|f| u16::from(f.code));
    assert_eq!(code, Some(1011));
    assert!(server.registry.is_empty());

    server.stop().await
}
