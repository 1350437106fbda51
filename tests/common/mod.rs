//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::future::Future;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use taskflow::config::Config;
use taskflow::health::HealthProbe;
use taskflow::http::{AppState, HttpServer, ServerError};
use taskflow::lifecycle::Shutdown;
use taskflow::observability::logging::StructuredLogger;

#[path = "../../src/observability/exposition.rs"]
pub mod exposition;

/// In-memory log sink shared between the server and the test.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    /// Every record written so far, parsed.
    pub fn records(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .expect("log output is UTF-8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("each log line is a JSON object"))
            .collect()
    }

    /// Records whose `message` equals `event`.
    pub fn events(&self, event: &str) -> Vec<Value> {
        self.records()
            .into_iter()
            .filter(|r| r["message"] == event)
            .collect()
    }
}

/// A running server on an ephemeral port.
pub struct TestApp {
    pub addr: SocketAddr,
    pub state: AppState,
    pub logs: LogCapture,
    pub shutdown: Arc<Shutdown>,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(Config::default(), None).await
    }

    pub async fn spawn_with(mut config: Config, probe: Option<HealthProbe>) -> Self {
        config.host = "127.0.0.1".into();
        config.port = 0;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let logs = LogCapture::default();
        let logger = Arc::new(StructuredLogger::with_sink(config.service_name.clone(), logs.clone()));

        let mut server = HttpServer::new(config, listener, logger).unwrap();
        if let Some(probe) = probe {
            server = server.with_probe(probe);
        }
        let addr = server.local_addr().unwrap();
        let state = server.state().clone();
        let shutdown = server.shutdown();
        let handle = tokio::spawn(server.run());

        Self {
            addr,
            state,
            logs,
            shutdown,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait for the completion record of a request; the middleware writes
    /// it right after the response head is produced.
    pub async fn wait_for_events(&self, event: &str, count: usize) -> Vec<Value> {
        for _ in 0..100 {
            let events = self.logs.events(event);
            if events.len() >= count {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.logs.events(event)
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}

/// Start a programmable backend on an ephemeral port. Each connection gets
/// the `(status, body)` produced by `f`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;

                let (status, body) = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}
