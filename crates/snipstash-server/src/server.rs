//! HTTP server
//!
//! One `tiny_http` listener shared by a fixed pool of worker threads. Each
//! worker pulls a request, routes it through the `Api`, and writes the
//! response with the CORS headers attached.
//!
//! Shutdown sets a flag and unblocks every worker once; a worker that sees
//! the flag after `recv` fails leaves its loop.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tiny_http::{Header, Request, Response, Server};
use tracing::{error, info, warn};

use snipstash_core::{Config, SnippetStore};

use crate::response::ApiResponse;
use crate::routes::Api;

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

const RECV_BACKOFF_BASE: Duration = Duration::from_millis(10);
const RECV_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Delay before retrying after `failures` consecutive `recv` errors
fn recv_backoff(failures: u32) -> Duration {
    RECV_BACKOFF_BASE
        .saturating_mul(2u32.saturating_pow(failures.saturating_sub(1)))
        .min(RECV_BACKOFF_MAX)
}

/// A bound HTTP server, ready to run workers
pub struct HttpServer {
    server: Arc<Server>,
    api: Api,
    cors_origin: Arc<str>,
    workers: usize,
    shutting_down: Arc<AtomicBool>,
}

/// Handle used to stop a running server from another task
#[derive(Clone)]
pub struct ShutdownHandle {
    server: Arc<Server>,
    workers: usize,
    shutting_down: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask every worker to stop after its current request
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        for _ in 0..self.workers {
            self.server.unblock();
        }
    }
}

impl HttpServer {
    /// Bind the listener described by `config`
    pub fn bind(config: &Config, store: Arc<SnippetStore>) -> Result<Self> {
        let server = Server::http(&config.addr)
            .map_err(|e| anyhow!("bind http at {}: {}", config.addr, e))?;

        Ok(Self {
            server: Arc::new(server),
            api: Api::new(store),
            cors_origin: Arc::from(config.cors_origin.as_str()),
            workers: config.workers.max(1),
            shutting_down: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Number of worker loops this server expects to run
    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            server: Arc::clone(&self.server),
            workers: self.workers,
            shutting_down: Arc::clone(&self.shutting_down),
        }
    }

    /// Build one worker loop; call `run` on it from a blocking thread
    pub fn worker(&self, index: usize) -> Worker {
        Worker {
            index,
            server: Arc::clone(&self.server),
            api: self.api.clone(),
            cors_origin: Arc::clone(&self.cors_origin),
            shutting_down: Arc::clone(&self.shutting_down),
        }
    }
}

/// A single request loop
pub struct Worker {
    index: usize,
    server: Arc<Server>,
    api: Api,
    cors_origin: Arc<str>,
    shutting_down: Arc<AtomicBool>,
}

impl Worker {
    /// Serve requests until shutdown is requested
    pub fn run(self) {
        let mut failures = 0u32;
        loop {
            match self.server.recv() {
                Ok(request) => {
                    failures = 0;
                    self.serve(request);
                }
                Err(e) => {
                    if self.shutting_down.load(Ordering::SeqCst) {
                        break;
                    }
                    failures = failures.saturating_add(1);
                    let delay = recv_backoff(failures);
                    error!(
                        worker = self.index,
                        error = %e,
                        failures,
                        retry_ms = delay.as_millis() as u64,
                        "http recv error"
                    );
                    thread::sleep(delay);
                }
            }
        }
        info!(worker = self.index, "worker stopped");
    }

    fn serve(&self, mut request: Request) {
        let method = request.method().as_str().to_string();
        let target = request.url().to_string();
        let path = target.split('?').next().unwrap_or_default().to_string();

        let mut body = Vec::new();
        let response = match request.as_reader().read_to_end(&mut body) {
            Ok(_) => self.api.handle(&method, &target, &body),
            Err(e) => {
                warn!(method = %method, path = %path, error = %e, "failed to read request body");
                ApiResponse::message(400, "unreadable request body")
            }
        };

        info!(method = %method, path = %path, status = response.status, "handled request");

        if let Err(e) = request.respond(self.to_http(response)) {
            warn!(method = %method, path = %path, error = %e, "failed to send response");
        }
    }

    fn to_http(&self, response: ApiResponse) -> Response<std::io::Cursor<Vec<u8>>> {
        let mut http = Response::from_data(response.body.into_bytes()).with_status_code(response.status);

        let mut headers = vec![
            ("Access-Control-Allow-Origin", self.cors_origin.as_ref()),
            ("Access-Control-Allow-Methods", ALLOW_METHODS),
            ("Access-Control-Allow-Headers", ALLOW_HEADERS),
        ];
        if let Some(content_type) = response.content_type {
            headers.push(("Content-Type", content_type));
        }

        for (name, value) in headers {
            match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                Ok(header) => http.add_header(header),
                Err(()) => warn!(worker = self.index, header = name, value = ?value, "skipping invalid header"),
            }
        }
        http
    }
}
