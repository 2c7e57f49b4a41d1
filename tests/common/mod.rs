//! Shared utilities for integration testing: raw-TCP mock mirrors.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use ipfs_relay::config::LivenessConfig;

/// What a mock mirror answers with.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
    pub headers: Vec<(String, String)>,
    /// Omit `Content-Length`; the body then ends when the connection closes.
    pub close_delimited: bool,
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
            headers: Vec::new(),
            close_delimited: false,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::ok("mirror error")
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn without_length(mut self) -> Self {
        self.close_delimited = true;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// A running mock mirror with counters.
#[derive(Debug, Clone)]
pub struct MockMirror {
    pub addr: SocketAddr,
    stats: Arc<Stats>,
}

#[derive(Debug, Default)]
struct Stats {
    hits: AtomicUsize,
    aborted: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    last_request: Mutex<Option<String>>,
}

impl MockMirror {
    /// Template routing every identifier to this mirror.
    pub fn template(&self) -> String {
        format!("http://{}/ipfs/{{cid}}", self.addr)
    }

    /// Requests received (headers fully read).
    pub fn hits(&self) -> usize {
        self.stats.hits.load(Ordering::SeqCst)
    }

    /// Requests whose client hung up before the reply was sent.
    pub fn aborted(&self) -> usize {
        self.stats.aborted.load(Ordering::SeqCst)
    }

    /// Highest number of requests handled at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.stats.peak.load(Ordering::SeqCst)
    }

    /// Raw head (request line and headers) of the latest request.
    pub fn last_request(&self) -> Option<String> {
        self.stats.last_request.lock().unwrap().clone()
    }

    /// Poll until `aborted()` reaches `count` or the deadline passes.
    pub async fn wait_for_aborts(&self, count: usize, deadline: Duration) -> bool {
        let step = Duration::from_millis(10);
        let mut waited = Duration::ZERO;
        while self.aborted() < count {
            if waited >= deadline {
                return false;
            }
            tokio::time::sleep(step).await;
            waited += step;
        }
        true
    }
}

/// Start a mirror that always answers with `reply`.
pub async fn start_mirror(reply: Reply) -> MockMirror {
    start_programmable_mirror(move || {
        let reply = reply.clone();
        async move { reply }
    })
    .await
}

/// Start a mirror whose reply is computed per request.
pub async fn start_programmable_mirror<F, Fut>(f: F) -> MockMirror
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Reply> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stats = Arc::new(Stats::default());
    let f = Arc::new(f);

    let task_stats = stats.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    let stats = task_stats.clone();
                    tokio::spawn(async move {
                        serve(socket, stats, f().await).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockMirror { addr, stats }
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Liveness settings matching what the mock mirrors serve.
pub fn liveness_config(concurrency: usize) -> LivenessConfig {
    LivenessConfig {
        concurrency,
        ..LivenessConfig::default()
    }
}

/// Client that never goes through an environment proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

async fn serve(mut socket: TcpStream, stats: Arc<Stats>, reply: Reply) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }

    stats.hits.fetch_add(1, Ordering::SeqCst);
    *stats.last_request.lock().unwrap() = Some(String::from_utf8_lossy(&head).into_owned());
    let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    stats.peak.fetch_max(now, Ordering::SeqCst);

    // Either the delay elapses and we answer, or the client hangs up first.
    let hung_up = tokio::select! {
        _ = tokio::time::sleep(reply.delay) => false,
        read = socket.read(&mut buf) => matches!(read, Ok(0) | Err(_)),
    };

    if hung_up {
        stats.aborted.fetch_add(1, Ordering::SeqCst);
    } else {
        let mut response = format!(
            "HTTP/1.1 {} {}\r\nConnection: close\r\n",
            reply.status,
            if reply.status == 200 { "OK" } else { "Mock" },
        );
        if !reply.close_delimited {
            response.push_str(&format!("Content-Length: {}\r\n", reply.body.len()));
        }
        for (name, value) in &reply.headers {
            response.push_str(&format!("{name}: {value}\r\n"));
        }
        response.push_str("\r\n");
        response.push_str(&reply.body);
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    }
    stats.in_flight.fetch_sub(1, Ordering::SeqCst);
}
