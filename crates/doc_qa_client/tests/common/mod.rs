//! Minimal in-process HTTP/1.1 server for integration tests. No mocks: the
//! client talks to a real socket, and each test scripts the exact chunks,
//! delays and failures the server produces.

#![allow(dead_code)]

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// How a streamed body ends.
#[derive(Debug, Clone)]
pub enum End {
    /// Terminating zero-length chunk.
    Finish,
    /// Close the socket mid-body.
    Drop,
    /// Go silent for this long, then close.
    Stall(Duration),
}

/// What the server answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    Stream {
        fragments: Vec<Vec<u8>>,
        delay: Duration,
        end: End,
    },
    Status {
        code: u16,
        reason: &'static str,
        body: String,
    },
    /// Error status whose body starts, then goes silent for `stall`.
    StalledStatus {
        code: u16,
        reason: &'static str,
        stall: Duration,
    },
    /// Read the request, then send nothing for this long.
    Silent(Duration),
}

impl Reply {
    pub fn text(fragments: &[&str]) -> Self {
        Reply::Stream {
            fragments: fragments.iter().map(|f| f.as_bytes().to_vec()).collect(),
            delay: Duration::from_millis(10),
            end: End::Finish,
        }
    }
}

/// The request as the server saw it.
#[derive(Debug, Clone)]
pub struct Captured {
    pub head: String,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

async fn read_more(sock: &mut TcpStream, buf: &mut Vec<u8>) -> bool {
    let mut chunk = [0u8; 8192];
    let n = sock.read(&mut chunk).await.unwrap();
    buf.extend_from_slice(&chunk[..n]);
    n > 0
}

async fn read_request(sock: &mut TcpStream) -> Captured {
    let mut buf = Vec::new();
    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        if !read_more(sock, &mut buf).await {
            panic!("client closed before sending headers");
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let lower = head.to_ascii_lowercase();
    let mut body = buf[head_end..].to_vec();

    let content_length = lower.lines().find_map(|line| {
        line.strip_prefix("content-length:")
            .and_then(|v| v.trim().parse::<usize>().ok())
    });
    if let Some(len) = content_length {
        while body.len() < len && read_more(sock, &mut body).await {}
    } else if lower.contains("transfer-encoding: chunked") {
        while !body.ends_with(b"0\r\n\r\n") && read_more(sock, &mut body).await {}
    }

    Captured { head, body }
}

async fn write_reply(sock: &mut TcpStream, reply: Reply) {
    match reply {
        Reply::Status { code, reason, body } => {
            let response = format!(
                "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                code,
                reason,
                body.len(),
                body
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.flush().await.unwrap();
        }
        Reply::StalledStatus { code, reason, stall } => {
            let head = format!(
                "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ntransfer-encoding: chunked\r\nconnection: close\r\n\r\n",
                code, reason
            );
            sock.write_all(head.as_bytes()).await.unwrap();
            sock.write_all(b"9\r\n{\"error\":\r\n").await.unwrap();
            sock.flush().await.unwrap();
            tokio::time::sleep(stall).await;
        }
        Reply::Silent(d) => tokio::time::sleep(d).await,
        Reply::Stream {
            fragments,
            delay,
            end,
        } => {
            let head = "HTTP/1.1 200 OK\r\ncontent-type: text/plain; charset=utf-8\r\ntransfer-encoding: chunked\r\nconnection: close\r\n\r\n";
            sock.write_all(head.as_bytes()).await.unwrap();
            sock.flush().await.unwrap();
            for fragment in fragments {
                if fragment.is_empty() {
                    continue;
                }
                tokio::time::sleep(delay).await;
                let mut frame = format!("{:x}\r\n", fragment.len()).into_bytes();
                frame.extend_from_slice(&fragment);
                frame.extend_from_slice(b"\r\n");
                sock.write_all(&frame).await.unwrap();
                sock.flush().await.unwrap();
            }
            match end {
                End::Finish => {
                    sock.write_all(b"0\r\n\r\n").await.unwrap();
                    sock.flush().await.unwrap();
                }
                End::Drop => tokio::time::sleep(Duration::from_millis(50)).await,
                End::Stall(d) => tokio::time::sleep(d).await,
            }
        }
    }
}

async fn handle_one(listener: TcpListener, reply: Reply) -> Captured {
    let (mut sock, _) = listener.accept().await.unwrap();
    let captured = read_request(&mut sock).await;
    write_reply(&mut sock, reply).await;
    captured
}

/// Serve one request on the current runtime. Returns the base URL.
pub async fn serve_once(reply: Reply) -> (String, tokio::task::JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(handle_one(listener, reply));
    (format!("http://127.0.0.1:{}", port), handle)
}

/// Serve one request from a dedicated thread, for tests that run the binary.
pub fn serve_once_in_thread(reply: Reply) -> (String, std::thread::JoinHandle<Captured>) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = std_listener.local_addr().unwrap().port();
    std_listener.set_nonblocking(true).unwrap();
    let handle = std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = TcpListener::from_std(std_listener).unwrap();
            handle_one(listener, reply).await
        })
    });
    (format!("http://127.0.0.1:{}", port), handle)
}

/// A base URL nothing is listening on.
pub fn closed_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
