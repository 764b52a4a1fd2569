//! Local HTTP endpoints with canned replies for client tests.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// How the endpoint answers each connection.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Send this status line and JSON body, then close.
    Respond { status: &'static str, body: String },
    /// Read the request and never answer.
    Hang,
}

impl Reply {
    pub fn json(status: &'static str, body: &str) -> Self {
        Reply::Respond {
            status,
            body: body.to_string(),
        }
    }
}

/// Bind a free loopback port and answer every connection with `reply`.
pub async fn serve(reply: Reply) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle(stream, reply.clone()));
        }
    });
    addr
}

async fn handle(mut stream: TcpStream, reply: Reply) {
    read_request(&mut stream).await;
    match reply {
        Reply::Respond { status, body } => {
            let head = format!(
                "HTTP/1.1 {status}\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes()).await;
            let _ = stream.write_all(body.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        Reply::Hang => {
            // Holding the stream keeps the connection open without a reply.
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(stream);
        }
    }
}

/// Consume the request head and its `Content-Length` body.
async fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = header_end(&buf) {
            if buf.len() >= end + content_length(&buf[..end]) {
                return;
            }
        }
    }
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}
