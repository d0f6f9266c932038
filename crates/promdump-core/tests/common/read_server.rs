//! Minimal HTTP/1.1 remote-read endpoint for integration tests.
//!
//! Replies to each connection with the next scripted reply; once the script
//! runs out the last reply repeats. Every request's headers and body are
//! recorded so tests can inspect what the client sent.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use promdump_core::prompb::{encode_read_response, QueryResult, ReadResponse};

#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with a snappy-framed read response holding `QueryResult`.
    Result(QueryResult),
    /// Given status with a short text body.
    Status(u32),
    /// Hold the connection open this long before answering 200.
    Stall(Duration, QueryResult),
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub headers: Vec<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}

pub struct ReadServer {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ReadServer {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

struct Script {
    replies: VecDeque<Reply>,
    last: Option<Reply>,
}

impl Script {
    fn next(&mut self) -> Reply {
        if let Some(r) = self.replies.pop_front() {
            self.last = Some(r.clone());
            return r;
        }
        self.last.clone().unwrap_or(Reply::Status(503))
    }
}

/// Starts a server in a background thread. The server runs until the
/// process exits.
pub fn start(replies: Vec<Reply>) -> ReadServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let script = Arc::new(Mutex::new(Script {
        replies: replies.into(),
        last: None,
    }));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let reply = script.lock().unwrap().next();
            let recorded = Arc::clone(&recorded);
            thread::spawn(move || handle(stream, reply, &recorded));
        }
    });
    ReadServer {
        url: format!("http://127.0.0.1:{}/api/v1/read", port),
        requests,
    }
}

/// A URL nothing is listening on.
pub fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/api/v1/read", port)
}

fn handle(mut stream: TcpStream, reply: Reply, recorded: &Mutex<Vec<RecordedRequest>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    recorded.lock().unwrap().push(request);

    let (status, body) = match reply {
        Reply::Result(result) => ("200 OK".to_string(), encode(result)),
        Reply::Status(code) => (format!("{} Scripted", code), b"scripted failure".to_vec()),
        Reply::Stall(d, result) => {
            thread::sleep(d);
            ("200 OK".to_string(), encode(result))
        }
    };
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/x-protobuf\r\nContent-Encoding: snappy\r\n\
Content-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
}

fn encode(result: QueryResult) -> Vec<u8> {
    encode_read_response(&ReadResponse {
        results: vec![result],
    })
    .expect("encode response")
}

/// Reads headers up to the blank line, then `Content-Length` bytes of body.
fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = std::str::from_utf8(&buf[..header_end]).ok()?;
    let headers: Vec<String> = head.lines().skip(1).map(str::to_string).collect();
    let mut request = RecordedRequest {
        headers,
        body: Vec::new(),
    };
    let len: usize = request
        .header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < len {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    request.body = body;
    Some(request)
}
