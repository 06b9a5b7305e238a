//! Minimal HTTP/1.1 server with scripted per-request behavior.
//!
//! Each incoming request consumes the next step of the script (the last step
//! repeats); a step can answer with a body, answer with an error status, or
//! hang and then close without responding. PUT bodies are captured so upload
//! tests can assert on what arrived.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// What the server does with one request.
#[derive(Debug, Clone)]
pub enum Script {
    /// Respond 200 with the given body.
    Body(Vec<u8>),
    /// Respond with the given status and a short diagnostic body.
    Status(u32),
    /// Sleep, then close the connection without responding.
    Hang(Duration),
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

pub struct TestServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
    uploads: Arc<Mutex<Vec<Upload>>>,
}

impl TestServer {
    /// Requests accepted so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// PUT bodies received so far.
    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread. Returns a handle with the base
/// URL (e.g. "http://127.0.0.1:12345/"). Runs until the process exits.
pub fn start(script: Vec<Script>) -> TestServer {
    assert!(!script.is_empty(), "script must have at least one step");
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let uploads = Arc::new(Mutex::new(Vec::new()));

    let accept_hits = Arc::clone(&hits);
    let accept_uploads = Arc::clone(&uploads);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let n = accept_hits.fetch_add(1, Ordering::SeqCst);
            let step = script[n.min(script.len() - 1)].clone();
            let uploads = Arc::clone(&accept_uploads);
            thread::spawn(move || handle(stream, step, &uploads));
        }
    });

    TestServer {
        url: format!("http://127.0.0.1:{}/", port),
        hits,
        uploads,
    }
}

struct Request {
    method: String,
    content_type: Option<String>,
    body: Vec<u8>,
}

fn handle(mut stream: TcpStream, step: Script, uploads: &Mutex<Vec<Upload>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));

    let Some(request) = read_request(&mut stream) else {
        return;
    };
    if request.method.eq_ignore_ascii_case("PUT") {
        uploads.lock().unwrap().push(Upload {
            body: request.body.clone(),
            content_type: request.content_type.clone(),
        });
    }

    match step {
        Script::Body(body) => respond(&mut stream, 200, &body),
        Script::Status(code) => {
            let text = format!("status {}", code);
            respond(&mut stream, code, text.as_bytes());
        }
        Script::Hang(delay) => {
            thread::sleep(delay);
            // Dropping the stream closes the connection with no response.
        }
    }
}

fn respond(stream: &mut TcpStream, code: u32, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        code,
        reason_phrase(code),
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn reason_phrase(code: u32) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 8192];
    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        if buf.len() > 64 * 1024 {
            return None;
        }
        match stream.read(&mut tmp) {
            Ok(0) => return None,
            Ok(n) => buf.extend_from_slice(&tmp[..n]),
            Err(_) => return None,
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.lines();
    let method = lines.next()?.split_whitespace().next()?.to_string();
    let mut content_length = 0usize;
    let mut content_type = None;
    let mut expect_continue = false;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap_or(0);
            } else if name.eq_ignore_ascii_case("content-type") {
                content_type = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("expect") {
                expect_continue = value.eq_ignore_ascii_case("100-continue");
            }
        }
    }

    let mut body = buf[header_end..].to_vec();
    if expect_continue && body.len() < content_length {
        let _ = stream.write_all(b"HTTP/1.1 100 Continue\r\n\r\n");
        let _ = stream.flush();
    }
    while body.len() < content_length {
        match stream.read(&mut tmp) {
            Ok(0) => break,
            Ok(n) => body.extend_from_slice(&tmp[..n]),
            Err(_) => break,
        }
    }
    body.truncate(content_length);

    Some(Request {
        method,
        content_type,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
