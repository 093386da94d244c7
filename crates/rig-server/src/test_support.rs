//! In-process fake web API for tests.
//!
//! Runs a `tiny_http` server on `127.0.0.1:0` in a background thread and
//! answers from a list of canned [`Route`]s. Every request is recorded so
//! tests can assert on what was sent.

use std::io::Read;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

/// One recorded request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
struct Canned {
    status: u16,
    body: String,
    content_type: &'static str,
}

/// A canned answer for requests matching method, path and query parameters.
///
/// With several responses, each match consumes the next one and the last
/// response repeats.
#[derive(Debug, Clone)]
pub struct Route {
    method: String,
    path: String,
    params: Vec<(String, String)>,
    responses: Vec<Canned>,
    hits: usize,
}

impl Route {
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new("GET", path)
    }

    #[must_use]
    pub fn post(path: &str) -> Self {
        Self::new("POST", path)
    }

    fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            params: Vec::new(),
            responses: Vec::new(),
            hits: 0,
        }
    }

    /// Only match requests carrying `key=value`.
    #[must_use]
    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn json(mut self, status: u16, body: serde_json::Value) -> Self {
        self.responses.push(Canned {
            status,
            body: body.to_string(),
            content_type: "application/json",
        });
        self
    }

    #[must_use]
    pub fn text(mut self, status: u16, body: &str) -> Self {
        self.responses.push(Canned {
            status,
            body: body.to_string(),
            content_type: "text/plain",
        });
        self
    }

    fn matches(&self, request: &RecordedRequest) -> bool {
        self.method == request.method
            && self.path == request.path
            && self
                .params
                .iter()
                .all(|(k, v)| request.param(k) == Some(v.as_str()))
    }

    fn next_response(&mut self) -> Option<Canned> {
        let idx = self.hits.min(self.responses.len().checked_sub(1)?);
        self.hits += 1;
        self.responses.get(idx).cloned()
    }
}

/// A running fake server. Shut down on drop.
pub struct FakeServer {
    server: Arc<tiny_http::Server>,
    url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: Option<JoinHandle<()>>,
}

impl FakeServer {
    /// Start serving `routes`. Unmatched requests get a 404.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[must_use]
    pub fn start(routes: Vec<Route>) -> Self {
        let server = Arc::new(
            tiny_http::Server::http("127.0.0.1:0").expect("fake server should bind"),
        );
        let port = server
            .server_addr()
            .to_ip()
            .map(|a| a.port())
            .expect("fake server has an IP address");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let server = Arc::clone(&server);
            let requests = Arc::clone(&requests);
            std::thread::spawn(move || serve(&server, routes, &requests))
        };

        Self {
            server,
            url: format!("http://127.0.0.1:{port}"),
            requests,
            handle: Some(handle),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Snapshot of every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests received for `method` + `path`.
    #[must_use]
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(
    server: &tiny_http::Server,
    mut routes: Vec<Route>,
    requests: &Mutex<Vec<RecordedRequest>>,
) {
    for mut request in server.incoming_requests() {
        let recorded = record(&mut request);
        let canned = routes
            .iter_mut()
            .find(|route| route.matches(&recorded))
            .and_then(Route::next_response)
            .unwrap_or(Canned {
                status: 404,
                body: format!("no route for {} {}", recorded.method, recorded.path),
                content_type: "text/plain",
            });

        requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(recorded);

        let mut response =
            tiny_http::Response::from_string(canned.body).with_status_code(canned.status);
        if let Ok(header) = tiny_http::Header::from_bytes("Content-Type", canned.content_type) {
            response = response.with_header(header);
        }
        let _ = request.respond(response);
    }
}

fn record(request: &mut tiny_http::Request) -> RecordedRequest {
    let mut raw = Vec::new();
    let _ = request.as_reader().read_to_end(&mut raw);

    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let query = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(k), decode(v))
        })
        .collect();

    RecordedRequest {
        method: request.method().as_str().to_string(),
        path: path.to_string(),
        query,
        body: String::from_utf8_lossy(&raw).into_owned(),
    }
}

fn decode(value: &str) -> String {
    urlencoding::decode(value).map_or_else(|_| value.to_string(), |v| v.into_owned())
}
