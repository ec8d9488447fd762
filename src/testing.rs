//! In-memory [`HttpTransport`] for tests.
//!
//! [`ScriptedTransport`] answers requests from per-route reply queues and
//! records every request it sees, so tests can assert exactly which calls
//! were made, in what order, and that nothing else was requested.
//!
//! ```rust
//! use vector_art_client::testing::ScriptedTransport;
//! use vector_art_client::transport::{HttpResponse, Method};
//!
//! let transport = ScriptedTransport::new()
//!     .reply(Method::GET, "https://api.example/get-emd-upload-url", HttpResponse::ok("https://signed"))
//!     .reply(Method::PUT, "https://signed", HttpResponse::ok(""));
//! assert_eq!(transport.request_count(), 0);
//! ```

use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

enum Reply {
    Response(HttpResponse),
    Fail(String),
}

struct Route {
    method: Method,
    prefix: String,
    replies: VecDeque<Reply>,
}

/// A transport that replays scripted responses.
///
/// Each route is a method plus URL prefix with a FIFO queue of replies.
/// A request is answered by the matching route with the longest prefix that
/// still has replies queued; an unmatched request fails with a
/// [`TransportError`] (and is still recorded).
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `response` for the next request matching `method` + `prefix`.
    pub fn reply(self, method: Method, prefix: &str, response: HttpResponse) -> Self {
        self.push(method, prefix, Reply::Response(response));
        self
    }

    /// Queue `count` copies of `response`.
    pub fn reply_times(self, method: Method, prefix: &str, response: HttpResponse, count: usize) -> Self {
        for _ in 0..count {
            self.push(method.clone(), prefix, Reply::Response(response.clone()));
        }
        self
    }

    /// Queue a transport-level failure (no response at all).
    pub fn fail(self, method: Method, prefix: &str, detail: &str) -> Self {
        self.push(method, prefix, Reply::Fail(detail.to_string()));
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Number of recorded requests matching `method` whose URL starts with `prefix`.
    pub fn count(&self, method: &Method, prefix: &str) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|r| &r.method == method && r.url.starts_with(prefix))
            .count()
    }

    fn push(&self, method: Method, prefix: &str, reply: Reply) {
        let mut routes = lock(&self.routes);
        match routes
            .iter_mut()
            .find(|r| r.method == method && r.prefix == prefix)
        {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                method,
                prefix: prefix.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let reply = {
            let mut routes = lock(&self.routes);
            routes
                .iter_mut()
                .filter(|r| {
                    r.method == request.method
                        && request.url.starts_with(&r.prefix)
                        && !r.replies.is_empty()
                })
                .max_by_key(|r| r.prefix.len())
                .and_then(|r| r.replies.pop_front())
        };
        let unmatched = format!("no scripted reply for {} {}", request.method, request.url);
        lock(&self.requests).push(request);

        match reply {
            Some(Reply::Response(resp)) => Ok(resp),
            Some(Reply::Fail(detail)) => Err(TransportError(detail)),
            None => Err(TransportError(unmatched)),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_in_order_then_fails_unmatched() {
        let t = ScriptedTransport::new()
            .reply(Method::GET, "https://a", HttpResponse::ok("one"))
            .reply(Method::GET, "https://a", HttpResponse::ok("two"));

        assert_eq!(t.send(HttpRequest::get("https://a/x")).await.unwrap().text(), "one");
        assert_eq!(t.send(HttpRequest::get("https://a/y")).await.unwrap().text(), "two");
        assert!(t.send(HttpRequest::get("https://a/z")).await.is_err());
        assert_eq!(t.request_count(), 3);
    }

    #[tokio::test]
    async fn longest_prefix_wins_and_method_must_match() {
        let t = ScriptedTransport::new()
            .reply(Method::POST, "https://api/image-gen", HttpResponse::ok("submit"))
            .reply(Method::GET, "https://api/image-gen/u/j", HttpResponse::ok("status"))
            .reply(Method::GET, "https://api/image-gen", HttpResponse::ok("generic"));

        let r = t.send(HttpRequest::get("https://api/image-gen/u/j/status")).await.unwrap();
        assert_eq!(r.text(), "status");
        let r = t.send(HttpRequest::post("https://api/image-gen", vec![])).await.unwrap();
        assert_eq!(r.text(), "submit");
        assert_eq!(t.count(&Method::GET, "https://api/image-gen"), 1);
    }

    #[tokio::test]
    async fn scripted_failure_is_transport_error() {
        let t = ScriptedTransport::new().fail(Method::GET, "https://cdn", "connection reset");
        let err = t.send(HttpRequest::get("https://cdn/x.png")).await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
    }
}
