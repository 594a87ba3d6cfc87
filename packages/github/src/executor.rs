//! HTTP execution abstraction for testing.
//!
//! This module provides a trait for HTTP execution that can be mocked in tests,
//! avoiding the need for actual network calls.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::types::{HttpRequest, HttpResponse};

/// Trait for executing HTTP requests.
///
/// Implementations can use real HTTP clients or canned responses for testing.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// Any response, including 4xx and 5xx, is `Ok`. `Err` carries a message
    /// when no response was obtained at all.
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String>;

    /// Apply a new per-request timeout to subsequent requests.
    ///
    /// Executors without a client-level timeout ignore it.
    fn set_timeout(&self, _timeout: Duration) -> Result<(), crate::Error> {
        Ok(())
    }
}

/// Production HTTP executor using reqwest.
pub struct ReqwestExecutor {
    client: RwLock<Client>,
}

fn build_client(timeout: Duration) -> Result<Client, crate::Error> {
    Ok(Client::builder().timeout(timeout).build()?)
}

impl ReqwestExecutor {
    /// Create a new executor with the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, crate::Error> {
        Ok(Self {
            client: RwLock::new(build_client(timeout)?),
        })
    }

    /// Create with default timeout of 30 seconds.
    pub fn with_default_timeout() -> Result<Self, crate::Error> {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let method: http::Method = request.method.into();

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let header_name = HeaderName::try_from(name.as_str()).map_err(|e| e.to_string())?;
            let header_value = HeaderValue::try_from(value.as_str()).map_err(|e| e.to_string())?;
            headers.insert(header_name, header_value);
        }

        // Clients are reference counted; the clone keeps the lock out of the await.
        let client = self.client.read().unwrap().clone();
        let mut req_builder = client.request(method, &request.url);
        req_builder = req_builder.headers(headers);

        if !request.query.is_empty() {
            req_builder = req_builder.query(&request.query);
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.json(body);
        }

        let response = req_builder.send().await.map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string();

        let mut resp_headers = std::collections::HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                resp_headers.insert(name.to_string(), v.to_string());
            }
        }

        let body_text = response.text().await.map_err(|e| e.to_string())?;
        let body = serde_json::from_str(&body_text).unwrap_or(serde_json::Value::Null);

        Ok(HttpResponse {
            status,
            status_text,
            headers: resp_headers,
            body,
            body_text: Some(body_text),
        })
    }

    fn set_timeout(&self, timeout: Duration) -> Result<(), crate::Error> {
        let client = build_client(timeout)?;
        *self.client.write().unwrap() = client;
        Ok(())
    }
}

/// Mock HTTP executor for testing.
///
/// Returns queued responses keyed by method and URL path.
#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::types::Method;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    /// A mock HTTP executor that returns predefined responses.
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Response queues keyed by "METHOD /path". The last response of a
        /// queue is repeated once the others are used up.
        responses: Arc<Mutex<HashMap<String, VecDeque<HttpResponse>>>>,
        /// Recorded requests for verification.
        recorded_requests: Arc<Mutex<Vec<HttpRequest>>>,
        /// Error message returned for every request when set.
        failure: Arc<Mutex<Option<String>>>,
        /// Timeouts applied through `set_timeout`, in order.
        timeouts: Arc<Mutex<Vec<Duration>>>,
    }

    fn key(method: Method, path: &str) -> String {
        format!("{} {}", method, path)
    }

    fn url_path(url: &str) -> String {
        url::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.to_string())
    }

    impl MockExecutor {
        /// Create a new mock executor.
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a response for a method and URL path.
        pub fn with_response(self, method: Method, path: &str, response: HttpResponse) -> Self {
            self.responses
                .lock()
                .unwrap()
                .entry(key(method, path))
                .or_default()
                .push_back(response);
            self
        }

        /// Configure to fail all requests with an error.
        pub fn fail_with(self, message: impl Into<String>) -> Self {
            *self.failure.lock().unwrap() = Some(message.into());
            self
        }

        /// Get all recorded requests.
        pub fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.recorded_requests.lock().unwrap().clone()
        }

        /// Timeouts applied so far.
        pub fn timeouts(&self) -> Vec<Duration> {
            self.timeouts.lock().unwrap().clone()
        }

        /// Number of recorded requests with the given method and URL path.
        pub fn count(&self, method: Method, path: &str) -> usize {
            self.recorded_requests()
                .iter()
                .filter(|r| r.method == method && url_path(&r.url) == path)
                .count()
        }

        /// Create a simple success response.
        pub fn success_response(body: serde_json::Value) -> HttpResponse {
            HttpResponse::with_status(200, body)
        }

        /// Create an error response carrying a GitHub style message.
        pub fn error_response(status: u16, message: &str) -> HttpResponse {
            HttpResponse::with_status(status, serde_json::json!({ "message": message }))
        }

        /// Create a 404 Not Found response.
        pub fn not_found() -> HttpResponse {
            Self::error_response(404, "Not Found")
        }
    }

    #[async_trait]
    impl HttpExecutor for MockExecutor {
        async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
            self.recorded_requests.lock().unwrap().push(request.clone());

            if let Some(message) = self.failure.lock().unwrap().clone() {
                return Err(message);
            }

            let mut responses = self.responses.lock().unwrap();
            match responses.get_mut(&key(request.method, &url_path(&request.url))) {
                Some(queue) if queue.len() > 1 => Ok(queue.pop_front().unwrap_or_else(Self::not_found)),
                Some(queue) => Ok(queue.front().cloned().unwrap_or_else(Self::not_found)),
                None => Ok(Self::not_found()),
            }
        }

        fn set_timeout(&self, timeout: Duration) -> Result<(), crate::Error> {
            self.timeouts.lock().unwrap().push(timeout);
            Ok(())
        }
    }
}
