//! # Client Test Suite
//!
//! Drives [`crate::client::NightscoutClient`] end to end against a recording
//! in-memory transport, so request construction, pagination and decoding can
//! be checked without a Nightscout server.


use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Transport that records every request and answers from a queue.
///
/// Once the queue is empty every request gets `200 []`.
pub struct MockTransport {
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
}

impl MockTransport {
    /// Create a transport and a handle to the requests it will receive.
    pub fn new() -> (Self, Arc<Mutex<Vec<HttpRequest>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let transport = MockTransport {
            requests: Arc::clone(&requests),
            responses: Mutex::new(VecDeque::new()),
        };
        (transport, requests)
    }

    pub fn respond(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.into(),
        }));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(TransportError::Other(message.to_string())));
        self
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(HttpResponse {
                    status: 200,
                    body: b"[]".to_vec(),
                })
            })
    }
}
