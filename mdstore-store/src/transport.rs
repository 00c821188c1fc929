//! Transport abstraction.
//!
//! The store never talks to the network itself; it hands a
//! [`RequestDescriptor`] to a [`Transport`] and waits for the extracted value.

use crate::descriptor::RequestDescriptor;
use crate::error::StoreResult;
use async_trait::async_trait;
use serde_json::Value;

/// Host-supplied entry point that performs one request.
///
/// Implementations must call [`RequestDescriptor::configure`] on their
/// headers before sending and [`RequestDescriptor::extract`] on a successful
/// response. Failures are returned as-is to the caller; the store does not
/// retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dispatch(&self, descriptor: RequestDescriptor) -> StoreResult<Value>;
}

/// A scripted transport for testing.
pub mod mock {
    use super::*;
    use crate::descriptor::TransportResponse;
    use crate::error::StoreError;
    use reqwest::header::HeaderMap;
    use reqwest::Method;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Mutex, PoisonError};

    /// A canned reply.
    #[derive(Debug, Clone)]
    pub enum MockReply {
        /// A successful response with this body, run through `extract`.
        Body(String),
        /// A transport failure.
        Error(String),
    }

    /// What the mock saw for one dispatched request.
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: Method,
        pub url: String,
        /// Dereferenced payload.
        pub data: Value,
        /// Encoded payload.
        pub body: String,
        pub headers: HeaderMap,
        pub background: bool,
    }

    /// Replies are queued per `(method, url)`; the last reply for a route is
    /// repeated once the queue is down to one.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        replies: Mutex<HashMap<(Method, String), VecDeque<MockReply>>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl MockTransport {
        /// Creates a transport with no routes.
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues a raw body for a route.
        pub fn respond(&self, method: Method, url: impl Into<String>, body: impl Into<String>) {
            self.push(method, url.into(), MockReply::Body(body.into()));
        }

        /// Queues a JSON body for a route.
        pub fn respond_json(&self, method: Method, url: impl Into<String>, body: Value) {
            self.push(method, url.into(), MockReply::Body(body.to_string()));
        }

        /// Queues a transport failure for a route.
        pub fn fail(&self, method: Method, url: impl Into<String>, message: impl Into<String>) {
            self.push(method, url.into(), MockReply::Error(message.into()));
        }

        /// All requests dispatched so far, oldest first.
        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        fn push(&self, method: Method, url: String, reply: MockReply) {
            self.replies
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry((method, url))
                .or_default()
                .push_back(reply);
        }

        fn next_reply(&self, method: &Method, url: &str) -> Option<MockReply> {
            let mut replies = self.replies.lock().unwrap_or_else(PoisonError::into_inner);
            let queue = replies.get_mut(&(method.clone(), url.to_string()))?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn dispatch(&self, descriptor: RequestDescriptor) -> StoreResult<Value> {
            let mut headers = HeaderMap::new();
            descriptor.configure(&mut headers);
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(RecordedRequest {
                    method: descriptor.method.clone(),
                    url: descriptor.url.clone(),
                    data: descriptor.wire_data(),
                    body: descriptor.serialize(),
                    headers,
                    background: descriptor.background,
                });

            match self.next_reply(&descriptor.method, &descriptor.url) {
                Some(MockReply::Body(body)) => descriptor.extract(&TransportResponse::ok(body)),
                Some(MockReply::Error(message)) => Err(StoreError::Transport(message)),
                None => Err(StoreError::Transport(format!(
                    "no mock response for {} {}",
                    descriptor.method, descriptor.url
                ))),
            }
        }
    }
}
