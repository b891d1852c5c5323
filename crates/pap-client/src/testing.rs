//! Scripted transport for session tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use pap_net::{NetError, Transport};
use pap_shared::protocol::Request;

/// Replies to requests from a queue and records what was sent.
/// An exhausted queue behaves like a closed connection.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<String, NetError>>>,
    sent: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, error: NetError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn push_reply(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: &Request) -> Result<String, NetError> {
        self.sent.lock().unwrap().push(request.encode());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(NetError::Closed))
    }
}
