#![allow(dead_code)]

use async_trait::async_trait;
use sellsy_client::{ActivityLog, AsyncTransport, CallId, Credentials, PostRequest, TransportError};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::MockServer;

pub fn test_credentials() -> Credentials {
    Credentials::new("user-token", "user secret", "consumer-token", "consumer&secret")
}

pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn success_body(response: serde_json::Value) -> String {
    serde_json::json!({"status": "success", "response": response}).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Direction {
    Outbound,
    Inbound,
}

/// Keeps every activity line in memory, in order
#[derive(Default)]
pub struct RecordingActivityLog {
    entries: Mutex<Vec<(Direction, CallId, String)>>,
}

impl RecordingActivityLog {
    pub fn entries(&self) -> Vec<(Direction, CallId, String)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn position(&self, direction: Direction, call_id: &CallId) -> Option<usize> {
        self.entries()
            .iter()
            .position(|(d, id, _)| *d == direction && id == call_id)
    }

    pub fn inbound_for(&self, call_id: &CallId) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(d, id, _)| *d == Direction::Inbound && id == call_id)
            .map(|(_, _, message)| message)
            .collect()
    }
}

impl ActivityLog for RecordingActivityLog {
    fn log_outbound(&self, call_id: &CallId, message: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((Direction::Outbound, call_id.clone(), message.to_string()));
    }

    fn log_inbound(&self, call_id: &CallId, message: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((Direction::Inbound, call_id.clone(), message.to_string()));
    }
}

/// Answers every request with a fixed body after a delay
pub struct DelayedTransport {
    pub body: String,
    pub delay: Duration,
}

#[async_trait]
impl AsyncTransport for DelayedTransport {
    async fn post(&self, _request: &PostRequest) -> Result<String, TransportError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.body.clone())
    }
}
