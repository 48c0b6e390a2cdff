//! Scripted transport for driving the fetcher without a network

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tabular_scraper::fetcher::{HttpTransport, TransportError, TransportRequest, TransportResponse};
use tokio::time::Instant;

/// One scripted step
pub enum Step {
    /// Respond immediately
    Respond(Result<TransportResponse, TransportError>),
    /// Never answer within any reasonable timeout
    Hang,
}

/// Replays a fixed list of responses and records when each attempt arrived.
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<(Instant, TransportRequest)>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Shorthand for a script of plain `(status, body)` responses.
    pub fn statuses(script: &[(u16, &str)]) -> Arc<Self> {
        Self::new(
            script
                .iter()
                .map(|(status, body)| Step::Respond(Ok(TransportResponse::new(*status, body.to_string()))))
                .collect(),
        )
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    /// Gaps between consecutive attempts.
    pub fn gaps(&self) -> Vec<Duration> {
        self.call_times()
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Respond(result)) => result,
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(TransportResponse::new(200, "too late"))
            }
            None => Ok(TransportResponse::new(500, "script exhausted")),
        }
    }
}

/// Assert `actual` is `expected`, give or take timer granularity.
pub fn assert_about(actual: Duration, expected: Duration) {
    let slack = Duration::from_millis(50);
    assert!(
        actual >= expected && actual <= expected + slack,
        "expected ~{expected:?}, got {actual:?}"
    );
}
