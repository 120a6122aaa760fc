//! Test doubles for the transport seam
//!
//! [`ScriptedTransport`] replays a fixed sequence of responses and records
//! every request it receives. It can also advance a [`MockClock`] on each
//! call to simulate slow exchanges without sleeping.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use quill_common::resilience::MockClock;
use tracing::warn;

use crate::api::transport::{Transport, TransportError, TransportRequest, TransportResponse};

/// One scripted transport result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Complete the exchange with this status and body
    Respond(u16, String),
    /// Fail at transport level
    Fail(TransportError),
    /// Never complete
    Hang,
}

impl Step {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Respond(status, body.into())
    }

    pub fn network_error() -> Self {
        Self::Fail(TransportError::Connect("connection refused".into()))
    }
}

#[derive(Debug, Default)]
struct Script {
    steps: Vec<Step>,
    requests: Vec<TransportRequest>,
}

/// Transport that plays `steps` in order, then repeats the last one.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
    clock: Option<(MockClock, Duration)>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { script: Mutex::new(Script { steps, requests: Vec::new() }), clock: None }
    }

    pub fn repeating(step: Step) -> Self {
        Self::new(vec![step])
    }

    /// Advance `clock` by `per_call` every time a request is sent.
    pub fn advancing(mut self, clock: MockClock, per_call: Duration) -> Self {
        self.clock = Some((clock, per_call));
        self
    }

    /// Number of requests received so far
    pub fn calls(&self) -> usize {
        self.lock_script().requests.len()
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.lock_script().requests.clone()
    }

    fn lock_script(&self) -> MutexGuard<'_, Script> {
        match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("scripted transport mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn next_step(&self, request: &TransportRequest) -> Step {
        let mut script = self.lock_script();
        let index = script.requests.len();
        script.requests.push(request.clone());

        match script.steps.get(index).or_else(|| script.steps.last()) {
            Some(step) => step.clone(),
            None => Step::Fail(TransportError::Request("no scripted response".into())),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let step = self.next_step(request);
        if let Some((clock, per_call)) = &self.clock {
            clock.advance(*per_call);
        }

        match step {
            Step::Respond(status, body) => Ok(TransportResponse::new(status, body)),
            Step::Fail(err) => Err(err),
            Step::Hang => std::future::pending().await,
        }
    }
}
