//! Scripted simulator for tests: answers from a closure and records every request.

use eyre::{eyre, Result};
use std::sync::Mutex;
use std::time::Duration;

use super::{BridgeSimulator, SimulateRequest, SimulateResponse};
use crate::quote::parse_amount;

type Script = Box<dyn Fn(f64) -> Result<SimulateResponse> + Send + Sync>;

pub(crate) struct ScriptedSimulator {
    script: Script,
    delay: Option<Duration>,
    requests: Mutex<Vec<SimulateRequest>>,
}

impl ScriptedSimulator {
    pub(crate) fn new(script: impl Fn(f64) -> Result<SimulateResponse> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Bridge charging `1 - ratio` of the sent amount: `sourcesTotal(R) = R / ratio`
    pub(crate) fn with_fee_ratio(ratio: f64) -> Self {
        Self::new(move |receive| Ok(SimulateResponse::with_total((receive / ratio).to_string(), Vec::new())))
    }

    /// Every call fails with `message`
    pub(crate) fn failing(message: &'static str) -> Self {
        Self::new(move |_| Err(eyre!("{}", message)))
    }

    /// Sleep before answering (tokio time, so paused-clock tests control it)
    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requested_amounts(&self) -> Vec<f64> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|request| parse_amount(&request.amount))
            .collect()
    }

    pub(crate) fn last_request(&self) -> Option<SimulateRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl BridgeSimulator for ScriptedSimulator {
    async fn simulate(&self, request: &SimulateRequest) -> Result<SimulateResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let receive = parse_amount(&request.amount)
            .ok_or_else(|| eyre!("bad amount in request: {}", request.amount))?;
        (self.script)(receive)
    }
}
