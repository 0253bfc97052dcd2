//! Amount Debouncer
//!
//! Coalesces rapid amount edits: a quote is requested only after the amount
//! has been quiet for the debounce delay, and only for the latest value.
//! The request runs in its own task so the engine's in-flight guard, not the
//! debouncer, decides what gets dropped.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

use super::quote_engine::QuoteEngine;
use crate::oracle::BridgeSimulator;

/// Quiet period before an amount change turns into a quote request
pub const DEBOUNCE_MS: u64 = 1_500;

pub struct QuoteDebouncer {
    sender: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl QuoteDebouncer {
    /// Start the debounce task for `engine`
    pub fn spawn<O>(engine: Arc<QuoteEngine<O>>, delay: Duration) -> Self
    where
        O: BridgeSimulator + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(engine, receiver, delay));
        Self { sender, task }
    }

    /// Report a new amount. Returns false if the debounce task is gone.
    pub fn amount_changed(&self, amount: impl Into<String>) -> bool {
        self.sender.send(amount.into()).is_ok()
    }
}

impl Drop for QuoteDebouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<O>(
    engine: Arc<QuoteEngine<O>>,
    mut receiver: mpsc::UnboundedReceiver<String>,
    delay: Duration,
) where
    O: BridgeSimulator + 'static,
{
    let mut pending: Option<String> = None;

    loop {
        let Some(amount) = pending.take() else {
            match receiver.recv().await {
                Some(amount) => pending = Some(amount),
                None => break,
            }
            continue;
        };

        match tokio::time::timeout(delay, receiver.recv()).await {
            Ok(Some(newer)) => {
                trace!("Amount {} superseded by {}", amount, newer);
                pending = Some(newer);
            }
            Ok(None) => {
                fire(&engine, amount);
                break;
            }
            Err(_) => fire(&engine, amount),
        }
    }
}

fn fire<O>(engine: &Arc<QuoteEngine<O>>, amount: String)
where
    O: BridgeSimulator + 'static,
{
    trace!("Debounce elapsed, requesting quote for {}", amount);
    let engine = Arc::clone(engine);
    tokio::spawn(async move {
        engine.request_quote(&amount).await;
    });
}
