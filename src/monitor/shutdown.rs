//! Shutdown signalling
//!
//! One signal per monitor. The first trigger records why the monitor is
//! stopping; later triggers are no-ops. Every task holds its own receiver
//! and checks it at each suspension point.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::backend::BackendError;

/// Why a monitor stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// `stop()` was called
    Stopped,
    /// The backend closed the event stream
    StreamEnded,
    /// A re-check failed with something other than "not found"
    BackendFailure(BackendError),
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Stopped => "stopped",
            Termination::StreamEnded => "stream_ended",
            Termination::BackendFailure(_) => "backend_failure",
        }
    }
}

/// Trigger side of the shutdown signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<Option<Termination>>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown. Returns true only for the call that actually
    /// flipped the signal.
    pub fn trigger(&self, cause: Termination) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(cause);
            true
        })
    }

    pub fn is_triggered(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The recorded cause, once triggered
    pub fn cause(&self) -> Option<Termination> {
        self.tx.borrow().clone()
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receive side of the shutdown signal
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: watch::Receiver<Option<Termination>>,
}

impl ShutdownSignal {
    /// Resolves once shutdown has been triggered
    pub async fn cancelled(&mut self) {
        loop {
            if self.rx.borrow_and_update().is_some() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // every trigger handle is gone
                return;
            }
        }
    }

    /// Drive `fut` to completion unless shutdown comes first
    pub async fn run_until_cancelled<F: Future>(&mut self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            out = fut => Some(out),
        }
    }
}
