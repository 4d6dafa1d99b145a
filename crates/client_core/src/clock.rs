//! Time source and the cancellable delay used to pace animations.
//!
//! Everything that waits goes through [`Clock`], so a paused tokio runtime
//! drives the whole client in virtual time.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::{sync::watch, time::Instant};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Tokio's timer. Honors `tokio::time::pause`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

pub fn default_clock() -> Arc<dyn Clock> {
    Arc::new(TokioClock)
}

/// One-way cancellation flag shared between an owner and the tasks it paces.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives as long as any token clone, so this cannot close early.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("delay cancelled")]
pub struct Cancelled;

#[derive(Clone)]
pub struct ClockedDelay {
    clock: Arc<dyn Clock>,
    cancel: CancelToken,
}

impl ClockedDelay {
    pub fn new(clock: Arc<dyn Clock>, cancel: CancelToken) -> Self {
        Self { clock, cancel }
    }

    pub async fn wait(&self, duration: Duration) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Cancelled),
            _ = self.clock.sleep(duration) => Ok(()),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }
}
