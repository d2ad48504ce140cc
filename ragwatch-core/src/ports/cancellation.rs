// ragwatch-core/src/ports/cancellation.rs

use std::future::Future;

use tokio::sync::watch;

use crate::error::RagwatchError;

/// Cycle-wide cancellation signal, cloned into every in-flight fetch.
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

/// Owner side of a [`Cancellation`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl Cancellation {
    pub fn new() -> (CancelHandle, Cancellation) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, Cancellation { rx })
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Cancellation { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Pending forever if the
    /// handle is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Races `fut` against the signal; a fired signal wins and yields
    /// `RagwatchError::Cancelled`.
    pub async fn guard<F>(&self, fut: F) -> Result<F::Output, RagwatchError>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(RagwatchError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(RagwatchError::Cancelled),
            out = fut => Ok(out),
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::never()
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}
