use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

use crate::{Error, Result};

/// Caller-supplied signal that aborts storage and summarization calls.
///
/// Built on the same `watch` channel the scheduler uses for shutdown, so a
/// shutdown receiver converts directly. A cancelled call returns
/// [`Error::Cancelled`], which is never confused with a database failure.
#[derive(Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

/// Sending half of a [`Cancellation`]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, Cancellation { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        // Receivers may all be gone already; nothing left to cancel then.
        let _ = self.tx.send(true);
    }
}

impl From<watch::Receiver<bool>> for Cancellation {
    fn from(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }
}

impl Cancellation {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Pends forever if the sender is dropped
    /// without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Drive `fut` unless cancellation fires first
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Error::Cancelled),
            result = fut => result,
        }
    }

    /// Like [`run`](Self::run) with an upper bound on how long `fut` may take
    pub async fn run_with_timeout<F, T>(&self, limit: Duration, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.run(async {
            tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| Error::Timeout(limit))?
        })
        .await
    }
}
