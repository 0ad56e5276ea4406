use tokio::sync::watch;

/// Held by the surface; flips the shared flag a running fetch watches.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Held by the fetch. Dropping the matching handle also counts as cancellation.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&mut self) {
        // An error means the handle is gone, which is treated the same way.
        let _ = self.rx.wait_for(|cancelled| *cancelled).await;
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}
