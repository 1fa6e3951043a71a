use std::sync::Arc;

use tokio::sync::watch;

/// Cancellation flag shared between a view and the fetches it started.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called (immediately if it already was).
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this can't observe a closed channel
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Outcome of work run inside a view scope.
#[derive(Debug, PartialEq)]
pub enum Scoped<T> {
    Done(T),
    /// The view went away first; any late result was discarded.
    Cancelled,
}

/// Lifetime of one comparison view. Fetches started through it are discarded
/// once the scope is closed or dropped.
#[derive(Debug, Default)]
pub struct ViewScope {
    token: CancelToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run a blocking fetch on the tokio blocking pool, tied to this scope.
    ///
    /// The request itself can't be interrupted: on cancellation it keeps
    /// running in the background and its result is dropped on arrival.
    pub async fn run_blocking<T, F>(&self, f: F) -> Scoped<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let token = self.token.clone();
        if token.is_cancelled() {
            return Scoped::Cancelled;
        }

        let task = tokio::task::spawn_blocking(f);
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                log::debug!("View closed before fetch completed, discarding result");
                Scoped::Cancelled
            }
            joined = task => match joined {
                Ok(_) if token.is_cancelled() => Scoped::Cancelled,
                Ok(value) => Scoped::Done(value),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => Scoped::Cancelled,
            },
        }
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_completes_when_open() {
        let scope = ViewScope::new();
        let out = scope.run_blocking(|| 7).await;
        assert_eq!(out, Scoped::Done(7));
    }

    #[tokio::test]
    async fn test_closed_before_start() {
        let scope = ViewScope::new();
        scope.close();
        let out = scope.run_blocking(|| 7).await;
        assert_eq!(out, Scoped::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_while_in_flight() {
        let scope = ViewScope::new();
        let token = scope.token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let out = scope
            .run_blocking(|| {
                std::thread::sleep(Duration::from_millis(500));
                "late result"
            })
            .await;
        assert_eq!(out, Scoped::Cancelled);
        assert!(scope.is_closed());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_immediately_when_set() {
        let token = CancelToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .unwrap();
    }

    #[test]
    fn test_drop_cancels() {
        let scope = ViewScope::new();
        let token = scope.token();
        assert!(!token.is_cancelled());
        drop(scope);
        assert!(token.is_cancelled());
    }
}
