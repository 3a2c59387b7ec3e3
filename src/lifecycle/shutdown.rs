//! Graceful shutdown state.
//!
//! # Design Decisions
//! - Shutdown is a latched flag: waiters created after the trigger resolve
//!   immediately
//! - OS signals and programmatic triggers take the same path

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::lifecycle::signals;

/// Latched shutdown flag shared by the server and its signal listener.
pub struct Shutdown {
    state: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self { state }
    }

    pub fn is_triggered(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once shutdown has been triggered, or when this coordinator
    /// is dropped.
    ///
    /// Suitable for `axum::serve(..).with_graceful_shutdown`.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut state = self.state.subscribe();
        async move {
            let _ = state.wait_for(|triggered| *triggered).await;
        }
    }

    /// Latch the flag. Later calls are no-ops.
    pub fn trigger(&self) {
        if !self.state.send_replace(true) {
            tracing::info!("Shutdown triggered");
        }
    }

    /// Trigger shutdown on the first SIGINT or SIGTERM.
    pub fn trigger_on_signal(self: &Arc<Self>) -> JoinHandle<()> {
        let shutdown = Arc::clone(self);
        tokio::spawn(async move {
            signals::wait_for_signal().await;
            shutdown.trigger();
        })
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
