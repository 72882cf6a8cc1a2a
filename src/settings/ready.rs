//! One-shot readiness gate between startup migrations and request handling.
//!
//! Handlers call [`ReadinessGate::wait`] before touching settings. The wait is
//! a cooperative suspension on a watch channel: dropping the waiting future
//! (e.g. a cancelled request) leaves the gate untouched.

use tokio::sync::watch;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum GateState {
    Pending,
    Open,
    Failed(String),
}

/// Signals the outcome of startup. Consumed on use so the gate fires once.
#[derive(Debug)]
pub struct GateOpener {
    tx: watch::Sender<GateState>,
}

/// Cloneable handle that request handlers wait on.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    rx: watch::Receiver<GateState>,
}

/// Create a closed gate and the opener that controls it.
pub fn readiness_gate() -> (GateOpener, ReadinessGate) {
    let (tx, rx) = watch::channel(GateState::Pending);
    (GateOpener { tx }, ReadinessGate { rx })
}

impl GateOpener {
    pub fn open(self) {
        tracing::info!("settings ready");
        self.tx.send_replace(GateState::Open);
    }

    /// Keep the gate shut for the lifetime of the process.
    pub fn fail(self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!(%reason, "settings unavailable");
        self.tx.send_replace(GateState::Failed(reason));
    }
}

impl ReadinessGate {
    /// Wait until startup has finished.
    ///
    /// Returns [`Error::NotReady`] if startup failed or the opener was dropped
    /// without signalling.
    pub async fn wait(&self) -> Result<()> {
        let mut rx = self.rx.clone();
        let state = rx
            .wait_for(|state| *state != GateState::Pending)
            .await
            .map_err(|_| Error::NotReady("startup was abandoned".into()))?
            .clone();

        match state {
            GateState::Open => Ok(()),
            GateState::Failed(reason) => Err(Error::NotReady(reason)),
            GateState::Pending => Err(Error::NotReady("startup still pending".into())),
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.rx.borrow() == GateState::Open
    }
}
