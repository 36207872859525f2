//! Keep-alive supervisor
//!
//! # Architecture
//!
//! A dedicated Tokio task ticks at the configured rate and asks the
//! [`KeepAliveDeadlines`] what to do:
//!
//! ```text
//! ┌─────────────────────────┐
//! │  Keep-alive Task        │
//! │  (Tokio spawn)          │
//! │                         │
//! │  Every tick:            │
//! │  1. Check deadlines     │
//! │  2. Timeout ─────────────┼──> engine stop (abnormal)
//! │  3. Ping due ────────────┼──> engine send(Ping)
//! │  4. Repeat              │
//! └─────────────────────────┘
//! ```
//!
//! The task only exists while the connection is `Connected`; teardown sends
//! the shutdown signal and the task exits on its next tick.

use super::deadlines::{KeepAliveAction, KeepAliveDeadlines};
use crossbeam_channel::{Receiver, Sender};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Whether the supervisor should keep running after handling an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

/// Supervisor loop
///
/// `on_action` is only called for non-idle ticks.
pub async fn keep_alive_task<F, Fut>(
    tick_rate: Duration,
    deadlines: Arc<KeepAliveDeadlines>,
    on_action: F,
    shutdown_rx: Receiver<()>,
) where
    F: Fn(KeepAliveAction) -> Fut + Send,
    Fut: Future<Output = TickOutcome> + Send,
{
    let mut ticker = tokio::time::interval(tick_rate);
    // If we miss ticks due to slow processing, skip them rather than bursting
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    debug!("Keep-alive task started with tick rate: {:?}", tick_rate);

    loop {
        ticker.tick().await;

        match shutdown_rx.try_recv() {
            Ok(_) => {
                debug!("Keep-alive task received shutdown signal");
                break;
            }
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                debug!("Keep-alive shutdown channel disconnected");
                break;
            }
            Err(crossbeam_channel::TryRecvError::Empty) => {}
        }

        let action = deadlines.check();
        if action == KeepAliveAction::Idle {
            continue;
        }

        debug!("Keep-alive tick - {:?}", action);
        if on_action(action).await == TickOutcome::Stop {
            break;
        }
    }

    debug!("Keep-alive task exiting");
}

/// Handle to a running supervisor
pub struct KeepAliveHandle {
    shutdown_tx: Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl KeepAliveHandle {
    /// Signal the task to exit on its next tick
    pub fn shutdown(self) {
        let _ = self.shutdown_tx.try_send(());
        drop(self.handle);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawn the supervisor task
pub fn spawn_keep_alive<F, Fut>(
    tick_rate: Duration,
    deadlines: Arc<KeepAliveDeadlines>,
    on_action: F,
) -> KeepAliveHandle
where
    F: Fn(KeepAliveAction) -> Fut + Send + 'static,
    Fut: Future<Output = TickOutcome> + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

    let handle = tokio::spawn(async move {
        keep_alive_task(tick_rate, deadlines, on_action, shutdown_rx).await;
    });

    KeepAliveHandle { shutdown_tx, handle }
}
