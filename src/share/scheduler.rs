use std::time::Duration;

use anyhow::{bail, Result};
use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::Urgency;
use crate::tracking::ShareDeps;

/// Owns the recurring auto-share timer. Idle when no handle is armed; at most
/// one handle exists at any time.
pub struct ShareScheduler {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl Default for ShareScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ShareScheduler {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Arms the recurring timer. The caller performs the immediate first
    /// share; the first tick fires one full period from now. Rejected while
    /// already active.
    pub(crate) fn start(&mut self, interval_min: u32, deps: ShareDeps) -> Result<()> {
        if self.handle.is_some() {
            bail!("auto-share already running");
        }
        if interval_min == 0 {
            bail!("auto-share interval must be greater than zero");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(share_loop(interval_min, deps, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        info!("auto-share armed: every {interval_min} min");
        Ok(())
    }

    /// Cancels the armed timer, if any. Idempotent from any state.
    pub fn stop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("auto-share timer cancelled");
        }
    }
}

async fn share_loop(interval_min: u32, deps: ShareDeps, cancel_token: CancellationToken) {
    let period = Duration::from_secs(u64::from(interval_min) * 60);
    let mut ticker = time::interval_at(time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A tick while tracking is paused keeps the timer running but
                // produces no dispatch.
                let snapshot = {
                    let state = deps.state.lock().await;
                    if state.is_tracking() {
                        state.position.map(|position| (position, state.channel_mode))
                    } else {
                        debug!("auto-share tick skipped: not tracking");
                        None
                    }
                };
                if let Some((position, mode)) = snapshot {
                    deps.share(position, mode, Urgency::Normal);
                }
            }
            _ = cancel_token.cancelled() => {
                debug!("auto-share loop shutting down");
                break;
            }
        }
    }
}
