use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::geo::{GeoSignal, MAX_FIX_AGE};
use crate::share::ShareScheduler;

use super::controller::ShareDeps;

/// Continuous position feed for one tracking session. Fresh fixes flow into
/// the session state; an `Unavailable` signal is terminal (the platform
/// reports it at most once), so the loop rolls the session back to Stopped
/// and exits.
pub(crate) async fn position_loop(
    mut feed: broadcast::Receiver<GeoSignal>,
    deps: ShareDeps,
    scheduler: Arc<Mutex<ShareScheduler>>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            signal = feed.recv() => match signal {
                Ok(GeoSignal::Fix { position, at }) => {
                    if at.elapsed() > MAX_FIX_AGE {
                        debug!("dropping stale fix");
                        continue;
                    }
                    deps.apply_fix(position).await;
                }
                Ok(GeoSignal::Unavailable(reason)) => {
                    warn!("position feed failed: {reason}");
                    scheduler.lock().await.stop();
                    let mut state = deps.state.lock().await;
                    state.stop();
                    state.is_auto_sharing = false;
                    state.record_error(reason);
                    let _ = deps.state_tx.send(state.clone());
                    break;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("position feed lagged, skipped {skipped} fixes");
                }
                Err(RecvError::Closed) => break,
            },
            _ = cancel_token.cancelled() => {
                info!("position watcher shutting down");
                break;
            }
        }
    }
}
