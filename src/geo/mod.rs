use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{debug, warn};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::models::Position;

/// Fixes older than this are discarded (mirrors the web geolocation
/// `maximumAge` option).
pub const MAX_FIX_AGE: Duration = Duration::from_secs(10);

/// How long a one-shot fix request waits before giving up.
pub const FIX_TIMEOUT: Duration = Duration::from_secs(5);

const FEED_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub enum GeoSignal {
    Fix { position: Position, at: Instant },
    /// The platform reported an unrecoverable error; the feed terminates
    /// with this signal.
    Unavailable(String),
}

/// Bridge between the webview's geolocation callbacks and the core.
///
/// The frontend forwards every `watchPosition` result here; the core consumes
/// them as a broadcast feed, either continuously (the tracking watcher) or as
/// a one-shot request with a deadline.
pub struct GeoBridge {
    tx: broadcast::Sender<GeoSignal>,
}

impl Default for GeoBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoBridge {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    pub fn report_fix(&self, lat: f64, lng: f64) {
        let signal = GeoSignal::Fix {
            position: Position::new(lat, lng),
            at: Instant::now(),
        };
        if self.tx.send(signal).is_err() {
            debug!("position fix dropped: no active subscribers");
        }
    }

    pub fn report_unavailable(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("geolocation unavailable: {reason}");
        let _ = self.tx.send(GeoSignal::Unavailable(reason));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GeoSignal> {
        self.tx.subscribe()
    }

    /// Waits for the next fresh fix, failing after [`FIX_TIMEOUT`] or when the
    /// platform reports the feed unavailable.
    pub async fn request_once(&self) -> Result<Position> {
        let mut rx = self.subscribe();
        let deadline = Instant::now() + FIX_TIMEOUT;
        loop {
            let signal = tokio::time::timeout_at(deadline, rx.recv())
                .await
                .map_err(|_| anyhow!("position fix timed out"))?;
            match signal {
                Ok(GeoSignal::Fix { position, at }) => {
                    if at.elapsed() <= MAX_FIX_AGE {
                        return Ok(position);
                    }
                    debug!("ignoring stale fix while waiting for a fresh one");
                }
                Ok(GeoSignal::Unavailable(reason)) => return Err(anyhow!(reason)),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(anyhow!("geolocation feed closed"));
                }
            }
        }
    }

    /// Converts a user-picked map coordinate into a regular fix. Only the
    /// presentation layer restricts when picks are allowed.
    pub fn from_map_pick(&self, lat: f64, lng: f64) -> Position {
        Position::new(lat, lng)
    }
}
