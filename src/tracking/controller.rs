use std::sync::Arc;

use anyhow::{bail, Result};
use log::{info, warn};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::contacts::ContactRegistry;
use crate::geo::GeoBridge;
use crate::models::{ChannelMode, Position, ShareEvent, Urgency};
use crate::safety::SafetyEstimator;
use crate::share::{Dispatcher, EmergencyChannel, ShareHistory, ShareScheduler};

use super::state::TrackingState;
use super::watcher::position_loop;

const SHARE_EVENT_CAPACITY: usize = 32;

/// Everything a dispatch needs besides the controller itself; cloned into the
/// watcher and scheduler tasks.
#[derive(Clone)]
pub(crate) struct ShareDeps {
    pub state: Arc<Mutex<TrackingState>>,
    pub contacts: Arc<ContactRegistry>,
    pub history: Arc<ShareHistory>,
    pub dispatcher: Dispatcher,
    pub estimator: Arc<dyn SafetyEstimator>,
    pub state_tx: watch::Sender<TrackingState>,
    pub share_tx: broadcast::Sender<ShareEvent>,
}

impl ShareDeps {
    /// Applies a fresh fix: store it, rescore it, and auto-share when both
    /// tracking and periodic sharing are active. The position is snapshotted
    /// under the lock so the dispatch for fix N always carries fix N.
    pub(crate) async fn apply_fix(&self, position: Position) {
        let auto_share = {
            let mut state = self.state.lock().await;
            state.position = Some(position);
            state.safety_score = Some(self.estimator.estimate(&position));
            let auto = state.is_tracking() && state.is_auto_sharing;
            let mode = state.channel_mode;
            let _ = self.state_tx.send(state.clone());
            auto.then_some(mode)
        };
        if let Some(mode) = auto_share {
            self.share(position, mode, Urgency::Normal);
        }
    }

    /// One dispatch plus the bookkeeping every dispatch gets: exactly one
    /// history append and one event broadcast.
    pub(crate) fn share(
        &self,
        position: Position,
        mode: ChannelMode,
        urgency: Urgency,
    ) -> ShareEvent {
        let event = self.dispatcher.dispatch(
            position,
            mode,
            urgency,
            self.contacts.email_contacts(),
            self.contacts.phone_contacts(),
        );
        self.history.append(event.clone());
        let _ = self.share_tx.send(event.clone());
        event
    }

    /// Shares the current position if one is set; silent no-op otherwise.
    pub(crate) async fn share_current(&self, urgency: Urgency) -> Option<ShareEvent> {
        let (position, mode) = {
            let state = self.state.lock().await;
            (state.position, state.channel_mode)
        };
        Some(self.share(position?, mode, urgency))
    }
}

struct Watcher {
    handle: JoinHandle<()>,
    token: CancellationToken,
}

/// Top-level session coordinator. Owns the live position subscription and the
/// observable state; the scheduler owns the recurring timer, referenced here
/// so stopping the session can cancel it.
#[derive(Clone)]
pub struct TrackingController {
    deps: ShareDeps,
    geo: Arc<GeoBridge>,
    watcher: Arc<Mutex<Option<Watcher>>>,
    scheduler: Arc<Mutex<ShareScheduler>>,
}

impl TrackingController {
    pub fn new(
        geo: Arc<GeoBridge>,
        contacts: Arc<ContactRegistry>,
        history: Arc<ShareHistory>,
        dispatcher: Dispatcher,
        estimator: Arc<dyn SafetyEstimator>,
    ) -> Self {
        let (state_tx, _) = watch::channel(TrackingState::new());
        let (share_tx, _) = broadcast::channel(SHARE_EVENT_CAPACITY);
        Self {
            deps: ShareDeps {
                state: Arc::new(Mutex::new(TrackingState::new())),
                contacts,
                history,
                dispatcher,
                estimator,
                state_tx,
                share_tx,
            },
            geo,
            watcher: Arc::new(Mutex::new(None)),
            scheduler: Arc::new(Mutex::new(ShareScheduler::new())),
        }
    }

    /// Observable state snapshots, one per mutation.
    pub fn state_updates(&self) -> watch::Receiver<TrackingState> {
        self.deps.state_tx.subscribe()
    }

    /// Every recorded dispatch, in append order.
    pub fn share_events(&self) -> broadcast::Receiver<ShareEvent> {
        self.deps.share_tx.subscribe()
    }

    pub async fn get_state(&self) -> TrackingState {
        self.deps.state.lock().await.clone()
    }

    /// Scheduler post-condition check; Idle means no armed timer handle.
    pub async fn scheduler_is_idle(&self) -> bool {
        !self.scheduler.lock().await.is_active()
    }

    /// Starts live tracking: subscribes the position watcher, then requests
    /// an immediate one-shot fix. Any acquisition failure records the error
    /// and rolls the session fully back to Stopped.
    pub async fn start_tracking(&self) -> Result<TrackingState> {
        {
            let mut state = self.deps.state.lock().await;
            if state.is_tracking() {
                bail!("tracking already active");
            }
            state.begin_tracking();
            let _ = self.deps.state_tx.send(state.clone());
        }

        self.spawn_watcher().await;

        match self.geo.request_once().await {
            Ok(position) => {
                info!("tracking started");
                self.deps.apply_fix(position).await;
            }
            Err(err) => {
                warn!("tracking start failed: {err}");
                self.roll_back(err.to_string()).await;
                bail!("position unavailable: {err}");
            }
        }

        Ok(self.get_state().await)
    }

    /// Stops tracking: the scheduler first if armed, then this session's
    /// watcher. Idempotent.
    pub async fn stop_tracking(&self) -> TrackingState {
        self.stop_auto_share().await;
        self.cancel_watcher().await;
        {
            let mut state = self.deps.state.lock().await;
            state.stop();
            let _ = self.deps.state_tx.send(state.clone());
        }
        info!("tracking stopped");
        self.get_state().await
    }

    /// Map-pick intent; rejected while live tracking is active.
    pub async fn pick_location(&self, lat: f64, lng: f64) -> Result<()> {
        {
            let state = self.deps.state.lock().await;
            if state.is_tracking() {
                bail!("map picks are disabled while live tracking is active");
            }
        }
        let position = self.geo.from_map_pick(lat, lng);
        self.deps.apply_fix(position).await;
        Ok(())
    }

    pub async fn set_channel_mode(&self, mode: ChannelMode) {
        let mut state = self.deps.state.lock().await;
        state.channel_mode = mode;
        let _ = self.deps.state_tx.send(state.clone());
    }

    /// Interval changes are rejected while auto-share is running; stop it
    /// first.
    pub async fn set_share_interval(&self, minutes: u32) -> Result<()> {
        let mut state = self.deps.state.lock().await;
        if state.is_auto_sharing {
            bail!("stop auto-share before changing the interval");
        }
        state.share_interval_min = minutes;
        let _ = self.deps.state_tx.send(state.clone());
        Ok(())
    }

    /// Performs one immediate share, then arms the recurring timer. Requires
    /// a configured interval and an idle scheduler.
    pub async fn start_auto_share(&self) -> Result<()> {
        let (interval, position, mode) = {
            let state = self.deps.state.lock().await;
            (state.share_interval_min, state.position, state.channel_mode)
        };
        if interval == 0 {
            bail!("auto-share interval is not set");
        }

        {
            let mut scheduler = self.scheduler.lock().await;
            if scheduler.is_active() {
                bail!("auto-share already running");
            }
            if let Some(position) = position {
                self.deps.share(position, mode, Urgency::Normal);
            }
            scheduler.start(interval, self.deps.clone())?;
        }

        let mut state = self.deps.state.lock().await;
        state.is_auto_sharing = true;
        let _ = self.deps.state_tx.send(state.clone());
        Ok(())
    }

    /// Disarms the recurring timer. Idempotent.
    pub async fn stop_auto_share(&self) {
        self.scheduler.lock().await.stop();
        let mut state = self.deps.state.lock().await;
        if state.is_auto_sharing {
            state.is_auto_sharing = false;
            let _ = self.deps.state_tx.send(state.clone());
        }
    }

    /// Shares the current position over the selected channels, from either
    /// tracking state. Silent no-op when no fix has been captured yet.
    pub async fn share_now(&self, urgency: Urgency) -> Option<ShareEvent> {
        self.deps.share_current(urgency).await
    }

    /// One-shot panic action: emergency WhatsApp plus emergency SMS,
    /// regardless of the selected channel mode.
    pub async fn quick_emergency(&self) -> Option<ShareEvent> {
        self.deps.share_current(Urgency::QuickEmergency).await
    }

    /// Emergency-card action: single channel, static contact only.
    pub async fn share_to_emergency(
        &self,
        channel: EmergencyChannel,
        urgency: Urgency,
    ) -> Option<ShareEvent> {
        let (position, mode) = {
            let state = self.deps.state.lock().await;
            (state.position, state.channel_mode)
        };
        let event = self
            .deps
            .dispatcher
            .dispatch_to_emergency(position?, channel, urgency, mode);
        self.deps.history.append(event.clone());
        let _ = self.deps.share_tx.send(event.clone());
        Some(event)
    }

    /// Session teardown: releases the subscription handle and any armed
    /// timer.
    pub async fn shutdown(&self) {
        self.stop_auto_share().await;
        self.cancel_watcher().await;
    }

    async fn spawn_watcher(&self) {
        let mut slot = self.watcher.lock().await;
        // Guard against a stale handle from a prior start/stop cycle.
        if let Some(watcher) = slot.take() {
            watcher.token.cancel();
            watcher.handle.abort();
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(position_loop(
            self.geo.subscribe(),
            self.deps.clone(),
            self.scheduler.clone(),
            token.clone(),
        ));
        *slot = Some(Watcher { handle, token });
    }

    async fn cancel_watcher(&self) {
        if let Some(watcher) = self.watcher.lock().await.take() {
            watcher.token.cancel();
            watcher.handle.abort();
        }
    }

    async fn roll_back(&self, reason: String) {
        self.cancel_watcher().await;
        self.scheduler.lock().await.stop();
        let mut state = self.deps.state.lock().await;
        state.stop();
        state.is_auto_sharing = false;
        state.record_error(reason);
        let _ = self.deps.state_tx.send(state.clone());
    }
}
