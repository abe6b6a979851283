//! Integration tests for the tracking session state machine: start/stop
//! cycles, auto-share scheduling, and dispatch recording.
//!
//! Time-sensitive tests run on a paused tokio clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use guardian_lib::contacts::ContactRegistry;
use guardian_lib::geo::GeoBridge;
use guardian_lib::models::{ChannelMode, Position, Urgency};
use guardian_lib::safety::SafetyEstimator;
use guardian_lib::share::{Dispatcher, EmergencyChannel, LinkOpener, ShareHistory};
use guardian_lib::tracking::{TrackingController, TrackingStatus};

struct RecordingOpener(Mutex<Vec<String>>);

impl RecordingOpener {
    fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(Vec::new())))
    }

    fn opened(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl LinkOpener for RecordingOpener {
    fn open(&self, url: &str) {
        self.0.lock().unwrap().push(url.to_string());
    }
}

struct FixedEstimator(u8);

impl SafetyEstimator for FixedEstimator {
    fn estimate(&self, _position: &Position) -> u8 {
        self.0
    }
}

struct Harness {
    controller: TrackingController,
    geo: Arc<GeoBridge>,
    contacts: Arc<ContactRegistry>,
    history: Arc<ShareHistory>,
    opener: Arc<RecordingOpener>,
}

fn harness() -> Harness {
    let geo = Arc::new(GeoBridge::new());
    let contacts = Arc::new(ContactRegistry::new());
    let history = Arc::new(ShareHistory::new());
    let opener = RecordingOpener::new();
    let controller = TrackingController::new(
        geo.clone(),
        contacts.clone(),
        history.clone(),
        Dispatcher::new(opener.clone()),
        Arc::new(FixedEstimator(50)),
    );
    Harness {
        controller,
        geo,
        contacts,
        history,
        opener,
    }
}

/// Starts tracking while feeding the one-shot fix it waits for.
async fn start_with_fix(h: &Harness, lat: f64, lng: f64) {
    let (result, _) = tokio::join!(h.controller.start_tracking(), async {
        tokio::task::yield_now().await;
        h.geo.report_fix(lat, lng);
    });
    result.expect("tracking should start");
}

/// Lets spawned tasks (watcher, scheduler) catch up with the clock.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn start_tracking_captures_fix_and_score() {
    let h = harness();
    start_with_fix(&h, 28.61, 77.2).await;

    let state = h.controller.get_state().await;
    assert_eq!(state.status, TrackingStatus::Tracking);
    assert_eq!(state.position, Some(Position::new(28.61, 77.2)));
    assert_eq!(state.safety_score, Some(50));
    assert!(state.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn second_start_is_rejected() {
    let h = harness();
    start_with_fix(&h, 28.61, 77.2).await;

    let err = h.controller.start_tracking().await.unwrap_err();
    assert!(err.to_string().contains("already active"));
    assert_eq!(h.controller.get_state().await.status, TrackingStatus::Tracking);
}

#[tokio::test(start_paused = true)]
async fn failed_one_shot_rolls_back_to_stopped() {
    let h = harness();
    let (result, _) = tokio::join!(h.controller.start_tracking(), async {
        tokio::task::yield_now().await;
        h.geo.report_unavailable("permission denied");
    });

    assert!(result.is_err());
    let state = h.controller.get_state().await;
    assert_eq!(state.status, TrackingStatus::Stopped);
    assert_eq!(state.last_error.as_deref(), Some("permission denied"));
}

#[tokio::test(start_paused = true)]
async fn successful_restart_clears_the_error() {
    let h = harness();
    let (result, _) = tokio::join!(h.controller.start_tracking(), async {
        tokio::task::yield_now().await;
        h.geo.report_unavailable("permission denied");
    });
    assert!(result.is_err());

    start_with_fix(&h, 28.61, 77.2).await;
    assert!(h.controller.get_state().await.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn watcher_updates_position_on_each_fix() {
    let h = harness();
    start_with_fix(&h, 28.61, 77.2).await;

    h.geo.report_fix(28.62, 77.21);
    settle().await;

    let state = h.controller.get_state().await;
    assert_eq!(state.position, Some(Position::new(28.62, 77.21)));
    // No auto-share armed, so no dispatch happened for either fix.
    assert!(h.history.is_empty());
}

#[tokio::test(start_paused = true)]
async fn watcher_drops_fixes_older_than_the_staleness_ceiling() {
    let h = harness();
    start_with_fix(&h, 28.61, 77.2).await;

    // The fix is stamped now, but the watcher only polls it after the
    // clock has moved past the 10 s ceiling, so it must be discarded.
    h.geo.report_fix(12.97, 77.59);
    tokio::time::advance(Duration::from_secs(11)).await;
    settle().await;
    let state = h.controller.get_state().await;
    assert_eq!(state.position, Some(Position::new(28.61, 77.2)));
    assert_eq!(state.status, TrackingStatus::Tracking);

    // A fresh fix on the same feed still lands.
    h.geo.report_fix(12.97, 77.59);
    settle().await;
    let state = h.controller.get_state().await;
    assert_eq!(state.position, Some(Position::new(12.97, 77.59)));
}

#[tokio::test(start_paused = true)]
async fn stop_tracking_forces_scheduler_idle() {
    let h = harness();
    start_with_fix(&h, 28.61, 77.2).await;

    h.controller.set_share_interval(5).await.unwrap();
    h.controller.start_auto_share().await.unwrap();
    settle().await;
    assert!(!h.controller.scheduler_is_idle().await);

    h.controller.stop_tracking().await;
    let state = h.controller.get_state().await;
    assert_eq!(state.status, TrackingStatus::Stopped);
    assert!(!state.is_auto_sharing);
    assert!(h.controller.scheduler_is_idle().await);
}

#[tokio::test(start_paused = true)]
async fn auto_share_dispatches_immediately_then_per_period() {
    let h = harness();
    start_with_fix(&h, 28.61, 77.2).await;

    h.controller.set_share_interval(5).await.unwrap();
    h.controller.start_auto_share().await.unwrap();
    settle().await;
    assert_eq!(h.history.len(), 1, "one immediate dispatch");

    tokio::time::advance(Duration::from_secs(299)).await;
    settle().await;
    assert_eq!(h.history.len(), 1, "nothing before the period elapses");

    tokio::time::advance(Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(h.history.len(), 2, "one dispatch per period");

    // Stopping tracking before the next tick suppresses that tick.
    h.controller.stop_tracking().await;
    tokio::time::advance(Duration::from_secs(300)).await;
    settle().await;
    assert_eq!(h.history.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn auto_share_tick_is_noop_while_stopped() {
    let h = harness();
    h.controller.pick_location(28.61, 77.2).await.unwrap();
    h.controller.set_share_interval(1).await.unwrap();
    h.controller.start_auto_share().await.unwrap();
    settle().await;
    assert_eq!(h.history.len(), 1, "immediate share still happens");

    tokio::time::advance(Duration::from_secs(120)).await;
    settle().await;
    // The timer keeps running but ticks produce no dispatch while Stopped.
    assert_eq!(h.history.len(), 1);
    assert!(!h.controller.scheduler_is_idle().await);

    h.controller.stop_auto_share().await;
    assert!(h.controller.scheduler_is_idle().await);
}

#[tokio::test(start_paused = true)]
async fn starting_auto_share_twice_is_rejected() {
    let h = harness();
    h.controller.pick_location(28.61, 77.2).await.unwrap();
    h.controller.set_share_interval(5).await.unwrap();
    h.controller.start_auto_share().await.unwrap();
    settle().await;

    let err = h.controller.start_auto_share().await.unwrap_err();
    assert!(err.to_string().contains("already running"));
    assert_eq!(h.history.len(), 1, "the rejected start dispatched nothing");
}

#[tokio::test(start_paused = true)]
async fn interval_change_is_rejected_while_sharing() {
    let h = harness();
    h.controller.pick_location(28.61, 77.2).await.unwrap();
    h.controller.set_share_interval(5).await.unwrap();
    h.controller.start_auto_share().await.unwrap();
    settle().await;

    assert!(h.controller.set_share_interval(15).await.is_err());
    h.controller.stop_auto_share().await;
    assert!(h.controller.set_share_interval(15).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn fixes_trigger_dispatch_while_tracking_and_sharing() {
    let h = harness();
    start_with_fix(&h, 28.61, 77.2).await;
    h.controller.set_share_interval(5).await.unwrap();
    h.controller.start_auto_share().await.unwrap();
    settle().await;
    let before = h.history.len();

    h.geo.report_fix(28.63, 77.22);
    settle().await;

    assert_eq!(h.history.len(), before + 1);
    let latest = &h.history.recent()[0];
    assert_eq!(latest.position, Position::new(28.63, 77.22));
    assert_eq!(latest.urgency, Urgency::Normal);
}

#[tokio::test(start_paused = true)]
async fn share_now_without_position_is_silent() {
    let h = harness();
    assert!(h.controller.share_now(Urgency::Normal).await.is_none());
    assert!(h.history.is_empty());
    assert!(h.opener.opened().is_empty());
}

#[tokio::test(start_paused = true)]
async fn empty_registry_both_mode_reaches_only_whatsapp() {
    let h = harness();
    start_with_fix(&h, 28.61, 77.2).await;

    let event = h.controller.share_now(Urgency::Normal).await.unwrap();
    assert!(event.email_contacts.is_empty());
    assert!(event.phone_contacts.is_empty());
    assert!(event.whatsapp_used);

    let opened = h.opener.opened();
    assert_eq!(opened.len(), 1);
    assert!(opened[0].starts_with("https://wa.me/"));
    assert_eq!(h.history.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn quick_emergency_ignores_channel_mode() {
    let h = harness();
    h.controller.pick_location(28.61, 77.2).await.unwrap();
    h.controller.set_channel_mode(ChannelMode::Email).await;

    let event = h.controller.quick_emergency().await.unwrap();
    assert_eq!(event.urgency, Urgency::QuickEmergency);
    assert!(event.whatsapp_used);
    assert_eq!(event.phone_contacts.len(), 1);

    let opened = h.opener.opened();
    assert_eq!(opened.len(), 2);
    assert!(opened[0].starts_with("https://wa.me/"));
    assert!(opened[1].starts_with("sms:"));
}

#[tokio::test(start_paused = true)]
async fn emergency_card_actions_work_from_either_state() {
    let h = harness();
    // No position yet: silent no-op.
    assert!(h
        .controller
        .share_to_emergency(EmergencyChannel::Whatsapp, Urgency::Normal)
        .await
        .is_none());

    h.controller.pick_location(28.61, 77.2).await.unwrap();
    let event = h
        .controller
        .share_to_emergency(EmergencyChannel::Whatsapp, Urgency::Emergency)
        .await
        .unwrap();
    assert!(event.whatsapp_used);
    assert_eq!(event.urgency, Urgency::Emergency);
    assert_eq!(h.history.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn map_picks_are_rejected_while_tracking() {
    let h = harness();
    start_with_fix(&h, 28.61, 77.2).await;

    assert!(h.controller.pick_location(12.97, 77.59).await.is_err());
    assert_eq!(
        h.controller.get_state().await.position,
        Some(Position::new(28.61, 77.2))
    );
}

#[tokio::test(start_paused = true)]
async fn registry_contacts_flow_into_dispatch() {
    let h = harness();
    h.contacts.add_email("A", "a@example.com").unwrap();
    h.contacts.add_phone("B", "+15551234567").unwrap();
    h.controller.pick_location(28.61, 77.2).await.unwrap();

    let event = h.controller.share_now(Urgency::Emergency).await.unwrap();
    assert_eq!(event.email_contacts.len(), 1);
    assert_eq!(event.phone_contacts.len(), 1);
    assert!(event.whatsapp_used);
    assert_eq!(h.opener.opened().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn history_timestamps_are_monotonic() {
    let h = harness();
    h.controller.pick_location(28.61, 77.2).await.unwrap();

    for _ in 0..5 {
        h.controller.share_now(Urgency::Normal).await.unwrap();
    }

    let all = h.history.all();
    assert_eq!(all.len(), 5);
    for pair in all.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
}

#[tokio::test(start_paused = true)]
async fn feed_failure_stops_the_session_once() {
    let h = harness();
    start_with_fix(&h, 28.61, 77.2).await;
    h.controller.set_share_interval(5).await.unwrap();
    h.controller.start_auto_share().await.unwrap();
    settle().await;

    h.geo.report_unavailable("position unavailable");
    settle().await;

    let state = h.controller.get_state().await;
    assert_eq!(state.status, TrackingStatus::Stopped);
    assert!(!state.is_auto_sharing);
    assert_eq!(state.last_error.as_deref(), Some("position unavailable"));
    assert!(h.controller.scheduler_is_idle().await);
}

#[tokio::test(start_paused = true)]
async fn shutdown_releases_watcher_and_timer() {
    let h = harness();
    start_with_fix(&h, 28.61, 77.2).await;
    h.controller.set_share_interval(5).await.unwrap();
    h.controller.start_auto_share().await.unwrap();
    settle().await;

    h.controller.shutdown().await;
    assert!(h.controller.scheduler_is_idle().await);

    // A fix after shutdown no longer reaches the session.
    let before = h.controller.get_state().await.position;
    h.geo.report_fix(12.97, 77.59);
    settle().await;
    assert_eq!(h.controller.get_state().await.position, before);
}
