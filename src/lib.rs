pub mod contacts;
pub mod geo;
pub mod models;
pub mod safety;
pub mod share;
pub mod tracking;

use std::sync::Arc;

use contacts::commands::{
    add_email_contact, add_phone_contact, get_contacts, get_emergency_contact, remove_contact,
};
use contacts::ContactRegistry;
use geo::GeoBridge;
use log::info;
use safety::RandomEstimator;
use share::{Dispatcher, ShareHistory, SystemOpener};
use tauri::{Emitter, Manager};
use tracking::commands::{
    get_share_history, get_tracking_state, pick_location, quick_emergency, report_position,
    report_position_unavailable, set_channel_mode, set_share_interval, share_now,
    share_to_emergency_sms, share_to_emergency_whatsapp, start_auto_share, start_tracking,
    stop_auto_share, stop_tracking,
};
use tracking::TrackingController;

pub(crate) struct AppState {
    pub(crate) tracking: TrackingController,
    pub(crate) contacts: Arc<ContactRegistry>,
    pub(crate) history: Arc<ShareHistory>,
    pub(crate) geo: Arc<GeoBridge>,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Guardian starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let contacts = Arc::new(ContactRegistry::new());
            let history = Arc::new(ShareHistory::new());
            let geo = Arc::new(GeoBridge::new());
            let dispatcher = Dispatcher::new(Arc::new(SystemOpener));
            let tracking = TrackingController::new(
                geo.clone(),
                contacts.clone(),
                history.clone(),
                dispatcher,
                Arc::new(RandomEstimator),
            );

            // Forward observable core state to the webview as events; the
            // presentation layer subscribes instead of polling.
            let app_handle = app.handle().clone();
            let mut state_rx = tracking.state_updates();
            tauri::async_runtime::spawn(async move {
                while state_rx.changed().await.is_ok() {
                    let snapshot = state_rx.borrow_and_update().clone();
                    let _ = app_handle.emit("tracking-state-changed", snapshot);
                }
            });

            let app_handle = app.handle().clone();
            let mut share_rx = tracking.share_events();
            tauri::async_runtime::spawn(async move {
                while let Ok(event) = share_rx.recv().await {
                    let _ = app_handle.emit("share-recorded", event);
                }
            });

            app.manage(AppState {
                tracking,
                contacts,
                history,
                geo,
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            get_tracking_state,
            start_tracking,
            stop_tracking,
            pick_location,
            report_position,
            report_position_unavailable,
            share_now,
            quick_emergency,
            share_to_emergency_whatsapp,
            share_to_emergency_sms,
            set_channel_mode,
            set_share_interval,
            start_auto_share,
            stop_auto_share,
            add_email_contact,
            add_phone_contact,
            remove_contact,
            get_contacts,
            get_emergency_contact,
            get_share_history,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| {
            // The watcher task and any armed timer are live platform
            // resources; release them before the process goes away.
            if let tauri::RunEvent::ExitRequested { .. } = event {
                let state = app_handle.state::<AppState>();
                tauri::async_runtime::block_on(state.tracking.shutdown());
            }
        });
}
