use tauri::State;

use crate::models::{ChannelMode, ShareEvent, Urgency};
use crate::share::EmergencyChannel;
use crate::tracking::TrackingState;
use crate::AppState;

#[tauri::command]
pub async fn get_tracking_state(state: State<'_, AppState>) -> Result<TrackingState, String> {
    Ok(state.tracking.get_state().await)
}

#[tauri::command]
pub async fn start_tracking(state: State<'_, AppState>) -> Result<TrackingState, String> {
    state
        .tracking
        .start_tracking()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn stop_tracking(state: State<'_, AppState>) -> Result<TrackingState, String> {
    Ok(state.tracking.stop_tracking().await)
}

#[tauri::command]
pub async fn pick_location(state: State<'_, AppState>, lat: f64, lng: f64) -> Result<(), String> {
    state
        .tracking
        .pick_location(lat, lng)
        .await
        .map_err(|e| e.to_string())
}

/// Intake for the webview's `watchPosition` success callback.
#[tauri::command]
pub fn report_position(state: State<'_, AppState>, lat: f64, lng: f64) {
    state.geo.report_fix(lat, lng);
}

/// Intake for the webview's geolocation error callback (no capability,
/// permission denied, fix failure).
#[tauri::command]
pub fn report_position_unavailable(state: State<'_, AppState>, reason: String) {
    state.geo.report_unavailable(reason);
}

#[tauri::command]
pub async fn share_now(
    state: State<'_, AppState>,
    urgency: Urgency,
) -> Result<Option<ShareEvent>, String> {
    Ok(state.tracking.share_now(urgency).await)
}

#[tauri::command]
pub async fn quick_emergency(state: State<'_, AppState>) -> Result<Option<ShareEvent>, String> {
    Ok(state.tracking.quick_emergency().await)
}

#[tauri::command]
pub async fn share_to_emergency_whatsapp(
    state: State<'_, AppState>,
    emergency: bool,
) -> Result<Option<ShareEvent>, String> {
    let urgency = if emergency {
        Urgency::Emergency
    } else {
        Urgency::Normal
    };
    Ok(state
        .tracking
        .share_to_emergency(EmergencyChannel::Whatsapp, urgency)
        .await)
}

#[tauri::command]
pub async fn share_to_emergency_sms(
    state: State<'_, AppState>,
    emergency: bool,
) -> Result<Option<ShareEvent>, String> {
    let urgency = if emergency {
        Urgency::Emergency
    } else {
        Urgency::Normal
    };
    Ok(state
        .tracking
        .share_to_emergency(EmergencyChannel::Sms, urgency)
        .await)
}

#[tauri::command]
pub async fn set_channel_mode(state: State<'_, AppState>, mode: ChannelMode) -> Result<(), String> {
    state.tracking.set_channel_mode(mode).await;
    Ok(())
}

#[tauri::command]
pub async fn set_share_interval(state: State<'_, AppState>, minutes: u32) -> Result<(), String> {
    state
        .tracking
        .set_share_interval(minutes)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn start_auto_share(state: State<'_, AppState>) -> Result<(), String> {
    state
        .tracking
        .start_auto_share()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn stop_auto_share(state: State<'_, AppState>) -> Result<(), String> {
    state.tracking.stop_auto_share().await;
    Ok(())
}

/// Newest-first display window over the dispatch history.
#[tauri::command]
pub fn get_share_history(state: State<'_, AppState>) -> Vec<ShareEvent> {
    state.history.recent()
}
