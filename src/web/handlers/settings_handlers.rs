// src/web/handlers/settings_handlers.rs
use rocket::serde::json::Json;
use rocket::State;

use crate::app_log;
use crate::core::{SettingsStore, UserSettings};
use crate::web::handlers::{internal_error, ApiError};
use crate::web::types::*;

/// Settings in effect, with API keys masked
pub async fn get_settings_handler(
    store: &State<SettingsStore>,
) -> Result<Json<DataResponse<SettingsData>>, ApiError> {
    let settings = store
        .load()
        .await
        .map_err(|e| internal_error("Failed to load settings", &e))?;

    Ok(Json(DataResponse::success(
        "Current settings".to_string(),
        SettingsData {
            ready: settings.is_ready(),
            settings: settings.masked(),
            has_config: store.has_config(),
        },
    )))
}

/// Merge the given fields into the saved settings; absent or blank keys are kept
pub async fn update_settings_handler(
    request: Json<UpdateSettingsRequest>,
    store: &State<SettingsStore>,
) -> Result<Json<ActionResponse>, ApiError> {
    let request = request.into_inner();
    let mut settings: UserSettings = store
        .load_saved()
        .await
        .map_err(|e| internal_error("Failed to load settings", &e))?;

    if let Some(key) = request.openai_api_key.filter(|k| !k.trim().is_empty()) {
        settings.openai_api_key = key.trim().to_string();
    }
    if let Some(key) = request.gemini_api_key.filter(|k| !k.trim().is_empty()) {
        settings.gemini_api_key = key.trim().to_string();
    }
    if let Some(provider) = request.selected_model {
        settings.selected_model = provider;
    }

    store
        .save(&settings)
        .await
        .map_err(|e| internal_error("Failed to save settings", &e))?;

    let mut response = ActionResponse::success(
        format!("Settings saved, using {}", settings.selected_model),
        "updated".to_string(),
    );
    if !settings.is_ready() {
        response = response.with_next_actions(vec![format!(
            "Add an API key for {}",
            settings.selected_model
        )]);
    }
    Ok(Json(response))
}

pub async fn clear_settings_handler(
    store: &State<SettingsStore>,
) -> Result<Json<ActionResponse>, ApiError> {
    let removed = store
        .clear()
        .await
        .map_err(|e| internal_error("Failed to clear settings", &e))?;

    if !removed {
        app_log!(debug, "No saved settings to clear");
    }

    Ok(Json(ActionResponse::success(
        "Settings cleared".to_string(),
        "deleted".to_string(),
    )))
}
