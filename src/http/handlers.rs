use crate::error::{Error, Result};
use crate::live::{SessionRegistry, session};
use crate::telemetry::DeviceStateCache;
use crate::yolink_api::YoLinkApiTrait;
use crate::yolink_api::models::device::Device;
use crate::yolink_api::models::device_state::DeviceState;
use axum::Json;
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{Instrument, debug, info_span};

/// Everything the handlers share. Built once in `main`.
pub struct AppState<T> {
    pub api: Arc<T>,
    pub states: DeviceStateCache,
    pub registry: SessionRegistry,
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            states: self.states.clone(),
            registry: self.registry.clone(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct DeviceStateQuery {
    #[serde(rename = "deviceId")]
    pub device_id: Option<String>,
    #[serde(rename = "deviceType")]
    pub device_type: Option<String>,
}

pub async fn hello() -> Json<Value> {
    Json(json!({ "message": "Hello from YoLink bridge!" }))
}

/// Bare `OPTIONS` requests get an empty 200 even without CORS request headers.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn list_devices<T>(State(state): State<AppState<T>>) -> Result<Json<Vec<Device>>>
where
    T: YoLinkApiTrait + Send + Sync + 'static,
{
    let devices = state.api.list_devices().await?;
    Ok(Json(devices))
}

/// Answers from the telemetry cache when the device has reported, otherwise asks the vendor.
///
/// The two sources return different documents. A cache hit is the last MQTT report as
/// published by the broker (`event`, `time`, `data`, ...). A miss is the `data` object of
/// the vendor's `<type>.getState` response. Clients must accept either shape.
pub async fn device_state<T>(
    State(state): State<AppState<T>>,
    Query(query): Query<DeviceStateQuery>,
) -> Result<Json<DeviceState>>
where
    T: YoLinkApiTrait + Send + Sync + 'static,
{
    let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
    let (Some(device_id), Some(device_type)) =
        (non_empty(query.device_id), non_empty(query.device_type))
    else {
        return Err(Error::Validation(
            "Device ID and type are required".to_string(),
        ));
    };

    if let Some(cached) = state.states.get(&device_id) {
        debug!("Serving cached state for device {}", device_id);
        return Ok(Json(cached));
    }

    let device_state = state.api.get_device_state(&device_id, &device_type).await?;
    Ok(Json(device_state))
}

pub async fn live_updates<T>(State(state): State<AppState<T>>, ws: WebSocketUpgrade) -> Response
where
    T: YoLinkApiTrait + Send + Sync + 'static,
{
    let registry = state.registry.clone();
    ws.on_upgrade(move |socket| session::run(socket, registry).instrument(info_span!("live_session")))
}
