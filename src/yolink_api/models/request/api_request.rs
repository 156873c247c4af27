use chrono::Utc;
use serde::Serialize;

pub const GET_DEVICE_LIST: &str = "Home.getDeviceList";
pub const GET_GENERAL_INFO: &str = "Home.getGeneralInfo";

/// JSON-RPC style request body posted to the API endpoint.
#[derive(Serialize, Debug, Clone)]
pub struct ApiRequest {
    pub method: String,
    pub timestamp: i64,
    #[serde(rename = "targetDevice", skip_serializing_if = "Option::is_none")]
    pub target_device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ApiRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            timestamp: Utc::now().timestamp(),
            target_device: None,
            token: None,
        }
    }

    /// `<deviceType>.getState` addressed to one device with its device token.
    pub fn get_state(device_type: &str, device_id: &str, device_token: &str) -> Self {
        Self {
            target_device: Some(device_id.to_string()),
            token: Some(device_token.to_string()),
            ..Self::new(format!("{}.getState", device_type))
        }
    }
}
