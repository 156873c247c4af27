use serde::{Deserialize, Serialize};

/// A device as listed by `Home.getDeviceList`. Serialized back to the browser with the
/// vendor's field names.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Device {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "deviceUDID", default)]
    pub device_udid: String,
    #[serde(rename = "name", default)]
    pub name: String,
    /// Per-device token, required by `<type>.getState`.
    #[serde(default)]
    pub token: String,
    #[serde(rename = "type", default)]
    pub r#type: String,
    #[serde(rename = "parentDeviceId", default)]
    pub parent_device_id: Option<String>,
    #[serde(rename = "modelName", default)]
    pub model_name: String,
    #[serde(rename = "serviceZone", default)]
    pub service_zone: String,
}
