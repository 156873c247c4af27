use crate::yolink_api::models::device_state::DeviceState;
use serde::Serialize;

/// One device report on its way from the broker to the live sessions.
#[derive(Serialize, Clone, Debug)]
pub struct StateUpdate {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    pub state: DeviceState,
}
