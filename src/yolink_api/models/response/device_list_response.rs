use crate::yolink_api::models::device::Device;
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct DeviceListData {
    #[serde(default)]
    pub devices: Vec<Device>,
}
