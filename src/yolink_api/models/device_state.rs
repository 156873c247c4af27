use serde_json::value::RawValue;

/// Vendor state document, kept byte for byte as received.
pub type DeviceState = Box<RawValue>;

pub fn state_from_slice(payload: &[u8]) -> serde_json::Result<DeviceState> {
    serde_json::from_slice(payload)
}
