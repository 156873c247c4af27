use crate::yolink_api::models::device_state::DeviceState;
use dashmap::DashMap;
use std::sync::Arc;

/// Last reported state per device id. Last write wins, nothing expires.
#[derive(Clone, Default)]
pub struct DeviceStateCache {
    states: Arc<DashMap<String, DeviceState>>,
}

impl DeviceStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, device_id: &str) -> Option<DeviceState> {
        self.states.get(device_id).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, device_id: impl Into<String>, state: DeviceState) {
        self.states.insert(device_id.into(), state);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
