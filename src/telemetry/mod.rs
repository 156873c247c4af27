pub mod device_state_cache;
pub mod state_update;
pub mod subscriber;
pub mod update_feed;

pub use device_state_cache::DeviceStateCache;
pub use state_update::StateUpdate;
pub use subscriber::TelemetrySubscriber;
pub use update_feed::UpdateFeed;
