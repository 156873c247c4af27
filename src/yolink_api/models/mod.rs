pub mod request;
pub mod response;

pub mod device;
pub mod device_state;
