pub mod models;
pub mod token_cache;
pub mod yolink_client;

pub use yolink_client::{YoLinkApiTrait, YoLinkClient};
