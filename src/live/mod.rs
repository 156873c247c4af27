pub mod broadcaster;
pub mod registry;
pub mod session;

pub use registry::SessionRegistry;
