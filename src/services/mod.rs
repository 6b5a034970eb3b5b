pub mod logger;
pub mod sidecar;
