pub mod app;
pub mod error;
pub mod k8s;
pub mod license;
pub mod output;
pub mod telemetry;

pub use error::Error;
