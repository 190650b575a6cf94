pub mod service;

pub use service::{ControlService, DEFAULT_SETPOINT_CELSIUS};
