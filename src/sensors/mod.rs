pub mod history;
pub mod service;

pub use service::SensorService;
