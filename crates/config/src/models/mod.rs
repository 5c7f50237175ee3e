pub mod app_config;
pub mod bus;
pub mod host;
pub mod logging;

pub use app_config::*;
pub use bus::*;
pub use host::*;
pub use logging::*;
