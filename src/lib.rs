pub mod app;
pub mod jobs;
pub mod logging;
