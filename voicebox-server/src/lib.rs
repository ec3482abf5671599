pub mod config;
pub mod http;
pub mod logging;
pub mod static_files;
