pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod imaging;
pub mod logging;
pub mod server;
pub mod slots;
pub mod types;
