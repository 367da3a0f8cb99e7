pub mod config;
pub mod logging;

pub mod catalog;
pub mod downloader;
pub mod layout;
pub mod pool;
pub mod range;
pub mod scheduler;
pub mod verify;
