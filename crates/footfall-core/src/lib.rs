pub mod analytics;
pub mod catalog;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
