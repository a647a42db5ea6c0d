pub mod config;
pub mod error;
pub mod model;
pub mod notifier;
pub mod poller;
pub mod practicum;
