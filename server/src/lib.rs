pub mod app;
pub mod backends;
pub mod config;
pub mod credential;
pub mod error;
pub mod google;
pub mod handlers;
pub mod records;
pub mod state;
pub mod storage;
