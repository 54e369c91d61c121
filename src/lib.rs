pub mod config;
pub mod form;
