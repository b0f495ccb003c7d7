pub mod app;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod listing;
pub mod output;
pub mod presenter;
pub mod store;
pub mod tui;
