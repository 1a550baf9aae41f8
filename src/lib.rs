pub mod app;
pub mod config;
pub mod download;
pub mod localizations;
pub mod logging;
pub mod models;
pub mod stats;
pub mod theme;
pub mod tools;
pub mod ui;
pub mod validation;
