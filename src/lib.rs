pub mod activity;
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod nav;
pub mod poller;
pub mod render;
pub mod session;
pub mod theme;
pub mod ui;
