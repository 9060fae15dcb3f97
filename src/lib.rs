pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod storage;
pub mod types;
pub mod video;
