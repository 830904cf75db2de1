pub mod models;

pub mod api_client;
pub mod config;
pub mod error;
pub mod pending;
pub mod poller;
pub mod render;
pub mod session;
pub mod web_api_server;
