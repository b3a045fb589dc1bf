//! Planning poker server: a session of named voters driven by JSON POSTs,
//! with every state change pushed to all voters over WebSockets.

pub mod api;
pub mod assets;
pub mod config;
pub mod connection;
pub mod error;
pub mod http;
pub mod hub;
pub mod model;
pub mod models;
pub mod server;
pub mod websocket;

pub use error::{Error, Result};
pub use server::Server;
