pub mod app_state;
pub mod assets;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
mod handlers;
pub mod models;
pub mod payloads;
pub mod request;
mod response;
pub mod server;
pub mod storage;

pub use error::{Error, Result};
pub use handlers::handle_connection;
