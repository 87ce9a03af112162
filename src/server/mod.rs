// server module public api

pub mod app;
pub mod handlers;
pub mod middleware;

pub use app::{create_app, create_app_with_codec, start_server};
