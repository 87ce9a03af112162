// galleryd: photo and video gallery media server

pub mod config;
pub mod gallery;
pub mod server;
pub mod utils;
