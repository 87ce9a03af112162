// http request handlers

pub mod gallery;
pub mod stream;
