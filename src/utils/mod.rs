// shared path, argument and media helpers

pub mod media;
pub mod paths;
pub mod sanitize;
