// Response header middleware
pub mod headers;

pub use headers::{cors_layer, no_store};
